pub mod runner;
pub mod script;
pub mod simulated;

pub use runner::{run_session, FollowerReport, SessionReport, SessionRunner};
pub use script::{ScriptAction, ScriptError, ScriptStep, SessionScript};
pub use simulated::{SimulatedHost, SimulatedTrack};
