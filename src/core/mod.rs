pub mod clock;
pub mod config;
pub mod track;


pub use clock::*;
pub use config::*;
pub use track::*;
