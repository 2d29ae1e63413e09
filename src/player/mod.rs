pub mod controller;
pub mod events;
pub mod readiness;
pub mod scheduler;
pub mod sync;
pub mod transport;

#[cfg(test)]
mod tests;

pub use controller::{FaderPlayer, PlaybackState};
pub use events::{MediaCommand, MediaEvent, Outbox, PlayerNotice, TrackAction};
pub use readiness::{ReadinessSignal, ReadinessTracker};
pub use scheduler::{TimerAction, TimerHandle, TimerScheduler};
pub use sync::{FollowerMode, SeekState, SyncEngine, SyncStats};
pub use transport::{ToggleOutcome, TransportController, TransportState};
