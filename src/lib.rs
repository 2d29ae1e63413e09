pub mod audio;
pub mod core;
pub mod host;
pub mod player;

pub use crate::core::{FaderConfig, Timestamp, TrackId};
pub use crate::player::{FaderPlayer, MediaCommand, MediaEvent, PlayerNotice};
