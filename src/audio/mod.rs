pub mod mixer;

pub use mixer::{clamp_level, volumes_for_level, CrossfadeMixer, MixVolumes};
