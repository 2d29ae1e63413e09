// =============================================================================
// CROSSFADE MIXER
// =============================================================================
//
// Maps the single fader position to the music and sfx volumes.
//
//   level   0.0 ........ 0.5 ........ 1.0
//   music   0.5          0.5          0.0
//   sfx     0.0          0.5          0.5
//
// Each track is capped at half scale. The curve is piecewise linear with the
// breakpoint exactly at 0.5; it is not an equal-power curve.
//
// =============================================================================

use crate::core::TrackId;
use crate::player::{MediaCommand, TrackAction};

/// Volume of a track when the fader does not attenuate it.
pub const MAX_TRACK_VOLUME: f64 = 0.5;

/// Fader position both tracks are heard equally at.
pub const CENTER_LEVEL: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixVolumes {
    pub music: f64,
    pub sfx: f64,
}

/// Clamps raw fader input into `0.0..=1.0`. NaN lands on the center.
pub fn clamp_level(value: f64) -> f64 {
    if value.is_nan() {
        CENTER_LEVEL
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Computes both volumes for a fader position. Total over all inputs.
pub fn volumes_for_level(value: f64) -> MixVolumes {
    let level = clamp_level(value);
    if level <= CENTER_LEVEL {
        MixVolumes {
            music: MAX_TRACK_VOLUME,
            sfx: level / CENTER_LEVEL * MAX_TRACK_VOLUME,
        }
    } else {
        MixVolumes {
            music: (1.0 - level) / CENTER_LEVEL * MAX_TRACK_VOLUME,
            sfx: MAX_TRACK_VOLUME,
        }
    }
}

/// Holds the user-owned fader position.
#[derive(Debug, Clone)]
pub struct CrossfadeMixer {
    level: f64,
}

impl Default for CrossfadeMixer {
    fn default() -> Self {
        Self::new(CENTER_LEVEL)
    }
}

impl CrossfadeMixer {
    pub fn new(level: f64) -> Self {
        Self {
            level: clamp_level(level),
        }
    }

    pub fn level(&self) -> f64 {
        self.level
    }

    pub fn volumes(&self) -> MixVolumes {
        volumes_for_level(self.level)
    }

    /// Stores a new fader position and pushes the resulting volumes.
    pub fn set_level(&mut self, value: f64, out: &mut Vec<MediaCommand>) -> MixVolumes {
        self.level = clamp_level(value);
        let volumes = self.apply(out);
        log::debug!(
            "Mixer: level {:.3} -> music {:.3}, sfx {:.3}",
            self.level,
            volumes.music,
            volumes.sfx
        );
        volumes
    }

    /// Re-emits the volumes for the current level.
    pub fn apply(&self, out: &mut Vec<MediaCommand>) -> MixVolumes {
        let volumes = self.volumes();
        out.push(MediaCommand::new(TrackId::Music, TrackAction::SetVolume(volumes.music)));
        out.push(MediaCommand::new(TrackId::Sfx, TrackAction::SetVolume(volumes.sfx)));
        volumes
    }
}
