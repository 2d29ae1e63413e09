use crate::core::Timestamp;
use crate::player::events::Outbox;
use crate::player::readiness::ReadinessTracker;
use crate::player::sync::SyncEngine;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    #[default]
    Paused,
    Playing,
}

impl TransportState {
    pub fn display_text(&self) -> &str {
        match self {
            TransportState::Paused => "Paused",
            TransportState::Playing => "Playing",
        }
    }
}

/// Result of a play/pause toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Started,
    Paused,
    /// The master cannot sustain playback yet.
    IgnoredNotReady,
}

/// Owns the user's play/pause intent. Readiness only guards the
/// `Paused -> Playing` transition.
#[derive(Debug, Default)]
pub struct TransportController {
    state: TransportState,
}

impl TransportController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    pub fn request_play_pause(
        &mut self,
        now: Timestamp,
        engine: &mut SyncEngine,
        readiness: &ReadinessTracker,
        out: &mut Outbox,
    ) -> ToggleOutcome {
        match self.state {
            TransportState::Paused if !readiness.is_ready() => {
                log::info!("Play requested before video is ready, ignoring");
                ToggleOutcome::IgnoredNotReady
            }
            TransportState::Paused => {
                log::info!("Transport: Play from {:.2}s", engine.master_position());
                self.state = TransportState::Playing;
                engine.start(now, readiness, out);
                ToggleOutcome::Started
            }
            TransportState::Playing => {
                log::info!("Transport: Pause at {:.2}s", engine.master_position());
                self.state = TransportState::Paused;
                engine.pause_all(out);
                ToggleOutcome::Paused
            }
        }
    }

    /// Seeks the master, clamped to `[0, duration]`. Returns the target
    /// actually used, or `None` while the duration is unknown.
    pub fn request_seek(&mut self, target: f64, engine: &mut SyncEngine, out: &mut Outbox) -> Option<f64> {
        let duration = match engine.duration() {
            Some(duration) => duration,
            None => {
                log::debug!("Seek to {:.2}s ignored, duration unknown", target);
                return None;
            }
        };
        if target.is_nan() {
            return None;
        }

        let clamped = target.clamp(0.0, duration);
        log::info!("Transport: Seek to {:.2}s", clamped);
        engine.begin_seek(clamped, self.is_playing(), out);
        Some(clamped)
    }

    /// Seeks to a fraction of the duration, as a progress bar gesture does.
    pub fn request_seek_fraction(&mut self, fraction: f64, engine: &mut SyncEngine, out: &mut Outbox) -> Option<f64> {
        let duration = engine.duration()?;
        self.request_seek(fraction.clamp(0.0, 1.0) * duration, engine, out)
    }

    /// The host stopped the master (end, rejection, external pause).
    pub fn mark_stopped(&mut self) {
        self.state = TransportState::Paused;
    }

    /// The host started the master without a request from us.
    pub fn mark_started(&mut self) {
        self.state = TransportState::Playing;
    }
}
