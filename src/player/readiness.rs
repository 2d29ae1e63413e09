use crate::core::{ReadyLevel, TrackId, TrackSet};

/// What a readiness change means for the rest of the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessSignal {
    /// The master reached play-through level for the first time.
    BecameReady,
    /// The master stalled; followers must stop until it recovers.
    PauseFollowers,
    /// The master has data again.
    MasterRecovered,
    BufferingChanged(bool),
}

/// Aggregates per-track ready/stalled reports.
///
/// `is_ready` is a one-time gate for user play requests: once set it stays
/// set for the session, later stalls only show up as buffering.
#[derive(Debug, Default)]
pub struct ReadinessTracker {
    ready: bool,
    stalled: TrackSet<bool>,
}

impl ReadinessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn is_buffering(&self) -> bool {
        self.stalled.iter().any(|(_, stalled)| *stalled)
    }

    pub fn is_stalled(&self, track: TrackId) -> bool {
        *self.stalled.get(track)
    }

    pub fn on_ready_level_changed(&mut self, track: TrackId, level: ReadyLevel) -> Vec<ReadinessSignal> {
        let mut signals = Vec::new();
        if track.is_master() && level.can_play_through() {
            self.mark_ready(&mut signals);
            // Reaching play-through also ends any pending stall
            if self.is_stalled(track) {
                signals.extend(self.on_recovered(track));
            }
        }
        signals
    }

    pub fn on_stalled(&mut self, track: TrackId) -> Vec<ReadinessSignal> {
        let was_buffering = self.is_buffering();
        let was_stalled = std::mem::replace(self.stalled.get_mut(track), true);

        let mut signals = Vec::new();
        if track.is_master() && !was_stalled {
            signals.push(ReadinessSignal::PauseFollowers);
        }
        if !was_buffering {
            signals.push(ReadinessSignal::BufferingChanged(true));
        }
        signals
    }

    pub fn on_recovered(&mut self, track: TrackId) -> Vec<ReadinessSignal> {
        let was_buffering = self.is_buffering();
        let was_stalled = std::mem::replace(self.stalled.get_mut(track), false);

        let mut signals = Vec::new();
        if track.is_master() && was_stalled {
            signals.push(ReadinessSignal::MasterRecovered);
        }
        if was_buffering && !self.is_buffering() {
            signals.push(ReadinessSignal::BufferingChanged(false));
        }
        signals
    }

    fn mark_ready(&mut self, signals: &mut Vec<ReadinessSignal>) {
        if !self.ready {
            self.ready = true;
            signals.push(ReadinessSignal::BecameReady);
        }
    }
}
