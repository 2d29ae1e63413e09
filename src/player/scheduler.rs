use crate::core::{Timestamp, TrackId};
use std::time::Duration;

/// Deferred work the player can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    /// Try starting a follower again after a rejected play.
    RetryPlay(TrackId),
    /// Resume all tracks after a seek finished.
    ResumeAfterSeek,
}

/// Handle to a scheduled timer. Handles are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

#[derive(Debug, Clone)]
struct PendingTimer {
    handle: TimerHandle,
    due: Timestamp,
    action: TimerAction,
}

/// Single-threaded timer queue driven by host timestamps.
#[derive(Debug, Default)]
pub struct TimerScheduler {
    next_id: u64,
    pending: Vec<PendingTimer>,
}

impl TimerScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, now: Timestamp, delay: Duration, action: TimerAction) -> TimerHandle {
        self.next_id += 1;
        let handle = TimerHandle(self.next_id);
        self.pending.push(PendingTimer {
            handle,
            due: now + delay,
            action,
        });
        handle
    }

    /// Cancels a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TimerHandle) -> bool {
        let before = self.pending.len();
        self.pending.retain(|timer| timer.handle != handle);
        self.pending.len() != before
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self, handle: TimerHandle) -> bool {
        self.pending.iter().any(|timer| timer.handle == handle)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Earliest due time, for hosts that sleep until the next timer.
    pub fn next_due(&self) -> Option<Timestamp> {
        self.pending.iter().map(|timer| timer.due).min()
    }

    /// Removes and returns every timer due at `now`, oldest deadline first.
    pub fn take_due(&mut self, now: Timestamp) -> Vec<(TimerHandle, TimerAction)> {
        let mut due: Vec<PendingTimer> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due <= now {
                due.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        due.sort_by_key(|timer| (timer.due, timer.handle));
        due.into_iter().map(|timer| (timer.handle, timer.action)).collect()
    }
}
