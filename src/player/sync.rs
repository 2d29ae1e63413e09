// =============================================================================
// SYNCHRONIZATION ENGINE
// =============================================================================
//
// Keeps the two audio followers aligned with the video master.
//
// - Drift checks run on master position updates, throttled by wall-clock time
// - A follower further than the tolerance from the master is re-seeked
// - Starting playback hard-syncs both followers before any play command
// - User seeks suspend drift checks until the master reports completion
// - Rejected follower plays are retried a bounded number of times
//
// The engine never owns the play/pause intent; callers pass `playing` in so
// deferred work can re-check it when it fires.
//
// =============================================================================

use crate::core::{MediaTrack, SyncConfig, Timestamp, TrackId, TrackSet};
use crate::player::events::{Outbox, PlayerNotice, TrackAction};
use crate::player::readiness::ReadinessTracker;
use crate::player::scheduler::{TimerAction, TimerHandle, TimerScheduler};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FollowerMode {
    #[default]
    Following,
    /// A re-seek was issued for this follower during the current check.
    Correcting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekState {
    Idle,
    /// The master is seeking; `resume` records whether to play afterwards.
    InFlight { resume: bool },
    /// Seek done, waiting out the grace delay before playing again.
    Resuming(TimerHandle),
}

#[derive(Debug, Clone, Default)]
struct RetryState {
    attempts: u32,
    pending: Option<TimerHandle>,
    silenced: bool,
}

/// Counters for reports and tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncStats {
    pub corrections: TrackSet<u32>,
    /// Largest drift seen by a drift check, in seconds.
    pub max_drift: TrackSet<f64>,
    pub checks: u64,
}

#[derive(Debug)]
pub struct SyncEngine {
    label: String,
    config: SyncConfig,
    tracks: TrackSet<MediaTrack>,
    modes: TrackSet<FollowerMode>,
    retries: TrackSet<RetryState>,
    seek: SeekState,
    last_check: Option<Timestamp>,
    timers: TimerScheduler,
    stats: SyncStats,
}

impl SyncEngine {
    pub fn new(label: impl Into<String>, config: SyncConfig) -> Self {
        Self {
            label: label.into(),
            config,
            tracks: TrackSet::default(),
            modes: TrackSet::default(),
            retries: TrackSet::default(),
            seek: SeekState::Idle,
            last_check: None,
            timers: TimerScheduler::new(),
            stats: SyncStats::default(),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn track(&self, track: TrackId) -> &MediaTrack {
        self.tracks.get(track)
    }

    pub fn master_position(&self) -> f64 {
        self.tracks.get(TrackId::Video).position
    }

    pub fn duration(&self) -> Option<f64> {
        self.tracks.get(TrackId::Video).duration
    }

    #[cfg(test)]
    pub(crate) fn seek_state(&self) -> SeekState {
        self.seek
    }

    /// True from a user seek until playback has resumed (or was not going to).
    pub fn is_seeking(&self) -> bool {
        self.seek != SeekState::Idle
    }

    pub fn follower_mode(&self, track: TrackId) -> FollowerMode {
        *self.modes.get(track)
    }

    pub fn play_attempts(&self, track: TrackId) -> u32 {
        self.retries.get(track).attempts
    }

    pub fn is_silenced(&self, track: TrackId) -> bool {
        self.retries.get(track).silenced
    }

    pub fn stats(&self) -> &SyncStats {
        &self.stats
    }

    #[cfg(test)]
    pub(crate) fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    pub fn next_timer_due(&self) -> Option<Timestamp> {
        self.timers.next_due()
    }

    // -------------------------------------------------------------------------
    // Host reports
    // -------------------------------------------------------------------------

    pub fn set_duration(&mut self, track: TrackId, seconds: f64) {
        if seconds.is_finite() && seconds >= 0.0 {
            self.tracks.get_mut(track).duration = Some(seconds);
        }
    }

    pub fn on_follower_position(&mut self, track: TrackId, seconds: f64) {
        self.tracks.get_mut(track).set_position(seconds);
    }

    /// Records the master position and runs a throttled drift check.
    pub fn on_master_position(
        &mut self,
        seconds: f64,
        now: Timestamp,
        playing: bool,
        readiness: &ReadinessTracker,
        out: &mut Outbox,
    ) {
        self.tracks.get_mut(TrackId::Video).set_position(seconds);
        self.check_drift(now, playing, readiness, out);
    }

    /// Compares both followers to the master and re-seeks the ones that
    /// drifted past the tolerance. Does nothing while a seek is in flight,
    /// the master is stalled or paused, or the throttle interval has not
    /// elapsed.
    pub fn check_drift(&mut self, now: Timestamp, playing: bool, readiness: &ReadinessTracker, out: &mut Outbox) {
        if !playing || self.is_seeking() || readiness.is_stalled(TrackId::Video) {
            return;
        }
        if let Some(last) = self.last_check {
            if now.saturating_since(last) < self.config.check_interval() {
                return;
            }
        }
        self.last_check = Some(now);
        self.stats.checks += 1;

        let master = self.master_position();
        for follower in TrackId::FOLLOWERS {
            if self.is_silenced(follower) || readiness.is_stalled(follower) {
                continue;
            }

            let drift = (self.tracks.get(follower).position - master).abs();
            let max_drift = self.stats.max_drift.get_mut(follower);
            if drift > *max_drift {
                *max_drift = drift;
            }

            if drift > self.config.tolerance_secs {
                *self.modes.get_mut(follower) = FollowerMode::Correcting;
                log::debug!(
                    "[{}] {} drifted {:.3}s from master at {:.2}s, re-seeking",
                    self.label,
                    follower,
                    drift,
                    master
                );
                self.seek_follower(follower, master, out);
                *self.stats.corrections.get_mut(follower) += 1;
                // The seek is treated as instantaneous
                *self.modes.get_mut(follower) = FollowerMode::Following;
            }
        }
    }

    /// A started follower ends its retry sequence and gets a full budget back.
    pub fn on_follower_play_started(&mut self, track: TrackId) {
        self.tracks.get_mut(track).paused = false;
        let retry = self.retries.get_mut(track);
        retry.attempts = 0;
        if let Some(handle) = retry.pending.take() {
            self.timers.cancel(handle);
        }
    }

    pub fn on_follower_play_rejected(
        &mut self,
        track: TrackId,
        reason: &str,
        now: Timestamp,
        playing: bool,
        out: &mut Outbox,
    ) {
        self.tracks.get_mut(track).paused = true;

        let max_attempts = self.config.play_attempts;
        let delay = self.config.play_retry_delay();
        let retry = self.retries.get_mut(track);
        if retry.silenced {
            return;
        }
        if retry.attempts >= max_attempts {
            retry.silenced = true;
            log::warn!(
                "[{}] {} could not start after {} attempts ({}), leaving it silent",
                self.label,
                track,
                retry.attempts,
                reason
            );
            out.notice(PlayerNotice::TrackSilenced {
                track,
                reason: reason.to_string(),
            });
            return;
        }

        if !playing || self.seek != SeekState::Idle {
            log::debug!("[{}] {} play rejected after playback stopped, not retrying", self.label, track);
            return;
        }

        if let Some(previous) = retry.pending.take() {
            self.timers.cancel(previous);
        }
        log::debug!(
            "[{}] {} play rejected ({}), retry {}/{} in {}ms",
            self.label,
            track,
            reason,
            retry.attempts + 1,
            max_attempts,
            delay.as_millis()
        );
        let handle = self.timers.schedule(now, delay, TimerAction::RetryPlay(track));
        self.retries.get_mut(track).pending = Some(handle);
    }

    /// The host has no data for the master: followers must not run ahead.
    pub fn on_master_stalled(&mut self, out: &mut Outbox) {
        log::debug!("[{}] Master stalled at {:.2}s, pausing followers", self.label, self.master_position());
        self.cancel_retries();
        self.pause_followers(out);
    }

    pub fn on_master_recovered(&mut self, playing: bool, out: &mut Outbox) {
        if !playing || self.is_seeking() {
            return;
        }
        log::debug!("[{}] Master recovered at {:.2}s, resuming followers", self.label, self.master_position());
        self.hard_sync(out);
        self.play_followers(out);
    }

    /// Called when the master finished a seek, whoever started it.
    pub fn on_master_seeked(&mut self, now: Timestamp, playing: bool, out: &mut Outbox) {
        self.hard_sync(out);

        match self.seek {
            SeekState::InFlight { resume } => {
                if resume && playing {
                    let handle = self.timers.schedule(now, self.config.resume_grace(), TimerAction::ResumeAfterSeek);
                    self.seek = SeekState::Resuming(handle);
                } else {
                    self.seek = SeekState::Idle;
                }
            }
            SeekState::Idle | SeekState::Resuming(_) => {}
        }
    }

    pub fn on_master_ended(&mut self, out: &mut Outbox) {
        log::info!("[{}] Playback ended, rewinding followers", self.label);
        self.cancel_timers();
        self.seek = SeekState::Idle;
        for follower in TrackId::FOLLOWERS {
            out.command(follower, TrackAction::Pause);
            self.tracks.get_mut(follower).paused = true;
            self.seek_follower(follower, 0.0, out);
        }
        self.tracks.get_mut(TrackId::Video).paused = true;
    }

    // -------------------------------------------------------------------------
    // Transport requests
    // -------------------------------------------------------------------------

    /// Starts the master and both followers from the master position.
    pub fn start(&mut self, now: Timestamp, readiness: &ReadinessTracker, out: &mut Outbox) {
        self.reset_retries();

        if let SeekState::InFlight { .. } = self.seek {
            log::debug!("[{}] Play requested during seek, resuming once it completes", self.label);
            self.seek = SeekState::InFlight { resume: true };
            return;
        }

        self.hard_sync(out);
        out.command(TrackId::Video, TrackAction::Play);
        self.tracks.get_mut(TrackId::Video).paused = false;
        if !readiness.is_stalled(TrackId::Video) {
            self.play_followers(out);
        }
        self.last_check = Some(now);
    }

    /// The host started the master on its own; bring the followers along.
    pub fn follow_master_start(&mut self, now: Timestamp, out: &mut Outbox) {
        self.reset_retries();
        self.tracks.get_mut(TrackId::Video).paused = false;
        self.hard_sync(out);
        self.play_followers(out);
        self.last_check = Some(now);
    }

    pub fn pause_all(&mut self, out: &mut Outbox) {
        self.cancel_timers();
        match self.seek {
            SeekState::InFlight { .. } => self.seek = SeekState::InFlight { resume: false },
            SeekState::Resuming(_) => self.seek = SeekState::Idle,
            SeekState::Idle => {}
        }
        out.command(TrackId::Video, TrackAction::Pause);
        self.tracks.get_mut(TrackId::Video).paused = true;
        self.pause_followers(out);
    }

    /// Stops followers after the master stopped by itself.
    pub fn stop_followers(&mut self, out: &mut Outbox) {
        self.cancel_timers();
        self.seek = SeekState::Idle;
        self.tracks.get_mut(TrackId::Video).paused = true;
        self.pause_followers(out);
    }

    /// Starts a user seek. Drift checks stay suspended until the master
    /// reports completion and any resume delay has passed.
    pub fn begin_seek(&mut self, target: f64, playing: bool, out: &mut Outbox) {
        self.cancel_timers();
        let resume = match self.seek {
            SeekState::InFlight { resume } => resume || playing,
            _ => playing,
        };
        self.seek = SeekState::InFlight { resume };

        if playing {
            for track in TrackId::ALL {
                out.command(track, TrackAction::Pause);
                self.tracks.get_mut(track).paused = true;
            }
        }
        out.command(TrackId::Video, TrackAction::SeekTo(target));
        self.tracks.get_mut(TrackId::Video).set_position(target);
    }

    // -------------------------------------------------------------------------
    // Timers
    // -------------------------------------------------------------------------

    /// Fires every timer due at `now`. Each one re-checks current state first.
    pub fn advance(&mut self, now: Timestamp, playing: bool, readiness: &ReadinessTracker, out: &mut Outbox) {
        for (handle, action) in self.timers.take_due(now) {
            match action {
                TimerAction::ResumeAfterSeek => self.fire_resume(handle, now, playing, readiness, out),
                TimerAction::RetryPlay(track) => self.fire_retry(handle, track, playing, readiness, out),
            }
        }
    }

    fn fire_resume(
        &mut self,
        handle: TimerHandle,
        now: Timestamp,
        playing: bool,
        readiness: &ReadinessTracker,
        out: &mut Outbox,
    ) {
        if self.seek != SeekState::Resuming(handle) {
            log::debug!("[{}] Dropping stale resume timer", self.label);
            return;
        }
        self.seek = SeekState::Idle;
        if !playing {
            return;
        }

        log::debug!("[{}] Resuming playback at {:.2}s after seek", self.label, self.master_position());
        out.command(TrackId::Video, TrackAction::Play);
        self.tracks.get_mut(TrackId::Video).paused = false;
        if !readiness.is_stalled(TrackId::Video) {
            self.play_followers(out);
        }
        self.last_check = Some(now);
    }

    fn fire_retry(
        &mut self,
        handle: TimerHandle,
        track: TrackId,
        playing: bool,
        readiness: &ReadinessTracker,
        out: &mut Outbox,
    ) {
        let retry = self.retries.get_mut(track);
        if retry.pending != Some(handle) {
            log::debug!("[{}] Dropping stale retry timer for {}", self.label, track);
            return;
        }
        retry.pending = None;

        if !playing || self.seek != SeekState::Idle || readiness.is_stalled(TrackId::Video) {
            log::debug!("[{}] Master no longer playing, abandoning {} retry", self.label, track);
            return;
        }

        retry.attempts += 1;
        out.command(track, TrackAction::Play);
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    /// Moves both followers to the master position unconditionally.
    fn hard_sync(&mut self, out: &mut Outbox) {
        let master = self.master_position();
        log::debug!("[{}] Full sync at {:.2}s", self.label, master);
        for follower in TrackId::FOLLOWERS {
            self.seek_follower(follower, master, out);
        }
    }

    fn seek_follower(&mut self, follower: TrackId, seconds: f64, out: &mut Outbox) {
        out.command(follower, TrackAction::SeekTo(seconds));
        self.tracks.get_mut(follower).set_position(seconds);
    }

    /// Every play issued here counts against the follower's attempt budget;
    /// only a user play or a successful start refills it.
    fn play_followers(&mut self, out: &mut Outbox) {
        let max_attempts = self.config.play_attempts;
        for follower in TrackId::FOLLOWERS {
            let retry = self.retries.get_mut(follower);
            if retry.silenced || retry.pending.is_some() {
                continue;
            }
            if retry.attempts >= max_attempts {
                // Last attempt still unanswered; its rejection silences the track
                log::debug!("[{}] {} out of play attempts, not starting it", self.label, follower);
                continue;
            }
            retry.attempts += 1;
            out.command(follower, TrackAction::Play);
        }
    }

    fn pause_followers(&mut self, out: &mut Outbox) {
        for follower in TrackId::FOLLOWERS {
            out.command(follower, TrackAction::Pause);
            self.tracks.get_mut(follower).paused = true;
        }
    }

    fn reset_retries(&mut self) {
        self.cancel_retries();
        for follower in TrackId::FOLLOWERS {
            let retry = self.retries.get_mut(follower);
            retry.attempts = 0;
            retry.silenced = false;
        }
    }

    fn cancel_retries(&mut self) {
        for follower in TrackId::FOLLOWERS {
            if let Some(handle) = self.retries.get_mut(follower).pending.take() {
                self.timers.cancel(handle);
            }
        }
    }

    fn cancel_timers(&mut self) {
        self.cancel_retries();
        if let SeekState::Resuming(handle) = self.seek {
            self.timers.cancel(handle);
        }
    }
}
