// =============================================================================
// FADER PLAYER - PUBLIC API
// =============================================================================
//
// One FaderPlayer per widget instance. The host feeds it track events, user
// requests and timer ticks, each with a monotonic timestamp, and executes the
// returned commands against its media elements. Notices go out on a
// broadcast channel for UI collaborators (spinner, warnings).
//
// =============================================================================

use tokio::sync::broadcast;
use uuid::Uuid;

use crate::audio::{CrossfadeMixer, MixVolumes};
use crate::core::{FaderConfig, Timestamp, TrackId};
use crate::player::events::{MediaCommand, MediaEvent, Outbox, PlayerNotice};
use crate::player::readiness::{ReadinessSignal, ReadinessTracker};
use crate::player::sync::{SyncEngine, SyncStats};
use crate::player::transport::{ToggleOutcome, TransportController, TransportState};
use crate::player::TrackAction;

const NOTICE_CHANNEL_CAPACITY: usize = 32;

/// Derived view of the player, never stored on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackState {
    pub is_ready: bool,
    pub is_playing: bool,
    pub is_seeking: bool,
}

pub struct FaderPlayer {
    id: Uuid,
    label: String,
    readiness: ReadinessTracker,
    engine: SyncEngine,
    transport: TransportController,
    mixer: CrossfadeMixer,
    notice_sender: broadcast::Sender<PlayerNotice>,
}

impl std::fmt::Debug for FaderPlayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FaderPlayer")
            .field("id", &self.id)
            .field("state", &self.playback_state())
            .field("mix_level", &self.mixer.level())
            .finish()
    }
}

impl FaderPlayer {
    pub fn new(config: &FaderConfig) -> Self {
        let id = Uuid::new_v4();
        let label = id.simple().to_string()[..8].to_string();
        let (notice_sender, _) = broadcast::channel(NOTICE_CHANNEL_CAPACITY);

        Self {
            id,
            engine: SyncEngine::new(label.clone(), config.sync.clone()),
            label,
            readiness: ReadinessTracker::new(),
            transport: TransportController::new(),
            mixer: CrossfadeMixer::new(config.initial_mix_level),
            notice_sender,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PlayerNotice> {
        self.notice_sender.subscribe()
    }

    /// Starts buffering all tracks and applies the initial mix.
    pub fn start(&mut self) -> Vec<MediaCommand> {
        log::info!("[{}] Neuma Fader initialized (mix level {:.2})", self.label, self.mixer.level());
        let mut out = Outbox::new();
        for track in TrackId::ALL {
            out.command(track, TrackAction::Load);
        }
        self.mixer.apply(&mut out.commands);
        self.finish(out)
    }

    // -------------------------------------------------------------------------
    // User requests
    // -------------------------------------------------------------------------

    pub fn request_play_pause(&mut self, now: Timestamp) -> Vec<MediaCommand> {
        let mut out = Outbox::new();
        let outcome = self
            .transport
            .request_play_pause(now, &mut self.engine, &self.readiness, &mut out);
        if outcome == ToggleOutcome::IgnoredNotReady {
            log::debug!("[{}] Video not ready yet", self.label);
        }
        self.finish(out)
    }

    pub fn request_seek(&mut self, target: f64) -> Vec<MediaCommand> {
        let mut out = Outbox::new();
        self.transport.request_seek(target, &mut self.engine, &mut out);
        self.finish(out)
    }

    pub fn request_seek_fraction(&mut self, fraction: f64) -> Vec<MediaCommand> {
        let mut out = Outbox::new();
        self.transport.request_seek_fraction(fraction, &mut self.engine, &mut out);
        self.finish(out)
    }

    pub fn set_mix_level(&mut self, level: f64) -> Vec<MediaCommand> {
        let mut out = Outbox::new();
        self.mixer.set_level(level, &mut out.commands);
        self.finish(out)
    }

    /// Runs any deferred work due at `now`.
    pub fn advance(&mut self, now: Timestamp) -> Vec<MediaCommand> {
        let mut out = Outbox::new();
        self.engine
            .advance(now, self.transport.is_playing(), &self.readiness, &mut out);
        self.finish(out)
    }

    // -------------------------------------------------------------------------
    // Host events
    // -------------------------------------------------------------------------

    pub fn handle_event(&mut self, track: TrackId, event: MediaEvent, now: Timestamp) -> Vec<MediaCommand> {
        let mut out = Outbox::new();
        let playing = self.transport.is_playing();

        match event {
            MediaEvent::PositionChanged(seconds) => {
                if track.is_master() {
                    self.engine
                        .on_master_position(seconds, now, playing, &self.readiness, &mut out);
                } else {
                    self.engine.on_follower_position(track, seconds);
                }
            }
            MediaEvent::DurationChanged(seconds) => {
                self.engine.set_duration(track, seconds);
            }
            MediaEvent::ReadyLevelChanged(level) => {
                let signals = self.readiness.on_ready_level_changed(track, level);
                self.apply_signals(signals, &mut out);
            }
            MediaEvent::Stalled => {
                log::debug!("[{}] {} buffering...", self.label, track);
                let signals = self.readiness.on_stalled(track);
                self.apply_signals(signals, &mut out);
            }
            MediaEvent::Recovered => {
                let signals = self.readiness.on_recovered(track);
                self.apply_signals(signals, &mut out);
            }
            MediaEvent::Seeked => {
                if track.is_master() {
                    self.engine.on_master_seeked(now, playing, &mut out);
                }
            }
            MediaEvent::Paused => {
                // Our own pauses (toggle, seek) come back here too
                if track.is_master() && playing && !self.engine.is_seeking() {
                    log::info!("[{}] Video paused by host", self.label);
                    self.transport.mark_stopped();
                    self.engine.stop_followers(&mut out);
                }
            }
            MediaEvent::PlaybackEnded => {
                if track.is_master() {
                    self.transport.mark_stopped();
                    self.engine.on_master_ended(&mut out);
                }
            }
            MediaEvent::PlayStarted => {
                if track.is_master() {
                    if !self.readiness.is_ready() {
                        log::info!("[{}] Video started before it could play through, pausing it", self.label);
                        out.command(TrackId::Video, TrackAction::Pause);
                    } else if !playing && !self.engine.is_seeking() {
                        log::info!("[{}] Video started by host, following", self.label);
                        self.transport.mark_started();
                        self.engine.follow_master_start(now, &mut out);
                    }
                } else {
                    self.engine.on_follower_play_started(track);
                }
            }
            MediaEvent::PlayRejected(reason) => {
                if track.is_master() {
                    if playing {
                        log::warn!("[{}] Video play rejected: {}", self.label, reason);
                        self.transport.mark_stopped();
                        self.engine.stop_followers(&mut out);
                        out.notice(PlayerNotice::PlaybackBlocked { reason });
                    }
                } else {
                    self.engine
                        .on_follower_play_rejected(track, &reason, now, playing, &mut out);
                }
            }
        }

        self.finish(out)
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    pub fn playback_state(&self) -> PlaybackState {
        PlaybackState {
            is_ready: self.readiness.is_ready(),
            is_playing: self.transport.is_playing(),
            is_seeking: self.engine.is_seeking(),
        }
    }

    pub fn transport_state(&self) -> TransportState {
        self.transport.state()
    }

    pub fn is_buffering(&self) -> bool {
        self.readiness.is_buffering()
    }

    pub fn mix_level(&self) -> f64 {
        self.mixer.level()
    }

    pub fn volumes(&self) -> MixVolumes {
        self.mixer.volumes()
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn stats(&self) -> &SyncStats {
        self.engine.stats()
    }

    pub fn next_timer_due(&self) -> Option<Timestamp> {
        self.engine.next_timer_due()
    }

    fn apply_signals(&mut self, signals: Vec<ReadinessSignal>, out: &mut Outbox) {
        let playing = self.transport.is_playing();
        for signal in signals {
            match signal {
                ReadinessSignal::BecameReady => {
                    log::info!("[{}] Video ready", self.label);
                    out.notice(PlayerNotice::Ready);
                }
                ReadinessSignal::PauseFollowers => self.engine.on_master_stalled(out),
                ReadinessSignal::MasterRecovered => self.engine.on_master_recovered(playing, out),
                ReadinessSignal::BufferingChanged(active) => {
                    out.notice(PlayerNotice::Buffering { active });
                }
            }
        }
    }

    fn finish(&mut self, out: Outbox) -> Vec<MediaCommand> {
        for notice in out.notices {
            if self.notice_sender.send(notice).is_err() {
                log::debug!("[{}] No notice subscribers", self.label);
            }
        }
        out.commands
    }
}
