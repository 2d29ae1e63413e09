use serde::Serialize;
use std::time::Duration;
use tokio::sync::broadcast::{self, error::TryRecvError};

use crate::core::{FaderConfig, TrackId};
use crate::host::script::{ScriptAction, SessionScript};
use crate::host::simulated::SimulatedHost;
use crate::player::{FaderPlayer, MediaCommand, PlayerNotice};

/// Event/command ping-pong rounds allowed per input before giving up.
const MAX_PUMP_ROUNDS: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FollowerReport {
    /// Largest real drift seen while both the follower and the master ran.
    pub max_drift_secs: f64,
    pub corrections: u32,
    pub play_calls: u32,
    pub silenced: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReport {
    pub script: String,
    pub player_id: String,
    pub elapsed_ms: u64,
    pub final_position_secs: f64,
    pub final_state: String,
    pub drift_checks: u64,
    pub music: FollowerReport,
    pub sfx: FollowerReport,
    pub notices: Vec<PlayerNotice>,
}

/// Drives a [`FaderPlayer`] against a [`SimulatedHost`].
pub struct SessionRunner {
    player: FaderPlayer,
    host: SimulatedHost,
    notices: broadcast::Receiver<PlayerNotice>,
    collected: Vec<PlayerNotice>,
    music: FollowerReport,
    sfx: FollowerReport,
}

impl SessionRunner {
    pub fn new(config: &FaderConfig, script: &SessionScript) -> Self {
        let player = FaderPlayer::new(config);
        let notices = player.subscribe();
        Self {
            player,
            host: SimulatedHost::new(script.duration_secs),
            notices,
            collected: Vec::new(),
            music: FollowerReport::default(),
            sfx: FollowerReport::default(),
        }
    }

    pub fn player(&self) -> &FaderPlayer {
        &self.player
    }

    pub fn host(&self) -> &SimulatedHost {
        &self.host
    }

    pub fn run(mut self, script: &SessionScript) -> SessionReport {
        log::info!(
            "Running session '{}' ({}ms, {:.1}s media)",
            script.name,
            script.run_ms,
            script.duration_secs
        );

        let commands = self.player.start();
        self.deliver(commands);

        let step = Duration::from_millis(script.step_ms);
        let mut pending = script.steps.iter().peekable();
        let mut elapsed = 0;

        while elapsed <= script.run_ms {
            while let Some(next) = pending.next_if(|s| s.at_ms <= elapsed) {
                self.perform(&next.action);
            }

            self.host.step(step);
            elapsed += script.step_ms;
            self.pump();

            let commands = self.player.advance(self.host.now());
            self.deliver(commands);

            self.observe_drift();
            self.collect_notices();
        }

        self.finish(script, elapsed)
    }

    fn perform(&mut self, action: &ScriptAction) {
        let now = self.host.now();
        log::debug!("Script action at {}ms: {:?}", now.as_millis(), action);
        let commands = match *action {
            ScriptAction::PlayPause => self.player.request_play_pause(now),
            ScriptAction::Seek { seconds } => self.player.request_seek(seconds),
            ScriptAction::SeekFraction { fraction } => self.player.request_seek_fraction(fraction),
            ScriptAction::Mix { level } => self.player.set_mix_level(level),
            ScriptAction::Stall { track } => {
                self.host.stall(track);
                Vec::new()
            }
            ScriptAction::Recover { track } => {
                self.host.recover(track);
                Vec::new()
            }
            ScriptAction::RejectPlays { track, count } => {
                self.host.reject_plays(track, count);
                Vec::new()
            }
            ScriptAction::SetRate { track, rate } => {
                self.host.set_rate(track, rate);
                Vec::new()
            }
        };
        self.deliver(commands);
    }

    fn deliver(&mut self, commands: Vec<MediaCommand>) {
        self.host.apply(&commands);
        self.pump();
    }

    /// Feeds host events to the player until both sides go quiet.
    fn pump(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let events = self.host.take_events();
            if events.is_empty() {
                return;
            }
            let now = self.host.now();
            for (track, event) in events {
                let commands = self.player.handle_event(track, event, now);
                self.host.apply(&commands);
            }
        }
        log::warn!("Host and player still exchanging events after {} rounds", MAX_PUMP_ROUNDS);
    }

    fn observe_drift(&mut self) {
        let master = self.host.track(TrackId::Video);
        if master.media.paused || master.stalled {
            return;
        }
        for (follower, report) in [(TrackId::Music, &mut self.music), (TrackId::Sfx, &mut self.sfx)] {
            let sim = self.host.track(follower);
            if sim.media.paused || sim.stalled {
                continue;
            }
            let drift = self.host.drift(follower);
            if drift > report.max_drift_secs {
                report.max_drift_secs = drift;
            }
        }
    }

    fn collect_notices(&mut self) {
        loop {
            match self.notices.try_recv() {
                Ok(notice) => self.collected.push(notice),
                Err(TryRecvError::Lagged(skipped)) => {
                    log::warn!("Dropped {} player notices", skipped);
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
            }
        }
    }

    fn finish(mut self, script: &SessionScript, elapsed: u64) -> SessionReport {
        self.collect_notices();

        let stats = self.player.stats().clone();
        for (follower, report) in [(TrackId::Music, &mut self.music), (TrackId::Sfx, &mut self.sfx)] {
            report.corrections = *stats.corrections.get(follower);
            report.play_calls = self.host.track(follower).play_calls;
            report.silenced = self.player.engine().is_silenced(follower);
        }

        let report = SessionReport {
            script: script.name.clone(),
            player_id: self.player.id().to_string(),
            elapsed_ms: elapsed,
            final_position_secs: self.host.track(TrackId::Video).media.position,
            final_state: self.player.transport_state().display_text().to_string(),
            drift_checks: stats.checks,
            music: self.music,
            sfx: self.sfx,
            notices: self.collected,
        };
        log::info!(
            "Session '{}' finished: {} drift checks, music max drift {:.3}s, sfx max drift {:.3}s",
            report.script,
            report.drift_checks,
            report.music.max_drift_secs,
            report.sfx.max_drift_secs
        );
        report
    }
}

/// Convenience wrapper used by the binary.
pub fn run_session(config: &FaderConfig, script: &SessionScript) -> SessionReport {
    SessionRunner::new(config, script).run(script)
}
