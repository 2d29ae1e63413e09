// =============================================================================
// EVENTS, COMMANDS AND NOTICES
// =============================================================================
//
// Host media layer  --MediaEvent-->   FaderPlayer
// FaderPlayer       --MediaCommand--> host media layer
// FaderPlayer       --PlayerNotice--> any subscribed UI collaborator
//
// =============================================================================

use serde::{Deserialize, Serialize};
use crate::core::{ReadyLevel, TrackId};

/// Events reported by the host for one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum MediaEvent {
    PositionChanged(f64),
    DurationChanged(f64),
    ReadyLevelChanged(ReadyLevel),
    /// The track ran out of data and is waiting on the network
    Stalled,
    Recovered,
    /// A seek on this track finished
    Seeked,
    /// The host paused the track on its own
    Paused,
    PlaybackEnded,
    PlayStarted,
    PlayRejected(String),
}

/// What the host should do to one track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum TrackAction {
    Play,
    Pause,
    SeekTo(f64),
    SetVolume(f64),
    /// Force the track to re-buffer
    Load,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaCommand {
    pub track: TrackId,
    pub action: TrackAction,
}

impl MediaCommand {
    pub fn new(track: TrackId, action: TrackAction) -> Self {
        Self { track, action }
    }

    pub fn is_seek(&self) -> bool {
        matches!(self.action, TrackAction::SeekTo(_))
    }

    pub fn is_play(&self) -> bool {
        matches!(self.action, TrackAction::Play)
    }
}

/// Status updates for UI collaborators (spinner, warnings)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerNotice {
    /// The master can now sustain playback; play requests are accepted
    Ready,
    Buffering { active: bool },
    /// A follower gave up starting and stays silent until the next play request
    TrackSilenced { track: TrackId, reason: String },
    /// The host refused to start the master
    PlaybackBlocked { reason: String },
}

/// Everything produced while handling one input
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Outbox {
    pub commands: Vec<MediaCommand>,
    pub notices: Vec<PlayerNotice>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn command(&mut self, track: TrackId, action: TrackAction) {
        self.commands.push(MediaCommand::new(track, action));
    }

    pub fn notice(&mut self, notice: PlayerNotice) {
        self.notices.push(notice);
    }
}
