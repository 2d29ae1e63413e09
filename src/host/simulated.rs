// =============================================================================
// SIMULATED HOST
// =============================================================================
//
// In-memory stand-in for the host media layer. Executes player commands
// against three MediaTrack models, advances them with wall-clock steps and
// reports the same events a browser media element would.
//
// Faults can be injected per track: playback rate skew (drift), stalls, and
// rejected play() calls.
//
// =============================================================================

use crate::core::{MediaTrack, ReadyLevel, Timestamp, TrackId, TrackSet};
use crate::player::{MediaCommand, MediaEvent, TrackAction};
use std::time::Duration;

pub const AUTOPLAY_REJECTION: &str = "NotAllowedError: play() failed because the user didn't interact with the document first";

#[derive(Debug, Clone)]
pub struct SimulatedTrack {
    pub media: MediaTrack,
    /// Media seconds advanced per wall-clock second.
    pub rate: f64,
    pub stalled: bool,
    /// Number of upcoming play() calls to reject.
    pub rejections_left: u32,
    pub play_calls: u32,
}

impl SimulatedTrack {
    fn new(duration: f64) -> Self {
        Self {
            media: MediaTrack::with_duration(duration),
            rate: 1.0,
            stalled: false,
            rejections_left: 0,
            play_calls: 0,
        }
    }

    fn is_advancing(&self) -> bool {
        !self.media.paused && !self.stalled
    }
}

#[derive(Debug)]
pub struct SimulatedHost {
    tracks: TrackSet<SimulatedTrack>,
    now: Timestamp,
    events: Vec<(TrackId, MediaEvent)>,
}

impl SimulatedHost {
    pub fn new(duration: f64) -> Self {
        Self {
            tracks: TrackSet::new(
                SimulatedTrack::new(duration),
                SimulatedTrack::new(duration),
                SimulatedTrack::new(duration),
            ),
            now: Timestamp::ZERO,
            events: Vec::new(),
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    pub fn track(&self, track: TrackId) -> &SimulatedTrack {
        self.tracks.get(track)
    }

    pub fn set_rate(&mut self, track: TrackId, rate: f64) {
        if rate.is_finite() && rate >= 0.0 {
            self.tracks.get_mut(track).rate = rate;
        }
    }

    pub fn reject_plays(&mut self, track: TrackId, count: u32) {
        self.tracks.get_mut(track).rejections_left = count;
    }

    pub fn stall(&mut self, track: TrackId) {
        let sim = self.tracks.get_mut(track);
        if !sim.stalled {
            sim.stalled = true;
            sim.media.ready_level = ReadyLevel::CurrentData;
            self.events.push((track, MediaEvent::Stalled));
        }
    }

    pub fn recover(&mut self, track: TrackId) {
        let sim = self.tracks.get_mut(track);
        if sim.stalled {
            sim.stalled = false;
            sim.media.ready_level = ReadyLevel::EnoughData;
            self.events.push((track, MediaEvent::Recovered));
        }
    }

    /// Absolute distance between a follower and the master, in seconds.
    pub fn drift(&self, follower: TrackId) -> f64 {
        (self.tracks.get(follower).media.position - self.tracks.get(TrackId::Video).media.position).abs()
    }

    pub fn take_events(&mut self) -> Vec<(TrackId, MediaEvent)> {
        std::mem::take(&mut self.events)
    }

    pub fn apply(&mut self, commands: &[MediaCommand]) {
        for command in commands {
            self.execute(command);
        }
    }

    fn execute(&mut self, command: &MediaCommand) {
        let track = command.track;
        let sim = self.tracks.get_mut(track);
        match &command.action {
            TrackAction::Load => {
                let duration = sim.media.duration.unwrap_or(0.0);
                sim.media.ready_level = ReadyLevel::EnoughData;
                sim.media.add_buffered(0.0, duration);
                self.events.push((track, MediaEvent::DurationChanged(duration)));
                self.events.push((track, MediaEvent::ReadyLevelChanged(ReadyLevel::Metadata)));
                self.events.push((track, MediaEvent::ReadyLevelChanged(ReadyLevel::EnoughData)));
            }
            TrackAction::Play => {
                sim.play_calls += 1;
                if sim.rejections_left > 0 {
                    sim.rejections_left -= 1;
                    self.events
                        .push((track, MediaEvent::PlayRejected(AUTOPLAY_REJECTION.to_string())));
                } else if sim.media.paused {
                    sim.media.paused = false;
                    self.events.push((track, MediaEvent::PlayStarted));
                }
            }
            TrackAction::Pause => {
                if !sim.media.paused {
                    sim.media.paused = true;
                    self.events.push((track, MediaEvent::Paused));
                }
            }
            TrackAction::SeekTo(seconds) => {
                sim.media.set_position(*seconds);
                let position = sim.media.position;
                self.events.push((track, MediaEvent::PositionChanged(position)));
                self.events.push((track, MediaEvent::Seeked));
            }
            TrackAction::SetVolume(volume) => {
                sim.media.volume = volume.clamp(0.0, 1.0);
            }
        }
    }

    /// Advances wall-clock time and every running track with it.
    pub fn step(&mut self, elapsed: Duration) {
        self.now = self.now + elapsed;
        let seconds = elapsed.as_secs_f64();

        // Followers report first so the master's update sees fresh positions
        for track in [TrackId::Music, TrackId::Sfx, TrackId::Video] {
            let sim = self.tracks.get_mut(track);
            if !sim.is_advancing() {
                continue;
            }

            let target = sim.media.position + seconds * sim.rate;
            sim.media.set_position(target);
            let position = sim.media.position;
            self.events.push((track, MediaEvent::PositionChanged(position)));

            let finished = sim.media.duration.is_some_and(|d| position >= d);
            if finished {
                sim.media.paused = true;
                self.events.push((track, MediaEvent::PlaybackEnded));
            }
        }
    }
}
