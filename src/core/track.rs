use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the three media elements the player drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackId {
    Video,
    Music,
    Sfx,
}

impl TrackId {
    pub const ALL: [TrackId; 3] = [TrackId::Video, TrackId::Music, TrackId::Sfx];
    pub const FOLLOWERS: [TrackId; 2] = [TrackId::Music, TrackId::Sfx];

    /// The video track is the timing master; the audio tracks follow it.
    pub fn is_master(self) -> bool {
        matches!(self, TrackId::Video)
    }

    pub fn name(self) -> &'static str {
        match self {
            TrackId::Video => "video",
            TrackId::Music => "music",
            TrackId::Sfx => "sfx",
        }
    }

    fn index(self) -> usize {
        match self {
            TrackId::Video => 0,
            TrackId::Music => 1,
            TrackId::Sfx => 2,
        }
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How much media data a track has available, in increasing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadyLevel {
    #[default]
    Nothing,
    Metadata,
    CurrentData,
    FutureData,
    EnoughData,
}

impl ReadyLevel {
    /// Enough data to play through a short window without stalling.
    pub fn can_play_through(self) -> bool {
        self >= ReadyLevel::FutureData
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaTrack {
    pub position: f64,
    pub duration: Option<f64>,
    pub ready_level: ReadyLevel,
    pub paused: bool,
    pub volume: f64,
    pub buffered: Vec<(f64, f64)>,
}

impl Default for MediaTrack {
    fn default() -> Self {
        Self {
            position: 0.0,
            duration: None,
            ready_level: ReadyLevel::Nothing,
            paused: true,
            volume: 1.0,
            buffered: Vec::new(),
        }
    }
}

impl MediaTrack {
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
            ..Self::default()
        }
    }

    /// Sets the position, never letting it go negative or past a known duration.
    pub fn set_position(&mut self, seconds: f64) {
        let mut position = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        if let Some(duration) = self.duration {
            position = position.min(duration);
        }
        self.position = position;
    }

    pub fn is_buffered_at(&self, seconds: f64) -> bool {
        self.buffered
            .iter()
            .any(|&(start, end)| seconds >= start && seconds <= end)
    }

    /// Adds a buffered range, merging it with any ranges it overlaps so the
    /// list stays ordered and disjoint.
    pub fn add_buffered(&mut self, start: f64, end: f64) {
        if !(start.is_finite() && end.is_finite()) || end < start {
            return;
        }

        let mut merged = (start, end);
        let mut kept = Vec::with_capacity(self.buffered.len() + 1);
        for &(s, e) in &self.buffered {
            if e < merged.0 || s > merged.1 {
                kept.push((s, e));
            } else {
                merged = (merged.0.min(s), merged.1.max(e));
            }
        }
        kept.push(merged);
        kept.sort_by(|a, b| a.0.total_cmp(&b.0));
        self.buffered = kept;
    }
}

/// Fixed-size per-track storage indexed by [`TrackId`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrackSet<T> {
    slots: [T; 3],
}

impl<T> TrackSet<T> {
    pub fn new(video: T, music: T, sfx: T) -> Self {
        Self {
            slots: [video, music, sfx],
        }
    }

    pub fn get(&self, track: TrackId) -> &T {
        &self.slots[track.index()]
    }

    pub fn get_mut(&mut self, track: TrackId) -> &mut T {
        &mut self.slots[track.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = (TrackId, &T)> {
        TrackId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}
