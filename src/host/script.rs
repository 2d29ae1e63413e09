use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::TrackId;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("Failed to parse session script: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Media duration must be positive, got {0}")]
    InvalidDuration(f64),
    #[error("Simulation step must be at least 1ms")]
    ZeroStep,
    #[error("Step {index} at {at_ms}ms is earlier than the step before it")]
    UnorderedSteps { index: usize, at_ms: u64 },
}

/// Something that happens at a point in a simulated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptAction {
    PlayPause,
    Seek { seconds: f64 },
    SeekFraction { fraction: f64 },
    Mix { level: f64 },
    Stall { track: TrackId },
    Recover { track: TrackId },
    RejectPlays { track: TrackId, count: u32 },
    SetRate { track: TrackId, rate: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptStep {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

fn default_step_ms() -> u64 {
    50
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionScript {
    pub name: String,
    pub duration_secs: f64,
    /// How long to simulate, in wall-clock milliseconds.
    pub run_ms: u64,
    #[serde(default = "default_step_ms")]
    pub step_ms: u64,
    #[serde(default)]
    pub steps: Vec<ScriptStep>,
}

impl SessionScript {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read script {}: {}", path.display(), e))?;
        let script = Self::from_json(&content)?;
        log::info!("Loaded session script '{}' from {}", script.name, path.display());
        Ok(script)
    }

    pub fn from_json(content: &str) -> Result<Self, ScriptError> {
        let script: Self = serde_json::from_str(content)?;
        script.validate()?;
        Ok(script)
    }

    pub fn validate(&self) -> Result<(), ScriptError> {
        if !(self.duration_secs.is_finite() && self.duration_secs > 0.0) {
            return Err(ScriptError::InvalidDuration(self.duration_secs));
        }
        if self.step_ms == 0 {
            return Err(ScriptError::ZeroStep);
        }
        for (index, pair) in self.steps.windows(2).enumerate() {
            if pair[1].at_ms < pair[0].at_ms {
                return Err(ScriptError::UnorderedSteps {
                    index: index + 1,
                    at_ms: pair[1].at_ms,
                });
            }
        }
        Ok(())
    }

    /// Built-in session: autoplay-blocked sfx, drifting music, a stall, a
    /// seek and a fader sweep over a 20 second clip.
    pub fn demo() -> Self {
        let step = |at_ms: u64, action: ScriptAction| ScriptStep { at_ms, action };
        Self {
            name: "demo".to_string(),
            duration_secs: 20.0,
            run_ms: 25_000,
            step_ms: default_step_ms(),
            steps: vec![
                step(0, ScriptAction::SetRate { track: TrackId::Music, rate: 1.03 }),
                step(0, ScriptAction::RejectPlays { track: TrackId::Sfx, count: 2 }),
                step(500, ScriptAction::PlayPause),
                step(3_000, ScriptAction::Mix { level: 0.2 }),
                step(5_000, ScriptAction::Stall { track: TrackId::Video }),
                step(6_500, ScriptAction::Recover { track: TrackId::Video }),
                step(9_000, ScriptAction::SeekFraction { fraction: 0.25 }),
                step(12_000, ScriptAction::Mix { level: 0.9 }),
                step(14_000, ScriptAction::PlayPause),
                step(15_000, ScriptAction::PlayPause),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let json = r#"{
            "name": "seek test",
            "duration_secs": 30.0,
            "run_ms": 5000,
            "steps": [
                { "at_ms": 0, "action": "play_pause" },
                { "at_ms": 1000, "action": "seek", "seconds": 12.5 },
                { "at_ms": 1500, "action": "stall", "track": "video" },
                { "at_ms": 2000, "action": "reject_plays", "track": "music", "count": 5 }
            ]
        }"#;

        let script = SessionScript::from_json(json).expect("Failed to parse script");
        assert_eq!(script.step_ms, 50);
        assert_eq!(script.steps.len(), 4);
        assert_eq!(script.steps[1].action, ScriptAction::Seek { seconds: 12.5 });
        assert_eq!(script.steps[2].action, ScriptAction::Stall { track: TrackId::Video });
        assert_eq!(
            script.steps[3].action,
            ScriptAction::RejectPlays { track: TrackId::Music, count: 5 }
        );
    }

    #[test]
    fn test_unordered_steps_rejected() {
        let json = r#"{
            "name": "bad",
            "duration_secs": 10.0,
            "run_ms": 1000,
            "steps": [
                { "at_ms": 500, "action": "play_pause" },
                { "at_ms": 100, "action": "play_pause" }
            ]
        }"#;

        match SessionScript::from_json(json) {
            Err(ScriptError::UnorderedSteps { index, at_ms }) => {
                assert_eq!(index, 1);
                assert_eq!(at_ms, 100);
            }
            other => panic!("Unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_duration_and_step() {
        let json = r#"{ "name": "x", "duration_secs": 0.0, "run_ms": 10 }"#;
        assert!(matches!(SessionScript::from_json(json), Err(ScriptError::InvalidDuration(_))));

        let json = r#"{ "name": "x", "duration_secs": 5.0, "run_ms": 10, "step_ms": 0 }"#;
        assert!(matches!(SessionScript::from_json(json), Err(ScriptError::ZeroStep)));

        assert!(matches!(SessionScript::from_json("{"), Err(ScriptError::Parse(_))));
    }

    #[test]
    fn test_demo_script_is_valid() {
        let script = SessionScript::demo();
        assert!(script.validate().is_ok());
        assert!(!script.steps.is_empty());
    }
}
