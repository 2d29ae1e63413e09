use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConfigError {
    #[error("Drift tolerance must be a positive number of seconds, got {0}")]
    InvalidTolerance(f64),
    #[error("Drift check interval must be at least 1ms")]
    InvalidCheckInterval,
    #[error("Resume grace delay must not exceed {max}ms, got {got}ms")]
    ResumeGraceTooLong { got: u64, max: u64 },
    #[error("At least one play attempt is required")]
    NoPlayAttempts,
    #[error("Initial mix level must be within 0.0..=1.0, got {0}")]
    InvalidMixLevel(f64),
}

/// Upper bound for the pause between seek completion and resuming playback.
pub const MAX_RESUME_GRACE_MS: u64 = 100;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Allowed |follower - master| before a follower is re-seeked.
    pub tolerance_secs: f64,
    /// Minimum wall-clock time between two drift checks.
    pub check_interval_ms: u64,
    /// Delay before resuming all tracks after a seek completes.
    pub resume_grace_ms: u64,
    /// Total play attempts per follower, the first one included.
    pub play_attempts: u32,
    pub play_retry_delay_ms: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            tolerance_secs: 0.15,
            check_interval_ms: 250,
            resume_grace_ms: 100,
            play_attempts: 3,
            play_retry_delay_ms: 200,
        }
    }
}

impl SyncConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn resume_grace(&self) -> Duration {
        Duration::from_millis(self.resume_grace_ms)
    }

    pub fn play_retry_delay(&self) -> Duration {
        Duration::from_millis(self.play_retry_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.tolerance_secs.is_finite() && self.tolerance_secs > 0.0) {
            return Err(ConfigError::InvalidTolerance(self.tolerance_secs));
        }
        if self.check_interval_ms == 0 {
            return Err(ConfigError::InvalidCheckInterval);
        }
        if self.resume_grace_ms > MAX_RESUME_GRACE_MS {
            return Err(ConfigError::ResumeGraceTooLong {
                got: self.resume_grace_ms,
                max: MAX_RESUME_GRACE_MS,
            });
        }
        if self.play_attempts == 0 {
            return Err(ConfigError::NoPlayAttempts);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FaderConfig {
    pub sync: SyncConfig,
    pub initial_mix_level: f64, // 0.5 = both tracks at half volume
}

impl Default for FaderConfig {
    fn default() -> Self {
        Self {
            sync: SyncConfig::default(),
            initial_mix_level: 0.5,
        }
    }
}

impl FaderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.sync.validate()?;
        if !(0.0..=1.0).contains(&self.initial_mix_level) {
            return Err(ConfigError::InvalidMixLevel(self.initial_mix_level));
        }
        Ok(())
    }

    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Loads the config at `config_path`, writing defaults there when the file
    /// is missing or rejected.
    pub fn load_from(config_path: &Path) -> anyhow::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to read config file at {}: {}", config_path.display(), e))?;

            match Self::from_json(&content) {
                Ok(config) => {
                    log::info!("Loaded fader config from {}", config_path.display());
                    Ok(config)
                }
                Err(e) => {
                    // Unparsable and out-of-range files both end up here
                    log::warn!(
                        "Rejected fader config at {} ({}), overwriting it with default sync settings",
                        config_path.display(),
                        e
                    );
                    let defaults = Self::default();
                    defaults.save_to(config_path)
                        .map_err(|save_err| anyhow::anyhow!("Failed to replace rejected fader config: {}", save_err))?;
                    Ok(defaults)
                }
            }
        } else {
            log::info!("No fader config yet, writing defaults to {}", config_path.display());
            let config = Self::default();
            config.save_to(config_path)
                .map_err(|e| anyhow::anyhow!("Failed to write default fader config: {}", e))?;
            Ok(config)
        }
    }

    /// Parses and validates a config document.
    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("neuma-fader")
            .join("config.json")
    }
}
