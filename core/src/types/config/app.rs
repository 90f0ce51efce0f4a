use super::{Config, SavedConfig, SweepConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

const BYTES_PER_MIB: u64 = 1024 * 1024;

fn within(value: u64, min: u64, max: u64) -> bool {
    (min..=max).contains(&value)
}

/// Operator-facing configuration, persisted as `vanish.toml`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub limits: LimitsConfig,
    #[serde(default)]
    pub sweep: SweepSettings,
}

impl AppConfig {
    /// Loads config from a TOML file. Returns default config if file doesn't exist.
    pub fn load(path: &Path) -> Result<Self, AppConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), AppConfigError> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the list of problems; empty when the config is usable as is.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        let max_period = SavedConfig::MAX_GRACE.as_secs();

        if self.limits.max_text_chars == 0 {
            errors.push("limits.max_text_chars must be at least 1".to_string());
        }
        if !within(self.limits.max_file_mib, 1, LimitsConfig::MAX_FILE_MIB) {
            errors.push(format!(
                "limits.max_file_mib must be between 1 and {}",
                LimitsConfig::MAX_FILE_MIB
            ));
        }
        if !within(self.sweep.interval_secs, 1, max_period) {
            errors.push(format!("sweep.interval_secs must be between 1 and {max_period}"));
        }
        if !within(self.sweep.retired_blob_grace_secs, 0, max_period) {
            errors.push(format!("sweep.retired_blob_grace_secs must be at most {max_period}"));
        }
        if !within(self.sweep.orphan_grace_secs, 0, max_period) {
            errors.push(format!("sweep.orphan_grace_secs must be at most {max_period}"));
        }

        errors
    }

    /// Returns a copy with invalid values replaced by their defaults.
    pub fn with_defaults_for_invalid(&self) -> Self {
        let limits = LimitsConfig::default();
        let sweep = SweepSettings::default();
        let max_period = SavedConfig::MAX_GRACE.as_secs();
        let pick = |value: u64, min: u64, max: u64, default: u64| {
            if within(value, min, max) {
                value
            } else {
                default
            }
        };

        Self {
            storage: self.storage.clone(),
            limits: LimitsConfig {
                max_text_chars: if self.limits.max_text_chars == 0 {
                    limits.max_text_chars
                } else {
                    self.limits.max_text_chars
                },
                max_file_mib: pick(
                    self.limits.max_file_mib,
                    1,
                    LimitsConfig::MAX_FILE_MIB,
                    limits.max_file_mib,
                ),
            },
            sweep: SweepSettings {
                interval_secs: pick(self.sweep.interval_secs, 1, max_period, sweep.interval_secs),
                retired_blob_grace_secs: pick(
                    self.sweep.retired_blob_grace_secs,
                    0,
                    max_period,
                    sweep.retired_blob_grace_secs,
                ),
                orphan_grace_secs: pick(
                    self.sweep.orphan_grace_secs,
                    0,
                    max_period,
                    sweep.orphan_grace_secs,
                ),
            },
        }
    }

    pub fn store_config(&self) -> Config {
        Config {
            base_path: self.storage.data_dir.clone(),
            saved: SavedConfig {
                max_text_chars: self.limits.max_text_chars,
                max_file_bytes: self
                    .limits
                    .max_file_mib
                    .checked_mul(BYTES_PER_MIB)
                    .unwrap_or(u64::MAX),
                retired_blob_grace: Duration::from_secs(self.sweep.retired_blob_grace_secs),
                orphan_grace: Duration::from_secs(self.sweep.orphan_grace_secs),
            },
        }
    }

    pub fn sweep_config(&self) -> SweepConfig {
        SweepConfig::from(&self.sweep)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LimitsConfig {
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    #[serde(default = "default_max_file_mib")]
    pub max_file_mib: u64,
}

impl LimitsConfig {
    /// 1 TiB.
    pub const MAX_FILE_MIB: u64 = 1024 * 1024;
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            max_file_mib: default_max_file_mib(),
        }
    }
}

fn default_max_text_chars() -> usize {
    500
}

fn default_max_file_mib() -> u64 {
    50
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SweepSettings {
    #[serde(default = "default_hour_secs")]
    pub interval_secs: u64,
    #[serde(default = "default_hour_secs")]
    pub retired_blob_grace_secs: u64,
    #[serde(default = "default_hour_secs")]
    pub orphan_grace_secs: u64,
}

impl Default for SweepSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_hour_secs(),
            retired_blob_grace_secs: default_hour_secs(),
            orphan_grace_secs: default_hour_secs(),
        }
    }
}

fn default_hour_secs() -> u64 {
    60 * 60
}

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
}
