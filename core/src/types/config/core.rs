use std::path::PathBuf;
use std::time::Duration;

/// Runtime configuration for opening a `ShareStore`.
#[derive(Clone, Debug)]
pub struct Config {
    pub base_path: PathBuf,
    pub saved: SavedConfig,
}

/// Limits and grace periods applied by the store.
#[derive(Clone, Debug)]
pub struct SavedConfig {
    pub max_text_chars: usize,
    pub max_file_bytes: u64,
    /// How long bytes of a consumed instant-expire file stay on disk so an
    /// in-flight download can finish.
    pub retired_blob_grace: Duration,
    /// Minimum age before an unreferenced blob file is treated as orphaned.
    pub orphan_grace: Duration,
}

impl SavedConfig {
    /// Longest grace period the store honors. Larger values are clamped.
    pub const MAX_GRACE: Duration = Duration::from_secs(365 * 24 * 60 * 60);
}

impl Default for SavedConfig {
    fn default() -> Self {
        Self {
            max_text_chars: 500,
            max_file_bytes: 50 * 1024 * 1024,
            retired_blob_grace: Duration::from_secs(60 * 60),
            orphan_grace: Duration::from_secs(60 * 60),
        }
    }
}

impl Config {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
            saved: SavedConfig::default(),
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.base_path.join("vanish.redb")
    }

    pub fn blobs_path(&self) -> PathBuf {
        self.base_path.join("blobs")
    }
}
