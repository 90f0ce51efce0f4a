mod app;
mod core;
mod sweep;

pub use app::{AppConfig, AppConfigError, LimitsConfig, StorageConfig, SweepSettings};
pub use core::{Config, SavedConfig};
pub use sweep::SweepConfig;
