use super::SweepSettings;
use std::time::Duration;

/// Schedule for the background sweeper.
#[derive(Clone, Copy, Debug)]
pub struct SweepConfig {
    pub interval: Duration,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(60 * 60),
        }
    }
}

impl From<&SweepSettings> for SweepConfig {
    fn from(settings: &SweepSettings) -> Self {
        Self {
            interval: Duration::from_secs(settings.interval_secs),
        }
    }
}
