use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables for the orchestration core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Version string the running binary reports against update checks.
    pub current_version: String,
    /// How often the update coordinator checks on its own.
    #[serde(with = "humantime_serde")]
    pub update_check_interval: Duration,
    /// How long a notification stays visible before it expires.
    #[serde(with = "humantime_serde")]
    pub notification_ttl: Duration,
    /// How often expired notifications are swept out.
    #[serde(with = "humantime_serde")]
    pub notification_sweep_interval: Duration,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            current_version: env!("CARGO_PKG_VERSION").to_string(),
            update_check_interval: Duration::from_secs(300),
            notification_ttl: Duration::from_secs(5),
            notification_sweep_interval: Duration::from_secs(1),
        }
    }
}
