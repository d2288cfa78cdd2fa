//! Notification feed configuration.

use serde::{Deserialize, Serialize};

/// Settings for the reconciled notification feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Maximum number of notifications kept in the reconciled list.
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    /// How far back comments and status changes are considered, in days.
    #[serde(default = "default_lookback_days")]
    pub lookback_days: u32,
    /// Capacity of the fan-in channel between watchers and the aggregator.
    #[serde(default = "default_event_buffer")]
    pub event_buffer_size: usize,
}

impl NotificationConfig {
    /// Lookback window as a `chrono` duration.
    pub fn lookback(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.lookback_days))
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            max_items: default_max_items(),
            lookback_days: default_lookback_days(),
            event_buffer_size: default_event_buffer(),
        }
    }
}

fn default_max_items() -> usize {
    50
}

fn default_lookback_days() -> u32 {
    7
}

fn default_event_buffer() -> usize {
    256
}
