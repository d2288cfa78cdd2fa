//! Document store configuration.

use serde::{Deserialize, Serialize};

/// Settings for the in-process document store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Buffered emissions per live query before the producer waits.
    #[serde(default = "default_live_buffer")]
    pub live_buffer_size: usize,
    /// Capacity of the internal change broadcast.
    #[serde(default = "default_change_buffer")]
    pub change_buffer_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            live_buffer_size: default_live_buffer(),
            change_buffer_size: default_change_buffer(),
        }
    }
}

fn default_live_buffer() -> usize {
    16
}

fn default_change_buffer() -> usize {
    1024
}
