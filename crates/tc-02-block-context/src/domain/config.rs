//! # Manager Configuration

use std::time::Duration;

/// Configuration for the block context manager.
#[derive(Debug, Clone)]
pub struct BlockContextConfig {
    /// How often finished contexts are evicted from the map.
    pub sweep_interval: Duration,
}

impl Default for BlockContextConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(5 * 60),
        }
    }
}

impl BlockContextConfig {
    pub fn for_testing() -> Self {
        Self {
            sweep_interval: Duration::from_millis(100),
        }
    }

    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }
}
