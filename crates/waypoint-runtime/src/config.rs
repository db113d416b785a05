// config.rs — Execution loop configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_tick_interval_ms() -> u64 {
    5_000
}

fn default_join_timeout_ms() -> u64 {
    5_000
}

/// Timing knobs for the background worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoopConfig {
    /// Wall-clock interval between ticks, in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// How long `stop()` waits for the in-flight tick before detaching,
    /// in milliseconds. Best-effort shutdown, not guaranteed-clean.
    #[serde(default = "default_join_timeout_ms")]
    pub join_timeout_ms: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            join_timeout_ms: default_join_timeout_ms(),
        }
    }
}

impl LoopConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn join_timeout(&self) -> Duration {
        Duration::from_millis(self.join_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_on_empty_input() {
        let config: LoopConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.tick_interval(), Duration::from_secs(5));
        assert_eq!(config.join_timeout(), Duration::from_secs(5));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config: LoopConfig =
            serde_json::from_str(r#"{"tick_interval_ms": 250}"#).unwrap();
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.join_timeout(), Duration::from_secs(5));
    }
}
