//! Table configuration

use std::time::Duration;

use arena_core::{ArenaError, ArenaResult, RoundConfig};
use serde::{Deserialize, Serialize};

/// Table configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableConfig {
    /// Round timing and board size
    pub round: RoundConfig,
    /// Wall-clock length of one round second
    pub tick_interval_ms: u64,
    /// Capacity of the command queue
    pub command_buffer: usize,
    /// Ticks to linger in RESULT before opening the next round.
    /// `None` waits for an explicit reset.
    pub auto_reset_after: Option<u32>,
}

impl Default for TableConfig {
    fn default() -> Self {
        TableConfig {
            round: RoundConfig::default(),
            tick_interval_ms: 1_000,
            command_buffer: 1_024,
            auto_reset_after: None,
        }
    }
}

impl TableConfig {
    /// Continuous play: fast ticks, next round five ticks after settlement
    pub fn continuous(round: RoundConfig, tick_interval: Duration) -> Self {
        TableConfig {
            round,
            tick_interval_ms: tick_interval.as_millis() as u64,
            auto_reset_after: Some(5),
            ..TableConfig::default()
        }
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json(json: &str) -> ArenaResult<Self> {
        let config: TableConfig =
            serde_json::from_str(json).map_err(|e| ArenaError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ArenaResult<()> {
        self.round.validate()?;
        if self.tick_interval_ms == 0 {
            return Err(ArenaError::InvalidConfig(
                "tick_interval_ms must be positive".into(),
            ));
        }
        if self.command_buffer == 0 {
            return Err(ArenaError::InvalidConfig(
                "command_buffer must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}
