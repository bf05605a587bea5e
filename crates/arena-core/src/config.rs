//! Round configuration

use serde::{Deserialize, Serialize};

use crate::{ArenaError, ArenaResult, Phase};

/// Round configuration. All durations are whole seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoundConfig {
    /// Number of pools on the board
    pub pool_count: u32,
    /// Length of the betting window
    pub betting_secs: u32,
    /// Pause between lock and attack
    pub lock_secs: u32,
    /// Presentation window after the attack
    pub attack_secs: u32,
}

impl Default for RoundConfig {
    fn default() -> Self {
        // Eight barns, one minute of betting
        RoundConfig {
            pool_count: 8,
            betting_secs: 60,
            lock_secs: 2,
            attack_secs: 3,
        }
    }
}

impl RoundConfig {
    /// Short rounds for demos and simulations
    pub fn quick() -> Self {
        RoundConfig {
            pool_count: 4,
            betting_secs: 5,
            lock_secs: 1,
            attack_secs: 1,
        }
    }

    pub fn with_pool_count(mut self, pool_count: u32) -> Self {
        self.pool_count = pool_count;
        self
    }

    /// Check the recognized options against their allowed ranges
    pub fn validate(&self) -> ArenaResult<()> {
        if self.pool_count < 2 {
            return Err(ArenaError::InvalidConfig(format!(
                "pool_count must be at least 2, got {}",
                self.pool_count
            )));
        }
        for (name, secs) in [
            ("betting_secs", self.betting_secs),
            ("lock_secs", self.lock_secs),
            ("attack_secs", self.attack_secs),
        ] {
            if secs == 0 {
                return Err(ArenaError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        Ok(())
    }

    /// Clock duration for a phase; `Result` is not timed
    pub fn duration_of(&self, phase: Phase) -> Option<u32> {
        match phase {
            Phase::Betting => Some(self.betting_secs),
            Phase::Locked => Some(self.lock_secs),
            Phase::Attack => Some(self.attack_secs),
            Phase::Result => None,
        }
    }

    /// Seconds from round start to settlement
    pub fn cycle_secs(&self) -> u32 {
        self.betting_secs + self.lock_secs + self.attack_secs
    }
}
