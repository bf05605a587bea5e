//! Read-only view of a round

use std::collections::BTreeMap;

use arena_core::{Amount, ParticipantId, Phase, PoolId, RoundId};
use arena_state::{Pool, Settlement};
use serde::{Deserialize, Serialize};

/// Snapshot of a round for renderers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoundSnapshot {
    pub round: RoundId,
    pub phase: Phase,
    /// Seconds left in the current phase
    pub countdown: u32,
    pub pools: Vec<Pool>,
    pub selections: BTreeMap<ParticipantId, PoolId>,
    pub eliminated: Option<PoolId>,
    /// Present once the round reached RESULT
    pub settlement: Option<Settlement>,
}

impl RoundSnapshot {
    /// Pool totals in board order
    pub fn totals(&self) -> Vec<Amount> {
        self.pools.iter().map(Pool::total).collect()
    }

    pub fn total_staked(&self) -> Amount {
        self.pools
            .iter()
            .fold(0, |acc: Amount, p| acc.saturating_add(p.total()))
    }

    pub fn pool(&self, id: PoolId) -> Option<&Pool> {
        self.pools.iter().find(|p| p.id() == id)
    }
}
