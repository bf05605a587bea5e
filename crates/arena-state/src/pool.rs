//! A single pool ("barn")

use std::collections::BTreeMap;

use arena_core::{Amount, ParticipantId, PoolId};
use serde::{Deserialize, Serialize};

/// Pool - aggregated stakes placed on one barn
/// INVARIANT: total == sum of stakes
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    id: PoolId,
    total: Amount,
    stakes: BTreeMap<ParticipantId, Amount>,
    eliminated: bool,
}

impl Pool {
    pub fn new(id: PoolId) -> Self {
        Pool {
            id,
            total: 0,
            stakes: BTreeMap::new(),
            eliminated: false,
        }
    }

    pub fn id(&self) -> PoolId {
        self.id
    }

    /// Running stake total
    pub fn total(&self) -> Amount {
        self.total
    }

    pub fn stakes(&self) -> &BTreeMap<ParticipantId, Amount> {
        &self.stakes
    }

    pub fn stake_of(&self, participant: ParticipantId) -> Option<Amount> {
        self.stakes.get(&participant).copied()
    }

    pub fn staker_count(&self) -> usize {
        self.stakes.len()
    }

    pub fn is_eliminated(&self) -> bool {
        self.eliminated
    }

    /// Add a stake. Caller has checked that the total cannot overflow
    /// and that the participant holds no stake here.
    pub(crate) fn credit(&mut self, participant: ParticipantId, amount: Amount) {
        self.stakes.insert(participant, amount);
        self.total += amount;
    }

    /// Remove a participant's stake, returning it
    pub(crate) fn debit(&mut self, participant: ParticipantId) -> Option<Amount> {
        let amount = self.stakes.remove(&participant)?;
        self.total -= amount;
        Some(amount)
    }

    pub(crate) fn mark_eliminated(&mut self) {
        self.eliminated = true;
    }

    /// Recompute the total from the stake table
    pub fn is_consistent(&self) -> bool {
        self.stakes
            .values()
            .try_fold(0u64, |acc, v| acc.checked_add(*v))
            == Some(self.total)
    }
}
