//! Pool registry - all stake mutations for one round

use std::collections::BTreeMap;

use arena_core::{Amount, ArenaError, ArenaResult, ParticipantId, PoolId};
use serde::{Deserialize, Serialize};

use crate::{Forfeit, Pool, PoolSettlement, Settlement, Share};

/// Where a participant's stake sat before a placement replaced it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Replaced {
    pub pool: PoolId,
    pub amount: Amount,
}

/// Pool registry - the N pools of one round
/// INVARIANT: every entry in `selections` has exactly one matching stake
/// INVARIANT: at most one pool is eliminated
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolRegistry {
    pools: Vec<Pool>,
    /// Active selection per participant (last write wins)
    selections: BTreeMap<ParticipantId, PoolId>,
    eliminated: Option<PoolId>,
}

impl PoolRegistry {
    /// Create `pool_count` empty pools numbered 1..=pool_count
    pub fn new(pool_count: u32) -> Self {
        PoolRegistry {
            pools: (1..=pool_count).map(|id| Pool::new(PoolId::new(id))).collect(),
            selections: BTreeMap::new(),
            eliminated: None,
        }
    }

    pub fn pool_count(&self) -> u32 {
        self.pools.len() as u32
    }

    pub fn pools(&self) -> &[Pool] {
        &self.pools
    }

    pub fn pool(&self, id: PoolId) -> Option<&Pool> {
        if id.is_within(self.pool_count()) {
            self.pools.get(id.index())
        } else {
            None
        }
    }

    pub fn selections(&self) -> &BTreeMap<ParticipantId, PoolId> {
        &self.selections
    }

    pub fn selection_of(&self, participant: ParticipantId) -> Option<PoolId> {
        self.selections.get(&participant).copied()
    }

    /// Current pool and amount of a participant's stake
    pub fn stake_of(&self, participant: ParticipantId) -> Option<(PoolId, Amount)> {
        let pool = self.selection_of(participant)?;
        let amount = self.pools[pool.index()].stake_of(participant)?;
        Some((pool, amount))
    }

    pub fn eliminated(&self) -> Option<PoolId> {
        self.eliminated
    }

    /// Sum of all pool totals
    pub fn total_staked(&self) -> Amount {
        self.pools
            .iter()
            .fold(0, |acc: Amount, pool| acc.saturating_add(pool.total()))
    }

    /// Check pool id and amount without touching any state
    pub fn validate(&self, pool: PoolId, amount: Amount) -> ArenaResult<()> {
        if !pool.is_within(self.pool_count()) {
            return Err(ArenaError::InvalidPool {
                pool,
                pool_count: self.pool_count(),
            });
        }
        if amount == 0 {
            return Err(ArenaError::InvalidAmount(amount));
        }
        Ok(())
    }

    /// Place or replace a participant's stake.
    ///
    /// A participant holds at most one stake. A placement on another pool
    /// debits the old pool and credits the new one; a placement on the same
    /// pool overwrites the amount. Every check runs before the first
    /// mutation, so a rejected call changes nothing.
    pub fn place_stake(
        &mut self,
        participant: ParticipantId,
        pool: PoolId,
        amount: Amount,
    ) -> ArenaResult<Option<Replaced>> {
        self.validate(pool, amount)?;

        let previous = self.stake_of(participant);
        let target_total = self.pools[pool.index()].total();
        let base = match previous {
            Some((prev_pool, prev_amount)) if prev_pool == pool => target_total - prev_amount,
            _ => target_total,
        };
        if base.checked_add(amount).is_none() {
            return Err(ArenaError::InvalidAmount(amount));
        }

        if let Some((prev_pool, _)) = previous {
            self.pools[prev_pool.index()].debit(participant);
        }
        self.pools[pool.index()].credit(participant, amount);
        self.selections.insert(participant, pool);

        tracing::debug!(
            participant = %participant,
            pool = %pool,
            amount,
            moved_from = ?previous.map(|(p, _)| p),
            "stake placed"
        );

        Ok(previous.map(|(pool, amount)| Replaced { pool, amount }))
    }

    /// Destroy a pool. Returns the forfeited total.
    pub fn eliminate(&mut self, pool: PoolId) -> ArenaResult<Amount> {
        if let Some(already) = self.eliminated {
            return Err(ArenaError::AlreadyEliminated(already));
        }
        if !pool.is_within(self.pool_count()) {
            return Err(ArenaError::InvalidPool {
                pool,
                pool_count: self.pool_count(),
            });
        }

        let target = &mut self.pools[pool.index()];
        target.mark_eliminated();
        self.eliminated = Some(pool);
        Ok(target.total())
    }

    /// Proportional share table of the surviving pools
    pub fn settlement_view(&self) -> Settlement {
        let mut pools = Vec::with_capacity(self.pools.len());
        let mut forfeited = None;

        for pool in &self.pools {
            if pool.is_eliminated() {
                forfeited = Some(Forfeit {
                    pool: pool.id(),
                    amount: pool.total(),
                    stakers: pool.stakes().keys().copied().collect(),
                });
                continue;
            }

            let total = pool.total();
            let shares = pool
                .stakes()
                .iter()
                .map(|(participant, stake)| Share {
                    participant: *participant,
                    stake: *stake,
                    weight: *stake as f64 / total as f64,
                })
                .collect();

            pools.push(PoolSettlement {
                pool: pool.id(),
                total,
                shares,
            });
        }

        Settlement { pools, forfeited }
    }

    /// Check every bookkeeping invariant
    pub fn is_consistent(&self) -> bool {
        let pools_ok = self.pools.iter().all(Pool::is_consistent);
        let selections_ok = self
            .selections
            .iter()
            .all(|(participant, pool)| self.pools[pool.index()].stake_of(*participant).is_some());
        let stakes_count: usize = self.pools.iter().map(Pool::staker_count).sum();
        let eliminated_count = self.pools.iter().filter(|p| p.is_eliminated()).count();

        pools_ok
            && selections_ok
            && stakes_count == self.selections.len()
            && eliminated_count <= 1
            && eliminated_count == self.eliminated.is_some() as usize
    }
}
