//! Settlement - proportional share table of a round
//!
//! The default policy: inside each surviving pool, a staker's share is
//! their stake over the pool total. The eliminated pool is reported as
//! forfeited and never redistributed here. Ledgers that want to hand the
//! forfeit to survivors can use [`Settlement::pro_rata`].

use arena_core::{Amount, ParticipantId, PoolId};
use serde::{Deserialize, Serialize};

/// One participant's position in a surviving pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub participant: ParticipantId,
    pub stake: Amount,
    /// stake / pool total, in (0, 1]
    pub weight: f64,
}

/// Share table of one surviving pool
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PoolSettlement {
    pub pool: PoolId,
    pub total: Amount,
    /// Ordered by participant id
    pub shares: Vec<Share>,
}

/// The eliminated pool
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forfeit {
    pub pool: PoolId,
    pub amount: Amount,
    pub stakers: Vec<ParticipantId>,
}

/// Settlement of a round
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Settlement {
    /// Surviving pools in board order
    pub pools: Vec<PoolSettlement>,
    /// Eliminated pool, once the attack happened
    pub forfeited: Option<Forfeit>,
}

impl Settlement {
    pub fn pool(&self, id: PoolId) -> Option<&PoolSettlement> {
        self.pools.iter().find(|p| p.pool == id)
    }

    /// A participant's surviving share, if any
    pub fn share_of(&self, participant: ParticipantId) -> Option<(PoolId, &Share)> {
        self.pools.iter().find_map(|pool| {
            pool.shares
                .iter()
                .find(|s| s.participant == participant)
                .map(|share| (pool.pool, share))
        })
    }

    /// Whether a participant's stake was forfeited
    pub fn is_forfeited(&self, participant: ParticipantId) -> bool {
        self.forfeited
            .as_ref()
            .map_or(false, |f| f.stakers.contains(&participant))
    }

    /// Sum of all surviving pool totals
    pub fn surviving_total(&self) -> Amount {
        self.pools
            .iter()
            .fold(0, |acc: Amount, p| acc.saturating_add(p.total))
    }

    pub fn forfeited_amount(&self) -> Amount {
        self.forfeited.as_ref().map_or(0, |f| f.amount)
    }

    /// Split `pot` across every surviving staker by stake weight.
    ///
    /// Integer split by largest remainder: the parts always sum to `pot`.
    /// Ties on the remainder go to the lower participant id. Returns an
    /// empty split when no stake survived.
    pub fn pro_rata(&self, pot: Amount) -> Vec<(ParticipantId, Amount)> {
        let stakes: Vec<(ParticipantId, Amount)> = self
            .pools
            .iter()
            .flat_map(|p| p.shares.iter().map(|s| (s.participant, s.stake)))
            .collect();
        let total: u128 = stakes.iter().map(|(_, s)| *s as u128).sum();
        if total == 0 {
            return Vec::new();
        }

        let mut parts: Vec<(ParticipantId, Amount, u128)> = stakes
            .iter()
            .map(|(participant, stake)| {
                let scaled = pot as u128 * *stake as u128;
                (*participant, (scaled / total) as Amount, scaled % total)
            })
            .collect();

        let assigned: Amount = parts.iter().map(|(_, base, _)| *base).sum();
        let mut leftover = pot - assigned;

        let mut order: Vec<usize> = (0..parts.len()).collect();
        order.sort_by(|&a, &b| parts[b].2.cmp(&parts[a].2).then(parts[a].0.cmp(&parts[b].0)));
        for i in order {
            if leftover == 0 {
                break;
            }
            parts[i].1 += 1;
            leftover -= 1;
        }

        parts
            .into_iter()
            .map(|(participant, amount, _)| (participant, amount))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PoolRegistry;

    fn p(id: u64) -> ParticipantId {
        ParticipantId::new(id)
    }

    #[test]
    fn test_pro_rata_sums_to_pot() {
        let mut registry = PoolRegistry::new(3);
        registry.place_stake(p(1), PoolId::new(1), 1).unwrap();
        registry.place_stake(p(2), PoolId::new(1), 1).unwrap();
        registry.place_stake(p(3), PoolId::new(2), 1).unwrap();
        let settlement = registry.settlement_view();

        let split = settlement.pro_rata(100);
        assert_eq!(split.iter().map(|(_, a)| a).sum::<Amount>(), 100);
        // 33 each, the extra unit goes to the lowest id
        assert_eq!(split, vec![(p(1), 34), (p(2), 33), (p(3), 33)]);
    }

    #[test]
    fn test_pro_rata_follows_stake_weight() {
        let mut registry = PoolRegistry::new(2);
        registry.place_stake(p(1), PoolId::new(1), 300).unwrap();
        registry.place_stake(p(2), PoolId::new(2), 100).unwrap();
        let split = registry.settlement_view().pro_rata(1_000);
        assert_eq!(split, vec![(p(1), 750), (p(2), 250)]);
    }

    #[test]
    fn test_pro_rata_without_survivors() {
        let mut registry = PoolRegistry::new(2);
        registry.place_stake(p(1), PoolId::new(1), 10).unwrap();
        registry.eliminate(PoolId::new(1)).unwrap();
        let settlement = registry.settlement_view();

        assert!(settlement.pro_rata(10).is_empty());
        assert!(settlement.is_forfeited(p(1)));
        assert_eq!(settlement.forfeited_amount(), 10);
    }

    #[test]
    fn test_share_lookup() {
        let mut registry = PoolRegistry::new(4);
        registry.place_stake(p(7), PoolId::new(4), 12).unwrap();
        let settlement = registry.settlement_view();

        let (pool, share) = settlement.share_of(p(7)).unwrap();
        assert_eq!(pool, PoolId::new(4));
        assert_eq!(share.stake, 12);
        assert_eq!(share.weight, 1.0);
        assert!(settlement.share_of(p(8)).is_none());
        assert!(!settlement.is_forfeited(p(7)));
    }
}
