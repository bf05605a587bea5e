//! Round Coordinator - the phase state machine
//!
//! One coordinator owns exactly one live round at a time. Everything that
//! happens to the round goes through four calls:
//! - `place_bet`: accepted only while betting
//! - `tick`: one clock interval; runs `advance` when the clock expires
//! - `advance`: applies a pending expiry, no-op otherwise
//! - `reset`: replaces a finished round with a fresh one

use arena_core::{Amount, ArenaError, ArenaResult, ParticipantId, Phase, PoolId, RoundConfig, RoundId};
use arena_state::{PoolRegistry, Replaced, Settlement};
use arena_time::Countdown;

use crate::{Ledger, OpenLedger, RandomSelector, RoundSnapshot, Selector};

/// State of one game cycle
#[derive(Clone, Debug)]
struct Round {
    id: RoundId,
    phase: Phase,
    clock: Countdown,
    registry: PoolRegistry,
    /// Clock expired and the transition has not run yet
    expiry_pending: bool,
    settlement: Option<Settlement>,
}

impl Round {
    /// Fresh round in BETTING with the betting clock running
    fn open(id: RoundId, config: &RoundConfig) -> ArenaResult<Self> {
        let mut clock = Countdown::new();
        if let Some(secs) = config.duration_of(Phase::Betting) {
            clock.start(secs)?;
        }
        Ok(Round {
            id,
            phase: Phase::Betting,
            clock,
            registry: PoolRegistry::new(config.pool_count),
            expiry_pending: false,
            settlement: None,
        })
    }
}

/// Round Coordinator
pub struct RoundCoordinator {
    config: RoundConfig,
    round: Round,
    selector: Box<dyn Selector>,
    ledger: Box<dyn Ledger>,
}

impl RoundCoordinator {
    /// Coordinator with an entropy-seeded selector and an open ledger
    pub fn new(config: RoundConfig) -> ArenaResult<Self> {
        Self::with_parts(config, RandomSelector::from_entropy(), OpenLedger)
    }

    /// Coordinator with explicit collaborators
    pub fn with_parts(
        config: RoundConfig,
        selector: impl Selector + 'static,
        ledger: impl Ledger + 'static,
    ) -> ArenaResult<Self> {
        config.validate()?;
        let round = Round::open(RoundId::FIRST, &config)?;
        tracing::info!(
            round = %round.id,
            pools = config.pool_count,
            betting_secs = config.betting_secs,
            "round opened"
        );
        Ok(RoundCoordinator {
            config,
            round,
            selector: Box::new(selector),
            ledger: Box::new(ledger),
        })
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    pub fn round_id(&self) -> RoundId {
        self.round.id
    }

    pub fn phase(&self) -> Phase {
        self.round.phase
    }

    /// Seconds left in the current phase
    pub fn countdown(&self) -> u32 {
        self.round.clock.remaining()
    }

    pub fn registry(&self) -> &PoolRegistry {
        &self.round.registry
    }

    /// Place or move a participant's stake.
    ///
    /// Checks run in order: phase, pool and amount, then funds. The round
    /// is only touched once all of them pass.
    pub fn place_bet(
        &mut self,
        participant: ParticipantId,
        pool: PoolId,
        amount: Amount,
    ) -> ArenaResult<Option<Replaced>> {
        let round = &mut self.round;
        let result = if !round.phase.accepts_stakes() {
            Err(ArenaError::BettingClosed(round.phase))
        } else if let Err(e) = round.registry.validate(pool, amount) {
            Err(e)
        } else if !self.ledger.verify_funds(participant, amount) {
            Err(ArenaError::InsufficientFunds {
                participant,
                amount,
            })
        } else {
            round.registry.place_stake(participant, pool, amount)
        };

        if let Err(e) = &result {
            tracing::warn!(
                round = %round.id,
                participant = %participant,
                pool = %pool,
                amount,
                error = %e,
                "bet rejected"
            );
        }
        result
    }

    /// Advance the clock by one interval.
    /// Returns the phase entered, if the interval ended the current phase.
    pub fn tick(&mut self) -> ArenaResult<Option<Phase>> {
        if self.round.clock.tick() {
            self.round.expiry_pending = true;
        }
        self.advance()
    }

    /// Apply a pending clock expiry. Without one this is a no-op.
    pub fn advance(&mut self) -> ArenaResult<Option<Phase>> {
        if !self.round.expiry_pending {
            return Ok(None);
        }
        // Result is untimed; nothing follows until reset
        let Some(next) = self.round.phase.successor() else {
            self.round.expiry_pending = false;
            return Ok(None);
        };

        match next {
            Phase::Attack => self.commit_elimination()?,
            Phase::Result => self.settle(),
            _ => {}
        }
        if let Some(secs) = self.config.duration_of(next) {
            self.round.clock.start(secs)?;
        }

        self.round.phase = next;
        self.round.expiry_pending = false;
        if next == Phase::Locked {
            tracing::info!(
                round = %self.round.id,
                staked = self.round.registry.total_staked(),
                bettors = self.round.registry.selections().len(),
                "betting locked"
            );
        }
        Ok(Some(next))
    }

    /// The target is chosen and committed on entering the attack; the
    /// attack clock is only a presentation window.
    fn commit_elimination(&mut self) -> ArenaResult<()> {
        let target = self.selector.select(self.config.pool_count);
        let forfeited = self.round.registry.eliminate(target)?;
        tracing::info!(
            round = %self.round.id,
            pool = %target,
            forfeited,
            "pool eliminated"
        );
        Ok(())
    }

    fn settle(&mut self) {
        let settlement = self.round.registry.settlement_view();
        tracing::info!(
            round = %self.round.id,
            surviving = settlement.surviving_total(),
            forfeited = settlement.forfeited_amount(),
            "round settled"
        );
        self.ledger.apply_settlement(self.round.id, &settlement);
        self.round.settlement = Some(settlement);
    }

    /// Read-only snapshot of the live round
    pub fn current_state(&self) -> RoundSnapshot {
        let round = &self.round;
        RoundSnapshot {
            round: round.id,
            phase: round.phase,
            countdown: round.clock.remaining(),
            pools: round.registry.pools().to_vec(),
            selections: round.registry.selections().clone(),
            eliminated: round.registry.eliminated(),
            settlement: round.settlement.clone(),
        }
    }

    /// Settlement of the live round, once in RESULT
    pub fn settlement(&self) -> Option<&Settlement> {
        self.round.settlement.as_ref()
    }

    /// Discard a finished round and open the next one
    pub fn reset(&mut self) -> ArenaResult<RoundId> {
        if !self.round.phase.is_final() {
            return Err(ArenaError::InvalidTransition {
                phase: self.round.phase,
                operation: "reset",
            });
        }
        let next = Round::open(self.round.id.next(), &self.config)?;
        self.round.clock.cancel();
        self.round = next;
        tracing::info!(round = %self.round.id, "round opened");
        Ok(self.round.id)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use parking_lot::Mutex;

    use super::*;
    use crate::FixedSelector;

    fn p(id: u64) -> ParticipantId {
        ParticipantId::new(id)
    }

    fn pool(id: u32) -> PoolId {
        PoolId::new(id)
    }

    fn coordinator(target: u32) -> RoundCoordinator {
        RoundCoordinator::with_parts(
            RoundConfig::default(),
            FixedSelector(pool(target)),
            OpenLedger,
        )
        .unwrap()
    }

    /// Tick until the phase changes, returning the number of ticks taken
    fn run_phase(coordinator: &mut RoundCoordinator) -> u32 {
        let start = coordinator.phase();
        let mut ticks = 0;
        while coordinator.phase() == start {
            coordinator.tick().unwrap();
            ticks += 1;
            assert!(ticks <= 1_000, "phase {start} never ended");
        }
        ticks
    }

    #[derive(Default)]
    struct LedgerLog {
        settlements: Vec<(RoundId, Settlement)>,
    }

    /// Ledger with a per-participant balance cap that records settlements
    struct CappedLedger {
        cap: Amount,
        log: Arc<Mutex<LedgerLog>>,
    }

    impl Ledger for CappedLedger {
        fn verify_funds(&self, _participant: ParticipantId, amount: Amount) -> bool {
            amount <= self.cap
        }

        fn apply_settlement(&mut self, round: RoundId, settlement: &Settlement) {
            self.log.lock().settlements.push((round, settlement.clone()));
        }
    }

    #[test]
    fn test_initial_state() {
        let coordinator = coordinator(1);
        let state = coordinator.current_state();
        assert_eq!(state.round, RoundId::FIRST);
        assert_eq!(state.phase, Phase::Betting);
        assert_eq!(state.countdown, 60);
        assert_eq!(state.pools.len(), 8);
        assert_eq!(state.eliminated, None);
        assert!(state.settlement.is_none());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = RoundConfig::default().with_pool_count(1);
        assert!(matches!(
            RoundCoordinator::new(config),
            Err(ArenaError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_phase_durations() {
        let mut coordinator = coordinator(1);
        assert_eq!(run_phase(&mut coordinator), 60);
        assert_eq!(coordinator.phase(), Phase::Locked);
        assert_eq!(coordinator.countdown(), 2);
        assert_eq!(run_phase(&mut coordinator), 2);
        assert_eq!(coordinator.phase(), Phase::Attack);
        assert_eq!(coordinator.countdown(), 3);
        assert_eq!(run_phase(&mut coordinator), 3);
        assert_eq!(coordinator.phase(), Phase::Result);
        assert_eq!(coordinator.countdown(), 0);
    }

    #[test]
    fn test_phase_clocks_follow_config() {
        let config = RoundConfig {
            pool_count: 3,
            betting_secs: 4,
            lock_secs: 7,
            attack_secs: 1,
        };
        let mut coordinator =
            RoundCoordinator::with_parts(config.clone(), FixedSelector(pool(2)), OpenLedger).unwrap();

        let mut phase = coordinator.phase();
        while let Some(next) = phase.successor() {
            assert_eq!(Some(run_phase(&mut coordinator)), config.duration_of(phase));
            assert_eq!(coordinator.phase(), next);
            phase = next;
        }
        assert!(coordinator.phase().is_final());
        assert_eq!(coordinator.current_state().eliminated, Some(pool(2)));
    }

    #[test]
    fn test_barn_three_scenario() {
        let mut coordinator = coordinator(3);
        coordinator.place_bet(p(1), pool(3), 50).unwrap();
        coordinator.place_bet(p(2), pool(5), 40).unwrap();
        coordinator.place_bet(p(3), pool(5), 10).unwrap();
        coordinator.place_bet(p(4), pool(1), 25).unwrap();

        for _ in 0..60 {
            coordinator.tick().unwrap();
        }
        assert_eq!(coordinator.phase(), Phase::Locked);
        assert_eq!(
            coordinator.place_bet(p(1), pool(5), 50),
            Err(ArenaError::BettingClosed(Phase::Locked))
        );
        assert_eq!(coordinator.registry().selection_of(p(1)), Some(pool(3)));

        // Elimination is committed on entry to ATTACK
        for _ in 0..2 {
            coordinator.tick().unwrap();
        }
        assert_eq!(coordinator.phase(), Phase::Attack);
        assert_eq!(coordinator.current_state().eliminated, Some(pool(3)));
        assert!(coordinator.current_state().settlement.is_none());

        for _ in 0..3 {
            coordinator.tick().unwrap();
        }
        let state = coordinator.current_state();
        assert_eq!(state.phase, Phase::Result);

        let settlement = state.settlement.unwrap();
        assert!(settlement.pool(pool(3)).is_none());
        assert!(settlement.is_forfeited(p(1)));
        assert_eq!(settlement.forfeited_amount(), 50);
        assert_eq!(settlement.pools.len(), 7);
        assert_eq!(settlement.surviving_total(), 75);

        let barn5 = settlement.pool(pool(5)).unwrap();
        assert_eq!(barn5.total, 50);
        assert_eq!(barn5.shares[0].weight, 0.8);
        assert_eq!(barn5.shares[1].weight, 0.2);
    }

    #[test]
    fn test_bets_rejected_outside_betting() {
        let mut coordinator = coordinator(2);
        for expected in [Phase::Locked, Phase::Attack, Phase::Result] {
            run_phase(&mut coordinator);
            assert_eq!(coordinator.phase(), expected);
            let before = coordinator.current_state();
            assert_eq!(
                coordinator.place_bet(p(9), pool(1), 10),
                Err(ArenaError::BettingClosed(expected))
            );
            assert_eq!(coordinator.current_state(), before);
        }
    }

    #[test]
    fn test_rejected_bet_leaves_state_unchanged() {
        let mut coordinator = coordinator(2);
        coordinator.place_bet(p(1), pool(1), 10).unwrap();
        let before = coordinator.current_state();

        assert!(matches!(
            coordinator.place_bet(p(1), pool(9), 10),
            Err(ArenaError::InvalidPool { .. })
        ));
        assert_eq!(
            coordinator.place_bet(p(1), pool(2), 0),
            Err(ArenaError::InvalidAmount(0))
        );
        assert_eq!(coordinator.current_state(), before);
    }

    #[test]
    fn test_advance_without_expiry_is_idempotent() {
        let mut coordinator = coordinator(4);
        coordinator.place_bet(p(1), pool(2), 10).unwrap();
        coordinator.tick().unwrap();

        let before = coordinator.current_state();
        assert_eq!(coordinator.advance(), Ok(None));
        assert_eq!(coordinator.advance(), Ok(None));
        assert_eq!(coordinator.current_state(), before);
    }

    #[test]
    fn test_result_is_frozen() {
        let mut coordinator = coordinator(4);
        coordinator.place_bet(p(1), pool(2), 10).unwrap();
        for _ in 0..3 {
            run_phase(&mut coordinator);
        }
        let frozen = coordinator.current_state();

        for _ in 0..100 {
            assert_eq!(coordinator.tick(), Ok(None));
        }
        assert_eq!(coordinator.advance(), Ok(None));
        assert_eq!(coordinator.current_state(), frozen);
    }

    #[test]
    fn test_reset_only_from_result() {
        let mut coordinator = coordinator(1);
        for phase in [Phase::Betting, Phase::Locked, Phase::Attack] {
            assert_eq!(coordinator.phase(), phase);
            assert_eq!(
                coordinator.reset(),
                Err(ArenaError::InvalidTransition {
                    phase,
                    operation: "reset"
                })
            );
            run_phase(&mut coordinator);
        }

        assert_eq!(coordinator.reset(), Ok(RoundId(2)));
        let state = coordinator.current_state();
        assert_eq!(state.phase, Phase::Betting);
        assert_eq!(state.countdown, 60);
        assert_eq!(state.eliminated, None);
        assert!(state.selections.is_empty());
        assert_eq!(state.total_staked(), 0);
    }

    #[test]
    fn test_new_round_accepts_bets_again() {
        let mut coordinator = coordinator(1);
        coordinator.place_bet(p(1), pool(1), 10).unwrap();
        for _ in 0..3 {
            run_phase(&mut coordinator);
        }
        coordinator.reset().unwrap();

        coordinator.place_bet(p(1), pool(1), 15).unwrap();
        assert_eq!(coordinator.registry().stake_of(p(1)), Some((pool(1), 15)));
    }

    #[test]
    fn test_ledger_funds_and_settlement() {
        let log = Arc::new(Mutex::new(LedgerLog::default()));
        let ledger = CappedLedger {
            cap: 100,
            log: Arc::clone(&log),
        };
        let mut coordinator =
            RoundCoordinator::with_parts(RoundConfig::quick(), FixedSelector(pool(2)), ledger)
                .unwrap();

        assert_eq!(
            coordinator.place_bet(p(1), pool(1), 101),
            Err(ArenaError::InsufficientFunds {
                participant: p(1),
                amount: 101
            })
        );
        assert_eq!(coordinator.registry().total_staked(), 0);
        coordinator.place_bet(p(1), pool(1), 100).unwrap();

        for _ in 0..3 {
            run_phase(&mut coordinator);
        }
        // Further ticks in RESULT never re-settle
        for _ in 0..10 {
            coordinator.tick().unwrap();
        }

        let log = log.lock();
        assert_eq!(log.settlements.len(), 1);
        let (round, settlement) = &log.settlements[0];
        assert_eq!(*round, RoundId::FIRST);
        assert_eq!(Some(settlement), coordinator.settlement());
    }

    #[test]
    fn test_bad_selector_keeps_round_locked() {
        let mut coordinator = coordinator(42);
        run_phase(&mut coordinator);
        coordinator.tick().unwrap();
        let before = coordinator.current_state();

        assert!(matches!(
            coordinator.tick(),
            Err(ArenaError::InvalidPool { .. })
        ));
        assert_eq!(coordinator.phase(), Phase::Locked);
        assert_eq!(coordinator.current_state().eliminated, None);
        assert_eq!(coordinator.current_state().pools, before.pools);
    }

    #[test]
    fn test_snapshot_serializes() {
        let mut coordinator = coordinator(1);
        coordinator.place_bet(p(1), pool(2), 10).unwrap();
        let json = serde_json::to_value(coordinator.current_state()).unwrap();
        assert_eq!(json["phase"], "BETTING");
        assert_eq!(json["countdown"], 60);
        assert_eq!(json["selections"]["1"], 2);
    }
}
