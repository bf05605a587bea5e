//! Round Simulator - many seeded rounds with random bettors
//!
//! Drives a real coordinator tick by tick. During betting, random
//! participants place or move stakes; after the lock every round also
//! fires one late bet that must bounce. Each settled round is checked
//! for stake conservation.

use arena_core::{Amount, ArenaError, ArenaResult, ParticipantId, Phase, PoolId, RoundConfig, RoundId};
use arena_round::{chi_square_uniform, OpenLedger, RandomSelector, RoundCoordinator};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// How simulated bettors pick pools
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BettingPattern {
    /// Every pool equally likely
    Uniform,
    /// A fraction `bias` of choices pile onto one pool
    Crowded { pool: PoolId, bias: f64 },
}

/// Simulator configuration
#[derive(Clone, Debug)]
pub struct SimConfig {
    pub round: RoundConfig,
    /// Rounds to play
    pub rounds: u32,
    /// Distinct participants
    pub bettors: u64,
    /// Largest single stake
    pub max_stake: Amount,
    /// Maximum bets attempted per betting tick
    pub bets_per_tick: u32,
    pub pattern: BettingPattern,
    /// Random seed
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        SimConfig {
            round: RoundConfig::quick(),
            rounds: 100,
            bettors: 20,
            max_stake: 1_000,
            bets_per_tick: 8,
            pattern: BettingPattern::Uniform,
            seed: 42,
        }
    }
}

impl SimConfig {
    /// Light run for quick tests
    pub fn light() -> Self {
        SimConfig {
            rounds: 20,
            bettors: 5,
            bets_per_tick: 3,
            ..SimConfig::default()
        }
    }

    /// Full-size board, full-length rounds
    pub fn heavy() -> Self {
        SimConfig {
            round: RoundConfig::default(),
            rounds: 200,
            bettors: 500,
            bets_per_tick: 40,
            ..SimConfig::default()
        }
    }

    /// Most of the money on pool 1
    pub fn crowded(rounds: u32) -> Self {
        SimConfig {
            rounds,
            pattern: BettingPattern::Crowded {
                pool: PoolId::new(1),
                bias: 0.9,
            },
            ..SimConfig::default()
        }
    }
}

/// Outcome of one simulated round
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoundRecord {
    pub round: RoundId,
    pub eliminated: PoolId,
    pub staked: Amount,
    pub surviving: Amount,
    pub forfeited: Amount,
    /// Stakes that replaced an earlier one
    pub moves: u32,
    /// Bets attempted after the lock that were accepted (must be 0)
    pub late_accepted: u32,
}

impl RoundRecord {
    pub fn is_conserved(&self) -> bool {
        self.surviving + self.forfeited == self.staked
    }
}

/// Simulation report
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SimReport {
    pub records: Vec<RoundRecord>,
    /// Eliminations per pool, indexed by pool slot
    pub elimination_counts: Vec<u64>,
}

impl SimReport {
    pub fn all_conserved(&self) -> bool {
        self.records.iter().all(RoundRecord::is_conserved)
    }

    pub fn late_accepted(&self) -> u32 {
        self.records.iter().map(|r| r.late_accepted).sum()
    }

    pub fn total_staked(&self) -> Amount {
        self.records.iter().map(|r| r.staked).sum()
    }

    /// Chi-square statistic of eliminations against uniform
    pub fn elimination_chi_square(&self) -> f64 {
        chi_square_uniform(&self.elimination_counts)
    }
}

/// Round simulator
pub struct RoundSimulator {
    config: SimConfig,
    coordinator: RoundCoordinator,
    rng: StdRng,
}

impl RoundSimulator {
    pub fn new(config: SimConfig) -> ArenaResult<Self> {
        // Selector and bettors draw from separate streams
        let selector = RandomSelector::seeded(config.seed.rotate_left(32) ^ 0x9e37_79b9_7f4a_7c15);
        let coordinator = RoundCoordinator::with_parts(config.round.clone(), selector, OpenLedger)?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(RoundSimulator {
            config,
            coordinator,
            rng,
        })
    }

    /// Play every configured round
    pub fn run(&mut self) -> ArenaResult<SimReport> {
        let mut report = SimReport {
            records: Vec::with_capacity(self.config.rounds as usize),
            elimination_counts: vec![0; self.config.round.pool_count as usize],
        };

        for _ in 0..self.config.rounds {
            let record = self.play_round()?;
            report.elimination_counts[record.eliminated.index()] += 1;
            report.records.push(record);
            self.coordinator.reset()?;
        }

        tracing::debug!(
            rounds = report.records.len(),
            staked = report.total_staked(),
            "simulation finished"
        );
        Ok(report)
    }

    fn play_round(&mut self) -> ArenaResult<RoundRecord> {
        let mut moves = 0;
        let mut late_accepted = 0;

        while self.coordinator.phase() == Phase::Betting {
            let bets = self.rng.gen_range(0..=self.config.bets_per_tick);
            for _ in 0..bets {
                let (participant, pool, amount) = self.random_bet();
                if let Some(replaced) = self.coordinator.place_bet(participant, pool, amount)? {
                    if replaced.pool != pool {
                        moves += 1;
                    }
                }
            }
            self.coordinator.tick()?;
        }

        // Betting just closed
        let (participant, pool, amount) = self.random_bet();
        match self.coordinator.place_bet(participant, pool, amount) {
            Err(ArenaError::BettingClosed(_)) => {}
            Ok(_) => late_accepted += 1,
            Err(e) => return Err(e),
        }

        while self.coordinator.phase() != Phase::Result {
            self.coordinator.tick()?;
        }

        let state = self.coordinator.current_state();
        let settlement = state
            .settlement
            .as_ref()
            .ok_or(ArenaError::InvalidTransition {
                phase: state.phase,
                operation: "settle",
            })?;
        let eliminated = state.eliminated.ok_or(ArenaError::InvalidTransition {
            phase: state.phase,
            operation: "eliminate",
        })?;

        Ok(RoundRecord {
            round: state.round,
            eliminated,
            staked: state.total_staked(),
            surviving: settlement.surviving_total(),
            forfeited: settlement.forfeited_amount(),
            moves,
            late_accepted,
        })
    }

    fn random_bet(&mut self) -> (ParticipantId, PoolId, Amount) {
        let n = self.config.round.pool_count;
        let participant = ParticipantId::new(self.rng.gen_range(0..self.config.bettors.max(1)));
        let pattern = self.config.pattern;
        let pool = match pattern {
            BettingPattern::Crowded { pool, bias } if self.rng.gen_bool(bias) => pool,
            _ => PoolId::new(self.rng.gen_range(1..=n)),
        };
        let amount = self.rng.gen_range(1..=self.config.max_stake.max(1));
        (participant, pool, amount)
    }
}

/// Preset scenarios
pub mod scenarios {
    use super::*;

    pub fn light() -> ArenaResult<SimReport> {
        RoundSimulator::new(SimConfig::light())?.run()
    }

    pub fn crowded(rounds: u32, seed: u64) -> ArenaResult<SimReport> {
        RoundSimulator::new(SimConfig {
            seed,
            ..SimConfig::crowded(rounds)
        })?
        .run()
    }
}
