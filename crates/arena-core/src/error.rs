//! Error types for the arena

use thiserror::Error;

use crate::{Amount, ParticipantId, Phase, PoolId};

/// Arena errors. Every variant is a local validation failure; the
/// operation that returned it left all state untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArenaError {
    // Stake errors
    #[error("Invalid pool {pool}: board has {pool_count} pools")]
    InvalidPool { pool: PoolId, pool_count: u32 },

    #[error("Invalid stake amount: {0}")]
    InvalidAmount(Amount),

    #[error("Betting closed: round is {0}")]
    BettingClosed(Phase),

    #[error("Insufficient funds: participant {participant} cannot cover {amount}")]
    InsufficientFunds {
        participant: ParticipantId,
        amount: Amount,
    },

    // Round errors
    #[error("Pool {0} already eliminated this round")]
    AlreadyEliminated(PoolId),

    #[error("Invalid transition: {operation} not allowed in {phase}")]
    InvalidTransition {
        phase: Phase,
        operation: &'static str,
    },

    // Clock errors
    #[error("Countdown already running: {remaining}s left")]
    AlreadyRunning { remaining: u32 },

    // Config errors
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    // Runtime errors
    #[error("Table closed")]
    TableClosed,
}

/// Result type for arena operations
pub type ArenaResult<T> = Result<T, ArenaError>;
