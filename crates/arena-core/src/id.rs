//! Identity types for the arena
//!
//! Participants are opaque 64-bit handles supplied by the ledger side.
//! Pools are numbered from 1 to N, matching what players see on the board.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Stake amount in the smallest ledger unit
pub type Amount = u64;

/// Participant identity - opaque handle issued by the ledger collaborator
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParticipantId(pub u64);

impl ParticipantId {
    #[inline]
    pub fn new(id: u64) -> Self {
        ParticipantId(id)
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Participant({:016x})", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Pool ("barn") identity - 1-based position on the board
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolId(pub u32);

impl PoolId {
    #[inline]
    pub fn new(id: u32) -> Self {
        PoolId(id)
    }

    /// Zero-based slot for indexing a pool vector.
    /// Only meaningful once the id has been range-checked.
    #[inline]
    pub fn index(self) -> usize {
        (self.0 as usize).wrapping_sub(1)
    }

    /// Pool id for a zero-based slot
    #[inline]
    pub fn from_index(index: usize) -> Self {
        PoolId(index as u32 + 1)
    }

    /// Check that this id names one of `pool_count` pools
    #[inline]
    pub fn is_within(self, pool_count: u32) -> bool {
        self.0 >= 1 && self.0 <= pool_count
    }
}

impl fmt::Debug for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pool(#{})", self.0)
    }
}

impl fmt::Display for PoolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Round identity - increments with every reset of a table
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub u64);

impl RoundId {
    pub const FIRST: RoundId = RoundId(1);

    #[inline]
    pub fn next(self) -> Self {
        RoundId(self.0.wrapping_add(1))
    }
}

impl fmt::Debug for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Round({})", self.0)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
