//! Round phases

use std::fmt;

use serde::{Deserialize, Serialize};

/// Phase of a round. Phases only move forward:
/// Betting -> Locked -> Attack -> Result, and back to Betting on reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    /// Stakes may be placed or moved
    #[default]
    Betting,
    /// Stakes are frozen, the attack is imminent
    Locked,
    /// A pool has been chosen and destroyed; presentation window
    Attack,
    /// Settlement is available; the round is frozen until reset
    Result,
}

impl Phase {
    /// Phase entered when the current phase's clock expires.
    /// `Result` has no clock and therefore no successor here.
    pub fn successor(self) -> Option<Phase> {
        match self {
            Phase::Betting => Some(Phase::Locked),
            Phase::Locked => Some(Phase::Attack),
            Phase::Attack => Some(Phase::Result),
            Phase::Result => None,
        }
    }

    #[inline]
    pub fn accepts_stakes(self) -> bool {
        self == Phase::Betting
    }

    #[inline]
    pub fn is_final(self) -> bool {
        self == Phase::Result
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Betting => "BETTING",
            Phase::Locked => "LOCKED",
            Phase::Attack => "ATTACK",
            Phase::Result => "RESULT",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
