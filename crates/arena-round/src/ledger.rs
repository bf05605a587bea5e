//! Ledger collaborator interface
//!
//! Custody lives outside the coordinator. The coordinator asks the ledger
//! whether a stake is covered and hands it the settlement once per round.

use arena_core::{Amount, ParticipantId, RoundId};
use arena_state::Settlement;

pub trait Ledger: Send {
    /// Whether `participant` can cover a stake of `amount`
    fn verify_funds(&self, participant: ParticipantId, amount: Amount) -> bool;

    /// Called once when a round enters RESULT
    fn apply_settlement(&mut self, round: RoundId, settlement: &Settlement);
}

/// Ledger that accepts every stake and ignores settlements
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenLedger;

impl Ledger for OpenLedger {
    fn verify_funds(&self, _participant: ParticipantId, _amount: Amount) -> bool {
        true
    }

    fn apply_settlement(&mut self, _round: RoundId, _settlement: &Settlement) {}
}
