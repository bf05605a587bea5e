//! Bull Arena Round - Phase state machine
//!
//! This crate implements the Round Coordinator:
//! - BETTING -> LOCKED -> ATTACK -> RESULT, then reset
//! - Bet gating on the current phase
//! - Elimination through a replaceable Selector
//! - Settlement handed to a Ledger collaborator
//! - Read-only snapshots for renderers

pub mod selector;
pub mod ledger;
pub mod snapshot;
pub mod coordinator;

pub use selector::*;
pub use ledger::*;
pub use snapshot::*;
pub use coordinator::*;
