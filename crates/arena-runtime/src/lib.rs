//! Bull Arena Runtime - Table orchestration
//!
//! A table is one tokio task owning one Round Coordinator. The task is the
//! only place the round is mutated:
//! 1. Bet, reset and snapshot requests arrive on a bounded queue
//! 2. Clock ticks arrive from an interval (or manually, for tests and replays)
//! 3. Both are processed one at a time, in arrival order
//! 4. After each step the latest snapshot is published for readers
//!
//! Independent tables never share a coordinator, registry or clock.

pub mod config;
pub mod logging;
pub mod table;
pub mod lobby;

pub use config::*;
pub use logging::*;
pub use table::*;
pub use lobby::*;
