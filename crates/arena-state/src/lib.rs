//! Bull Arena State - Pool registry and settlement
//!
//! This crate owns the stake bookkeeping of one round:
//! - Pools with running totals and per-participant stakes
//! - One active selection per participant, moved atomically
//! - Single elimination per round
//! - Proportional settlement of the surviving pools
//!
//! The registry is phase-agnostic. Whoever owns it decides when
//! stakes may change.

pub mod pool;
pub mod registry;
pub mod settlement;

pub use pool::*;
pub use registry::*;
pub use settlement::*;
