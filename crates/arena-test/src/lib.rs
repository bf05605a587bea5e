//! Bull Arena Test Harness - Simulation and fairness validation
//!
//! This crate provides:
//! - A seeded multi-round simulator with random bettors
//! - Stake conservation checks per round
//! - Elimination fairness statistics under skewed betting

pub mod simulator;

pub use simulator::*;
