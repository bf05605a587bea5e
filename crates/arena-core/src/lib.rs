//! Bull Arena Core - Fundamental types and primitives
//!
//! This crate defines the types shared by every arena crate:
//! - Identifiers (ParticipantId, PoolId, RoundId) and stake amounts
//! - Round phases
//! - Round configuration
//! - Error taxonomy

pub mod id;
pub mod phase;
pub mod config;
pub mod error;

pub use id::*;
pub use phase::*;
pub use config::*;
pub use error::*;
