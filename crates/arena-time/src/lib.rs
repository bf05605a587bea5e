//! Bull Arena Time - Countdown clock driving round phases
//!
//! The clock never reads wall time. It is advanced by `tick()` calls
//! issued once per interval by whatever schedules the round, so the
//! only suspension points of a round are tick boundaries.

pub mod clock;

pub use clock::*;
