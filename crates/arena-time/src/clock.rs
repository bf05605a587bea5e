//! Countdown clock

use arena_core::{ArenaError, ArenaResult};

/// Clock state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ClockState {
    /// Never started, or cancelled
    #[default]
    Idle,
    /// Counting down
    Running,
    /// Reached zero; expiry already signalled
    Expired,
}

/// Countdown clock measured in whole ticks (one tick = one second of round time)
/// INVARIANT: expiry is signalled exactly once per `start`
#[derive(Clone, Debug, Default)]
pub struct Countdown {
    /// Ticks left before expiry
    remaining: u32,
    /// Duration of the current countdown
    duration: u32,
    state: ClockState,
}

impl Countdown {
    /// Create an idle clock
    pub fn new() -> Self {
        Countdown::default()
    }

    /// Begin counting down from `duration` ticks.
    /// A zero duration expires on the next tick.
    pub fn start(&mut self, duration: u32) -> ArenaResult<()> {
        if self.state == ClockState::Running {
            return Err(ArenaError::AlreadyRunning {
                remaining: self.remaining,
            });
        }
        self.remaining = duration;
        self.duration = duration;
        self.state = ClockState::Running;
        tracing::debug!(duration, "countdown started");
        Ok(())
    }

    /// Advance by one interval.
    /// Returns true exactly once, on the tick that reaches zero.
    pub fn tick(&mut self) -> bool {
        if self.state != ClockState::Running {
            return false;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.state = ClockState::Expired;
            return true;
        }
        false
    }

    /// Stop early without signalling expiry
    pub fn cancel(&mut self) {
        self.state = ClockState::Idle;
        self.remaining = 0;
    }

    /// Ticks left in the current countdown (0 when idle or expired)
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    /// Ticks elapsed since `start`
    pub fn elapsed(&self) -> u32 {
        self.duration - self.remaining
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }
}
