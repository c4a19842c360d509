//! Fixed-tick gate.
//!
//! The driver calls [`SimulationClock::poll`] as often as it likes (every
//! presentation frame, a timer, a test loop). The gate opens at most once
//! per interval; time is always supplied by the caller, so the core never
//! reads a wall clock.

use crate::config::EngineConfig;

/// Opens at most `fps` times per second.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationClock {
    fps: u64,
    last_tick_ms: u64,
}

impl SimulationClock {
    /// Create a clock for `fps` ticks per second, counting from `start_ms`.
    ///
    /// A zero `fps` is treated as one tick per second.
    #[must_use]
    pub const fn new(fps: u32, start_ms: u64) -> Self {
        let fps = if fps == 0 { 1 } else { fps as u64 };
        Self {
            fps,
            last_tick_ms: start_ms,
        }
    }

    /// Create a clock matching the engine cadence.
    #[must_use]
    pub const fn from_config(config: &EngineConfig, start_ms: u64) -> Self {
        Self::new(config.fps, start_ms)
    }

    /// Minimum whole milliseconds between ticks, rounded up.
    #[must_use]
    pub const fn interval_ms(&self) -> u64 {
        1000u64.div_ceil(self.fps)
    }

    /// Timestamp of the last tick that was let through.
    #[must_use]
    pub const fn last_tick_ms(&self) -> u64 {
        self.last_tick_ms
    }

    /// Milliseconds until the gate next opens, zero if it is open now.
    #[must_use]
    pub const fn remaining_ms(&self, now_ms: u64) -> u64 {
        self.interval_ms()
            .saturating_sub(now_ms.saturating_sub(self.last_tick_ms))
    }

    /// Returns true, and restarts the interval from `now_ms`, if a tick is
    /// due. Missed intervals are not caught up.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        let elapsed = now_ms.saturating_sub(self.last_tick_ms);
        if elapsed.saturating_mul(self.fps) < 1000 {
            return false;
        }
        self.last_tick_ms = now_ms;
        true
    }
}
