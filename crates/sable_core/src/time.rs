//! Fixed-rate step clock
//!
//! Wall-clock time is accumulated and paid out in whole ticks; the remainder
//! becomes the render interpolation factor.

use std::time::Duration;

/// Default simulation rate (60 Hz = 16.666ms per tick)
pub const DEFAULT_TICK_RATE_HZ: u32 = 60;

/// Ticks paid out by a single `advance`, so one long stall cannot queue an
/// unbounded catch-up burst.
pub const MAX_TICKS_PER_ADVANCE: u32 = 8;

pub struct StepClock {
    tick_duration: Duration,
    tick_count: u64,
    accumulator: Duration,
}

impl StepClock {
    /// A rate of 0 is treated as 1 Hz.
    pub fn new(tick_rate_hz: u32) -> Self {
        let hz = tick_rate_hz.max(1);
        Self {
            tick_duration: Duration::from_secs(1) / hz,
            tick_count: 0,
            accumulator: Duration::ZERO,
        }
    }

    /// Add wall-clock time and return how many ticks to run now.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulator += elapsed;

        let mut ticks = 0;
        while self.accumulator >= self.tick_duration && ticks < MAX_TICKS_PER_ADVANCE {
            self.accumulator -= self.tick_duration;
            ticks += 1;
        }
        if ticks == MAX_TICKS_PER_ADVANCE && self.accumulator >= self.tick_duration {
            // Drop the whole-tick backlog rather than spiral; keep the phase.
            let leftover = self.accumulator.as_nanos() % self.tick_duration.as_nanos();
            self.accumulator = Duration::from_nanos(leftover as u64);
        }

        self.tick_count += u64::from(ticks);
        ticks
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick_duration
    }

    /// Tick length in seconds, the `dt` handed to update passes.
    pub fn dt(&self) -> f32 {
        self.tick_duration.as_secs_f32()
    }

    /// Simulated time covered by the ticks paid out so far.
    pub fn total_time(&self) -> Duration {
        self.tick_duration * u32::try_from(self.tick_count).unwrap_or(u32::MAX)
    }

    /// Fraction of a tick left in the accumulator, in `[0, 1)`.
    pub fn alpha(&self) -> f32 {
        (self.accumulator.as_secs_f64() / self.tick_duration.as_secs_f64()).min(1.0) as f32
    }
}

impl Default for StepClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_RATE_HZ)
    }
}
