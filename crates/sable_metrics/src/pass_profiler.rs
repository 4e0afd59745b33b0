//! Accumulated timings for named passes

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Totals for a single pass name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassTiming {
    pub total: Duration,
    pub last: Duration,
    pub calls: u64,
}

#[derive(Debug, Default)]
pub struct PassProfiler {
    timings: HashMap<String, PassTiming>,
}

impl PassProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn time_pass<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(name, start.elapsed());
        result
    }

    pub fn record(&mut self, name: &str, elapsed: Duration) {
        let timing = self.timings.entry(name.to_string()).or_default();
        timing.total += elapsed;
        timing.last = elapsed;
        timing.calls += 1;
    }

    pub fn timing(&self, name: &str) -> Option<PassTiming> {
        self.timings.get(name).copied()
    }

    pub fn total(&self, name: &str) -> Duration {
        self.timing(name).map_or(Duration::ZERO, |t| t.total)
    }

    pub fn calls(&self, name: &str) -> u64 {
        self.timing(name).map_or(0, |t| t.calls)
    }

    pub fn reset(&mut self) {
        self.timings.clear();
    }

    /// Passes ordered by total time, slowest first.
    pub fn slowest(&self) -> Vec<(&str, PassTiming)> {
        let mut rows: Vec<(&str, PassTiming)> = self
            .timings
            .iter()
            .map(|(name, timing)| (name.as_str(), *timing))
            .collect();
        rows.sort_by(|a, b| b.1.total.cmp(&a.1.total));
        rows
    }
}
