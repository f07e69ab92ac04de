//! Named phase timings (scene build steps, per-frame systems)

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Timing record for one phase.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseTiming {
    /// Duration of the most recent run.
    pub last: Duration,
    /// Sum over every run since the last reset.
    pub total: Duration,
    pub runs: u32,
}

/// Records how long named phases take, in first-seen order.
#[derive(Default)]
pub struct PhaseProfiler {
    order: Vec<String>,
    timings: HashMap<String, PhaseTiming>,
}

impl PhaseProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f`, recording its wall time under `name`.
    pub fn time<F, R>(&mut self, name: &str, f: F) -> R
    where
        F: FnOnce() -> R,
    {
        let start = Instant::now();
        let result = f();
        self.record(name, start.elapsed());
        result
    }

    pub fn record(&mut self, name: &str, elapsed: Duration) {
        if !self.timings.contains_key(name) {
            self.order.push(name.to_string());
        }
        let timing = self.timings.entry(name.to_string()).or_default();
        timing.last = elapsed;
        timing.total += elapsed;
        timing.runs += 1;
    }

    pub fn last(&self, name: &str) -> Duration {
        self.timings
            .get(name)
            .map(|timing| timing.last)
            .unwrap_or(Duration::ZERO)
    }

    pub fn timing(&self, name: &str) -> Option<PhaseTiming> {
        self.timings.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, PhaseTiming)> {
        self.order.iter().filter_map(|name| {
            self.timings
                .get(name)
                .map(|timing| (name.as_str(), *timing))
        })
    }

    pub fn reset(&mut self) {
        self.order.clear();
        self.timings.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_in_first_seen_order() {
        let mut profiler = PhaseProfiler::new();
        profiler.record("textures", Duration::from_millis(2));
        profiler.record("shaders", Duration::from_millis(1));
        profiler.record("textures", Duration::from_millis(4));

        let names: Vec<&str> = profiler.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["textures", "shaders"]);

        let textures = profiler.timing("textures").unwrap();
        assert_eq!(textures.runs, 2);
        assert_eq!(textures.last, Duration::from_millis(4));
        assert_eq!(textures.total, Duration::from_millis(6));
    }

    #[test]
    fn test_reset_forgets_phases() {
        let mut profiler = PhaseProfiler::new();
        let out = profiler.time("work", || 3);
        assert_eq!(out, 3);
        profiler.reset();
        assert_eq!(profiler.timing("work"), None);
        assert_eq!(profiler.last("work"), Duration::ZERO);
    }
}
