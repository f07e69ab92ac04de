//! Deterministic time system
//!
//! Fixed tick rate driven by an accumulator: wall time is accumulated and
//! consumed one fixed tick at a time.

use std::time::Duration;

/// Default simulation tick rate (60 Hz = 16.666ms per tick)
pub const TICK_RATE_HZ: u32 = 60;
pub const TICK_DURATION: Duration = Duration::from_micros(16_666); // ~16.666ms

/// Simulation time tracker
#[derive(Debug, Default)]
pub struct SimulationTime {
    tick_count: u64,
    elapsed: Duration,
}

impl SimulationTime {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn advance_tick(&mut self, tick: Duration) {
        self.tick_count += 1;
        self.elapsed += tick;
    }

    pub fn total_time(&self) -> Duration {
        self.elapsed
    }
}

/// Fixed-step accumulator.
///
/// ```ignore
/// step.accumulate(frame_elapsed);
/// while step.next_tick() {
///     manager.on_update(step.tick_duration())?;
/// }
/// ```
#[derive(Debug)]
pub struct FixedStep {
    tick: Duration,
    accumulator: Duration,
    max_ticks_per_frame: u32,
    ticks_this_frame: u32,
    dropped: Duration,
}

impl FixedStep {
    /// `tick_rate_hz` of 0 falls back to [`TICK_RATE_HZ`]; at least one tick
    /// per frame is always allowed.
    pub fn new(tick_rate_hz: u32, max_ticks_per_frame: u32) -> Self {
        let tick = if tick_rate_hz == 0 {
            TICK_DURATION
        } else {
            Duration::from_nanos(1_000_000_000 / tick_rate_hz as u64)
        };
        Self {
            tick,
            accumulator: Duration::ZERO,
            max_ticks_per_frame: max_ticks_per_frame.max(1),
            ticks_this_frame: 0,
            dropped: Duration::ZERO,
        }
    }

    pub fn tick_duration(&self) -> Duration {
        self.tick
    }

    /// Add one frame's worth of wall time and start a new frame.
    pub fn accumulate(&mut self, elapsed: Duration) {
        self.accumulator += elapsed;
        self.ticks_this_frame = 0;
    }

    /// Consume one tick if enough time is accumulated.
    ///
    /// Once the per-frame cap is reached, whole ticks still pending are
    /// dropped so a slow frame cannot snowball into the next one.
    pub fn next_tick(&mut self) -> bool {
        if self.accumulator < self.tick {
            return false;
        }
        if self.ticks_this_frame >= self.max_ticks_per_frame {
            let remainder = self.accumulator.as_nanos() % self.tick.as_nanos();
            let remainder = Duration::from_nanos(remainder as u64);
            let backlog = self.accumulator - remainder;
            tracing::warn!(?backlog, "simulation fell behind, dropping ticks");
            self.dropped += backlog;
            self.accumulator = remainder;
            return false;
        }
        self.accumulator -= self.tick;
        self.ticks_this_frame += 1;
        true
    }

    /// Fraction of a tick left in the accumulator, for render interpolation.
    pub fn alpha(&self) -> f32 {
        (self.accumulator.as_secs_f64() / self.tick.as_secs_f64()) as f32
    }

    /// Total wall time discarded by the per-frame cap.
    pub fn dropped(&self) -> Duration {
        self.dropped
    }
}

impl Default for FixedStep {
    fn default() -> Self {
        Self::new(TICK_RATE_HZ, 5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consumes_whole_ticks() {
        let mut step = FixedStep::new(100, 10);
        assert_eq!(step.tick_duration(), Duration::from_millis(10));

        step.accumulate(Duration::from_millis(35));
        let mut ticks = 0;
        while step.next_tick() {
            ticks += 1;
        }
        assert_eq!(ticks, 3);
        assert!((step.alpha() - 0.5).abs() < 1e-3);

        step.accumulate(Duration::from_millis(5));
        assert!(step.next_tick());
        assert!(!step.next_tick());
    }

    #[test]
    fn test_caps_ticks_per_frame() {
        let mut step = FixedStep::new(100, 2);
        step.accumulate(Duration::from_millis(55));
        assert!(step.next_tick());
        assert!(step.next_tick());
        assert!(!step.next_tick());
        assert_eq!(step.dropped(), Duration::from_millis(30));
        assert!((step.alpha() - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_simulation_time_counts() {
        let mut time = SimulationTime::new();
        time.advance_tick(TICK_DURATION);
        time.advance_tick(TICK_DURATION);
        assert_eq!(time.tick_count(), 2);
        assert_eq!(time.total_time(), TICK_DURATION * 2);
    }
}
