//! Keel Metrics - Common utilities for performance tracking
//!
//! Provides zero-cost abstractions for metrics collection that completely
//! vanish in production builds via feature flags.
//!
//! # Feature Flags
//!
//! - `metrics` - Enable metrics collection (default: disabled)
//!
//! # Usage
//!
//! ```ignore
//! use keel_metrics::{time_phase, PhaseProfiler};
//!
//! let mut profiler = PhaseProfiler::new();
//! let prototypes = time_phase!(profiler, "scene.prefabs", { build_prototypes() });
//! println!("prefabs took {:?}", profiler.last("scene.prefabs"));
//! ```
//!
//! In production builds (without `metrics` feature), all instrumentation
//! is compiled out to zero overhead.

#[cfg(feature = "metrics")]
mod frame_timer;
#[cfg(feature = "metrics")]
mod phase_profiler;
#[cfg(feature = "metrics")]
mod ring_buffer;

#[cfg(feature = "metrics")]
pub use frame_timer::FrameTimer;
#[cfg(feature = "metrics")]
pub use phase_profiler::{PhaseProfiler, PhaseTiming};
#[cfg(feature = "metrics")]
pub use ring_buffer::RingBuffer;

// ============================================================================
// Macros for conditional compilation
// ============================================================================

/// Execute code only when metrics are enabled
#[macro_export]
macro_rules! metrics {
    ($($tt:tt)*) => {
        #[cfg(feature = "metrics")]
        {
            $($tt)*
        }
    };
}

/// Time a named phase and return the value of its body.
///
/// The body runs exactly once whether or not metrics are enabled; only the
/// bookkeeping disappears.
#[macro_export]
macro_rules! time_phase {
    ($profiler:expr, $name:expr, $body:block) => {
        $profiler.time($name, || $body)
    };
}

// ============================================================================
// No-op stubs when metrics disabled
// ============================================================================

#[cfg(not(feature = "metrics"))]
pub struct FrameTimer;

#[cfg(not(feature = "metrics"))]
impl FrameTimer {
    pub fn new(_capacity: usize) -> Self { Self }
    pub fn begin(&mut self) {}
    pub fn end(&mut self) {}
    pub fn frames(&self) -> u64 { 0 }
    pub fn fps(&self) -> f64 { 0.0 }
    pub fn frame_time_ms(&self) -> f64 { 0.0 }
}

#[cfg(not(feature = "metrics"))]
pub struct RingBuffer<T>(std::marker::PhantomData<T>);

#[cfg(not(feature = "metrics"))]
impl<T> RingBuffer<T> {
    pub fn new(_capacity: usize) -> Self { Self(std::marker::PhantomData) }
    pub fn push(&mut self, _value: T) {}
    pub fn len(&self) -> usize { 0 }
    pub fn is_empty(&self) -> bool { true }
}

/// Timing record for one phase (always zero without the `metrics` feature).
#[cfg(not(feature = "metrics"))]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PhaseTiming {
    pub last: std::time::Duration,
    pub total: std::time::Duration,
    pub runs: u32,
}

#[cfg(not(feature = "metrics"))]
#[derive(Default)]
pub struct PhaseProfiler;

#[cfg(not(feature = "metrics"))]
impl PhaseProfiler {
    pub fn new() -> Self { Self }
    pub fn time<F, R>(&mut self, _name: &str, f: F) -> R where F: FnOnce() -> R { f() }
    pub fn last(&self, _name: &str) -> std::time::Duration { std::time::Duration::ZERO }
    pub fn timing(&self, _name: &str) -> Option<PhaseTiming> { None }
    pub fn iter(&self) -> impl Iterator<Item = (&str, PhaseTiming)> { std::iter::empty() }
    pub fn reset(&mut self) {}
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_phase_body_runs_once() {
        let mut profiler = super::PhaseProfiler::new();
        let mut calls = 0;
        let value = time_phase!(profiler, "phase", {
            calls += 1;
            7
        });
        assert_eq!(value, 7);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_stubs_and_real_types_share_api() {
        let mut timer = super::FrameTimer::new(60);
        timer.begin();
        timer.end();
        let _ = timer.fps();
        let mut buffer = super::RingBuffer::<std::time::Duration>::new(4);
        buffer.push(std::time::Duration::from_millis(1));
        let _ = buffer.len();
    }
}
