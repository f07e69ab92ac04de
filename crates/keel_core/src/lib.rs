//! Keel Engine Core
//!
//! Contains the fundamental simulation building blocks:
//! - Entity registry (hecs-backed) with lifetime counters
//! - Type-erased component registry driven by prefab data
//! - Priority-ordered system scheduling
//! - Fixed-step time and math re-exports

pub mod ecs;
pub mod hash;
pub mod math;
pub mod time;

pub use glam;
pub use hecs;

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
