//! Keel Engine Runtime
//!
//! The fixed-step application driver and the built-in systems the `keel`
//! binary runs a scene with.

pub mod app;
pub mod systems;

pub use app::{Application, FrameOverlay, GameState, IdleState};
pub use systems::{DecaySystem, SpinSystem};
