//! Keel Services Layer
//!
//! Platform-facing services the engine boots with. For now that is the
//! settings file read at start-up.

pub mod settings;

pub use settings::{EngineSettings, LoggingSettings, SceneSettings, SettingsError, SimulationSettings};
