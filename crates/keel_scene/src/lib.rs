//! Keel Scene
//!
//! Data-driven world building on top of `keel_core`:
//! - Prefab files with prototype inheritance and ctags
//! - Prototype entities kept alive as cloning sources
//! - Scene files that load assets, instantiate prefabs and spawn instances
//! - A [`SceneManager`] façade that also schedules systems and sweeps
//!   soft-deleted entities once per tick

pub mod components;
pub mod entity_factory;
mod error;
pub mod prefab;
pub mod scene_definition;
pub mod scene_factory;
pub mod scene_manager;

pub use entity_factory::{EntityFactory, PrototypeMetrics};
pub use error::SceneError;
pub use prefab::{PrefabDefinition, PrefabError, Prototype, PrototypeSelection, ALL_PROTOTYPES};
pub use scene_definition::{EntitySpawn, PrefabRef, SceneAssets, SceneDefinition};
pub use scene_factory::{SceneContext, SceneFactory, SceneMetrics};
pub use scene_manager::SceneManager;
