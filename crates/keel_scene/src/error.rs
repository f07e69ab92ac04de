use crate::prefab::PrefabError;
use keel_asset::AssetError;
use keel_core::ecs::{ComponentError, Entity, SystemRunError};
use keel_render::RenderError;
use std::panic::Location;
use thiserror::Error;

/// Errors raised while building, mutating or tearing down a scene.
///
/// Every variant is fatal for the operation that produced it; there is no
/// partially built scene to fall back to.
#[derive(Debug, Error)]
pub enum SceneError {
    /// A caller broke an API precondition (for example, no active scene).
    #[error("precondition failed at {location}: {message}")]
    Precondition {
        message: String,
        location: &'static Location<'static>,
    },

    #[error("prefab '{prefab}' has never been instantiated")]
    UnknownPrefab { prefab: String },

    #[error("prefab '{prefab}' has no live prototype '{prototype}'")]
    UnknownPrototype { prefab: String, prototype: String },

    #[error("prototype '{prototype}' of prefab '{prefab}' already exists")]
    DuplicatePrototype { prefab: String, prototype: String },

    #[error("entity {entity:?} does not exist")]
    NoSuchEntity { entity: Entity },

    #[error("building '{prototype}' of prefab '{prefab}': {source}")]
    Build {
        prefab: String,
        prototype: String,
        #[source]
        source: ComponentError,
    },

    #[error(transparent)]
    Prefab(#[from] PrefabError),

    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Component(#[from] ComponentError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    System(#[from] SystemRunError),
}

impl SceneError {
    /// Build a precondition error pointing at the caller.
    #[track_caller]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
            location: Location::caller(),
        }
    }
}
