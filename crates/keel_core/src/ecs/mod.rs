//! Entity Component System layer.
//!
//! Storage is delegated to `hecs`; this module adds what the scene code
//! needs on top: lifetime counters on the world, a name-keyed registry of
//! type-erased component operations driven by prefab data, identity
//! components, and priority-ordered systems.

mod component;
mod identity;
mod registry;
mod system;
mod system_registration_error;
mod value;

pub use component::{
    CloneContext, ComponentBuilder, ComponentEntry, ComponentError, ComponentKind,
    ComponentRegistry, HookContext, HookError,
};
pub use identity::{register_identity_components, CDeleted, CName, CTag, CUuid};
pub use registry::EntityRegistry;
pub use system::{System, SystemError, SystemHandle, SystemRegistry, SystemRunError};
pub use system_registration_error::SystemRegistrationError;
pub use value::{FieldError, FieldValue, Reflect, PRIMARY_FIELD};

pub use hecs::{Entity, EntityBuilder, World};
