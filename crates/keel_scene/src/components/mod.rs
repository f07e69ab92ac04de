//! Engine components buildable from prefab data.

mod camera;
mod health;
mod markers;
mod render;
mod transform;

pub use camera::{Camera, Projection};
pub use health::Health;
pub use markers::{Hostile, Static, Visible};
pub use render::{Light, LightKind, Material, Mesh};
pub use transform::Transform;

use keel_core::ecs::{register_identity_components, ComponentError, ComponentRegistry};

/// Register every engine component, identity components included.
pub fn register_engine_components(components: &mut ComponentRegistry) -> Result<(), ComponentError> {
    register_identity_components(components)?;
    transform::register(components)?;
    health::register(components)?;
    camera::register(components)?;
    render::register(components)?;
    markers::register(components)?;
    Ok(())
}
