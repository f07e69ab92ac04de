//! Keel Render System
//!
//! The scene code only needs two things from a renderer: turn a loaded
//! shader asset into a program, and release everything on scene teardown.
//! GPU backends implement [`RenderCollaborator`]; [`HeadlessRenderer`] keeps
//! the bookkeeping without a device.

pub mod backend;

pub use backend::{HeadlessRenderer, ShaderProgram};

use keel_asset::{AssetError, AssetRegistry};
use thiserror::Error;

/// Errors raised by a render collaborator.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error("shader program '{name}' already exists")]
    DuplicateProgram { name: String },

    #[error("shader program '{name}' failed to link: {reason}")]
    Link { name: String, reason: String },
}

/// Renderer operations invoked during scene build and teardown.
pub trait RenderCollaborator {
    /// Build a program from the shader asset registered under `name`.
    fn add_shader_program(&mut self, name: &str, assets: &AssetRegistry) -> Result<(), RenderError>;

    /// Release every program and framebuffer.
    fn clear(&mut self);
}
