//! Keel Editor
//!
//! Text inspector panels over a live [`keel_scene::SceneManager`]. All panel
//! state lives in [`EditorUiState`], which the caller owns and passes in every
//! frame.

pub mod overlay;
pub mod panels;
pub mod state;

pub use overlay::InspectorOverlay;
pub use panels::{entities_panel, metrics_panel, prefab_panel};
pub use state::EditorUiState;
