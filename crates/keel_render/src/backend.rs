//! Headless rendering backend
//!
//! Validates and records shader programs exactly like a GPU backend would,
//! minus the device calls. Used by tests, tools and the headless runtime.

use crate::{RenderCollaborator, RenderError};
use keel_asset::{AssetRegistry, ShaderAsset, ShaderStage};
use std::collections::BTreeMap;

/// A linked program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderProgram {
    pub stages: Vec<ShaderStage>,
    /// Total source length across stages, in bytes.
    pub source_bytes: usize,
}

#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    programs: BTreeMap<String, ShaderProgram>,
    clears: u32,
}

impl HeadlessRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn program(&self, name: &str) -> Option<&ShaderProgram> {
        self.programs.get(name)
    }

    pub fn program_names(&self) -> impl Iterator<Item = &str> {
        self.programs.keys().map(String::as_str)
    }

    pub fn program_count(&self) -> usize {
        self.programs.len()
    }

    /// How many times `clear` has run.
    pub fn clears(&self) -> u32 {
        self.clears
    }
}

impl RenderCollaborator for HeadlessRenderer {
    fn add_shader_program(&mut self, name: &str, assets: &AssetRegistry) -> Result<(), RenderError> {
        if self.programs.contains_key(name) {
            return Err(RenderError::DuplicateProgram {
                name: name.to_string(),
            });
        }
        let handle = assets.get::<ShaderAsset>(name)?;
        let shader = handle.read();
        let program = ShaderProgram {
            stages: shader.stages.keys().copied().collect(),
            source_bytes: shader.stages.values().map(String::len).sum(),
        };
        if program.source_bytes == 0 {
            return Err(RenderError::Link {
                name: name.to_string(),
                reason: "all stages are empty".into(),
            });
        }
        tracing::debug!(program = name, stages = program.stages.len(), "shader program linked");
        self.programs.insert(name.to_string(), program);
        Ok(())
    }

    fn clear(&mut self) {
        tracing::debug!(programs = self.programs.len(), "render resources released");
        self.programs.clear();
        self.clears += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shader(vertex: &str, fragment: &str) -> ShaderAsset {
        ShaderAsset {
            stages: BTreeMap::from([
                (ShaderStage::Vertex, vertex.to_string()),
                (ShaderStage::Fragment, fragment.to_string()),
            ]),
        }
    }

    #[test]
    fn test_links_registered_shader() {
        let mut assets = AssetRegistry::new();
        assets.insert("basic", shader("void main() {}", "void main() {}")).unwrap();

        let mut renderer = HeadlessRenderer::new();
        renderer.add_shader_program("basic", &assets).unwrap();
        let program = renderer.program("basic").unwrap();
        assert_eq!(program.stages, vec![ShaderStage::Vertex, ShaderStage::Fragment]);
        assert!(matches!(
            renderer.add_shader_program("basic", &assets),
            Err(RenderError::DuplicateProgram { .. })
        ));

        renderer.clear();
        assert_eq!(renderer.program_count(), 0);
        assert_eq!(renderer.clears(), 1);
    }

    #[test]
    fn test_missing_shader_is_an_asset_error() {
        let assets = AssetRegistry::new();
        let mut renderer = HeadlessRenderer::new();
        assert!(matches!(
            renderer.add_shader_program("nope", &assets),
            Err(RenderError::Asset(_))
        ));
    }
}
