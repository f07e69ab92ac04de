// overlay.rs - Inspector drawn around every tick

use crate::{entities_panel, metrics_panel, prefab_panel, EditorUiState};
use keel_runtime::FrameOverlay;
use keel_scene::{PrefabDefinition, SceneManager};

/// Re-renders the panels every `refresh_every` ticks and keeps the latest
/// text for the host to display.
pub struct InspectorOverlay {
    pub state: EditorUiState,
    refresh_every: u64,
    frames: u64,
    text: String,
}

impl InspectorOverlay {
    pub fn new(state: EditorUiState, refresh_every: u64) -> Self {
        Self {
            state,
            refresh_every: refresh_every.max(1),
            frames: 0,
            text: String::new(),
        }
    }

    /// Panels as of the last refresh.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Render every panel now.
    pub fn render(&mut self, scene: &mut SceneManager) -> &str {
        let mut text = metrics_panel(scene, &self.state);
        text.push_str(&prefab_panel(scene, &self.state));
        text.push_str(&entities_panel(scene, &self.state));
        self.text = text;
        &self.text
    }
}

impl FrameOverlay for InspectorOverlay {
    fn begin_frame(&mut self, scene: &mut SceneManager) {
        let prefabs = scene.assets().ids::<PrefabDefinition>();
        let registry = scene.registry();
        self.state.retain_valid(
            |entity| registry.contains(entity),
            |prefab| prefabs.iter().any(|id| id == prefab),
        );
    }

    fn end_frame(&mut self, scene: &mut SceneManager) {
        self.frames += 1;
        if self.frames % self.refresh_every == 0 {
            self.render(scene);
            tracing::trace!(frame = self.frames, "\n{}", self.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_render::HeadlessRenderer;
    use keel_scene::PrototypeSelection;

    #[test]
    fn test_refresh_cadence_and_stale_selection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enemy.json");
        std::fs::write(&path, r#"{ "goblin": { "components": { "health": 4 } } }"#).unwrap();
        let mut scene = SceneManager::new(Box::new(HeadlessRenderer::new())).unwrap();
        scene.load_prefab("enemy", path, PrototypeSelection::All).unwrap();
        scene.create_prototypes("enemy", &["goblin".to_string()]).unwrap();
        let goblin = scene
            .create_entity("enemy", "goblin", "goblin_1", None, None)
            .unwrap();

        let state = EditorUiState {
            selected_entity: Some(goblin),
            selected_prefab: Some("missing".into()),
            ..EditorUiState::default()
        };
        let mut overlay = InspectorOverlay::new(state, 2);

        overlay.begin_frame(&mut scene);
        assert_eq!(overlay.state.selected_prefab, None);
        assert_eq!(overlay.state.selected_entity, Some(goblin));
        overlay.end_frame(&mut scene);
        assert!(overlay.text().is_empty());

        scene.delete_entity(goblin).unwrap();
        scene.sweep();
        overlay.begin_frame(&mut scene);
        overlay.end_frame(&mut scene);
        assert_eq!(overlay.state.selected_entity, None);
        assert!(overlay.text().contains("== Metrics =="));
        assert!(!overlay.text().contains("goblin_1"));
        assert_eq!(overlay.frames(), 2);
    }
}
