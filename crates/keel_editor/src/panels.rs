// panels.rs - Text renderings of the scene inspector panels
//
// Each panel reads the scene and the caller's `EditorUiState` and returns the
// text to draw. Panels never mutate the scene beyond its lazy caches.

use crate::EditorUiState;
use keel_core::ecs::Entity;
use keel_scene::{PrefabDefinition, SceneManager};
use std::fmt::Write;

/// Scene name, entity counters and live prototypes per prefab.
pub fn metrics_panel(scene: &mut SceneManager, state: &EditorUiState) -> String {
    let mut out = String::new();
    if !state.show_metrics {
        return out;
    }
    let metrics = scene.metrics();
    let _ = writeln!(out, "== Metrics ==");
    let _ = writeln!(out, "scene: {}", metrics.scene.as_deref().unwrap_or("<none>"));
    let _ = writeln!(
        out,
        "entities: {} alive, {} created, {} released",
        metrics.entities_total_alive, metrics.entities_total_created, metrics.entities_total_released
    );
    let _ = writeln!(
        out,
        "prototypes: {}  instances: {}",
        metrics.prototypes_total_alive, metrics.instances_total_alive
    );
    for (prefab, count) in &metrics.prototypes_per_prefab {
        if state.matches_filter(prefab) {
            let _ = writeln!(out, "  {prefab}: {count}");
        }
    }
    out
}

/// Loaded prefab definitions. The selected prefab is expanded to one line
/// per resolved prototype field.
pub fn prefab_panel(scene: &SceneManager, state: &EditorUiState) -> String {
    let mut out = String::new();
    if !state.show_prefabs {
        return out;
    }
    let _ = writeln!(out, "== Prefabs ==");
    let entity_factory = scene.factory().entity_factory();

    for prefab_id in scene.assets().ids::<PrefabDefinition>() {
        if !state.matches_filter(&prefab_id) {
            continue;
        }
        let live = entity_factory
            .prototypes(&prefab_id)
            .map(|prototypes| prototypes.count())
            .unwrap_or(0);
        let marker = if state.selected_prefab.as_deref() == Some(prefab_id.as_str()) {
            '>'
        } else {
            ' '
        };
        let _ = writeln!(out, "{marker} {prefab_id} ({live} live)");

        if marker != '>' {
            continue;
        }
        let Ok(handle) = scene.assets().get::<PrefabDefinition>(&prefab_id) else {
            continue;
        };
        let definition = handle.read();
        let _ = writeln!(out, "    file: {}", definition.path().display());
        for (prototype, fields) in definition.info() {
            let entity = entity_factory
                .get_prototype(&prefab_id, prototype)
                .map(|entity| format!("{entity:?}"))
                .unwrap_or_else(|_| "not instantiated".into());
            let _ = writeln!(out, "    [{prototype}] {entity}");
            for (key, value) in fields {
                if !value.is_empty() {
                    let _ = writeln!(out, "      {key}: {value}");
                }
            }
        }
    }
    out
}

/// Named instances (and prototypes when enabled), then the selected
/// entity's components.
pub fn entities_panel(scene: &mut SceneManager, state: &EditorUiState) -> String {
    let mut out = String::new();
    if !state.show_entities {
        return out;
    }
    let _ = writeln!(out, "== Entities ==");

    let named: Vec<(String, Entity)> = scene
        .named_entities()
        .iter()
        .filter(|(name, _)| state.matches_filter(name))
        .map(|(name, entity)| (name.clone(), *entity))
        .collect();
    for (name, entity) in &named {
        let _ = writeln!(out, "{} {name} {entity:?}", selection_marker(state, *entity));
    }

    if state.show_prototypes {
        let entity_factory = scene.factory().entity_factory();
        for prefab in entity_factory.prefab_ids() {
            let Ok(prototypes) = entity_factory.prototypes(prefab) else {
                continue;
            };
            for (prototype, entity) in prototypes {
                let label = format!("{prefab}/{prototype}");
                if state.matches_filter(&label) {
                    let _ = writeln!(out, "{} <{label}> {entity:?}", selection_marker(state, entity));
                }
            }
        }
    }

    if let Some(entity) = state.selected_entity {
        let components = scene.describe_entity(entity);
        if components.is_empty() {
            let _ = writeln!(out, "selected entity {entity:?} is gone");
        }
        for (component, fields) in components {
            let _ = writeln!(out, "  [{component}]");
            for (field, value) in fields {
                let _ = writeln!(out, "    {field} = {value}");
            }
        }
    }
    out
}

fn selection_marker(state: &EditorUiState, entity: Entity) -> char {
    if state.selected_entity == Some(entity) {
        '>'
    } else {
        ' '
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_render::HeadlessRenderer;
    use keel_scene::PrototypeSelection;

    const PREFAB: &str = r#"{
        "goblin": { "ctags": ["hostile"], "components": { "health": { "base": 10 } } },
        "orc": { "inherits": ["goblin"], "components": { "health": { "base": 25 } } }
    }"#;

    fn scene() -> (tempfile::TempDir, SceneManager, Entity) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("enemy.json");
        std::fs::write(&path, PREFAB).unwrap();
        let mut scene = SceneManager::new(Box::new(HeadlessRenderer::new())).unwrap();
        scene.load_prefab("enemy", path, PrototypeSelection::All).unwrap();
        scene
            .create_prototypes("enemy", &["goblin".to_string(), "orc".to_string()])
            .unwrap();
        let goblin = scene
            .create_entity("enemy", "goblin", "goblin_1", None, None)
            .unwrap();
        (dir, scene, goblin)
    }

    #[test]
    fn test_metrics_panel() {
        let (_dir, mut scene, _) = scene();
        let text = metrics_panel(&mut scene, &EditorUiState::new());
        assert!(text.contains("scene: <none>"));
        assert!(text.contains("entities: 3 alive, 3 created, 0 released"));
        assert!(text.contains("prototypes: 2  instances: 1"));
        assert!(text.contains("  enemy: 2"));

        let hidden = EditorUiState {
            show_metrics: false,
            ..EditorUiState::default()
        };
        assert!(metrics_panel(&mut scene, &hidden).is_empty());
    }

    #[test]
    fn test_prefab_panel_expands_selection() {
        let (_dir, scene, _) = scene();
        let collapsed = prefab_panel(&scene, &EditorUiState::new());
        assert!(collapsed.contains("  enemy (2 live)"));
        assert!(!collapsed.contains("[orc]"));

        let state = EditorUiState {
            selected_prefab: Some("enemy".into()),
            ..EditorUiState::default()
        };
        let expanded = prefab_panel(&scene, &state);
        assert!(expanded.contains("> enemy (2 live)"));
        assert!(expanded.contains("[orc]"));
        assert!(expanded.contains("chain: goblin"));
        assert!(expanded.contains("ctags: hostile"));
    }

    #[test]
    fn test_entities_panel_lists_and_inspects() {
        let (_dir, mut scene, goblin) = scene();
        let state = EditorUiState {
            selected_entity: Some(goblin),
            show_prototypes: true,
            ..EditorUiState::default()
        };
        let text = entities_panel(&mut scene, &state);
        assert!(text.contains("> goblin_1"));
        assert!(text.contains("<enemy/orc>"));
        assert!(text.contains("[health]"));
        assert!(text.contains("current = 10"));
        assert!(text.contains("[name]"));

        let filtered = EditorUiState {
            filter: "orc".into(),
            show_prototypes: true,
            ..EditorUiState::default()
        };
        let text = entities_panel(&mut scene, &filtered);
        assert!(!text.contains("goblin_1"));
        assert!(text.contains("<enemy/orc>"));
    }
}
