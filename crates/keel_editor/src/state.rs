//! Persistent UI state for the inspector panels.

use keel_core::ecs::Entity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorUiState {
    /// Prefab shown in detail by the prefab panel.
    pub selected_prefab: Option<String>,
    /// Entity shown in detail by the entities panel.
    pub selected_entity: Option<Entity>,
    /// Case-insensitive substring filter applied to every list.
    pub filter: String,
    /// List prototype entities alongside named instances.
    pub show_prototypes: bool,
    pub show_metrics: bool,
    pub show_prefabs: bool,
    pub show_entities: bool,
}

impl Default for EditorUiState {
    fn default() -> Self {
        Self {
            selected_prefab: None,
            selected_entity: None,
            filter: String::new(),
            show_prototypes: false,
            show_metrics: true,
            show_prefabs: true,
            show_entities: true,
        }
    }
}

impl EditorUiState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn matches_filter(&self, text: &str) -> bool {
        self.filter.is_empty() || text.to_lowercase().contains(&self.filter.to_lowercase())
    }

    /// Drop selections that no longer point at anything.
    pub fn retain_valid(&mut self, entity_alive: impl Fn(Entity) -> bool, prefab_known: impl Fn(&str) -> bool) {
        if self.selected_entity.is_some_and(|entity| !entity_alive(entity)) {
            self.selected_entity = None;
        }
        if self.selected_prefab.as_deref().is_some_and(|prefab| !prefab_known(prefab)) {
            self.selected_prefab = None;
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
