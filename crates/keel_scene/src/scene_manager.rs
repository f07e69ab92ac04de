// scene_manager.rs - System-facing façade
//
// Owns the ECS registry, component and asset registries, the scene factory,
// the systems and the render collaborator. Frame order: every system in
// ascending priority, then the deletion sweep.

use crate::components::register_engine_components;
use crate::prefab::{PrefabDefinition, PrototypeSelection};
use crate::scene_factory::{SceneContext, SceneFactory, SceneMetrics};
use crate::SceneError;
use keel_asset::{AssetHandle, AssetRegistry};
use keel_core::ecs::{
    CDeleted, CloneContext, ComponentError, ComponentRegistry, Entity, EntityRegistry,
    HookContext, System, SystemHandle, SystemRegistrationError, SystemRegistry,
};
use keel_core::hecs::Component;
use keel_metrics::PhaseProfiler;
use keel_render::RenderCollaborator;
use std::any::{type_name, TypeId};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use uuid::Uuid;

pub struct SceneManager {
    registry: EntityRegistry,
    components: ComponentRegistry,
    assets: AssetRegistry,
    factory: SceneFactory,
    systems: SystemRegistry,
    renderer: Box<dyn RenderCollaborator>,
    profiler: PhaseProfiler,
}

/// Split-borrow the manager into a `SceneContext` plus the factory.
macro_rules! scene_context {
    ($manager:expr) => {{
        let SceneManager {
            registry,
            components,
            assets,
            factory,
            renderer,
            ..
        } = $manager;
        (
            factory,
            SceneContext {
                registry,
                components,
                assets,
                renderer: renderer.as_mut(),
            },
        )
    }};
}

impl SceneManager {
    /// A manager with the engine components registered.
    pub fn new(renderer: Box<dyn RenderCollaborator>) -> Result<Self, ComponentError> {
        let mut components = ComponentRegistry::new();
        register_engine_components(&mut components)?;
        Ok(Self::with_components(renderer, components))
    }

    /// A manager using a caller-built component registry.
    pub fn with_components(renderer: Box<dyn RenderCollaborator>, components: ComponentRegistry) -> Self {
        Self {
            registry: EntityRegistry::new(),
            components,
            assets: AssetRegistry::new(),
            factory: SceneFactory::new(),
            systems: SystemRegistry::new(),
            renderer,
            profiler: PhaseProfiler::new(),
        }
    }

    pub fn register_system(
        &mut self,
        name: &str,
        system: Box<dyn System>,
    ) -> Result<SystemHandle, SystemRegistrationError> {
        self.systems.register(name, system, &mut self.registry)
    }

    /// Run one simulation tick.
    pub fn on_update(&mut self, ts: Duration) -> Result<(), SceneError> {
        self.systems
            .update_all(&mut self.registry, ts, &mut self.profiler)?;
        self.sweep();
        Ok(())
    }

    /// Despawn every soft-deleted entity. Returns how many were removed.
    ///
    /// A prototype tagged directly through the registry still sits in the
    /// prototype index, so it is dropped from there too.
    pub fn sweep(&mut self) -> usize {
        let doomed = self.registry.entities_with::<&CDeleted>();
        for entity in &doomed {
            if let Some((prefab, prototype)) = self.factory.entity_factory_mut().forget(*entity) {
                tracing::debug!(%prefab, %prototype, ?entity, "swept prototype left the index");
            }
            // Ignored: the query just returned these entities as alive.
            let _ = self.registry.despawn(*entity);
        }
        if !doomed.is_empty() {
            tracing::trace!(count = doomed.len(), "soft-deleted entities swept");
            self.factory.mark_dirty();
        }
        doomed.len()
    }

    /// Run `T`'s `on_added` hook for `entity`. `T` must be registered.
    pub fn on_component_added<T: Component>(&self, entity: Entity) -> Result<(), ComponentError> {
        let ctx = HookContext {
            entity,
            assets: &self.assets,
        };
        self.components
            .invoke_added(TypeId::of::<T>(), type_name::<T>(), self.registry.world(), &ctx)
    }

    /// Run `T`'s `on_cloned` hook for the copy on `destination`.
    pub fn on_component_cloned<T: Component>(&self, source: Entity, destination: Entity) -> Result<(), ComponentError> {
        let ctx = CloneContext {
            source,
            destination,
            assets: &self.assets,
        };
        self.components
            .invoke_cloned(TypeId::of::<T>(), type_name::<T>(), self.registry.world(), &ctx)
    }

    #[track_caller]
    pub fn create_scene(&mut self, id: &str, path: &Path) -> Result<(), SceneError> {
        let (factory, mut ctx) = scene_context!(self);
        factory.create_scene(id, path, &mut ctx)
    }

    #[track_caller]
    pub fn reload_scene(&mut self, reload_prototypes: bool) -> Result<(), SceneError> {
        let (factory, mut ctx) = scene_context!(self);
        factory.reload_scene(reload_prototypes, &mut ctx)
    }

    #[track_caller]
    pub fn clear_scene(&mut self) -> Result<(), SceneError> {
        let (factory, mut ctx) = scene_context!(self);
        factory.clear_scene(&mut ctx)
    }

    pub fn create_entity(
        &mut self,
        prefab_id: &str,
        prototype_id: &str,
        name: &str,
        tag: Option<&str>,
        uuid: Option<Uuid>,
    ) -> Result<Entity, SceneError> {
        let (factory, mut ctx) = scene_context!(self);
        factory.create_entity(prefab_id, prototype_id, name, tag, uuid, &mut ctx)
    }

    pub fn clone_entity(
        &mut self,
        source: Entity,
        uuid: Uuid,
        name: Option<&str>,
        tag: Option<&str>,
    ) -> Result<Entity, SceneError> {
        let (factory, mut ctx) = scene_context!(self);
        factory.clone_entity(source, uuid, name, tag, &mut ctx)
    }

    pub fn delete_entity(&mut self, entity: Entity) -> Result<(), SceneError> {
        self.factory.delete_entity(entity, &mut self.registry)
    }

    /// Load (or re-read) a prefab definition outside of any scene file.
    pub fn load_prefab(
        &mut self,
        id: &str,
        path: impl Into<PathBuf>,
        selection: PrototypeSelection,
    ) -> Result<AssetHandle<PrefabDefinition>, SceneError> {
        let args = (path.into(), selection);
        let handle = if self.assets.contains::<PrefabDefinition>(id) {
            self.assets.reload::<PrefabDefinition>(id, args)?
        } else {
            self.assets.load::<PrefabDefinition>(id, args)?
        };
        Ok(handle)
    }

    pub fn create_prototypes(&mut self, prefab_id: &str, ids: &[String]) -> Result<Vec<Entity>, SceneError> {
        self.factory.entity_factory_mut().create_prototypes(
            prefab_id,
            ids,
            &mut self.registry,
            &self.components,
            &self.assets,
        )
    }

    pub fn update_prototypes(&mut self, prefab_id: &str, ids: &[String]) -> Result<Vec<Entity>, SceneError> {
        self.factory.entity_factory_mut().update_prototypes(
            prefab_id,
            ids,
            &mut self.registry,
            &self.components,
            &self.assets,
        )
    }

    pub fn delete_prototypes(&mut self, prefab_id: &str, ids: &[String]) -> Result<(), SceneError> {
        self.factory
            .entity_factory_mut()
            .delete_prototypes(prefab_id, ids, &mut self.registry)
    }

    pub fn get_prototypes(&self, prefab_id: &str, ids: &[String]) -> Result<Vec<Entity>, SceneError> {
        self.factory.entity_factory().get_prototypes(prefab_id, ids)
    }

    pub fn contains_prototypes(&self, prefab_id: &str, ids: &[String]) -> Result<bool, SceneError> {
        self.factory.entity_factory().contains_prototypes(prefab_id, ids)
    }

    pub fn metrics(&mut self) -> &SceneMetrics {
        self.factory.get_metrics(&self.registry)
    }

    pub fn named_entities(&mut self) -> &BTreeMap<String, Entity> {
        self.factory.get_named_entities(&self.registry)
    }

    /// `(component, fields)` for every registered component on `entity`.
    pub fn describe_entity(&self, entity: Entity) -> Vec<(String, BTreeMap<String, String>)> {
        self.components.describe(self.registry.world(), entity)
    }

    pub fn active_scene(&self) -> Option<&str> {
        self.factory.active_scene()
    }

    pub fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    /// Direct registry access. Call [`SceneFactory::mark_dirty`] through
    /// [`SceneManager::factory_mut`] after structural changes made here.
    pub fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub fn components(&self) -> &ComponentRegistry {
        &self.components
    }

    /// Register additional components. Existing entities are unaffected.
    pub fn components_mut(&mut self) -> &mut ComponentRegistry {
        &mut self.components
    }

    pub fn assets(&self) -> &AssetRegistry {
        &self.assets
    }

    pub fn assets_mut(&mut self) -> &mut AssetRegistry {
        &mut self.assets
    }

    pub fn factory(&self) -> &SceneFactory {
        &self.factory
    }

    pub fn factory_mut(&mut self) -> &mut SceneFactory {
        &mut self.factory
    }

    pub fn systems(&self) -> &SystemRegistry {
        &self.systems
    }

    /// Per-system update timings.
    pub fn profiler(&self) -> &PhaseProfiler {
        &self.profiler
    }
}
