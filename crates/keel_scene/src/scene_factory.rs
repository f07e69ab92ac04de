// scene_factory.rs - Scene build, reload and teardown
//
// At most one scene is active. Metrics and the name index are caches: every
// mutation through this type sets a dirty flag and the next read rebuilds.

use crate::entity_factory::EntityFactory;
use crate::prefab::PrefabDefinition;
use crate::scene_definition::{EntitySpawn, SceneDefinition};
use crate::SceneError;
use keel_asset::{Asset, AssetHandle, AssetRegistry, ModelAsset, ShaderAsset, TextureAsset};
use keel_core::ecs::{
    CDeleted, CName, CTag, CUuid, CloneContext, ComponentRegistry, Entity, EntityBuilder,
    EntityRegistry,
};
use keel_metrics::{time_phase, PhaseProfiler};
use keel_render::RenderCollaborator;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use uuid::Uuid;

/// Everything a scene operation may touch, borrowed from the owner.
pub struct SceneContext<'a> {
    pub registry: &'a mut EntityRegistry,
    pub components: &'a ComponentRegistry,
    pub assets: &'a mut AssetRegistry,
    pub renderer: &'a mut dyn RenderCollaborator,
}

/// Scene-wide counts.
///
/// `entities_total_alive == prototypes_total_alive + instances_total_alive`
/// and `entities_total_created - entities_total_alive == entities_total_released`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SceneMetrics {
    pub scene: Option<String>,
    pub prototypes_per_prefab: BTreeMap<String, usize>,
    pub prototypes_total_alive: u64,
    pub entities_total_alive: u64,
    pub entities_total_created: u64,
    pub entities_total_released: u64,
    pub instances_total_alive: u64,
}

pub struct SceneFactory {
    entity_factory: EntityFactory,
    active: Option<String>,
    metrics_dirty: bool,
    metrics: SceneMetrics,
    names_dirty: bool,
    names: BTreeMap<String, Entity>,
    profiler: PhaseProfiler,
}

impl Default for SceneFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneFactory {
    pub fn new() -> Self {
        Self {
            entity_factory: EntityFactory::new(),
            active: None,
            metrics_dirty: true,
            metrics: SceneMetrics::default(),
            names_dirty: true,
            names: BTreeMap::new(),
            profiler: PhaseProfiler::new(),
        }
    }

    pub fn active_scene(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn entity_factory(&self) -> &EntityFactory {
        &self.entity_factory
    }

    pub fn entity_factory_mut(&mut self) -> &mut EntityFactory {
        self.mark_dirty();
        &mut self.entity_factory
    }

    /// Timings of the most recent build phases.
    pub fn build_timings(&self) -> &PhaseProfiler {
        &self.profiler
    }

    /// Invalidate metrics and the name index after an outside mutation.
    pub fn mark_dirty(&mut self) {
        self.metrics_dirty = true;
        self.names_dirty = true;
    }

    #[track_caller]
    fn require_active(&self) -> Result<String, SceneError> {
        self.active
            .clone()
            .ok_or_else(|| SceneError::precondition("no scene is active"))
    }

    /// Build the scene in `path` and make it active under `id`.
    ///
    /// Phases run in order: shader programs, textures, models, prefabs and
    /// their prototypes, declared instances. If any phase fails, entities and
    /// prototypes spawned by this call are removed again and no scene is
    /// active. Shared assets loaded on the way stay cached.
    #[track_caller]
    pub fn create_scene(&mut self, id: &str, path: &Path, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        if let Some(active) = &self.active {
            return Err(SceneError::precondition(format!(
                "scene '{active}' is still active; clear it before creating '{id}'"
            )));
        }
        let span = tracing::info_span!("create_scene", scene = %id);
        let _enter = span.enter();
        self.profiler.reset();

        let existing: HashSet<Entity> = ctx.registry.entities().into_iter().collect();
        let known: Vec<String> = self.entity_factory.prefab_ids().map(str::to_string).collect();
        if let Err(err) = self.build_scene(id, path, ctx) {
            let removed = self.rollback(&existing, &known, ctx);
            tracing::warn!(error = %err, removed, "scene build failed; rolled back");
            return Err(err);
        }

        for (phase, timing) in self.profiler.iter() {
            tracing::debug!(phase, elapsed = ?timing.last, "scene phase finished");
        }
        self.active = Some(id.to_string());
        self.mark_dirty();
        tracing::info!(
            prototypes = self.entity_factory.total_alive(),
            entities = ctx.registry.alive(),
            "scene created"
        );
        Ok(())
    }

    fn build_scene(&mut self, id: &str, path: &Path, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        let handle = load_or_reload::<SceneDefinition>(ctx.assets, id, path.to_path_buf())?;
        let scene = handle.read().clone();

        time_phase!(self.profiler, "scene.shaders", { load_shaders(&scene, ctx) })?;
        time_phase!(self.profiler, "scene.textures", { load_textures(&scene, ctx.assets) })?;
        time_phase!(self.profiler, "scene.models", { load_models(&scene, ctx.assets) })?;
        let entity_factory = &mut self.entity_factory;
        time_phase!(self.profiler, "scene.prefabs", {
            instantiate_prefabs(entity_factory, &scene, ctx)
        })?;
        time_phase!(self.profiler, "scene.entities", {
            spawn_instances(entity_factory, &scene.entities, ctx)
        })?;
        Ok(())
    }

    /// Undo a partial build: despawn every entity not in `existing` and drop
    /// prefabs that were not `known` before. Returns how many were despawned.
    fn rollback(&mut self, existing: &HashSet<Entity>, known: &[String], ctx: &mut SceneContext<'_>) -> usize {
        let built: Vec<Entity> = ctx
            .registry
            .entities()
            .into_iter()
            .filter(|entity| !existing.contains(entity))
            .collect();
        for entity in &built {
            self.entity_factory.forget(*entity);
            // Ignored: `entities` just listed it as alive.
            let _ = ctx.registry.despawn(*entity);
        }
        self.entity_factory
            .retain_prefabs(|prefab| known.iter().any(|id| id == prefab));
        ctx.renderer.clear();
        self.mark_dirty();
        built.len()
    }

    /// Rebuild the active scene.
    ///
    /// With `reload_prototypes` the registry is wiped, prefab files are read
    /// again and every prototype is recreated. Without it only instances
    /// (identity-bearing entities outside the prototype index) are removed.
    /// Declared instances are respawned in both modes.
    #[track_caller]
    pub fn reload_scene(&mut self, reload_prototypes: bool, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        let id = self.require_active()?;
        let span = tracing::info_span!("reload_scene", scene = %id, reload_prototypes);
        let _enter = span.enter();
        let scene = ctx.assets.get::<SceneDefinition>(&id)?.read().clone();

        if reload_prototypes {
            ctx.registry.clear();
            self.entity_factory.clear();
            instantiate_prefabs(&mut self.entity_factory, &scene, ctx)?;
        } else {
            let instances: Vec<Entity> = ctx
                .registry
                .entities_with::<&CUuid>()
                .into_iter()
                .filter(|entity| !self.entity_factory.is_prototype(*entity))
                .collect();
            for entity in &instances {
                ctx.registry
                    .despawn(*entity)
                    .map_err(|_| SceneError::NoSuchEntity { entity: *entity })?;
            }
            tracing::debug!(removed = instances.len(), "instances removed");
        }
        spawn_instances(&self.entity_factory, &scene.entities, ctx)?;
        self.mark_dirty();
        Ok(())
    }

    /// Tear the active scene down: entities, prototype index, render
    /// resources and caches.
    #[track_caller]
    pub fn clear_scene(&mut self, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
        let id = self.require_active()?;
        ctx.registry.clear();
        self.entity_factory.clear();
        ctx.renderer.clear();
        self.active = None;
        self.names.clear();
        self.metrics = SceneMetrics::default();
        self.mark_dirty();
        tracing::info!(scene = %id, "scene cleared");
        Ok(())
    }

    /// Spawn an instance of a live prototype. The tag defaults to the
    /// prototype id and the uuid to a fresh v4.
    pub fn create_entity(
        &mut self,
        prefab_id: &str,
        prototype_id: &str,
        name: &str,
        tag: Option<&str>,
        uuid: Option<Uuid>,
        ctx: &mut SceneContext<'_>,
    ) -> Result<Entity, SceneError> {
        let entity = create_instance(&self.entity_factory, prefab_id, prototype_id, name, tag, uuid, ctx)?;
        self.mark_dirty();
        Ok(entity)
    }

    /// Copy every cloneable component of `source` onto a new entity with its
    /// own identity.
    pub fn clone_entity(
        &mut self,
        source: Entity,
        uuid: Uuid,
        name: Option<&str>,
        tag: Option<&str>,
        ctx: &mut SceneContext<'_>,
    ) -> Result<Entity, SceneError> {
        let entity = clone_instance(source, uuid, name, tag, ctx)?;
        self.mark_dirty();
        Ok(entity)
    }

    /// Soft-delete an entity; the next sweep despawns it. A prototype also
    /// leaves the prototype index at once, as with `delete_prototypes`.
    pub fn delete_entity(&mut self, entity: Entity, registry: &mut EntityRegistry) -> Result<(), SceneError> {
        if let Some((prefab, prototype)) = self.entity_factory.prototype_key(entity) {
            let (prefab, ids) = (prefab.to_string(), vec![prototype.to_string()]);
            self.entity_factory.delete_prototypes(&prefab, &ids, registry)?;
        } else {
            registry
                .insert_one(entity, CDeleted)
                .map_err(|_| SceneError::NoSuchEntity { entity })?;
        }
        self.mark_dirty();
        Ok(())
    }

    pub fn get_metrics(&mut self, registry: &EntityRegistry) -> &SceneMetrics {
        let stale = self.metrics.entities_total_alive != registry.alive()
            || self.metrics.entities_total_created != registry.created();
        if self.metrics_dirty || stale {
            let prototypes = self.entity_factory.metrics().clone();
            let alive = registry.alive();
            let total = prototypes.total as u64;
            self.metrics = SceneMetrics {
                scene: self.active.clone(),
                prototypes_per_prefab: prototypes.per_prefab,
                prototypes_total_alive: total,
                entities_total_alive: alive,
                entities_total_created: registry.created(),
                entities_total_released: registry.released(),
                instances_total_alive: alive.saturating_sub(total),
            };
            self.metrics_dirty = false;
        }
        &self.metrics
    }

    /// Display name -> entity for live, named instances.
    pub fn get_named_entities(&mut self, registry: &EntityRegistry) -> &BTreeMap<String, Entity> {
        if self.names_dirty {
            self.names.clear();
            let mut query = registry
                .world()
                .query::<(&CName, &CUuid, Option<&CDeleted>)>();
            for (entity, (name, _, deleted)) in query.iter() {
                if deleted.is_some() {
                    continue;
                }
                if let Some(previous) = self.names.insert(name.0.clone(), entity) {
                    tracing::warn!(name = %name, ?previous, ?entity, "duplicate entity name");
                }
            }
            self.names_dirty = false;
        }
        &self.names
    }
}

/// Load `id`, or read it from disk again if it is already registered.
fn load_or_reload<T: Asset>(assets: &mut AssetRegistry, id: &str, args: T::Args) -> Result<AssetHandle<T>, SceneError> {
    let handle = if assets.contains::<T>(id) {
        assets.reload::<T>(id, args)?
    } else {
        assets.load::<T>(id, args)?
    };
    Ok(handle)
}

fn load_shaders(scene: &SceneDefinition, ctx: &mut SceneContext<'_>) -> Result<(), SceneError> {
    for (name, sources) in &scene.assets.shaders {
        if !ctx.assets.contains::<ShaderAsset>(name) {
            ctx.assets.load::<ShaderAsset>(name, sources.clone())?;
        }
        ctx.renderer.add_shader_program(name, ctx.assets)?;
    }
    Ok(())
}

fn load_textures(scene: &SceneDefinition, assets: &mut AssetRegistry) -> Result<(), SceneError> {
    for (name, desc) in &scene.assets.textures {
        if !assets.contains::<TextureAsset>(name) {
            assets.load::<TextureAsset>(name, desc.clone())?;
        }
    }
    Ok(())
}

fn load_models(scene: &SceneDefinition, assets: &mut AssetRegistry) -> Result<(), SceneError> {
    for (name, path) in &scene.assets.models {
        if !assets.contains::<ModelAsset>(name) {
            assets.load::<ModelAsset>(name, path.clone())?;
        }
    }
    Ok(())
}

fn instantiate_prefabs(
    entity_factory: &mut EntityFactory,
    scene: &SceneDefinition,
    ctx: &mut SceneContext<'_>,
) -> Result<(), SceneError> {
    for (prefab_id, prefab) in &scene.assets.prefabs {
        let args = (prefab.path.clone(), prefab.selection());
        let handle = load_or_reload::<PrefabDefinition>(ctx.assets, prefab_id, args)?;
        let ids = handle.read().prototype_ids().to_vec();
        entity_factory.create_prototypes(prefab_id, &ids, ctx.registry, ctx.components, ctx.assets)?;
    }
    Ok(())
}

fn spawn_instances(
    entity_factory: &EntityFactory,
    spawns: &[EntitySpawn],
    ctx: &mut SceneContext<'_>,
) -> Result<(), SceneError> {
    for spawn in spawns {
        create_instance(
            entity_factory,
            &spawn.prefab,
            &spawn.prototype,
            &spawn.name,
            spawn.tag.as_deref(),
            spawn.uuid,
            ctx,
        )?;
    }
    Ok(())
}

fn create_instance(
    entity_factory: &EntityFactory,
    prefab_id: &str,
    prototype_id: &str,
    name: &str,
    tag: Option<&str>,
    uuid: Option<Uuid>,
    ctx: &mut SceneContext<'_>,
) -> Result<Entity, SceneError> {
    let source = entity_factory.get_prototype(prefab_id, prototype_id)?;
    let uuid = uuid.unwrap_or_else(Uuid::new_v4);
    clone_instance(source, uuid, Some(name), Some(tag.unwrap_or(prototype_id)), ctx)
}

fn clone_instance(
    source: Entity,
    uuid: Uuid,
    name: Option<&str>,
    tag: Option<&str>,
    ctx: &mut SceneContext<'_>,
) -> Result<Entity, SceneError> {
    if !ctx.registry.contains(source) {
        return Err(SceneError::NoSuchEntity { entity: source });
    }
    let mut builder = EntityBuilder::new();
    let copied = ctx
        .components
        .clone_components(ctx.registry.world(), source, &mut builder)?;
    builder.add(CUuid(uuid));
    if let Some(name) = name {
        builder.add(CName::new(name));
    }
    if let Some(tag) = tag {
        builder.add(CTag::new(tag));
    }
    let destination = ctx.registry.spawn_built(&mut builder);

    let hooks = CloneContext {
        source,
        destination,
        assets: ctx.assets,
    };
    if let Err(err) = ctx
        .components
        .run_cloned_hooks(ctx.registry.world(), &copied, &hooks)
    {
        // Ignored: the entity was spawned above and nothing else has seen it.
        let _ = ctx.registry.despawn(destination);
        return Err(err.into());
    }
    tracing::debug!(?source, ?destination, %uuid, name, "entity cloned");
    Ok(destination)
}
