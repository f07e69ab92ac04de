// entity_factory.rs - Prototype instantiation
//
// Owns the (prefab, prototype) -> entity index. A prototype id is unique per
// prefab while it is alive. Deletion is soft: the entity is tagged and the
// index entry dropped immediately, the sweep despawns it later.

use crate::prefab::PrefabDefinition;
use crate::SceneError;
use keel_asset::AssetRegistry;
use keel_core::ecs::{CDeleted, ComponentRegistry, Entity, EntityRegistry};
use std::collections::{BTreeMap, HashMap};

/// Live prototype counts.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PrototypeMetrics {
    pub per_prefab: BTreeMap<String, usize>,
    pub total: usize,
}

#[derive(Default)]
pub struct EntityFactory {
    index: BTreeMap<String, BTreeMap<String, Entity>>,
    owners: HashMap<Entity, (String, String)>,
    dirty: bool,
    metrics: PrototypeMetrics,
}

impl EntityFactory {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    /// Build one entity per id from the loaded prefab definition `prefab_id`.
    ///
    /// The whole batch is checked before anything is spawned. If a component
    /// fails mid-build, the half-built entity is despawned.
    pub fn create_prototypes(
        &mut self,
        prefab_id: &str,
        ids: &[String],
        registry: &mut EntityRegistry,
        components: &ComponentRegistry,
        assets: &AssetRegistry,
    ) -> Result<Vec<Entity>, SceneError> {
        let handle = assets.get::<PrefabDefinition>(prefab_id)?;
        let definition = handle.read();

        let existing = self.index.get(prefab_id);
        for (position, id) in ids.iter().enumerate() {
            definition.prototype(id)?;
            let live = existing.is_some_and(|prototypes| prototypes.contains_key(id));
            if live || ids[..position].contains(id) {
                return Err(SceneError::DuplicatePrototype {
                    prefab: prefab_id.to_string(),
                    prototype: id.clone(),
                });
            }
        }

        let mut created = Vec::with_capacity(ids.len());
        for id in ids {
            let prototype = definition.prototype(id)?;
            let entity = registry.spawn();
            let world = registry.world_mut();

            let built = prototype
                .ctags
                .iter()
                .try_for_each(|tag| components.emplace(world, entity, tag, None, assets))
                .and_then(|()| {
                    prototype.components.iter().try_for_each(|(name, value)| {
                        components.emplace(world, entity, name, Some(value), assets)
                    })
                });
            if let Err(source) = built {
                // Ignored: the entity was spawned above and nothing else has seen it.
                let _ = registry.despawn(entity);
                return Err(SceneError::Build {
                    prefab: prefab_id.to_string(),
                    prototype: id.clone(),
                    source,
                });
            }

            self.index
                .entry(prefab_id.to_string())
                .or_default()
                .insert(id.clone(), entity);
            self.owners
                .insert(entity, (prefab_id.to_string(), id.clone()));
            tracing::debug!(prefab = prefab_id, prototype = %id, ?entity, "prototype created");
            created.push(entity);
        }

        // Instantiating an empty batch still makes the prefab known.
        self.index.entry(prefab_id.to_string()).or_default();
        self.dirty = true;
        Ok(created)
    }

    /// Delete then recreate, so every component is re-derived from the
    /// current prefab data.
    pub fn update_prototypes(
        &mut self,
        prefab_id: &str,
        ids: &[String],
        registry: &mut EntityRegistry,
        components: &ComponentRegistry,
        assets: &AssetRegistry,
    ) -> Result<Vec<Entity>, SceneError> {
        self.delete_prototypes(prefab_id, ids, registry)?;
        self.create_prototypes(prefab_id, ids, registry, components, assets)
    }

    /// Soft-delete: tag each entity with `CDeleted` and drop it from the index.
    pub fn delete_prototypes(
        &mut self,
        prefab_id: &str,
        ids: &[String],
        registry: &mut EntityRegistry,
    ) -> Result<(), SceneError> {
        let entities = self.get_prototypes(prefab_id, ids)?;
        for (id, entity) in ids.iter().zip(entities) {
            if let Some(prototypes) = self.index.get_mut(prefab_id) {
                prototypes.remove(id);
            }
            self.owners.remove(&entity);
            registry
                .insert_one(entity, CDeleted)
                .map_err(|_| SceneError::NoSuchEntity { entity })?;
            tracing::debug!(prefab = prefab_id, prototype = %id, ?entity, "prototype deleted");
        }
        self.dirty = true;
        Ok(())
    }

    pub fn get_prototype(&self, prefab_id: &str, id: &str) -> Result<Entity, SceneError> {
        self.prefab(prefab_id)?
            .get(id)
            .copied()
            .ok_or_else(|| SceneError::UnknownPrototype {
                prefab: prefab_id.to_string(),
                prototype: id.to_string(),
            })
    }

    pub fn get_prototypes(&self, prefab_id: &str, ids: &[String]) -> Result<Vec<Entity>, SceneError> {
        ids.iter()
            .map(|id| self.get_prototype(prefab_id, id))
            .collect()
    }

    /// Whether every id is live. Fails only if the prefab is unknown.
    pub fn contains_prototypes(&self, prefab_id: &str, ids: &[String]) -> Result<bool, SceneError> {
        let prototypes = self.prefab(prefab_id)?;
        Ok(ids.iter().all(|id| prototypes.contains_key(id)))
    }

    pub fn is_prototype(&self, entity: Entity) -> bool {
        self.owners.contains_key(&entity)
    }

    /// `(prefab, prototype)` of a live prototype entity.
    pub fn prototype_key(&self, entity: Entity) -> Option<(&str, &str)> {
        self.owners
            .get(&entity)
            .map(|(prefab, prototype)| (prefab.as_str(), prototype.as_str()))
    }

    /// Live prototypes of one prefab, sorted by id.
    pub fn prototypes(&self, prefab_id: &str) -> Result<impl Iterator<Item = (&str, Entity)>, SceneError> {
        Ok(self
            .prefab(prefab_id)?
            .iter()
            .map(|(id, entity)| (id.as_str(), *entity)))
    }

    /// Prefabs instantiated since the last clear, sorted.
    pub fn prefab_ids(&self) -> impl Iterator<Item = &str> {
        self.index.keys().map(String::as_str)
    }

    pub fn total_alive(&self) -> usize {
        self.owners.len()
    }

    /// Drop `entity` from the index if it is a prototype, returning its key.
    /// Used when an entity is despawned behind the factory's back.
    pub fn forget(&mut self, entity: Entity) -> Option<(String, String)> {
        let (prefab, prototype) = self.owners.remove(&entity)?;
        if let Some(prototypes) = self.index.get_mut(&prefab) {
            prototypes.remove(&prototype);
        }
        self.dirty = true;
        Some((prefab, prototype))
    }

    /// Drop every prefab with no live prototypes for which `keep` is false.
    pub fn retain_prefabs(&mut self, keep: impl Fn(&str) -> bool) {
        self.index
            .retain(|prefab, prototypes| !prototypes.is_empty() || keep(prefab));
        self.dirty = true;
    }

    pub fn clear(&mut self) {
        self.index.clear();
        self.owners.clear();
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Per-prefab counts, recomputed only after a mutation.
    pub fn metrics(&mut self) -> &PrototypeMetrics {
        if self.dirty {
            let per_prefab: BTreeMap<String, usize> = self
                .index
                .iter()
                .map(|(prefab, prototypes)| (prefab.clone(), prototypes.len()))
                .collect();
            self.metrics = PrototypeMetrics {
                total: per_prefab.values().sum(),
                per_prefab,
            };
            self.dirty = false;
        }
        &self.metrics
    }

    fn prefab(&self, prefab_id: &str) -> Result<&BTreeMap<String, Entity>, SceneError> {
        self.index
            .get(prefab_id)
            .ok_or_else(|| SceneError::UnknownPrefab {
                prefab: prefab_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{register_engine_components, Health, Hostile};
    use crate::prefab::PrototypeSelection;
    use std::path::Path;

    struct Fixture {
        factory: EntityFactory,
        registry: EntityRegistry,
        components: ComponentRegistry,
        assets: AssetRegistry,
    }

    fn fixture(doc: &str) -> Fixture {
        let mut components = ComponentRegistry::new();
        register_engine_components(&mut components).unwrap();
        let mut assets = AssetRegistry::new();
        let prefab = PrefabDefinition::parse(Path::new("enemy.json"), doc, &PrototypeSelection::All).unwrap();
        assets.insert("enemy", prefab).unwrap();
        Fixture {
            factory: EntityFactory::new(),
            registry: EntityRegistry::new(),
            components,
            assets,
        }
    }

    const ENEMIES: &str = r#"{
        "goblin": { "ctags": ["hostile"], "components": { "health": { "base": 10 } } },
        "orc": { "inherits": ["goblin"], "components": { "health": { "base": 30 } } },
        "broken": { "components": { "health": { "armor": 1 } } }
    }"#;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|id| id.to_string()).collect()
    }

    impl Fixture {
        fn create(&mut self, list: &[&str]) -> Result<Vec<Entity>, SceneError> {
            self.factory.create_prototypes(
                "enemy",
                &ids(list),
                &mut self.registry,
                &self.components,
                &self.assets,
            )
        }
    }

    #[test]
    fn test_goblin_prototype() {
        let mut f = fixture(ENEMIES);
        let goblin = f.create(&["goblin"]).unwrap()[0];
        assert!(f.registry.has::<Hostile>(goblin));
        let health = f.registry.get::<Health>(goblin).unwrap();
        assert_eq!((health.base, health.current), (10.0, 10.0));
        assert_eq!(f.factory.get_prototype("enemy", "goblin").unwrap(), goblin);
        assert!(f.factory.is_prototype(goblin));
    }

    #[test]
    fn test_duplicate_fails_and_keeps_existing_entity() {
        let mut f = fixture(ENEMIES);
        let goblin = f.create(&["goblin"]).unwrap()[0];
        f.registry.get_mut::<Health>(goblin).unwrap().current = 4.0;
        let alive = f.registry.alive();

        let err = f.create(&["orc", "goblin"]).unwrap_err();
        assert!(matches!(err, SceneError::DuplicatePrototype { .. }));
        assert_eq!(f.registry.alive(), alive, "batch is validated before spawning");
        assert!(!f.factory.contains_prototypes("enemy", &ids(&["orc"])).unwrap());
        assert_eq!(f.factory.get_prototype("enemy", "goblin").unwrap(), goblin);
        assert_eq!(f.registry.get::<Health>(goblin).unwrap().current, 4.0);

        assert!(matches!(
            f.create(&["orc", "orc"]),
            Err(SceneError::DuplicatePrototype { .. })
        ));
    }

    #[test]
    fn test_failed_build_despawns_entity() {
        let mut f = fixture(ENEMIES);
        let err = f.create(&["broken"]).unwrap_err();
        assert!(matches!(err, SceneError::Build { .. }));
        assert_eq!(f.registry.alive(), 0);
        assert_eq!(f.registry.released(), 1);
    }

    #[test]
    fn test_update_yields_new_entity_with_same_data() {
        let mut f = fixture(ENEMIES);
        let before = f.create(&["orc"]).unwrap()[0];
        let after = f
            .factory
            .update_prototypes("enemy", &ids(&["orc"]), &mut f.registry, &f.components, &f.assets)
            .unwrap()[0];
        assert_ne!(before, after);
        assert_eq!(f.factory.get_prototypes("enemy", &ids(&["orc"])).unwrap(), vec![after]);
        assert_eq!(
            *f.registry.get::<Health>(before).unwrap(),
            *f.registry.get::<Health>(after).unwrap()
        );
        assert!(f.registry.has::<CDeleted>(before));
    }

    #[test]
    fn test_delete_is_soft_and_immediate_in_index() {
        let mut f = fixture(ENEMIES);
        let goblin = f.create(&["goblin"]).unwrap()[0];
        f.factory
            .delete_prototypes("enemy", &ids(&["goblin"]), &mut f.registry)
            .unwrap();
        assert!(!f.factory.contains_prototypes("enemy", &ids(&["goblin"])).unwrap());
        assert!(f.registry.contains(goblin));
        assert!(f.registry.has::<CDeleted>(goblin));
        assert!(!f.factory.is_prototype(goblin));

        assert!(matches!(
            f.factory.delete_prototypes("enemy", &ids(&["goblin"]), &mut f.registry),
            Err(SceneError::UnknownPrototype { .. })
        ));
    }

    #[test]
    fn test_unknown_prefab_and_prototype() {
        let mut f = fixture(ENEMIES);
        assert!(matches!(
            f.factory.contains_prototypes("enemy", &ids(&["goblin"])),
            Err(SceneError::UnknownPrefab { .. })
        ));
        f.create(&[]).unwrap();
        assert!(!f.factory.contains_prototypes("enemy", &ids(&["goblin"])).unwrap());
        assert!(matches!(
            f.create(&["dragon"]),
            Err(SceneError::Prefab(_))
        ));
    }

    #[test]
    fn test_forget_drops_index_entry() {
        let mut f = fixture(ENEMIES);
        let goblin = f.create(&["goblin"]).unwrap()[0];
        let stray = f.registry.spawn();

        assert_eq!(f.factory.forget(stray), None);
        assert_eq!(
            f.factory.forget(goblin),
            Some(("enemy".to_string(), "goblin".to_string()))
        );
        assert!(!f.factory.is_prototype(goblin));
        assert!(!f.factory.contains_prototypes("enemy", &ids(&["goblin"])).unwrap());
        assert_eq!(f.factory.metrics().total, 0);

        f.factory.retain_prefabs(|_| true);
        assert!(f.factory.contains_prototypes("enemy", &[]).is_ok());
        f.factory.retain_prefabs(|_| false);
        assert!(matches!(
            f.factory.contains_prototypes("enemy", &[]),
            Err(SceneError::UnknownPrefab { .. })
        ));
    }

    #[test]
    fn test_metrics_follow_mutations() {
        let mut f = fixture(ENEMIES);
        f.create(&["goblin", "orc"]).unwrap();
        assert_eq!(f.factory.metrics().total, 2);
        assert_eq!(f.factory.metrics().per_prefab["enemy"], 2);
        assert!(!f.factory.is_dirty());

        f.factory
            .delete_prototypes("enemy", &ids(&["orc"]), &mut f.registry)
            .unwrap();
        assert!(f.factory.is_dirty());
        assert_eq!(f.factory.metrics().total, 1);
        assert_eq!(f.factory.total_alive(), 1);
    }
}
