// registry.rs - hecs world with lifetime counters
//
// hecs already tracks what is alive. The scene metrics also want how many
// entities were ever spawned, so every spawn goes through here.

use hecs::{Component, Entity, EntityBuilder, NoSuchEntity, Query, Ref, RefMut, World};

/// The single shared ECS registry.
#[derive(Default)]
pub struct EntityRegistry {
    world: World,
    created: u64,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn an entity with no components.
    pub fn spawn(&mut self) -> Entity {
        self.created += 1;
        self.world.spawn(())
    }

    /// Spawn an entity from a prepared builder.
    pub fn spawn_built(&mut self, builder: &mut EntityBuilder) -> Entity {
        self.created += 1;
        self.world.spawn(builder.build())
    }

    pub fn despawn(&mut self, entity: Entity) -> Result<(), NoSuchEntity> {
        self.world.despawn(entity)
    }

    /// Despawn everything. Components are dropped, so `Drop` teardown runs.
    ///
    /// Entities are despawned one by one rather than through `World::clear`,
    /// which would reset generations and hand old handles out again.
    pub fn clear(&mut self) {
        for entity in self.entities() {
            // Ignored: `entities` just listed it as alive.
            let _ = self.world.despawn(entity);
        }
    }

    /// Every live entity.
    pub fn entities(&self) -> Vec<Entity> {
        self.world.iter().map(|entity| entity.entity()).collect()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    /// Entities currently alive.
    pub fn alive(&self) -> u64 {
        u64::from(self.world.len())
    }

    /// Entities ever spawned.
    pub fn created(&self) -> u64 {
        self.created
    }

    /// Entities spawned and since destroyed.
    pub fn released(&self) -> u64 {
        self.created - self.alive()
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Whether `entity` is alive and has a `T`.
    pub fn has<T: Component>(&self, entity: Entity) -> bool {
        self.world
            .entity(entity)
            .map(|entity| entity.has::<T>())
            .unwrap_or(false)
    }

    pub fn insert_one<T: Component>(&mut self, entity: Entity, component: T) -> Result<(), NoSuchEntity> {
        self.world.insert_one(entity, component)
    }

    pub fn get<T: Component>(&self, entity: Entity) -> Option<Ref<'_, T>> {
        self.world.get::<&T>(entity).ok()
    }

    pub fn get_mut<T: Component>(&self, entity: Entity) -> Option<RefMut<'_, T>> {
        self.world.get::<&mut T>(entity).ok()
    }

    /// Entities matching `Q`, collected so the world can be mutated afterwards.
    pub fn entities_with<Q: Query>(&self) -> Vec<Entity> {
        self.world
            .query::<Q>()
            .iter()
            .map(|(entity, _)| entity)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Hp(u32);

    #[test]
    fn test_counts_created_alive_released() {
        let mut registry = EntityRegistry::new();
        let a = registry.spawn();
        let b = registry.spawn();
        registry.insert_one(b, Hp(3)).unwrap();
        assert_eq!(registry.created(), 2);
        assert_eq!(registry.alive(), 2);

        registry.despawn(a).unwrap();
        assert!(!registry.contains(a));
        assert_eq!(registry.released(), 1);
        assert_eq!(*registry.get::<Hp>(b).unwrap(), Hp(3));
    }

    #[test]
    fn test_clear_keeps_created_count() {
        let mut registry = EntityRegistry::new();
        let mut builder = EntityBuilder::new();
        builder.add(Hp(1));
        let e = registry.spawn_built(&mut builder);
        assert!(registry.has::<Hp>(e));
        assert_eq!(registry.entities_with::<&Hp>(), vec![e]);

        registry.clear();
        assert_eq!(registry.alive(), 0);
        assert_eq!(registry.created(), 1);
        assert_eq!(registry.released(), 1);
        assert!(!registry.has::<Hp>(e));
    }

    #[test]
    fn test_clear_never_reuses_handles() {
        let mut registry = EntityRegistry::new();
        let old: Vec<Entity> = (0..3).map(|_| registry.spawn()).collect();
        assert_eq!(registry.entities().len(), 3);

        registry.clear();
        let new: Vec<Entity> = (0..3).map(|_| registry.spawn()).collect();
        for entity in &old {
            assert!(!registry.contains(*entity));
            assert!(!new.contains(entity));
        }
        assert_eq!(registry.alive(), 3);
        assert_eq!(registry.released(), 3);
    }

    #[test]
    fn test_get_mut_writes_through() {
        let mut registry = EntityRegistry::new();
        let e = registry.spawn();
        registry.insert_one(e, Hp(1)).unwrap();
        registry.get_mut::<Hp>(e).unwrap().0 = 9;
        assert_eq!(registry.get::<Hp>(e).unwrap().0, 9);
    }
}
