// systems.rs - Built-in gameplay systems for the headless runtime

use keel_core::ecs::{CDeleted, CUuid, Entity, EntityRegistry, System, SystemError};
use keel_core::glam::Quat;
use keel_scene::components::{Health, Static, Transform};
use std::time::Duration;

/// Rotates every non-static instance transform about +Y. Prototypes carry
/// no `CUuid` and are left as authored.
pub struct SpinSystem {
    pub radians_per_second: f32,
}

impl System for SpinSystem {
    fn priority(&self) -> i32 {
        10
    }

    fn update(&mut self, registry: &mut EntityRegistry, ts: Duration) -> Result<(), SystemError> {
        let step = Quat::from_rotation_y(self.radians_per_second * ts.as_secs_f32());
        for (_, transform) in registry
            .world_mut()
            .query_mut::<&mut Transform>()
            .with::<&CUuid>()
            .without::<&Static>()
        {
            transform.rotation = (step * transform.rotation).normalize();
            transform.update_model();
        }
        Ok(())
    }
}

/// Drains `current` health of instances over time and soft-deletes those
/// that reach zero. The sweep after the systems removes them.
pub struct DecaySystem {
    pub per_second: f32,
}

impl System for DecaySystem {
    fn priority(&self) -> i32 {
        20
    }

    fn update(&mut self, registry: &mut EntityRegistry, ts: Duration) -> Result<(), SystemError> {
        let amount = self.per_second * ts.as_secs_f32();
        let mut dead: Vec<Entity> = Vec::new();
        for (entity, health) in registry
            .world_mut()
            .query_mut::<&mut Health>()
            .with::<&CUuid>()
            .without::<&CDeleted>()
        {
            health.current = (health.current - amount).max(0.0);
            if health.current == 0.0 {
                dead.push(entity);
            }
        }
        for entity in dead {
            registry
                .insert_one(entity, CDeleted)
                .map_err(|_| SystemError::Message(format!("entity {entity:?} vanished mid-update")))?;
            tracing::debug!(?entity, "health depleted");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(registry: &mut EntityRegistry) -> Entity {
        let entity = registry.spawn();
        registry.insert_one(entity, CUuid::new_v4()).unwrap();
        entity
    }

    #[test]
    fn test_spin_skips_static_and_prototypes() {
        let mut registry = EntityRegistry::new();
        let moving = instance(&mut registry);
        registry.insert_one(moving, Transform::default()).unwrap();
        let fixed = instance(&mut registry);
        registry.insert_one(fixed, Transform::default()).unwrap();
        registry.insert_one(fixed, Static).unwrap();
        let prototype = registry.spawn();
        registry.insert_one(prototype, Transform::default()).unwrap();

        let mut spin = SpinSystem {
            radians_per_second: std::f32::consts::PI,
        };
        spin.update(&mut registry, Duration::from_millis(500)).unwrap();

        assert_ne!(registry.get::<Transform>(moving).unwrap().rotation, Quat::IDENTITY);
        assert_eq!(registry.get::<Transform>(fixed).unwrap().rotation, Quat::IDENTITY);
        assert_eq!(registry.get::<Transform>(prototype).unwrap().rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_decay_marks_depleted_entities() {
        let mut registry = EntityRegistry::new();
        let weak = instance(&mut registry);
        registry.insert_one(weak, Health { base: 1.0, current: 1.0 }).unwrap();
        let prototype = registry.spawn();
        registry.insert_one(prototype, Health { base: 1.0, current: 1.0 }).unwrap();
        let strong = instance(&mut registry);
        registry.insert_one(strong, Health { base: 10.0, current: 10.0 }).unwrap();

        let mut decay = DecaySystem { per_second: 2.0 };
        decay.update(&mut registry, Duration::from_secs(1)).unwrap();

        assert!(registry.has::<CDeleted>(weak));
        assert!(!registry.has::<CDeleted>(strong));
        assert!(!registry.has::<CDeleted>(prototype));
        assert_eq!(registry.get::<Health>(strong).unwrap().current, 8.0);
    }
}
