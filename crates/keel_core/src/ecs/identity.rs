//! Identity components.
//!
//! Every runtime instance carries its own identity; none of these are ever
//! copied when an entity is cloned.

use crate::ecs::{ComponentError, ComponentRegistry};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

/// Stable identity of a runtime instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CUuid(pub Uuid);

impl CUuid {
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

/// Display name, unique among live named instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CName(pub String);

impl CName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification tag. Instances default to their prototype's id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CTag(pub String);

impl CTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Soft-delete marker; the entity is despawned by the next sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CDeleted;

/// Register `uuid`, `name`, `tag` and `deleted`.
pub fn register_identity_components(components: &mut ComponentRegistry) -> Result<(), ComponentError> {
    components
        .identity::<CUuid>("uuid")
        .print(|uuid| uuid.0.to_string())
        .to_map(|uuid| BTreeMap::from([("uuid".to_string(), uuid.0.to_string())]))
        .register()?;
    components
        .identity::<CName>("name")
        .print(|name| name.0.clone())
        .to_map(|name| BTreeMap::from([("name".to_string(), name.0.clone())]))
        .register()?;
    components
        .identity::<CTag>("tag")
        .to_map(|tag| BTreeMap::from([("tag".to_string(), tag.0.clone())]))
        .register()?;
    components.identity::<CDeleted>("deleted").register()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::ComponentKind;

    #[test]
    fn test_identity_components_are_never_cloned() {
        let mut components = ComponentRegistry::new();
        register_identity_components(&mut components).unwrap();
        for name in ["uuid", "name", "tag", "deleted"] {
            assert_eq!(components.entry(name).unwrap().kind(), ComponentKind::Identity);
        }

        let mut world = hecs::World::new();
        let source = world.spawn((CUuid::new_v4(), CName::new("a"), CTag::new("b"), CDeleted));
        let mut builder = hecs::EntityBuilder::new();
        let copied = components
            .clone_components(&world, source, &mut builder)
            .unwrap();
        assert!(copied.is_empty());
    }

    #[test]
    fn test_uuids_are_distinct() {
        assert_ne!(CUuid::new_v4(), CUuid::new_v4());
        assert_eq!(CName::new("x").to_string(), "x");
    }
}
