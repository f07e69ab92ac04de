// component.rs - Name-keyed registry of type-erased component operations
//
// Generic code (prefab instantiation, cloning, inspection) never names a
// concrete component type. Each type registers once at start-up and is then
// reached through its hashed name or its TypeId.

use crate::ecs::value::{is_vector, FieldError, FieldValue, Reflect, PRIMARY_FIELD};
use crate::hash::NameHash;
use hecs::{Component, Entity, EntityBuilder, World};
use keel_asset::{AssetError, AssetRegistry};
use serde_json::Value;
use std::any::{type_name, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::marker::PhantomData;
use thiserror::Error;

/// Context handed to `on_added` hooks.
pub struct HookContext<'a> {
    pub entity: Entity,
    pub assets: &'a AssetRegistry,
}

/// Context handed to `on_cloned` hooks. The hook's component is the copy on
/// `destination`.
pub struct CloneContext<'a> {
    pub source: Entity,
    pub destination: Entity,
    pub assets: &'a AssetRegistry,
}

/// Failure inside a component hook.
#[derive(Debug, Error)]
pub enum HookError {
    #[error(transparent)]
    Asset(#[from] AssetError),

    #[error(transparent)]
    Field(#[from] FieldError),

    #[error("component borrow failed: {0}")]
    Ecs(#[from] hecs::ComponentError),

    #[error("{0}")]
    Message(String),
}

/// Errors raised by the component registry.
#[derive(Debug, Error)]
pub enum ComponentError {
    #[error("component '{name}' is not registered")]
    Unknown { name: String },

    #[error("component type {type_name} is not registered")]
    UnregisteredType { type_name: String },

    #[error("component '{name}' is already registered")]
    Duplicate { name: String },

    #[error("entity {entity:?} already has component '{component}'")]
    AlreadyPresent { component: String, entity: Entity },

    #[error("entity {entity:?} has no component '{component}'")]
    Missing { component: String, entity: Entity },

    #[error("entity {entity:?} does not exist")]
    NoSuchEntity { entity: Entity },

    #[error("marker component '{component}' takes no data")]
    MarkerWithData { component: String },

    #[error("component '{component}' cannot be assigned from prefab data")]
    NotAssignable { component: String },

    #[error("component '{component}': {source}")]
    Field {
        component: String,
        #[source]
        source: FieldError,
    },

    #[error("component '{component}' hook failed: {source}")]
    Hook {
        component: String,
        #[source]
        source: HookError,
    },
}

/// How a registered type is populated and whether it survives cloning.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ComponentKind {
    /// Fields set from prefab data; cloned.
    Data,
    /// Zero-field tag; cloned.
    Marker,
    /// Per-entity identity; attached directly and never cloned.
    Identity,
}

type AssignFn = fn(&mut World, Entity, &str, Option<&Value>) -> Result<(), ComponentError>;
type CloneFn = fn(&World, Entity, &mut EntityBuilder) -> bool;
type AddedHook = Box<dyn Fn(&World, &HookContext<'_>) -> Result<(), HookError>>;
type ClonedHook = Box<dyn Fn(&World, &CloneContext<'_>) -> Result<(), HookError>>;
type PrintFn = Box<dyn Fn(&World, Entity) -> Option<String>>;
type MapFn = Box<dyn Fn(&World, Entity) -> Option<BTreeMap<String, String>>>;

/// The erased operations for one component type.
pub struct ComponentEntry {
    name: String,
    hash: NameHash,
    type_id: TypeId,
    type_name: &'static str,
    kind: ComponentKind,
    assign: AssignFn,
    has: fn(&World, Entity) -> bool,
    clone_into: Option<CloneFn>,
    on_added: Option<AddedHook>,
    on_cloned: Option<ClonedHook>,
    print: Option<PrintFn>,
    to_map: Option<MapFn>,
}

impl ComponentEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hash(&self) -> NameHash {
        self.hash
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    pub fn has_on_added(&self) -> bool {
        self.on_added.is_some()
    }

    pub fn has_on_cloned(&self) -> bool {
        self.on_cloned.is_some()
    }

    /// Whether `entity` carries this component.
    pub fn is_on(&self, world: &World, entity: Entity) -> bool {
        (self.has)(world, entity)
    }

    fn run_added(&self, world: &World, ctx: &HookContext<'_>) -> Result<(), ComponentError> {
        match &self.on_added {
            Some(hook) => hook(world, ctx).map_err(|source| self.hook_error(source)),
            None => Ok(()),
        }
    }

    fn run_cloned(&self, world: &World, ctx: &CloneContext<'_>) -> Result<(), ComponentError> {
        match &self.on_cloned {
            Some(hook) => hook(world, ctx).map_err(|source| self.hook_error(source)),
            None => Ok(()),
        }
    }

    fn hook_error(&self, source: HookError) -> ComponentError {
        ComponentError::Hook {
            component: self.name.clone(),
            source,
        }
    }

    /// Debug text for the component on `entity`, if it has one and a printer is set.
    pub fn print(&self, world: &World, entity: Entity) -> Option<String> {
        self.print.as_ref().and_then(|print| print(world, entity))
    }

    pub fn to_map(&self, world: &World, entity: Entity) -> Option<BTreeMap<String, String>> {
        self.to_map.as_ref().and_then(|to_map| to_map(world, entity))
    }
}

/// Registry of every component type the engine can build from data.
#[derive(Default)]
pub struct ComponentRegistry {
    entries: HashMap<NameHash, ComponentEntry>,
    by_type: HashMap<TypeId, NameHash>,
}

impl ComponentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start registering a data component whose fields come from prefab data.
    pub fn component<T>(&mut self, name: &str) -> ComponentBuilder<'_, T>
    where
        T: Component + Reflect + Default + Clone,
    {
        ComponentBuilder::new(self, name, ComponentKind::Data, assign_data::<T>, Some(clone_into::<T>))
    }

    /// Start registering a zero-field marker (ctag).
    pub fn marker<T>(&mut self, name: &str) -> ComponentBuilder<'_, T>
    where
        T: Component + Default + Clone,
    {
        ComponentBuilder::new(self, name, ComponentKind::Marker, assign_marker::<T>, Some(clone_into::<T>))
    }

    /// Start registering an identity component. These are attached directly
    /// by the scene code and skipped when cloning.
    pub fn identity<T: Component>(&mut self, name: &str) -> ComponentBuilder<'_, T> {
        ComponentBuilder::new(
            self,
            name,
            ComponentKind::Identity,
            |_, _, component, _| {
                Err(ComponentError::NotAssignable {
                    component: component.to_string(),
                })
            },
            None,
        )
    }

    pub fn entry(&self, name: &str) -> Option<&ComponentEntry> {
        self.entries.get(&NameHash::of(name))
    }

    pub fn entry_by_type(&self, type_id: TypeId) -> Option<&ComponentEntry> {
        self.by_type.get(&type_id).and_then(|hash| self.entries.get(hash))
    }

    fn require(&self, name: &str) -> Result<&ComponentEntry, ComponentError> {
        self.entry(name).ok_or_else(|| ComponentError::Unknown {
            name: name.to_string(),
        })
    }

    fn require_type(&self, type_id: TypeId, type_name: &str) -> Result<&ComponentEntry, ComponentError> {
        self.entry_by_type(type_id)
            .ok_or_else(|| ComponentError::UnregisteredType {
                type_name: type_name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(&NameHash::of(name))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.values().map(ComponentEntry::name).collect();
        names.sort_unstable();
        names
    }

    /// Attach component `name` to `entity` without running hooks.
    ///
    /// `None` builds the default value, a record sets each field, and any
    /// other shape sets the primary field. Fails if the entity already has
    /// the component.
    pub fn assign(
        &self,
        world: &mut World,
        entity: Entity,
        name: &str,
        data: Option<&Value>,
    ) -> Result<TypeId, ComponentError> {
        let entry = self.require(name)?;
        (entry.assign)(world, entity, &entry.name, data)?;
        Ok(entry.type_id)
    }

    /// `assign`, then the `on_added` hook exactly once.
    pub fn emplace(
        &self,
        world: &mut World,
        entity: Entity,
        name: &str,
        data: Option<&Value>,
        assets: &AssetRegistry,
    ) -> Result<(), ComponentError> {
        let entry = self.require(name)?;
        (entry.assign)(world, entity, &entry.name, data)?;
        entry.run_added(world, &HookContext { entity, assets })?;
        if let Some(text) = entry.print(world, entity) {
            tracing::debug!(component = %entry.name, ?entity, "{text}");
        }
        Ok(())
    }

    /// Run the `on_added` hook registered for `type_id`.
    pub fn invoke_added(
        &self,
        type_id: TypeId,
        type_name: &str,
        world: &World,
        ctx: &HookContext<'_>,
    ) -> Result<(), ComponentError> {
        self.require_type(type_id, type_name)?.run_added(world, ctx)
    }

    /// Run the `on_cloned` hook registered for `type_id`.
    pub fn invoke_cloned(
        &self,
        type_id: TypeId,
        type_name: &str,
        world: &World,
        ctx: &CloneContext<'_>,
    ) -> Result<(), ComponentError> {
        self.require_type(type_id, type_name)?.run_cloned(world, ctx)
    }

    /// Copy every cloneable component of `source` into `builder`.
    ///
    /// Returns the copied types so the caller can run `on_cloned` once the
    /// destination exists. Any unregistered type on `source` is an error,
    /// since it could not be copied faithfully.
    pub fn clone_components(
        &self,
        world: &World,
        source: Entity,
        builder: &mut EntityBuilder,
    ) -> Result<Vec<TypeId>, ComponentError> {
        let types: Vec<TypeId> = world
            .entity(source)
            .map_err(|_| ComponentError::NoSuchEntity { entity: source })?
            .component_types()
            .collect();

        let mut copied = Vec::with_capacity(types.len());
        for type_id in types {
            let entry = self.require_type(type_id, &format!("{type_id:?}"))?;
            let Some(clone_into) = entry.clone_into else {
                continue;
            };
            if clone_into(world, source, builder) {
                copied.push(type_id);
            }
        }
        Ok(copied)
    }

    /// Run `on_cloned` for each copied type, in copy order.
    pub fn run_cloned_hooks(
        &self,
        world: &World,
        copied: &[TypeId],
        ctx: &CloneContext<'_>,
    ) -> Result<(), ComponentError> {
        for type_id in copied {
            self.require_type(*type_id, &format!("{type_id:?}"))?
                .run_cloned(world, ctx)?;
        }
        Ok(())
    }

    /// `(name, to_map)` for every registered component on `entity`, sorted by name.
    pub fn describe(&self, world: &World, entity: Entity) -> Vec<(String, BTreeMap<String, String>)> {
        let Ok(entity_ref) = world.entity(entity) else {
            return Vec::new();
        };
        let mut described: Vec<_> = entity_ref
            .component_types()
            .filter_map(|type_id| self.entry_by_type(type_id))
            .map(|entry| {
                (
                    entry.name.clone(),
                    entry.to_map(world, entity).unwrap_or_default(),
                )
            })
            .collect();
        described.sort_by(|a, b| a.0.cmp(&b.0));
        described
    }
}

/// Builder returned by the registration methods.
#[must_use = "call .register() to finish"]
pub struct ComponentBuilder<'a, T> {
    registry: &'a mut ComponentRegistry,
    entry: ComponentEntry,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Component> ComponentBuilder<'a, T> {
    fn new(
        registry: &'a mut ComponentRegistry,
        name: &str,
        kind: ComponentKind,
        assign: AssignFn,
        clone_into: Option<CloneFn>,
    ) -> Self {
        Self {
            registry,
            entry: ComponentEntry {
                name: name.to_string(),
                hash: NameHash::of(name),
                type_id: TypeId::of::<T>(),
                type_name: type_name::<T>(),
                kind,
                assign,
                has: |world, entity| world.entity(entity).is_ok_and(|e| e.has::<T>()),
                clone_into,
                on_added: None,
                on_cloned: None,
                print: None,
                to_map: None,
            },
            _marker: PhantomData,
        }
    }

    /// Run once after all fields are set.
    pub fn on_added(mut self, hook: fn(&mut T, &HookContext<'_>) -> Result<(), HookError>) -> Self {
        self.entry.on_added = Some(Box::new(move |world: &World, ctx: &HookContext<'_>| {
            let mut component = world.get::<&mut T>(ctx.entity)?;
            hook(&mut *component, ctx)
        }));
        self
    }

    /// Run once on the destination's copy after cloning.
    pub fn on_cloned(mut self, hook: fn(&mut T, &CloneContext<'_>) -> Result<(), HookError>) -> Self {
        self.entry.on_cloned = Some(Box::new(move |world: &World, ctx: &CloneContext<'_>| {
            let mut component = world.get::<&mut T>(ctx.destination)?;
            hook(&mut *component, ctx)
        }));
        self
    }

    pub fn print(mut self, print: fn(&T) -> String) -> Self {
        self.entry.print = Some(Box::new(move |world: &World, entity: Entity| {
            world.get::<&T>(entity).ok().map(|component| print(&component))
        }));
        self
    }

    pub fn to_map(mut self, to_map: fn(&T) -> BTreeMap<String, String>) -> Self {
        self.entry.to_map = Some(Box::new(move |world: &World, entity: Entity| {
            world.get::<&T>(entity).ok().map(|component| to_map(&component))
        }));
        self
    }

    /// Finish registration. Names and types may each be registered once.
    pub fn register(self) -> Result<NameHash, ComponentError> {
        let Self { registry, entry, .. } = self;
        if registry.entries.contains_key(&entry.hash) || registry.by_type.contains_key(&entry.type_id) {
            return Err(ComponentError::Duplicate { name: entry.name });
        }
        let hash = entry.hash;
        tracing::trace!(component = %entry.name, %hash, kind = ?entry.kind, "component registered");
        registry.by_type.insert(entry.type_id, hash);
        registry.entries.insert(hash, entry);
        Ok(hash)
    }
}

fn insert_new<T: Component>(
    world: &mut World,
    entity: Entity,
    name: &str,
    component: T,
) -> Result<(), ComponentError> {
    world
        .insert_one(entity, component)
        .map_err(|_| ComponentError::NoSuchEntity { entity })?;
    tracing::trace!(component = name, ?entity, "component assigned");
    Ok(())
}

fn ensure_absent<T: Component>(world: &World, entity: Entity, name: &str) -> Result<(), ComponentError> {
    let present = world
        .entity(entity)
        .map_err(|_| ComponentError::NoSuchEntity { entity })?
        .has::<T>();
    if present {
        return Err(ComponentError::AlreadyPresent {
            component: name.to_string(),
            entity,
        });
    }
    Ok(())
}

fn assign_data<T: Component + Reflect + Default>(
    world: &mut World,
    entity: Entity,
    name: &str,
    data: Option<&Value>,
) -> Result<(), ComponentError> {
    ensure_absent::<T>(world, entity, name)?;
    let field_error = |source: FieldError| ComponentError::Field {
        component: name.to_string(),
        source,
    };

    let mut component = T::default();
    match data {
        None | Some(Value::Null) => {}
        Some(Value::Object(fields)) if !is_vector(fields) => {
            for (field, raw) in fields {
                let value = FieldValue::from_json(field, raw).map_err(field_error)?;
                component.set_field(field, value).map_err(field_error)?;
            }
        }
        Some(raw) => {
            let value = FieldValue::from_json(PRIMARY_FIELD, raw).map_err(field_error)?;
            component.set_field(PRIMARY_FIELD, value).map_err(field_error)?;
        }
    }
    insert_new(world, entity, name, component)
}

fn assign_marker<T: Component + Default>(
    world: &mut World,
    entity: Entity,
    name: &str,
    data: Option<&Value>,
) -> Result<(), ComponentError> {
    let empty = match data {
        None | Some(Value::Null) => true,
        Some(Value::Object(fields)) => fields.is_empty(),
        Some(_) => false,
    };
    if !empty {
        return Err(ComponentError::MarkerWithData {
            component: name.to_string(),
        });
    }
    ensure_absent::<T>(world, entity, name)?;
    insert_new(world, entity, name, T::default())
}

fn clone_into<T: Component + Clone>(world: &World, source: Entity, builder: &mut EntityBuilder) -> bool {
    match world.get::<&T>(source) {
        Ok(component) => {
            builder.add(T::clone(&component));
            true
        }
        Err(_) => false,
    }
}
