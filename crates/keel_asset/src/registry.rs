// registry.rs - Type-keyed asset storage
//
// Every asset type gets its own id -> handle table. Handles are shared;
// reload swaps the value behind an existing handle instead of replacing it.

use crate::{AssetError, AssetHandle};
use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};

/// A loadable asset type.
pub trait Asset: Send + Sync + Sized + 'static {
    /// Construction arguments (path, descriptor, ...).
    type Args;

    /// Human-readable kind used in errors and metrics.
    const KIND: &'static str;

    fn load(id: &str, args: Self::Args) -> Result<Self, AssetError>;
}

/// Snapshot of registry contents.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AssetMetrics {
    pub per_kind: BTreeMap<&'static str, usize>,
    pub total: usize,
    pub loads: u64,
    pub reloads: u64,
}

struct Store {
    kind: &'static str,
    entries: BTreeMap<String, Box<dyn Any + Send + Sync>>,
}

/// Registry of loaded assets keyed by type and id.
#[derive(Default)]
pub struct AssetRegistry {
    stores: HashMap<TypeId, Store>,
    loads: u64,
    reloads: u64,
    dirty: bool,
    metrics: AssetMetrics,
}

impl AssetRegistry {
    pub fn new() -> Self {
        Self {
            dirty: true,
            ..Self::default()
        }
    }

    /// Load an asset under `id`. Fails if `id` is already present for `T`.
    pub fn load<T: Asset>(&mut self, id: &str, args: T::Args) -> Result<AssetHandle<T>, AssetError> {
        if self.contains::<T>(id) {
            return Err(AssetError::AlreadyLoaded {
                kind: T::KIND,
                id: id.to_string(),
            });
        }
        let value = T::load(id, args)?;
        tracing::debug!(kind = T::KIND, id, "asset loaded");
        self.loads += 1;
        self.insert(id, value)
    }

    /// Store an already-constructed value under `id`. Same uniqueness rule as `load`.
    pub fn insert<T: Asset>(&mut self, id: &str, value: T) -> Result<AssetHandle<T>, AssetError> {
        let store = self.stores.entry(TypeId::of::<T>()).or_insert_with(|| Store {
            kind: T::KIND,
            entries: BTreeMap::new(),
        });
        if store.entries.contains_key(id) {
            return Err(AssetError::AlreadyLoaded {
                kind: T::KIND,
                id: id.to_string(),
            });
        }
        let handle = AssetHandle::new(value);
        store.entries.insert(id.to_string(), Box::new(handle.clone()));
        self.dirty = true;
        Ok(handle)
    }

    /// Fetch a shared handle. Fails if `id` was never loaded for `T`.
    pub fn get<T: Asset>(&self, id: &str) -> Result<AssetHandle<T>, AssetError> {
        self.stores
            .get(&TypeId::of::<T>())
            .and_then(|store| store.entries.get(id))
            .and_then(|entry| entry.downcast_ref::<AssetHandle<T>>())
            .cloned()
            .ok_or_else(|| AssetError::NotFound {
                kind: T::KIND,
                id: id.to_string(),
            })
    }

    /// Re-run the loader and swap the result into the existing handle.
    pub fn reload<T: Asset>(&mut self, id: &str, args: T::Args) -> Result<AssetHandle<T>, AssetError> {
        let handle = self.get::<T>(id)?;
        let value = T::load(id, args)?;
        handle.replace(value);
        tracing::debug!(kind = T::KIND, id, "asset reloaded");
        self.reloads += 1;
        self.dirty = true;
        Ok(handle)
    }

    pub fn contains<T: Asset>(&self, id: &str) -> bool {
        self.stores
            .get(&TypeId::of::<T>())
            .is_some_and(|store| store.entries.contains_key(id))
    }

    /// Drop the registry's handle. Outstanding handles keep the value alive.
    pub fn remove<T: Asset>(&mut self, id: &str) -> Option<AssetHandle<T>> {
        let entry = self.stores.get_mut(&TypeId::of::<T>())?.entries.remove(id)?;
        self.dirty = true;
        entry.downcast::<AssetHandle<T>>().ok().map(|handle| *handle)
    }

    /// Ids loaded for `T`, sorted.
    pub fn ids<T: Asset>(&self) -> Vec<String> {
        self.stores
            .get(&TypeId::of::<T>())
            .map(|store| store.entries.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.stores.clear();
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Per-kind counts, recomputed only after a mutation.
    pub fn metrics(&mut self) -> &AssetMetrics {
        if self.dirty {
            let mut per_kind = BTreeMap::new();
            for store in self.stores.values() {
                *per_kind.entry(store.kind).or_insert(0) += store.entries.len();
            }
            self.metrics = AssetMetrics {
                total: per_kind.values().sum(),
                per_kind,
                loads: self.loads,
                reloads: self.reloads,
            };
            self.dirty = false;
        }
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Note(String);

    impl Asset for Note {
        type Args = &'static str;
        const KIND: &'static str = "note";

        fn load(id: &str, args: Self::Args) -> Result<Self, AssetError> {
            if args.is_empty() {
                return Err(AssetError::Invalid {
                    kind: Self::KIND,
                    id: id.to_string(),
                    reason: "empty".into(),
                });
            }
            Ok(Note(args.to_string()))
        }
    }

    #[test]
    fn test_load_then_get() {
        let mut assets = AssetRegistry::new();
        assets.load::<Note>("a", "hello").unwrap();
        assert!(assets.contains::<Note>("a"));
        assert_eq!(assets.get::<Note>("a").unwrap().read().0, "hello");
    }

    #[test]
    fn test_duplicate_load_fails() {
        let mut assets = AssetRegistry::new();
        assets.load::<Note>("a", "hello").unwrap();
        let err = assets.load::<Note>("a", "again").unwrap_err();
        assert!(matches!(err, AssetError::AlreadyLoaded { kind: "note", .. }));
        assert_eq!(assets.get::<Note>("a").unwrap().read().0, "hello");
    }

    #[test]
    fn test_missing_asset_fails() {
        let mut assets = AssetRegistry::new();
        assert!(matches!(
            assets.get::<Note>("nope"),
            Err(AssetError::NotFound { .. })
        ));
        assert!(matches!(
            assets.reload::<Note>("nope", "x"),
            Err(AssetError::NotFound { .. })
        ));
    }

    #[test]
    fn test_reload_is_visible_through_old_handles() {
        let mut assets = AssetRegistry::new();
        let held = assets.load::<Note>("a", "v1").unwrap();
        let reloaded = assets.reload::<Note>("a", "v2").unwrap();
        assert!(held.ptr_eq(&reloaded));
        assert_eq!(held.read().0, "v2");
    }

    #[test]
    fn test_failed_reload_keeps_value() {
        let mut assets = AssetRegistry::new();
        let held = assets.load::<Note>("a", "v1").unwrap();
        assert!(assets.reload::<Note>("a", "").is_err());
        assert_eq!(held.read().0, "v1");
    }

    #[test]
    fn test_metrics_recompute_after_mutation() {
        let mut assets = AssetRegistry::new();
        assets.load::<Note>("a", "1").unwrap();
        assets.load::<Note>("b", "2").unwrap();
        assert_eq!(assets.metrics().total, 2);
        assert_eq!(assets.metrics().per_kind.get("note"), Some(&2));
        assert!(!assets.is_dirty());

        assets.remove::<Note>("a");
        assert!(assets.is_dirty());
        let metrics = assets.metrics();
        assert_eq!(metrics.total, 1);
        assert_eq!(metrics.loads, 2);
        assert_eq!(assets.ids::<Note>(), vec!["b".to_string()]);
    }
}
