// prefab.rs - Prefab files and inheritance resolution
//
// One file declares many prototypes. Each targeted prototype is flattened
// once at load time: ancestors first, in `inherits` order, then its own
// data on top. Instantiation never walks the inheritance graph again.

use keel_asset::{Asset, AssetError};
use once_cell::sync::OnceCell;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Written in scene files to target every prototype of a prefab.
pub const ALL_PROTOTYPES: &str = "*";

/// Which prototypes of a prefab file to resolve.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PrototypeSelection {
    All,
    Only(Vec<String>),
}

impl PrototypeSelection {
    /// `["*"]` (or any list containing `"*"`) selects everything.
    pub fn from_ids(ids: &[String]) -> Self {
        if ids.iter().any(|id| id == ALL_PROTOTYPES) {
            Self::All
        } else {
            Self::Only(ids.to_vec())
        }
    }
}

#[derive(Debug, Error)]
pub enum PrefabError {
    #[error("failed to read prefab {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("prefab {} declares no prototypes", path.display())]
    Empty { path: PathBuf },

    #[error("prefab {} is malformed ({context}): {source}", path.display())]
    Parse {
        path: PathBuf,
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("prototype '{prototype}' inherits unknown prototype '{parent}'")]
    UnknownParent { prototype: String, parent: String },

    #[error("inheritance cycle: {chain}")]
    InheritanceCycle { chain: String },

    #[error("prototype '{prototype}' is not declared")]
    UnknownPrototype { prototype: String },
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPrototype {
    #[serde(default)]
    inherits: Vec<String>,
    #[serde(default)]
    ctags: Vec<String>,
    #[serde(default)]
    components: Map<String, Value>,
}

/// A prototype after inheritance resolution.
#[derive(Clone, Debug, PartialEq)]
pub struct Prototype {
    pub id: String,
    /// Direct parents, as written.
    pub inherits: Vec<String>,
    /// Every ancestor, parents first, without repeats.
    pub chain: Vec<String>,
    /// Marker components, ordered, without repeats or overlap with `components`.
    pub ctags: Vec<String>,
    /// Component name -> merged raw value, in authoring order.
    pub components: Map<String, Value>,
}

/// One parsed prefab file.
#[derive(Debug)]
pub struct PrefabDefinition {
    path: PathBuf,
    order: Vec<String>,
    prototypes: HashMap<String, Prototype>,
    info: OnceCell<BTreeMap<String, BTreeMap<String, String>>>,
}

impl PrefabDefinition {
    /// Read and resolve the file at `path`.
    pub fn from_file(path: &Path, selection: &PrototypeSelection) -> Result<Self, PrefabError> {
        let text = std::fs::read_to_string(path).map_err(|source| PrefabError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &text, selection)
    }

    /// Resolve prefab text; `path` is only used for diagnostics.
    pub fn parse(path: &Path, text: &str, selection: &PrototypeSelection) -> Result<Self, PrefabError> {
        if text.trim().is_empty() {
            return Err(PrefabError::Empty {
                path: path.to_path_buf(),
            });
        }
        let parse_error = |context: String, source| PrefabError::Parse {
            path: path.to_path_buf(),
            context,
            source,
        };

        let document: Map<String, Value> =
            serde_json::from_str(text).map_err(|e| parse_error("document".into(), e))?;
        if document.is_empty() {
            return Err(PrefabError::Empty {
                path: path.to_path_buf(),
            });
        }

        let mut declared = Vec::with_capacity(document.len());
        let mut raw = HashMap::with_capacity(document.len());
        for (name, value) in document {
            let prototype: RawPrototype = serde_json::from_value(value)
                .map_err(|e| parse_error(format!("prototype '{name}'"), e))?;
            declared.push(name.clone());
            raw.insert(name, prototype);
        }

        let order = match selection {
            PrototypeSelection::All => declared,
            PrototypeSelection::Only(ids) => {
                let mut order: Vec<String> = Vec::with_capacity(ids.len());
                for id in ids {
                    if !raw.contains_key(id) {
                        return Err(PrefabError::UnknownPrototype {
                            prototype: id.clone(),
                        });
                    }
                    if !order.contains(id) {
                        order.push(id.clone());
                    }
                }
                order
            }
        };

        let mut resolver = Resolver {
            raw: &raw,
            resolved: HashMap::new(),
            stack: Vec::new(),
        };
        let mut prototypes = HashMap::with_capacity(order.len());
        for id in &order {
            prototypes.insert(id.clone(), resolver.resolve(id)?);
        }

        tracing::debug!(
            prefab = %path.display(),
            prototypes = order.len(),
            "prefab resolved"
        );
        Ok(Self {
            path: path.to_path_buf(),
            order,
            prototypes,
            info: OnceCell::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved prototype ids, in selection order.
    pub fn prototype_ids(&self) -> &[String] {
        &self.order
    }

    pub fn contains(&self, id: &str) -> bool {
        self.prototypes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn prototype(&self, id: &str) -> Result<&Prototype, PrefabError> {
        self.prototypes
            .get(id)
            .ok_or_else(|| PrefabError::UnknownPrototype {
                prototype: id.to_string(),
            })
    }

    pub fn inherits(&self, id: &str) -> Result<&[String], PrefabError> {
        Ok(&self.prototype(id)?.inherits)
    }

    pub fn chain(&self, id: &str) -> Result<&[String], PrefabError> {
        Ok(&self.prototype(id)?.chain)
    }

    pub fn ctags(&self, id: &str) -> Result<&[String], PrefabError> {
        Ok(&self.prototype(id)?.ctags)
    }

    pub fn components(&self, id: &str) -> Result<&Map<String, Value>, PrefabError> {
        Ok(&self.prototype(id)?.components)
    }

    /// Human-readable summary per prototype, built on first access.
    pub fn info(&self) -> &BTreeMap<String, BTreeMap<String, String>> {
        self.info.get_or_init(|| {
            self.order
                .iter()
                .filter_map(|id| self.prototypes.get(id))
                .map(|prototype| {
                    let mut fields = BTreeMap::new();
                    fields.insert("inherits".to_string(), prototype.inherits.join(", "));
                    fields.insert("chain".to_string(), prototype.chain.join(" > "));
                    fields.insert("ctags".to_string(), prototype.ctags.join(", "));
                    for (name, value) in &prototype.components {
                        fields.insert(format!("components.{name}"), value.to_string());
                    }
                    (prototype.id.clone(), fields)
                })
                .collect()
        })
    }
}

impl Asset for PrefabDefinition {
    type Args = (PathBuf, PrototypeSelection);
    const KIND: &'static str = "prefab";

    fn load(id: &str, (path, selection): Self::Args) -> Result<Self, AssetError> {
        Self::from_file(&path, &selection).map_err(|source| AssetError::Load {
            kind: Self::KIND,
            id: id.to_string(),
            source: Box::new(source),
        })
    }
}

struct Resolver<'a> {
    raw: &'a HashMap<String, RawPrototype>,
    resolved: HashMap<String, Prototype>,
    stack: Vec<String>,
}

impl Resolver<'_> {
    fn resolve(&mut self, id: &str) -> Result<Prototype, PrefabError> {
        if let Some(done) = self.resolved.get(id) {
            return Ok(done.clone());
        }
        if self.stack.iter().any(|open| open == id) {
            let mut chain = self.stack.clone();
            chain.push(id.to_string());
            return Err(PrefabError::InheritanceCycle {
                chain: chain.join(" -> "),
            });
        }
        let raw_prototypes = self.raw;
        let Some(raw) = raw_prototypes.get(id) else {
            return Err(match self.stack.last() {
                Some(child) => PrefabError::UnknownParent {
                    prototype: child.clone(),
                    parent: id.to_string(),
                },
                None => PrefabError::UnknownPrototype {
                    prototype: id.to_string(),
                },
            });
        };

        self.stack.push(id.to_string());
        let mut chain: Vec<String> = Vec::new();
        let mut ctags: Vec<String> = Vec::new();
        let mut components = Map::new();
        for parent_id in &raw.inherits {
            let parent = self.resolve(parent_id)?;
            for ancestor in parent.chain.iter().chain(std::iter::once(parent_id)) {
                push_unique(&mut chain, ancestor);
            }
            for tag in &parent.ctags {
                push_unique(&mut ctags, tag);
            }
            merge_components(&mut components, &parent.components);
        }
        for tag in &raw.ctags {
            push_unique(&mut ctags, tag);
        }
        merge_components(&mut components, &raw.components);
        ctags.retain(|tag| !components.contains_key(tag));
        self.stack.pop();

        let prototype = Prototype {
            id: id.to_string(),
            inherits: raw.inherits.clone(),
            chain,
            ctags,
            components,
        };
        self.resolved.insert(id.to_string(), prototype.clone());
        Ok(prototype)
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

fn merge_components(into: &mut Map<String, Value>, overlay: &Map<String, Value>) {
    for (name, value) in overlay {
        match into.get_mut(name) {
            Some(existing) => merge_value(existing, value),
            None => {
                into.insert(name.clone(), value.clone());
            }
        }
    }
}

/// Records merge key by key, recursively; anything else is replaced.
fn merge_value(base: &mut Value, overlay: &Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(key) {
                    Some(existing) => merge_value(existing, value),
                    None => {
                        base.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (base, overlay) => *base = overlay.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(doc: Value, selection: PrototypeSelection) -> Result<PrefabDefinition, PrefabError> {
        PrefabDefinition::parse(Path::new("test.json"), &doc.to_string(), &selection)
    }

    #[test]
    fn test_child_wins_then_later_parent_then_earlier_parent() {
        let doc = json!({
            "a": { "components": { "stats": { "only_a": 1, "shared": "a", "ab": "a" } } },
            "b": { "components": { "stats": { "only_b": 2, "shared": "b", "ab": "b" } } },
            "p": {
                "inherits": ["a", "b"],
                "components": { "stats": { "own": 3, "shared": "p" } }
            }
        });
        let prefab = parse(doc, PrototypeSelection::Only(vec!["p".into()])).unwrap();
        let stats = &prefab.components("p").unwrap()["stats"];
        assert_eq!(
            stats,
            &json!({ "only_a": 1, "shared": "p", "ab": "b", "only_b": 2, "own": 3 })
        );
        assert_eq!(prefab.chain("p").unwrap(), ["a", "b"]);
        assert!(!prefab.contains("a"));
    }

    #[test]
    fn test_component_definition_removes_matching_ctag() {
        let doc = json!({
            "base": { "ctags": ["visible", "health"] },
            "orc": {
                "inherits": ["base"],
                "ctags": ["hostile", "visible"],
                "components": { "health": { "base": 30 } }
            }
        });
        let prefab = parse(doc, PrototypeSelection::All).unwrap();
        assert_eq!(prefab.ctags("orc").unwrap(), ["visible", "hostile"]);
        assert!(prefab.components("orc").unwrap().contains_key("health"));
        assert_eq!(prefab.ctags("base").unwrap(), ["visible", "health"]);
    }

    #[test]
    fn test_vectors_are_replaced_not_mixed_when_child_is_scalar() {
        let doc = json!({
            "a": { "components": { "mesh": { "model": "cube" }, "speed": { "x": 1, "y": 2 } } },
            "b": { "inherits": ["a"], "components": { "mesh": "sphere", "speed": { "y": 5 } } }
        });
        let prefab = parse(doc, PrototypeSelection::All).unwrap();
        let components = prefab.components("b").unwrap();
        assert_eq!(components["mesh"], json!("sphere"));
        assert_eq!(components["speed"], json!({ "x": 1, "y": 5 }));
    }

    #[test]
    fn test_deep_chain_is_flattened_once() {
        let doc = json!({
            "root": { "ctags": ["visible"] },
            "mid": { "inherits": ["root"] },
            "left": { "inherits": ["mid"] },
            "right": { "inherits": ["mid"], "ctags": ["static"] },
            "leaf": { "inherits": ["left", "right"] }
        });
        let prefab = parse(doc, PrototypeSelection::Only(vec!["leaf".into()])).unwrap();
        assert_eq!(prefab.chain("leaf").unwrap(), ["root", "mid", "left", "right"]);
        assert_eq!(prefab.ctags("leaf").unwrap(), ["visible", "static"]);
        assert_eq!(prefab.inherits("leaf").unwrap(), ["left", "right"]);
    }

    #[test]
    fn test_selection_order_and_all() {
        let doc = json!({ "z": {}, "a": {}, "m": {} });
        let all = parse(doc.clone(), PrototypeSelection::from_ids(&["*".into()])).unwrap();
        assert_eq!(all.prototype_ids(), ["z", "a", "m"]);

        let some = parse(doc, PrototypeSelection::Only(vec!["m".into(), "z".into(), "m".into()])).unwrap();
        assert_eq!(some.prototype_ids(), ["m", "z"]);
    }

    #[test]
    fn test_errors() {
        assert!(matches!(
            parse(json!({}), PrototypeSelection::All),
            Err(PrefabError::Empty { .. })
        ));
        assert!(matches!(
            PrefabDefinition::parse(Path::new("x"), "  \n", &PrototypeSelection::All),
            Err(PrefabError::Empty { .. })
        ));
        assert!(matches!(
            PrefabDefinition::parse(Path::new("x"), "{ nope", &PrototypeSelection::All),
            Err(PrefabError::Parse { .. })
        ));
        assert!(matches!(
            parse(json!({ "a": { "component": {} } }), PrototypeSelection::All),
            Err(PrefabError::Parse { .. })
        ));
        assert!(matches!(
            parse(json!({ "a": { "inherits": ["ghost"] } }), PrototypeSelection::All),
            Err(PrefabError::UnknownParent { .. })
        ));
        assert!(matches!(
            parse(
                json!({ "a": { "inherits": ["b"] }, "b": { "inherits": ["a"] } }),
                PrototypeSelection::All
            ),
            Err(PrefabError::InheritanceCycle { .. })
        ));
        assert!(matches!(
            parse(json!({ "a": {} }), PrototypeSelection::Only(vec!["b".into()])),
            Err(PrefabError::UnknownPrototype { .. })
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PrefabDefinition::from_file(&dir.path().join("none.json"), &PrototypeSelection::All)
            .unwrap_err();
        assert!(matches!(err, PrefabError::Io { .. }));
    }

    #[test]
    fn test_info_is_memoised() {
        let doc = json!({ "goblin": { "ctags": ["hostile"], "components": { "health": { "base": 10 } } } });
        let prefab = parse(doc, PrototypeSelection::All).unwrap();
        let first = prefab.info() as *const _;
        assert_eq!(first, prefab.info() as *const _);
        let goblin = &prefab.info()["goblin"];
        assert_eq!(goblin["ctags"], "hostile");
        assert_eq!(goblin["components.health"], r#"{"base":10}"#);
    }
}
