// scene_definition.rs - Scene files
//
// A scene lists the assets to load and the prefabs (with their targeted
// prototypes) to instantiate, plus optional named instances to spawn.
// Relative paths are resolved against the scene file's directory.

use crate::prefab::PrototypeSelection;
use keel_asset::{Asset, AssetError, ShaderSources, TextureDesc};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Prefab entry: `{ "path", "target_prototypes": [..] | ["*"] }`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PrefabRef {
    pub path: PathBuf,
    pub target_prototypes: Vec<String>,
}

impl PrefabRef {
    pub fn selection(&self) -> PrototypeSelection {
        PrototypeSelection::from_ids(&self.target_prototypes)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SceneAssets {
    pub shaders: BTreeMap<String, ShaderSources>,
    pub textures: BTreeMap<String, TextureDesc>,
    pub models: BTreeMap<String, PathBuf>,
    pub prefabs: BTreeMap<String, PrefabRef>,
}

/// A named instance spawned from a prototype when the scene is built.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitySpawn {
    pub prefab: String,
    pub prototype: String,
    pub name: String,
    #[serde(default)]
    pub tag: Option<String>,
    #[serde(default)]
    pub uuid: Option<Uuid>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SceneFile {
    assets: SceneAssets,
    entities: Vec<EntitySpawn>,
}

/// A parsed scene file with every path made absolute (or relative to the
/// process only when the scene path itself was).
#[derive(Clone, Debug, PartialEq)]
pub struct SceneDefinition {
    pub path: PathBuf,
    pub assets: SceneAssets,
    pub entities: Vec<EntitySpawn>,
}

impl SceneDefinition {
    /// Parse scene text. `path` locates the file for relative path resolution.
    pub fn parse(path: &Path, text: &str) -> Result<Self, serde_json::Error> {
        let file: SceneFile = serde_json::from_str(text)?;
        let root = path.parent().unwrap_or_else(|| Path::new(""));
        let mut assets = file.assets;

        for sources in assets.shaders.values_mut() {
            for source in sources.values_mut() {
                *source = root.join(&*source);
            }
        }
        for texture in assets.textures.values_mut() {
            texture.path = root.join(&texture.path);
        }
        for model in assets.models.values_mut() {
            *model = root.join(&*model);
        }
        for prefab in assets.prefabs.values_mut() {
            prefab.path = root.join(&prefab.path);
        }

        Ok(Self {
            path: path.to_path_buf(),
            assets,
            entities: file.entities,
        })
    }
}

impl Asset for SceneDefinition {
    type Args = PathBuf;
    const KIND: &'static str = "scene";

    fn load(id: &str, path: PathBuf) -> Result<Self, AssetError> {
        let text = std::fs::read_to_string(&path).map_err(|e| AssetError::io(&path, e))?;
        Self::parse(&path, &text).map_err(|source| AssetError::Load {
            kind: Self::KIND,
            id: id.to_string(),
            source: Box::new(source),
        })
    }
}
