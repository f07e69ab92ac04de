use crate::{Asset, AssetError};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Pipeline stage a shader source belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShaderStage {
    Vertex,
    Fragment,
    Geometry,
    Compute,
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::Fragment => "fragment",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Compute => "compute",
        };
        f.write_str(name)
    }
}

/// Stage -> source path, as written in a scene file.
pub type ShaderSources = BTreeMap<ShaderStage, PathBuf>;

/// Source text for every stage of one shader program.
#[derive(Clone, Debug, Default)]
pub struct ShaderAsset {
    pub stages: BTreeMap<ShaderStage, String>,
}

impl ShaderAsset {
    pub fn source(&self, stage: ShaderStage) -> Option<&str> {
        self.stages.get(&stage).map(String::as_str)
    }
}

impl Asset for ShaderAsset {
    type Args = ShaderSources;
    const KIND: &'static str = "shader";

    fn load(id: &str, sources: ShaderSources) -> Result<Self, AssetError> {
        let invalid = |reason: &str| AssetError::Invalid {
            kind: Self::KIND,
            id: id.to_string(),
            reason: reason.to_string(),
        };
        if sources.is_empty() {
            return Err(invalid("no stages declared"));
        }
        let compute = sources.contains_key(&ShaderStage::Compute);
        if compute && sources.len() > 1 {
            return Err(invalid("compute stage cannot be mixed with graphics stages"));
        }
        if !compute
            && !(sources.contains_key(&ShaderStage::Vertex)
                && sources.contains_key(&ShaderStage::Fragment))
        {
            return Err(invalid("graphics programs need vertex and fragment stages"));
        }

        let mut stages = BTreeMap::new();
        for (stage, path) in sources {
            let source =
                std::fs::read_to_string(&path).map_err(|e| AssetError::io(&path, e))?;
            stages.insert(stage, source);
        }
        Ok(Self { stages })
    }
}
