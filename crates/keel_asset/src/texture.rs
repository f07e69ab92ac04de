use crate::{Asset, AssetError};
use serde::Deserialize;
use std::path::PathBuf;

/// How a texture is used by materials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextureKind {
    #[default]
    Diffuse,
    Specular,
    Normal,
    Height,
    Emissive,
}

/// Texture entry of a scene file: `{ "path", "type", "flip_vertically"? }`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct TextureDesc {
    pub path: PathBuf,
    #[serde(rename = "type", default)]
    pub kind: TextureKind,
    #[serde(default)]
    pub flip_vertically: bool,
}

/// Encoded texture bytes plus sampling metadata. Pixel decoding is left to
/// the renderer backend.
#[derive(Clone, Debug)]
pub struct TextureAsset {
    pub path: PathBuf,
    pub kind: TextureKind,
    pub flip_vertically: bool,
    pub data: Vec<u8>,
}

impl Asset for TextureAsset {
    type Args = TextureDesc;
    const KIND: &'static str = "texture";

    fn load(id: &str, desc: TextureDesc) -> Result<Self, AssetError> {
        let data = std::fs::read(&desc.path).map_err(|e| AssetError::io(&desc.path, e))?;
        if data.is_empty() {
            return Err(AssetError::Invalid {
                kind: Self::KIND,
                id: id.to_string(),
                reason: format!("{} is empty", desc.path.display()),
            });
        }
        Ok(Self {
            path: desc.path,
            kind: desc.kind,
            flip_vertically: desc.flip_vertically,
            data,
        })
    }
}
