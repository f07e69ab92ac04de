use crate::{Asset, AssetError};
use std::path::PathBuf;

/// Raw model file contents.
#[derive(Clone, Debug)]
pub struct ModelAsset {
    pub path: PathBuf,
    pub data: Vec<u8>,
    /// Vertex count for Wavefront `.obj` files, 0 for other formats.
    pub vertex_count: usize,
}

impl Asset for ModelAsset {
    type Args = PathBuf;
    const KIND: &'static str = "model";

    fn load(_id: &str, path: PathBuf) -> Result<Self, AssetError> {
        let data = std::fs::read(&path).map_err(|e| AssetError::io(&path, e))?;
        let is_obj = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("obj"));
        let vertex_count = if is_obj {
            String::from_utf8_lossy(&data)
                .lines()
                .filter(|line| line.trim_start().starts_with("v "))
                .count()
        } else {
            0
        };
        Ok(Self {
            path,
            data,
            vertex_count,
        })
    }
}
