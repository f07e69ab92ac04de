//! Keel Asset Pipeline
//!
//! Type-keyed storage of loaded assets behind shared handles. Loading is
//! synchronous; decoding of image/mesh formats happens elsewhere.

mod error;
mod handle;
mod model;
mod registry;
mod shader;
mod texture;

pub use error::AssetError;
pub use handle::AssetHandle;
pub use model::ModelAsset;
pub use registry::{Asset, AssetMetrics, AssetRegistry};
pub use shader::{ShaderAsset, ShaderSources, ShaderStage};
pub use texture::{TextureAsset, TextureDesc, TextureKind};
