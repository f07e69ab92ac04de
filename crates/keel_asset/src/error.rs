use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or looking up assets.
#[derive(Debug, Error)]
pub enum AssetError {
    #[error("{kind} '{id}' is already loaded")]
    AlreadyLoaded { kind: &'static str, id: String },

    #[error("{kind} '{id}' is not loaded")]
    NotFound { kind: &'static str, id: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{kind} '{id}' is invalid: {reason}")]
    Invalid {
        kind: &'static str,
        id: String,
        reason: String,
    },

    #[error("failed to load {kind} '{id}': {source}")]
    Load {
        kind: &'static str,
        id: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AssetError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
