//! Error taxonomy for the viewer core.
//!
//! Asset failures are absorbed by [`crate::load::AssetLoadState`] and turned
//! into an overlay state; they never escape to the host. The remaining
//! variants signal misuse of the lifecycle API and are meant to surface in
//! development builds and tests.

use thiserror::Error;

pub type ViewerResult<T> = Result<T, ViewerError>;

/// Network or parse failure reported by the asset loader. Terminal, never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to load asset '{source_id}': {reason}")]
pub struct AssetLoadError {
    pub source_id: String,
    pub reason: String,
}

impl AssetLoadError {
    pub fn new(source_id: impl Into<String>, reason: impl ToString) -> Self {
        Self {
            source_id: source_id.into(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewerError {
    #[error(transparent)]
    AssetLoad(#[from] AssetLoadError),

    #[error("unrecognized asset version '{0}'")]
    InvalidConfiguration(String),

    #[error("a load session for '{0}' is already pending")]
    AlreadyLoading(String),

    #[error("invalid state transition: {0}")]
    InvalidStateTransition(&'static str),

    #[error("render engine error: {0}")]
    Engine(String),
}

/// Failure to read or validate a `ViewerConfig` document.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config validation failed: {0}")]
    Invalid(String),
}
