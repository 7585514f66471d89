//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading [`Options`](super::Options).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("options file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("options map parsing error")]
    Json(#[from] serde_json::Error),
}
