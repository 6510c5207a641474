//! Crate-level error type.

use crate::config::ConfigError;
use crate::filter::FilterError;
use crate::manifest::ManifestError;
use crate::registry::RegistryError;

/// Any failure of an invocation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("output error: {0}")]
    Output(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
