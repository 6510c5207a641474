//! Version lookup
//!
//! The engine only needs "what would this dependency upgrade to". The
//! shipped source is a static JSON document mapping package names to their
//! latest version, which keeps runs reproducible and offline.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::dependency::{Dependency, UpgradeCandidate};

/// Resolves the version a package would upgrade to.
pub trait VersionSource {
    /// Latest known version of `name`, if any.
    fn latest(&self, name: &str) -> Result<Option<String>, RegistryError>;
}

/// Name to latest-version map loaded from a JSON file.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    versions: BTreeMap<String, String>,
}

impl StaticRegistry {
    pub fn new(versions: BTreeMap<String, String>) -> Self {
        Self { versions }
    }

    /// Load `{"name": "version", ...}` from `path`.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let contents = fs::read_to_string(path).map_err(|e| RegistryError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let versions: BTreeMap<String, String> =
            serde_json::from_str(&contents).map_err(|e| RegistryError::ParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        debug!("loaded {} versions from {}", versions.len(), path.display());
        Ok(Self { versions })
    }
}

impl VersionSource for StaticRegistry {
    fn latest(&self, name: &str) -> Result<Option<String>, RegistryError> {
        Ok(self.versions.get(name).cloned())
    }
}

/// Attach the upgraded version to each dependency, keeping order.
pub fn resolve_upgrades<S: VersionSource + ?Sized>(
    source: &S,
    deps: &[Dependency],
) -> Result<Vec<UpgradeCandidate>, RegistryError> {
    deps.iter()
        .map(|dep| Ok(dep.with_upgrade(source.latest(&dep.name)?)))
        .collect()
}

/// Registry errors
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("no registry configured; pass --registry <file>")]
    Unconfigured,

    #[error("IO error reading {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Parse error in {}: {message}", path.display())]
    ParseError { path: PathBuf, message: String },
}
