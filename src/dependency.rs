//! Dependency records consumed by the filter engine.
//!
//! The engine treats these as opaque: it reads names and version strings and
//! never rewrites them.

use serde::Serialize;

/// A dependency as declared in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dependency {
    pub name: String,
    pub current_version: String,
}

impl Dependency {
    pub fn new(name: impl Into<String>, current_version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            current_version: current_version.into(),
        }
    }

    /// Attach the version resolved by the registry.
    pub fn with_upgrade(&self, upgraded_version: Option<String>) -> UpgradeCandidate {
        UpgradeCandidate {
            name: self.name.clone(),
            current_version: self.current_version.clone(),
            upgraded_version,
        }
    }
}

/// A dependency plus the version the registry resolved for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeCandidate {
    pub name: String,
    pub current_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upgraded_version: Option<String>,
}

impl UpgradeCandidate {
    /// True when the resolved version differs from the declared one.
    pub fn is_upgrade(&self) -> bool {
        self.upgraded_version
            .as_deref()
            .is_some_and(|v| v != self.current_version)
    }
}

/// Version data handed to predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VersionInfo<'a> {
    pub current_version: &'a str,
    pub upgraded_version: Option<&'a str>,
}

impl VersionInfo<'_> {
    /// JSON record passed to script callbacks.
    pub fn to_json(&self, name: &str) -> serde_json::Value {
        let mut record = serde_json::Map::new();
        record.insert("name".into(), name.into());
        record.insert("currentVersion".into(), self.current_version.into());
        if let Some(upgraded) = self.upgraded_version {
            record.insert("upgradedVersion".into(), upgraded.into());
        }
        serde_json::Value::Object(record)
    }
}

/// Anything the filter pipeline can decide on.
pub trait Candidate {
    fn name(&self) -> &str;
    fn version_info(&self) -> VersionInfo<'_>;
}

impl Candidate for Dependency {
    fn name(&self) -> &str {
        &self.name
    }

    fn version_info(&self) -> VersionInfo<'_> {
        VersionInfo {
            current_version: &self.current_version,
            upgraded_version: None,
        }
    }
}

impl Candidate for UpgradeCandidate {
    fn name(&self) -> &str {
        &self.name
    }

    fn version_info(&self) -> VersionInfo<'_> {
        VersionInfo {
            current_version: &self.current_version,
            upgraded_version: self.upgraded_version.as_deref(),
        }
    }
}

impl<T: Candidate + ?Sized> Candidate for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn version_info(&self) -> VersionInfo<'_> {
        (**self).version_info()
    }
}
