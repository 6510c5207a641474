//! package.json reading
//!
//! Supplies the `{name, currentVersion}` pairs the filter engine works on,
//! from a manifest file, standard input, or every manifest below a directory.

use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use log::debug;
use serde_json::Value;
use walkdir::WalkDir;

use crate::config::DEP_SECTIONS;
use crate::dependency::Dependency;

/// Manifest file name.
pub const PACKAGE_FILE: &str = "package.json";

/// A dependency section selectable with `dep`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepSection {
    Prod,
    Dev,
    Optional,
    Peer,
}

impl DepSection {
    /// Key of this section in package.json.
    pub fn key(self) -> &'static str {
        match self {
            DepSection::Prod => "dependencies",
            DepSection::Dev => "devDependencies",
            DepSection::Optional => "optionalDependencies",
            DepSection::Peer => "peerDependencies",
        }
    }

    pub fn parse(name: &str) -> Result<Self, ManifestError> {
        match name {
            "prod" => Ok(DepSection::Prod),
            "dev" => Ok(DepSection::Dev),
            "optional" => Ok(DepSection::Optional),
            "peer" => Ok(DepSection::Peer),
            other => Err(ManifestError::UnknownSection {
                name: other.to_string(),
                expected: DEP_SECTIONS.join(", "),
            }),
        }
    }

    /// Parse a comma-separated `dep` value.
    pub fn parse_list(spec: &str) -> Result<Vec<Self>, ManifestError> {
        spec.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Self::parse)
            .collect()
    }
}

/// A parsed manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    /// Where it was read from; `None` for stdin.
    pub path: Option<PathBuf>,
    pub data: Value,
}

impl Manifest {
    pub fn read(path: &Path) -> Result<Self, ManifestError> {
        let contents = fs::read_to_string(path).map_err(|e| ManifestError::IoError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut manifest = Self::parse(&contents)?;
        manifest.path = Some(path.to_path_buf());
        Ok(manifest)
    }

    pub fn from_reader(mut reader: impl Read) -> Result<Self, ManifestError> {
        let mut contents = String::new();
        reader.read_to_string(&mut contents).map_err(|e| ManifestError::IoError {
            path: PathBuf::from("<stdin>"),
            source: e,
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self, ManifestError> {
        let data: Value = serde_json::from_str(contents).map_err(|e| ManifestError::ParseError(e.to_string()))?;
        if !data.is_object() {
            return Err(ManifestError::ParseError("manifest must be a JSON object".to_string()));
        }
        Ok(Self { path: None, data })
    }

    /// Dependencies from `sections`, in section then document order. A name
    /// listed in several sections is kept once, at its first occurrence.
    pub fn dependencies(&self, sections: &[DepSection]) -> Vec<Dependency> {
        let mut deps: Vec<Dependency> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for section in sections {
            let Some(entries) = self.data.get(section.key()).and_then(Value::as_object) else {
                continue;
            };
            for (name, version) in entries {
                let Some(version) = version.as_str() else {
                    debug!("skipping {} in {}: version is not a string", name, section.key());
                    continue;
                };
                if !seen.insert(name.as_str()) {
                    continue;
                }
                deps.push(Dependency::new(name.as_str(), version));
            }
        }
        deps
    }

    /// Display name for output: the path, or `-` for stdin.
    pub fn label(&self) -> String {
        self.path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    }
}

/// Every package.json under `root`, skipping node_modules and hidden
/// directories. Sorted by path.
pub fn find_manifests(root: &Path) -> Vec<PathBuf> {
    let mut found: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_entry(|entry| {
            if entry.depth() == 0 || !entry.file_type().is_dir() {
                return true;
            }
            let name = entry.file_name().to_string_lossy();
            name != "node_modules" && !name.starts_with('.')
        })
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file() && entry.file_name() == PACKAGE_FILE)
        .map(|entry| entry.into_path())
        .collect();
    found.sort();
    debug!("found {} manifests under {}", found.len(), root.display());
    found
}

/// Manifest errors
#[derive(Debug, thiserror::Error)]
pub enum ManifestError {
    #[error("IO error reading {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid manifest: {0}")]
    ParseError(String),

    #[error("Unknown dependency section {name:?} (expected {expected})")]
    UnknownSection { name: String, expected: String },

    #[error("No package.json found in {}", .0.display())]
    NotFound(PathBuf),
}
