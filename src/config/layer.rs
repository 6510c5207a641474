//! Configuration layers
//!
//! A layer is an immutable mapping from option name to value, tagged with
//! where it came from. The command-line layer additionally records, per key,
//! whether the user typed the option or the argument parser filled it in.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::Serialize;

use super::defaults;
use super::value::OptionValue;

/// Origin of a configuration layer, lowest precedence first
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "camelCase")]
pub enum ConfigOrigin {
    Default,
    RcFile,
    Cli,
}

/// A contributing config source with provenance
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfigSource {
    /// Origin of this source
    pub origin: ConfigOrigin,

    /// File path (None for defaults/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,

    /// SHA-256 digest of raw file bytes (None for defaults/cli)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,
}

/// One named source of option values.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigLayer {
    source: ConfigSource,
    values: BTreeMap<String, OptionValue>,
    metadata: BTreeMap<String, serde_json::Value>,
}

impl ConfigLayer {
    pub fn new(origin: ConfigOrigin) -> Self {
        Self {
            source: ConfigSource {
                origin,
                path: None,
                digest: None,
            },
            values: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Layer read from an rc file.
    pub fn from_file(path: PathBuf, digest: String) -> Self {
        Self {
            source: ConfigSource {
                origin: ConfigOrigin::RcFile,
                path: Some(path),
                digest: Some(digest),
            },
            values: BTreeMap::new(),
            metadata: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: OptionValue) {
        self.values.insert(key.into(), value);
    }

    /// Keep a non-option key such as `$schema`.
    pub fn insert_metadata(&mut self, key: impl Into<String>, value: serde_json::Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.values.iter()
    }

    pub fn metadata(&self) -> &BTreeMap<String, serde_json::Value> {
        &self.metadata
    }

    pub fn source(&self) -> &ConfigSource {
        &self.source
    }

    /// True when the layer holds no option values. Metadata does not count.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

/// A command-line value and whether the user actually supplied it.
#[derive(Debug, Clone, PartialEq)]
pub struct CliEntry {
    pub value: OptionValue,
    pub explicit: bool,
}

/// Options as seen by the argument parser.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliLayer {
    entries: BTreeMap<String, CliEntry>,
}

impl CliLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an option the user typed.
    pub fn explicit(mut self, key: impl Into<String>, value: OptionValue) -> Self {
        self.set(key, value, true);
        self
    }

    /// Record a value the argument parser supplied as its own default.
    pub fn defaulted(mut self, key: impl Into<String>, value: OptionValue) -> Self {
        self.set(key, value, false);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: OptionValue, explicit: bool) {
        self.entries.insert(key.into(), CliEntry { value, explicit });
    }

    pub fn get(&self, key: &str) -> Option<&CliEntry> {
        self.entries.get(key)
    }

    /// Value of `key` regardless of whether it was typed.
    pub fn value(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key).map(|e| &e.value)
    }

    pub fn is_explicit(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(|e| e.explicit)
    }

    /// Explicitly supplied options under their canonical names.
    ///
    /// A typed `no-<name>` for a boolean option becomes `<name> = false` and
    /// takes precedence over a typed `<name>`.
    pub fn explicit_overrides(&self) -> BTreeMap<String, OptionValue> {
        let mut overrides = BTreeMap::new();
        let mut negations = Vec::new();

        for (key, entry) in self.entries.iter().filter(|(_, e)| e.explicit) {
            match negated_name(key) {
                Some(name) => {
                    // `--no-x` with a false value means the flag was not set
                    if entry.value.as_bool() != Some(false) {
                        negations.push(name.to_string());
                    }
                }
                None => {
                    overrides.insert(key.clone(), entry.value.clone());
                }
            }
        }

        for name in negations {
            overrides.insert(name, OptionValue::bool(false));
        }
        overrides
    }
}

/// `no-jsonUpgraded` -> `jsonUpgraded`, for boolean options only.
pub fn negated_name(key: &str) -> Option<&str> {
    key.strip_prefix("no-").filter(|name| defaults::is_boolean(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_empty_ignores_metadata() {
        let mut layer = ConfigLayer::from_file(PathBuf::from("/tmp/.ncurc.json"), "abc".into());
        layer.insert_metadata("$schema", serde_json::json!("schema url"));
        assert!(layer.is_empty());
        layer.insert("filter", OptionValue::string("ncu-test-v2"));
        assert!(!layer.is_empty());
        assert_eq!(layer.len(), 1);
    }

    #[test]
    fn test_negated_name() {
        assert_eq!(negated_name("no-jsonUpgraded"), Some("jsonUpgraded"));
        assert_eq!(negated_name("no-filter"), None);
        assert_eq!(negated_name("jsonUpgraded"), None);
    }

    #[test]
    fn test_explicit_overrides_skip_defaulted() {
        let cli = CliLayer::new()
            .defaulted("jsonUpgraded", OptionValue::bool(false))
            .explicit("filter", OptionValue::string("ncu-test-tag"));
        let overrides = cli.explicit_overrides();
        assert_eq!(overrides.len(), 1);
        assert_eq!(overrides["filter"], OptionValue::string("ncu-test-tag"));
    }

    #[test]
    fn test_negation_normalized() {
        let cli = CliLayer::new()
            .explicit("no-jsonUpgraded", OptionValue::bool(true))
            .defaulted("no-deep", OptionValue::bool(false));
        let overrides = cli.explicit_overrides();
        assert_eq!(overrides.get("jsonUpgraded"), Some(&OptionValue::bool(false)));
        assert!(!overrides.contains_key("no-jsonUpgraded"));
        assert!(!overrides.contains_key("deep"));
    }

    #[test]
    fn test_negation_beats_positive_spelling() {
        let cli = CliLayer::new()
            .explicit("deep", OptionValue::bool(true))
            .explicit("no-deep", OptionValue::bool(true));
        assert_eq!(cli.explicit_overrides()["deep"], OptionValue::bool(false));
    }
}
