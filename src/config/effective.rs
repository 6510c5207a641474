//! Resolved options with full provenance
//!
//! [`resolve`] runs discovery, loading and merging for one invocation and
//! returns the single read-only option set that the filter engine consumes,
//! plus information about where each value came from.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde_json::Value;

use super::defaults::{self, BuiltinDefaults, OptionKind, DEP_SECTIONS, LOG_LEVELS};
use super::layer::{CliLayer, ConfigOrigin, ConfigSource};
use super::load::load;
use super::locate::locate;
use super::merge::merge;
use super::value::{Literal, OptionValue};

/// Environment variable that marks an automated run; rc auto-discovery is
/// off unless asked for.
pub const SUPPRESS_ENV: &str = "NCU_TESTS";

/// The merged options for one invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedOptions {
    values: BTreeMap<String, OptionValue>,
    origins: BTreeMap<String, ConfigOrigin>,
    sources: Vec<ConfigSource>,
    rc_config_path: Option<PathBuf>,
}

impl ResolvedOptions {
    pub(super) fn set(&mut self, key: String, value: OptionValue, origin: ConfigOrigin) {
        self.origins.insert(key.clone(), origin);
        self.values.insert(key, value);
    }

    pub(super) fn add_source(&mut self, source: ConfigSource) {
        self.sources.push(source);
    }

    pub(super) fn set_rc_config_path(&mut self, path: PathBuf) {
        self.rc_config_path = Some(path);
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(OptionValue::as_str)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(OptionValue::as_bool)
    }

    /// Boolean option, unset reads as `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get_bool(key).unwrap_or(false)
    }

    /// Which layer supplied the winning value.
    pub fn origin(&self, key: &str) -> Option<ConfigOrigin> {
        self.origins.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &OptionValue)> {
        self.values.iter()
    }

    /// Contributing sources in precedence order.
    pub fn sources(&self) -> &[ConfigSource] {
        &self.sources
    }

    /// rc file that contributed at least one value.
    pub fn rc_config_path(&self) -> Option<&Path> {
        self.rc_config_path.as_deref()
    }

    /// "Using config file ..." when an rc file contributed values.
    pub fn notice(&self) -> Option<String> {
        self.rc_config_path
            .as_ref()
            .map(|path| format!("Using config file {}", path.display()))
    }

    /// Provenance dump: each option with its origin, plus the sources.
    pub fn to_json(&self) -> Value {
        let options: serde_json::Map<String, Value> = self
            .values
            .iter()
            .map(|(key, value)| {
                let origin = self.origins.get(key).copied().unwrap_or(ConfigOrigin::Default);
                (
                    key.clone(),
                    serde_json::json!({
                        "value": describe(value),
                        "origin": origin,
                    }),
                )
            })
            .collect();
        serde_json::json!({
            "options": options,
            "sources": self.sources,
        })
    }
}

fn describe(value: &OptionValue) -> Value {
    match value {
        OptionValue::Literal(Literal::String(s)) => Value::String(s.clone()),
        OptionValue::Literal(Literal::Bool(b)) => Value::Bool(*b),
        OptionValue::Literal(Literal::Number(n)) => serde_json::Number::from_f64(*n)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        OptionValue::List(items) => Value::from(items.clone()),
        OptionValue::Pattern(pattern) => Value::String(pattern.source()),
        OptionValue::Predicate(callback) => Value::String(format!("{:?}", callback)),
        OptionValue::Data(data) => data.clone(),
    }
}

/// Process facts that influence resolution.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    /// Directory relative paths are resolved against.
    pub cwd: PathBuf,
    /// Skip rc auto-discovery unless explicitly requested.
    pub suppress_discovery: bool,
}

impl ResolveContext {
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            suppress_discovery: false,
        }
    }

    pub fn from_process() -> Result<Self, ConfigError> {
        let cwd = std::env::current_dir().map_err(|e| ConfigError::IoError {
            path: PathBuf::from("."),
            source: e,
        })?;
        Ok(Self {
            cwd,
            suppress_discovery: std::env::var_os(SUPPRESS_ENV).is_some(),
        })
    }

    pub fn suppressed(mut self, suppress: bool) -> Self {
        self.suppress_discovery = suppress;
        self
    }

    fn absolute(&self, path: &str) -> PathBuf {
        self.cwd.join(path)
    }
}

/// Resolve the options for one invocation.
///
/// Fails without returning a partial result if an explicitly named rc file is
/// missing, if the rc file cannot be parsed, or if a value has the wrong shape.
pub fn resolve(cli: &CliLayer, ctx: &ResolveContext) -> Result<ResolvedOptions, ConfigError> {
    let cli_str = |key: &str| cli.value(key).and_then(OptionValue::as_str);

    let explicit_dir = cli_str("configFilePath").map(|p| ctx.absolute(p));
    let explicit_name = cli_str("configFileName");
    let merge_config = cli.value("mergeConfig").and_then(OptionValue::as_bool).unwrap_or(false);

    let start_dir = if let Some(package_file) = cli_str("packageFile") {
        ctx.absolute(package_file)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| ctx.cwd.clone())
    } else if let Some(cwd) = cli_str("cwd") {
        ctx.absolute(cwd)
    } else {
        ctx.cwd.clone()
    };

    let requested = explicit_dir.is_some() || explicit_name.is_some() || merge_config;
    let rc_path = if ctx.suppress_discovery && !requested {
        debug!("rc discovery suppressed by {}", SUPPRESS_ENV);
        None
    } else {
        locate(&start_dir, explicit_dir.as_deref(), explicit_name)?
    };

    let rc = rc_path.as_deref().map(load).transpose()?;
    if let Some(layer) = rc.as_ref().filter(|l| l.is_empty()) {
        debug!(
            "config file {} has no options; ignoring",
            layer.source().path.as_deref().unwrap_or(Path::new("")).display()
        );
    }

    let resolved = merge(&BuiltinDefaults::default().to_layer(), rc.as_ref(), cli);
    validate(&resolved)?;

    if let Some(path) = resolved.rc_config_path() {
        info!("using config file {}", path.display());
    }
    Ok(resolved)
}

/// Check every recognized option has a value of its declared shape.
fn validate(options: &ResolvedOptions) -> Result<(), ConfigError> {
    for (key, value) in options.iter() {
        let Some(spec) = defaults::spec(key) else {
            continue;
        };
        let ok = match spec.kind {
            OptionKind::Bool => value.as_bool().is_some(),
            OptionKind::String => value.as_str().is_some(),
            OptionKind::Predicate => matches!(
                value,
                OptionValue::Literal(Literal::String(_))
                    | OptionValue::List(_)
                    | OptionValue::Pattern(_)
                    | OptionValue::Predicate(_)
            ),
            OptionKind::ResultPredicate => matches!(value, OptionValue::Predicate(_)),
        };
        if !ok {
            return Err(ConfigError::ValidationError(format!(
                "{} must be a {}, got {}",
                key,
                expected(spec.kind),
                value.kind_name()
            )));
        }
    }

    if let Some(level) = options.get_str("loglevel") {
        if !LOG_LEVELS.contains(&level) {
            return Err(ConfigError::ValidationError(format!(
                "loglevel must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                level
            )));
        }
    }

    if let Some(dep) = options.get_str("dep") {
        for section in dep.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !DEP_SECTIONS.contains(&section) {
                return Err(ConfigError::ValidationError(format!(
                    "unknown dependency section {:?} in dep (expected {})",
                    section,
                    DEP_SECTIONS.join(", ")
                )));
            }
        }
    }

    Ok(())
}

fn expected(kind: OptionKind) -> &'static str {
    match kind {
        OptionKind::Bool => "boolean",
        OptionKind::String => "string",
        OptionKind::Predicate => "string, list, regular expression or function",
        OptionKind::ResultPredicate => "function",
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file {name} not found in {}", dir.display())]
    NotFound { name: String, dir: PathBuf },

    #[error("IO error reading {}: {source}", path.display())]
    IoError {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Parse error in {}: {message}", path.display())]
    ParseError { path: PathBuf, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn ctx(dir: &TempDir) -> ResolveContext {
        ResolveContext::new(dir.path())
    }

    #[test]
    fn test_resolve_defaults_only() {
        let dir = TempDir::new().unwrap();
        let options = resolve(&CliLayer::new(), &ctx(&dir)).unwrap();

        assert_eq!(options.get_bool("jsonUpgraded"), Some(false));
        assert_eq!(options.notice(), None);
        assert_eq!(options.sources().len(), 1);
        assert_eq!(options.sources()[0].origin, ConfigOrigin::Default);
    }

    #[test]
    fn test_resolve_discovers_from_cwd_option() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("project");
        fs::create_dir(&project).unwrap();
        fs::write(project.join(".ncurc.json"), r#"{"deep": true}"#).unwrap();

        let cli = CliLayer::new().explicit("cwd", OptionValue::string("project"));
        let options = resolve(&cli, &ctx(&dir)).unwrap();

        assert!(options.flag("deep"));
        assert_eq!(options.rc_config_path(), Some(project.join(".ncurc.json").as_path()));
    }

    #[test]
    fn test_resolve_starts_from_package_file_dir() {
        let dir = TempDir::new().unwrap();
        let project = dir.path().join("pkg");
        fs::create_dir(&project).unwrap();
        fs::write(project.join(".ncurc.json"), r#"{"silent": true}"#).unwrap();

        let cli = CliLayer::new().explicit("packageFile", OptionValue::string("pkg/package.json"));
        let options = resolve(&cli, &ctx(&dir)).unwrap();
        assert!(options.flag("silent"));
    }

    #[test]
    fn test_suppressed_mode_skips_discovery() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".ncurc.json"), r#"{"deep": true}"#).unwrap();

        let options = resolve(&CliLayer::new(), &ctx(&dir).suppressed(true)).unwrap();
        assert!(!options.flag("deep"));
        assert_eq!(options.notice(), None);

        let merged = resolve(
            &CliLayer::new().explicit("mergeConfig", OptionValue::bool(true)),
            &ctx(&dir).suppressed(true),
        )
        .unwrap();
        assert!(merged.flag("deep"));
    }

    #[test]
    fn test_explicit_path_works_in_suppressed_mode() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".ncurc.json"), r#"{"filter": "ncu-test-v2"}"#).unwrap();

        let cli = CliLayer::new().explicit("configFilePath", OptionValue::string(dir.path().to_string_lossy()));
        let options = resolve(&cli, &ctx(&dir).suppressed(true)).unwrap();

        assert_eq!(
            options.notice(),
            Some(format!("Using config file {}", dir.path().join(".ncurc.json").display()))
        );
    }

    #[test]
    fn test_missing_config_file_name() {
        let dir = TempDir::new().unwrap();
        let cli = CliLayer::new()
            .explicit("configFilePath", OptionValue::string(dir.path().to_string_lossy()))
            .explicit("configFileName", OptionValue::string(".ncurc_missing.json"));

        let err = resolve(&cli, &ctx(&dir)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
        assert_eq!(
            err.to_string(),
            format!("Config file .ncurc_missing.json not found in {}", dir.path().display())
        );
    }

    #[test]
    fn test_validation_rejects_wrong_boolean_shape() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".ncurc.json"), r#"{"jsonUpgraded": "yes"}"#).unwrap();

        let err = resolve(&CliLayer::new(), &ctx(&dir)).unwrap_err();
        assert!(err.to_string().contains("jsonUpgraded"));
    }

    #[test]
    fn test_validation_loglevel_and_dep() {
        let dir = TempDir::new().unwrap();
        let bad_level = CliLayer::new().explicit("loglevel", OptionValue::string("loud"));
        assert!(resolve(&bad_level, &ctx(&dir)).is_err());

        let bad_dep = CliLayer::new().explicit("dep", OptionValue::string("prod,bundled"));
        let err = resolve(&bad_dep, &ctx(&dir)).unwrap_err();
        assert!(err.to_string().contains("bundled"));

        let good = CliLayer::new().explicit("dep", OptionValue::string("prod, peer"));
        assert!(resolve(&good, &ctx(&dir)).is_ok());
    }

    #[test]
    fn test_filter_results_requires_function() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".ncurc.json"), r#"{"filterResults": "x"}"#).unwrap();

        let err = resolve(&CliLayer::new(), &ctx(&dir)).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_provenance_json() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(".ncurc.json"), r#"{"reject": ["a"]}"#).unwrap();

        let options = resolve(&CliLayer::new(), &ctx(&dir)).unwrap();
        let json = options.to_json();
        assert_eq!(json["options"]["reject"]["origin"], "rcFile");
        assert_eq!(json["options"]["reject"]["value"], serde_json::json!(["a"]));
        assert_eq!(json["options"]["dep"]["origin"], "default");
        assert_eq!(json["sources"][1]["origin"], "rcFile");
    }
}
