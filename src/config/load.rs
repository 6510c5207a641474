//! rc-file loading
//!
//! Turns a located rc file into a [`ConfigLayer`]. Data files (JSON, YAML,
//! extensionless `.ncurc`) are parsed as plain data; `.js`/`.cjs`/`.mjs`
//! files are evaluated as modules so that predicate axes can hold functions
//! and regex literals.

use std::fs;
use std::path::Path;

use log::{debug, warn};
use ncu_script::Value as ScriptValue;
use sha2::{Digest, Sha256};

use super::defaults;
use super::effective::ConfigError;
use super::layer::ConfigLayer;
use super::value::{Callback, OptionValue, Pattern};

/// File formats an rc file may be written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RcFormat {
    Json,
    Yaml,
    /// No extension: JSON first, then YAML.
    Data,
    Module,
}

impl RcFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => RcFormat::Json,
            Some("yaml") | Some("yml") => RcFormat::Yaml,
            Some("js") | Some("cjs") | Some("mjs") => RcFormat::Module,
            _ => RcFormat::Data,
        }
    }
}

/// Load an rc file into a configuration layer.
pub fn load(path: &Path) -> Result<ConfigLayer, ConfigError> {
    let bytes = fs::read(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let digest = hex::encode(hasher.finalize());

    let contents = String::from_utf8(bytes).map_err(|e| parse_error(path, format!("invalid UTF-8: {}", e)))?;

    let format = RcFormat::from_path(path);
    debug!("loading {} as {:?}", path.display(), format);

    let mut layer = ConfigLayer::from_file(path.to_path_buf(), digest);
    match format {
        RcFormat::Module => {
            let exported = ncu_script::evaluate_module(&contents).map_err(|e| parse_error(path, e.to_string()))?;
            let entries = match exported {
                ScriptValue::Object(entries) => entries,
                other => {
                    return Err(parse_error(
                        path,
                        format!("module must export an object, got {}", other.type_name()),
                    ))
                }
            };
            for (key, value) in entries {
                insert_script_value(&mut layer, key, value)?;
            }
        }
        RcFormat::Json | RcFormat::Yaml | RcFormat::Data => {
            let data = parse_data(path, format, &contents)?;
            let serde_json::Value::Object(entries) = data else {
                return Err(parse_error(path, "top level must be an object".to_string()));
            };
            for (key, value) in entries {
                insert_data_value(&mut layer, key, value)?;
            }
        }
    }

    if !layer.metadata().is_empty() {
        debug!(
            "ignoring metadata keys in {}: {:?}",
            path.display(),
            layer.metadata().keys().collect::<Vec<_>>()
        );
    }
    Ok(layer)
}

fn parse_data(path: &Path, format: RcFormat, contents: &str) -> Result<serde_json::Value, ConfigError> {
    // An empty file is an empty config rather than a syntax error
    if contents.trim().is_empty() {
        return Ok(serde_json::Value::Object(serde_json::Map::new()));
    }

    match format {
        RcFormat::Json => {
            serde_json::from_str(contents).map_err(|e| parse_error(path, format!("JSON parse error: {}", e)))
        }
        RcFormat::Yaml => {
            serde_yaml::from_str(contents).map_err(|e| parse_error(path, format!("YAML parse error: {}", e)))
        }
        _ => serde_json::from_str(contents).or_else(|json_err| {
            serde_yaml::from_str(contents).map_err(|yaml_err| {
                parse_error(
                    path,
                    format!("not valid JSON ({}) or YAML ({})", json_err, yaml_err),
                )
            })
        }),
    }
}

fn insert_data_value(layer: &mut ConfigLayer, key: String, value: serde_json::Value) -> Result<(), ConfigError> {
    if key.starts_with('$') {
        layer.insert_metadata(key, value);
        return Ok(());
    }
    if defaults::spec(&key).is_none() {
        warn!("unknown option {:?} in config file", key);
    }
    layer.insert(key, OptionValue::from_json(value));
    Ok(())
}

fn insert_script_value(layer: &mut ConfigLayer, key: String, value: ScriptValue) -> Result<(), ConfigError> {
    if matches!(value, ScriptValue::Undefined) {
        return Ok(());
    }
    if key.starts_with('$') {
        let json = value
            .to_json()
            .map_err(|e| ConfigError::ValidationError(format!("{}: {}", key, e)))?;
        layer.insert_metadata(key, json);
        return Ok(());
    }

    let option = if defaults::is_predicate_axis(&key) {
        predicate_value(&key, value)?
    } else {
        if matches!(value, ScriptValue::Function(_)) {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be a function",
                key
            )));
        }
        if defaults::spec(&key).is_none() {
            warn!("unknown option {:?} in config file", key);
        }
        let json = value
            .to_json()
            .map_err(|e| ConfigError::ValidationError(format!("{}: {}", key, e)))?;
        OptionValue::from_json(json)
    };
    layer.insert(key, option);
    Ok(())
}

/// Interpret a module value on a predicate axis.
fn predicate_value(key: &str, value: ScriptValue) -> Result<OptionValue, ConfigError> {
    match value {
        ScriptValue::Function(function) => Ok(OptionValue::Predicate(Callback::from_script(key, function))),
        ScriptValue::Regex(regex) => Ok(OptionValue::Pattern(Pattern::from(regex))),
        ScriptValue::Array(items) => {
            let mut entries = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    ScriptValue::String(s) => entries.push(s),
                    ScriptValue::Regex(regex) => entries.push(regex.literal()),
                    other => {
                        return Err(ConfigError::ValidationError(format!(
                            "{} entries must be strings or regular expressions, got {}",
                            key,
                            other.type_name()
                        )))
                    }
                }
            }
            Ok(OptionValue::List(entries))
        }
        other => {
            let json = other
                .to_json()
                .map_err(|e| ConfigError::ValidationError(format!("{}: {}", key, e)))?;
            Ok(OptionValue::from_json(json))
        }
    }
}

fn parse_error(path: &Path, message: String) -> ConfigError {
    ConfigError::ParseError {
        path: path.to_path_buf(),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::value::CallbackInput;
    use serde_json::json;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(RcFormat::from_path(Path::new(".ncurc.json")), RcFormat::Json);
        assert_eq!(RcFormat::from_path(Path::new(".ncurc.yml")), RcFormat::Yaml);
        assert_eq!(RcFormat::from_path(Path::new(".ncurc.cjs")), RcFormat::Module);
        assert_eq!(RcFormat::from_path(Path::new(".ncurc")), RcFormat::Data);
    }

    #[test]
    fn test_load_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, ".ncurc.json", r#"{"jsonUpgraded": true, "filter": "ncu-test-v2"}"#);

        let layer = load(&path).unwrap();
        assert_eq!(layer.get("jsonUpgraded"), Some(&OptionValue::bool(true)));
        assert_eq!(layer.get("filter"), Some(&OptionValue::string("ncu-test-v2")));
        assert_eq!(layer.source().path.as_deref(), Some(path.as_path()));
        assert_eq!(layer.source().digest.as_ref().map(|d| d.len()), Some(64));
    }

    #[test]
    fn test_schema_key_is_metadata() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            ".ncurc.json",
            r#"{"$schema": "https://example.invalid/schema.json", "reject": ["a"]}"#,
        );

        let layer = load(&path).unwrap();
        assert!(layer.get("$schema").is_none());
        assert_eq!(layer.metadata()["$schema"], json!("https://example.invalid/schema.json"));
        assert_eq!(layer.get("reject"), Some(&OptionValue::List(vec!["a".into()])));
    }

    #[test]
    fn test_empty_files_are_empty_layers() {
        let dir = TempDir::new().unwrap();
        assert!(load(&write(&dir, ".ncurc.json", "{}")).unwrap().is_empty());
        assert!(load(&write(&dir, ".ncurc.yml", "")).unwrap().is_empty());
        assert!(load(&write(&dir, ".ncurc.cjs", "module.exports = {}")).unwrap().is_empty());
    }

    #[test]
    fn test_load_yaml() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, ".ncurc.yaml", "deep: true\nreject:\n  - left-pad\n");

        let layer = load(&path).unwrap();
        assert_eq!(layer.get("deep"), Some(&OptionValue::bool(true)));
        assert_eq!(layer.get("reject"), Some(&OptionValue::List(vec!["left-pad".into()])));
    }

    #[test]
    fn test_extensionless_accepts_json_and_yaml() {
        let dir = TempDir::new().unwrap();
        let json_layer = load(&write(&dir, ".ncurc", r#"{"silent": true}"#)).unwrap();
        assert_eq!(json_layer.get("silent"), Some(&OptionValue::bool(true)));

        let other = TempDir::new().unwrap();
        let yaml_layer = load(&write(&other, ".ncurc", "silent: true\n")).unwrap();
        assert_eq!(yaml_layer.get("silent"), Some(&OptionValue::bool(true)));
    }

    #[test]
    fn test_non_object_top_level_rejected() {
        let dir = TempDir::new().unwrap();
        let err = load(&write(&dir, ".ncurc.json", "[1, 2]")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_malformed_json_is_parse_error() {
        let dir = TempDir::new().unwrap();
        let err = load(&write(&dir, ".ncurc.json", "{ not json")).unwrap_err();
        assert!(err.to_string().contains(".ncurc.json"));
    }

    #[test]
    fn test_module_functions_on_axes() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            ".ncurc.cjs",
            r#"module.exports = {
                filter: name => name.endsWith('-tag'),
                rejectVersion: /^0\./,
                reject: ['left-pad', /^@internal\//],
                jsonUpgraded: true,
            }"#,
        );

        let layer = load(&path).unwrap();
        let Some(OptionValue::Predicate(filter)) = layer.get("filter") else {
            panic!("filter should be a predicate");
        };
        assert!(filter.call(CallbackInput::Name("ncu-test-tag")).unwrap());
        assert!(!filter.call(CallbackInput::Name("ncu-test-v2")).unwrap());

        let Some(OptionValue::Pattern(pattern)) = layer.get("rejectVersion") else {
            panic!("rejectVersion should be a pattern");
        };
        assert!(pattern.is_match("0.1.0"));

        assert_eq!(
            layer.get("reject"),
            Some(&OptionValue::List(vec!["left-pad".into(), "/^@internal\\//".into()]))
        );
        assert_eq!(layer.get("jsonUpgraded"), Some(&OptionValue::bool(true)));
    }

    #[test]
    fn test_function_outside_axes_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, ".ncurc.js", "module.exports = { deep: () => true }");

        let err = load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_module_syntax_error() {
        let dir = TempDir::new().unwrap();
        let err = load(&write(&dir, ".ncurc.js", "module.exports = {")).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_deeply_nested_module_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let source = format!("module.exports = {{ x: {}{} }}", "[".repeat(150), "]".repeat(150));
        let err = load(&write(&dir, ".ncurc.js", &source)).unwrap_err();
        match err {
            ConfigError::ParseError { path, message } => {
                assert!(path.ends_with(".ncurc.js"));
                assert!(message.contains("nesting too deep"), "{message}");
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_undefined_module_values_skipped() {
        let dir = TempDir::new().unwrap();
        let layer = load(&write(&dir, ".ncurc.js", "module.exports = { filter: undefined }")).unwrap();
        assert!(layer.is_empty());
    }
}
