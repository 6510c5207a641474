//! Built-in option table and defaults (lowest-precedence layer)
//!
//! Every recognized option is declared here with its kind. The kind drives
//! `--no-<name>` handling, validation and how rc values are interpreted.

use super::layer::{ConfigLayer, ConfigOrigin};
use super::value::OptionValue;

/// How an option's value is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    String,
    /// `filter`, `reject`, `filterVersion`, `rejectVersion`: string, list, regex or callback.
    Predicate,
    /// `filterResults`: callback only.
    ResultPredicate,
}

/// Default for an option; `None` means the option is unset unless a layer sets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefaultValue {
    None,
    Bool(bool),
    Str(&'static str),
}

/// A recognized option.
#[derive(Debug, Clone, Copy)]
pub struct OptionSpec {
    pub name: &'static str,
    pub kind: OptionKind,
    pub default: DefaultValue,
}

const fn opt(name: &'static str, kind: OptionKind, default: DefaultValue) -> OptionSpec {
    OptionSpec {
        name,
        kind,
        default,
    }
}

/// Recognized options.
pub const OPTIONS: &[OptionSpec] = &[
    opt("configFilePath", OptionKind::String, DefaultValue::None),
    opt("configFileName", OptionKind::String, DefaultValue::None),
    opt("mergeConfig", OptionKind::Bool, DefaultValue::Bool(false)),
    opt("cwd", OptionKind::String, DefaultValue::None),
    opt("packageFile", OptionKind::String, DefaultValue::None),
    opt("stdin", OptionKind::Bool, DefaultValue::Bool(false)),
    opt("filter", OptionKind::Predicate, DefaultValue::None),
    opt("reject", OptionKind::Predicate, DefaultValue::None),
    opt("filterVersion", OptionKind::Predicate, DefaultValue::None),
    opt("rejectVersion", OptionKind::Predicate, DefaultValue::None),
    opt("filterResults", OptionKind::ResultPredicate, DefaultValue::None),
    opt("dep", OptionKind::String, DefaultValue::Str("prod,dev,optional")),
    opt("jsonUpgraded", OptionKind::Bool, DefaultValue::Bool(false)),
    opt("jsonAll", OptionKind::Bool, DefaultValue::Bool(false)),
    opt("deep", OptionKind::Bool, DefaultValue::Bool(false)),
    opt("loglevel", OptionKind::String, DefaultValue::Str("warn")),
    opt("silent", OptionKind::Bool, DefaultValue::Bool(false)),
    opt("registry", OptionKind::String, DefaultValue::None),
];

/// Predicate axes in evaluation order.
pub const PREDICATE_AXES: &[&str] = &[
    "filter",
    "reject",
    "filterVersion",
    "rejectVersion",
    "filterResults",
];

/// Valid `loglevel` values, quietest first.
pub const LOG_LEVELS: &[&str] = &["silent", "error", "warn", "info", "verbose"];

/// Manifest sections selectable with `dep`.
pub const DEP_SECTIONS: &[&str] = &["prod", "dev", "optional", "peer"];

/// Look up a recognized option.
pub fn spec(name: &str) -> Option<&'static OptionSpec> {
    OPTIONS.iter().find(|o| o.name == name)
}

/// True if `name` is a boolean option (and so has a `--no-<name>` spelling).
pub fn is_boolean(name: &str) -> bool {
    spec(name).is_some_and(|o| o.kind == OptionKind::Bool)
}

/// True if `name` is one of the five predicate axes.
pub fn is_predicate_axis(name: &str) -> bool {
    PREDICATE_AXES.contains(&name)
}

/// Built-in defaults layer.
#[derive(Debug, Clone)]
pub struct BuiltinDefaults {
    options: &'static [OptionSpec],
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self { options: OPTIONS }
    }
}

impl BuiltinDefaults {
    /// Convert to a config layer for merging
    pub fn to_layer(&self) -> ConfigLayer {
        let mut layer = ConfigLayer::new(ConfigOrigin::Default);
        for option in self.options {
            let value = match option.default {
                DefaultValue::None => continue,
                DefaultValue::Bool(b) => OptionValue::bool(b),
                DefaultValue::Str(s) => OptionValue::string(s),
            };
            layer.insert(option.name, value);
        }
        layer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let layer = BuiltinDefaults::default().to_layer();
        assert_eq!(layer.get("jsonUpgraded"), Some(&OptionValue::bool(false)));
        assert_eq!(layer.get("deep"), Some(&OptionValue::bool(false)));
        assert_eq!(layer.get("dep"), Some(&OptionValue::string("prod,dev,optional")));
        assert_eq!(layer.get("loglevel"), Some(&OptionValue::string("warn")));
        assert_eq!(layer.get("filter"), None);
    }

    #[test]
    fn test_every_boolean_has_a_default() {
        for option in OPTIONS.iter().filter(|o| o.kind == OptionKind::Bool) {
            assert!(
                matches!(option.default, DefaultValue::Bool(_)),
                "{} has no boolean default",
                option.name
            );
        }
    }

    #[test]
    fn test_option_lookup() {
        assert!(is_boolean("jsonUpgraded"));
        assert!(!is_boolean("filter"));
        assert!(!is_boolean("unknown"));
        assert!(is_predicate_axis("rejectVersion"));
        assert_eq!(spec("filterResults").map(|o| o.kind), Some(OptionKind::ResultPredicate));
    }
}
