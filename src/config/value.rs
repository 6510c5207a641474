//! Option values.
//!
//! Options come from JSON/YAML data, command-line strings and executable
//! modules, so a value is a tagged union rather than a plain JSON value:
//! predicate axes may hold live callbacks or compiled regex literals.

use std::fmt;
use std::sync::Arc;

use ncu_script::{Function, RegexValue, Value as ScriptValue};

use crate::dependency::VersionInfo;

/// Scalar option value.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    String(String),
    Bool(bool),
    Number(f64),
}

/// A regular expression written as a literal in a config module.
#[derive(Debug, Clone)]
pub struct Pattern(Arc<RegexValue>);

impl Pattern {
    /// Compile `/pattern/flags` text. Returns `None` if the text is not slash-delimited.
    pub fn parse(text: &str) -> Option<Result<Self, ncu_script::ScriptError>> {
        let (pattern, flags) = split_regex_literal(text)?;
        Some(RegexValue::new(pattern, flags).map(|r| Pattern(Arc::new(r))))
    }

    pub fn is_match(&self, subject: &str) -> bool {
        self.0.is_match(subject)
    }

    /// The literal as written.
    pub fn source(&self) -> String {
        self.0.literal()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.0.literal() == other.0.literal()
    }
}

impl From<Arc<RegexValue>> for Pattern {
    fn from(regex: Arc<RegexValue>) -> Self {
        Pattern(regex)
    }
}

/// Split `/pattern/flags` into its parts.
pub(crate) fn split_regex_literal(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('/')?;
    let close = rest.rfind('/')?;
    let (pattern, flags) = (&rest[..close], &rest[close + 1..]);
    if pattern.is_empty() || !flags.chars().all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some((pattern, flags))
}

/// What a callback is asked to decide on.
#[derive(Debug, Clone, Copy)]
pub enum CallbackInput<'a> {
    /// `filter` / `reject`: the package name.
    Name(&'a str),
    /// `filterVersion` / `rejectVersion`: the current version string.
    Version(&'a str),
    /// `filterResults`: the name and the resolved version record.
    Result {
        name: &'a str,
        info: VersionInfo<'a>,
    },
}

/// Failure raised from inside a callback.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{0}")]
pub struct CallbackError(pub String);

type CallbackFn = dyn Fn(CallbackInput<'_>) -> Result<bool, CallbackError> + Send + Sync;

/// A user-supplied predicate function.
#[derive(Clone)]
pub struct Callback {
    label: String,
    func: Arc<CallbackFn>,
}

impl Callback {
    pub fn new(
        label: impl Into<String>,
        func: impl Fn(CallbackInput<'_>) -> Result<bool, CallbackError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            func: Arc::new(func),
        }
    }

    /// Callback over a single string argument (name or version).
    pub fn from_str_fn(label: impl Into<String>, f: impl Fn(&str) -> bool + Send + Sync + 'static) -> Self {
        Self::new(label, move |input| match input {
            CallbackInput::Name(s) | CallbackInput::Version(s) => Ok(f(s)),
            CallbackInput::Result { name, .. } => Ok(f(name)),
        })
    }

    /// Callback over a name and its resolved version record.
    pub fn from_result_fn(
        label: impl Into<String>,
        f: impl Fn(&str, VersionInfo<'_>) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::new(label, move |input| match input {
            CallbackInput::Result { name, info } => Ok(f(name, info)),
            CallbackInput::Name(_) | CallbackInput::Version(_) => Err(CallbackError(
                "result callback invoked without a version record".to_string(),
            )),
        })
    }

    /// Wrap a function exported by a config module. The return value is
    /// coerced with JavaScript truthiness.
    pub fn from_script(label: impl Into<String>, function: Arc<Function>) -> Self {
        Self::new(label, move |input| {
            let args: Vec<ScriptValue> = match input {
                CallbackInput::Name(s) | CallbackInput::Version(s) => vec![s.into()],
                CallbackInput::Result { name, info } => {
                    vec![name.into(), ScriptValue::from_json(&info.to_json(name))]
                }
            };
            function
                .call(&args)
                .map(|v| v.is_truthy())
                .map_err(|e| CallbackError(e.to_string()))
        })
    }

    pub fn call(&self, input: CallbackInput<'_>) -> Result<bool, CallbackError> {
        (self.func)(input)
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.func, &other.func)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function {}]", self.label)
    }
}

/// A single option's value.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Literal(Literal),
    /// List of strings, each a literal, wildcard or `/regex/`.
    List(Vec<String>),
    Pattern(Pattern),
    Predicate(Callback),
    /// Any other structured data, kept as authored.
    Data(serde_json::Value),
}

impl OptionValue {
    pub fn string(s: impl Into<String>) -> Self {
        OptionValue::Literal(Literal::String(s.into()))
    }

    pub fn bool(b: bool) -> Self {
        OptionValue::Literal(Literal::Bool(b))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            OptionValue::Literal(Literal::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Literal(Literal::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            OptionValue::Literal(Literal::String(_)) => "string",
            OptionValue::Literal(Literal::Bool(_)) => "boolean",
            OptionValue::Literal(Literal::Number(_)) => "number",
            OptionValue::List(_) => "list",
            OptionValue::Pattern(_) => "regular expression",
            OptionValue::Predicate(_) => "function",
            OptionValue::Data(_) => "data",
        }
    }

    /// Convert parsed JSON/YAML data.
    pub fn from_json(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::String(s) => OptionValue::string(s),
            serde_json::Value::Bool(b) => OptionValue::bool(b),
            serde_json::Value::Number(n) => match n.as_f64() {
                Some(f) => OptionValue::Literal(Literal::Number(f)),
                None => OptionValue::Data(serde_json::Value::Number(n)),
            },
            serde_json::Value::Array(items) if items.iter().all(|v| v.is_string()) => OptionValue::List(
                items
                    .into_iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect(),
            ),
            other => OptionValue::Data(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_shapes() {
        assert_eq!(OptionValue::from_json(json!("x")), OptionValue::string("x"));
        assert_eq!(OptionValue::from_json(json!(false)), OptionValue::bool(false));
        assert_eq!(
            OptionValue::from_json(json!(["a", "b"])),
            OptionValue::List(vec!["a".into(), "b".into()])
        );
        assert_eq!(
            OptionValue::from_json(json!({"nested": 1})),
            OptionValue::Data(json!({"nested": 1}))
        );
    }

    #[test]
    fn test_split_regex_literal() {
        assert_eq!(split_regex_literal("/^ncu-/i"), Some(("^ncu-", "i")));
        assert_eq!(split_regex_literal("/a/b/"), Some(("a/b", "")));
        assert_eq!(split_regex_literal("ncu-test"), None);
        assert_eq!(split_regex_literal("//"), None);
        assert_eq!(split_regex_literal("/a/1"), None);
    }

    #[test]
    fn test_pattern_parse() {
        let pattern = Pattern::parse("/tag$/").unwrap().unwrap();
        assert!(pattern.is_match("ncu-test-tag"));
        assert!(!pattern.is_match("ncu-test-v2"));
        assert!(Pattern::parse("plain").is_none());
    }

    #[test]
    fn test_callback_equality_is_identity() {
        let a = Callback::from_str_fn("a", |s| s.is_empty());
        let b = Callback::from_str_fn("a", |s| s.is_empty());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn test_script_callback_truthiness() {
        let exported = ncu_script::evaluate_expression("name => name.length").unwrap();
        let callback = Callback::from_script("filter", exported.as_function().unwrap().clone());
        assert!(callback.call(CallbackInput::Name("abc")).unwrap());
        assert!(!callback.call(CallbackInput::Name("")).unwrap());
    }

    #[test]
    fn test_script_callback_error() {
        let exported = ncu_script::evaluate_expression("name => name.nope()").unwrap();
        let callback = Callback::from_script("reject", exported.as_function().unwrap().clone());
        let err = callback.call(CallbackInput::Name("abc")).unwrap_err();
        assert!(err.0.contains("is not a function"));
    }
}
