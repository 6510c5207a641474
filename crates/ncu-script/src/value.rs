//! Runtime values produced by evaluating a config module.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use regex_lite::Regex;

use crate::error::ScriptError;
use crate::eval::{self, Scope};
use crate::parser::{format_number, FunctionDef, Param};

/// A compiled regex literal, keeping its source text for display.
#[derive(Debug)]
pub struct RegexValue {
    pub pattern: String,
    pub flags: String,
    regex: Regex,
}

impl RegexValue {
    /// Compile a JavaScript-style regex literal.
    ///
    /// `i`, `m` and `s` map to inline flags; `g`, `u` and `y` have no effect
    /// on a single `test` and are accepted.
    pub fn new(pattern: &str, flags: &str) -> Result<Self, ScriptError> {
        let mut inline = String::new();
        for flag in flags.chars() {
            match flag {
                'i' | 'm' | 's' => inline.push(flag),
                'g' | 'u' | 'y' => {}
                other => {
                    return Err(ScriptError::Regex {
                        pattern: pattern.to_string(),
                        flags: flags.to_string(),
                        message: format!("unsupported flag `{}`", other),
                    })
                }
            }
        }
        let body = unescape_slashes(pattern);
        let source = if inline.is_empty() {
            body
        } else {
            format!("(?{}){}", inline, body)
        };
        let regex = Regex::new(&source).map_err(|e| ScriptError::Regex {
            pattern: pattern.to_string(),
            flags: flags.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            pattern: pattern.to_string(),
            flags: flags.to_string(),
            regex,
        })
    }

    pub fn is_match(&self, haystack: &str) -> bool {
        self.regex.is_match(haystack)
    }

    /// The literal as written: `/pattern/flags`.
    pub fn literal(&self) -> String {
        format!("/{}/{}", self.pattern, self.flags)
    }
}

/// `\/` is required inside a JS regex literal but is not a regex escape.
fn unescape_slashes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some('/') => out.push('/'),
                Some(next) => {
                    out.push(c);
                    out.push(next);
                }
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// A function value: its definition plus the bindings visible where it was created.
pub struct Function {
    pub(crate) def: Arc<FunctionDef>,
    pub(crate) captured: Scope,
}

impl Function {
    /// Call the function with positional arguments. Missing arguments are `undefined`.
    pub fn call(&self, args: &[Value]) -> Result<Value, ScriptError> {
        let mut scope = self.captured.clone();
        for (i, param) in self.def.params.iter().enumerate() {
            let arg = args.get(i).cloned().unwrap_or(Value::Undefined);
            match param {
                Param::Ident(name) => scope.bind(name, arg),
                Param::Destructure(fields) => {
                    let object = match arg {
                        Value::Object(map) => map,
                        other => {
                            return Err(ScriptError::type_error(format!(
                                "Cannot destructure parameter of type {}",
                                other.type_name()
                            )))
                        }
                    };
                    for (key, binding) in fields {
                        let value = object.get(key).cloned().unwrap_or(Value::Undefined);
                        scope.bind(binding, value);
                    }
                }
            }
        }
        eval::evaluate(&self.def.body, &scope)
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.def.params.len()
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[Function ({} params)]", self.def.params.len())
    }
}

/// A value in the module's runtime.
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Regex(Arc<RegexValue>),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Function(Arc<Function>),
}

impl Value {
    /// JavaScript truthiness.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Regex(_) | Value::Array(_) | Value::Object(_) | Value::Function(_) => true,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Regex(_) => "regexp",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Arc<Function>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Convert plain data to JSON.
    ///
    /// Regex literals become their `/pattern/flags` text; functions and
    /// `undefined` have no JSON form and are rejected.
    pub fn to_json(&self) -> Result<serde_json::Value, ScriptError> {
        Ok(match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    serde_json::Value::from(*n as i64)
                } else {
                    serde_json::Number::from_f64(*n)
                        .map(serde_json::Value::Number)
                        .unwrap_or(serde_json::Value::Null)
                }
            }
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Regex(r) => serde_json::Value::String(r.literal()),
            Value::Array(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => {
                let mut out = serde_json::Map::new();
                for (key, value) in map {
                    out.insert(key.clone(), value.to_json()?);
                }
                serde_json::Value::Object(out)
            }
            Value::Undefined | Value::Function(_) => {
                return Err(ScriptError::type_error(format!(
                    "{} cannot be used as plain data",
                    self.type_name()
                )))
            }
        })
    }

    /// Build a runtime value from JSON, e.g. to pass a record to a callback.
    pub fn from_json(json: &serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => Value::Array(items.iter().map(Value::from_json).collect()),
            serde_json::Value::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// String conversion used by `==` coercion and error messages.
    pub(crate) fn to_display(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Regex(r) => r.literal(),
            Value::Array(items) => items
                .iter()
                .map(|v| match v {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_display(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(_) => "[Function]".to_string(),
        }
    }

    pub(crate) fn to_number(&self) -> f64 {
        match self {
            Value::Undefined => f64::NAN,
            Value::Null => 0.0,
            Value::Bool(b) => f64::from(u8::from(*b)),
            Value::Number(n) => *n,
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    0.0
                } else {
                    trimmed.parse().unwrap_or(f64::NAN)
                }
            }
            _ => f64::NAN,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<Option<String>> for Value {
    fn from(s: Option<String>) -> Self {
        s.map(Value::String).unwrap_or(Value::Undefined)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Undefined.is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(!Value::String(String::new()).is_truthy());
        assert!(!Value::Number(0.0).is_truthy());
        assert!(!Value::Number(f64::NAN).is_truthy());
        assert!(Value::String("0".into()).is_truthy());
        assert!(Value::Array(vec![]).is_truthy());
        assert!(Value::Object(BTreeMap::new()).is_truthy());
    }

    #[test]
    fn test_regex_flags() {
        let r = RegexValue::new("^NCU", "i").unwrap();
        assert!(r.is_match("ncu-test-v2"));
        assert_eq!(r.literal(), "/^NCU/i");
    }

    #[test]
    fn test_regex_unknown_flag() {
        assert!(matches!(
            RegexValue::new("a", "x"),
            Err(ScriptError::Regex { .. })
        ));
    }

    #[test]
    fn test_to_json_plain_data() {
        let mut map = BTreeMap::new();
        map.insert("jsonUpgraded".to_string(), Value::Bool(true));
        map.insert("timeout".to_string(), Value::Number(3000.0));
        map.insert(
            "reject".to_string(),
            Value::Array(vec![Value::String("a".into())]),
        );
        let json = Value::Object(map).to_json().unwrap();
        assert_eq!(json, json!({"jsonUpgraded": true, "timeout": 3000, "reject": ["a"]}));
    }

    #[test]
    fn test_to_json_rejects_undefined() {
        assert!(Value::Undefined.to_json().is_err());
    }

    #[test]
    fn test_from_json_object() {
        let value = Value::from_json(&json!({"currentVersion": "1.0.0"}));
        match value {
            Value::Object(map) => assert_eq!(map["currentVersion"].as_str(), Some("1.0.0")),
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn test_to_number_coercion() {
        assert_eq!(Value::String(" 42 ".into()).to_number(), 42.0);
        assert_eq!(Value::Bool(true).to_number(), 1.0);
        assert!(Value::String("1.0.0".into()).to_number().is_nan());
    }
}
