//! Evaluator for executable config modules.
//!
//! `.ncurc.js` and `.ncurc.cjs` files are small CommonJS/ESM modules whose
//! exported object may hold plain data as well as predicate functions:
//!
//! ```text
//! module.exports = {
//!   jsonUpgraded: true,
//!   reject: ['left-pad', /^@internal\//],
//!   filterResults: (name, { upgradedVersion }) => !upgradedVersion.includes('-'),
//! }
//! ```
//!
//! Only the expression subset needed by such files is supported. Every call to
//! [`evaluate_module`] starts from an empty scope, so evaluating the same source
//! twice never shares state.

mod error;
mod eval;
mod lexer;
mod parser;
mod value;

pub use error::ScriptError;
pub use value::{Function, RegexValue, Value};

use eval::Scope;

/// Evaluate module source and return its exported value.
pub fn evaluate_module(source: &str) -> Result<Value, ScriptError> {
    let export = parser::parse_module(source)?;
    eval::evaluate(&export, &Scope::default())
}

/// Evaluate a standalone expression, e.g. a predicate written inline.
pub fn evaluate_expression(source: &str) -> Result<Value, ScriptError> {
    let expr = parser::parse_expression(source)?;
    eval::evaluate(&expr, &Scope::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exports(src: &str) -> std::collections::BTreeMap<String, Value> {
        match evaluate_module(src).unwrap() {
            Value::Object(map) => map,
            other => panic!("expected object export, got {other:?}"),
        }
    }

    #[test]
    fn test_commonjs_data_module() {
        let map = exports(r#"module.exports = { "filter": "ncu-test-v2" }"#);
        assert_eq!(map["filter"].as_str(), Some("ncu-test-v2"));
    }

    #[test]
    fn test_function_values_stay_callable() {
        let map = exports(
            "module.exports = {
                filter: name => name.endsWith('tag')
            }",
        );
        let filter = map["filter"].as_function().unwrap();
        assert_eq!(filter.arity(), 1);
        assert!(filter.call(&["ncu-test-tag".into()]).unwrap().is_truthy());
        assert!(!filter.call(&["ncu-test-v2".into()]).unwrap().is_truthy());
    }

    #[test]
    fn test_esm_default_export() {
        let map = exports("export default { rejectVersion: v => v === '1.0.0' }");
        assert!(map["rejectVersion"].as_function().is_some());
    }

    #[test]
    fn test_each_evaluation_is_isolated() {
        let src = "module.exports = { reject: ['a'] }";
        let first = exports(src);
        let second = exports(src);
        assert_eq!(first["reject"].to_json().unwrap(), second["reject"].to_json().unwrap());
    }

    #[test]
    fn test_syntax_error_has_position() {
        let err = evaluate_module("module.exports = { filter: }").unwrap_err();
        assert!(matches!(err, ScriptError::Syntax { line: 1, .. }));
    }

    #[test]
    fn test_evaluate_expression() {
        let value = evaluate_expression("v => v.startsWith('1.')").unwrap();
        let f = value.as_function().unwrap();
        assert!(f.call(&["1.2.3".into()]).unwrap().is_truthy());
    }
}
