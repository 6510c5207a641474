//! Expression evaluator.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::ScriptError;
use crate::parser::{BinaryOp, Expr, LogicalOp, UnaryOp};
use crate::value::{Function, RegexValue, Value};

/// Variable bindings visible to an expression.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: BTreeMap<String, Value>,
}

impl Scope {
    pub fn bind(&mut self, name: &str, value: Value) {
        self.vars.insert(name.to_string(), value);
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }
}

/// Evaluate an expression in the given scope.
pub fn evaluate(expr: &Expr, scope: &Scope) -> Result<Value, ScriptError> {
    match expr {
        Expr::Undefined => Ok(Value::Undefined),
        Expr::Null => Ok(Value::Null),
        Expr::Bool(b) => Ok(Value::Bool(*b)),
        Expr::Number(n) => Ok(Value::Number(*n)),
        Expr::Str(s) => Ok(Value::String(s.clone())),
        Expr::Regex { pattern, flags } => Ok(Value::Regex(Arc::new(RegexValue::new(pattern, flags)?))),
        Expr::Array(items) => items
            .iter()
            .map(|item| evaluate(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Expr::Object(entries) => {
            let mut map = BTreeMap::new();
            for (key, value) in entries {
                map.insert(key.clone(), evaluate(value, scope)?);
            }
            Ok(Value::Object(map))
        }
        Expr::Ident(name) => scope
            .lookup(name)
            .cloned()
            .ok_or_else(|| ScriptError::Reference(name.clone())),
        Expr::Member { object, property } => {
            let receiver = evaluate(object, scope)?;
            get_property(&receiver, property)
        }
        Expr::Index { object, index } => {
            let receiver = evaluate(object, scope)?;
            let key = evaluate(index, scope)?;
            get_property(&receiver, &key.to_display())
        }
        Expr::Call { callee, args } => {
            let args = args
                .iter()
                .map(|arg| evaluate(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            match callee.as_ref() {
                Expr::Member { object, property } => {
                    let receiver = evaluate(object, scope)?;
                    call_method(&receiver, property, &args)
                }
                other => match evaluate(other, scope)? {
                    Value::Function(f) => f.call(&args),
                    value => Err(ScriptError::type_error(format!(
                        "{} is not a function",
                        value.type_name()
                    ))),
                },
            }
        }
        Expr::Unary { op, operand } => {
            let value = evaluate(operand, scope)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Neg => Value::Number(-value.to_number()),
            })
        }
        Expr::Binary { op, left, right } => {
            let left = evaluate(left, scope)?;
            let right = evaluate(right, scope)?;
            Ok(Value::Bool(compare(*op, &left, &right)))
        }
        Expr::Logical { op, left, right } => {
            let left = evaluate(left, scope)?;
            match (op, left.is_truthy()) {
                (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                _ => evaluate(right, scope),
            }
        }
        Expr::Conditional {
            test,
            consequent,
            alternate,
        } => {
            if evaluate(test, scope)?.is_truthy() {
                evaluate(consequent, scope)
            } else {
                evaluate(alternate, scope)
            }
        }
        Expr::Function(def) => Ok(Value::Function(Arc::new(Function {
            def: Arc::clone(def),
            captured: scope.clone(),
        }))),
    }
}

fn get_property(receiver: &Value, property: &str) -> Result<Value, ScriptError> {
    match receiver {
        Value::Undefined | Value::Null => Err(ScriptError::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            receiver.type_name(),
            property
        ))),
        Value::String(s) if property == "length" => Ok(Value::Number(s.chars().count() as f64)),
        Value::String(s) => Ok(property
            .parse::<usize>()
            .ok()
            .and_then(|i| s.chars().nth(i))
            .map(|c| Value::String(c.to_string()))
            .unwrap_or(Value::Undefined)),
        Value::Array(items) if property == "length" => Ok(Value::Number(items.len() as f64)),
        Value::Array(items) => Ok(property
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i).cloned())
            .unwrap_or(Value::Undefined)),
        Value::Object(map) => Ok(map.get(property).cloned().unwrap_or(Value::Undefined)),
        Value::Regex(r) => Ok(match property {
            "source" => Value::String(r.pattern.clone()),
            "flags" => Value::String(r.flags.clone()),
            _ => Value::Undefined,
        }),
        _ => Ok(Value::Undefined),
    }
}

fn string_arg(args: &[Value], method: &str) -> Result<String, ScriptError> {
    match args.first() {
        Some(Value::Regex(_)) => Err(ScriptError::type_error(format!(
            "first argument to String.prototype.{} must not be a regular expression",
            method
        ))),
        Some(v) => Ok(v.to_display()),
        None => Ok("undefined".to_string()),
    }
}

fn call_method(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, ScriptError> {
    match (receiver, method) {
        (Value::String(s), "startsWith") => Ok(Value::Bool(s.starts_with(&string_arg(args, method)?))),
        (Value::String(s), "endsWith") => Ok(Value::Bool(s.ends_with(&string_arg(args, method)?))),
        (Value::String(s), "includes") => Ok(Value::Bool(s.contains(&string_arg(args, method)?))),
        (Value::String(s), "toLowerCase") => Ok(Value::String(s.to_lowercase())),
        (Value::String(s), "toUpperCase") => Ok(Value::String(s.to_uppercase())),
        (Value::String(s), "trim") => Ok(Value::String(s.trim().to_string())),
        (Value::String(s), "split") => {
            let sep = string_arg(args, method)?;
            let parts = if sep.is_empty() {
                s.chars().map(|c| Value::String(c.to_string())).collect()
            } else {
                s.split(sep.as_str()).map(Value::from).collect()
            };
            Ok(Value::Array(parts))
        }
        (Value::Regex(r), "test") => {
            let subject = args.first().map(Value::to_display).unwrap_or_else(|| "undefined".into());
            Ok(Value::Bool(r.is_match(&subject)))
        }
        (Value::Array(items), "includes") => {
            let needle = args.first().cloned().unwrap_or(Value::Undefined);
            Ok(Value::Bool(items.iter().any(|item| strict_eq(item, &needle))))
        }
        (Value::Array(items), "some" | "every") => {
            let callback = match args.first() {
                Some(Value::Function(f)) => f,
                other => {
                    return Err(ScriptError::type_error(format!(
                        "{} is not a function",
                        other.map(Value::type_name).unwrap_or("undefined")
                    )))
                }
            };
            let want_any = method == "some";
            for (i, item) in items.iter().enumerate() {
                let hit = callback
                    .call(&[item.clone(), Value::Number(i as f64)])?
                    .is_truthy();
                if hit == want_any {
                    return Ok(Value::Bool(want_any));
                }
            }
            Ok(Value::Bool(!want_any))
        }
        (Value::Object(map), _) => match map.get(method) {
            Some(Value::Function(f)) => f.call(args),
            Some(other) => Err(ScriptError::type_error(format!(
                "object.{} is not a function ({})",
                method,
                other.type_name()
            ))),
            None => Err(ScriptError::type_error(format!("object.{} is not a function", method))),
        },
        (Value::Undefined | Value::Null, _) => Err(ScriptError::type_error(format!(
            "Cannot read properties of {} (reading '{}')",
            receiver.type_name(),
            method
        ))),
        _ => Err(ScriptError::type_error(format!(
            "{}.{} is not a function",
            receiver.type_name(),
            method
        ))),
    }
}

fn strict_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Regex(a), Value::Regex(b)) => Arc::ptr_eq(a, b),
        (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
        _ => false,
    }
}

fn loose_eq(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
        (Value::Undefined | Value::Null, _) | (_, Value::Undefined | Value::Null) => false,
        (Value::Number(_), Value::String(_))
        | (Value::String(_), Value::Number(_))
        | (Value::Bool(_), _)
        | (_, Value::Bool(_)) => left.to_number() == right.to_number(),
        _ => strict_eq(left, right),
    }
}

fn compare(op: BinaryOp, left: &Value, right: &Value) -> bool {
    match op {
        BinaryOp::StrictEq => strict_eq(left, right),
        BinaryOp::StrictNe => !strict_eq(left, right),
        BinaryOp::LooseEq => loose_eq(left, right),
        BinaryOp::LooseNe => !loose_eq(left, right),
        BinaryOp::Lt | BinaryOp::Lte | BinaryOp::Gt | BinaryOp::Gte => {
            let ordering = match (left, right) {
                (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
                _ => left.to_number().partial_cmp(&right.to_number()),
            };
            match ordering {
                None => false,
                Some(ord) => match op {
                    BinaryOp::Lt => ord.is_lt(),
                    BinaryOp::Lte => ord.is_le(),
                    BinaryOp::Gt => ord.is_gt(),
                    _ => ord.is_ge(),
                },
            }
        }
    }
}
