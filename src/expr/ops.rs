//! Operator, property and method semantics over JSON values.
//!
//! Follows JavaScript rules where JSON can represent the result; anything
//! that would produce `NaN` or an infinity is reported as an error instead.

use serde_json::{Number as JsonNumber, Value as JsonValue};

use super::eval::RuntimeError;
use super::parser::{BinaryOp, UnaryOp};

/// Converts `value` into a JSON number, using an integer when it is integral.
pub(crate) fn json_number(value: f64) -> Option<JsonValue> {
    if value.fract() == 0.0 && value >= i64::MIN as f64 && value < i64::MAX as f64 {
        return Some(JsonValue::Number(JsonNumber::from(value as i64)));
    }
    JsonNumber::from_f64(value).map(JsonValue::Number)
}

pub(crate) fn number(value: f64) -> Result<JsonValue, RuntimeError> {
    json_number(value)
        .ok_or_else(|| RuntimeError::Arithmetic(format!("invalid numeric result {value}")))
}

pub fn truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|v| v != 0.0),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(_) | JsonValue::Object(_) => true,
    }
}

pub fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "boolean",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

/// String conversion used by `+` concatenation, `join` and `toString`.
pub fn to_display_string(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "null".to_string(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => {
            if n.is_f64() {
                format_f64(n.as_f64().unwrap_or_default())
            } else {
                n.to_string()
            }
        }
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(items) => items
            .iter()
            .map(|item| match item {
                JsonValue::Null => String::new(),
                other => to_display_string(other),
            })
            .collect::<Vec<_>>()
            .join(","),
        JsonValue::Object(_) => value.to_string(),
    }
}

fn format_f64(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e21 {
        format!("{v:.0}")
    } else {
        v.to_string()
    }
}

pub fn to_f64(value: &JsonValue) -> Result<f64, RuntimeError> {
    match value {
        JsonValue::Null => Ok(0.0),
        JsonValue::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
        JsonValue::Number(n) => n
            .as_f64()
            .ok_or_else(|| RuntimeError::Type(format!("number {n} is out of range"))),
        JsonValue::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(0.0);
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| RuntimeError::Type(format!("cannot convert string '{s}' to a number")))
        }
        other => Err(RuntimeError::Type(format!(
            "expected number, got {}",
            type_name(other)
        ))),
    }
}

fn to_int32(value: &JsonValue) -> Result<i32, RuntimeError> {
    Ok(to_uint32(value)? as i32)
}

fn to_uint32(value: &JsonValue) -> Result<u32, RuntimeError> {
    let v = to_f64(value)?;
    if !v.is_finite() {
        return Ok(0);
    }
    Ok(v.trunc().rem_euclid(4_294_967_296.0) as u32)
}

pub fn unary(op: UnaryOp, value: &JsonValue) -> Result<JsonValue, RuntimeError> {
    match op {
        UnaryOp::Neg => number(-to_f64(value)?),
        UnaryOp::Plus => number(to_f64(value)?),
        UnaryOp::Not => Ok(JsonValue::Bool(!truthy(value))),
        UnaryOp::BitNot => number(f64::from(!to_int32(value)?)),
        UnaryOp::TypeOf | UnaryOp::Void | UnaryOp::Delete => Err(RuntimeError::Type(format!(
            "operator '{}' is not supported",
            op.symbol().trim_end()
        ))),
    }
}

pub fn binary(op: BinaryOp, left: &JsonValue, right: &JsonValue) -> Result<JsonValue, RuntimeError> {
    match op {
        BinaryOp::Add => {
            if left.is_string() || right.is_string() {
                Ok(JsonValue::String(format!(
                    "{}{}",
                    to_display_string(left),
                    to_display_string(right)
                )))
            } else {
                number(to_f64(left)? + to_f64(right)?)
            }
        }
        BinaryOp::Sub => number(to_f64(left)? - to_f64(right)?),
        BinaryOp::Mul => number(to_f64(left)? * to_f64(right)?),
        BinaryOp::Div => {
            let rhs = to_f64(right)?;
            if rhs == 0.0 {
                return Err(RuntimeError::Arithmetic("division by zero".to_string()));
            }
            number(to_f64(left)? / rhs)
        }
        BinaryOp::Mod => {
            let rhs = to_f64(right)?;
            if rhs == 0.0 {
                return Err(RuntimeError::Arithmetic("modulo by zero".to_string()));
            }
            number(to_f64(left)? % rhs)
        }
        BinaryOp::Eq => Ok(JsonValue::Bool(loose_eq(left, right))),
        BinaryOp::NotEq => Ok(JsonValue::Bool(!loose_eq(left, right))),
        BinaryOp::StrictEq => Ok(JsonValue::Bool(strict_eq(left, right))),
        BinaryOp::StrictNotEq => Ok(JsonValue::Bool(!strict_eq(left, right))),
        BinaryOp::Lt => compare(left, right, |o| o.is_lt()),
        BinaryOp::Lte => compare(left, right, |o| o.is_le()),
        BinaryOp::Gt => compare(left, right, |o| o.is_gt()),
        BinaryOp::Gte => compare(left, right, |o| o.is_ge()),
        BinaryOp::Shl => number(f64::from(
            to_int32(left)?.wrapping_shl(to_uint32(right)? & 31),
        )),
        BinaryOp::Shr => number(f64::from(
            to_int32(left)?.wrapping_shr(to_uint32(right)? & 31),
        )),
        BinaryOp::UShr => number(f64::from(
            to_uint32(left)?.wrapping_shr(to_uint32(right)? & 31),
        )),
        BinaryOp::BitAnd => number(f64::from(to_int32(left)? & to_int32(right)?)),
        BinaryOp::BitOr => number(f64::from(to_int32(left)? | to_int32(right)?)),
        BinaryOp::BitXor => number(f64::from(to_int32(left)? ^ to_int32(right)?)),
        BinaryOp::In | BinaryOp::InstanceOf => Err(RuntimeError::Type(format!(
            "operator '{}' is not supported",
            op.symbol()
        ))),
    }
}

fn compare(
    left: &JsonValue,
    right: &JsonValue,
    accept: fn(std::cmp::Ordering) -> bool,
) -> Result<JsonValue, RuntimeError> {
    let ordering = match (left, right) {
        (JsonValue::String(a), JsonValue::String(b)) => Some(a.cmp(b)),
        _ => to_f64(left)?.partial_cmp(&to_f64(right)?),
    };
    Ok(JsonValue::Bool(ordering.is_some_and(accept)))
}

/// `===`: same type and same value; numbers compare numerically.
pub fn strict_eq(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Number(a), JsonValue::Number(b)) => a.as_f64() == b.as_f64(),
        _ => left == right,
    }
}

/// `==`: like `===`, but primitives of different types are compared as numbers.
pub fn loose_eq(left: &JsonValue, right: &JsonValue) -> bool {
    match (left, right) {
        (JsonValue::Null, JsonValue::Null) => true,
        (JsonValue::Null, _) | (_, JsonValue::Null) => false,
        (JsonValue::Number(_), JsonValue::String(_))
        | (JsonValue::String(_), JsonValue::Number(_))
        | (JsonValue::Bool(_), _)
        | (_, JsonValue::Bool(_))
            if is_primitive(left) && is_primitive(right) =>
        {
            match (to_f64(left), to_f64(right)) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
        }
        _ => strict_eq(left, right),
    }
}

fn is_primitive(value: &JsonValue) -> bool {
    !matches!(value, JsonValue::Array(_) | JsonValue::Object(_))
}

/// Reads `key` from `object`; missing keys on containers read as `null`.
pub fn get_property(object: &JsonValue, key: &JsonValue) -> Result<JsonValue, RuntimeError> {
    let name = to_display_string(key);
    match object {
        JsonValue::Object(map) => Ok(map.get(&name).cloned().unwrap_or(JsonValue::Null)),
        JsonValue::Array(items) => {
            if name == "length" {
                return number(items.len() as f64);
            }
            Ok(index_of_key(key, &name)
                .and_then(|i| items.get(i).cloned())
                .unwrap_or(JsonValue::Null))
        }
        JsonValue::String(s) => {
            if name == "length" {
                return number(s.chars().count() as f64);
            }
            Ok(index_of_key(key, &name)
                .and_then(|i| s.chars().nth(i))
                .map(|c| JsonValue::String(c.to_string()))
                .unwrap_or(JsonValue::Null))
        }
        other => Err(RuntimeError::NotAnObject {
            property: name,
            found: type_name(other),
        }),
    }
}

fn index_of_key(key: &JsonValue, name: &str) -> Option<usize> {
    match key {
        JsonValue::Number(n) => n.as_u64().and_then(|v| usize::try_from(v).ok()),
        _ => name.parse::<usize>().ok(),
    }
}

/// Calls a built-in method on a value (`(1.5).toFixed(2)`, `"a".toUpperCase()`).
pub fn call_method(
    receiver: &JsonValue,
    method: &JsonValue,
    args: &[JsonValue],
) -> Result<JsonValue, RuntimeError> {
    let name = to_display_string(method);
    let arg = |i: usize| args.get(i).unwrap_or(&JsonValue::Null);

    match (receiver, name.as_str()) {
        (JsonValue::Null, _) => Err(RuntimeError::NotAnObject {
            property: name,
            found: "null",
        }),
        (JsonValue::Number(_), "toFixed") => {
            let value = to_f64(receiver)?;
            let digits = to_f64(arg(0))?;
            if !(0.0..=100.0).contains(&digits) {
                return Err(RuntimeError::Type(format!(
                    "toFixed() digits argument must be between 0 and 100, got {digits}"
                )));
            }
            Ok(JsonValue::String(format!("{:.*}", digits as usize, value)))
        }
        (_, "toString") => Ok(JsonValue::String(to_display_string(receiver))),
        (JsonValue::String(s), _) => string_method(s, &name, args),
        (JsonValue::Array(items), _) => array_method(items, &name, args),
        (other, _) => Err(RuntimeError::NotCallable(format!(
            "{}.{name}",
            type_name(other)
        ))),
    }
}

fn string_method(s: &str, name: &str, args: &[JsonValue]) -> Result<JsonValue, RuntimeError> {
    let text_arg = |i: usize| args.get(i).map(to_display_string).unwrap_or_default();
    match name {
        "toUpperCase" => Ok(JsonValue::String(s.to_uppercase())),
        "toLowerCase" => Ok(JsonValue::String(s.to_lowercase())),
        "trim" => Ok(JsonValue::String(s.trim().to_string())),
        "includes" => Ok(JsonValue::Bool(s.contains(&text_arg(0)))),
        "startsWith" => Ok(JsonValue::Bool(s.starts_with(&text_arg(0)))),
        "endsWith" => Ok(JsonValue::Bool(s.ends_with(&text_arg(0)))),
        "indexOf" => {
            let needle = text_arg(0);
            let idx = s
                .find(&needle)
                .map(|byte| s[..byte].chars().count() as f64)
                .unwrap_or(-1.0);
            number(idx)
        }
        "slice" => {
            let chars: Vec<char> = s.chars().collect();
            let (start, end) = slice_bounds(chars.len(), args)?;
            Ok(JsonValue::String(chars[start..end].iter().collect()))
        }
        _ => Err(RuntimeError::NotCallable(format!("string.{name}"))),
    }
}

fn array_method(
    items: &[JsonValue],
    name: &str,
    args: &[JsonValue],
) -> Result<JsonValue, RuntimeError> {
    let needle = args.first().unwrap_or(&JsonValue::Null);
    match name {
        "includes" => Ok(JsonValue::Bool(
            items.iter().any(|item| strict_eq(item, needle)),
        )),
        "indexOf" => number(
            items
                .iter()
                .position(|item| strict_eq(item, needle))
                .map(|i| i as f64)
                .unwrap_or(-1.0),
        ),
        "join" => {
            let separator = match args.first() {
                None | Some(JsonValue::Null) => ",".to_string(),
                Some(sep) => to_display_string(sep),
            };
            Ok(JsonValue::String(
                items
                    .iter()
                    .map(|item| match item {
                        JsonValue::Null => String::new(),
                        other => to_display_string(other),
                    })
                    .collect::<Vec<_>>()
                    .join(&separator),
            ))
        }
        "slice" => {
            let (start, end) = slice_bounds(items.len(), args)?;
            Ok(JsonValue::Array(items[start..end].to_vec()))
        }
        _ => Err(RuntimeError::NotCallable(format!("array.{name}"))),
    }
}

/// Resolves `slice(start, end)` arguments, counting negatives from the end.
fn slice_bounds(len: usize, args: &[JsonValue]) -> Result<(usize, usize), RuntimeError> {
    let resolve = |value: Option<&JsonValue>, default: usize| -> Result<usize, RuntimeError> {
        match value {
            None | Some(JsonValue::Null) => Ok(default),
            Some(v) => {
                let raw = to_f64(v)?.trunc();
                let len_f = len as f64;
                let idx = if raw < 0.0 {
                    (len_f + raw).max(0.0)
                } else {
                    raw.min(len_f)
                };
                Ok(idx as usize)
            }
        }
    };
    let start = resolve(args.first(), 0)?;
    let end = resolve(args.get(1), len)?;
    Ok((start, end.max(start)))
}
