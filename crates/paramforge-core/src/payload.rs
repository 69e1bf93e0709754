//! Payload compilation — flatten an instance tree into a request body.
//!
//! Disabled and keyless nodes are skipped. Scalar values are cast by type:
//! string-like types stay strings, `boolean` normalizes `"true"`/`"false"`,
//! numeric types parse numeric strings, and anything else (`select`, `json`,
//! dynamic formats without a string pin) goes through a best-effort heuristic.

use serde_json::{Map, Value};

use crate::field_type::FieldType;
use crate::instance::InstanceNode;
use crate::resolver::constraints::numeric_or_none;

/// Compile enabled nodes into a JSON object.
pub fn compile_payload(nodes: &[InstanceNode]) -> Value {
    let mut out = Map::new();
    for node in nodes {
        if !node.enabled || node.key.is_empty() {
            continue;
        }
        out.insert(node.key.clone(), compile_value(node));
    }
    Value::Object(out)
}

fn compile_value(node: &InstanceNode) -> Value {
    match node.field_type {
        FieldType::Object => compile_payload(&node.children),
        FieldType::Array => Value::Array(
            node.children
                .iter()
                .filter(|c| c.enabled)
                .map(compile_value)
                .collect(),
        ),
        _ => cast_scalar(&node.value, &node.field_type),
    }
}

/// Cast a raw editor value according to its field type.
///
/// Null and empty strings pass through unchanged.
pub fn cast_scalar(value: &Value, field_type: &FieldType) -> Value {
    if matches!(value, Value::Null) || matches!(value, Value::String(s) if s.is_empty()) {
        return value.clone();
    }

    if field_type.is_string_pinned() {
        return match value {
            Value::Number(n) => Value::String(n.to_string()),
            Value::Bool(b) => Value::String(b.to_string()),
            other => other.clone(),
        };
    }

    if *field_type == FieldType::Boolean {
        return Value::Bool(match value {
            Value::Bool(b) => *b,
            Value::String(s) if s == "false" => false,
            Value::String(_) => true,
            Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
            _ => true,
        });
    }

    match value {
        Value::String(s) if !field_type.is_numeric() && s == "true" => Value::Bool(true),
        Value::String(s) if !field_type.is_numeric() && s == "false" => Value::Bool(false),
        Value::String(s) => numeric_or_none(s)
            .map(Value::Number)
            .unwrap_or_else(|| value.clone()),
        other => other.clone(),
    }
}
