//! Two-way bridge between an instance tree and its raw JSON form.
//!
//! [`hydrate_from_json`] rebuilds the instance structure from a JSON value,
//! borrowing types and schema references from the existing tree where a key
//! matches. [`apply_json_edit`] wraps it with the guards a raw editor needs.

use serde_json::{Map, Value};

use crate::config::CompileOptions;
use crate::error::ParamError;
use crate::field_type::{FieldType, Shape};
use crate::instance::{ChildDef, InstanceNode};
use crate::key_pattern::matches_pattern;

/// Convert a JSON object into instance nodes.
///
/// Anything other than an object leaves `existing` unchanged.
pub fn hydrate_from_json(
    value: &Value,
    existing: &[InstanceNode],
    options: &CompileOptions,
) -> Vec<InstanceNode> {
    match value {
        Value::Object(map) => hydrate_object(map, existing, options),
        _ => existing.to_vec(),
    }
}

fn hydrate_object(
    map: &Map<String, Value>,
    existing: &[InstanceNode],
    options: &CompileOptions,
) -> Vec<InstanceNode> {
    map.iter()
        .map(|(key, value)| {
            let matched = find_existing(existing, key, &options.wildcard);
            hydrate_field(key, value, matched, options)
        })
        .collect()
}

fn find_existing<'e>(
    existing: &'e [InstanceNode],
    key: &str,
    wildcard: &str,
) -> Option<&'e InstanceNode> {
    existing.iter().find(|n| n.key == key).or_else(|| {
        existing.iter().find(|n| {
            n.schema
                .as_ref()
                .is_some_and(|s| s.is_pattern && matches_pattern(&s.key, key, wildcard))
        })
    })
}

fn hydrate_field(
    key: &str,
    value: &Value,
    existing: Option<&InstanceNode>,
    options: &CompileOptions,
) -> InstanceNode {
    let schema = existing.and_then(|e| e.schema.clone());

    let mut node = match value {
        Value::Null => InstanceNode::new(key, FieldType::Text),
        Value::Object(map) => {
            let mut node = InstanceNode::new(key, FieldType::Object);
            let prior = existing.map(|e| e.children.as_slice()).unwrap_or(&[]);
            node.children = hydrate_object(map, prior, options);
            node
        }
        Value::Array(items) => {
            let child_def = existing.and_then(|e| e.child_def.clone());
            let mut node = InstanceNode::new(key, FieldType::Array);
            node.children = items
                .iter()
                .map(|item| hydrate_item(item, child_def.as_ref(), options))
                .collect();
            node.child_def = child_def;
            node
        }
        scalar => {
            let field_type = scalar_type(scalar, existing.map(|e| &e.field_type));
            let mut node = InstanceNode::new(key, field_type);
            node.value = scalar.clone();
            node.enabled = existing.map_or(true, |e| e.enabled);
            node
        }
    };

    node.schema = schema;
    node
}

fn hydrate_item(
    item: &Value,
    child_def: Option<&ChildDef>,
    options: &CompileOptions,
) -> InstanceNode {
    match item {
        Value::Object(map) => {
            let template = child_def
                .filter(|d| d.field_type == FieldType::Object)
                .map(|d| d.new_item().children)
                .unwrap_or_default();
            let mut node = InstanceNode::new("", FieldType::Object);
            node.children = hydrate_object(map, &template, options);
            node
        }
        Value::Array(items) => {
            let mut node = InstanceNode::new("", FieldType::Array);
            node.children = items
                .iter()
                .map(|i| hydrate_item(i, None, options))
                .collect();
            node
        }
        Value::Null => InstanceNode::new("", FieldType::Text),
        scalar => {
            let mut node =
                InstanceNode::new("", scalar_type(scalar, child_def.map(|d| &d.field_type)));
            node.value = scalar.clone();
            node
        }
    }
}

/// Type of a scalar JSON value; strings keep a previously chosen scalar type.
fn scalar_type(value: &Value, previous: Option<&FieldType>) -> FieldType {
    match value {
        Value::Number(_) => FieldType::Number,
        Value::Bool(_) => FieldType::Boolean,
        _ => previous
            .filter(|t| t.shape() == Shape::Scalar)
            .cloned()
            .unwrap_or(FieldType::Text),
    }
}

/// Apply a raw JSON edit to `existing`, returning the replacement tree.
///
/// On error `existing` is untouched and the caller keeps its current tree.
pub fn apply_json_edit(
    text: &str,
    existing: &[InstanceNode],
    options: &CompileOptions,
) -> Result<Vec<InstanceNode>, ParamError> {
    if let Some(path) = first_file_path(existing, "") {
        return Err(ParamError::FileGuard { path });
    }

    let value: Value = serde_json::from_str(text).map_err(|e| ParamError::InvalidJson {
        message: e.to_string(),
    })?;

    let map = match &value {
        Value::Object(map) => map,
        other => {
            return Err(ParamError::NotAnObject {
                found: json_kind(other).to_string(),
            })
        }
    };

    if map.is_empty() && !existing.is_empty() {
        return Err(ParamError::EmptyEdit);
    }

    Ok(hydrate_object(map, existing, options))
}

fn first_file_path(nodes: &[InstanceNode], prefix: &str) -> Option<String> {
    nodes.iter().enumerate().find_map(|(i, n)| {
        let segment = if n.key.is_empty() {
            i.to_string()
        } else {
            n.key.clone()
        };
        let path = if prefix.is_empty() {
            segment
        } else {
            format!("{prefix}.{segment}")
        };
        if n.holds_file() {
            Some(path)
        } else {
            first_file_path(&n.children, &path)
        }
    })
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reconciler::reset_to_defaults;
    use crate::schema::SchemaNode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn opts() -> CompileOptions {
        CompileOptions::default()
    }

    #[test]
    fn test_hydrate_infers_types() {
        let tree = hydrate_from_json(
            &json!({"n": 1, "b": true, "s": "x", "z": null}),
            &[],
            &opts(),
        );
        let types: Vec<(&str, &FieldType)> =
            tree.iter().map(|n| (n.key.as_str(), &n.field_type)).collect();
        assert_eq!(
            types,
            vec![
                ("n", &FieldType::Number),
                ("b", &FieldType::Boolean),
                ("s", &FieldType::Text),
                ("z", &FieldType::Text),
            ]
        );
        assert_eq!(tree[3].value, json!(""));
    }

    #[test]
    fn test_hydrate_keeps_existing_string_type() {
        let existing = reset_to_defaults(&[SchemaNode::new("email", FieldType::Email)]);
        let tree = hydrate_from_json(&json!({"email": "a@b.c"}), &existing, &opts());
        assert_eq!(tree[0].field_type, FieldType::Email);
        assert!(tree[0].schema.is_some());
    }

    #[test]
    fn test_hydrate_pattern_key_reuses_schema() {
        let existing = reset_to_defaults(&[SchemaNode {
            is_pattern: true,
            ..SchemaNode::new("lang_*", FieldType::Password)
        }]);
        let tree = hydrate_from_json(&json!({"lang_en": "x"}), &existing, &opts());
        assert_eq!(tree[0].field_type, FieldType::Password);
    }

    #[test]
    fn test_hydrate_arrays_of_objects() {
        let existing = reset_to_defaults(&[SchemaNode {
            is_list: true,
            schema: Some(vec![SchemaNode::new("email", FieldType::Email)]),
            ..SchemaNode::new("users", FieldType::Object)
        }]);
        let tree = hydrate_from_json(
            &json!({"users": [{"email": "a@b.c"}], "ids": [1, 2]}),
            &existing,
            &opts(),
        );
        let users = &tree[0];
        assert_eq!(users.field_type, FieldType::Array);
        assert_eq!(users.children[0].field_type, FieldType::Object);
        assert_eq!(users.children[0].children[0].field_type, FieldType::Email);
        assert!(users.child_def.is_some());
        assert_eq!(tree[1].children[1].value, json!(2));
    }

    #[test]
    fn test_non_object_keeps_existing() {
        let existing = reset_to_defaults(&[SchemaNode::new("a", FieldType::Text)]);
        assert_eq!(hydrate_from_json(&json!([1]), &existing, &opts()), existing);
    }

    #[test]
    fn test_apply_json_edit_guards() {
        let existing = reset_to_defaults(&[SchemaNode::new("a", FieldType::Text)]);

        assert!(matches!(
            apply_json_edit("{not json", &existing, &opts()),
            Err(ParamError::InvalidJson { .. })
        ));
        assert!(matches!(
            apply_json_edit("[1, 2]", &existing, &opts()),
            Err(ParamError::NotAnObject { found }) if found == "array"
        ));
        assert!(matches!(
            apply_json_edit("{}", &existing, &opts()),
            Err(ParamError::EmptyEdit)
        ));
        assert!(apply_json_edit("{}", &[], &opts()).unwrap().is_empty());

        let tree = apply_json_edit(r#"{"a": "x", "b": 2}"#, &existing, &opts()).unwrap();
        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].value, json!("x"));
    }

    #[test]
    fn test_file_guard_names_path() {
        let mut docs = InstanceNode::new("docs", FieldType::Array);
        let mut file = InstanceNode::new("", FieldType::File);
        file.value = json!("scan.pdf");
        docs.children = vec![InstanceNode::new("", FieldType::File), file];

        let err = apply_json_edit(r#"{"a": 1}"#, &[docs], &opts()).unwrap_err();
        assert!(matches!(err, ParamError::FileGuard { ref path } if path == "docs.1"));
    }
}
