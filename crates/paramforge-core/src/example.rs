//! Schema inference from a JSON example payload.
//!
//! Used for documented responses, where only a sample body exists. Types are
//! read from the values: numbers become `number`, booleans `boolean`, and
//! everything else `text`. Lists are described by their first element.

use serde_json::{Map, Value};

use crate::config::CompileOptions;
use crate::field_type::FieldType;
use crate::key_pattern::is_pattern_key;
use crate::schema::SchemaNode;
use crate::tree::SchemaTreeBuilder;

/// Description attached to every inferred node.
pub const EXAMPLE_DESCRIPTION: &str = "Auto-extracted from example";

impl SchemaTreeBuilder<'_> {
    /// Infer a schema tree from an example value.
    ///
    /// A root array is described by its first element; a scalar root has no
    /// fields. Keys ending in the wildcard are flagged as patterns.
    pub fn from_example(example: &Value, options: &CompileOptions) -> Vec<SchemaNode> {
        match example {
            Value::Object(map) => object_fields(map, options),
            Value::Array(items) => match items.first() {
                Some(first @ (Value::Object(_) | Value::Array(_))) => {
                    Self::from_example(first, options)
                }
                _ => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

fn object_fields(map: &Map<String, Value>, options: &CompileOptions) -> Vec<SchemaNode> {
    map.iter()
        .map(|(key, value)| example_node(key, value, options))
        .collect()
}

fn example_node(key: &str, value: &Value, options: &CompileOptions) -> SchemaNode {
    let mut node = SchemaNode {
        nullable: value.is_null(),
        is_pattern: is_pattern_key(key, &options.wildcard),
        description: Some(EXAMPLE_DESCRIPTION.to_string()),
        ..SchemaNode::new(key, scalar_type(value))
    };

    match value {
        Value::Object(map) => {
            node.field_type = FieldType::Object;
            node.schema = Some(object_fields(map, options));
        }
        Value::Array(items) => match items.first() {
            Some(first @ (Value::Object(_) | Value::Array(_))) => {
                node.field_type = FieldType::Object;
                node.is_list = true;
                node.schema = Some(SchemaTreeBuilder::from_example(first, options));
            }
            Some(first) => {
                node.field_type = FieldType::Array;
                node.child_type = Some(scalar_type(first));
            }
            None => {
                node.field_type = FieldType::Array;
                node.child_type = Some(FieldType::Text);
            }
        },
        _ => {}
    }

    node
}

fn scalar_type(value: &Value) -> FieldType {
    match value {
        Value::Number(_) => FieldType::Number,
        Value::Bool(_) => FieldType::Boolean,
        _ => FieldType::Text,
    }
}
