//! The compiled parameter schema tree.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::field_type::{FieldType, Shape};

/// Canonical description of one field.
///
/// Exactly one of `schema` (when `type` is `object`) and `child_type` (when
/// `type` is `array`) is populated; scalar nodes carry neither.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaNode {
    /// Leaf segment of the dot-notation path.
    pub key: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default)]
    pub min: Option<Number>,
    #[serde(default)]
    pub max: Option<Number>,
    #[serde(default)]
    pub pattern: Option<String>,
    /// Comma-joined dotted extensions, e.g. `.jpg,.png`.
    #[serde(default)]
    pub accept: Option<String>,
    #[serde(default)]
    pub dimensions: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub conditionals: Vec<Conditional>,
    /// Permissible values. `Some(vec![])` is an enumeration with no cases,
    /// distinct from `None`.
    #[serde(default)]
    pub options: Option<Vec<Value>>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_type: Option<FieldType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<SchemaNode>>,
    /// On an `object` node: a repeatable template, i.e. an array of objects.
    #[serde(default)]
    pub is_list: bool,
    /// The key is a template matched against runtime keys, not a literal name.
    #[serde(default)]
    pub is_pattern: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A conditional requirement or exclusion clause.
///
/// Single-field clauses (`required_if:role,admin`) populate `field` and
/// `value`; multi-field clauses (`required_with:a,b`) populate `fields`;
/// standalone clauses (`prohibited`) carry only `rule`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditional {
    pub rule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Conditional {
    pub fn standalone(rule: &str) -> Self {
        Self {
            rule: rule.to_string(),
            field: None,
            fields: None,
            value: None,
        }
    }
}

impl SchemaNode {
    /// A bare node of the given type.
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            field_type,
            ..Self::default()
        }
    }

    /// Structural class, treating a list-of-objects template as a list.
    pub fn shape(&self) -> Shape {
        if self.field_type == FieldType::Object && self.is_list {
            Shape::List
        } else {
            self.field_type.shape()
        }
    }

    /// This node's own metadata, without the nested `schema` subtree.
    pub fn field_meta(&self) -> SchemaNode {
        SchemaNode {
            key: self.key.clone(),
            field_type: self.field_type.clone(),
            required: self.required,
            nullable: self.nullable,
            confirmed: self.confirmed,
            min: self.min.clone(),
            max: self.max.clone(),
            pattern: self.pattern.clone(),
            accept: self.accept.clone(),
            dimensions: self.dimensions.clone(),
            conditionals: self.conditionals.clone(),
            options: self.options.clone(),
            rules: self.rules.clone(),
            child_type: self.child_type.clone(),
            schema: None,
            is_list: self.is_list,
            is_pattern: self.is_pattern,
            description: self.description.clone(),
        }
    }

    /// Child nodes of an object node (empty for anything else).
    pub fn children(&self) -> &[SchemaNode] {
        self.schema.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_schema_node_wire_shape() {
        let node = SchemaNode {
            child_type: Some(FieldType::Number),
            ..SchemaNode::new("courses", FieldType::Array)
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], json!("array"));
        assert_eq!(json["childType"], json!("number"));
        assert_eq!(json["isList"], json!(false));
        assert!(json.get("schema").is_none());
        assert_eq!(json["options"], Value::Null);
    }

    #[test]
    fn test_field_meta_drops_nested_fields_only() {
        let node = SchemaNode {
            required: true,
            is_list: true,
            schema: Some(vec![SchemaNode::new("sku", FieldType::Text)]),
            description: Some("Order lines".into()),
            ..SchemaNode::new("lines", FieldType::Object)
        };
        let meta = node.field_meta();
        assert_eq!(meta.schema, None);
        assert_eq!(meta.shape(), Shape::List);
        assert_eq!(
            meta,
            SchemaNode {
                schema: None,
                ..node
            }
        );
    }

    #[test]
    fn test_list_template_shape() {
        let node = SchemaNode {
            is_list: true,
            schema: Some(Vec::new()),
            ..SchemaNode::new("users", FieldType::Object)
        };
        assert_eq!(node.shape(), Shape::List);
    }
}
