//! The editable instance tree.
//!
//! An [`InstanceNode`] is the user-facing realization of a [`SchemaNode`]:
//! it carries a value, an enable flag and children. A list-of-objects schema
//! node becomes an `array` instance whose elements are `object` nodes built
//! from the node's [`ChildDef`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::field_type::{FieldType, Shape};
use crate::schema::SchemaNode;

/// What a newly added array element looks like.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildDef {
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Item schema for lists of objects.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Vec<SchemaNode>>,
}

impl ChildDef {
    /// Child definition implied by a schema node, if it is list-shaped.
    pub fn for_schema(node: &SchemaNode) -> Option<Self> {
        match node.shape() {
            Shape::List if node.field_type == FieldType::Object => Some(Self {
                field_type: FieldType::Object,
                schema: Some(node.children().to_vec()),
            }),
            Shape::List => Some(Self {
                field_type: node.child_type.clone().unwrap_or_default(),
                schema: None,
            }),
            _ => None,
        }
    }

    /// A fresh, keyless element with default values.
    pub fn new_item(&self) -> InstanceNode {
        let mut item = InstanceNode::new("", self.field_type.clone());
        if self.field_type == FieldType::Object {
            item.children = crate::reconciler::reset_to_defaults(
                self.schema.as_deref().unwrap_or(&[]),
            );
        }
        item
    }
}

/// One editable field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceNode {
    pub key: String,
    #[serde(rename = "type", default)]
    pub field_type: FieldType,
    #[serde(default)]
    pub value: Value,
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,
    #[serde(default)]
    pub children: Vec<InstanceNode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub child_def: Option<ChildDef>,
    /// Metadata of the schema node this field was reconciled against, without
    /// its nested fields. Never persisted.
    #[serde(skip)]
    pub schema: Option<Arc<SchemaNode>>,
}

fn enabled_by_default() -> bool {
    true
}

/// Empty value for a freshly created field of `field_type`.
pub fn default_value(field_type: &FieldType) -> Value {
    match field_type {
        FieldType::Boolean => Value::Bool(false),
        FieldType::Object | FieldType::Array => Value::Null,
        _ => Value::String(String::new()),
    }
}

impl InstanceNode {
    /// An enabled node with the default value for its type.
    pub fn new(key: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            key: key.into(),
            value: default_value(&field_type),
            field_type,
            enabled: true,
            children: Vec::new(),
            child_def: None,
            schema: None,
        }
    }

    /// Default instance for a schema node, children included.
    pub fn from_schema(schema: &SchemaNode) -> Self {
        let field_type = match schema.shape() {
            Shape::List => FieldType::Array,
            _ => schema.field_type.clone(),
        };
        let mut node = Self::new(schema.key.as_str(), field_type);
        if node.field_type == FieldType::Object {
            node.children = crate::reconciler::reset_to_defaults(schema.children());
        }
        node.child_def = ChildDef::for_schema(schema);
        node.schema = Some(Arc::new(schema.field_meta()));
        node
    }

    pub fn shape(&self) -> Shape {
        self.field_type.shape()
    }

    /// Whether this node holds an attached file.
    pub fn holds_file(&self) -> bool {
        self.field_type == FieldType::File && !is_empty_value(&self.value)
    }

    /// Copy suitable for persistence: attached files cannot be stored and are
    /// cleared.
    pub fn sanitized(&self) -> Self {
        Self {
            value: if self.holds_file() {
                Value::Null
            } else {
                self.value.clone()
            },
            children: self.children.iter().map(Self::sanitized).collect(),
            schema: None,
            ..self.clone()
        }
    }
}

pub(crate) fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Whether any node in the tree holds an attached file.
pub fn tree_has_files(nodes: &[InstanceNode]) -> bool {
    nodes
        .iter()
        .any(|n| n.holds_file() || tree_has_files(&n.children))
}
