//! An editing session over one instance tree.
//!
//! [`FormSession`] ties a compiled schema, the live instance tree and a
//! storage key together. Fields are addressed by dot paths: object children
//! by key, array elements by index (`users.0.email`). Every successful
//! mutation is persisted best-effort.

use serde_json::Value;

use crate::config::CompileOptions;
use crate::error::ParamError;
use crate::field_type::{FieldType, Shape};
use crate::instance::{default_value, ChildDef, InstanceNode};
use crate::json_bridge::apply_json_edit;
use crate::payload::compile_payload;
use crate::reconciler::{reconcile, reset_to_defaults};
use crate::schema::SchemaNode;
use crate::store::{load_state, save_state, StateStore};

#[derive(Debug)]
pub struct FormSession<S: StateStore> {
    key: String,
    schema: Vec<SchemaNode>,
    nodes: Vec<InstanceNode>,
    store: S,
    options: CompileOptions,
}

impl<S: StateStore> FormSession<S> {
    /// Load saved state for `key` and reconcile it against `schema`.
    pub fn open(
        schema: Vec<SchemaNode>,
        store: S,
        key: impl Into<String>,
        options: CompileOptions,
    ) -> Self {
        let key = key.into();
        let prior = load_state(&store, &key);
        let nodes = reconcile(&schema, &prior, &options);
        tracing::debug!(
            key = %key,
            fields = nodes.len(),
            restored = !prior.is_empty(),
            "opened session"
        );
        Self {
            key,
            schema,
            nodes,
            store,
            options,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn schema(&self) -> &[SchemaNode] {
        &self.schema
    }

    pub fn nodes(&self) -> &[InstanceNode] {
        &self.nodes
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// The node at `path`, if any.
    pub fn node(&self, path: &str) -> Option<&InstanceNode> {
        let mut level = self.nodes.as_slice();
        let mut in_array = false;
        let mut found = None;
        for segment in path.split('.') {
            let idx = position(level, segment, in_array)?;
            let node = &level[idx];
            in_array = node.field_type == FieldType::Array;
            level = &node.children;
            found = Some(node);
        }
        found
    }

    pub fn set_value(&mut self, path: &str, value: Value) -> Result<(), ParamError> {
        self.locate_mut(path)?.value = value;
        self.persist();
        Ok(())
    }

    pub fn set_enabled(&mut self, path: &str, enabled: bool) -> Result<(), ParamError> {
        self.locate_mut(path)?.enabled = enabled;
        self.persist();
        Ok(())
    }

    /// Change a field's type. Crossing between scalar, list and object shapes
    /// clears the value and children.
    pub fn set_type(&mut self, path: &str, field_type: FieldType) -> Result<(), ParamError> {
        let node = self.locate_mut(path)?;
        let old_shape = node.shape();
        node.field_type = field_type;
        if node.shape() != old_shape {
            node.value = default_value(&node.field_type);
            node.children.clear();
            node.child_def = default_child_def(&node.field_type);
        }
        self.persist();
        Ok(())
    }

    /// Add a user-defined field under `parent` (empty for the top level).
    pub fn add_field(
        &mut self,
        parent: &str,
        key: &str,
        field_type: FieldType,
    ) -> Result<(), ParamError> {
        let (children, in_array) = self.children_mut(parent)?;
        if in_array {
            return Err(ParamError::NotAContainer {
                path: parent.to_string(),
            });
        }
        if children.iter().any(|c| c.key == key) {
            return Err(ParamError::DuplicateKey {
                path: join_path(parent, key),
            });
        }
        let mut node = InstanceNode::new(key, field_type);
        node.child_def = default_child_def(&node.field_type);
        children.push(node);
        self.persist();
        Ok(())
    }

    /// Append a new element to the array at `path`, shaped by its child
    /// definition.
    pub fn push_item(&mut self, path: &str) -> Result<(), ParamError> {
        let node = self.locate_mut(path)?;
        if node.field_type != FieldType::Array {
            return Err(ParamError::NotAContainer {
                path: path.to_string(),
            });
        }
        let item = match &node.child_def {
            Some(def) => def.new_item(),
            None => InstanceNode::new("", FieldType::Text),
        };
        node.children.push(item);
        self.persist();
        Ok(())
    }

    pub fn remove(&mut self, path: &str) -> Result<InstanceNode, ParamError> {
        let (parent, last) = split_path(path);
        let (children, in_array) = self.children_mut(parent)?;
        let idx = position(children, last, in_array).ok_or_else(|| ParamError::PathNotFound {
            path: path.to_string(),
        })?;
        let removed = children.remove(idx);
        self.persist();
        Ok(removed)
    }

    /// Replace the tree from raw JSON. On error the tree is unchanged.
    pub fn apply_json(&mut self, text: &str) -> Result<(), ParamError> {
        self.nodes = apply_json_edit(text, &self.nodes, &self.options)?;
        self.persist();
        Ok(())
    }

    /// Discard all edits and rebuild from the schema.
    pub fn reset(&mut self) {
        self.nodes = reset_to_defaults(&self.schema);
        self.persist();
    }

    pub fn payload(&self) -> Value {
        compile_payload(&self.nodes)
    }

    /// Save the tree. Returns `false` if the store rejected the write.
    pub fn persist(&self) -> bool {
        save_state(&self.store, &self.key, &self.nodes)
    }

    fn locate_mut(&mut self, path: &str) -> Result<&mut InstanceNode, ParamError> {
        let (parent, last) = split_path(path);
        let (children, in_array) = self.children_mut(parent)?;
        let idx = position(children, last, in_array).ok_or_else(|| ParamError::PathNotFound {
            path: path.to_string(),
        })?;
        Ok(&mut children[idx])
    }

    /// Children of the node at `parent`, and whether that node is an array.
    fn children_mut(&mut self, parent: &str) -> Result<(&mut Vec<InstanceNode>, bool), ParamError> {
        if parent.is_empty() {
            return Ok((&mut self.nodes, false));
        }
        let node = self.locate_mut(parent)?;
        match node.shape() {
            Shape::Scalar => Err(ParamError::NotAContainer {
                path: parent.to_string(),
            }),
            shape => Ok((&mut node.children, shape == Shape::List)),
        }
    }
}

fn default_child_def(field_type: &FieldType) -> Option<ChildDef> {
    (*field_type == FieldType::Array).then(|| ChildDef {
        field_type: FieldType::Text,
        schema: None,
    })
}

fn position(nodes: &[InstanceNode], segment: &str, in_array: bool) -> Option<usize> {
    if in_array {
        segment.parse::<usize>().ok().filter(|&i| i < nodes.len())
    } else {
        nodes.iter().position(|n| n.key == segment)
    }
}

fn split_path(path: &str) -> (&str, &str) {
    path.rsplit_once('.').unwrap_or(("", path))
}

fn join_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{parent}.{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn schema() -> Vec<SchemaNode> {
        vec![
            SchemaNode::new("name", FieldType::Text),
            SchemaNode {
                is_list: true,
                schema: Some(vec![SchemaNode::new("age", FieldType::Number)]),
                ..SchemaNode::new("users", FieldType::Object)
            },
            SchemaNode {
                schema: Some(Vec::new()),
                ..SchemaNode::new("meta", FieldType::Object)
            },
        ]
    }

    fn open(store: &MemoryStore) -> FormSession<MemoryStore> {
        FormSession::open(schema(), store.clone(), "POST /users", CompileOptions::default())
    }

    #[test]
    fn test_edit_and_payload() {
        let store = MemoryStore::new();
        let mut session = open(&store);

        session.set_value("name", json!("Ada")).unwrap();
        session.push_item("users").unwrap();
        session.set_value("users.0.age", json!("36")).unwrap();
        session.add_field("meta", "source", FieldType::Text).unwrap();
        session.set_value("meta.source", json!("cli")).unwrap();

        assert_eq!(
            session.payload(),
            json!({"name": "Ada", "users": [{"age": 36}], "meta": {"source": "cli"}})
        );
    }

    #[test]
    fn test_disabled_field_keeps_value() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        session.set_value("name", json!("Ada")).unwrap();
        session.set_enabled("name", false).unwrap();

        assert!(session.payload().get("name").is_none());
        assert_eq!(session.node("name").map(|n| &n.value), Some(&json!("Ada")));
    }

    #[test]
    fn test_state_survives_reopen() {
        let store = MemoryStore::new();
        {
            let mut session = open(&store);
            session.remove("meta").unwrap();
            session.add_field("", "extra", FieldType::Number).unwrap();
            session.set_value("extra", json!(5)).unwrap();
        }
        let session = open(&store);
        let keys: Vec<&str> = session.nodes().iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "users", "extra"]);
        assert!(session.node("users").and_then(|n| n.child_def.as_ref()).is_some());
    }

    #[test]
    fn test_set_type_across_shapes_clears() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        session.set_value("name", json!("Ada")).unwrap();
        session.set_type("name", FieldType::Email).unwrap();
        assert_eq!(session.node("name").map(|n| &n.value), Some(&json!("Ada")));

        session.set_type("name", FieldType::Array).unwrap();
        let node = session.node("name").unwrap();
        assert_eq!(node.value, Value::Null);
        assert_eq!(node.child_def.as_ref().map(|d| &d.field_type), Some(&FieldType::Text));
    }

    #[test]
    fn test_path_errors() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        assert!(matches!(
            session.set_value("missing", json!(1)),
            Err(ParamError::PathNotFound { .. })
        ));
        assert!(matches!(
            session.push_item("name"),
            Err(ParamError::NotAContainer { .. })
        ));
        assert!(matches!(
            session.add_field("name", "x", FieldType::Text),
            Err(ParamError::NotAContainer { .. })
        ));
        assert!(matches!(
            session.add_field("", "name", FieldType::Text),
            Err(ParamError::DuplicateKey { path }) if path == "name"
        ));
        assert!(matches!(
            session.set_value("users.3.age", json!(1)),
            Err(ParamError::PathNotFound { .. })
        ));
    }

    #[test]
    fn test_apply_json_and_reset() {
        let store = MemoryStore::new();
        let mut session = open(&store);
        assert!(session.apply_json("{}").is_err());
        assert_eq!(session.nodes().len(), 3);

        session.apply_json(r#"{"name": "Bo", "other": true}"#).unwrap();
        assert_eq!(session.payload(), json!({"name": "Bo", "other": true}));

        session.reset();
        assert_eq!(session.nodes().len(), 3);
        assert_eq!(session.node("name").map(|n| &n.value), Some(&json!("")));
    }
}
