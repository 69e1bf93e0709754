//! Persistence of instance trees.
//!
//! Storage is best-effort: a failed read is an empty prior state and a failed
//! write leaves the edit in memory only. Neither ever interrupts editing.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::error::ParamError;
use crate::instance::InstanceNode;

/// Key-value storage for serialized instance trees.
pub trait StateStore {
    /// Stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<Value>;

    /// Store `value` under `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ParamError::Storage`] when the write fails.
    fn set(&self, key: &str, value: Value) -> Result<(), ParamError>;
}

/// In-memory store; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<Mutex<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStore {
    fn get(&self, key: &str) -> Option<Value> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) -> Result<(), ParamError> {
        self.entries
            .lock()
            .map_err(|_| ParamError::Storage("state store mutex poisoned".to_string()))?
            .insert(key.to_string(), value);
        Ok(())
    }
}

/// Load prior instance state for `key`.
///
/// Accepts a node array or an object whose values are nodes. Anything else is
/// treated as no prior state.
pub fn load_state(store: &dyn StateStore, key: &str) -> Vec<InstanceNode> {
    let Some(stored) = store.get(key) else {
        return Vec::new();
    };
    parse_state(stored).unwrap_or_else(|e| {
        tracing::warn!(key, error = %e, "ignoring unreadable saved state");
        Vec::new()
    })
}

/// Decode a persisted tree from either accepted layout.
pub fn parse_state(stored: Value) -> Result<Vec<InstanceNode>, ParamError> {
    let nodes = match stored {
        Value::Array(_) => serde_json::from_value(stored)?,
        Value::Object(map) => map
            .into_iter()
            .map(|(_, v)| serde_json::from_value(v))
            .collect::<Result<Vec<InstanceNode>, _>>()?,
        Value::Null => Vec::new(),
        other => {
            return Err(ParamError::InvalidJson {
                message: format!("saved state is neither an array nor an object: {other}"),
            })
        }
    };
    Ok(nodes)
}

/// Persist `nodes` under `key`, stripping schema references and attached files.
///
/// Returns `false` when the write failed; the failure is logged, not raised.
pub fn save_state(store: &dyn StateStore, key: &str, nodes: &[InstanceNode]) -> bool {
    let sanitized: Vec<InstanceNode> = nodes.iter().map(InstanceNode::sanitized).collect();
    let result = serde_json::to_value(sanitized)
        .map_err(ParamError::from)
        .and_then(|value| store.set(key, value));
    match result {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(key, error = %e, "failed to persist state; keeping it in memory");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::FieldType;
    use crate::reconciler::reset_to_defaults;
    use crate::schema::SchemaNode;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct FailingStore;

    impl StateStore for FailingStore {
        fn get(&self, _key: &str) -> Option<Value> {
            Some(json!("corrupt"))
        }

        fn set(&self, _key: &str, _value: Value) -> Result<(), ParamError> {
            Err(ParamError::Storage("quota exceeded".into()))
        }
    }

    #[test]
    fn test_save_then_load() {
        let store = MemoryStore::new();
        let nodes = reset_to_defaults(&[SchemaNode::new("name", FieldType::Text)]);
        assert!(save_state(&store, "POST /users", &nodes));

        let loaded = load_state(&store, "POST /users");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].key, "name");
        assert!(loaded[0].schema.is_none());
        assert!(load_state(&store, "GET /users").is_empty());
    }

    #[test]
    fn test_load_object_layout() {
        let store = MemoryStore::new();
        store
            .set(
                "k",
                json!({"a": {"key": "a", "type": "number", "value": 3}, "b": {"key": "b"}}),
            )
            .unwrap();
        let loaded = load_state(&store, "k");
        let keys: Vec<&str> = loaded.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(loaded[0].field_type, FieldType::Number);
    }

    #[test]
    fn test_failures_degrade() {
        assert!(load_state(&FailingStore, "k").is_empty());
        assert!(!save_state(&FailingStore, "k", &[]));
    }

    #[test]
    fn test_malformed_nodes_are_ignored() {
        let store = MemoryStore::new();
        store.set("k", json!([{"type": "text"}])).unwrap();
        assert!(load_state(&store, "k").is_empty());
    }
}
