//! Instance reconciliation — merge persisted instance state with a freshly
//! compiled schema.
//!
//! With no prior state the schema alone defines the tree. Otherwise the prior
//! state decides which fields exist: user-added fields survive and deleted
//! fields stay deleted. Each prior field is matched to its schema counterpart
//! by exact key, then by template key. A matched field whose structural shape
//! (scalar, list, object) no longer agrees with the schema is rebuilt from
//! schema defaults under its existing key.

use std::sync::Arc;

use crate::config::CompileOptions;
use crate::field_type::Shape;
use crate::instance::{ChildDef, InstanceNode};
use crate::key_pattern::matches_pattern;
use crate::schema::SchemaNode;

/// Reconcile `prior` instance state against `schema`.
pub fn reconcile(
    schema: &[SchemaNode],
    prior: &[InstanceNode],
    options: &CompileOptions,
) -> Vec<InstanceNode> {
    if prior.is_empty() {
        return reset_to_defaults(schema);
    }

    prior
        .iter()
        .map(|saved| {
            let counterpart = find_counterpart(schema, &saved.key, &options.wildcard);
            reconcile_node(saved, counterpart, options)
        })
        .collect()
}

/// Rebuild an instance tree from schema alone: empty values, every node
/// enabled.
pub fn reset_to_defaults(schema: &[SchemaNode]) -> Vec<InstanceNode> {
    schema.iter().map(InstanceNode::from_schema).collect()
}

/// Schema node for `key`: exact key first, then the first template key that
/// matches.
pub fn find_counterpart<'s>(
    schema: &'s [SchemaNode],
    key: &str,
    wildcard: &str,
) -> Option<&'s SchemaNode> {
    schema.iter().find(|s| s.key == key).or_else(|| {
        schema
            .iter()
            .find(|s| s.is_pattern && matches_pattern(&s.key, key, wildcard))
    })
}

fn reconcile_node(
    saved: &InstanceNode,
    schema: Option<&SchemaNode>,
    options: &CompileOptions,
) -> InstanceNode {
    if let Some(schema) = schema {
        if saved.shape() != schema.shape() {
            tracing::debug!(
                field = %saved.key,
                saved_type = %saved.field_type,
                schema_type = %schema.field_type,
                "discarding stale branch"
            );
            let mut fresh = InstanceNode::from_schema(schema);
            fresh.key = saved.key.clone();
            return fresh;
        }
    }

    let children = match saved.shape() {
        Shape::Object => reconcile(
            schema.map(SchemaNode::children).unwrap_or(&[]),
            &saved.children,
            options,
        ),
        Shape::List => saved.children.clone(),
        Shape::Scalar => Vec::new(),
    };

    InstanceNode {
        key: saved.key.clone(),
        field_type: saved.field_type.clone(),
        value: saved.value.clone(),
        enabled: saved.enabled,
        children,
        child_def: saved
            .child_def
            .clone()
            .or_else(|| schema.and_then(ChildDef::for_schema)),
        schema: schema.map(|s| Arc::new(s.field_meta())),
    }
}
