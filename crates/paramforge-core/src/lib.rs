//! paramforge-core — compile field validation rules into a parameter schema
//! tree, and keep an editable instance tree reconciled against it.
//!
//! ## Pipeline
//!
//! ```text
//! RuleSet ─▶ resolver (type · constraints · options) ─▶ SchemaTreeBuilder ─▶ Vec<SchemaNode>
//!                                                                             │
//!                    saved state ─▶ reconcile ◀───────────────────────────────┘
//!                                      │
//!                                      ▼
//!                            Vec<InstanceNode> ─▶ compile_payload ─▶ JSON body
//!                                      ▲
//!                      raw JSON edit ─▶ apply_json_edit
//! ```
//!
//! Compilation is total: malformed rule attributes resolve to `None` on the
//! affected field and never fail the unit.

pub mod config;
pub mod directives;
pub mod error;
pub mod example;
pub mod field_type;
pub mod instance;
pub mod json_bridge;
pub mod key_pattern;
pub mod payload;
pub mod reconciler;
pub mod resolver;
pub mod rules;
pub mod schema;
pub mod session;
pub mod source;
pub mod store;
pub mod tree;

pub use config::CompileOptions;
pub use directives::{parse_directives, Directives, ManualHeader, ManualParam};
pub use error::ParamError;
pub use example::EXAMPLE_DESCRIPTION;
pub use field_type::{FieldType, Shape};
pub use instance::{tree_has_files, ChildDef, InstanceNode};
pub use json_bridge::{apply_json_edit, hydrate_from_json};
pub use payload::{cast_scalar, compile_payload};
pub use reconciler::{reconcile, reset_to_defaults};
pub use resolver::parse_field;
pub use rules::{normalize_rules, RuleDeclaration, RuleObject};
pub use schema::{Conditional, SchemaNode};
pub use session::FormSession;
pub use source::{resolve_rule_source, scan_static, RuleSet, RuleSource};
pub use store::{load_state, save_state, MemoryStore, StateStore};
pub use tree::SchemaTreeBuilder;

/// Compile one documented unit.
///
/// Manual body parameters, when present, replace the inferred rules entirely.
pub fn compile_unit(
    rules: &RuleSet,
    manual: &[ManualParam],
    options: &CompileOptions,
) -> Vec<SchemaNode> {
    if manual.is_empty() {
        SchemaTreeBuilder::from_rules(rules, options)
    } else {
        tracing::debug!(params = manual.len(), "using manual parameter declarations");
        SchemaTreeBuilder::from_manual(manual, options)
    }
}

/// Resolve a rule source (dynamic, then static fallback) and compile it.
pub fn compile_source(
    source: &dyn RuleSource,
    manual: &[ManualParam],
    options: &CompileOptions,
) -> Vec<SchemaNode> {
    if !manual.is_empty() {
        return compile_unit(&RuleSet::new(), manual, options);
    }
    compile_unit(&resolve_rule_source(source), manual, options)
}
