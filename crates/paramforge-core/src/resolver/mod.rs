//! Field resolution — turns one field's rule declaration into leaf metadata.
//!
//! Runs the three independent resolvers over the same normalized tokens and
//! merges their output:
//!
//! - [`types`] picks the semantic type by priority tier
//! - [`constraints`] extracts bounds, pattern, accept list and conditionals
//! - [`options`] extracts enumerations and custom rule names
//!
//! Final type precedence: enumeration options (`select`) > custom rule name
//! (only over the `text` fallback) > resolved type.

pub mod constraints;
pub mod options;
pub mod types;

use crate::config::CompileOptions;
use crate::field_type::FieldType;
use crate::rules::{display_rules, normalize_rules, RuleDeclaration};
use crate::schema::SchemaNode;

pub use constraints::{extract_constraints, Constraints};
pub use options::{custom_type_name, resolve_options};
pub use types::{resolve_type, TypeResolution, TypeTier};

/// Compile one field path's rules into a leaf [`SchemaNode`].
///
/// The node's key is the last dot-separated segment of `path`; nesting is the
/// tree builder's job.
pub fn parse_field(path: &str, rules: &RuleDeclaration, options: &CompileOptions) -> SchemaNode {
    let tokens = normalize_rules(rules);

    let resolution = resolve_type(&tokens, options);
    let constraints = extract_constraints(&tokens, rules);
    let enumeration = resolve_options(&tokens, rules);
    let custom = custom_type_name(rules, options);

    let field_type = if enumeration.is_some() {
        FieldType::Select
    } else if let (Some(name), TypeTier::Fallback) = (custom, resolution.tier) {
        FieldType::from(name)
    } else {
        resolution.field_type
    };

    tracing::debug!(
        field = %path,
        field_type = %field_type,
        tier = ?resolution.tier,
        "resolved field"
    );

    SchemaNode {
        key: leaf_key(path).to_string(),
        field_type,
        required: constraints.required,
        nullable: constraints.nullable,
        confirmed: constraints.confirmed,
        min: constraints.min,
        max: constraints.max,
        pattern: constraints.pattern,
        accept: constraints.accept,
        dimensions: constraints.dimensions,
        conditionals: constraints.conditionals,
        options: enumeration,
        rules: display_rules(&tokens),
        ..SchemaNode::default()
    }
}

fn leaf_key(path: &str) -> &str {
    path.rsplit('.').next().unwrap_or(path)
}
