//! Schema tree assembly from dot-notation field paths.
//!
//! Every schema source (validation rules, manual directives, JSON examples)
//! produces flat `path → leaf` entries and funnels them through
//! [`SchemaTreeBuilder`], so consumers see one shape regardless of origin.
//!
//! Assembly walks each path, creating an object placeholder per non-terminal
//! segment and merging the leaf at the terminal one. Formatting then runs
//! post-order, so a node's children are fully resolved before the node itself
//! is classified:
//!
//! - `items.*` with no deeper paths → `type: array`, `childType` from the
//!   wildcard leaf (or a free-form object for grouping keys such as `meta`)
//! - `items.*.name` → `type: object`, `isList: true`, `schema` from the
//!   wildcard's children
//! - `address.street` → `type: object`, `schema` from the named children
//!
//! A wildcard child wins over any literal sibling at the same level.

use crate::config::CompileOptions;
use crate::field_type::FieldType;
use crate::key_pattern::is_pattern_key;
use crate::resolver::parse_field;
use crate::schema::SchemaNode;
use crate::source::RuleSet;

/// Intermediate node: leaf metadata plus children in insertion order.
#[derive(Debug)]
struct RawNode {
    key: String,
    leaf: Option<SchemaNode>,
    children: Vec<RawNode>,
}

impl RawNode {
    fn new(key: &str) -> Self {
        Self {
            key: key.to_string(),
            leaf: None,
            children: Vec::new(),
        }
    }
}

/// Accumulates `path → leaf` entries and assembles them into a schema tree.
#[derive(Debug)]
pub struct SchemaTreeBuilder<'a> {
    options: &'a CompileOptions,
    roots: Vec<RawNode>,
}

impl<'a> SchemaTreeBuilder<'a> {
    pub fn new(options: &'a CompileOptions) -> Self {
        Self {
            options,
            roots: Vec::new(),
        }
    }

    /// Compile a rule set into a schema tree.
    pub fn from_rules(rules: &RuleSet, options: &CompileOptions) -> Vec<SchemaNode> {
        let mut builder = SchemaTreeBuilder::new(options);
        for (path, decl) in rules.iter() {
            builder.insert(path, parse_field(path, decl, options));
        }
        builder.build()
    }

    /// Merge `leaf` at `path`, creating intermediate object placeholders.
    ///
    /// Inserting the same path twice keeps the later leaf.
    pub fn insert(&mut self, path: &str, leaf: SchemaNode) {
        if path.is_empty() {
            return;
        }

        let segments: Vec<&str> = path.split('.').collect();
        let mut level = &mut self.roots;

        for (i, segment) in segments.iter().enumerate() {
            let idx = match level.iter().position(|n| n.key == *segment) {
                Some(idx) => idx,
                None => {
                    level.push(RawNode::new(segment));
                    level.len() - 1
                }
            };

            if i == segments.len() - 1 {
                level[idx].leaf = Some(leaf);
                return;
            }
            level = &mut level[idx].children;
        }
    }

    /// Format the accumulated tree.
    pub fn build(self) -> Vec<SchemaNode> {
        let options = self.options;
        self.roots
            .into_iter()
            .map(|raw| format_node(raw, options))
            .collect()
    }
}

fn format_node(raw: RawNode, options: &CompileOptions) -> SchemaNode {
    let RawNode {
        key,
        leaf,
        mut children,
    } = raw;

    let mut node = leaf.unwrap_or_else(|| SchemaNode::new(key.as_str(), FieldType::Object));
    node.key = key;
    node.is_pattern = node.is_pattern || is_pattern_key(&node.key, &options.wildcard);

    let wildcard_idx = children.iter().position(|c| c.key == options.wildcard);

    if let Some(idx) = wildcard_idx {
        let wildcard = children.remove(idx);
        if !wildcard.children.is_empty() {
            set_object(&mut node, format_all(wildcard.children, options), true);
        } else {
            let item_type = wildcard
                .leaf
                .map(|l| l.field_type)
                .unwrap_or(FieldType::Text);
            if item_type == FieldType::Object {
                set_object(&mut node, Vec::new(), true);
            } else if options.is_grouping_key(&node.key) {
                set_object(&mut node, Vec::new(), false);
            } else {
                node.field_type = FieldType::Array;
                node.child_type = Some(item_type);
                node.schema = None;
                node.is_list = false;
                node.options = None;
            }
        }
        if !children.is_empty() {
            tracing::debug!(
                field = %node.key,
                dropped = children.len(),
                "wildcard takes precedence over literal siblings"
            );
        }
    } else if !children.is_empty() {
        set_object(&mut node, format_all(children, options), false);
    } else {
        normalize_leaf(&mut node);
    }

    node
}

fn format_all(children: Vec<RawNode>, options: &CompileOptions) -> Vec<SchemaNode> {
    children
        .into_iter()
        .map(|c| format_node(c, options))
        .collect()
}

fn set_object(node: &mut SchemaNode, schema: Vec<SchemaNode>, is_list: bool) {
    node.field_type = FieldType::Object;
    node.schema = Some(schema);
    node.child_type = None;
    node.is_list = is_list;
    node.options = None;
}

/// Enforce the schema/childType invariant on a childless node.
fn normalize_leaf(node: &mut SchemaNode) {
    match node.field_type {
        FieldType::Object => {
            node.schema.get_or_insert_with(Vec::new);
            node.child_type = None;
        }
        FieldType::Array => {
            node.child_type.get_or_insert(FieldType::Text);
            node.schema = None;
            node.is_list = false;
        }
        _ => {
            node.child_type = None;
            node.schema = None;
            node.is_list = false;
        }
    }
}
