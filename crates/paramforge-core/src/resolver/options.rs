//! Option extraction — enumerations that turn a field into a `select`.
//!
//! Sources, later ones overriding earlier ones:
//! 1. Inline `in:a,b,c` tokens (including the quoted form an enumeration
//!    rule object renders to).
//! 2. Enumeration rule objects in the original declaration.
//! 3. Enumeration-typed rule objects and bare enumeration references,
//!    resolved through their case list.
//!
//! `None` means "no enumeration"; `Some(vec![])` is an enumeration with no cases.

use heck::ToSnakeCase;
use serde_json::Value;

use crate::config::CompileOptions;
use crate::rules::{class_basename, RuleDeclaration, RuleObject};

/// Collect enumeration options for a field.
pub fn resolve_options(tokens: &[String], original: &RuleDeclaration) -> Option<Vec<Value>> {
    let mut options = None;

    for token in tokens {
        let trimmed = token.trim();
        if trimmed.to_lowercase().starts_with("in:") {
            options = Some(
                split_in_values(&trimmed[3..])
                    .into_iter()
                    .map(Value::String)
                    .collect(),
            );
        }
    }

    for obj in original.objects() {
        match obj {
            RuleObject::In { values } => options = Some(values.clone()),
            RuleObject::Enum {
                enum_type: Some(enum_type),
            } => {
                options = Some(enum_type.cases.iter().map(|c| c.option_value()).collect());
            }
            RuleObject::EnumRef { cases, .. } => {
                options = Some(cases.iter().map(|c| c.option_value()).collect());
            }
            _ => {}
        }
    }

    options
}

/// Split an `in:` parameter list.
///
/// Values wrapped in double quotes may contain commas; `""` inside quotes is
/// an escaped quote. Unquoted values are trimmed.
fn split_in_values(params: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = params.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() && !quoted => {
                current.clear();
                quoted = true;
                in_quotes = true;
            }
            ',' if !in_quotes => {
                values.push(finish_value(&current, quoted));
                current.clear();
                quoted = false;
            }
            other => current.push(other),
        }
    }
    values.push(finish_value(&current, quoted));
    values
}

fn finish_value(raw: &str, quoted: bool) -> String {
    if quoted {
        raw.to_string()
    } else {
        raw.trim().to_string()
    }
}

/// A custom type name contributed by a non-framework rule object.
///
/// Prefers the rule's explicit name, else the snake-cased class basename.
pub fn custom_type_name(original: &RuleDeclaration, options: &CompileOptions) -> Option<String> {
    original.objects().into_iter().find_map(|obj| match obj {
        RuleObject::Class { class, name, .. } => {
            if !options.framework_namespace.is_empty()
                && class.starts_with(&options.framework_namespace)
            {
                return None;
            }
            match name {
                Some(n) if !n.trim().is_empty() => Some(n.trim().to_string()),
                _ => {
                    let derived = class_basename(class).to_snake_case();
                    (!derived.is_empty()).then_some(derived)
                }
            }
        }
        _ => None,
    })
}
