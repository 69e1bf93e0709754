//! Rule declarations and their normalization into canonical string tokens.
//!
//! A declaration arrives in one of several loose shapes: a pipe-delimited
//! string (`"required|string|max:255"`), a list mixing strings and rule
//! objects, or a single rule object. [`normalize_rules`] flattens all of them
//! into one ordered token list so that downstream resolvers never branch on
//! representation again.

use heck::ToSnakeCase;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A field's raw validation rules, as supplied by a rule source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RuleDeclaration {
    /// Unsupported or missing input. Normalizes to nothing.
    Absent,
    /// Pipe-delimited rule string.
    Text(String),
    Number(serde_json::Number),
    Bool(bool),
    List(Vec<RuleDeclaration>),
    Object(RuleObject),
    /// Any shape no other variant accepts. Kept for round-tripping, never
    /// contributes tokens.
    Unknown(Value),
}

/// A structured rule object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RuleObject {
    /// An inline callable. Carries no inspectable metadata and is dropped.
    Closure,
    /// Enumeration rule over literal values.
    In { values: Vec<Value> },
    /// Enumeration rule backed by an enumeration type.
    Enum {
        #[serde(default)]
        enum_type: Option<EnumType>,
    },
    /// Bare reference to an enumeration type.
    EnumRef {
        name: String,
        #[serde(default)]
        cases: Vec<EnumCase>,
    },
    /// Any other rule object, identified by its class name.
    Class {
        class: String,
        /// Explicit display name declared on the rule.
        #[serde(default)]
        name: Option<String>,
        /// The object's natural string form, when it has one.
        #[serde(default)]
        display: Option<String>,
    },
}

/// An enumeration type with its declared cases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumType {
    pub name: String,
    #[serde(default)]
    pub cases: Vec<EnumCase>,
}

/// One enumeration case. Backed cases carry a scalar value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumCase {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
}

impl EnumCase {
    /// The option a case contributes: its backing value, else its name.
    pub fn option_value(&self) -> Value {
        match &self.value {
            Some(v) if !v.is_null() => v.clone(),
            _ => Value::String(self.name.clone()),
        }
    }
}

impl RuleObject {
    /// String form used as the normalized token. `None` drops the object.
    pub fn natural_form(&self) -> Option<String> {
        match self {
            RuleObject::Closure => None,
            RuleObject::In { values } => Some(in_rule_string(values)),
            RuleObject::Enum { .. } => Some("enum".to_string()),
            RuleObject::EnumRef { name, .. } => Some(name.clone()),
            RuleObject::Class { class, display, .. } => {
                Some(display.clone().unwrap_or_else(|| class.clone()))
            }
        }
    }
}

/// Render an enumeration rule as `in:"a","b"`, doubling embedded quotes.
pub(crate) fn in_rule_string(values: &[Value]) -> String {
    let quoted: Vec<String> = values
        .iter()
        .map(|v| format!("\"{}\"", scalar_text(v).replace('"', "\"\"")))
        .collect();
    format!("in:{}", quoted.join(","))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

impl RuleDeclaration {
    /// All rule objects in the declaration, in declaration order.
    pub fn objects(&self) -> Vec<&RuleObject> {
        let mut out = Vec::new();
        collect_objects(self, &mut out);
        out
    }

    /// Top-level string entries, unsplit. Used where a pipe inside a rule
    /// parameter (regex alternation) must survive.
    pub fn raw_strings(&self) -> Vec<&str> {
        match self {
            RuleDeclaration::Text(s) => vec![s.as_str()],
            RuleDeclaration::List(items) => items.iter().flat_map(|i| i.raw_strings()).collect(),
            _ => Vec::new(),
        }
    }
}

fn collect_objects<'a>(decl: &'a RuleDeclaration, out: &mut Vec<&'a RuleObject>) {
    match decl {
        RuleDeclaration::Object(obj) => out.push(obj),
        RuleDeclaration::List(items) => {
            for item in items {
                collect_objects(item, out);
            }
        }
        _ => {}
    }
}

impl From<&str> for RuleDeclaration {
    fn from(s: &str) -> Self {
        RuleDeclaration::Text(s.to_string())
    }
}

impl From<RuleObject> for RuleDeclaration {
    fn from(obj: RuleObject) -> Self {
        RuleDeclaration::Object(obj)
    }
}

impl<T: Into<RuleDeclaration>> From<Vec<T>> for RuleDeclaration {
    fn from(items: Vec<T>) -> Self {
        RuleDeclaration::List(items.into_iter().map(Into::into).collect())
    }
}

/// Flatten a declaration into ordered rule tokens.
///
/// Strings split on `|`, lists flatten recursively, closures vanish, objects
/// contribute their natural string form. Never fails.
pub fn normalize_rules(rules: &RuleDeclaration) -> Vec<String> {
    let mut tokens = Vec::new();
    normalize_into(rules, &mut tokens);
    tokens
}

fn normalize_into(rules: &RuleDeclaration, tokens: &mut Vec<String>) {
    match rules {
        RuleDeclaration::Absent | RuleDeclaration::Unknown(_) => {}
        RuleDeclaration::Text(s) => tokens.extend(s.split('|').map(str::to_string)),
        RuleDeclaration::Number(n) => tokens.push(n.to_string()),
        RuleDeclaration::Bool(b) => tokens.push(b.to_string()),
        RuleDeclaration::List(items) => {
            for item in items {
                normalize_into(item, tokens);
            }
        }
        RuleDeclaration::Object(obj) => tokens.extend(obj.natural_form()),
    }
}

/// Human-readable rule list for display.
///
/// Namespaced tokens (`App\Rules\StrongPassword`) are shortened to the
/// snake-cased basename. Blank tokens and duplicates are dropped.
pub fn display_rules(tokens: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for token in tokens {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            continue;
        }
        let shown = if trimmed.contains('\\') {
            class_basename(trimmed).to_snake_case()
        } else {
            trimmed.to_string()
        };
        if !out.contains(&shown) {
            out.push(shown);
        }
    }
    out
}

/// The last `\`-separated segment of a class name.
pub(crate) fn class_basename(class: &str) -> &str {
    class.rsplit('\\').next().unwrap_or(class)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pipe_string_splits_in_order() {
        let rules = RuleDeclaration::from("required|string|max:255");
        assert_eq!(normalize_rules(&rules), vec!["required", "string", "max:255"]);
    }

    #[test]
    fn test_list_flattens_nested_pipes_and_drops_closures() {
        let rules = RuleDeclaration::List(vec![
            "required|email".into(),
            RuleObject::Closure.into(),
            RuleDeclaration::List(vec!["max:10".into()]),
        ]);
        assert_eq!(normalize_rules(&rules), vec!["required", "email", "max:10"]);
    }

    #[test]
    fn test_objects_use_natural_form_then_class_name() {
        let rules = RuleDeclaration::List(vec![
            RuleObject::Class {
                class: "App\\Rules\\Uppercase".into(),
                name: None,
                display: None,
            }
            .into(),
            RuleObject::Class {
                class: "App\\Rules\\Slug".into(),
                name: None,
                display: Some("slug:strict".into()),
            }
            .into(),
        ]);
        assert_eq!(
            normalize_rules(&rules),
            vec!["App\\Rules\\Uppercase", "slug:strict"]
        );
    }

    #[test]
    fn test_in_object_quotes_and_escapes_values() {
        let obj = RuleObject::In {
            values: vec![json!("a"), json!("say \"hi\""), json!(3)],
        };
        assert_eq!(
            obj.natural_form().unwrap(),
            "in:\"a\",\"say \"\"hi\"\"\",\"3\""
        );
    }

    #[test]
    fn test_unsupported_input_is_empty() {
        assert!(normalize_rules(&RuleDeclaration::Absent).is_empty());
        assert!(normalize_rules(&RuleObject::Closure.into()).is_empty());
    }

    #[test]
    fn test_deserialize_mixed_declaration() {
        let decl: RuleDeclaration = serde_json::from_value(json!([
            "required",
            { "kind": "in", "values": ["a", "b"] },
            { "kind": "class", "class": "App\\Rules\\Even" },
            null
        ]))
        .unwrap();
        assert_eq!(decl.objects().len(), 2);
        assert_eq!(
            normalize_rules(&decl),
            vec!["required", "in:\"a\",\"b\"", "App\\Rules\\Even"]
        );
    }

    #[test]
    fn test_unrecognized_entries_normalize_to_nothing() {
        let decl: RuleDeclaration = serde_json::from_value(json!([
            "integer",
            { "kind": "callable" },
            { "class_name": "Foo" },
            [1, { "nested": true }]
        ]))
        .unwrap();
        assert_eq!(normalize_rules(&decl), vec!["integer", "1"]);
        assert!(decl.objects().is_empty());

        let lone: RuleDeclaration = serde_json::from_value(json!({ "class_name": "Foo" })).unwrap();
        assert!(matches!(lone, RuleDeclaration::Unknown(_)));
        assert!(normalize_rules(&lone).is_empty());
    }

    #[test]
    fn test_display_rules_shortens_and_dedupes() {
        let tokens: Vec<String> = vec![
            "required".into(),
            " ".into(),
            "App\\Rules\\StrongPassword".into(),
            "required".into(),
        ];
        assert_eq!(display_rules(&tokens), vec!["required", "strong_password"]);
    }
}
