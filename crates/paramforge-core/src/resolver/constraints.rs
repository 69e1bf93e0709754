//! Constraint extraction — bounds, pattern, file accept list, confirmation,
//! image dimensions and conditional clauses.
//!
//! Malformed parameters resolve to `None` for the affected attribute only.

use std::collections::BTreeMap;

use serde_json::Number;

use crate::rules::RuleDeclaration;
use crate::schema::Conditional;

/// Conditional rules that take one field and a value.
const SINGLE_FIELD_CONDITIONALS: &[&str] = &[
    "required_if",
    "required_unless",
    "prohibited_if",
    "prohibited_unless",
    "exclude_if",
    "exclude_unless",
];

/// Conditional rules that take a list of fields.
const MULTI_FIELD_CONDITIONALS: &[&str] = &[
    "required_with",
    "required_with_all",
    "required_without",
    "required_without_all",
    "exclude_with",
    "exclude_without",
];

/// Conditional rules valid without parameters.
const STANDALONE_CONDITIONALS: &[&str] = &["prohibited"];

/// Everything [`extract_constraints`] found for one field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Constraints {
    pub required: bool,
    pub nullable: bool,
    pub confirmed: bool,
    pub min: Option<Number>,
    pub max: Option<Number>,
    pub pattern: Option<String>,
    pub accept: Option<String>,
    pub dimensions: Option<BTreeMap<String, String>>,
    pub conditionals: Vec<Conditional>,
}

/// Scan normalized tokens for constraints.
///
/// `original` is the unnormalized declaration; it is consulted for regex
/// rules so that a pattern containing `|` survives when it was declared as its
/// own list entry.
pub fn extract_constraints(tokens: &[String], original: &RuleDeclaration) -> Constraints {
    let mut c = Constraints::default();

    for token in tokens {
        let trimmed = token.trim();
        let r = trimmed.to_lowercase();
        if r.is_empty() {
            continue;
        }

        match r.as_str() {
            "required" => {
                c.required = true;
                continue;
            }
            "nullable" => {
                c.nullable = true;
                continue;
            }
            "confirmed" => {
                c.confirmed = true;
                continue;
            }
            _ => {}
        }

        if let Some(conditional) = parse_conditional(&r, trimmed) {
            c.conditionals.push(conditional);
            continue;
        }

        if let Some(rest) = r.strip_prefix("min:") {
            c.min = numeric_or_none(rest);
        } else if let Some(rest) = r.strip_prefix("max:") {
            c.max = numeric_or_none(rest);
        } else if let Some(rest) = r.strip_prefix("size:") {
            let size = numeric_or_none(rest);
            c.min = size.clone();
            c.max = size;
        } else if let Some(rest) = r.strip_prefix("between:") {
            let parts: Vec<&str> = rest.split(',').collect();
            if let [lo, hi] = parts.as_slice() {
                c.min = numeric_or_none(lo);
                c.max = numeric_or_none(hi);
            }
        } else if r.starts_with("regex:") {
            let source = preserved_regex_token(trimmed, original);
            c.pattern = valid_pattern(&source["regex:".len()..]);
        } else if let Some(rest) = r
            .strip_prefix("extensions:")
            .or_else(|| r.strip_prefix("mimes:"))
        {
            c.accept = accept_list(rest);
        } else if let Some(rest) = r.strip_prefix("dimensions:") {
            c.dimensions = parse_dimensions(rest);
        } else if r.ends_with("\\requiredif") || r.ends_with("\\required") {
            c.required = true;
        }
    }

    c
}

/// Parse a conditional clause. `rule` is lowercased; `original` keeps the
/// declared case for field names and values.
fn parse_conditional(rule: &str, original: &str) -> Option<Conditional> {
    let (name, params) = match rule.split_once(':') {
        Some((name, _)) => (name, original.split_once(':').map(|(_, p)| p)),
        None => (rule, None),
    };

    let known = SINGLE_FIELD_CONDITIONALS.contains(&name)
        || MULTI_FIELD_CONDITIONALS.contains(&name)
        || STANDALONE_CONDITIONALS.contains(&name);
    if !known {
        return None;
    }

    let Some(params) = params else {
        return Some(Conditional::standalone(name));
    };

    let parts: Vec<&str> = params.split(',').map(str::trim).collect();
    if SINGLE_FIELD_CONDITIONALS.contains(&name) {
        Some(Conditional {
            rule: name.to_string(),
            field: Some(parts[0].to_string()),
            fields: None,
            value: Some(parts.get(1).copied().unwrap_or_default().to_string()),
        })
    } else if MULTI_FIELD_CONDITIONALS.contains(&name) {
        Some(Conditional {
            rule: name.to_string(),
            field: None,
            fields: Some(parts.iter().map(|p| p.to_string()).collect()),
            value: None,
        })
    } else {
        None
    }
}

/// Recover the full regex rule when it was declared as its own string entry.
fn preserved_regex_token<'a>(token: &'a str, original: &'a RuleDeclaration) -> &'a str {
    original
        .raw_strings()
        .into_iter()
        .map(str::trim)
        .find(|raw| raw.to_lowercase().starts_with("regex:") && raw.starts_with(token))
        .unwrap_or(token)
}

/// Accept a pattern unless it is empty or opens a delimiter it never closes.
fn valid_pattern(source: &str) -> Option<String> {
    let source = source.trim();
    let first = source.chars().next()?;
    if first.is_alphanumeric() || first == '\\' || first.is_whitespace() {
        return Some(source.to_string());
    }
    let closing = match first {
        '(' => ')',
        '{' => '}',
        '[' => ']',
        '<' => '>',
        other => other,
    };
    let body = &source[first.len_utf8()..];
    if body.contains(closing) {
        Some(source.to_string())
    } else {
        None
    }
}

fn accept_list(params: &str) -> Option<String> {
    let exts: Vec<String> = params
        .split(',')
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .map(|e| format!(".{e}"))
        .collect();
    if exts.is_empty() {
        None
    } else {
        Some(exts.join(","))
    }
}

/// Parse `min_width=100,max_height=200` into a map. Pairs without `=` are
/// skipped; no valid pair at all yields `None`.
fn parse_dimensions(params: &str) -> Option<BTreeMap<String, String>> {
    let map: BTreeMap<String, String> = params
        .split(',')
        .filter_map(|part| part.trim().split_once('='))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    if map.is_empty() {
        None
    } else {
        Some(map)
    }
}

/// Parse a numeric parameter, keeping integers integral.
pub(crate) fn numeric_or_none(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let integral = !trimmed.contains(['.', 'e', 'E']);
    if integral {
        if let Ok(i) = trimmed.parse::<i64>() {
            return Some(Number::from(i));
        }
    }
    let is_numeric_text = trimmed
        .chars()
        .all(|ch| ch.is_ascii_digit() || matches!(ch, '.' | 'e' | 'E' | '+' | '-'));
    if !is_numeric_text {
        return None;
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract(rules: &str) -> Constraints {
        let decl = RuleDeclaration::from(rules);
        let tokens = crate::rules::normalize_rules(&decl);
        extract_constraints(&tokens, &decl)
    }

    #[test]
    fn test_presence_flags() {
        let c = extract("required|nullable|confirmed");
        assert!(c.required && c.nullable && c.confirmed);
    }

    #[test]
    fn test_bounds_equivalence() {
        let a = extract("min:5|max:10");
        let b = extract("between:5,10");
        assert_eq!((a.min.clone(), a.max.clone()), (b.min, b.max));
        assert_eq!(a.min, Some(Number::from(5)));

        let s = extract("size:7");
        assert_eq!(s.min, Some(Number::from(7)));
        assert_eq!(s.min, s.max);
    }

    #[test]
    fn test_non_numeric_bound_is_none() {
        let c = extract("min:abc|max:2.5");
        assert_eq!(c.min, None);
        assert_eq!(serde_json::to_value(&c.max).unwrap(), json!(2.5));
        assert_eq!(extract("between:1").min, None);
        assert_eq!(extract("max:inf").max, None);
    }

    #[test]
    fn test_regex_preserves_case() {
        let c = extract("regex:/^[A-Z]+$/");
        assert_eq!(c.pattern.as_deref(), Some("/^[A-Z]+$/"));
    }

    #[test]
    fn test_regex_with_pipe_survives_as_list_entry() {
        let decl = RuleDeclaration::List(vec!["required".into(), "regex:/^(Cat|Dog)$/".into()]);
        let tokens = crate::rules::normalize_rules(&decl);
        let c = extract_constraints(&tokens, &decl);
        assert_eq!(c.pattern.as_deref(), Some("/^(Cat|Dog)$/"));
    }

    #[test]
    fn test_unterminated_regex_is_none() {
        assert_eq!(extract("regex:/abc").pattern, None);
        assert_eq!(extract("regex:").pattern, None);
    }

    #[test]
    fn test_accept_list() {
        assert_eq!(extract("mimes:jpg, PNG").accept.as_deref(), Some(".jpg,.png"));
        assert_eq!(extract("extensions:pdf").accept.as_deref(), Some(".pdf"));
    }

    #[test]
    fn test_dimensions() {
        let c = extract("dimensions:min_width=100,max_height=200,bogus");
        let dims = c.dimensions.unwrap();
        assert_eq!(dims.get("min_width").map(String::as_str), Some("100"));
        assert_eq!(dims.len(), 2);
        assert_eq!(extract("dimensions:nothing").dimensions, None);
    }

    #[test]
    fn test_conditionals_never_set_required() {
        let c = extract("required_if:role,Admin|required_with:name, email|prohibited");
        assert!(!c.required);
        assert_eq!(
            c.conditionals,
            vec![
                Conditional {
                    rule: "required_if".into(),
                    field: Some("role".into()),
                    fields: None,
                    value: Some("Admin".into()),
                },
                Conditional {
                    rule: "required_with".into(),
                    field: None,
                    fields: Some(vec!["name".into(), "email".into()]),
                    value: None,
                },
                Conditional::standalone("prohibited"),
            ]
        );
    }

    #[test]
    fn test_with_all_is_not_confused_with_with() {
        let c = extract("required_with_all:a,b");
        assert_eq!(c.conditionals[0].rule, "required_with_all");
    }

    #[test]
    fn test_class_required_rule() {
        let c = extract("Illuminate\\Validation\\Rules\\RequiredIf");
        assert!(c.required);
    }

    #[test]
    fn test_unknown_tokens_ignored() {
        assert_eq!(extract("string|foo:bar|alpha_dash"), Constraints::default());
    }
}
