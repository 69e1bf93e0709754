//! Rule sources — where a unit's field rules come from.
//!
//! A [`RuleSource`] is tried in two tiers: dynamic evaluation first, then a
//! static scan of its source text when evaluation fails (for example because
//! it needs runtime context that is not available while documenting). Both
//! tiers are total; a source that yields nothing simply contributes no fields.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::rules::RuleDeclaration;

/// Ordered map of dot-notation field path → rule declaration.
///
/// Insertion order is field order in the compiled schema. Re-inserting a path
/// replaces its declaration in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleSet {
    entries: Vec<(String, RuleDeclaration)>,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, rules: RuleDeclaration) {
        let path = path.into();
        match self.entries.iter_mut().find(|(p, _)| *p == path) {
            Some(entry) => entry.1 = rules,
            None => self.entries.push((path, rules)),
        }
    }

    pub fn get(&self, path: &str) -> Option<&RuleDeclaration> {
        self.entries.iter().find(|(p, _)| p == path).map(|(_, r)| r)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RuleDeclaration)> {
        self.entries.iter().map(|(p, r)| (p.as_str(), r))
    }

    /// Merge `other` into `self`; paths present in both take `other`'s rules.
    pub fn merge(&mut self, other: RuleSet) {
        for (path, rules) in other.entries {
            self.insert(path, rules);
        }
    }
}

impl FromIterator<(String, RuleDeclaration)> for RuleSet {
    fn from_iter<I: IntoIterator<Item = (String, RuleDeclaration)>>(iter: I) -> Self {
        let mut set = RuleSet::new();
        for (path, rules) in iter {
            set.insert(path, rules);
        }
        set
    }
}

impl Serialize for RuleSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, rules) in &self.entries {
            map.serialize_entry(path, rules)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RuleSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RuleSetVisitor;

        impl<'de> Visitor<'de> for RuleSetVisitor {
            type Value = RuleSet;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of field paths to rule declarations")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<RuleSet, A::Error> {
                let mut set = RuleSet::new();
                while let Some((path, rules)) = access.next_entry::<String, RuleDeclaration>()? {
                    set.insert(path, rules);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(RuleSetVisitor)
    }
}

/// A unit's rule provider.
pub trait RuleSource {
    /// Produce the rules by evaluating the source.
    fn evaluate(&self) -> Result<RuleSet, String>;

    /// Raw source text for the static fallback, when available.
    fn source_text(&self) -> Option<String> {
        None
    }
}

impl RuleSource for RuleSet {
    fn evaluate(&self) -> Result<RuleSet, String> {
        Ok(self.clone())
    }
}

/// Resolve a source's rules: dynamic evaluation, else static scan.
pub fn resolve_rule_source(source: &dyn RuleSource) -> RuleSet {
    match source.evaluate() {
        Ok(rules) => rules,
        Err(reason) => {
            tracing::warn!(%reason, "rule evaluation failed; falling back to static scan");
            source
                .source_text()
                .map(|text| scan_static(&text))
                .unwrap_or_default()
        }
    }
}

fn quoted_string_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"['"](.*?)['"]"#).expect("static regex is valid"))
}

/// Recover `path => rules` pairs from source text line by line.
///
/// Only `=>` lines outside comments count. The first quoted string is the
/// field path; every further quoted string on the line is one of its rules.
pub fn scan_static(text: &str) -> RuleSet {
    let re = quoted_string_regex();
    let mut rules = RuleSet::new();

    for line in text.lines() {
        let line = line.trim();
        if line.starts_with("//") || line.starts_with('#') || !line.contains("=>") {
            continue;
        }

        let strings: Vec<&str> = re
            .captures_iter(line)
            .filter_map(|c| c.get(1).map(|m| m.as_str()))
            .collect();

        if let [path, rest @ ..] = strings.as_slice() {
            if rest.is_empty() {
                continue;
            }
            let decl =
                RuleDeclaration::List(rest.iter().map(|r| RuleDeclaration::from(*r)).collect());
            rules.insert(*path, decl);
        }
    }

    tracing::debug!(fields = rules.len(), "static scan recovered rules");
    rules
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct Failing(&'static str);

    impl RuleSource for Failing {
        fn evaluate(&self) -> Result<RuleSet, String> {
            Err("route context unavailable".to_string())
        }

        fn source_text(&self) -> Option<String> {
            Some(self.0.to_string())
        }
    }

    const SOURCE: &str = r#"
        public function rules(): array
        {
            return [
                // 'ignored' => 'required',
                'name' => 'required|string|max:255',
                "email" => ['required', "email", Rule::unique('users')->ignore($this->route('user'))],
                'notes',
                # 'also_ignored' => 'string',
            ];
        }
    "#;

    #[test]
    fn test_unknown_entry_keeps_rest_of_unit() {
        let rules: RuleSet = serde_json::from_value(json!({
            "name": "required|string",
            "age": ["integer", { "kind": "callable" }],
            "x": { "class_name": "Foo" }
        }))
        .unwrap();
        assert_eq!(rules.len(), 3);

        let nodes = crate::compile_unit(&rules, &[], &crate::CompileOptions::default());
        let keys: Vec<&str> = nodes.iter().map(|n| n.key.as_str()).collect();
        assert_eq!(keys, vec!["name", "age", "x"]);
        assert!(nodes[0].required);
        assert_eq!(nodes[1].field_type, crate::FieldType::Number);
        assert_eq!(nodes[2].field_type, crate::FieldType::Text);
    }

    #[test]
    fn test_static_scan_recovers_pairs() {
        let rules = scan_static(SOURCE);
        assert_eq!(rules.len(), 2);
        assert_eq!(
            rules.get("name"),
            Some(&RuleDeclaration::List(vec!["required|string|max:255".into()]))
        );
        let email = crate::rules::normalize_rules(rules.get("email").unwrap());
        assert_eq!(&email[..2], &["required".to_string(), "email".to_string()]);
    }

    #[test]
    fn test_failed_evaluation_falls_back_to_scan() {
        let rules = resolve_rule_source(&Failing(SOURCE));
        assert!(rules.get("name").is_some());
        assert!(rules.get("ignored").is_none());
    }

    #[test]
    fn test_failed_evaluation_without_text_is_empty() {
        struct Opaque;
        impl RuleSource for Opaque {
            fn evaluate(&self) -> Result<RuleSet, String> {
                Err("boom".into())
            }
        }
        assert!(resolve_rule_source(&Opaque).is_empty());
    }

    #[test]
    fn test_rule_set_preserves_json_order() {
        let rules: RuleSet = serde_json::from_value(json!({
            "zeta": "string",
            "alpha": ["required", "integer"],
            "mid": "email"
        }))
        .unwrap();
        let paths: Vec<&str> = rules.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["zeta", "alpha", "mid"]);

        let round_trip = serde_json::to_value(&rules).unwrap();
        let again: RuleSet = serde_json::from_value(round_trip).unwrap();
        assert_eq!(again, rules);
    }

    #[test]
    fn test_merge_overrides_existing_paths() {
        let mut base = RuleSet::new();
        base.insert("a", "string".into());
        base.insert("b", "string".into());
        let mut extra = RuleSet::new();
        extra.insert("a", "integer".into());
        extra.insert("c", "email".into());
        base.merge(extra);
        let paths: Vec<&str> = base.iter().map(|(p, _)| p).collect();
        assert_eq!(paths, vec!["a", "b", "c"]);
        assert_eq!(base.get("a"), Some(&RuleDeclaration::from("integer")));
    }
}
