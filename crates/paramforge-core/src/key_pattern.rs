//! Pattern keys — templated field names matched against runtime keys.
//!
//! A key such as `lang_*` documents a family of fields. It is compiled to an
//! anchored regex in which the wildcard becomes `.*` and every other regex
//! metacharacter is escaped.

use regex::Regex;

/// Whether `key` is a template: contains the wildcard but is not the bare wildcard.
pub fn is_pattern_key(key: &str, wildcard: &str) -> bool {
    !wildcard.is_empty() && key.contains(wildcard) && key != wildcard
}

/// Compile a template key to an anchored regex.
pub fn pattern_regex(template: &str, wildcard: &str) -> Option<Regex> {
    let body = if wildcard.is_empty() {
        regex::escape(template)
    } else {
        template
            .split(wildcard)
            .map(regex::escape)
            .collect::<Vec<_>>()
            .join(".*")
    };
    Regex::new(&format!("^{body}$")).ok()
}

/// Whether the runtime `key` matches the template.
pub fn matches_pattern(template: &str, key: &str, wildcard: &str) -> bool {
    pattern_regex(template, wildcard).is_some_and(|re| re.is_match(key))
}
