//! Configuration for schema compilation.

use serde::{Deserialize, Serialize};

/// Options threaded through every compiler entry point.
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `grouping-keywords`,
/// `framework-namespace`) so the same struct can be loaded from a CLI config file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CompileOptions {
    /// Key substrings that turn a scalar wildcard array (`meta.*`) into a
    /// free-form object. Matched case-insensitively.
    pub grouping_keywords: Vec<String>,
    /// Format rules with no native input widget. A field carrying one of these
    /// keeps the rule name as its type.
    pub dynamic_types: Vec<String>,
    /// Class-name prefix of built-in rule objects. Objects outside it are
    /// custom rules and may contribute a custom type name.
    pub framework_namespace: String,
    /// Path segment denoting "any element".
    pub wildcard: String,
    /// Tag prefix for manual directives, e.g. `api` for `@api-bodyParam`.
    pub directive_prefix: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            grouping_keywords: vec!["meta".to_string()],
            dynamic_types: ["uuid", "ulid", "ip", "ipv4", "ipv6", "mac_address"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            framework_namespace: "Illuminate\\".to_string(),
            wildcard: "*".to_string(),
            directive_prefix: "api".to_string(),
        }
    }
}

impl CompileOptions {
    /// Whether `key` contains one of the configured grouping keywords.
    pub fn is_grouping_key(&self, key: &str) -> bool {
        let lower = key.to_lowercase();
        self.grouping_keywords
            .iter()
            .any(|kw| !kw.is_empty() && lower.contains(&kw.to_lowercase()))
    }

    /// Whether `token` (already lowercased, without parameters) is a dynamic format.
    pub fn is_dynamic_type(&self, token: &str) -> bool {
        self.dynamic_types.iter().any(|t| t == token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_options_serde_round_trip() {
        let opts = CompileOptions {
            grouping_keywords: vec!["extra".to_string()],
            directive_prefix: "doc".to_string(),
            ..CompileOptions::default()
        };

        let json = serde_json::to_string(&opts).unwrap();
        assert!(json.contains("\"grouping-keywords\""));
        assert!(json.contains("\"framework-namespace\""));

        let deserialized: CompileOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, opts);
    }

    #[test]
    fn test_partial_config_falls_back_to_defaults() {
        let opts: CompileOptions =
            serde_json::from_str(r#"{ "grouping-keywords": ["attrs"] }"#).unwrap();
        assert_eq!(opts.grouping_keywords, vec!["attrs".to_string()]);
        assert_eq!(opts.wildcard, "*");
        assert!(opts.is_dynamic_type("uuid"));
    }

    #[test]
    fn test_grouping_key_is_case_insensitive() {
        let opts = CompileOptions::default();
        assert!(opts.is_grouping_key("userMeta"));
        assert!(opts.is_grouping_key("META_DATA"));
        assert!(!opts.is_grouping_key("tags"));
    }
}
