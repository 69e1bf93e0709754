//! Type resolution — maps canonical rule tokens to one semantic field type.
//!
//! Every token is classified into a priority tier. The highest tier present
//! wins regardless of token order; within a tier the first match wins.
//!
//! | Tier | Tokens | Type |
//! |------|--------|------|
//! | file | `file`, `image`, `mimes:`, `mimetypes:`, `extensions:`, `dimensions:`, `…\File`, `…\Image` | `file` |
//! | native | `email`, `url`, `integer`, `boolean`, `date`, … | native type |
//! | dynamic format | configured formats (`uuid`, `ip`, …) | the token itself |
//! | date range | `date_format:`, `before:`, `after:` | `date` |
//! | class suffix | `…\Password`, `…\Email` | `password` / `email` |
//! | fallback | — | `text` |

use crate::config::CompileOptions;
use crate::field_type::{native_type, FieldType};

const FILE_TOKENS: &[&str] = &["file", "image"];
const FILE_PREFIXES: &[&str] = &["mimes:", "mimetypes:", "extensions:", "dimensions:"];
const FILE_CLASS_SUFFIXES: &[&str] = &["\\file", "\\image"];
const DATE_PREFIXES: &[&str] = &["date_format:", "before:", "after:"];

/// Resolution priority, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TypeTier {
    File,
    Native,
    DynamicFormat,
    DateRange,
    ClassSuffix,
    Fallback,
}

/// The winning type and the tier it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeResolution {
    pub field_type: FieldType,
    pub tier: TypeTier,
}

/// Resolve the field type for a normalized token list.
pub fn resolve_type(tokens: &[String], options: &CompileOptions) -> TypeResolution {
    let mut best = TypeResolution {
        field_type: FieldType::Text,
        tier: TypeTier::Fallback,
    };

    for token in tokens {
        let lower = token.trim().to_lowercase();
        if lower.is_empty() {
            continue;
        }
        if let Some((tier, field_type)) = classify(&lower, options) {
            if tier < best.tier {
                best = TypeResolution { field_type, tier };
            }
        }
    }

    best
}

/// Classify one lowercased token, if it carries any type information.
fn classify(token: &str, options: &CompileOptions) -> Option<(TypeTier, FieldType)> {
    if is_file_indicator(token) {
        return Some((TypeTier::File, FieldType::File));
    }

    let base = token.split(':').next().unwrap_or(token);

    if let Some(native) = native_type(base) {
        return Some((TypeTier::Native, native));
    }

    if options.is_dynamic_type(base) {
        return Some((TypeTier::DynamicFormat, FieldType::Other(base.to_string())));
    }

    if DATE_PREFIXES.iter().any(|p| token.starts_with(p)) {
        return Some((TypeTier::DateRange, FieldType::Date));
    }

    if token.ends_with("\\password") {
        return Some((TypeTier::ClassSuffix, FieldType::Password));
    }
    if token.ends_with("\\email") {
        return Some((TypeTier::ClassSuffix, FieldType::Email));
    }

    None
}

fn is_file_indicator(token: &str) -> bool {
    FILE_TOKENS.contains(&token)
        || FILE_PREFIXES.iter().any(|p| token.starts_with(p))
        || FILE_CLASS_SUFFIXES.iter().any(|s| token.ends_with(s))
}
