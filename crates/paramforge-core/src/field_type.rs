//! Semantic field types and the shared lookup tables that produce them.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The semantic type of a schema or instance field.
///
/// Serialized as a bare lowercase string. Any name outside the fixed set
/// (dynamic formats such as `uuid`, custom rule names) round-trips through
/// [`FieldType::Other`] verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    #[default]
    Text,
    String,
    Email,
    Url,
    Number,
    Boolean,
    Date,
    Password,
    Color,
    Json,
    File,
    Select,
    Object,
    Array,
    /// A dynamic format or custom rule name with no native widget.
    Other(String),
}

/// Structural class of a field: what kind of editor it needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Scalar,
    List,
    Object,
}

/// Rule names mapped to a native type (tier 2 of type resolution).
pub(crate) const NATIVE_TYPES: &[(&str, FieldType)] = &[
    ("email", FieldType::Email),
    ("url", FieldType::Url),
    ("active_url", FieldType::Url),
    ("integer", FieldType::Number),
    ("numeric", FieldType::Number),
    ("decimal", FieldType::Number),
    ("float", FieldType::Number),
    ("boolean", FieldType::Boolean),
    ("bool", FieldType::Boolean),
    ("date", FieldType::Date),
    ("password", FieldType::Password),
    ("hex_color", FieldType::Color),
    ("json", FieldType::Json),
    ("array", FieldType::Array),
];

/// Type names accepted by manual directives, mapped to schema types.
/// Names not listed here pass through verbatim.
const DECLARED_TYPES: &[(&str, FieldType)] = &[
    ("string", FieldType::Text),
    ("str", FieldType::Text),
    ("text", FieldType::Text),
    ("int", FieldType::Number),
    ("integer", FieldType::Number),
    ("float", FieldType::Number),
    ("double", FieldType::Number),
    ("numeric", FieldType::Number),
    ("number", FieldType::Number),
    ("bool", FieldType::Boolean),
    ("boolean", FieldType::Boolean),
    ("file", FieldType::File),
    ("image", FieldType::File),
    ("date", FieldType::Date),
    ("datetime", FieldType::Date),
    ("email", FieldType::Email),
    ("url", FieldType::Url),
    ("json", FieldType::Json),
    ("array", FieldType::Array),
    ("object", FieldType::Object),
    ("password", FieldType::Password),
    ("color", FieldType::Color),
    ("select", FieldType::Select),
];

/// String-valued formats that the payload compiler never casts.
const STRING_FORMATS: &[&str] = &["uuid", "ulid", "ip", "ipv4", "ipv6", "mac_address"];

/// Look up a native type for a bare rule name.
pub(crate) fn native_type(rule: &str) -> Option<FieldType> {
    NATIVE_TYPES
        .iter()
        .find(|(name, _)| *name == rule)
        .map(|(_, ty)| ty.clone())
}

/// Normalize a type name written in a manual directive.
pub fn declared_type(name: &str) -> FieldType {
    let lower = name.trim().to_lowercase();
    DECLARED_TYPES
        .iter()
        .find(|(n, _)| *n == lower)
        .map(|(_, ty)| ty.clone())
        .unwrap_or_else(|| FieldType::from(lower))
}

impl FieldType {
    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Text => "text",
            FieldType::String => "string",
            FieldType::Email => "email",
            FieldType::Url => "url",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
            FieldType::Password => "password",
            FieldType::Color => "color",
            FieldType::Json => "json",
            FieldType::File => "file",
            FieldType::Select => "select",
            FieldType::Object => "object",
            FieldType::Array => "array",
            FieldType::Other(name) => name,
        }
    }

    pub fn shape(&self) -> Shape {
        match self {
            FieldType::Object => Shape::Object,
            FieldType::Array => Shape::List,
            _ => Shape::Scalar,
        }
    }

    /// Types whose values stay strings in a compiled payload.
    pub fn is_string_pinned(&self) -> bool {
        match self {
            FieldType::Text
            | FieldType::String
            | FieldType::Email
            | FieldType::Url
            | FieldType::Password
            | FieldType::Color
            | FieldType::Date => true,
            FieldType::Other(name) => STRING_FORMATS.contains(&name.as_str()),
            _ => false,
        }
    }

    /// Types whose values are numbers in a compiled payload.
    pub fn is_numeric(&self) -> bool {
        match self {
            FieldType::Number => true,
            FieldType::Other(name) => name == "integer" || name == "numeric",
            _ => false,
        }
    }
}

impl From<String> for FieldType {
    fn from(name: String) -> Self {
        match name.as_str() {
            "text" => FieldType::Text,
            "string" => FieldType::String,
            "email" => FieldType::Email,
            "url" => FieldType::Url,
            "number" => FieldType::Number,
            "boolean" => FieldType::Boolean,
            "date" => FieldType::Date,
            "password" => FieldType::Password,
            "color" => FieldType::Color,
            "json" => FieldType::Json,
            "file" => FieldType::File,
            "select" => FieldType::Select,
            "object" => FieldType::Object,
            "array" => FieldType::Array,
            _ => FieldType::Other(name),
        }
    }
}

impl From<&str> for FieldType {
    fn from(name: &str) -> Self {
        FieldType::from(name.to_string())
    }
}

impl From<FieldType> for String {
    fn from(ty: FieldType) -> Self {
        match ty {
            FieldType::Other(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_type_serializes_as_bare_string() {
        assert_eq!(serde_json::to_value(FieldType::Email).unwrap(), json!("email"));
        assert_eq!(
            serde_json::to_value(FieldType::Other("uuid".into())).unwrap(),
            json!("uuid")
        );
        let parsed: FieldType = serde_json::from_value(json!("mac_address")).unwrap();
        assert_eq!(parsed, FieldType::Other("mac_address".into()));
        let parsed: FieldType = serde_json::from_value(json!("object")).unwrap();
        assert_eq!(parsed, FieldType::Object);
    }

    #[test]
    fn test_declared_type_table() {
        assert_eq!(declared_type("String"), FieldType::Text);
        assert_eq!(declared_type("int"), FieldType::Number);
        assert_eq!(declared_type("image"), FieldType::File);
        assert_eq!(declared_type("datetime"), FieldType::Date);
        assert_eq!(declared_type("uuid"), FieldType::Other("uuid".into()));
    }

    #[test]
    fn test_shapes() {
        assert_eq!(FieldType::Object.shape(), Shape::Object);
        assert_eq!(FieldType::Array.shape(), Shape::List);
        assert_eq!(FieldType::Select.shape(), Shape::Scalar);
    }
}
