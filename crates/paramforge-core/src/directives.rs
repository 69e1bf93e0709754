//! Manual directives — explicit parameter declarations in doc comments.
//!
//! ```text
//! /// @api-bodyParam string user.email The login email (required)
//! /// @api-bodyParam integer users.*.age
//! /// @api-queryParam string search
//! /// @api-header X-Tenant Tenant identifier
//! /// @api-responseParam 200 integer id
//! ```
//!
//! When a unit declares body parameters this way they replace its inferred
//! rules entirely (see [`crate::compile_unit`]).

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::CompileOptions;
use crate::field_type::declared_type;
use crate::schema::SchemaNode;
use crate::tree::SchemaTreeBuilder;

/// One `{type} {key} {description}` declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualParam {
    #[serde(rename = "type")]
    pub type_name: String,
    pub key: String,
    #[serde(default)]
    pub description: String,
}

/// A documented header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualHeader {
    pub key: String,
    #[serde(default)]
    pub description: String,
}

/// Everything declared in one block of directive text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Directives {
    pub body: Vec<ManualParam>,
    pub query: Vec<ManualParam>,
    pub headers: Vec<ManualHeader>,
    /// Response parameters keyed by status code.
    pub responses: BTreeMap<String, Vec<ManualParam>>,
}

/// Scan directive text. Unrecognized lines are ignored.
pub fn parse_directives(text: &str, options: &CompileOptions) -> Directives {
    let prefix = if options.directive_prefix.is_empty() {
        String::new()
    } else {
        format!("{}-", regex::escape(&options.directive_prefix))
    };

    let param = |tag: &str| {
        Regex::new(&format!(
            r"@{prefix}{tag}\s+(\w+)\s+([\w.*]+)\s*(.*?)\s*$"
        ))
    };
    let header = Regex::new(&format!(r"@{prefix}header\s+([\w.-]+)\s*(.*?)\s*$"));
    let response = Regex::new(&format!(
        r"@{prefix}responseParam\s+(\d+)\s+(\w+)\s+([\w.*]+)\s*(.*?)\s*$"
    ));

    let (Ok(body_re), Ok(query_re), Ok(header_re), Ok(response_re)) =
        (param("bodyParam"), param("queryParam"), header, response)
    else {
        tracing::warn!(
            prefix = %options.directive_prefix,
            "directive prefix produced an invalid pattern"
        );
        return Directives::default();
    };

    let mut directives = Directives::default();

    for line in text.lines() {
        if let Some(c) = body_re.captures(line) {
            directives.body.push(manual_param(&c[1], &c[2], &c[3]));
        } else if let Some(c) = query_re.captures(line) {
            directives.query.push(manual_param(&c[1], &c[2], &c[3]));
        } else if let Some(c) = response_re.captures(line) {
            directives
                .responses
                .entry(c[1].to_string())
                .or_default()
                .push(manual_param(&c[2], &c[3], &c[4]));
        } else if let Some(c) = header_re.captures(line) {
            directives.headers.push(ManualHeader {
                key: c[1].to_string(),
                description: c[2].to_string(),
            });
        }
    }

    directives
}

fn manual_param(type_name: &str, key: &str, description: &str) -> ManualParam {
    ManualParam {
        type_name: type_name.to_lowercase(),
        key: key.to_string(),
        description: description.trim().to_string(),
    }
}

impl SchemaTreeBuilder<'_> {
    /// Compile manual declarations into a schema tree.
    ///
    /// `required` and `nullable` are read from the description text.
    pub fn from_manual(params: &[ManualParam], options: &CompileOptions) -> Vec<SchemaNode> {
        let mut builder = SchemaTreeBuilder::new(options);
        for param in params {
            let lower = param.description.to_lowercase();
            let key = param.key.rsplit('.').next().unwrap_or(&param.key);
            let leaf = SchemaNode {
                required: lower.contains("required"),
                nullable: lower.contains("nullable"),
                description: (!param.description.is_empty()).then(|| param.description.clone()),
                ..SchemaNode::new(key, declared_type(&param.type_name))
            };
            builder.insert(&param.key, leaf);
        }
        builder.build()
    }
}
