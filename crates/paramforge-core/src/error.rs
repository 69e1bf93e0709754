//! Error types for schema compilation and instance editing.
//!
//! Compilation itself is total: a malformed rule attribute resolves to `None`
//! on the affected field. The variants below only surface from JSON hydration,
//! persistence and explicit edit operations.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParamError {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },

    #[error("Expected a JSON object at the top level, found {found}")]
    NotAnObject { found: String },

    #[error("Refusing to apply an empty object: the edit would delete every field")]
    EmptyEdit,

    #[error("Field {path} holds a file; raw JSON editing is disabled while files are attached")]
    FileGuard { path: String },

    #[error("No field at path {path}")]
    PathNotFound { path: String },

    #[error("Field {path} already exists")]
    DuplicateKey { path: String },

    #[error("Field at {path} cannot hold children")]
    NotAContainer { path: String },

    #[error("Storage error: {0}")]
    Storage(String),
}
