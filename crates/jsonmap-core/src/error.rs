//! Error types for mapping and schema setup.
//!
//! Validation rejection is never an error: it is reported as
//! [`crate::Outcome::Failure`]. These variants cover loading a mapping
//! declaration and compiling a schema.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("JSON parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Schema error at {path}: {message}")]
    SchemaError { path: String, message: String },

    #[error("Invalid mapping entry for field `{field}`: {message}")]
    InvalidMapping { field: String, message: String },

    #[error("Unknown transform `{name}` for field `{field}`")]
    UnknownTransform { field: String, name: String },

    #[error("Schema nesting depth exceeded at {path} (max: {max_depth})")]
    RecursionDepthExceeded { path: String, max_depth: usize },
}
