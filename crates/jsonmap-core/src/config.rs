//! Configuration for the bundled schema validator.

use serde::{Deserialize, Serialize};

/// Options for compiling a [`crate::JsonSchema`].
///
/// ## Serialization Format
///
/// Fields are serialized in `kebab-case` (e.g., `coerce-types`, `max-depth`).
/// This naming convention is part of the public API contract for config files.
/// Missing fields fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ValidateOptions {
    /// Losslessly coerce string/number/boolean values to the declared
    /// primitive type before checking. Default: false.
    pub coerce_types: bool,
    /// Check the `format` keyword (`email`, `uri`, `date`, ...). When off,
    /// `format` is treated as an annotation. Default: true.
    pub check_formats: bool,
    /// Maximum schema nesting depth, counted across `$ref` hops during
    /// validation (stack overflow guard). Default: 64.
    pub max_depth: usize,
}

impl Default for ValidateOptions {
    fn default() -> Self {
        Self {
            coerce_types: false,
            check_formats: true,
            max_depth: 64,
        }
    }
}
