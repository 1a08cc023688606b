//! Issue types emitted by the bundled JSON Schema validator.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A single validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    /// Data location of the offending value (e.g. "/users/0/email").
    pub data_path: String,
    /// Schema location of the failing keyword (e.g. "#/properties/email/format").
    pub schema_path: String,
    /// Classification of the issue.
    pub kind: IssueKind,
    /// Human-readable description.
    pub message: String,
}

/// Classification of validation issues.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IssueKind {
    /// The value's JSON type is not one of the declared types.
    InvalidType {
        /// Declared type(s), joined with `|` (e.g. "integer|null").
        expected: String,
        /// Actual JSON type of the value.
        found: String,
    },
    /// A `required` property is absent.
    MissingProperty { property: String },
    /// A property is present although `additionalProperties` is `false`.
    UnexpectedProperty { property: String },
    /// The value is not one of the `enum` members.
    NotInEnum,
    /// The value differs from `const`.
    ConstMismatch,
    /// A numeric, length, size or pattern keyword was violated.
    ConstraintViolation {
        /// The keyword that was violated (e.g. "minimum", "pattern").
        constraint: String,
    },
    /// A string does not match its declared `format`.
    InvalidFormat { format: String },
    /// No variant (or, for `oneOf`, not exactly one) of a combinator matched.
    NoMatchingVariant {
        /// `anyOf`, `oneOf` or `not`.
        keyword: String,
    },
    /// Schema nesting passed the configured limit, or a `$ref` looped back to
    /// itself without consuming data.
    DepthExceeded,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.data_path, self.message)
    }
}
