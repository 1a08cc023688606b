//! Tagged result of one map-and-validate invocation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::issue::Issue;
use crate::schema::Validation;

/// Either the validated output or the validator's issues, never both.
///
/// Serializes as `{"status": "success", "value": ...}` or
/// `{"status": "failure", "issues": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<I = Issue> {
    Success { value: Value },
    Failure { issues: Vec<I> },
}

impl<I> Outcome<I> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The validated value, if the outcome is a success.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Outcome::Success { value } => Some(value),
            Outcome::Failure { .. } => None,
        }
    }

    /// The issues, empty for a success.
    pub fn issues(&self) -> &[I] {
        match self {
            Outcome::Success { .. } => &[],
            Outcome::Failure { issues } => issues,
        }
    }

    /// Convert into a standard `Result` for `?`-style callers.
    pub fn into_result(self) -> Result<Value, Vec<I>> {
        match self {
            Outcome::Success { value } => Ok(value),
            Outcome::Failure { issues } => Err(issues),
        }
    }
}

impl<I> From<Validation<I>> for Outcome<I> {
    fn from(validation: Validation<I>) -> Self {
        match validation {
            Validation::Accepted(value) => Outcome::Success { value },
            Validation::Rejected(issues) => Outcome::Failure { issues },
        }
    }
}
