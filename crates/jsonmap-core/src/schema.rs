//! The schema capability consumed by the mapper.
//!
//! The mapper treats a schema as opaque: anything that can turn a candidate
//! object into either an accepted value or a list of issues. The bundled
//! [`crate::JsonSchema`] is one implementation; any closure
//! `Fn(Value) -> Validation<I>` is another.

use serde_json::Value;

/// Outcome of validating one candidate.
#[derive(Debug, Clone, PartialEq)]
pub enum Validation<I> {
    /// The candidate conforms. Carries the (possibly coerced) output value.
    Accepted(Value),
    /// The candidate does not conform. Issues are in validator order.
    Rejected(Vec<I>),
}

impl<I> Validation<I> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Validation::Accepted(_))
    }
}

/// A validator for candidate objects.
pub trait Schema {
    /// Structured issue record reported on rejection.
    type Issue;

    /// Validate a candidate, taking ownership so the validator may return a
    /// normalized value without cloning.
    fn validate(&self, candidate: Value) -> Validation<Self::Issue>;
}

impl<F, I> Schema for F
where
    F: Fn(Value) -> Validation<I>,
{
    type Issue = I;

    fn validate(&self, candidate: Value) -> Validation<I> {
        self(candidate)
    }
}
