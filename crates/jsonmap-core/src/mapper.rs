//! The map-and-validate operation.
//!
//! Each declared field is extracted from the source, defaulted, transformed
//! and stored in a fresh candidate object; the complete candidate is then
//! handed to the schema. Extraction never fails: a missing value takes its
//! default, is handed to the transform as absence, or (with neither) leaves
//! the field absent for the schema to judge.

use serde_json::{Map, Value};

use crate::mapping::MappingDeclaration;
use crate::outcome::Outcome;
use crate::path::get;
use crate::schema::{Schema, Validation};

/// Extract, default, transform and validate.
///
/// Returns [`Outcome::Success`] with the schema's output value, or
/// [`Outcome::Failure`] with the schema's issues exactly as reported.
/// A panic inside a caller-supplied transform is not caught.
///
/// ```rust
/// use jsonmap_core::{map_and_validate, JsonSchema, MappingDeclaration, MappingEntry, ValidateOptions};
/// use serde_json::json;
///
/// let source = json!({ "user": { "name": "Alice", "age": 25 } });
/// let mapping = MappingDeclaration::new()
///     .field("name", MappingEntry::new("user.name").with_default(json!("Unknown")))
///     .field("age", MappingEntry::new("user.age").with_default(json!(0)));
/// let schema = JsonSchema::compile(
///     json!({
///         "type": "object",
///         "properties": { "name": { "type": "string" }, "age": { "type": "integer" } },
///         "required": ["name", "age"]
///     }),
///     ValidateOptions::default(),
/// )
/// .unwrap();
///
/// let outcome = map_and_validate(&source, &mapping, &schema);
/// assert_eq!(outcome.value(), Some(&json!({ "name": "Alice", "age": 25 })));
/// ```
pub fn map_and_validate<S>(source: &Value, mapping: &MappingDeclaration, schema: &S) -> Outcome<S::Issue>
where
    S: Schema + ?Sized,
{
    let candidate = build_candidate(source, mapping);
    tracing::debug!(fields = candidate.len(), "validating candidate");

    let validation = schema.validate(Value::Object(candidate));
    match &validation {
        Validation::Rejected(issues) if issues.is_empty() => {
            tracing::warn!("schema rejected the candidate without reporting any issue");
        }
        Validation::Rejected(issues) => tracing::debug!(issues = issues.len(), "candidate rejected"),
        Validation::Accepted(_) => tracing::debug!("candidate accepted"),
    }
    Outcome::from(validation)
}

/// Build the unvalidated candidate object for `source`.
///
/// One entry per declared field, except:
/// - fields declared without an entry are skipped (logged at `warn`);
/// - fields whose path is missing, with no default and no transform, are
///   left out;
/// - a transform that returns absence (see [`crate::Transform::optional`])
///   leaves its field out.
pub fn build_candidate(source: &Value, mapping: &MappingDeclaration) -> Map<String, Value> {
    let mut candidate = Map::new();

    for (field, entry) in mapping.iter() {
        let Some(entry) = entry else {
            tracing::warn!(field = %field, "mapping field has no entry; skipping");
            continue;
        };

        let resolved = get(source, &entry.path, entry.default.as_ref());
        if resolved.is_none() {
            tracing::debug!(field = %field, path = %entry.path, "path missing and no default");
        }

        let value = match &entry.transform {
            Some(transform) => {
                tracing::debug!(field = %field, transform = transform.name(), "applying transform");
                transform.apply_optional(resolved)
            }
            None => resolved,
        };

        match value {
            Some(value) => {
                candidate.insert(field.to_string(), value);
            }
            None => tracing::debug!(field = %field, "field left absent"),
        }
    }

    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::MappingEntry;
    use crate::transforms::Transform;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn accept_all(candidate: Value) -> Validation<String> {
        Validation::Accepted(candidate)
    }

    #[test]
    fn test_empty_mapping_validates_empty_object() {
        let outcome = map_and_validate(&json!({ "a": 1 }), &MappingDeclaration::new(), &accept_all);
        assert_eq!(outcome, Outcome::Success { value: json!({}) });
    }

    #[test]
    fn test_default_substituted_for_missing_path() {
        let mapping = MappingDeclaration::new().field(
            "deep",
            MappingEntry::new("a.b.c.d.e.f").with_default(json!("fallback")),
        );
        let candidate = build_candidate(&json!({ "a": { "b": {} } }), &mapping);
        assert_eq!(Value::Object(candidate), json!({ "deep": "fallback" }));
    }

    #[test]
    fn test_transform_receives_default() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let mapping = MappingDeclaration::new().field(
            "name",
            MappingEntry::new("user.name")
                .with_default(json!("unknown"))
                .map(move |v| {
                    sink.lock().unwrap().push(v.clone());
                    v
                }),
        );

        build_candidate(&json!({}), &mapping);
        assert_eq!(*seen.lock().unwrap(), vec![json!("unknown")]);
    }

    #[test]
    fn test_transform_fills_missing_field_without_default() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let mapping = MappingDeclaration::new().field(
            "nick",
            MappingEntry::new("user.nick").map(move |v| {
                counter.fetch_add(1, Ordering::SeqCst);
                if v.is_null() {
                    json!("filled")
                } else {
                    v
                }
            }),
        );

        let candidate = build_candidate(&json!({ "user": {} }), &mapping);
        assert_eq!(Value::Object(candidate), json!({ "nick": "filled" }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_missing_without_default_or_transform_is_absent() {
        let mapping = MappingDeclaration::new().field("email", MappingEntry::new("user.email"));
        let candidate = build_candidate(&json!({ "user": {} }), &mapping);
        assert!(candidate.is_empty());
    }

    #[test]
    fn test_optional_transform_sees_absence() {
        let mapping = MappingDeclaration::new()
            .field(
                "present",
                MappingEntry::new("a").with_transform(Transform::optional("tag", |v| {
                    Some(json!(v.is_some()))
                })),
            )
            .field(
                "missing",
                MappingEntry::new("b").with_transform(Transform::optional("tag", |v| {
                    Some(json!(v.is_some()))
                })),
            )
            .field(
                "dropped",
                MappingEntry::new("a").with_transform(Transform::optional("drop", |_| None)),
            );

        let candidate = build_candidate(&json!({ "a": 1 }), &mapping);
        assert_eq!(
            Value::Object(candidate),
            json!({ "present": true, "missing": false })
        );
    }

    #[test]
    fn test_entry_less_field_is_skipped() {
        let mut mapping = MappingDeclaration::new();
        mapping
            .insert("name", MappingEntry::new("name"))
            .insert_empty("typo");

        let candidate = build_candidate(&json!({ "name": "x", "typo": "y" }), &mapping);
        assert_eq!(Value::Object(candidate), json!({ "name": "x" }));
    }

    #[test]
    fn test_rejection_passes_issues_through() {
        let reject = |_: Value| Validation::Rejected(vec!["second", "first", "second"]);
        let outcome = map_and_validate(&json!({}), &MappingDeclaration::new(), &reject);
        assert_eq!(
            outcome,
            Outcome::Failure {
                issues: vec!["second", "first", "second"]
            }
        );
    }

    #[test]
    fn test_success_carries_validator_output() {
        let normalize = |_: Value| Validation::<String>::Accepted(json!({ "normalized": true }));
        let mapping = MappingDeclaration::new().field("x", MappingEntry::new("x"));
        let outcome = map_and_validate(&json!({ "x": 1 }), &mapping, &normalize);
        assert_eq!(outcome.value(), Some(&json!({ "normalized": true })));
    }

    #[test]
    #[should_panic(expected = "transform blew up")]
    fn test_transform_panic_propagates() {
        let mapping = MappingDeclaration::new().field(
            "x",
            MappingEntry::new("x").map(|_| panic!("transform blew up")),
        );
        map_and_validate(&json!({ "x": 1 }), &mapping, &accept_all);
    }
}
