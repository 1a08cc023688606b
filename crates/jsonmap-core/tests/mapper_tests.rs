//! Integration tests for `map_and_validate()` through the public API, using
//! the bundled `JsonSchema` validator and plain closures as schemas.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use jsonmap_core::{
    build_candidate, map_and_validate, IssueKind, JsonSchema, MappingDeclaration, MappingEntry,
    Outcome, TransformRegistry, ValidateOptions, Validation,
};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn compile(schema: Value) -> JsonSchema {
    JsonSchema::compile(schema, ValidateOptions::default()).expect("schema should compile")
}

fn user_schema() -> JsonSchema {
    compile(json!({
        "type": "object",
        "properties": {
            "name": { "type": "string" },
            "email": { "type": "string", "format": "email" },
            "age": { "type": "integer" }
        },
        "required": ["name", "email", "age"]
    }))
}

fn user_mapping() -> MappingDeclaration {
    MappingDeclaration::new()
        .field("name", MappingEntry::new("user.name").with_default(json!("Unknown")))
        .field(
            "email",
            MappingEntry::new("user.email").with_default(json!("email@gmail.com")),
        )
        .field("age", MappingEntry::new("user.age").with_default(json!(0)))
}

// ── Scenarios ───────────────────────────────────────────────────────────────

#[test]
fn test_scenario_defaults_fill_missing_fields() {
    let source = json!({ "user": { "name": "Alice", "age": 25 } });

    let outcome = map_and_validate(&source, &user_mapping(), &user_schema());

    assert_eq!(
        outcome,
        Outcome::Success {
            value: json!({ "name": "Alice", "email": "email@gmail.com", "age": 25 })
        }
    );
}

#[test]
fn test_scenario_array_indices_and_default() {
    let source = json!({
        "users": [
            { "name": "Bob", "age": 30 },
            { "name": "Carol", "age": 28 }
        ]
    });
    let mapping = MappingDeclaration::new()
        .field("firstUserName", MappingEntry::new("users.0.name"))
        .field("secondUserAge", MappingEntry::new("users.1.age"))
        .field(
            "thirdUserName",
            MappingEntry::new("users.2.name").with_default(json!("NoName")),
        );
    let schema = compile(json!({
        "type": "object",
        "properties": {
            "firstUserName": { "type": "string" },
            "secondUserAge": { "type": "integer" },
            "thirdUserName": { "type": "string" }
        },
        "required": ["firstUserName", "secondUserAge", "thirdUserName"]
    }));

    let outcome = map_and_validate(&source, &mapping, &schema);

    assert_eq!(
        outcome.value(),
        Some(&json!({
            "firstUserName": "Bob",
            "secondUserAge": 28,
            "thirdUserName": "NoName"
        }))
    );
}

#[test]
fn test_scenario_wrong_type_fails() {
    let source = json!({ "user": { "name": "Alice", "age": "not-a-number" } });
    let mapping = MappingDeclaration::new()
        .field("name", MappingEntry::new("user.name"))
        .field("age", MappingEntry::new("user.age"));
    let schema = compile(json!({
        "type": "object",
        "properties": { "name": { "type": "string" }, "age": { "type": "integer" } },
        "required": ["age"]
    }));

    let outcome = map_and_validate(&source, &mapping, &schema);

    assert!(!outcome.is_success());
    assert!(outcome.value().is_none());
    let issues = outcome.issues();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].data_path, "/age");
    assert_eq!(issues[0].schema_path, "#/properties/age/type");
    assert_eq!(
        issues[0].kind,
        IssueKind::InvalidType {
            expected: "integer".to_string(),
            found: "string".to_string(),
        }
    );
}

#[test]
fn test_scenario_uppercase_transform() {
    let source = json!({ "user": { "name": "alice" } });
    let registry = TransformRegistry::builtin();
    let uppercase = registry.get("uppercase").cloned().expect("built-in");
    let mapping =
        MappingDeclaration::new().field("name", MappingEntry::new("user.name").with_transform(uppercase));

    let candidate = build_candidate(&source, &mapping);

    assert_eq!(candidate["name"], json!("ALICE"));
}

// ── Properties ──────────────────────────────────────────────────────────────

#[test]
fn test_full_match_passes_values_through() {
    let source = json!({
        "user": { "name": "Dana", "email": "dana@example.org", "age": 41 }
    });

    let outcome = map_and_validate(&source, &user_mapping(), &user_schema());

    assert_eq!(
        outcome.value(),
        Some(&json!({ "name": "Dana", "email": "dana@example.org", "age": 41 }))
    );
}

#[test]
fn test_default_is_transformed() {
    let mapping = MappingDeclaration::new().field(
        "status",
        MappingEntry::new("order.meta.status")
            .with_default(json!("pending"))
            .map(|v| match v {
                Value::String(s) => Value::String(format!("status:{}", s)),
                other => other,
            }),
    );

    let candidate = build_candidate(&json!({ "order": {} }), &mapping);

    assert_eq!(Value::Object(candidate), json!({ "status": "status:pending" }));
}

#[test]
fn test_fields_are_independent() {
    let source = json!({ "a": 1, "b": 2 });
    let both = MappingDeclaration::new()
        .field("x", MappingEntry::new("a"))
        .field("y", MappingEntry::new("missing").with_default(json!("d")));
    let x_only = MappingDeclaration::new().field("x", MappingEntry::new("a"));

    let with_y = build_candidate(&source, &both);
    let without_y = build_candidate(&source, &x_only);

    assert_eq!(with_y["x"], without_y["x"]);
}

#[test]
fn test_null_is_present_and_keeps_default_unused() {
    let source = json!({ "user": { "nickname": null } });
    let mapping = MappingDeclaration::new().field(
        "nickname",
        MappingEntry::new("user.nickname").with_default(json!("anon")),
    );

    let candidate = build_candidate(&source, &mapping);

    assert_eq!(candidate["nickname"], Value::Null);
}

#[test]
fn test_missing_required_field_is_reported() {
    let mapping = MappingDeclaration::new()
        .field("name", MappingEntry::new("user.name"))
        .field("email", MappingEntry::new("user.email"))
        .field("age", MappingEntry::new("user.age"));

    let outcome = map_and_validate(&json!({ "user": { "name": "Alice" } }), &mapping, &user_schema());

    let kinds: Vec<_> = outcome.issues().iter().map(|i| i.kind.clone()).collect();
    assert_eq!(
        kinds,
        vec![
            IssueKind::MissingProperty {
                property: "email".to_string()
            },
            IssueKind::MissingProperty {
                property: "age".to_string()
            },
        ]
    );
}

#[test]
fn test_transform_sees_missing_value_and_fills_required_field() {
    let mapping = MappingDeclaration::new().field(
        "nick",
        MappingEntry::new("user.nick").map(|v| if v.is_null() { json!("filled") } else { v }),
    );
    let schema = compile(json!({
        "type": "object",
        "properties": { "nick": { "type": "string" } },
        "required": ["nick"]
    }));

    let outcome = map_and_validate(&json!({ "user": {} }), &mapping, &schema);

    assert_eq!(
        outcome,
        Outcome::Success {
            value: json!({ "nick": "filled" })
        }
    );
}

#[test]
fn test_builtin_transform_keeps_missing_field_absent() {
    let registry = TransformRegistry::builtin();
    let mapping = MappingDeclaration::new().field(
        "name",
        MappingEntry::new("user.name").with_transform(registry.get("uppercase").unwrap().clone()),
    );

    let candidate = build_candidate(&json!({ "user": {} }), &mapping);

    assert!(candidate.is_empty(), "unexpected candidate: {:?}", candidate);
}

#[test]
fn test_closure_schema_issues_pass_through_in_order() {
    let schema = |candidate: Value| {
        let mut problems = Vec::new();
        if candidate.get("b").is_none() {
            problems.push("b missing".to_string());
        }
        if candidate.get("a") != Some(&json!(1)) {
            problems.push("a must be 1".to_string());
        }
        if problems.is_empty() {
            Validation::Accepted(candidate)
        } else {
            Validation::Rejected(problems)
        }
    };
    let mapping = MappingDeclaration::new().field("a", MappingEntry::new("a"));

    let outcome = map_and_validate(&json!({ "a": 2 }), &mapping, &schema);

    assert_eq!(
        outcome,
        Outcome::Failure {
            issues: vec!["b missing".to_string(), "a must be 1".to_string()]
        }
    );
}

#[test]
fn test_outcome_is_exactly_one_variant() {
    let good = map_and_validate(
        &json!({ "user": { "name": "A", "age": 1 } }),
        &user_mapping(),
        &user_schema(),
    );
    let bad = map_and_validate(
        &json!({ "user": { "name": 7, "age": 1 } }),
        &user_mapping(),
        &user_schema(),
    );

    assert!(good.is_success() && good.issues().is_empty() && good.value().is_some());
    assert!(!bad.is_success() && !bad.issues().is_empty() && bad.value().is_none());
}

#[test]
fn test_each_transform_called_once_per_invocation() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let mapping = MappingDeclaration::new().field(
        "name",
        MappingEntry::new("name").map(move |v| {
            counter.fetch_add(1, Ordering::SeqCst);
            v
        }),
    );
    let reject_all = |_: Value| Validation::Rejected(vec!["no"]);

    map_and_validate(&json!({ "name": "x" }), &mapping, &reject_all);
    map_and_validate(&json!({ "name": "y" }), &mapping, &reject_all);

    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

// ── Mapping Files ───────────────────────────────────────────────────────────

#[test]
fn test_mapping_loaded_from_json() {
    let mapping = MappingDeclaration::from_json_str(
        r#"{
            "name":  { "path": "user.name", "default": "Unknown", "transform": "trim" },
            "email": { "path": ["user", "contact", "email"], "transform": ["trim", "lowercase"] },
            "age":   { "path": "/user/age", "transform": "to_integer" },
            "legacy": null
        }"#,
        &TransformRegistry::builtin(),
    )
    .expect("mapping should load");
    let source = json!({
        "user": {
            "name": "  Alice ",
            "contact": { "email": " ALICE@Example.COM " },
            "age": "25"
        }
    });

    let outcome = map_and_validate(&source, &mapping, &user_schema());

    assert_eq!(
        outcome.value(),
        Some(&json!({ "name": "Alice", "email": "alice@example.com", "age": 25 }))
    );
}

#[test]
fn test_shared_declaration_across_threads() {
    let mapping = Arc::new(user_mapping());
    let schema = Arc::new(user_schema());

    let handles: Vec<_> = (0..4)
        .map(|age| {
            let mapping = Arc::clone(&mapping);
            let schema = Arc::clone(&schema);
            std::thread::spawn(move || {
                let source = json!({ "user": { "name": "T", "age": age } });
                map_and_validate(&source, &mapping, schema.as_ref())
            })
        })
        .collect();

    for (age, handle) in handles.into_iter().enumerate() {
        let outcome = handle.join().expect("thread should not panic");
        assert_eq!(outcome.value().map(|v| v["age"].clone()), Some(json!(age)));
    }
}
