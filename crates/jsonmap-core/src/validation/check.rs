//! Keyword checks: walks schema and data in parallel, collecting issues.
//!
//! Issue order is deterministic: at each node `type` is checked first (a type
//! mismatch stops further checks at that node), then `enum`/`const`, then the
//! keywords for the value's type, then combinators. Object properties follow
//! the key order of the schema's `properties` map; `required` follows
//! declaration order.
//!
//! A `$ref` reached again at the same data node, with no child value stepped
//! into since it was first followed, is reported as `depth_exceeded` on the
//! spot. Combinators over such a cycle then stay linear instead of branching
//! until `max_depth`.

use std::cmp::Ordering;
use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map, Number, Value};

use super::formats::FormatChecker;
use super::{declared_types, json_type_name, type_matches, RefChain};
use crate::config::ValidateOptions;
use crate::issue::{Issue, IssueKind};
use crate::pointer::{build_path, display_data_path, escape_pointer_segment, resolve_pointer};

pub(super) struct Checker<'s> {
    pub(super) root: &'s Value,
    pub(super) options: &'s ValidateOptions,
    pub(super) patterns: &'s HashMap<String, Regex>,
    pub(super) formats: &'s FormatChecker,
}

/// Location of the node being checked.
#[derive(Clone, Copy)]
struct At<'p> {
    data: &'p str,
    schema: &'p str,
    depth: usize,
    /// References followed at this data node; cleared on every step into a child.
    refs: Option<&'p RefChain<'p>>,
}

impl At<'_> {
    fn issue(&self, keyword: &str, kind: IssueKind, message: String) -> Issue {
        Issue {
            data_path: display_data_path(self.data),
            schema_path: build_path(self.schema, &[keyword]),
            kind,
            message,
        }
    }
}

impl Checker<'_> {
    pub(super) fn check(
        &self,
        data: &Value,
        schema: &Value,
        data_path: &str,
        schema_path: &str,
        depth: usize,
        issues: &mut Vec<Issue>,
    ) {
        let at = At {
            data: data_path,
            schema: schema_path,
            depth,
            refs: None,
        };
        self.check_at(data, schema, at, issues);
    }

    fn check_at(&self, data: &Value, schema: &Value, at: At<'_>, issues: &mut Vec<Issue>) {
        if at.depth > self.options.max_depth {
            issues.push(Issue {
                data_path: display_data_path(at.data),
                schema_path: at.schema.to_string(),
                kind: IssueKind::DepthExceeded,
                message: format!("schema nesting exceeds max depth {}", self.options.max_depth),
            });
            return;
        }

        let obj = match schema {
            Value::Object(obj) => obj,
            Value::Bool(false) => {
                issues.push(Issue {
                    data_path: display_data_path(at.data),
                    schema_path: at.schema.to_string(),
                    kind: IssueKind::ConstraintViolation {
                        constraint: "false".to_string(),
                    },
                    message: "no value is allowed here".to_string(),
                });
                return;
            }
            // `true` and malformed schema nodes accept everything.
            _ => return,
        };

        if let Some(reference) = obj.get("$ref").and_then(Value::as_str) {
            if RefChain::contains(at.refs, reference) {
                issues.push(at.issue(
                    "$ref",
                    IssueKind::DepthExceeded,
                    format!("reference {:?} loops back to itself without consuming data", reference),
                ));
                return;
            }
            if let Some(target) = resolve_pointer(self.root, reference) {
                let chain = RefChain::push(reference, at.refs);
                let ref_at = At {
                    data: at.data,
                    schema: reference,
                    depth: at.depth + 1,
                    refs: Some(&chain),
                };
                self.check_at(data, target, ref_at, issues);
            }
        }

        let types = declared_types(obj);
        if !types.is_empty() && !type_matches(data, &types) {
            let expected = types.join("|");
            let found = json_type_name(data);
            issues.push(at.issue(
                "type",
                IssueKind::InvalidType {
                    expected: expected.clone(),
                    found: found.to_string(),
                },
                format!("expected {}, found {}", expected, found),
            ));
            return;
        }

        if let Some(Value::Array(allowed)) = obj.get("enum") {
            if !allowed.contains(data) {
                issues.push(at.issue(
                    "enum",
                    IssueKind::NotInEnum,
                    format!("value {} is not one of the allowed values", data),
                ));
            }
        }

        if let Some(expected) = obj.get("const") {
            if data != expected {
                issues.push(at.issue(
                    "const",
                    IssueKind::ConstMismatch,
                    format!("value {} does not equal {}", data, expected),
                ));
            }
        }

        match data {
            Value::String(s) => self.check_string(s, obj, at, issues),
            Value::Number(n) => check_number(n, obj, at, issues),
            Value::Array(items) => self.check_array(items, obj, at, issues),
            Value::Object(map) => self.check_object(map, obj, at, issues),
            Value::Null | Value::Bool(_) => {}
        }

        self.check_combinators(data, obj, at, issues);
    }

    // -----------------------------------------------------------------------
    // Strings
    // -----------------------------------------------------------------------

    fn check_string(&self, s: &str, obj: &Map<String, Value>, at: At<'_>, issues: &mut Vec<Issue>) {
        let char_count = s.chars().count() as u64;

        if let Some(bound) = obj.get("minLength").and_then(Value::as_u64) {
            if char_count < bound {
                issues.push(at.issue(
                    "minLength",
                    constraint("minLength"),
                    format!("string length {} is less than minLength {}", char_count, bound),
                ));
            }
        }

        if let Some(bound) = obj.get("maxLength").and_then(Value::as_u64) {
            if char_count > bound {
                issues.push(at.issue(
                    "maxLength",
                    constraint("maxLength"),
                    format!("string length {} exceeds maxLength {}", char_count, bound),
                ));
            }
        }

        if let Some(pattern) = obj.get("pattern").and_then(Value::as_str) {
            if let Some(re) = self.patterns.get(pattern) {
                if !re.is_match(s) {
                    issues.push(at.issue(
                        "pattern",
                        constraint("pattern"),
                        format!("value {:?} does not match pattern {:?}", s, pattern),
                    ));
                }
            }
        }

        if self.options.check_formats {
            if let Some(format) = obj.get("format").and_then(Value::as_str) {
                if !self.formats.is_valid(format, s) {
                    issues.push(at.issue(
                        "format",
                        IssueKind::InvalidFormat {
                            format: format.to_string(),
                        },
                        format!("value {:?} is not a valid {}", s, format),
                    ));
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // Arrays
    // -----------------------------------------------------------------------

    fn check_array(&self, items: &[Value], obj: &Map<String, Value>, at: At<'_>, issues: &mut Vec<Issue>) {
        let len = items.len() as u64;

        if let Some(bound) = obj.get("minItems").and_then(Value::as_u64) {
            if len < bound {
                issues.push(at.issue(
                    "minItems",
                    constraint("minItems"),
                    format!("array length {} is less than minItems {}", len, bound),
                ));
            }
        }

        if let Some(bound) = obj.get("maxItems").and_then(Value::as_u64) {
            if len > bound {
                issues.push(at.issue(
                    "maxItems",
                    constraint("maxItems"),
                    format!("array length {} exceeds maxItems {}", len, bound),
                ));
            }
        }

        if obj.get("uniqueItems") == Some(&Value::Bool(true)) {
            if let Some((first, second)) = first_duplicate(items) {
                issues.push(at.issue(
                    "uniqueItems",
                    constraint("uniqueItems"),
                    format!("items at {} and {} are equal", first, second),
                ));
            }
        }

        // `prefixItems` (or draft-4 array-form `items`) validates by position;
        // object-form `items` validates everything past the prefix.
        let (positional_keyword, positional) = match obj.get("prefixItems").and_then(Value::as_array) {
            Some(prefix) => ("prefixItems", Some(prefix)),
            None => ("items", obj.get("items").and_then(Value::as_array)),
        };
        let uniform = obj.get("items").filter(|s| !s.is_array());

        for (i, item) in items.iter().enumerate() {
            let index = i.to_string();
            let (sub_schema, sub_path) = match positional.and_then(|p| p.get(i)) {
                Some(s) => (s, build_path(at.schema, &[positional_keyword, index.as_str()])),
                None => match uniform {
                    Some(s) => (s, build_path(at.schema, &["items"])),
                    None => continue,
                },
            };
            let data_path = format!("{}/{}", at.data, i);
            let child = At {
                data: &data_path,
                schema: &sub_path,
                depth: at.depth + 1,
                refs: None,
            };
            self.check_at(item, sub_schema, child, issues);
        }
    }

    // -----------------------------------------------------------------------
    // Objects
    // -----------------------------------------------------------------------

    fn check_object(
        &self,
        map: &Map<String, Value>,
        obj: &Map<String, Value>,
        at: At<'_>,
        issues: &mut Vec<Issue>,
    ) {
        if let Some(Value::Array(required)) = obj.get("required") {
            for name in required.iter().filter_map(Value::as_str) {
                if !map.contains_key(name) {
                    issues.push(at.issue(
                        "required",
                        IssueKind::MissingProperty {
                            property: name.to_string(),
                        },
                        format!("missing required property `{}`", name),
                    ));
                }
            }
        }

        let properties = obj.get("properties").and_then(Value::as_object);
        if let Some(props) = properties {
            for (key, sub_schema) in props {
                if let Some(value) = map.get(key) {
                    let data_path = format!("{}/{}", at.data, escape_pointer_segment(key));
                    let schema_path = build_path(at.schema, &["properties", key.as_str()]);
                    let child = At {
                        data: &data_path,
                        schema: &schema_path,
                        depth: at.depth + 1,
                        refs: None,
                    };
                    self.check_at(value, sub_schema, child, issues);
                }
            }
        }

        let Some(additional) = obj.get("additionalProperties") else {
            return;
        };
        let schema_path = build_path(at.schema, &["additionalProperties"]);
        for (key, value) in map {
            if properties.is_some_and(|p| p.contains_key(key)) {
                continue;
            }
            let data_path = format!("{}/{}", at.data, escape_pointer_segment(key));
            match additional {
                Value::Bool(false) => issues.push(Issue {
                    data_path: display_data_path(&data_path),
                    schema_path: schema_path.clone(),
                    kind: IssueKind::UnexpectedProperty {
                        property: key.clone(),
                    },
                    message: format!("unexpected property `{}`", key),
                }),
                Value::Object(_) => {
                    let child = At {
                        data: &data_path,
                        schema: &schema_path,
                        depth: at.depth + 1,
                        refs: None,
                    };
                    self.check_at(value, additional, child, issues);
                }
                _ => {}
            }
        }
    }

    // -----------------------------------------------------------------------
    // Combinators
    // -----------------------------------------------------------------------

    fn check_combinators(&self, data: &Value, obj: &Map<String, Value>, at: At<'_>, issues: &mut Vec<Issue>) {
        if let Some(all) = obj.get("allOf").and_then(Value::as_array) {
            for (i, sub) in all.iter().enumerate() {
                let index = i.to_string();
                let schema_path = build_path(at.schema, &["allOf", index.as_str()]);
                let child = At {
                    schema: &schema_path,
                    depth: at.depth + 1,
                    ..at
                };
                self.check_at(data, sub, child, issues);
            }
        }

        if let Some(variants) = obj.get("anyOf").and_then(Value::as_array) {
            if self.count_matches(data, variants, "anyOf", at) == 0 {
                issues.push(at.issue(
                    "anyOf",
                    IssueKind::NoMatchingVariant {
                        keyword: "anyOf".to_string(),
                    },
                    format!("value matches none of the {} anyOf variants", variants.len()),
                ));
            }
        }

        if let Some(variants) = obj.get("oneOf").and_then(Value::as_array) {
            let matched = self.count_matches(data, variants, "oneOf", at);
            if matched != 1 {
                issues.push(at.issue(
                    "oneOf",
                    IssueKind::NoMatchingVariant {
                        keyword: "oneOf".to_string(),
                    },
                    format!("value matches {} oneOf variants, expected exactly one", matched),
                ));
            }
        }

        if let Some(forbidden) = obj.get("not") {
            let schema_path = build_path(at.schema, &["not"]);
            let child = At {
                schema: &schema_path,
                depth: at.depth + 1,
                ..at
            };
            if self.passes(data, forbidden, child) {
                issues.push(at.issue(
                    "not",
                    IssueKind::NoMatchingVariant {
                        keyword: "not".to_string(),
                    },
                    "value must not match the `not` schema".to_string(),
                ));
            }
        }
    }

    fn count_matches(&self, data: &Value, variants: &[Value], keyword: &str, at: At<'_>) -> usize {
        variants
            .iter()
            .enumerate()
            .filter(|(i, variant)| {
                let index = i.to_string();
                let schema_path = build_path(at.schema, &[keyword, index.as_str()]);
                let child = At {
                    schema: &schema_path,
                    depth: at.depth + 1,
                    ..at
                };
                self.passes(data, variant, child)
            })
            .count()
    }

    fn passes(&self, data: &Value, schema: &Value, at: At<'_>) -> bool {
        let mut scratch = Vec::new();
        self.check_at(data, schema, at, &mut scratch);
        scratch.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Numbers
// ---------------------------------------------------------------------------

fn check_number(n: &Number, obj: &Map<String, Value>, at: At<'_>, issues: &mut Vec<Issue>) {
    let bound = |keyword: &str| match obj.get(keyword) {
        Some(Value::Number(b)) => Some(b),
        _ => None,
    };

    if let Some(b) = bound("minimum") {
        if compare_numbers(n, b) == Some(Ordering::Less) {
            issues.push(at.issue(
                "minimum",
                constraint("minimum"),
                format!("value {} is less than minimum {}", n, b),
            ));
        }
    }

    if let Some(b) = bound("maximum") {
        if compare_numbers(n, b) == Some(Ordering::Greater) {
            issues.push(at.issue(
                "maximum",
                constraint("maximum"),
                format!("value {} exceeds maximum {}", n, b),
            ));
        }
    }

    if let Some(b) = bound("exclusiveMinimum") {
        if matches!(compare_numbers(n, b), Some(Ordering::Less | Ordering::Equal)) {
            issues.push(at.issue(
                "exclusiveMinimum",
                constraint("exclusiveMinimum"),
                format!("value {} is not greater than exclusive minimum {}", n, b),
            ));
        }
    }

    if let Some(b) = bound("exclusiveMaximum") {
        if matches!(compare_numbers(n, b), Some(Ordering::Greater | Ordering::Equal)) {
            issues.push(at.issue(
                "exclusiveMaximum",
                constraint("exclusiveMaximum"),
                format!("value {} is not less than exclusive maximum {}", n, b),
            ));
        }
    }

    if let Some(b) = bound("multipleOf") {
        if !is_multiple_of(n, b) {
            issues.push(at.issue(
                "multipleOf",
                constraint("multipleOf"),
                format!("value {} is not a multiple of {}", n, b),
            ));
        }
    }
}

/// Compare exactly when both sides fit the same integer type, otherwise as
/// floats.
fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        return Some(x.cmp(&y));
    }
    if let (Some(x), Some(y)) = (a.as_u64(), b.as_u64()) {
        return Some(x.cmp(&y));
    }
    a.as_f64()?.partial_cmp(&b.as_f64()?)
}

/// Non-positive divisors are malformed and always pass.
fn is_multiple_of(n: &Number, divisor: &Number) -> bool {
    if let (Some(x), Some(m)) = (n.as_i64(), divisor.as_i64()) {
        return m <= 0 || x.checked_rem(m).map_or(true, |r| r == 0);
    }
    match (n.as_f64(), divisor.as_f64()) {
        (Some(x), Some(m)) if m > 0.0 => {
            let quotient = x / m;
            (quotient - quotient.round()).abs() < 1e-9
        }
        _ => true,
    }
}

fn first_duplicate(items: &[Value]) -> Option<(usize, usize)> {
    for (i, a) in items.iter().enumerate() {
        for (j, b) in items.iter().enumerate().skip(i + 1) {
            if a == b {
                return Some((i, j));
            }
        }
    }
    None
}

fn constraint(keyword: &str) -> IssueKind {
    IssueKind::ConstraintViolation {
        constraint: keyword.to_string(),
    }
}
