//! Type coercion: fixes primitive type mismatches before validation.
//!
//! Mapped data often carries the right value in the wrong JSON type (a
//! numeric string from a form post, a number where an identifier string was
//! declared). This walks the schema and data in parallel, applying safe,
//! lossless coercions:
//!
//! | Got | Expected | Action |
//! |-----|----------|--------|
//! | number | `"string"` | `value.to_string()` |
//! | boolean | `"string"` | `"true"` / `"false"` |
//! | `"string"` | `"integer"` | parse as i64 (validate roundtrip) |
//! | `"string"` | `"number"` | parse as f64 (validate roundtrip) |
//! | `"true"` / `"false"` | `"boolean"` | boolean |
//!
//! Values that cannot be coerced are left alone so validation reports them.

use serde_json::{Number, Value};

use super::{declared_types, json_type_name, type_matches, RefChain};
use crate::pointer::{escape_pointer_segment, resolve_pointer};

/// Coerce `data` in place to match `schema`. Returns the number of values
/// changed.
pub(crate) fn coerce_types(data: &mut Value, root: &Value, max_depth: usize) -> usize {
    let mut walker = CoerceWalker {
        root,
        max_depth,
        coerced: 0,
    };
    walker.walk(data, root, "", 0, None);
    walker.coerced
}

struct CoerceWalker<'s> {
    root: &'s Value,
    max_depth: usize,
    coerced: usize,
}

impl CoerceWalker<'_> {
    fn walk(
        &mut self,
        data: &mut Value,
        schema: &Value,
        path: &str,
        depth: usize,
        refs: Option<&RefChain<'_>>,
    ) {
        let root = self.root;
        if depth > self.max_depth {
            return;
        }
        let Some(schema_obj) = schema.as_object() else {
            return;
        };

        if let Some(reference) = schema_obj.get("$ref").and_then(Value::as_str) {
            if !RefChain::contains(refs, reference) {
                if let Some(target) = resolve_pointer(root, reference) {
                    let chain = RefChain::push(reference, refs);
                    self.walk(data, target, path, depth + 1, Some(&chain));
                }
            }
        }

        let expected_types = declared_types(schema_obj);

        // --- Attempt type coercion at this node ---
        if !expected_types.is_empty() && !data.is_null() {
            if let Some(msg) = try_coerce(data, &expected_types) {
                tracing::debug!(data_path = %path, "{}", msg);
                self.coerced += 1;
            }
        }

        // --- Recurse into children ---

        if let (Some(data_obj), Some(props)) = (
            data.as_object_mut(),
            schema_obj.get("properties").and_then(Value::as_object),
        ) {
            for (key, child) in data_obj.iter_mut() {
                if let Some(prop_schema) = props.get(key) {
                    let child_path = format!("{}/{}", path, escape_pointer_segment(key));
                    self.walk(child, prop_schema, &child_path, depth + 1, None);
                }
            }
        }

        if let Some(data_arr) = data.as_array_mut() {
            let prefix_items = schema_obj.get("prefixItems").and_then(Value::as_array);
            let items_schema = schema_obj.get("items");

            for (i, item) in data_arr.iter_mut().enumerate() {
                let child_path = format!("{}/{}", path, i);
                // Positional schema from prefixItems wins over uniform items.
                if let Some(positional) = prefix_items.and_then(|pi| pi.get(i)) {
                    self.walk(item, positional, &child_path, depth + 1, None);
                } else if let Some(uniform) = items_schema {
                    self.walk(item, uniform, &child_path, depth + 1, None);
                }
            }
        }

        // anyOf / oneOf: descend into the first variant whose type already
        // matches, so a union never picks a coercion over an exact match.
        for keyword in ["anyOf", "oneOf"] {
            if let Some(variants) = schema_obj.get(keyword).and_then(Value::as_array) {
                let chosen = variants.iter().find(|variant| {
                    variant
                        .as_object()
                        .map(declared_types)
                        .is_some_and(|types| type_matches(data, &types))
                });
                if let Some(variant) = chosen {
                    self.walk(data, variant, path, depth + 1, refs);
                }
            }
        }

        if let Some(all) = schema_obj.get("allOf").and_then(Value::as_array) {
            for sub in all {
                self.walk(data, sub, path, depth + 1, refs);
            }
        }
    }
}

/// Attempt to coerce a value to match one of the expected types.
/// Returns `Some(message)` if coercion was applied, `None` if no action needed.
fn try_coerce(value: &mut Value, expected_types: &[&str]) -> Option<String> {
    if type_matches(value, expected_types) {
        return None;
    }

    for expected in expected_types {
        match *expected {
            "string" => match value {
                Value::Number(n) => {
                    let s = n.to_string();
                    let msg = format!("coerced number {} to string", s);
                    *value = Value::String(s);
                    return Some(msg);
                }
                Value::Bool(b) => {
                    let s = b.to_string();
                    let msg = format!("coerced boolean {} to string", s);
                    *value = Value::String(s);
                    return Some(msg);
                }
                _ => {}
            },
            "integer" => {
                let parsed = value
                    .as_str()
                    .and_then(|s| s.parse::<i64>().ok().filter(|n| n.to_string() == s));
                if let Some(n) = parsed {
                    let msg = format!("coerced string \"{}\" to integer", n);
                    *value = Value::Number(Number::from(n));
                    return Some(msg);
                }
            }
            "number" => {
                let parsed = value.as_str().and_then(|s| {
                    let n = s.trim().parse::<f64>().ok()?;
                    // Roundtrip check: the formatted value must parse back
                    let roundtripped = n.to_string().parse::<f64>().ok()?;
                    if (roundtripped - n).abs() < f64::EPSILON {
                        Number::from_f64(n)
                    } else {
                        None
                    }
                });
                if let Some(num) = parsed {
                    let msg = format!("coerced string {} to number {}", value, num);
                    *value = Value::Number(num);
                    return Some(msg);
                }
            }
            "boolean" => {
                let parsed = match value.as_str() {
                    Some("true") => Some(true),
                    Some("false") => Some(false),
                    _ => None,
                };
                if let Some(b) = parsed {
                    *value = Value::Bool(b);
                    return Some(format!("coerced string \"{}\" to boolean", b));
                }
            }
            _ => {}
        }
    }

    tracing::trace!(found = json_type_name(value), "no coercion applies");
    None
}
