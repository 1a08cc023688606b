//! Schema compilation: one structural pass over the document before any
//! candidate is validated.
//!
//! Pre-compiles every `pattern` into a regex cache (so validation never
//! compiles a regex) and checks that each `$ref` resolves inside the document.
//! A `$ref` target is walked the first time its pointer is seen, so schemas
//! parked under non-keyword locations (`#/components/...`) get their patterns
//! and nested references checked too. Recursive references stop at the
//! second visit.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde_json::Value;

use super::json_type_name;
use crate::error::MapError;
use crate::pointer::{build_path, resolve_pointer};

/// Keywords whose value is a map of name → schema.
const MAP_KEYWORDS: &[&str] = &["properties", "$defs", "definitions"];

/// Keywords whose value is a single schema (or, for draft-4 `items`, a list).
const SINGLE_KEYWORDS: &[&str] = &["additionalProperties", "items", "not"];

/// Keywords whose value is a list of schemas.
const ARRAY_KEYWORDS: &[&str] = &["anyOf", "oneOf", "allOf", "prefixItems"];

/// Walk the schema, returning the pattern cache.
pub(super) fn compile(root: &Value, max_depth: usize) -> Result<HashMap<String, Regex>, MapError> {
    if !(root.is_object() || root.is_boolean()) {
        return Err(MapError::SchemaError {
            path: "#".to_string(),
            message: format!(
                "schema root must be an object or boolean, found {}",
                json_type_name(root)
            ),
        });
    }

    let mut compiler = Compiler {
        root,
        max_depth,
        patterns: HashMap::new(),
        visited_refs: HashSet::new(),
    };
    compiler.walk(root, "#", 0)?;
    Ok(compiler.patterns)
}

struct Compiler<'s> {
    root: &'s Value,
    max_depth: usize,
    patterns: HashMap<String, Regex>,
    visited_refs: HashSet<String>,
}

impl Compiler<'_> {
    fn walk(&mut self, node: &Value, path: &str, depth: usize) -> Result<(), MapError> {
        if depth > self.max_depth {
            return Err(MapError::RecursionDepthExceeded {
                path: path.to_string(),
                max_depth: self.max_depth,
            });
        }

        // Boolean schemas and malformed nodes carry nothing to compile.
        let Some(obj) = node.as_object() else {
            return Ok(());
        };

        if let Some(Value::String(pattern)) = obj.get("pattern") {
            if !self.patterns.contains_key(pattern) {
                let regex = Regex::new(pattern).map_err(|e| MapError::SchemaError {
                    path: build_path(path, &["pattern"]),
                    message: format!("invalid pattern {:?}: {}", pattern, e),
                })?;
                self.patterns.insert(pattern.clone(), regex);
            }
        }

        if let Some(Value::String(reference)) = obj.get("$ref") {
            self.follow_ref(reference, path)?;
        }

        for keyword in MAP_KEYWORDS {
            if let Some(Value::Object(map)) = obj.get(*keyword) {
                for (key, child) in map {
                    self.walk(child, &build_path(path, &[*keyword, key.as_str()]), depth + 1)?;
                }
            }
        }

        for keyword in SINGLE_KEYWORDS {
            match obj.get(*keyword) {
                Some(Value::Array(list)) => {
                    for (i, child) in list.iter().enumerate() {
                        let index = i.to_string();
                        self.walk(child, &build_path(path, &[*keyword, index.as_str()]), depth + 1)?;
                    }
                }
                Some(child) => self.walk(child, &build_path(path, &[*keyword]), depth + 1)?,
                None => {}
            }
        }

        for keyword in ARRAY_KEYWORDS {
            if let Some(Value::Array(list)) = obj.get(*keyword) {
                for (i, child) in list.iter().enumerate() {
                    let index = i.to_string();
                    self.walk(child, &build_path(path, &[*keyword, index.as_str()]), depth + 1)?;
                }
            }
        }

        Ok(())
    }

    /// Resolve a `$ref` and walk its target on first sight. Depth restarts at
    /// the target: the limit bounds document nesting, and reference hops are
    /// counted at validation time.
    fn follow_ref(&mut self, reference: &str, path: &str) -> Result<(), MapError> {
        if !reference.starts_with('#') {
            return Err(MapError::SchemaError {
                path: build_path(path, &["$ref"]),
                message: format!("only local references are supported, found {:?}", reference),
            });
        }
        let root = self.root;
        let Some(target) = resolve_pointer(root, reference) else {
            return Err(MapError::SchemaError {
                path: build_path(path, &["$ref"]),
                message: format!("unresolvable reference {:?}", reference),
            });
        };
        if !self.visited_refs.insert(reference.to_string()) {
            return Ok(());
        }
        self.walk(target, reference, 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patterns_are_cached_once() {
        let schema = json!({
            "properties": {
                "a": { "type": "string", "pattern": "^[a-z]+$" },
                "b": { "type": "string", "pattern": "^[a-z]+$" },
                "c": { "items": { "pattern": "^\\d+$" } }
            }
        });
        let patterns = compile(&schema, 16).unwrap();
        assert_eq!(patterns.len(), 2);
        assert!(patterns["^[a-z]+$"].is_match("abc"));
    }

    #[test]
    fn test_invalid_pattern() {
        let schema = json!({ "properties": { "a": { "pattern": "([unclosed" } } });
        let err = compile(&schema, 16).unwrap_err();
        assert!(
            matches!(err, MapError::SchemaError { ref path, .. } if path == "#/properties/a/pattern"),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_refs_must_resolve_locally() {
        let ok = json!({ "$defs": { "n": { "type": "number" } }, "items": { "$ref": "#/$defs/n" } });
        assert!(compile(&ok, 16).is_ok());

        let dangling = json!({ "items": { "$ref": "#/$defs/missing" } });
        assert!(matches!(compile(&dangling, 16), Err(MapError::SchemaError { .. })));

        let remote = json!({ "$ref": "https://example.com/schema.json" });
        assert!(matches!(compile(&remote, 16), Err(MapError::SchemaError { .. })));
    }

    #[test]
    fn test_ref_targets_outside_keywords_are_compiled() {
        let schema = json!({
            "$ref": "#/components/code",
            "components": { "code": { "type": "string", "pattern": "^[A-Z]{3}$" } }
        });
        let patterns = compile(&schema, 16).unwrap();
        assert!(patterns.contains_key("^[A-Z]{3}$"));

        let bad_pattern = json!({ "$ref": "#/x/a", "x": { "a": { "pattern": "([unclosed" } } });
        let err = compile(&bad_pattern, 16).unwrap_err();
        assert!(
            matches!(err, MapError::SchemaError { ref path, .. } if path == "#/x/a/pattern"),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_nested_dangling_ref_in_ref_target() {
        let schema = json!({ "$ref": "#/x/a", "x": { "a": { "$ref": "#/nowhere" } } });
        let err = compile(&schema, 16).unwrap_err();
        assert!(
            matches!(err, MapError::SchemaError { ref path, .. } if path == "#/x/a/$ref"),
            "unexpected error: {:?}",
            err
        );
    }

    #[test]
    fn test_recursive_ref_compiles() {
        let schema = json!({
            "$defs": {
                "node": {
                    "type": "object",
                    "properties": { "next": { "$ref": "#/$defs/node" } }
                }
            },
            "$ref": "#/$defs/node"
        });
        assert!(compile(&schema, 16).is_ok());
    }

    #[test]
    fn test_depth_limit() {
        let schema = json!({ "items": { "items": { "items": { "type": "string" } } } });
        assert!(compile(&schema, 3).is_ok());
        assert!(matches!(
            compile(&schema, 2),
            Err(MapError::RecursionDepthExceeded { max_depth: 2, .. })
        ));
    }

    #[test]
    fn test_boolean_root() {
        assert!(compile(&json!(true), 16).unwrap().is_empty());
    }
}
