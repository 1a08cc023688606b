//! Bundled JSON Schema validator.
//!
//! [`JsonSchema`] compiles a schema document once (pre-compiling `pattern`
//! regexes and checking local `$ref` targets) and then validates any number
//! of candidates. It implements [`crate::Schema`], so it plugs straight into
//! [`crate::map_and_validate`].
//!
//! Supported keywords: `type`, `enum`, `const`, `properties`, `required`,
//! `additionalProperties`, `items`, `prefixItems`, `minItems`, `maxItems`,
//! `uniqueItems`, `minLength`, `maxLength`, `pattern`, `format`, `minimum`,
//! `maximum`, `exclusiveMinimum`, `exclusiveMaximum`, `multipleOf`, `anyOf`,
//! `oneOf`, `allOf`, `not`, `$ref` (local `#/...` only). Unknown keywords and
//! malformed keyword values are ignored.

mod check;
mod coercion;
mod compile;
mod formats;

use std::collections::HashMap;

use regex::Regex;
use serde_json::{Map, Value};

use crate::config::ValidateOptions;
use crate::error::MapError;
use crate::issue::Issue;
use crate::schema::{Schema, Validation};

use check::Checker;
use formats::FormatChecker;

/// A compiled JSON Schema.
#[derive(Debug, Clone)]
pub struct JsonSchema {
    root: Value,
    options: ValidateOptions,
    patterns: HashMap<String, Regex>,
    formats: FormatChecker,
}

impl JsonSchema {
    /// Compile a schema document.
    ///
    /// Fails when the root is neither an object nor a boolean, a `pattern`
    /// is not a valid regex, a `$ref` does not resolve locally, or nesting
    /// exceeds `options.max_depth`.
    pub fn compile(root: Value, options: ValidateOptions) -> Result<Self, MapError> {
        let patterns = compile::compile(&root, options.max_depth)?;
        let formats = FormatChecker::new().map_err(|e| MapError::SchemaError {
            path: "#".to_string(),
            message: format!("failed to build format matchers: {}", e),
        })?;
        tracing::debug!(patterns = patterns.len(), "compiled schema");
        Ok(Self {
            root,
            options,
            patterns,
            formats,
        })
    }

    /// Parse and compile a schema from JSON text.
    pub fn from_json_str(json: &str, options: ValidateOptions) -> Result<Self, MapError> {
        Self::compile(serde_json::from_str(json)?, options)
    }

    pub fn document(&self) -> &Value {
        &self.root
    }

    pub fn options(&self) -> &ValidateOptions {
        &self.options
    }

    /// Validate a value, coercing it first when `coerce_types` is set.
    pub fn check(&self, mut candidate: Value) -> Validation<Issue> {
        if self.options.coerce_types {
            let coerced = coercion::coerce_types(&mut candidate, &self.root, self.options.max_depth);
            if coerced > 0 {
                tracing::debug!(coerced, "coerced candidate values");
            }
        }

        let checker = Checker {
            root: &self.root,
            options: &self.options,
            patterns: &self.patterns,
            formats: &self.formats,
        };
        let mut issues = Vec::new();
        checker.check(&candidate, &self.root, "", "#", 0, &mut issues);

        if issues.is_empty() {
            Validation::Accepted(candidate)
        } else {
            Validation::Rejected(issues)
        }
    }
}

impl Schema for JsonSchema {
    type Issue = Issue;

    fn validate(&self, candidate: Value) -> Validation<Issue> {
        self.check(candidate)
    }
}

// ---------------------------------------------------------------------------
// Type helpers shared by coercion and checking
// ---------------------------------------------------------------------------

/// Declared `type` names of a schema node (`"string"` or `["string", "null"]`).
pub(crate) fn declared_types(schema: &Map<String, Value>) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(s)) => vec![s.as_str()],
        Some(Value::Array(arr)) => arr.iter().filter_map(Value::as_str).collect(),
        _ => Vec::new(),
    }
}

/// Return the JSON type name for a value. Integral floats count as
/// `integer`, matching JSON Schema's numeric model.
pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) => {
            let integral = n.is_i64() || n.is_u64() || n.as_f64().is_some_and(|f| f.fract() == 0.0);
            if integral {
                "integer"
            } else {
                "number"
            }
        }
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Whether `value` satisfies any of `types`. An `integer` value also
/// satisfies `number`.
pub(crate) fn type_matches(value: &Value, types: &[&str]) -> bool {
    let actual = json_type_name(value);
    types.contains(&actual) || (actual == "integer" && types.contains(&"number"))
}

/// `$ref` pointers followed since the walk last stepped into a child value.
///
/// Seeing the same pointer twice in one chain means the reference loops
/// back on itself without consuming any data, so following it again can
/// never terminate early.
#[derive(Clone, Copy)]
pub(crate) struct RefChain<'a> {
    pointer: &'a str,
    parent: Option<&'a RefChain<'a>>,
}

impl<'a> RefChain<'a> {
    pub(crate) fn push(pointer: &'a str, parent: Option<&'a RefChain<'a>>) -> Self {
        Self { pointer, parent }
    }

    pub(crate) fn contains(chain: Option<&RefChain<'_>>, pointer: &str) -> bool {
        let mut link = chain;
        while let Some(current) = link {
            if current.pointer == pointer {
                return true;
            }
            link = current.parent;
        }
        false
    }
}
