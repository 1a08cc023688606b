//! Value transforms applied to extracted fields.
//!
//! A [`Transform`] wraps a caller-supplied function. The mapper calls it once
//! per field, after default substitution, and never catches a panic raised
//! inside it. A transform sees the resolved-or-defaulted value, or absence
//! when the path is missing and no default is declared:
//!
//! - [`Transform::new`] / [`Transform::named`] take `Value -> Value`; absence
//!   arrives as `Value::Null` and the return value is always stored.
//! - [`Transform::optional`] takes `Option<Value> -> Option<Value>`; `None`
//!   in is absence, `None` out leaves the field out of the candidate.
//!
//! [`TransformRegistry`] names transforms so mapping files can refer to them.
//! The built-ins are total: a value a transform does not apply to comes back
//! unchanged, and absence stays absent.
//!
//! | Name | Applies to | Result |
//! |------|------------|--------|
//! | `uppercase` / `lowercase` | string | case-mapped string |
//! | `trim` | string | leading/trailing whitespace removed |
//! | `to_string` | number, boolean | decimal / `"true"` / `"false"` |
//! | `to_number` | numeric string | number |
//! | `to_integer` | integral string or number | integer |
//! | `to_boolean` | `"true"`/`"false"`, `0`/`1` | boolean |

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};

type TransformFn = dyn Fn(Option<Value>) -> Option<Value> + Send + Sync;

/// A named, shareable value transform.
#[derive(Clone)]
pub struct Transform {
    name: String,
    func: Arc<TransformFn>,
}

impl Transform {
    /// Wrap an anonymous function.
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::named("custom", func)
    }

    /// Wrap a named function. Absence is passed in as `Value::Null`.
    pub fn named<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        Self::optional(name, move |value: Option<Value>| {
            Some(func(value.unwrap_or(Value::Null)))
        })
    }

    /// Wrap a function that sees absence as `None` and may leave the field
    /// absent by returning `None`.
    pub fn optional<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(Option<Value>) -> Option<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// Compose transforms left to right. A single-element chain is returned
    /// as-is.
    pub fn chain(mut transforms: Vec<Transform>) -> Self {
        if transforms.len() == 1 {
            if let Some(only) = transforms.pop() {
                return only;
            }
        }
        let name = transforms
            .iter()
            .map(|t| t.name.as_str())
            .collect::<Vec<_>>()
            .join("+");
        Self::optional(name, move |value| {
            transforms.iter().fold(value, |acc, t| t.apply_optional(acc))
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply to a present value. A transform that drops its input yields
    /// `Value::Null`.
    pub fn apply(&self, value: Value) -> Value {
        self.apply_optional(Some(value)).unwrap_or(Value::Null)
    }

    /// Apply to a possibly absent value.
    pub fn apply_optional(&self, value: Option<Value>) -> Option<Value> {
        (self.func)(value)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transform").field(&self.name).finish()
    }
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Name → transform lookup used when loading mapping files.
#[derive(Debug, Clone, Default)]
pub struct TransformRegistry {
    transforms: BTreeMap<String, Transform>,
}

impl TransformRegistry {
    /// An empty registry (no built-ins).
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in transforms.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        let builtins: [(&str, fn(Value) -> Value); 7] = [
            ("uppercase", uppercase),
            ("lowercase", lowercase),
            ("trim", trim),
            ("to_string", to_string),
            ("to_number", to_number),
            ("to_integer", to_integer),
            ("to_boolean", to_boolean),
        ];
        for (name, func) in builtins {
            registry.register(Transform::optional(name, move |value| value.map(func)));
        }
        registry
    }

    /// Register a transform under its own name, replacing any previous one.
    pub fn register(&mut self, transform: Transform) -> &mut Self {
        self.transforms.insert(transform.name.clone(), transform);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Transform> {
        self.transforms.get(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }
}

// ---------------------------------------------------------------------------
// Built-ins
// ---------------------------------------------------------------------------

fn map_str(value: Value, f: impl FnOnce(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    }
}

fn uppercase(value: Value) -> Value {
    map_str(value, str::to_uppercase)
}

fn lowercase(value: Value) -> Value {
    map_str(value, str::to_lowercase)
}

fn trim(value: Value) -> Value {
    map_str(value, |s| s.trim().to_string())
}

fn to_string(value: Value) -> Value {
    match value {
        Value::Number(n) => Value::String(n.to_string()),
        Value::Bool(b) => Value::String(b.to_string()),
        other => other,
    }
}

fn to_number(value: Value) -> Value {
    let converted = value.as_str().and_then(|s| {
        let s = s.trim();
        match s.parse::<i64>() {
            Ok(n) => Some(Number::from(n)),
            Err(_) => s.parse::<f64>().ok().and_then(Number::from_f64),
        }
    });
    converted.map(Value::Number).unwrap_or(value)
}

fn to_integer(value: Value) -> Value {
    let converted = match &value {
        Value::String(s) => s.trim().parse::<i64>().ok(),
        // Only integral floats inside i64 range convert losslessly.
        Value::Number(n) if n.is_f64() => n
            .as_f64()
            .filter(|f| f.fract() == 0.0 && *f >= i64::MIN as f64 && *f < i64::MAX as f64)
            .map(|f| f as i64),
        _ => None,
    };
    converted
        .map(|n| Value::Number(Number::from(n)))
        .unwrap_or(value)
}

fn to_boolean(value: Value) -> Value {
    let converted = match &value {
        Value::String(s) => match s.trim() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        _ => None,
    };
    converted.map(Value::Bool).unwrap_or(value)
}
