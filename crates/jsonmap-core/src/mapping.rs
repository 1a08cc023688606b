//! Mapping declarations: which output fields to build and where to read them.
//!
//! A declaration maps each output field name to a [`MappingEntry`]. It can be
//! built in code, or loaded from JSON and resolved against a
//! [`TransformRegistry`]:
//!
//! ```rust
//! use jsonmap_core::{MappingDeclaration, TransformRegistry};
//! use serde_json::json;
//!
//! let mapping = MappingDeclaration::from_json(
//!     &json!({
//!         "name":  { "path": "user.name", "default": "Unknown", "transform": "uppercase" },
//!         "email": { "path": ["user", "email"], "transform": ["trim", "lowercase"] },
//!         "legacy": null
//!     }),
//!     &TransformRegistry::builtin(),
//! )
//! .unwrap();
//! assert_eq!(mapping.len(), 3);
//! ```
//!
//! A field declared with no entry (`"legacy": null` above) is kept in the
//! declaration but produces no candidate field.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::MapError;
use crate::path::DataPath;
use crate::transforms::{Transform, TransformRegistry};

/// How to produce one output field.
#[derive(Debug, Clone)]
pub struct MappingEntry {
    /// Where to read the value from the source.
    pub path: DataPath,
    /// Substituted when `path` does not resolve. `Some(Value::Null)` is an
    /// explicit `null` default, distinct from no default.
    pub default: Option<Value>,
    /// Applied to the resolved-or-defaulted value, including its absence.
    /// Whatever it returns is stored.
    pub transform: Option<Transform>,
}

impl MappingEntry {
    pub fn new(path: impl Into<DataPath>) -> Self {
        Self {
            path: path.into(),
            default: None,
            transform: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Shorthand for [`Self::with_transform`] with an anonymous function.
    pub fn map<F>(self, func: F) -> Self
    where
        F: Fn(Value) -> Value + Send + Sync + 'static,
    {
        self.with_transform(Transform::new(func))
    }
}

/// Output field name → entry. Iteration order is by field name, which keeps
/// logs and candidates deterministic; fields are independent of each other.
#[derive(Debug, Clone, Default)]
pub struct MappingDeclaration {
    entries: BTreeMap<String, Option<MappingEntry>>,
}

impl MappingDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. Re-declaring a name replaces the previous entry.
    pub fn insert(&mut self, field: impl Into<String>, entry: MappingEntry) -> &mut Self {
        self.entries.insert(field.into(), Some(entry));
        self
    }

    /// Declare a field with no entry. It is skipped during extraction.
    pub fn insert_empty(&mut self, field: impl Into<String>) -> &mut Self {
        self.entries.insert(field.into(), None);
        self
    }

    /// Builder-style [`Self::insert`].
    pub fn field(mut self, field: impl Into<String>, entry: MappingEntry) -> Self {
        self.insert(field, entry);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&MappingEntry> {
        self.entries.get(field).and_then(Option::as_ref)
    }

    /// All declared fields, including entry-less ones (`None`).
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&MappingEntry>)> {
        self.entries
            .iter()
            .map(|(field, entry)| (field.as_str(), entry.as_ref()))
    }

    /// Load a declaration from its JSON form, resolving transform names.
    pub fn from_json(value: &Value, registry: &TransformRegistry) -> Result<Self, MapError> {
        let spec = MappingSpec::deserialize(value)?;
        spec.resolve(registry)
    }

    pub fn from_json_str(json: &str, registry: &TransformRegistry) -> Result<Self, MapError> {
        let spec: MappingSpec = serde_json::from_str(json)?;
        spec.resolve(registry)
    }
}

impl<K: Into<String>> FromIterator<(K, MappingEntry)> for MappingDeclaration {
    fn from_iter<T: IntoIterator<Item = (K, MappingEntry)>>(iter: T) -> Self {
        let mut declaration = Self::new();
        for (field, entry) in iter {
            declaration.insert(field, entry);
        }
        declaration
    }
}

// ---------------------------------------------------------------------------
// JSON form
// ---------------------------------------------------------------------------

/// Serialized mapping: field name → entry object, or `null`/`false` for a
/// field declared without an entry.
///
/// Fields stay raw [`Value`]s until [`MappingSpec::resolve`] so a bad entry
/// is reported against its field name with serde's own message.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
struct MappingSpec {
    fields: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct EntrySpec {
    path: DataPath,
    #[serde(default, deserialize_with = "deserialize_present")]
    default: Option<Value>,
    #[serde(default)]
    transform: Option<TransformSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TransformSpec {
    One(String),
    Chain(Vec<String>),
}

/// Maps a present field to `Some`, even when it holds `null`. Absent fields
/// fall back to `#[serde(default)]` and stay `None`.
fn deserialize_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl MappingSpec {
    fn resolve(self, registry: &TransformRegistry) -> Result<MappingDeclaration, MapError> {
        let mut declaration = MappingDeclaration::new();
        for (field, spec) in self.fields {
            match spec {
                Value::Null | Value::Bool(false) => {
                    declaration.insert_empty(field);
                }
                Value::Object(_) => {
                    let entry = EntrySpec::deserialize(spec).map_err(|e| MapError::InvalidMapping {
                        field: field.clone(),
                        message: e.to_string(),
                    })?;
                    let transform = match entry.transform {
                        Some(t) => Some(resolve_transform(&field, t, registry)?),
                        None => None,
                    };
                    declaration.insert(
                        field,
                        MappingEntry {
                            path: entry.path,
                            default: entry.default,
                            transform,
                        },
                    );
                }
                other => {
                    return Err(MapError::InvalidMapping {
                        field,
                        message: format!("expected an entry object, null or false; found {}", other),
                    });
                }
            }
        }
        Ok(declaration)
    }
}

fn resolve_transform(
    field: &str,
    spec: TransformSpec,
    registry: &TransformRegistry,
) -> Result<Transform, MapError> {
    let names = match spec {
        TransformSpec::One(name) => vec![name],
        TransformSpec::Chain(names) => names,
    };
    if names.is_empty() {
        return Err(MapError::InvalidMapping {
            field: field.to_string(),
            message: "transform list is empty".to_string(),
        });
    }
    let transforms = names
        .into_iter()
        .map(|name| {
            registry
                .get(&name)
                .cloned()
                .ok_or_else(|| MapError::UnknownTransform {
                    field: field.to_string(),
                    name,
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Transform::chain(transforms))
}
