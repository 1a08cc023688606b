//! # jsonmap-core
//!
//! Extract a flat record from arbitrarily nested JSON according to a
//! declarative mapping, default and transform each extracted value, and
//! validate the result against a schema.
//!
//! ## Pipeline
//!
//! ```text
//! source ──► per-field path lookup ──► default ──► transform ──► candidate
//!                                                                    │
//!                                 Outcome::Success { value } ◄── schema
//!                                 Outcome::Failure { issues } ◄──┘
//! ```
//!
//! The mapper depends only on two seams: path resolution ([`get`]) and the
//! [`Schema`] trait. [`JsonSchema`] is the bundled schema implementation, and
//! any `Fn(Value) -> Validation<I>` closure works as well.
//!
//! ```rust
//! use jsonmap_core::{map_and_validate, JsonSchema, MappingDeclaration, TransformRegistry, ValidateOptions};
//! use serde_json::json;
//!
//! let mapping = MappingDeclaration::from_json(
//!     &json!({
//!         "name": { "path": "user.name", "transform": "uppercase" },
//!         "email": { "path": "user.email", "default": "email@gmail.com" }
//!     }),
//!     &TransformRegistry::builtin(),
//! )
//! .unwrap();
//! let schema = JsonSchema::compile(
//!     json!({ "type": "object", "required": ["name", "email"] }),
//!     ValidateOptions::default(),
//! )
//! .unwrap();
//!
//! let outcome = map_and_validate(&json!({ "user": { "name": "alice" } }), &mapping, &schema);
//! assert_eq!(
//!     outcome.value(),
//!     Some(&json!({ "name": "ALICE", "email": "email@gmail.com" }))
//! );
//! ```

pub mod config;
pub mod error;
pub mod issue;
pub mod mapper;
pub mod mapping;
pub mod outcome;
pub mod path;
pub mod pointer;
pub mod schema;
pub mod transforms;
pub mod validation;

pub use config::ValidateOptions;
pub use error::MapError;
pub use issue::{Issue, IssueKind};
pub use mapper::{build_candidate, map_and_validate};
pub use mapping::{MappingDeclaration, MappingEntry};
pub use outcome::Outcome;
pub use path::{get, resolve, DataPath};
pub use pointer::{build_path, escape_pointer_segment, split_path, unescape_pointer_segment};
pub use schema::{Schema, Validation};
pub use transforms::{Transform, TransformRegistry};
pub use validation::JsonSchema;
