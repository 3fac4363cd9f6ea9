//! Document validation for catalog pipeline stages.
//!
//! Schemas are data: field sets built with [`fields`] and composed by
//! copy-and-layer, rendered to JSON Schema and compiled with `jsonschema`.
//! Validation collects every violation and resolves each one against the
//! document that failed.
//!
//! ```
//! use pipekit_schema::{catalog, SchemaRegistry};
//! use serde_json::json;
//!
//! let registry = SchemaRegistry::builtin().unwrap();
//! let takedown = json!({ "action": "takedown", "amw_key": "A1" });
//! assert!(registry.validate_value(catalog::DELIVERY, takedown).is_ok());
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod fields;
pub mod formats;
pub mod registry;
pub mod validator;

pub use config::RegistryConfig;
pub use error::{FieldError, Result, SchemaError};
pub use fields::{compose, Extra, Field, FieldSet, Rule};
pub use registry::SchemaRegistry;
pub use validator::{
    iter_errors, validate_schema, ErrorKind, Schema, SchemaInvalid, ValidationError, Violation,
};
