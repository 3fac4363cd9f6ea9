use crate::validator::SchemaInvalid;

/// Errors that can occur while building schemas or validating documents.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    /// The schema file could not be loaded.
    #[error("failed to load schema: {0}")]
    LoadFailed(String),

    /// The schema could not be compiled.
    #[error("failed to compile schema {name}: {message}")]
    CompileFailed { name: String, message: String },

    /// The document failed schema validation.
    #[error(transparent)]
    Invalid(#[from] SchemaInvalid),

    /// The payload is not valid JSON.
    #[error("payload is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// No schema registered for the given document kind.
    #[error("no schema registered for {0}")]
    NoSchema(String),
}

pub type Result<T> = std::result::Result<T, SchemaError>;

/// A single field value rejected by one of the custom validators.
///
/// Each variant is its own condition so callers can tell "known
/// enumeration, bad value" apart from a document of the wrong shape.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("{0:?} is not a valid commercial model type")]
    CommercialModelTypeInvalid(String),

    #[error("{0:?} is not a valid use type")]
    UseTypeInvalid(String),

    #[error("{0:?} is not an offset-aware date-time")]
    DatetimeInvalid(String),

    #[error("{0:?} is not a valid action")]
    ActionInvalid(String),
}
