use pipekit_envelope::EnvelopeError;
use pipekit_schema::SchemaError;

/// Errors reading [`Settings`](crate::Settings).
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required setting is missing or a value does not parse.
    #[error("invalid settings: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Failures of a [`Stage`](crate::Stage) that are not per-message outcomes.
///
/// A malformed payload or a missing schema is a setup problem; ignored and
/// invalid documents are reported through [`Disposition`](crate::Disposition).
#[derive(Debug, thiserror::Error)]
pub enum StageError {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error(transparent)]
    Schema(#[from] SchemaError),
}
