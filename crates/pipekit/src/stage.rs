//! Per-message stage outcome.
//!
//! A stage stamps the incoming envelope, drops messages from filtered
//! providers and optionally validates the payload. Instead of aborting, it
//! returns a [`Disposition`] the caller matches on.

use pipekit_envelope::{Envelope, EnvelopeConfig, Stamper};
use pipekit_schema::{SchemaError, SchemaInvalid, SchemaRegistry, ValidationError};
use serde_json::Value;

use crate::error::StageError;
use crate::provider::ProviderFilter;

/// JSON pointer to the provider name in catalog documents.
pub const DEFAULT_PROVIDER_POINTER: &str = "/provider/name";

/// Why a message did not make it through a stage.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Abort {
    #[error("provider.ignored: {provider:?} is filtered out")]
    ProviderIgnored { provider: String },

    #[error(transparent)]
    SchemaInvalid(SchemaInvalid),
}

impl Abort {
    pub fn code(&self) -> &'static str {
        match self {
            Abort::ProviderIgnored { .. } => "provider.ignored",
            Abort::SchemaInvalid(invalid) => invalid.code(),
        }
    }
}

/// Outcome of running one envelope through a [`Stage`].
///
/// Every variant hands the stamped envelope back so it can be forwarded,
/// dropped or sent down the error path.
#[derive(Debug, Clone)]
pub enum Disposition<M = Value> {
    Accepted(Envelope<M>),
    Ignored {
        envelope: Envelope<M>,
        provider: String,
    },
    Invalid {
        envelope: Envelope<M>,
        invalid: SchemaInvalid,
    },
}

impl<M> Disposition<M> {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Disposition::Accepted(_))
    }

    /// `None` when accepted, otherwise the abort code.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Disposition::Accepted(_) => None,
            Disposition::Ignored { .. } => Some("provider.ignored"),
            Disposition::Invalid { invalid, .. } => Some(invalid.code()),
        }
    }

    pub fn envelope(&self) -> &Envelope<M> {
        match self {
            Disposition::Accepted(envelope)
            | Disposition::Ignored { envelope, .. }
            | Disposition::Invalid { envelope, .. } => envelope,
        }
    }

    pub fn into_envelope(self) -> Envelope<M> {
        match self {
            Disposition::Accepted(envelope)
            | Disposition::Ignored { envelope, .. }
            | Disposition::Invalid { envelope, .. } => envelope,
        }
    }

    /// Field errors of an invalid document; empty otherwise.
    pub fn errors(&self) -> Vec<ValidationError> {
        match self {
            Disposition::Invalid { invalid, .. } => invalid.errors().collect(),
            _ => Vec::new(),
        }
    }

    /// Collapse into a `Result`, dropping the envelope on abort.
    pub fn into_result(self) -> Result<Envelope<M>, Abort> {
        match self {
            Disposition::Accepted(envelope) => Ok(envelope),
            Disposition::Ignored { provider, .. } => Err(Abort::ProviderIgnored { provider }),
            Disposition::Invalid { invalid, .. } => Err(Abort::SchemaInvalid(invalid)),
        }
    }
}

/// Stamping, provider filtering and validation for one stage.
#[derive(Debug, Clone)]
pub struct Stage<'r> {
    stamper: Stamper,
    filter: ProviderFilter,
    provider_pointer: String,
    schema: Option<(&'r SchemaRegistry, String)>,
}

impl Stage<'static> {
    pub fn new(config: EnvelopeConfig) -> Self {
        Self {
            stamper: Stamper::new(config),
            filter: ProviderFilter::default(),
            provider_pointer: DEFAULT_PROVIDER_POINTER.to_string(),
            schema: None,
        }
    }
}

impl<'r> Stage<'r> {
    pub fn with_filter(mut self, filter: ProviderFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Where to find the provider name inside the message.
    ///
    /// A bare field name such as `"source"` is read as `"/source"`.
    pub fn with_provider_pointer(mut self, pointer: impl Into<String>) -> Self {
        let mut pointer = pointer.into();
        if !pointer.is_empty() && !pointer.starts_with('/') {
            pointer.insert(0, '/');
        }
        self.provider_pointer = pointer;
        self
    }

    /// Validate every accepted message as `kind`.
    pub fn with_schema<'s>(self, registry: &'s SchemaRegistry, kind: impl Into<String>) -> Stage<'s> {
        Stage {
            stamper: self.stamper,
            filter: self.filter,
            provider_pointer: self.provider_pointer,
            schema: Some((registry, kind.into())),
        }
    }

    pub fn stamper(&self) -> &Stamper {
        &self.stamper
    }

    pub fn filter(&self) -> &ProviderFilter {
        &self.filter
    }

    /// Decode a raw payload and run it through the stage.
    pub fn process_bytes(&self, payload: &[u8]) -> Result<Disposition, StageError> {
        let envelope = self.stamper.receive(payload)?;
        self.process_stamped(envelope)
    }

    /// Run a decoded envelope through the stage.
    ///
    /// Errors are reserved for setup problems such as an unknown document
    /// kind; filtered and invalid messages come back as a [`Disposition`].
    pub fn process(&self, envelope: Envelope) -> Result<Disposition, StageError> {
        self.process_stamped(self.stamper.incoming(envelope))
    }

    fn process_stamped(&self, mut envelope: Envelope) -> Result<Disposition, StageError> {
        if !self.filter.is_open() {
            let provider = envelope
                .message
                .pointer(&self.provider_pointer)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if self.filter.should_ignore(&provider) {
                tracing::info!(
                    job_id = %envelope.job_id,
                    provider = %provider,
                    "ignoring message from filtered provider"
                );
                return Ok(Disposition::Ignored { envelope, provider });
            }
        }

        let Some((registry, kind)) = &self.schema else {
            return Ok(Disposition::Accepted(envelope));
        };

        let message = std::mem::take(&mut envelope.message);
        match registry.validate_value(kind, message) {
            Ok(message) => {
                envelope.message = message;
                Ok(Disposition::Accepted(envelope))
            }
            Err(SchemaError::Invalid(invalid)) => {
                tracing::warn!(
                    job_id = %envelope.job_id,
                    schema = %invalid.schema,
                    errors = invalid.violations.len(),
                    "message failed validation"
                );
                envelope.message = invalid.document.clone();
                Ok(Disposition::Invalid { envelope, invalid })
            }
            Err(err) => Err(err.into()),
        }
    }
}
