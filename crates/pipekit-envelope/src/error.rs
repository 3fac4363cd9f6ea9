/// Errors from envelope handling.
#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    /// `prepare_outgoing` was called on an envelope with no events.
    ///
    /// Every envelope leaving a stage must have been through
    /// `prepare_incoming` first.
    #[error("envelope has no events; prepare_incoming was never run")]
    NoEvents,

    /// The envelope could not be encoded or decoded as JSON.
    #[error("envelope JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, EnvelopeError>;

/// Failure of `send` / `send_error`.
///
/// Destination failures are carried unmodified so callers can match on
/// the destination's own error type.
#[derive(Debug, thiserror::Error)]
pub enum SendError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Envelope(#[from] EnvelopeError),

    #[error("destination failed: {0}")]
    Destination(#[source] E),
}

impl<E: std::error::Error + 'static> SendError<E> {
    /// The destination's error, if that is what failed.
    pub fn destination(&self) -> Option<&E> {
        match self {
            SendError::Destination(err) => Some(err),
            SendError::Envelope(_) => None,
        }
    }

    pub fn into_destination(self) -> Option<E> {
        match self {
            SendError::Destination(err) => Some(err),
            SendError::Envelope(_) => None,
        }
    }
}
