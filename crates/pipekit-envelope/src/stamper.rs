use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::codec::decode;
use crate::destination::{send, send_error, Destination};
use crate::envelope::{fanout, prepare_incoming, Envelope};
use crate::error::{Result, SendError};

/// Stage identity used when stamping envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeConfig {
    /// Name recorded as `app` on every event this stage appends.
    pub application: String,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        Self {
            application: "pipekit".to_string(),
        }
    }
}

impl EnvelopeConfig {
    pub fn new(application: impl Into<String>) -> Self {
        Self {
            application: application.into(),
        }
    }
}

/// Envelope operations bound to one stage's [`EnvelopeConfig`].
#[derive(Debug, Clone, Default)]
pub struct Stamper {
    config: EnvelopeConfig,
}

impl Stamper {
    pub fn new(config: EnvelopeConfig) -> Self {
        Self { config }
    }

    pub fn application(&self) -> &str {
        &self.config.application
    }

    pub fn config(&self) -> &EnvelopeConfig {
        &self.config
    }

    /// [`prepare_incoming`] under this stage's name.
    pub fn incoming<M>(&self, envelope: Envelope<M>) -> Envelope<M> {
        prepare_incoming(&self.config.application, envelope)
    }

    /// Decode a raw payload and stamp it.
    pub fn receive<M: DeserializeOwned + Default>(&self, payload: &[u8]) -> Result<Envelope<M>> {
        Ok(self.incoming(decode(payload)?))
    }

    /// Wrap a bare payload in a new envelope and stamp it.
    pub fn wrap<M>(&self, message: M) -> Envelope<M> {
        self.incoming(Envelope::new(message))
    }

    pub fn fanout<M: Clone>(&self, envelope: &Envelope<M>) -> Envelope<M> {
        fanout(envelope)
    }

    pub fn send<M: Serialize, D: Destination + ?Sized>(
        &self,
        envelope: Envelope<M>,
        destination: &mut D,
        routing_key: Option<&str>,
    ) -> std::result::Result<Envelope<M>, SendError<D::Error>> {
        send(envelope, destination, routing_key)
    }

    pub fn send_error<M: Serialize, D: Destination + ?Sized>(
        &self,
        envelope: Envelope<M>,
        destination: &mut D,
    ) -> std::result::Result<Envelope<M>, SendError<D::Error>> {
        send_error(envelope, destination)
    }
}
