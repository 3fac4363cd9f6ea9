use std::convert::Infallible;

use bytes::Bytes;
use serde::Serialize;

use crate::codec::encode;
use crate::envelope::{prepare_outgoing, Envelope};
use crate::error::SendError;

/// Where finished envelopes go.
///
/// Implementations own all transport concerns. Both calls return once the
/// transport has accepted the payload.
pub trait Destination {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Hand over a regular payload, optionally routed by key.
    fn send(&mut self, payload: &[u8], routing_key: Option<&str>) -> Result<(), Self::Error>;

    /// Hand over a payload on the error path.
    fn error(&mut self, payload: &[u8]) -> Result<(), Self::Error>;
}

impl<D: Destination + ?Sized> Destination for &mut D {
    type Error = D::Error;

    fn send(&mut self, payload: &[u8], routing_key: Option<&str>) -> Result<(), Self::Error> {
        (**self).send(payload, routing_key)
    }

    fn error(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
        (**self).error(payload)
    }
}

/// A payload recorded by [`MemoryDestination`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sent {
    pub payload: Bytes,
    pub routing_key: Option<String>,
}

/// One payload handed to a channel destination, tagged with its path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    Message(Sent),
    Error(Bytes),
}

/// Destination that keeps everything in memory. Never fails.
#[derive(Debug, Clone, Default)]
pub struct MemoryDestination {
    sent: Vec<Sent>,
    errors: Vec<Bytes>,
}

impl MemoryDestination {
    pub fn new() -> Self {
        Self::default()
    }

    /// Regular payloads, oldest first.
    pub fn sent(&self) -> &[Sent] {
        &self.sent
    }

    /// Error payloads, oldest first.
    pub fn errors(&self) -> &[Bytes] {
        &self.errors
    }

    pub fn last_sent(&self) -> Option<&Sent> {
        self.sent.last()
    }

    pub fn last_error(&self) -> Option<&Bytes> {
        self.errors.last()
    }

    pub fn is_empty(&self) -> bool {
        self.sent.is_empty() && self.errors.is_empty()
    }

    /// Drain everything recorded so far.
    pub fn take(&mut self) -> (Vec<Sent>, Vec<Bytes>) {
        (
            std::mem::take(&mut self.sent),
            std::mem::take(&mut self.errors),
        )
    }

    fn record_sent(&mut self, payload: &[u8], routing_key: Option<&str>) {
        self.sent.push(Sent {
            payload: Bytes::copy_from_slice(payload),
            routing_key: routing_key.map(str::to_string),
        });
    }

    fn record_error(&mut self, payload: &[u8]) {
        self.errors.push(Bytes::copy_from_slice(payload));
    }
}

impl Destination for MemoryDestination {
    type Error = Infallible;

    fn send(&mut self, payload: &[u8], routing_key: Option<&str>) -> Result<(), Infallible> {
        self.record_sent(payload, routing_key);
        Ok(())
    }

    fn error(&mut self, payload: &[u8]) -> Result<(), Infallible> {
        self.record_error(payload);
        Ok(())
    }
}

/// Prepare, encode and send an envelope on the regular path.
///
/// Returns the envelope as sent. No retry: a destination failure comes
/// back as [`SendError::Destination`] holding the destination's error.
pub fn send<M, D>(
    envelope: Envelope<M>,
    destination: &mut D,
    routing_key: Option<&str>,
) -> Result<Envelope<M>, SendError<D::Error>>
where
    M: Serialize,
    D: Destination + ?Sized,
{
    let envelope = prepare_outgoing(envelope)?;
    let payload = encode(&envelope)?;
    tracing::debug!(
        job_id = %envelope.job_id,
        routing_key = routing_key.unwrap_or_default(),
        size = payload.len(),
        "sending envelope"
    );
    destination
        .send(&payload, routing_key)
        .map_err(SendError::Destination)?;
    Ok(envelope)
}

/// Prepare, encode and send an envelope on the error path.
pub fn send_error<M, D>(
    envelope: Envelope<M>,
    destination: &mut D,
) -> Result<Envelope<M>, SendError<D::Error>>
where
    M: Serialize,
    D: Destination + ?Sized,
{
    let envelope = prepare_outgoing(envelope)?;
    let payload = encode(&envelope)?;
    tracing::debug!(
        job_id = %envelope.job_id,
        size = payload.len(),
        "sending envelope to error path"
    );
    destination.error(&payload).map_err(SendError::Destination)?;
    Ok(envelope)
}

#[cfg(feature = "async")]
pub use self::nonblocking::{send_async, send_error_async, AsyncDestination};

#[cfg(feature = "async")]
mod nonblocking {
    use async_trait::async_trait;
    use tokio::sync::mpsc;

    use super::*;

    /// Async counterpart of [`Destination`].
    #[async_trait]
    pub trait AsyncDestination: Send {
        type Error: std::error::Error + Send + Sync + 'static;

        async fn send(
            &mut self,
            payload: &[u8],
            routing_key: Option<&str>,
        ) -> Result<(), Self::Error>;

        async fn error(&mut self, payload: &[u8]) -> Result<(), Self::Error>;
    }

    #[async_trait]
    impl AsyncDestination for MemoryDestination {
        type Error = Infallible;

        async fn send(&mut self, payload: &[u8], routing_key: Option<&str>) -> Result<(), Infallible> {
            self.record_sent(payload, routing_key);
            Ok(())
        }

        async fn error(&mut self, payload: &[u8]) -> Result<(), Infallible> {
            self.record_error(payload);
            Ok(())
        }
    }

    /// Hands payloads to whatever task owns the receiving end, typically
    /// the one driving the broker producer.
    #[async_trait]
    impl AsyncDestination for mpsc::Sender<Outbound> {
        type Error = mpsc::error::SendError<Outbound>;

        async fn send(&mut self, payload: &[u8], routing_key: Option<&str>) -> Result<(), Self::Error> {
            let sent = Sent {
                payload: Bytes::copy_from_slice(payload),
                routing_key: routing_key.map(str::to_string),
            };
            mpsc::Sender::send(self, Outbound::Message(sent)).await
        }

        async fn error(&mut self, payload: &[u8]) -> Result<(), Self::Error> {
            mpsc::Sender::send(self, Outbound::Error(Bytes::copy_from_slice(payload))).await
        }
    }

    /// Async [`send`](super::send).
    pub async fn send_async<M, D>(
        envelope: Envelope<M>,
        destination: &mut D,
        routing_key: Option<&str>,
    ) -> Result<Envelope<M>, SendError<D::Error>>
    where
        M: Serialize,
        D: AsyncDestination + ?Sized,
    {
        let envelope = prepare_outgoing(envelope)?;
        let payload = encode(&envelope)?;
        tracing::debug!(
            job_id = %envelope.job_id,
            routing_key = routing_key.unwrap_or_default(),
            size = payload.len(),
            "sending envelope"
        );
        destination
            .send(&payload, routing_key)
            .await
            .map_err(SendError::Destination)?;
        Ok(envelope)
    }

    /// Async [`send_error`](super::send_error).
    pub async fn send_error_async<M, D>(
        envelope: Envelope<M>,
        destination: &mut D,
    ) -> Result<Envelope<M>, SendError<D::Error>>
    where
        M: Serialize,
        D: AsyncDestination + ?Sized,
    {
        let envelope = prepare_outgoing(envelope)?;
        let payload = encode(&envelope)?;
        tracing::debug!(
            job_id = %envelope.job_id,
            size = payload.len(),
            "sending envelope to error path"
        );
        destination
            .error(&payload)
            .await
            .map_err(SendError::Destination)?;
        Ok(envelope)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::codec::decode;
    use crate::envelope::prepare_incoming;
    use crate::error::EnvelopeError;

    #[derive(Debug, thiserror::Error)]
    #[error("broker unavailable")]
    struct Unavailable;

    struct Failing;

    impl Destination for Failing {
        type Error = Unavailable;

        fn send(&mut self, _: &[u8], _: Option<&str>) -> Result<(), Unavailable> {
            Err(Unavailable)
        }

        fn error(&mut self, _: &[u8]) -> Result<(), Unavailable> {
            Err(Unavailable)
        }
    }

    fn stamped(message: Value) -> Envelope {
        prepare_incoming("testing", Envelope::new(message))
    }

    #[test]
    fn send_records_encoded_envelope() {
        let mut destination = MemoryDestination::new();
        let sent = send(stamped(json!("test_message")), &mut destination, Some("track")).unwrap();

        let record = destination.last_sent().unwrap();
        assert_eq!(record.routing_key.as_deref(), Some("track"));

        let received: Envelope = decode(&record.payload).unwrap();
        assert_eq!(received.message, "test_message");
        assert_eq!(received, sent);
        assert!(received.events[0].updated_at.is_some());
        assert!(destination.errors().is_empty());
    }

    #[test]
    fn send_error_uses_error_path() {
        let mut destination = MemoryDestination::new();
        let raw: Envelope = decode(br#"{"message":"test_message","events":[{}]}"#).unwrap();
        send_error(raw, &mut destination).unwrap();

        assert!(destination.sent().is_empty());
        let received: Envelope = decode(destination.last_error().unwrap()).unwrap();
        assert_eq!(received.message, "test_message");
    }

    #[test]
    fn unstamped_envelopes_are_not_sent() {
        let mut destination = MemoryDestination::new();
        let result = send(Envelope::new(json!(1)), &mut destination, None);

        assert!(matches!(
            result,
            Err(SendError::Envelope(EnvelopeError::NoEvents))
        ));
        assert!(destination.is_empty());
    }

    #[test]
    fn destination_errors_pass_through() {
        let err = send(stamped(json!(1)), &mut Failing, None).unwrap_err();
        assert!(err.destination().is_some());
        assert_eq!(err.to_string(), "destination failed: broker unavailable");

        let err = send_error(stamped(json!(1)), &mut Failing).unwrap_err();
        assert!(matches!(err.into_destination(), Some(Unavailable)));
    }

    #[test]
    fn take_drains_memory() {
        let mut destination = MemoryDestination::new();
        send(stamped(json!(1)), &mut destination, None).unwrap();
        send_error(stamped(json!(2)), &mut destination).unwrap();

        let (sent, errors) = destination.take();
        assert_eq!((sent.len(), errors.len()), (1, 1));
        assert!(destination.is_empty());
    }

    #[cfg(feature = "async")]
    mod nonblocking {
        use tokio::sync::mpsc;

        use super::*;

        #[tokio::test]
        async fn memory_destination_async() {
            let mut destination = MemoryDestination::new();
            send_async(stamped(json!("a")), &mut destination, Some("k"))
                .await
                .unwrap();
            send_error_async(stamped(json!("b")), &mut destination)
                .await
                .unwrap();

            assert_eq!(destination.sent().len(), 1);
            assert_eq!(destination.errors().len(), 1);
        }

        #[tokio::test]
        async fn channel_destination_tags_paths() {
            let (mut tx, mut rx) = mpsc::channel::<Outbound>(4);
            send_async(stamped(json!("a")), &mut tx, Some("k"))
                .await
                .unwrap();
            send_error_async(stamped(json!("b")), &mut tx)
                .await
                .unwrap();

            let Some(Outbound::Message(first)) = rx.recv().await else {
                panic!("expected a regular payload first");
            };
            assert_eq!(first.routing_key.as_deref(), Some("k"));
            let envelope: Envelope = decode(&first.payload).unwrap();
            assert_eq!(envelope.message, "a");

            let Some(Outbound::Error(second)) = rx.recv().await else {
                panic!("expected an error payload second");
            };
            let envelope: Envelope = decode(&second).unwrap();
            assert_eq!(envelope.message, "b");
        }

        #[tokio::test]
        async fn closed_channel_is_a_destination_error() {
            let (mut tx, rx) = mpsc::channel::<Outbound>(1);
            drop(rx);

            let err = send_async(stamped(json!(1)), &mut tx, None)
                .await
                .unwrap_err();
            assert!(matches!(
                err.into_destination(),
                Some(mpsc::error::SendError(Outbound::Message(_)))
            ));
        }
    }
}
