//! Tracking envelopes for pipeline stages.
//!
//! Every payload moving between stages rides in an [`Envelope`] that carries
//! a job id, the job ids it descends from, when the job started, and one
//! [`Event`] per stage it passed through. Stages stamp envelopes on the way
//! in with [`prepare_incoming`], split them with [`fanout`], and hand them
//! to a [`Destination`] with [`send`] or [`send_error`].
//!
//! ```
//! use pipekit_envelope::{prepare_incoming, send, Envelope, MemoryDestination};
//! use serde_json::json;
//!
//! let envelope = prepare_incoming("ingest", Envelope::new(json!({ "amw_key": "A1" })));
//! let mut destination = MemoryDestination::new();
//! send(envelope, &mut destination, Some("bundle")).unwrap();
//! assert_eq!(destination.sent().len(), 1);
//! ```

pub mod codec;
pub mod destination;
pub mod envelope;
pub mod error;
pub mod stamper;
pub mod timestamp;

pub use codec::{decode, encode};
pub use destination::{send, send_error, Destination, MemoryDestination, Outbound, Sent};
pub use envelope::{fanout, prepare_incoming, prepare_outgoing, Envelope, Event};
pub use error::{EnvelopeError, Result, SendError};
pub use stamper::{EnvelopeConfig, Stamper};
pub use timestamp::Timestamp;

#[cfg(feature = "async")]
pub use destination::{send_async, send_error_async, AsyncDestination};
