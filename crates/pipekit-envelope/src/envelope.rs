use std::fmt;

use serde::ser::{Impossible, Serializer};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{EnvelopeError, Result};
use crate::timestamp::{self, Timestamp};

/// Tracking wrapper around an application payload.
///
/// `job_id` and `originated_at` never change once set, `events` only grows,
/// and `message` is opaque. Keys this type does not know about are kept in
/// `extra` and written back out unchanged. A `null` message is left out on
/// the wire, so an envelope without one round-trips as it came in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<M = Value> {
    #[serde(default, deserialize_with = "deserialize_job_id")]
    pub job_id: String,
    #[serde(default)]
    pub ancestor_ids: Vec<String>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub originated_at: Option<Timestamp>,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default, skip_serializing_if = "is_null")]
    pub message: M,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One stage's pass over an envelope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub app: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub event_id: String,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub received_at: Option<Timestamp>,
    #[serde(
        default,
        with = "timestamp::option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<Timestamp>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl<M> Envelope<M> {
    /// Wrap a payload in an unstamped envelope.
    pub fn new(message: M) -> Self {
        Self {
            job_id: String::new(),
            ancestor_ids: Vec::new(),
            originated_at: None,
            events: Vec::new(),
            message,
            extra: Map::new(),
        }
    }

    pub fn last_event(&self) -> Option<&Event> {
        self.events.last()
    }

    /// Swap the payload, keeping the tracking fields.
    pub fn map<N>(self, f: impl FnOnce(M) -> N) -> Envelope<N> {
        Envelope {
            job_id: self.job_id,
            ancestor_ids: self.ancestor_ids,
            originated_at: self.originated_at,
            events: self.events,
            message: f(self.message),
            extra: self.extra,
        }
    }
}

/// Stamp an envelope arriving at the stage named `source_name`.
///
/// Fills in `job_id` and `originated_at` only when they are missing, then
/// appends exactly one event.
pub fn prepare_incoming<M>(source_name: &str, mut envelope: Envelope<M>) -> Envelope<M> {
    let now = Timestamp::now();

    if envelope.job_id.is_empty() {
        envelope.job_id = new_id();
        tracing::trace!(job_id = %envelope.job_id, "assigned job id");
    }
    if envelope.originated_at.is_none() {
        envelope.originated_at = Some(now.clone());
    }

    envelope.events.push(Event {
        app: source_name.to_string(),
        event_id: new_id(),
        received_at: Some(now),
        updated_at: None,
        extra: Map::new(),
    });

    tracing::debug!(
        job_id = %envelope.job_id,
        app = source_name,
        events = envelope.events.len(),
        "envelope received"
    );
    envelope
}

/// Set `updated_at` on the most recent event.
pub fn prepare_outgoing<M>(mut envelope: Envelope<M>) -> Result<Envelope<M>> {
    let event = envelope.events.last_mut().ok_or(EnvelopeError::NoEvents)?;
    event.updated_at = Some(Timestamp::now());
    Ok(envelope)
}

/// Derive a child envelope for one of several outputs of a stage.
///
/// The copy gets a fresh `job_id` and records the original's `job_id` as
/// its newest ancestor. The original is not touched.
pub fn fanout<M: Clone>(envelope: &Envelope<M>) -> Envelope<M> {
    let mut child = envelope.clone();
    child.ancestor_ids.push(envelope.job_id.clone());
    child.job_id = new_id();
    tracing::debug!(
        job_id = %child.job_id,
        parent = %envelope.job_id,
        "envelope fanned out"
    );
    child
}

/// Whether `message` serializes as JSON `null`.
///
/// Stops at the first serializer call, so payloads are never walked.
fn is_null<M: Serialize>(message: &M) -> bool {
    message.serialize(NullCheck).unwrap_or(false)
}

struct NullCheck;

#[derive(Debug)]
struct NotNull;

impl fmt::Display for NotNull {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("not null")
    }
}

impl std::error::Error for NotNull {}

impl serde::ser::Error for NotNull {
    fn custom<T: fmt::Display>(_: T) -> Self {
        NotNull
    }
}

macro_rules! scalar_is_not_null {
    ($($method:ident($ty:ty)),* $(,)?) => {
        $(fn $method(self, _: $ty) -> std::result::Result<bool, NotNull> {
            Ok(false)
        })*
    };
}

impl Serializer for NullCheck {
    type Ok = bool;
    type Error = NotNull;
    type SerializeSeq = Impossible<bool, NotNull>;
    type SerializeTuple = Impossible<bool, NotNull>;
    type SerializeTupleStruct = Impossible<bool, NotNull>;
    type SerializeTupleVariant = Impossible<bool, NotNull>;
    type SerializeMap = Impossible<bool, NotNull>;
    type SerializeStruct = Impossible<bool, NotNull>;
    type SerializeStructVariant = Impossible<bool, NotNull>;

    scalar_is_not_null! {
        serialize_bool(bool),
        serialize_i8(i8),
        serialize_i16(i16),
        serialize_i32(i32),
        serialize_i64(i64),
        serialize_u8(u8),
        serialize_u16(u16),
        serialize_u32(u32),
        serialize_u64(u64),
        serialize_f32(f32),
        serialize_f64(f64),
        serialize_char(char),
        serialize_str(&str),
        serialize_bytes(&[u8]),
    }

    fn serialize_none(self) -> std::result::Result<bool, NotNull> {
        Ok(true)
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> std::result::Result<bool, NotNull> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> std::result::Result<bool, NotNull> {
        Ok(true)
    }

    fn serialize_unit_struct(self, _: &'static str) -> std::result::Result<bool, NotNull> {
        Ok(true)
    }

    fn serialize_unit_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
    ) -> std::result::Result<bool, NotNull> {
        Ok(false)
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> std::result::Result<bool, NotNull> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: &T,
    ) -> std::result::Result<bool, NotNull> {
        Ok(false)
    }

    fn serialize_seq(self, _: Option<usize>) -> std::result::Result<Self::SerializeSeq, NotNull> {
        Err(NotNull)
    }

    fn serialize_tuple(self, _: usize) -> std::result::Result<Self::SerializeTuple, NotNull> {
        Err(NotNull)
    }

    fn serialize_tuple_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> std::result::Result<Self::SerializeTupleStruct, NotNull> {
        Err(NotNull)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> std::result::Result<Self::SerializeTupleVariant, NotNull> {
        Err(NotNull)
    }

    fn serialize_map(self, _: Option<usize>) -> std::result::Result<Self::SerializeMap, NotNull> {
        Err(NotNull)
    }

    fn serialize_struct(
        self,
        _: &'static str,
        _: usize,
    ) -> std::result::Result<Self::SerializeStruct, NotNull> {
        Err(NotNull)
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> std::result::Result<Self::SerializeStructVariant, NotNull> {
        Err(NotNull)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// Accept a string or an integer job id; `null` reads as missing.
fn deserialize_job_id<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(String::new()),
        Value::String(id) => Ok(id),
        Value::Number(id) if !id.is_f64() => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format_args!(
            "job_id must be a string, got {other}"
        ))),
    }
}
