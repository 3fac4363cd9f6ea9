//! JSON encoding of envelopes and arbitrary values.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Serialize a value as UTF-8 JSON.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    Ok(Bytes::from(serde_json::to_vec(value)?))
}

/// Parse UTF-8 JSON produced by [`encode`] (or any other JSON producer).
pub fn decode<T: DeserializeOwned>(payload: &[u8]) -> Result<T> {
    Ok(serde_json::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::error::EnvelopeError;

    #[test]
    fn values_survive_a_round_trip() {
        for expected in [
            json!({ "a": 1, "b": "c" }),
            json!({ "a": { "b": { "c": "d" } } }),
            json!([1, 2, 3, 4]),
            json!("a"),
            json!(1),
        ] {
            let encoded = encode(&expected).unwrap();
            let actual: Value = decode(&encoded).unwrap();
            assert_eq!(actual, expected);
        }
    }

    #[test]
    fn encoded_form_is_json_text() {
        let encoded = encode(&json!({ "isrc": "USHR11600001" })).unwrap();
        assert_eq!(&encoded[..], br#"{"isrc":"USHR11600001"}"#);
    }

    #[test]
    fn malformed_input_is_an_error() {
        let result: Result<Value> = decode(b"{\"a\":");
        assert!(matches!(result, Err(EnvelopeError::Json(_))));

        let result: Result<Value> = decode(&[0xff, 0xfe]);
        assert!(result.is_err());
    }
}
