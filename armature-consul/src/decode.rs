//! JSON body decoding.

use crate::{ConsulError, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Outcome of decoding a response body. Exactly one field is populated.
#[derive(Debug, Clone)]
pub struct DecodedBody {
    /// Decoded JSON value.
    pub decoded: Option<Value>,
    /// Decoding error.
    pub error: Option<ConsulError>,
}

impl DecodedBody {
    /// Convert into a plain `Result`.
    pub fn into_result(self) -> Result<Value> {
        match (self.decoded, self.error) {
            (_, Some(err)) => Err(err),
            (Some(value), None) => Ok(value),
            (None, None) => Ok(Value::Null),
        }
    }
}

/// Decode a response body as JSON.
///
/// An empty body is not valid JSON and yields a decode error.
pub fn decode_body(body: &[u8]) -> DecodedBody {
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => DecodedBody {
            decoded: Some(value),
            error: None,
        },
        Err(e) => DecodedBody {
            decoded: None,
            error: Some(ConsulError::Decode(e.to_string())),
        },
    }
}

/// Convert a decoded value into a typed structure.
pub fn from_value<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| ConsulError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[test]
    fn test_decode_object() {
        let decoded = decode_body(br#"{"a":1}"#);
        assert_eq!(decoded.decoded, Some(json!({"a": 1})));
        assert!(decoded.error.is_none());
    }

    #[test]
    fn test_decode_scalars() {
        assert_eq!(decode_body(b"true").decoded, Some(json!(true)));
        assert_eq!(decode_body(b"\"10.0.0.1:8300\"").decoded, Some(json!("10.0.0.1:8300")));
        assert_eq!(decode_body(b"null").decoded, Some(Value::Null));
    }

    #[test]
    fn test_decode_malformed() {
        let decoded = decode_body(b"{bad json");
        assert!(decoded.decoded.is_none());
        assert!(matches!(decoded.error, Some(ConsulError::Decode(_))));
    }

    #[test]
    fn test_decode_empty_body_is_error() {
        let decoded = decode_body(b"");
        assert!(decoded.decoded.is_none());
        match decoded.error {
            Some(ConsulError::Decode(msg)) => assert!(msg.contains("EOF")),
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_into_result() {
        assert_eq!(decode_body(b"[1]").into_result().unwrap(), json!([1]));
        assert!(decode_body(b"[").into_result().is_err());
    }

    #[test]
    fn test_from_value() {
        #[derive(Deserialize)]
        struct Pair {
            #[serde(rename = "Key")]
            key: String,
        }

        let pair: Pair = from_value(json!({"Key": "foo"})).unwrap();
        assert_eq!(pair.key, "foo");

        let err = from_value::<Pair>(json!({"Nope": 1})).err().unwrap();
        assert!(matches!(err, ConsulError::Decode(_)));
    }
}
