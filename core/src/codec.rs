//! JSON encoding and decoding of request and response bodies.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Serialize `value` to compact JSON bytes.
pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CodecError> {
    serde_json::to_vec(value).map_err(|e| CodecError::Encode(e.to_string()))
}

/// Deserialize JSON `bytes` into `T`.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
