use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// Encodes `value` as a MessagePack map of named fields — the
/// self-describing body format every frame carries.
pub fn encode_body<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(rmp_serde::to_vec_named(value)?)
}

/// Decodes a MessagePack map body into `T`.
pub fn decode_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(rmp_serde::from_slice(bytes)?)
}
