use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::errors::GenerationError;

/// A single pretty-printed JSON array of objects.
pub fn encode_records<T: Serialize>(records: &[T]) -> Result<Vec<u8>, GenerationError> {
    let mut data = serde_json::to_vec_pretty(records)?;
    data.push(b'\n');
    Ok(data)
}

pub fn decode_records<T: DeserializeOwned>(data: &[u8]) -> Result<Vec<T>, GenerationError> {
    Ok(serde_json::from_slice(data)?)
}
