use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::Error;

/// Deserialize with JSON-path context in error messages.
pub fn from_slice_with_path<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, Error> {
    let mut de = serde_json::Deserializer::from_slice(bytes);
    let value = serde_path_to_error::deserialize::<_, T>(&mut de).map_err(decode_error)?;
    // trailing garbage after the document
    de.end().map_err(|err| Error::Decode {
        path: ".".to_string(),
        message: err.to_string(),
    })?;
    Ok(value)
}

/// Same as [`from_slice_with_path`], for an already parsed value.
pub fn from_value_with_path<T: DeserializeOwned>(value: Value) -> Result<T, Error> {
    serde_path_to_error::deserialize::<_, T>(value).map_err(decode_error)
}

fn decode_error(err: serde_path_to_error::Error<serde_json::Error>) -> Error {
    let path = err.path().to_string();
    Error::Decode {
        path,
        message: err.into_inner().to_string(),
    }
}
