use nosql::errors::{ErrorKind, NosqlError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::error::Error;
use thiserror::Error;

/// Failure while converting keys, documents or catalog entries to and from
/// their stored bytes.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FjallValueError {
    #[error("Deserialization failed: {0}")]
    DeserializationError(String),
    #[error("Serialization failed: {0}")]
    SerializationError(String),
    #[error("Invalid UTF-8 in serialized data: {0}")]
    InvalidUtf8(String),
}

impl From<FjallValueError> for NosqlError {
    fn from(err: FjallValueError) -> Self {
        log::error!("Fjall encoding error: {}", err);
        NosqlError::new(&err.to_string(), ErrorKind::EncodingError)
    }
}

pub type FjallValueResult<T> = Result<T, FjallValueError>;

/// Serializes `value` with bincode's legacy configuration.
///
/// Keys, documents and catalog entries all go through here, so encoding is
/// deterministic: the same key always produces the same bytes, which is what
/// partition lookups and range seeks rely on.
#[inline]
pub(crate) fn encode<T: Serialize>(value: &T) -> FjallValueResult<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::legacy())
        .map_err(|e| FjallValueError::SerializationError(e.to_string()))
}

#[inline]
pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> FjallValueResult<T> {
    bincode::serde::decode_from_slice(bytes, bincode::config::legacy())
        .map(|(value, _)| value)
        .map_err(|e| FjallValueError::DeserializationError(e.to_string()))
}

#[inline]
pub(crate) fn decode_utf8(bytes: &[u8]) -> FjallValueResult<String> {
    String::from_utf8(bytes.to_vec()).map_err(|e| FjallValueError::InvalidUtf8(e.to_string()))
}

/// Maps a fjall failure onto the closest [ErrorKind] by its message.
pub(crate) fn to_nosql_error(error: impl Error) -> NosqlError {
    let error_msg = error.to_string();
    let error_kind = if error_msg.contains("closed") {
        ErrorKind::StoreAlreadyClosed
    } else if error_msg.contains("not found")
        || error_msg.contains("deleted")
        || error_msg.contains("PartitionDeleted")
    {
        ErrorKind::StoreNotInitialized
    } else if error_msg.contains("permission") || error_msg.contains("full") {
        ErrorKind::IOError
    } else {
        ErrorKind::BackendError
    };
    NosqlError::new(&format!("Fjall Error: {}", error_msg), error_kind)
}
