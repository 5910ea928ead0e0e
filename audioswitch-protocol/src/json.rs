//! JSON payload encoding

use alloc::vec::Vec;
use serde::Serialize;

/// Error producing an outbound payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PayloadError {
    /// Value could not be serialized
    Serialize,
}

/// Serialize a value as compact JSON
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, PayloadError> {
    serde_json::to_vec(value).map_err(|_| PayloadError::Serialize)
}
