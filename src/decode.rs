//! Standard transforms turning raw bytes into typed values.
//!
//! Both functions have the `Vec<u8> -> Result<T>` shape expected by
//! [`map_source`](crate::map::map_source).

use crate::error::Result;
use serde::de::DeserializeOwned;

/// Decode JSON bytes into `T`.
///
/// # Errors
///
/// Returns `Error::DeserializationError` on malformed input or a shape mismatch.
pub fn json<T: DeserializeOwned>(bytes: Vec<u8>) -> Result<T> {
    Ok(serde_json::from_slice(&bytes)?)
}

/// Decode XML bytes into `T`.
///
/// The root element name is not checked; its children map to the fields of `T`.
///
/// # Errors
///
/// Returns `Error::DeserializationError` on malformed input or a shape mismatch.
pub fn xml<T: DeserializeOwned>(bytes: Vec<u8>) -> Result<T> {
    Ok(quick_xml::de::from_reader(bytes.as_slice())?)
}
