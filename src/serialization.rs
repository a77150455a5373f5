//! Byte encoding for fitted tables.
//!
//! A fitted [`EncodingTable`](crate::EncodingTable) is persisted through its
//! [`EncodingTableParams`](crate::EncodingTableParams): level keys, their
//! values and the novel row. Any serde type gets the bincode encoding below.

use std::error::Error;

/// Conversion between a fitted table's stored state and raw bytes.
pub trait SerializableParams: Sized {
    type Error: Error + Send + Sync + 'static;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error>;

    /// Fails on truncated or foreign input.
    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}
