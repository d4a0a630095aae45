//! Value serialization formats.
//!
//! Drivers only store opaque bytes. The format decides how typed values are
//! turned into those bytes and back, so a stored `None` round-trips as a
//! real payload instead of looking like an absent key.

use bincode::{
    config::standard as bincode_config,
    serde::{decode_from_slice, encode_to_vec},
};
use bytes::Bytes;
use cachet_core::Raw;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FormatError {
    #[error(transparent)]
    Serialize(Box<dyn std::error::Error + Send + Sync>),

    #[error(transparent)]
    Deserialize(Box<dyn std::error::Error + Send + Sync>),
}

/// Serialization format for cached values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueFormat {
    /// Human-readable, handy when inspecting a backend by hand.
    #[default]
    Json,
    /// Compact binary encoding.
    Bincode,
}

impl ValueFormat {
    pub fn serialize<T>(&self, value: &T) -> Result<Raw, FormatError>
    where
        T: Serialize + ?Sized,
    {
        match self {
            ValueFormat::Json => serde_json::to_vec(value)
                .map(Bytes::from)
                .map_err(|e| FormatError::Serialize(Box::new(e))),
            ValueFormat::Bincode => encode_to_vec(value, bincode_config())
                .map(Bytes::from)
                .map_err(|e| FormatError::Serialize(Box::new(e))),
        }
    }

    pub fn deserialize<T>(&self, raw: &[u8]) -> Result<T, FormatError>
    where
        T: DeserializeOwned,
    {
        match self {
            ValueFormat::Json => {
                serde_json::from_slice(raw).map_err(|e| FormatError::Deserialize(Box::new(e)))
            }
            ValueFormat::Bincode => decode_from_slice(raw, bincode_config())
                .map(|(value, _)| value)
                .map_err(|e| FormatError::Deserialize(Box::new(e))),
        }
    }
}
