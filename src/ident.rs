//! Item identifier codec.
//!
//! Identifiers are 128-bit random values. They are stored as their
//! 16-byte binary encoding and exposed externally in the canonical
//! hyphenated textual form, on every code path.

use std::fmt;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Length of the binary storage encoding.
pub const ENCODED_LEN: usize = 16;

/// A stored identifier could not be decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("identifier must be exactly {ENCODED_LEN} bytes, got {actual}")]
pub struct DecodeError {
    pub actual: usize,
}

/// Unique identifier of an item row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Generates a new random identifier.
    ///
    /// Entropy is sufficient that collisions are treated as negligible;
    /// there is no detection or retry.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Decodes the 16-byte storage form.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DecodeError> {
        Uuid::from_slice(bytes).map(Self).map_err(|_| DecodeError {
            actual: bytes.len(),
        })
    }

    /// The 16-byte binary encoding written to the store.
    pub fn to_storage(self) -> Vec<u8> {
        self.0.as_bytes().to_vec()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.as_hyphenated())
    }
}
