//! Marker dictionaries as data.
//!
//! A dictionary is deployment configuration, not code: the reference mission
//! ships a 5×5-bit, 250-symbol set loaded from its survey configuration.

use serde::Deserialize;
use thiserror::Error;

/// Errors validating a dictionary loaded from configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DictionaryError {
    #[error("marker size {marker_size} implies {bits} bits > 64 (unsupported)")]
    OversizedMarker { marker_size: usize, bits: usize },
    #[error("dictionary '{name}' has no codes")]
    Empty { name: String },
}

/// A fixed square-fiducial dictionary.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct Dictionary {
    /// Human-readable name (for logging and debug-image labels).
    pub name: String,
    /// Marker side length (number of inner bits per side).
    pub marker_size: usize,
    /// Maximum error-correcting Hamming distance the set was generated for.
    pub max_correction_bits: u8,
    /// One `u64` per marker id, inner bits row-major with **black = 1**.
    pub codes: Vec<u64>,
}

impl Dictionary {
    /// Total number of inner bits per marker.
    #[inline]
    pub fn bit_count(&self) -> usize {
        self.marker_size * self.marker_size
    }

    /// Check the set fits the packed-`u64` representation and is non-empty.
    pub fn validate(&self) -> Result<(), DictionaryError> {
        let bits = self.bit_count();
        if bits > 64 {
            return Err(DictionaryError::OversizedMarker {
                marker_size: self.marker_size,
                bits,
            });
        }
        if self.codes.is_empty() {
            return Err(DictionaryError::Empty {
                name: self.name.clone(),
            });
        }
        Ok(())
    }
}
