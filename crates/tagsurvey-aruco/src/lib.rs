//! Square fiducial dictionaries and decoding for the tagsurvey pipeline.
//!
//! This crate is the "vision library" side of the survey pipeline:
//! - dictionaries of packed marker codes (loaded as data, typically the
//!   deployment's 5×5-bit 250-symbol set),
//! - rotation-aware matching of observed codes against a dictionary,
//! - decoding markers from square candidate cells swept across a
//!   plane-facing grayscale frame.
//!
//! It knows nothing about the robot: frames come in as plain image views and
//! observations go out as ids with pixel corners.

mod decode;
mod dictionary;
mod matcher;
mod threshold;

pub use decode::{decode_cell, scan_frame, GridScanParams, TagObservation};
pub use dictionary::{Dictionary, DictionaryError};
pub use matcher::{rotate_code, Matcher, TagMatch};
