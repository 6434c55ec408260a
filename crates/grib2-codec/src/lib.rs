//! GRIB2 message codec (WMO FM 92 GRIB Edition 2).
//!
//! This crate provides a pure Rust codec for the subset of GRIB2 used by
//! the perturbation pipeline: regular latitude/longitude grids (template
//! 3.0), analysis/forecast products at a horizontal level (template 4.0)
//! and simple packing (template 5.0).
//!
//! The central abstraction is a rewindable stream of [`GribMessage`]s:
//!
//! ```ignore
//! use grib2_codec::{Grib2Reader, MessageSource};
//!
//! let mut reader = Grib2Reader::from_path("forecast.grb")?;
//! while let Some(mut message) = reader.next_message()? {
//!     let field = message.data()?;
//!     // ... modify field.values ...
//!     message.set_values(&field.values)?;
//!     out.write_all(&message.to_bytes())?;
//! }
//! reader.rewind()?;
//! ```
//!
//! Messages retain their raw bytes, so anything the codec does not touch
//! (grid geometry, metadata, packing parameters) is preserved verbatim on
//! re-serialization. Only [`GribMessage::set_values`] rewrites bytes, and
//! it reuses the original packing parameters whenever the new values fit
//! them, so unchanged grid points round-trip bit-identically.

pub mod builder;
pub mod message;
pub mod packing;
pub mod sections;
pub mod tables;

use thiserror::Error;

pub use builder::MessageBuilder;
pub use message::{Grib2Reader, GribMessage, GridField, MessageSource};

/// Errors raised while decoding or re-encoding GRIB2 data.
#[derive(Debug, Error)]
pub enum Grib2Error {
    /// The byte stream is not a well-formed GRIB2 message.
    #[error("invalid GRIB2 format: {0}")]
    InvalidFormat(String),

    /// A specific section could not be parsed.
    #[error("invalid GRIB2 section {section}: {reason}")]
    InvalidSection { section: u8, reason: String },

    /// Packed data could not be unpacked.
    #[error("unpacking error: {0}")]
    UnpackingError(String),

    /// Valid GRIB2, but a template or feature this codec does not handle.
    #[error("unsupported GRIB2 feature: {0}")]
    Unsupported(String),

    /// A value array could not be re-encoded into the message.
    #[error("encoding error: {0}")]
    EncodingError(String),

    /// Underlying stream I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for codec operations.
pub type Result<T> = std::result::Result<T, Grib2Error>;
