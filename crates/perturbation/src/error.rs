//! Error types for perturbation operations.

use thiserror::Error;

/// Errors that abort a perturbation operation.
///
/// Any output written before the failure is invalid and must be
/// discarded by the caller; no retry is attempted here.
#[derive(Debug, Error)]
pub enum PerturbationError {
    /// The file's observed coverage disagrees with the coverage table.
    #[error("grib file failed schema validation")]
    SchemaViolation,

    /// The requested variable/level never matched any message.
    #[error("selection does not exist in the grib file: {selection}")]
    SelectionNotFound { selection: String },

    /// The requested transform is the identity; refusing to write an
    /// unperturbed file that looks perturbed.
    #[error("no addition term and no multiplication factor, grib file will not be perturbed")]
    NoOpRequested,

    /// Spatial bounds entirely outside the valid lat/lon envelope.
    #[error("coordinates out of range limit lat ({lat_min}, {lat_max}) lon ({lon_min}, {lon_max})")]
    OutOfRangeSelection {
        lat_min: f64,
        lat_max: f64,
        lon_min: f64,
        lon_max: f64,
    },

    /// A bulk factor table failed construction-time validation.
    #[error("invalid factor table: {0}")]
    InvalidFactorTable(String),

    /// The underlying codec could not decode, encode or rewind.
    #[error("codec error: {0}")]
    Codec(#[from] grib2_codec::Grib2Error),

    /// File I/O failure.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Provenance sidecar serialization failure.
    #[error("sidecar serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for perturbation operations.
pub type Result<T> = std::result::Result<T, PerturbationError>;
