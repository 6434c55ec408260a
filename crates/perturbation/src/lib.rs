//! Selection-and-transform engine for AIFS GRIB files.
//!
//! This crate validates that a GRIB file carries the complete, expected
//! set of (variable, level, data time) records and applies localized or
//! global numeric perturbations to selected records while passing all
//! other records through unchanged.
//!
//! # Architecture
//!
//! ```text
//! GRIB file
//!      │
//!      ▼
//! validate::validate (coverage gate)
//!      │
//!      ▼
//! ops::* (one entry point per operation)
//!      │
//!      ├─► snap requested coordinates onto the message grid
//!      ├─► select::* builds a boolean mask over grid points
//!      ├─► transform::* applies value' = value * zmul + zadd
//!      │       (plus the temperature clamp where applicable)
//!      └─► phase::* swaps values between data times 0 and 1800
//!      │
//!      ▼
//! output GRIB file (one-to-one with input, order preserved)
//! ```
//!
//! All operations are single-threaded and stream the input once (twice
//! for time-slot swaps, which buffer slot 0/1800 values and rewind).
//! Every successful operation also writes a JSON provenance sidecar
//! recording its exact input parameters next to the input file.

pub mod config;
pub mod coverage;
pub mod error;
pub mod factors;
pub mod ops;
pub mod phase;
pub mod provenance;
pub mod select;
pub mod snap;
pub mod testdata;
pub mod transform;
pub mod validate;

// Re-export commonly used types at crate root
pub use config::PerturbationConfig;
pub use coverage::{CoverageTable, ObservedCoverage};
pub use error::{PerturbationError, Result};
pub use factors::{FactorEntry, FactorTable};
pub use phase::PhaseShift;
pub use select::{LatLonBox, PolygonFactor, Selection};
pub use transform::ClampSpec;
pub use validate::{validate, ValidationReport};
