//! Perturbation operations: one entry point per operation kind.
//!
//! Every operation follows the same shape: validate the input file's
//! coverage, write a provenance sidecar, stream the messages once (twice
//! for time-slot swaps), rewrite the value arrays of matching messages
//! and copy everything else through byte-for-byte. On success the path
//! of the complete output file is returned; on failure nothing further
//! is written and any partially written output must be discarded by the
//! caller.

mod factor;
mod region;
mod swap;

pub use factor::{perturb_by_factor, perturb_by_factor_table};
pub use region::{perturb_point, perturb_polygons, perturb_region, perturb_variable};
pub use swap::shift_phase;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use grib2_codec::{Grib2Reader, GribMessage, MessageSource};
use tracing::{info, warn};

use crate::config::PerturbationConfig;
use crate::coverage::CoverageTable;
use crate::provenance;
use crate::validate::validate;
use crate::{PerturbationError, Result};

/// Open the input file and gate on schema validation.
///
/// The reader comes back rewound to the first message.
fn open_validated(input: &Path) -> Result<Grib2Reader> {
    let mut reader = Grib2Reader::from_path(input)?;

    let report = validate(&mut reader, &CoverageTable::standard())?;
    if !report.is_valid() {
        warn!(input = %input.display(), "refusing to perturb a file that failed validation");
        return Err(PerturbationError::SchemaViolation);
    }

    reader.rewind()?;
    Ok(reader)
}

/// Resolve the output path: the caller's explicit choice, or a derived
/// name in the configured output directory. The parent directory is
/// created either way.
fn prepare_output(
    input: &Path,
    config: &PerturbationConfig,
    tag: &str,
    uid: &str,
    explicit: Option<&Path>,
) -> Result<PathBuf> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => provenance::derived_path(input, &config.output_dir, tag, uid),
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    Ok(path)
}

/// Incremental writer for the output message stream.
struct OutputStream {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl OutputStream {
    fn create(path: PathBuf) -> Result<Self> {
        let writer = BufWriter::new(File::create(&path)?);
        Ok(Self { writer, path })
    }

    fn write_message(&mut self, message: &GribMessage) -> Result<()> {
        self.writer.write_all(&message.to_bytes())?;
        Ok(())
    }

    fn finish(mut self) -> Result<PathBuf> {
        self.writer.flush()?;
        info!(output = %self.path.display(), "wrote perturbed grib file");
        Ok(self.path)
    }
}
