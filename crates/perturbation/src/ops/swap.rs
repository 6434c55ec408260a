//! The forecast-time-slot swap operation.

use std::path::{Path, PathBuf};

use grib2_codec::MessageSource;
use serde::Serialize;
use tracing::info;

use crate::config::PerturbationConfig;
use crate::ops::{open_validated, prepare_output, OutputStream};
use crate::phase::{PhaseShift, TimeSlotBuffer};
use crate::provenance::{self, short_uid};
use crate::Result;

#[derive(Serialize)]
struct PhaseParams {
    grib_file: String,
    phase_shift: String,
}

/// Exchange values between the 0 and 1800 data times.
///
/// Pass 1 buffers the value arrays at both slots, the stream is rewound,
/// and pass 2 emits every message in original order with values pulled
/// from the opposite slot's buffer where the shift policy says so.
/// Messages without a buffered counterpart pass through unchanged; data
/// times themselves are never rewritten.
pub fn shift_phase(
    input: &Path,
    config: &PerturbationConfig,
    shift: PhaseShift,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let mut reader = open_validated(input)?;

    let uid = short_uid();
    provenance::write_sidecar(
        input,
        "phase",
        &uid,
        &PhaseParams {
            grib_file: input.display().to_string(),
            phase_shift: shift.to_string(),
        },
    )?;

    let buffer = TimeSlotBuffer::capture(&mut reader)?;
    reader.rewind()?;

    let path = prepare_output(input, config, "phase", &uid, output)?;
    let mut out = OutputStream::create(path)?;

    let mut swapped = 0usize;
    while let Some(mut message) = reader.next_message()? {
        let replacement = buffer.replacement(
            shift,
            message.data_time(),
            message.short_name(),
            message.level(),
        );

        if let Some(values) = replacement {
            message.set_values(values)?;
            swapped += 1;
        }

        out.write_message(&message)?;
    }

    info!(shift = %shift, swapped, "phase shift complete");
    out.finish()
}
