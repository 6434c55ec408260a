//! Multiplicative factor operations: single factor and bulk tables.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use grib2_codec::MessageSource;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PerturbationConfig;
use crate::factors::FactorTable;
use crate::ops::{open_validated, prepare_output, OutputStream};
use crate::provenance::{self, short_uid};
use crate::transform::apply_affine_all;
use crate::{PerturbationError, Result};

#[derive(Serialize)]
struct FactorParams<'a> {
    grib_file_name: String,
    variable: &'a str,
    level: u32,
    zmul: f64,
}

/// Multiply every value of one `(variable, level)` pair by a factor.
///
/// A factor of exactly `1` is refused up front so an unperturbed file is
/// never passed off as perturbed.
pub fn perturb_by_factor(
    input: &Path,
    config: &PerturbationConfig,
    variable: &str,
    level: u32,
    factor: f64,
    output: Option<&Path>,
) -> Result<PathBuf> {
    if factor == 1.0 {
        warn!(factor, "perturbation factor is 1, grib file will not be perturbed");
        return Err(PerturbationError::NoOpRequested);
    }

    let mut reader = open_validated(input)?;

    let uid = short_uid();
    provenance::write_sidecar(
        input,
        "factor",
        &uid,
        &FactorParams {
            grib_file_name: input.display().to_string(),
            variable,
            level,
            zmul: factor,
        },
    )?;

    let path = prepare_output(input, config, "factor", &uid, output)?;
    let mut out = OutputStream::create(path)?;

    let mut found = false;
    while let Some(mut message) = reader.next_message()? {
        if message.short_name() == variable && message.level() == level {
            found = true;
            info!(
                variable = %message.short_name(),
                level = message.level(),
                data_time = message.data_time(),
                factor,
                "perturbing message by factor"
            );

            let mut values = message.values()?;
            apply_affine_all(&mut values, factor, 0.0);
            message.set_values(&values)?;
        }

        out.write_message(&message)?;
    }

    if !found {
        warn!(variable, level, "variable does not exist in the grib file");
        return Err(PerturbationError::SelectionNotFound {
            selection: format!("{variable} at level {level}"),
        });
    }

    out.finish()
}

#[derive(Serialize)]
struct FactorTableParams<'a> {
    grib_file: String,
    factors: &'a FactorTable,
}

/// Apply a bulk factor table: each matching `(variable, level)` message
/// is multiplied by its table factor.
///
/// Pairs missing from the file are logged; the operation only fails when
/// no pair matched at all.
pub fn perturb_by_factor_table(
    input: &Path,
    config: &PerturbationConfig,
    table: &FactorTable,
    output: Option<&Path>,
) -> Result<PathBuf> {
    let mut reader = open_validated(input)?;

    let uid = short_uid();
    provenance::write_sidecar(
        input,
        "factors",
        &uid,
        &FactorTableParams {
            grib_file: input.display().to_string(),
            factors: table,
        },
    )?;

    let path = prepare_output(input, config, "factors", &uid, output)?;
    let mut out = OutputStream::create(path)?;

    let mut matched: BTreeSet<(String, u32)> = BTreeSet::new();
    while let Some(mut message) = reader.next_message()? {
        let variable = message.short_name().to_string();
        let level = message.level();

        if let Some(factor) = table.factor_for(&variable, level) {
            info!(
                variable = %variable,
                level,
                data_time = message.data_time(),
                factor,
                "perturbing message from factor table"
            );

            let mut values = message.values()?;
            apply_affine_all(&mut values, factor, 0.0);
            message.set_values(&values)?;

            matched.insert((variable, level));
        }

        out.write_message(&message)?;
    }

    if matched.is_empty() {
        warn!("none of the factor table entries exist in the grib file");
        return Err(PerturbationError::SelectionNotFound {
            selection: "every factor table entry".to_string(),
        });
    }

    let missing: Vec<String> = table
        .entries()
        .iter()
        .filter(|e| !matched.contains(&(e.variable.clone(), e.level)))
        .map(|e| e.to_string())
        .collect();
    if !missing.is_empty() {
        warn!(missing = %missing.join(", "), "these variables were not found in the grib file");
    }

    out.finish()
}
