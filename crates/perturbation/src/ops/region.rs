//! Spatially scoped affine operations: global, rectangle, point, polygons.

use std::path::{Path, PathBuf};

use grib2_codec::MessageSource;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::PerturbationConfig;
use crate::ops::{open_validated, prepare_output, OutputStream};
use crate::provenance::{self, short_uid};
use crate::select::{point_mask, rectangle_mask, LatLonBox, PolygonFactor, Selection};
use crate::transform::{apply_affine, apply_affine_all, clamp_temperature, is_identity, ClampSpec};
use crate::{PerturbationError, Result};

fn reject_identity(zmul: f64, zadd: f64) -> Result<()> {
    if is_identity(zmul, zadd) {
        warn!("no addition term and no multiplication factor, grib file will not be perturbed");
        return Err(PerturbationError::NoOpRequested);
    }
    Ok(())
}

fn selection_not_found(variable: &str, level: u32) -> PerturbationError {
    warn!(variable, level, "variable does not exist in the grib file");
    PerturbationError::SelectionNotFound {
        selection: format!("{variable} at level {level}"),
    }
}

#[derive(Serialize)]
struct VariableParams<'a> {
    grib_file_name: String,
    variable: &'a str,
    level: u32,
    zmul: f64,
    zadd: f64,
}

/// Affine-transform every point of one `(variable, level)` pair.
pub fn perturb_variable(
    input: &Path,
    config: &PerturbationConfig,
    variable: &str,
    level: u32,
    zmul: f64,
    zadd: f64,
    output: Option<&Path>,
) -> Result<PathBuf> {
    reject_identity(zmul, zadd)?;

    let mut reader = open_validated(input)?;

    let uid = short_uid();
    provenance::write_sidecar(
        input,
        "perturbed",
        &uid,
        &VariableParams {
            grib_file_name: input.display().to_string(),
            variable,
            level,
            zmul,
            zadd,
        },
    )?;

    let path = prepare_output(input, config, "perturbed", &uid, output)?;
    let mut out = OutputStream::create(path)?;

    let mut found = false;
    while let Some(mut message) = reader.next_message()? {
        if message.short_name() == variable && message.level() == level {
            found = true;
            info!(
                variable = %message.short_name(),
                level = message.level(),
                data_time = message.data_time(),
                zmul,
                zadd,
                "perturbing message"
            );

            let mut values = message.values()?;
            apply_affine_all(&mut values, zmul, zadd);
            message.set_values(&values)?;
        }

        out.write_message(&message)?;
    }

    if !found {
        return Err(selection_not_found(variable, level));
    }

    out.finish()
}

#[derive(Serialize)]
struct RegionParams<'a> {
    grib_file: String,
    variable: &'a str,
    level: u32,
    zmul: f64,
    zadd: f64,
    lat_min: f64,
    lat_max: f64,
    lon_min: f64,
    lon_max: f64,
    thresx: f64,
    thresn: f64,
    thresfix: f64,
}

/// Affine-transform the grid points inside a rectangle. With the default
/// global bounds this touches every point. Temperature-like variables are
/// clamped over the whole array afterwards.
pub fn perturb_region(
    input: &Path,
    config: &PerturbationConfig,
    variable: &str,
    level: u32,
    zmul: f64,
    zadd: f64,
    bounds: LatLonBox,
    clamp: ClampSpec,
    output: Option<&Path>,
) -> Result<PathBuf> {
    reject_identity(zmul, zadd)?;
    Selection::Rectangle(bounds).check_in_range()?;

    if bounds.is_global() {
        info!(variable, "will perturb variable on all the coordinates");
    }

    let mut reader = open_validated(input)?;

    let uid = short_uid();
    provenance::write_sidecar(
        input,
        "regional",
        &uid,
        &RegionParams {
            grib_file: input.display().to_string(),
            variable,
            level,
            zmul,
            zadd,
            lat_min: bounds.lat_s,
            lat_max: bounds.lat_n,
            lon_min: bounds.lon_w,
            lon_max: bounds.lon_e,
            thresx: clamp.high,
            thresn: clamp.low,
            thresfix: clamp.fix,
        },
    )?;

    let path = prepare_output(input, config, "regional", &uid, output)?;
    let mut out = OutputStream::create(path)?;

    let mut found = false;
    while let Some(mut message) = reader.next_message()? {
        if message.short_name() == variable && message.level() == level {
            found = true;

            let field = message.data()?;
            let mut values = field.values;
            let mask = rectangle_mask(&field.latitudes, &field.longitudes, &bounds);

            info!(
                variable = %message.short_name(),
                level = message.level(),
                data_time = message.data_time(),
                selected = mask.iter().filter(|&&m| m).count(),
                "perturbing region"
            );

            apply_affine(&mut values, &mask, zmul, zadd);
            clamp_temperature(&mut values, variable, &clamp);
            message.set_values(&values)?;
        }

        out.write_message(&message)?;
    }

    if !found {
        return Err(selection_not_found(variable, level));
    }

    out.finish()
}

#[derive(Serialize)]
struct PointParams<'a> {
    lat: f64,
    lon: f64,
    variable: &'a str,
    level: u32,
    zadd: f64,
    zmul: f64,
}

/// Affine-transform one grid point, selected by snapping the requested
/// coordinates onto each matching message's grid.
///
/// The snap can overshoot onto a coordinate that does not exist in the
/// grid, in which case the mask is empty and the message passes through
/// unchanged; the operation still succeeds when the variable exists.
pub fn perturb_point(
    input: &Path,
    config: &PerturbationConfig,
    variable: &str,
    level: u32,
    lat: f64,
    lon: f64,
    zmul: f64,
    zadd: f64,
    output: Option<&Path>,
) -> Result<PathBuf> {
    reject_identity(zmul, zadd)?;
    Selection::Point { lat, lon }.check_in_range()?;

    let mut reader = open_validated(input)?;
    let clamp = ClampSpec::default();

    let uid = short_uid();
    provenance::write_sidecar(
        input,
        "location",
        &uid,
        &PointParams {
            lat,
            lon,
            variable,
            level,
            zadd,
            zmul,
        },
    )?;

    let path = prepare_output(input, config, "location", &uid, output)?;
    let mut out = OutputStream::create(path)?;

    let mut found = false;
    while let Some(mut message) = reader.next_message()? {
        if message.short_name() == variable && message.level() == level {
            found = true;

            let field = message.data()?;
            let mut values = field.values;
            let mask = point_mask(&field.latitudes, &field.longitudes, lat, lon);

            info!(
                variable = %message.short_name(),
                level = message.level(),
                data_time = message.data_time(),
                hit = mask.iter().any(|&m| m),
                "perturbing location"
            );

            apply_affine(&mut values, &mask, zmul, zadd);
            clamp_temperature(&mut values, variable, &clamp);
            message.set_values(&values)?;
        }

        out.write_message(&message)?;
    }

    if !found {
        return Err(selection_not_found(variable, level));
    }

    out.finish()
}

#[derive(Serialize)]
struct PolygonParams<'a> {
    input_grib: String,
    variable: &'a str,
    level: u32,
    polygons: &'a [PolygonFactor],
    thresx: f64,
    thresn: f64,
    thresfix: f64,
}

/// Apply a list of rectangles sequentially, each with its own affine
/// factors. Overlapping rectangles compound in caller order; the
/// temperature clamp runs once per matching message, after all
/// rectangles, over the entire array.
pub fn perturb_polygons(
    input: &Path,
    config: &PerturbationConfig,
    variable: &str,
    level: u32,
    polygons: &[PolygonFactor],
    clamp: ClampSpec,
    output: Option<&Path>,
) -> Result<PathBuf> {
    if polygons.iter().all(|p| is_identity(p.zmul, p.zadd)) {
        warn!("every polygon is an identity transform, grib file will not be perturbed");
        return Err(PerturbationError::NoOpRequested);
    }

    let mut reader = open_validated(input)?;

    let uid = short_uid();
    provenance::write_sidecar(
        input,
        "polygons",
        &uid,
        &PolygonParams {
            input_grib: input.display().to_string(),
            variable,
            level,
            polygons,
            thresx: clamp.high,
            thresn: clamp.low,
            thresfix: clamp.fix,
        },
    )?;

    let path = prepare_output(input, config, "polygons", &uid, output)?;
    let mut out = OutputStream::create(path)?;

    let mut found = false;
    while let Some(mut message) = reader.next_message()? {
        if message.short_name() == variable && message.level() == level {
            found = true;
            info!(
                variable = %message.short_name(),
                level = message.level(),
                data_time = message.data_time(),
                polygons = polygons.len(),
                "perturbing by polygons"
            );

            let field = message.data()?;
            let mut values = field.values;

            // Masks are recomputed per rectangle and applied to the
            // evolving array: overlaps compound in list order.
            for polygon in polygons {
                let mask = rectangle_mask(&field.latitudes, &field.longitudes, &polygon.bounds);
                apply_affine(&mut values, &mask, polygon.zmul, polygon.zadd);
            }

            clamp_temperature(&mut values, variable, &clamp);
            message.set_values(&values)?;
        }

        out.write_message(&message)?;
    }

    if !found {
        return Err(selection_not_found(variable, level));
    }

    out.finish()
}
