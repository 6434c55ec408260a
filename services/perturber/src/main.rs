//! AIFS GRIB perturbation CLI.
//!
//! Validates AIFS GRIB files against the expected variable/level
//! coverage and applies the perturbation operations: explicit factor,
//! bulk factor table, affine variable/region/location transforms,
//! sequential polygon lists and 0/1800 time-slot swaps. Arguments can
//! come from the command line, a key=value config file, or both (the
//! command line wins).

mod config;

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use perturbation::ops;
use perturbation::select::{LatLonBox, PolygonFactor};
use perturbation::transform::ClampSpec;
use perturbation::validate::validate;
use perturbation::{testdata, CoverageTable, FactorTable, PerturbationConfig, PhaseShift};

use config::{parse_list, FileConfig};

#[derive(Parser, Debug)]
#[command(name = "perturber")]
#[command(version)]
#[command(about = "Perturb AIFS GRIB files from command-line arguments or config files")]
struct Cli {
    /// Log level
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a GRIB file against the expected AIFS coverage
    Validate {
        /// Path to the config file (key=value format)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Path to the GRIB file
        #[arg(long)]
        grib_file: Option<PathBuf>,
    },

    /// Perturb one variable and level by a multiplication factor
    Factor {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        grib_file: Option<PathBuf>,

        /// Variable to perturb
        #[arg(long)]
        variable: Option<String>,

        /// Level of the variable
        #[arg(long)]
        level: Option<u32>,

        /// Perturbation factor
        #[arg(long)]
        factor: Option<f64>,

        /// Path to the output GRIB file
        #[arg(long)]
        output_grib_file: Option<PathBuf>,
    },

    /// Perturb several variables and levels from a JSON factor table
    FactorList {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        grib_file: Option<PathBuf>,

        /// Factor table as JSON: {"variable": {"level": factor}}
        #[arg(long)]
        perturbation_json: Option<String>,

        #[arg(long)]
        output_grib_file: Option<PathBuf>,
    },

    /// Perturb one variable and level with multiplication and addition
    Variable {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        grib_file: Option<PathBuf>,

        #[arg(long)]
        variable: Option<String>,

        #[arg(long)]
        level: Option<u32>,

        /// Multiplication factor
        #[arg(long)]
        zmul: Option<f64>,

        /// Addition term
        #[arg(long)]
        zadd: Option<f64>,

        #[arg(long)]
        output_grib_file: Option<PathBuf>,
    },

    /// Perturb one variable and level inside a lat/lon rectangle
    Region {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        grib_file: Option<PathBuf>,

        #[arg(long)]
        variable: Option<String>,

        #[arg(long)]
        level: Option<u32>,

        /// Minimum (southern) latitude
        #[arg(long)]
        lat_min: Option<f64>,

        /// Maximum (northern) latitude
        #[arg(long)]
        lat_max: Option<f64>,

        /// Minimum (western) longitude
        #[arg(long)]
        lon_min: Option<f64>,

        /// Maximum (eastern) longitude
        #[arg(long)]
        lon_max: Option<f64>,

        #[arg(long)]
        zmul: Option<f64>,

        #[arg(long)]
        zadd: Option<f64>,

        #[arg(long)]
        output_grib_file: Option<PathBuf>,
    },

    /// Perturb one variable and level at a single grid location
    Location {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        grib_file: Option<PathBuf>,

        #[arg(long)]
        variable: Option<String>,

        #[arg(long)]
        level: Option<u32>,

        /// Latitude of the location
        #[arg(long)]
        lat: Option<f64>,

        /// Longitude of the location
        #[arg(long)]
        lon: Option<f64>,

        #[arg(long)]
        zmul: Option<f64>,

        #[arg(long)]
        zadd: Option<f64>,

        #[arg(long)]
        output_grib_file: Option<PathBuf>,
    },

    /// Perturb one variable and level within a list of rectangles
    Polygons {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        grib_file: Option<PathBuf>,

        #[arg(long)]
        variable: Option<String>,

        #[arg(long)]
        level: Option<u32>,

        /// Western longitudes, comma-separated, one per rectangle
        #[arg(long)]
        lonw: Option<String>,

        /// Eastern longitudes, comma-separated
        #[arg(long)]
        lone: Option<String>,

        /// Southern latitudes, comma-separated
        #[arg(long)]
        lats: Option<String>,

        /// Northern latitudes, comma-separated
        #[arg(long)]
        latn: Option<String>,

        /// Multiplication factors, comma-separated
        #[arg(long)]
        zmul: Option<String>,

        /// Addition terms, comma-separated
        #[arg(long)]
        zadd: Option<String>,

        #[arg(long)]
        output_grib_file: Option<PathBuf>,
    },

    /// Swap values between the 0 and 1800 data times
    Phase {
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long)]
        grib_file: Option<PathBuf>,

        /// Phase shift method (future, past, both)
        #[arg(long)]
        phase_shift: Option<PhaseShift>,

        #[arg(long)]
        output_grib_file: Option<PathBuf>,
    },

    /// Write a synthetic GRIB file with complete AIFS coverage
    Sample {
        /// Output path for the generated file
        #[arg(long, default_value = "sample_aifs.grib")]
        output: PathBuf,

        /// Data times to include, comma-separated HHMM values
        #[arg(long, default_value = "0,1800")]
        data_times: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let runtime = PerturbationConfig::from_env();

    match cli.command {
        Command::Validate { config, grib_file } => {
            let file = FileConfig::load(config.as_deref())?;
            let input: PathBuf = file.require(grib_file, "grib_file")?;

            let mut reader = grib2_codec::Grib2Reader::from_path(&input)?;
            let report = validate(&mut reader, &CoverageTable::standard())?;
            if !report.is_valid() {
                bail!(
                    "{} failed validation (extra variables: {:?}, extra levels: {:?}, incomplete times: {:?})",
                    input.display(),
                    report.extra_variables,
                    report.extra_levels,
                    report.incomplete_times
                );
            }
            info!(input = %input.display(), "grib file is valid");
        }

        Command::Factor {
            config,
            grib_file,
            variable,
            level,
            factor,
            output_grib_file,
        } => {
            let file = FileConfig::load(config.as_deref())?;
            let output = ops::perturb_by_factor(
                &file.require::<PathBuf>(grib_file, "grib_file")?,
                &runtime,
                &file.require::<String>(variable, "variable")?,
                file.or_default(level, "level", 0)?,
                file.require(factor, "factor")?,
                file.optional(output_grib_file, "output_grib_file")?.as_deref(),
            )?;
            info!(output = %output.display(), "done");
        }

        Command::FactorList {
            config,
            grib_file,
            perturbation_json,
            output_grib_file,
        } => {
            let file = FileConfig::load(config.as_deref())?;
            let json: String = file.require(perturbation_json, "perturbation_json")?;
            let table = FactorTable::from_json(&json)?;

            let output = ops::perturb_by_factor_table(
                &file.require::<PathBuf>(grib_file, "grib_file")?,
                &runtime,
                &table,
                file.optional(output_grib_file, "output_grib_file")?.as_deref(),
            )?;
            info!(output = %output.display(), "done");
        }

        Command::Variable {
            config,
            grib_file,
            variable,
            level,
            zmul,
            zadd,
            output_grib_file,
        } => {
            let file = FileConfig::load(config.as_deref())?;
            let output = ops::perturb_variable(
                &file.require::<PathBuf>(grib_file, "grib_file")?,
                &runtime,
                &file.require::<String>(variable, "variable")?,
                file.require(level, "level")?,
                file.or_default(zmul, "zmul", 1.0)?,
                file.or_default(zadd, "zadd", 0.0)?,
                file.optional(output_grib_file, "output_grib_file")?.as_deref(),
            )?;
            info!(output = %output.display(), "done");
        }

        Command::Region {
            config,
            grib_file,
            variable,
            level,
            lat_min,
            lat_max,
            lon_min,
            lon_max,
            zmul,
            zadd,
            output_grib_file,
        } => {
            let file = FileConfig::load(config.as_deref())?;
            let global = LatLonBox::global();
            let bounds = LatLonBox::new(
                file.or_default(lat_min, "lat_min", global.lat_s)?,
                file.or_default(lat_max, "lat_max", global.lat_n)?,
                file.or_default(lon_min, "lon_min", global.lon_w)?,
                file.or_default(lon_max, "lon_max", global.lon_e)?,
            );

            let output = ops::perturb_region(
                &file.require::<PathBuf>(grib_file, "grib_file")?,
                &runtime,
                &file.require::<String>(variable, "variable")?,
                file.require(level, "level")?,
                file.or_default(zmul, "zmul", 1.0)?,
                file.or_default(zadd, "zadd", 0.0)?,
                bounds,
                ClampSpec::default(),
                file.optional(output_grib_file, "output_grib_file")?.as_deref(),
            )?;
            info!(output = %output.display(), "done");
        }

        Command::Location {
            config,
            grib_file,
            variable,
            level,
            lat,
            lon,
            zmul,
            zadd,
            output_grib_file,
        } => {
            let file = FileConfig::load(config.as_deref())?;
            let output = ops::perturb_point(
                &file.require::<PathBuf>(grib_file, "grib_file")?,
                &runtime,
                &file.require::<String>(variable, "variable")?,
                file.require(level, "level")?,
                file.require(lat, "lat")?,
                file.require(lon, "lon")?,
                file.or_default(zmul, "zmul", 1.0)?,
                file.or_default(zadd, "zadd", 0.0)?,
                file.optional(output_grib_file, "output_grib_file")?.as_deref(),
            )?;
            info!(output = %output.display(), "done");
        }

        Command::Polygons {
            config,
            grib_file,
            variable,
            level,
            lonw,
            lone,
            lats,
            latn,
            zmul,
            zadd,
            output_grib_file,
        } => {
            let file = FileConfig::load(config.as_deref())?;
            let polygons = build_polygons(
                &parse_list(&file.require::<String>(lats, "lats")?)?,
                &parse_list(&file.require::<String>(latn, "latn")?)?,
                &parse_list(&file.require::<String>(lonw, "lonw")?)?,
                &parse_list(&file.require::<String>(lone, "lone")?)?,
                &parse_list(&file.require::<String>(zmul, "zmul")?)?,
                &parse_list(&file.require::<String>(zadd, "zadd")?)?,
            )?;

            let output = ops::perturb_polygons(
                &file.require::<PathBuf>(grib_file, "grib_file")?,
                &runtime,
                &file.require::<String>(variable, "variable")?,
                file.require(level, "level")?,
                &polygons,
                ClampSpec::default(),
                file.optional(output_grib_file, "output_grib_file")?.as_deref(),
            )?;
            info!(output = %output.display(), "done");
        }

        Command::Phase {
            config,
            grib_file,
            phase_shift,
            output_grib_file,
        } => {
            let file = FileConfig::load(config.as_deref())?;
            let shift = match phase_shift {
                Some(shift) => shift,
                None => file
                    .optional::<String>(None, "phase_shift")?
                    .map(|s| s.parse().map_err(anyhow::Error::msg))
                    .transpose()?
                    .unwrap_or(PhaseShift::Both),
            };

            let output = ops::shift_phase(
                &file.require::<PathBuf>(grib_file, "grib_file")?,
                &runtime,
                shift,
                file.optional(output_grib_file, "output_grib_file")?.as_deref(),
            )?;
            info!(output = %output.display(), "done");
        }

        Command::Sample { output, data_times } => {
            let times: Vec<u32> = data_times
                .split(',')
                .map(|t| t.trim().parse::<u32>())
                .collect::<std::result::Result<_, _>>()?;

            fs::write(&output, testdata::complete_file(&times))?;
            info!(output = %output.display(), times = times.len(), "wrote sample grib file");
        }
    }

    Ok(())
}

/// Zip the six parallel polygon lists into rectangles, rejecting ragged
/// input.
fn build_polygons(
    lats: &[f64],
    latn: &[f64],
    lonw: &[f64],
    lone: &[f64],
    zmul: &[f64],
    zadd: &[f64],
) -> Result<Vec<PolygonFactor>> {
    let n = lats.len();
    if [latn.len(), lonw.len(), lone.len(), zmul.len(), zadd.len()]
        .iter()
        .any(|&len| len != n)
    {
        bail!("polygon lists must all have the same length");
    }

    Ok((0..n)
        .map(|i| PolygonFactor {
            bounds: LatLonBox::new(lats[i], latn[i], lonw[i], lone[i]),
            zmul: zmul[i],
            zadd: zadd[i],
        })
        .collect())
}

fn init_tracing(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
