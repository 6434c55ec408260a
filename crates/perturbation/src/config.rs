//! Runtime configuration for perturbation runs.

use std::env;
use std::path::PathBuf;

/// Where derived GRIB files land. The provenance sidecar always stays
/// next to the input file so the two travel together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PerturbationConfig {
    /// Directory for perturbed output files. Created on demand.
    pub output_dir: PathBuf,
}

impl Default for PerturbationConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output_grib_files"),
        }
    }
}

impl PerturbationConfig {
    /// Read configuration from the environment, falling back to defaults.
    ///
    /// `PERTURB_OUTPUT_DIR` overrides the output directory.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(dir) = env::var("PERTURB_OUTPUT_DIR") {
            if !dir.is_empty() {
                config.output_dir = PathBuf::from(dir);
            }
        }
        config
    }

    pub fn with_output_dir(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_output_dir() {
        assert_eq!(
            PerturbationConfig::default().output_dir,
            PathBuf::from("output_grib_files")
        );
    }

    #[test]
    fn explicit_output_dir() {
        let config = PerturbationConfig::with_output_dir("/tmp/out");
        assert_eq!(config.output_dir, PathBuf::from("/tmp/out"));
    }
}
