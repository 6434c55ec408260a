//! Provenance sidecars: one JSON file per derived output recording the
//! exact parameters that produced it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::Result;

/// A short run identifier: the last 8 hex digits of a v4 UUID. Enough to
/// keep repeated runs over the same input from colliding.
pub fn short_uid() -> String {
    let uuid = Uuid::new_v4().simple().to_string();
    uuid[uuid.len() - 8..].to_string()
}

/// Output file name for a derived GRIB: `{stem}_{tag}_{uid}{ext}`,
/// placed in the given output directory.
pub fn derived_path(input: &Path, output_dir: &Path, tag: &str, uid: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let extension = input
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    output_dir.join(format!("{stem}_{tag}_{uid}{extension}"))
}

/// Sidecar file name: `{stem}_{tag}_{uid}_cfg.json`, next to the input
/// file so the provenance travels with the source data.
pub fn sidecar_path(input: &Path, tag: &str, uid: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let directory = input.parent().unwrap_or_else(|| Path::new("."));

    directory.join(format!("{stem}_{tag}_{uid}_cfg.json"))
}

/// Serialize the operation parameters as pretty JSON next to the input.
pub fn write_sidecar<T: Serialize>(input: &Path, tag: &str, uid: &str, params: &T) -> Result<PathBuf> {
    let path = sidecar_path(input, tag, uid);
    let json = serde_json::to_string_pretty(params)?;
    fs::write(&path, json)?;

    debug!(path = %path.display(), "wrote provenance sidecar");
    Ok(path)
}
