//! Shared fixtures and helpers for the perturbation integration tests.
#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use grib2_codec::{Grib2Reader, MessageSource};
use perturbation::testdata;
use perturbation::PerturbationConfig;

/// Write a complete AIFS fixture into `dir` and return its path.
pub fn write_complete_file(dir: &Path, data_times: &[u32]) -> PathBuf {
    let path = dir.join("aifs_fc.grib");
    fs::write(&path, testdata::complete_file(data_times)).unwrap();
    path
}

/// Write a complete fixture with explicit values for one variable/level.
pub fn write_file_with(
    dir: &Path,
    data_times: &[u32],
    variable: &str,
    level: u32,
    values: &[f64],
) -> PathBuf {
    let path = dir.join("aifs_fc.grib");
    fs::write(
        &path,
        testdata::complete_file_with(data_times, variable, level, values),
    )
    .unwrap();
    path
}

/// A runtime config whose output directory lives under the test tempdir.
pub fn config_in(dir: &Path) -> PerturbationConfig {
    PerturbationConfig::with_output_dir(dir.join("out"))
}

/// Decoded values of the message matching (variable, level, data_time).
pub fn values_of(path: &Path, variable: &str, level: u32, data_time: u32) -> Vec<f64> {
    let mut reader = Grib2Reader::from_path(path).unwrap();
    while let Some(message) = reader.next_message().unwrap() {
        if message.short_name() == variable
            && message.level() == level
            && message.data_time() == data_time
        {
            return message.values().unwrap();
        }
    }
    panic!("{variable}@{level} at time {data_time} not found in {}", path.display());
}

/// Raw bytes of the message matching (variable, level, data_time).
pub fn raw_message_of(path: &Path, variable: &str, level: u32, data_time: u32) -> Vec<u8> {
    let mut reader = Grib2Reader::from_path(path).unwrap();
    while let Some(message) = reader.next_message().unwrap() {
        if message.short_name() == variable
            && message.level() == level
            && message.data_time() == data_time
        {
            return message.to_bytes().to_vec();
        }
    }
    panic!("{variable}@{level} at time {data_time} not found in {}", path.display());
}

/// Number of messages in a file.
pub fn message_count(path: &Path) -> usize {
    let mut reader = Grib2Reader::from_path(path).unwrap();
    let mut count = 0;
    while reader.next_message().unwrap().is_some() {
        count += 1;
    }
    count
}

pub fn assert_close(actual: &[f64], expected: &[f64], tolerance: f64) {
    assert_eq!(actual.len(), expected.len());
    for (i, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert!(
            (a - e).abs() <= tolerance,
            "value {i}: {a} differs from {e} by more than {tolerance}"
        );
    }
}
