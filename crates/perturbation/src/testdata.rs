//! Deterministic GRIB2 fixtures with full AIFS coverage.
//!
//! Used by the unit and integration tests in this crate. Compiled into
//! the library so both kinds of tests share one set of builders.

use grib2_codec::MessageBuilder;

use crate::coverage::{PRESSURE_LEVELS, SURFACE_VARIABLES, UPPER_VARIABLES};

/// Base value for a variable/level pair. Temperature-like variables sit
/// near 280 K so fixtures stay clear of the clamp band unless a test
/// pushes them into it on purpose.
fn base_value(variable: &str, level: u32) -> f64 {
    match variable {
        "t" | "2t" | "skt" | "2d" => 280.0 + level as f64 / 100.0,
        "msl" | "sp" => 100_000.0 + level as f64,
        _ => 10.0 + level as f64 / 10.0,
    }
}

fn message(variable: &str, level: u32, data_time: u32) -> Vec<u8> {
    // Values depend on the data time so slot swaps are observable.
    let base = base_value(variable, level) + data_time as f64 / 1000.0;
    MessageBuilder::new(variable, level)
        .data_time(data_time)
        .gradient(base, base + 5.0)
        .build()
        .expect("fixture variables are always in the AIFS table")
}

/// A file carrying the complete AIFS coverage at each given data time:
/// 11 surface variables at the sentinel level, 6 upper-air variables at
/// all 13 pressure levels, and geopotential additionally at the surface.
pub fn complete_file(data_times: &[u32]) -> Vec<u8> {
    complete_file_filtered(data_times, |_, _| true)
}

/// Like [`complete_file`] but with one (variable, level) pair left out,
/// producing a file that fails coverage validation.
pub fn complete_file_without(data_times: &[u32], variable: &str, level: u32) -> Vec<u8> {
    complete_file_filtered(data_times, |v, l| !(v == variable && l == level))
}

/// Like [`complete_file`] but with explicit values for one
/// (variable, level) pair, used to place specific numbers under a test.
pub fn complete_file_with(
    data_times: &[u32],
    variable: &str,
    level: u32,
    values: &[f64],
) -> Vec<u8> {
    let mut file = complete_file_filtered(data_times, |v, l| !(v == variable && l == level));
    for &data_time in data_times {
        file.extend(
            MessageBuilder::new(variable, level)
                .data_time(data_time)
                .values(values.to_vec())
                .build()
                .expect("fixture variables are always in the AIFS table"),
        );
    }
    file
}

fn complete_file_filtered(data_times: &[u32], keep: impl Fn(&str, u32) -> bool) -> Vec<u8> {
    let mut file = Vec::new();

    for &data_time in data_times {
        for variable in SURFACE_VARIABLES {
            if keep(variable, 0) {
                file.extend(message(variable, 0, data_time));
            }
        }
        if keep("z", 0) {
            file.extend(message("z", 0, data_time));
        }
        for variable in UPPER_VARIABLES {
            for &level in &PRESSURE_LEVELS {
                if keep(variable, level) {
                    file.extend(message(variable, level, data_time));
                }
            }
        }
    }

    file
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use grib2_codec::{Grib2Reader, MessageSource};

    // 11 surface + z@0 + 6 upper * 13 levels
    const MESSAGES_PER_TIME: usize = 11 + 1 + 6 * 13;

    #[test]
    fn complete_file_has_expected_message_count() {
        let mut reader = Grib2Reader::new(Bytes::from(complete_file(&[0, 1800])));

        let mut count = 0;
        while reader.next_message().unwrap().is_some() {
            count += 1;
        }
        assert_eq!(count, 2 * MESSAGES_PER_TIME);
    }

    #[test]
    fn without_drops_exactly_one_message() {
        let mut reader =
            Grib2Reader::new(Bytes::from(complete_file_without(&[0], "t", 500)));

        let mut count = 0;
        let mut saw_t500 = false;
        while let Some(message) = reader.next_message().unwrap() {
            count += 1;
            if message.short_name() == "t" && message.level() == 500 {
                saw_t500 = true;
            }
        }
        assert_eq!(count, MESSAGES_PER_TIME - 1);
        assert!(!saw_t500);
    }
}
