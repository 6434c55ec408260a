//! End-to-end tests for the 0/1800 time-slot swap.

mod common;

use std::fs;

use perturbation::ops;
use perturbation::testdata;
use perturbation::{PerturbationError, PhaseShift};

use common::{assert_close, config_in, raw_message_of, values_of, write_complete_file};

#[test]
fn both_exchanges_the_two_slots() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_complete_file(dir.path(), &[0, 1800]);
    let config = config_in(dir.path());

    let slot0_before = values_of(&input, "msl", 0, 0);
    let slot1800_before = values_of(&input, "msl", 0, 1800);
    assert_ne!(slot0_before, slot1800_before);

    let output = ops::shift_phase(&input, &config, PhaseShift::Both, None).unwrap();

    assert_close(&values_of(&output, "msl", 0, 0), &slot1800_before, 1e-2);
    assert_close(&values_of(&output, "msl", 0, 1800), &slot0_before, 1e-2);

    // Output keeps the input's message count and order.
    assert_eq!(common::message_count(&output), common::message_count(&input));
}

#[test]
fn future_pulls_1800_into_slot_zero_only() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_complete_file(dir.path(), &[0, 1800]);
    let config = config_in(dir.path());

    let slot1800_before = values_of(&input, "t", 500, 1800);
    let slot1800_raw = raw_message_of(&input, "t", 500, 1800);

    let output = ops::shift_phase(&input, &config, PhaseShift::Future, None).unwrap();

    assert_close(&values_of(&output, "t", 500, 0), &slot1800_before, 1e-2);
    // Slot-1800 messages pass through byte-for-byte.
    assert_eq!(raw_message_of(&output, "t", 500, 1800), slot1800_raw);
}

#[test]
fn past_pulls_slot_zero_into_1800_only() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_complete_file(dir.path(), &[0, 1800]);
    let config = config_in(dir.path());

    let slot0_before = values_of(&input, "t", 500, 0);
    let slot0_raw = raw_message_of(&input, "t", 500, 0);

    let output = ops::shift_phase(&input, &config, PhaseShift::Past, None).unwrap();

    assert_close(&values_of(&output, "t", 500, 1800), &slot0_before, 1e-2);
    assert_eq!(raw_message_of(&output, "t", 500, 0), slot0_raw);
}

#[test]
fn single_slot_file_passes_through_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_complete_file(dir.path(), &[0]);
    let config = config_in(dir.path());

    // No 1800 slot exists, so nothing can be pulled into slot 0.
    let output = ops::shift_phase(&input, &config, PhaseShift::Both, None).unwrap();
    assert_eq!(fs::read(&output).unwrap(), fs::read(&input).unwrap());
}

#[test]
fn incomplete_file_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("incomplete.grib");
    fs::write(&input, testdata::complete_file_without(&[0, 1800], "msl", 0)).unwrap();
    let config = config_in(dir.path());

    let result = ops::shift_phase(&input, &config, PhaseShift::Both, None);
    assert!(matches!(result, Err(PerturbationError::SchemaViolation)));
}
