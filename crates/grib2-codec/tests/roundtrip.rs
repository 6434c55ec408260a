//! End-to-end codec tests over builder-generated messages.

use bytes::Bytes;
use grib2_codec::{Grib2Reader, GribMessage, MessageBuilder, MessageSource};

fn parse_single(data: Vec<u8>) -> GribMessage {
    let mut reader = Grib2Reader::new(Bytes::from(data));
    let message = reader.next_message().unwrap().expect("one message");
    assert!(reader.next_message().unwrap().is_none());
    message
}

#[test]
fn metadata_round_trip() {
    let message = parse_single(
        MessageBuilder::new("t", 850)
            .data_time(1800)
            .gradient(250.0, 290.0)
            .build()
            .unwrap(),
    );

    assert_eq!(message.short_name(), "t");
    assert_eq!(message.level(), 850);
    assert_eq!(message.data_time(), 1800);
    assert_eq!(message.num_points(), 36);
}

#[test]
fn surface_variable_has_sentinel_level() {
    let message = parse_single(MessageBuilder::new("10u", 0).gradient(-20.0, 20.0).build().unwrap());

    assert_eq!(message.short_name(), "10u");
    assert_eq!(message.level(), 0);
    assert_eq!(message.data_time(), 0);
}

#[test]
fn coordinates_cover_the_grid() {
    let message = parse_single(MessageBuilder::new("msl", 0).gradient(99_000.0, 103_000.0).build().unwrap());

    let lats = message.latitudes();
    let lons = message.longitudes();
    assert_eq!(lats.len(), 36);
    assert_eq!(lons.len(), 36);

    // Default grid: 60N..35N rows, -30E..-5E columns, 5 degree steps
    assert_eq!(lats[0], 60.0);
    assert_eq!(lats[35], 35.0);
    assert_eq!(lons[0], -30.0);
    assert_eq!(lons[5], -5.0);
    // Row-major: the whole first row is at 60N
    assert!(lats[..6].iter().all(|&l| l == 60.0));
}

#[test]
fn values_round_trip_within_packing_precision() {
    let original: Vec<f64> = (0..36).map(|i| 270.0 + i as f64 * 0.5).collect();
    let message = parse_single(MessageBuilder::new("skt", 0).values(original.clone()).build().unwrap());

    let decoded = message.values().unwrap();
    for (o, d) in original.iter().zip(&decoded) {
        assert!((o - d).abs() < 1e-3, "{} vs {}", o, d);
    }
}

#[test]
fn constant_field_uses_zero_bits() {
    let message = parse_single(MessageBuilder::new("lsm", 0).constant(1.0).build().unwrap());

    assert_eq!(message.data_representation.bits_per_value, 0);
    assert!(message.values().unwrap().iter().all(|&v| v == 1.0));
}

#[test]
fn stream_iterates_and_rewinds() {
    let mut file = Vec::new();
    file.extend(MessageBuilder::new("msl", 0).gradient(99_000.0, 103_000.0).build().unwrap());
    file.extend(MessageBuilder::new("t", 500).gradient(240.0, 260.0).build().unwrap());
    file.extend(MessageBuilder::new("u", 300).gradient(-50.0, 50.0).build().unwrap());

    let mut reader = Grib2Reader::new(Bytes::from(file));

    let mut names = Vec::new();
    while let Some(message) = reader.next_message().unwrap() {
        names.push(message.short_name().to_string());
    }
    assert_eq!(names, ["msl", "t", "u"]);

    reader.rewind().unwrap();
    let first = reader.next_message().unwrap().unwrap();
    assert_eq!(first.short_name(), "msl");
}

#[test]
fn set_values_in_range_keeps_untouched_points_bit_identical() {
    let original: Vec<f64> = (0..36).map(|i| i as f64 * 10.0).collect();
    let mut message = parse_single(MessageBuilder::new("z", 500).values(original).build().unwrap());
    let before = message.values().unwrap();
    let length_before = message.to_bytes().len();

    // Move one point to a value inside the original packed range.
    let mut modified = before.clone();
    modified[7] = 123.0;
    message.set_values(&modified).unwrap();

    assert_eq!(message.to_bytes().len(), length_before);

    let reparsed = parse_single(message.to_bytes().to_vec());
    let after = reparsed.values().unwrap();
    for i in 0..36 {
        if i == 7 {
            assert!((after[i] - 123.0).abs() < 1e-2);
        } else {
            assert_eq!(after[i].to_bits(), before[i].to_bits(), "point {}", i);
        }
    }
}

#[test]
fn set_values_out_of_range_repacks_message() {
    let original: Vec<f64> = (0..36).map(|i| 100.0 + i as f64).collect();
    let mut message = parse_single(MessageBuilder::new("q", 700).values(original).build().unwrap());

    // Push one value far above the original packed range.
    let mut modified = message.values().unwrap();
    modified[0] = 100_000.0;
    message.set_values(&modified).unwrap();

    let reparsed = parse_single(message.to_bytes().to_vec());
    let after = reparsed.values().unwrap();
    assert!((after[0] - 100_000.0).abs() < 2.0);
    assert!((after[35] - 135.0).abs() < 2.0);
    assert_eq!(reparsed.short_name(), "q");
    assert_eq!(reparsed.level(), 700);
}

#[test]
fn set_values_on_constant_field_grows_packing() {
    let mut message = parse_single(MessageBuilder::new("lsm", 0).constant(0.0).build().unwrap());

    let mut modified = message.values().unwrap();
    modified[10] = 1.0;
    message.set_values(&modified).unwrap();

    let reparsed = parse_single(message.to_bytes().to_vec());
    let after = reparsed.values().unwrap();
    assert!((after[10] - 1.0).abs() < 1e-3);
    assert!(after[0].abs() < 1e-3);
}

#[test]
fn reader_opens_files_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("single.grib");
    std::fs::write(&path, MessageBuilder::new("2t", 0).constant(288.0).build().unwrap()).unwrap();

    let mut reader = Grib2Reader::from_path(&path).unwrap();
    let message = reader.next_message().unwrap().unwrap();
    assert_eq!(message.short_name(), "2t");
    assert!(reader.next_message().unwrap().is_none());
}

#[test]
fn set_values_rejects_wrong_length() {
    let mut message = parse_single(MessageBuilder::new("msl", 0).gradient(0.0, 1.0).build().unwrap());
    assert!(message.set_values(&[1.0, 2.0]).is_err());
}
