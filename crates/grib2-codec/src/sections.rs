//! GRIB2 section parsing.
//!
//! Each GRIB2 message consists of numbered sections carrying metadata,
//! grid geometry, packing parameters and the packed data itself. The
//! functions here parse the sections this codec understands and locate
//! section offsets for in-place rewrites.

use crate::Grib2Error;
use chrono::{DateTime, NaiveDate, Utc};

/// Section 0: Indicator Section (16 bytes)
#[derive(Debug, Clone)]
pub struct Indicator {
    pub magic: [u8; 4],
    pub reserved: u16,
    pub edition: u8,
    pub discipline: u8,
    pub message_length: u64,
}

/// Section 1: Identification Section
#[derive(Debug, Clone)]
pub struct Identification {
    pub center: u16,
    pub sub_center: u16,
    pub table_version: u8,
    pub local_table_version: u8,
    pub significance_of_reference_time: u8,
    pub reference_time: DateTime<Utc>,
    pub production_status: u8,
    pub data_type: u8,
}

/// Section 3: Grid Definition Section (template 3.0, regular lat/lon).
///
/// Coordinates are kept in microdegrees exactly as encoded so that the
/// per-point coordinate arrays derived from them are reproducible.
#[derive(Debug, Clone)]
pub struct GridDefinition {
    pub grid_shape: u8,
    pub num_points_longitude: u32,
    pub num_points_latitude: u32,
    pub first_latitude_microdegrees: i64,
    pub first_longitude_microdegrees: i64,
    pub last_latitude_microdegrees: i64,
    pub last_longitude_microdegrees: i64,
    pub longitude_increment_microdegrees: u32,
    pub latitude_increment_microdegrees: u32,
    pub scanning_mode: u8,
}

impl GridDefinition {
    /// Total number of grid points.
    pub fn num_points(&self) -> usize {
        self.num_points_longitude as usize * self.num_points_latitude as usize
    }
}

/// Section 4: Product Definition Section (template 4.0)
#[derive(Debug, Clone)]
pub struct ProductDefinition {
    pub parameter_category: u8,
    pub parameter_number: u8,
    pub parameter_short_name: String,
    pub level_type: u8,
    pub level_value: u32,
    pub forecast_hour: u32,
}

/// Section 5: Data Representation Section (template 5.0, simple packing)
#[derive(Debug, Clone)]
pub struct DataRepresentation {
    pub num_data_points: u32,
    pub template_number: u16,
    pub reference_value: f32,
    pub binary_scale_factor: i16,
    pub decimal_scale_factor: i16,
    pub bits_per_value: u8,
    pub original_data_type: u8,
}

// ===== Parsing Functions =====

/// Parse Section 0 (Indicator) from the start of a message.
pub fn parse_indicator(data: &[u8]) -> Result<Indicator, Grib2Error> {
    if data.len() < 16 {
        return Err(Grib2Error::InvalidFormat(
            "not enough data for indicator section".to_string(),
        ));
    }

    if &data[0..4] != b"GRIB" {
        return Err(Grib2Error::InvalidFormat(
            "invalid GRIB magic bytes".to_string(),
        ));
    }

    // Section 0 layout:
    // Octets 1-4: "GRIB"
    // Octets 5-6: Reserved
    // Octet 7: Discipline
    // Octet 8: Edition number
    // Octets 9-16: Total message length (8-byte big-endian)
    let discipline = data[6];
    let edition = data[7];
    let message_length = u64::from_be_bytes([
        data[8], data[9], data[10], data[11], data[12], data[13], data[14], data[15],
    ]);

    if edition != 2 {
        return Err(Grib2Error::InvalidFormat(format!(
            "expected GRIB edition 2, got {}",
            edition
        )));
    }

    Ok(Indicator {
        magic: [data[0], data[1], data[2], data[3]],
        reserved: u16::from_be_bytes([data[4], data[5]]),
        discipline,
        edition,
        message_length,
    })
}

/// Parse Section 1 (Identification), located at offset 16 in the message.
pub fn parse_identification(data: &[u8]) -> Result<Identification, Grib2Error> {
    const OFFSET: usize = 16;

    if data.len() < OFFSET + 21 {
        return Err(Grib2Error::InvalidSection {
            section: 1,
            reason: "not enough data".to_string(),
        });
    }

    // Skip section length (4 bytes) and section number (1 byte)
    let sec_data = &data[OFFSET + 5..];

    let center = u16::from_be_bytes([sec_data[0], sec_data[1]]);
    let sub_center = u16::from_be_bytes([sec_data[2], sec_data[3]]);
    let table_version = sec_data[4];
    let local_table_version = sec_data[5];
    let significance_of_reference_time = sec_data[6];

    let year = u16::from_be_bytes([sec_data[7], sec_data[8]]);
    let month = sec_data[9];
    let day = sec_data[10];
    let hour = sec_data[11];
    let minute = sec_data[12];
    let second = sec_data[13];

    let reference_time = NaiveDate::from_ymd_opt(year as i32, month as u32, day as u32)
        .and_then(|date| date.and_hms_opt(hour as u32, minute as u32, second as u32))
        .ok_or_else(|| Grib2Error::InvalidSection {
            section: 1,
            reason: format!(
                "invalid date: {}-{:02}-{:02} {:02}:{:02}:{:02}",
                year, month, day, hour, minute, second
            ),
        })?;

    let reference_time = DateTime::<Utc>::from_naive_utc_and_offset(reference_time, Utc);

    let production_status = sec_data.get(14).copied().unwrap_or(0);
    let data_type = sec_data.get(15).copied().unwrap_or(0);

    Ok(Identification {
        center,
        sub_center,
        table_version,
        local_table_version,
        significance_of_reference_time,
        reference_time,
        production_status,
        data_type,
    })
}

/// Parse Section 3 (Grid Definition).
pub fn parse_grid_definition(data: &[u8]) -> Result<GridDefinition, Grib2Error> {
    let section_offset = find_section(data, 3)?;
    let section_data = &data[section_offset..];

    if section_data.len() < 72 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: "not enough data".to_string(),
        });
    }

    let grid_template = u16::from_be_bytes([section_data[12], section_data[13]]);

    if grid_template != 0 {
        return Err(Grib2Error::Unsupported(format!(
            "grid definition template {} (only 3.0 lat/lon is supported)",
            grid_template
        )));
    }

    // Template 3.0 data starts at byte 14 of the section:
    // Byte 0: Shape of the Earth
    // Bytes 16-19: Ni - points along a parallel
    // Bytes 20-23: Nj - points along a meridian
    // Bytes 32-35: La1 - first latitude (sign-magnitude, microdegrees)
    // Bytes 36-39: Lo1 - first longitude
    // Bytes 41-44: La2 - last latitude
    // Bytes 45-48: Lo2 - last longitude
    // Bytes 49-52: Di - i increment
    // Bytes 53-56: Dj - j increment
    // Byte 57: Scanning mode
    let gd = &section_data[14..];

    if gd.len() < 58 {
        return Err(Grib2Error::InvalidSection {
            section: 3,
            reason: format!("template 3.0 needs at least 58 bytes, got {}", gd.len()),
        });
    }

    Ok(GridDefinition {
        grid_shape: gd[0],
        num_points_longitude: u32::from_be_bytes([gd[16], gd[17], gd[18], gd[19]]),
        num_points_latitude: u32::from_be_bytes([gd[20], gd[21], gd[22], gd[23]]),
        first_latitude_microdegrees: decode_grib2_signed(&[gd[32], gd[33], gd[34], gd[35]]) as i64,
        first_longitude_microdegrees: decode_grib2_signed(&[gd[36], gd[37], gd[38], gd[39]]) as i64,
        last_latitude_microdegrees: decode_grib2_signed(&[gd[41], gd[42], gd[43], gd[44]]) as i64,
        last_longitude_microdegrees: decode_grib2_signed(&[gd[45], gd[46], gd[47], gd[48]]) as i64,
        longitude_increment_microdegrees: u32::from_be_bytes([gd[49], gd[50], gd[51], gd[52]]),
        latitude_increment_microdegrees: u32::from_be_bytes([gd[53], gd[54], gd[55], gd[56]]),
        scanning_mode: gd[57],
    })
}

/// Parse Section 4 (Product Definition).
pub fn parse_product_definition(
    data: &[u8],
    discipline: u8,
) -> Result<ProductDefinition, Grib2Error> {
    let section_offset = find_section(data, 4)?;
    let section_data = &data[section_offset..];

    if section_data.len() < 34 {
        return Err(Grib2Error::InvalidSection {
            section: 4,
            reason: "not enough data".to_string(),
        });
    }

    // Template 4.0:
    // Byte 9: Parameter category
    // Byte 10: Parameter number
    // Bytes 18-21: Forecast time
    // Byte 22: Type of first fixed surface
    // Byte 23: Scale factor of first fixed surface
    // Bytes 24-27: Scaled value of first fixed surface
    let parameter_category = section_data[9];
    let parameter_number = section_data[10];

    let forecast_hour = u32::from_be_bytes([
        section_data[18],
        section_data[19],
        section_data[20],
        section_data[21],
    ]);

    let level_type = section_data[22];
    let level_value = u32::from_be_bytes([
        section_data[24],
        section_data[25],
        section_data[26],
        section_data[27],
    ]);

    let parameter_short_name =
        crate::tables::short_name(discipline, parameter_category, parameter_number, level_type);

    Ok(ProductDefinition {
        parameter_category,
        parameter_number,
        parameter_short_name,
        level_type,
        level_value,
        forecast_hour,
    })
}

/// Parse Section 5 (Data Representation).
pub fn parse_data_representation(data: &[u8]) -> Result<DataRepresentation, Grib2Error> {
    let section_offset = find_section(data, 5)?;
    let section_data = &data[section_offset..];

    if section_data.len() < 21 {
        return Err(Grib2Error::InvalidSection {
            section: 5,
            reason: "not enough data".to_string(),
        });
    }

    // Octets 6-9: Number of data points
    // Octets 10-11: Template number
    // Template 5.0:
    //   Octets 12-15: Reference value (IEEE 32-bit float)
    //   Octets 16-17: Binary scale factor E (signed)
    //   Octets 18-19: Decimal scale factor D (signed)
    //   Octet 20: Bits per packed value
    //   Octet 21: Type of original field values
    let num_data_points = u32::from_be_bytes([
        section_data[5],
        section_data[6],
        section_data[7],
        section_data[8],
    ]);
    let template_number = u16::from_be_bytes([section_data[9], section_data[10]]);

    if template_number != 0 {
        return Err(Grib2Error::Unsupported(format!(
            "data representation template {} (only 5.0 simple packing is supported)",
            template_number
        )));
    }

    let td = &section_data[11..];
    let reference_value = f32::from_be_bytes([td[0], td[1], td[2], td[3]]);
    let binary_scale_factor = decode_grib2_signed16(&[td[4], td[5]]);
    let decimal_scale_factor = decode_grib2_signed16(&[td[6], td[7]]);
    let bits_per_value = td[8];
    let original_data_type = td[9];

    Ok(DataRepresentation {
        num_data_points,
        template_number,
        reference_value,
        binary_scale_factor,
        decimal_scale_factor,
        bits_per_value,
        original_data_type,
    })
}

/// Parse Section 6 (Bitmap). Returns `None` when indicator 255 declares
/// that no bitmap applies to this message.
pub fn parse_bitmap(data: &[u8]) -> Result<Option<Vec<u8>>, Grib2Error> {
    let section_offset = find_section(data, 6)?;
    let section_data = &data[section_offset..];

    if section_data.len() < 6 {
        return Err(Grib2Error::InvalidSection {
            section: 6,
            reason: "not enough data".to_string(),
        });
    }

    let section_length = u32::from_be_bytes([
        section_data[0],
        section_data[1],
        section_data[2],
        section_data[3],
    ]) as usize;
    let indicator = section_data[5];

    match indicator {
        255 => Ok(None),
        0 => Ok(Some(section_data[6..section_length].to_vec())),
        other => Err(Grib2Error::Unsupported(format!(
            "bitmap indicator {} (predefined bitmaps are not supported)",
            other
        ))),
    }
}

/// Find a section by number within a message, returning its byte offset.
pub fn find_section(data: &[u8], section_num: u8) -> Result<usize, Grib2Error> {
    let mut offset = 16; // After Section 0

    loop {
        if offset + 5 > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "section not found".to_string(),
            });
        }

        // Section 8 is the bare "7777" end marker.
        if &data[offset..offset + 4] == b"7777" {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "reached end of message without finding section".to_string(),
            });
        }

        let section_length = u32::from_be_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ]) as usize;

        if section_length < 5 || offset + section_length > data.len() {
            return Err(Grib2Error::InvalidSection {
                section: section_num,
                reason: "invalid section length".to_string(),
            });
        }

        if data[offset + 4] == section_num {
            return Ok(offset);
        }

        offset += section_length;
    }
}

// ===== Sign-magnitude integer codec =====

/// Decode a GRIB2 sign-magnitude 32-bit integer (MSB is the sign bit).
pub fn decode_grib2_signed(bytes: &[u8; 4]) -> i32 {
    let raw = u32::from_be_bytes(*bytes);
    let magnitude = (raw & 0x7FFF_FFFF) as i32;
    if raw & 0x8000_0000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Encode a GRIB2 sign-magnitude 32-bit integer.
pub fn encode_grib2_signed(value: i32) -> [u8; 4] {
    let magnitude = value.unsigned_abs() & 0x7FFF_FFFF;
    let raw = if value < 0 {
        magnitude | 0x8000_0000
    } else {
        magnitude
    };
    raw.to_be_bytes()
}

/// Decode a GRIB2 sign-magnitude 16-bit integer.
pub fn decode_grib2_signed16(bytes: &[u8; 2]) -> i16 {
    let raw = u16::from_be_bytes(*bytes);
    let magnitude = (raw & 0x7FFF) as i16;
    if raw & 0x8000 != 0 {
        -magnitude
    } else {
        magnitude
    }
}

/// Encode a GRIB2 sign-magnitude 16-bit integer.
pub fn encode_grib2_signed16(value: i16) -> [u8; 2] {
    let magnitude = value.unsigned_abs() & 0x7FFF;
    let raw = if value < 0 { magnitude | 0x8000 } else { magnitude };
    raw.to_be_bytes()
}
