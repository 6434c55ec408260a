//! Decoded GRIB2 messages and the rewindable message stream.

use std::path::Path;

use bytes::{Bytes, BytesMut};
use chrono::Timelike;
use tracing::debug;

use crate::packing;
use crate::sections::{self, DataRepresentation, GridDefinition, Identification, Indicator, ProductDefinition};
use crate::{Grib2Error, Result};

/// A rewindable stream of GRIB2 messages.
///
/// The two-pass operations (time-slot swaps) require resetting the stream
/// to the first message, so `rewind` is part of the contract rather than
/// an optional extension.
pub trait MessageSource {
    /// Decode the next message, or `None` at end of stream.
    fn next_message(&mut self) -> Result<Option<GribMessage>>;

    /// Reset the stream to the first message.
    fn rewind(&mut self) -> Result<()>;
}

/// Reads GRIB2 messages sequentially from an in-memory byte buffer.
pub struct Grib2Reader {
    data: Bytes,
    offset: usize,
}

impl Grib2Reader {
    /// Create a reader over raw GRIB2 bytes.
    pub fn new(data: Bytes) -> Self {
        Self { data, offset: 0 }
    }

    /// Read an entire GRIB2 file into memory and create a reader over it.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path)?;
        Ok(Self::new(Bytes::from(data)))
    }
}

impl MessageSource for Grib2Reader {
    fn next_message(&mut self) -> Result<Option<GribMessage>> {
        // Skip any padding between messages by scanning for the magic.
        while self.offset + 16 <= self.data.len() {
            if &self.data[self.offset..self.offset + 4] == b"GRIB" {
                break;
            }
            self.offset += 1;
        }

        if self.offset + 16 > self.data.len() {
            return Ok(None);
        }

        let indicator = sections::parse_indicator(&self.data[self.offset..])?;
        let length = indicator.message_length as usize;

        if self.offset + length > self.data.len() {
            return Err(Grib2Error::InvalidFormat(format!(
                "message length {} exceeds remaining data {}",
                length,
                self.data.len() - self.offset
            )));
        }

        let raw = self.data.slice(self.offset..self.offset + length);
        self.offset += length;

        let message = GribMessage::parse(raw)?;
        debug!(
            variable = %message.short_name(),
            level = message.level(),
            data_time = message.data_time(),
            "decoded message"
        );

        Ok(Some(message))
    }

    fn rewind(&mut self) -> Result<()> {
        self.offset = 0;
        Ok(())
    }
}

/// The value and coordinate arrays of one message, all of equal length.
#[derive(Debug, Clone)]
pub struct GridField {
    pub values: Vec<f64>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
}

/// One decoded GRIB2 message.
///
/// The raw encoded bytes are retained so that untouched messages can be
/// written back verbatim. [`set_values`](Self::set_values) is the only
/// mutation: it rewrites section 7 (and, when the original packing can
/// no longer represent the new values, sections 5+7) in a copy of the
/// raw bytes and leaves every other section untouched.
#[derive(Debug, Clone)]
pub struct GribMessage {
    raw: Bytes,
    pub indicator: Indicator,
    pub identification: Identification,
    pub grid_definition: GridDefinition,
    pub product_definition: ProductDefinition,
    pub data_representation: DataRepresentation,
    bitmap: Option<Vec<u8>>,
    sec5_offset: usize,
    sec5_length: usize,
    sec7_offset: usize,
    sec7_length: usize,
}

impl GribMessage {
    /// Parse one complete message from its raw bytes.
    pub fn parse(raw: Bytes) -> Result<Self> {
        let indicator = sections::parse_indicator(&raw)?;
        let identification = sections::parse_identification(&raw)?;
        let grid_definition = sections::parse_grid_definition(&raw)?;
        let product_definition = sections::parse_product_definition(&raw, indicator.discipline)?;
        let data_representation = sections::parse_data_representation(&raw)?;
        let bitmap = sections::parse_bitmap(&raw)?;

        let sec5_offset = sections::find_section(&raw, 5)?;
        let sec5_length = u32::from_be_bytes([
            raw[sec5_offset],
            raw[sec5_offset + 1],
            raw[sec5_offset + 2],
            raw[sec5_offset + 3],
        ]) as usize;
        let sec7_offset = sections::find_section(&raw, 7)?;
        let sec7_length = u32::from_be_bytes([
            raw[sec7_offset],
            raw[sec7_offset + 1],
            raw[sec7_offset + 2],
            raw[sec7_offset + 3],
        ]) as usize;

        Ok(Self {
            raw,
            indicator,
            identification,
            grid_definition,
            product_definition,
            data_representation,
            bitmap,
            sec5_offset,
            sec5_length,
            sec7_offset,
            sec7_length,
        })
    }

    /// AIFS short code of this message's variable.
    pub fn short_name(&self) -> &str {
        &self.product_definition.parameter_short_name
    }

    /// Vertical level: hPa on isobaric surfaces, `0` for everything else
    /// (the sentinel level used for surface variables).
    pub fn level(&self) -> u32 {
        if self.product_definition.level_type == 100 {
            self.product_definition.level_value / 100
        } else {
            0
        }
    }

    /// Data time of the message as HHMM (e.g. `0` and `1800`).
    pub fn data_time(&self) -> u32 {
        let t = self.identification.reference_time;
        t.hour() * 100 + t.minute()
    }

    /// Number of grid points.
    pub fn num_points(&self) -> usize {
        self.grid_definition.num_points()
    }

    /// Unpack the value array. Points masked out by a bitmap are NaN.
    pub fn values(&self) -> Result<Vec<f64>> {
        let payload = &self.raw[self.sec7_offset + 5..self.sec7_offset + self.sec7_length];
        let dr = &self.data_representation;

        packing::unpack_simple(
            payload,
            self.grid_definition.num_points() as u32,
            dr.bits_per_value,
            dr.reference_value,
            dr.binary_scale_factor,
            dr.decimal_scale_factor,
            self.bitmap.as_deref(),
        )
    }

    /// Per-point latitudes in degrees, derived from the grid definition.
    pub fn latitudes(&self) -> Vec<f64> {
        let gd = &self.grid_definition;
        let ni = gd.num_points_longitude as usize;
        let nj = gd.num_points_latitude as usize;

        let first = gd.first_latitude_microdegrees as f64;
        let step = if nj > 1 {
            (gd.last_latitude_microdegrees - gd.first_latitude_microdegrees) as f64
                / (nj - 1) as f64
        } else {
            0.0
        };

        let mut lats = Vec::with_capacity(ni * nj);
        for j in 0..nj {
            let lat = (first + j as f64 * step) / 1e6;
            lats.extend(std::iter::repeat(lat).take(ni));
        }
        lats
    }

    /// Per-point longitudes in degrees, normalized to [-180, 180).
    pub fn longitudes(&self) -> Vec<f64> {
        let gd = &self.grid_definition;
        let ni = gd.num_points_longitude as usize;
        let nj = gd.num_points_latitude as usize;

        let first = gd.first_longitude_microdegrees as f64;
        let step = if ni > 1 {
            (gd.last_longitude_microdegrees - gd.first_longitude_microdegrees) as f64
                / (ni - 1) as f64
        } else {
            0.0
        };

        let row: Vec<f64> = (0..ni)
            .map(|i| {
                let lon = (first + i as f64 * step) / 1e6;
                if lon >= 180.0 {
                    lon - 360.0
                } else {
                    lon
                }
            })
            .collect();

        let mut lons = Vec::with_capacity(ni * nj);
        for _ in 0..nj {
            lons.extend_from_slice(&row);
        }
        lons
    }

    /// Values plus both coordinate arrays, all of identical length.
    pub fn data(&self) -> Result<GridField> {
        Ok(GridField {
            values: self.values()?,
            latitudes: self.latitudes(),
            longitudes: self.longitudes(),
        })
    }

    /// Replace the value array and re-serialize it into the raw bytes.
    ///
    /// When every new value fits the original packing parameters the
    /// section 7 payload is rewritten in place, which keeps unchanged
    /// points bit-identical. Otherwise a fresh 16-bit simple packing is
    /// computed and sections 5+7 are replaced, updating the total
    /// message length.
    pub fn set_values(&mut self, values: &[f64]) -> Result<()> {
        if values.len() != self.grid_definition.num_points() {
            return Err(Grib2Error::EncodingError(format!(
                "expected {} values, got {}",
                self.grid_definition.num_points(),
                values.len()
            )));
        }
        if self.bitmap.is_some() {
            return Err(Grib2Error::Unsupported(
                "rewriting values of a bitmapped message".to_string(),
            ));
        }

        let dr = self.data_representation.clone();
        if dr.bits_per_value > 0 && self.fits_original_packing(values, &dr) {
            self.repack_in_place(values, &dr);
        } else {
            self.repack_with_new_parameters(values, &dr);
        }

        Ok(())
    }

    /// Raw encoded bytes of the (possibly rewritten) message.
    pub fn to_bytes(&self) -> Bytes {
        self.raw.clone()
    }

    fn fits_original_packing(&self, values: &[f64], dr: &DataRepresentation) -> bool {
        let max_packed = packing::max_packed_value(dr.bits_per_value) as i64;
        values.iter().all(|&v| {
            let packed = packing::packed_integer(
                v,
                dr.reference_value,
                dr.binary_scale_factor,
                dr.decimal_scale_factor,
            );
            (0..=max_packed).contains(&packed)
        })
    }

    fn repack_in_place(&mut self, values: &[f64], dr: &DataRepresentation) {
        let payload = packing::pack_simple(
            values,
            dr.bits_per_value,
            dr.reference_value,
            dr.binary_scale_factor,
            dr.decimal_scale_factor,
        );

        let mut raw = BytesMut::from(&self.raw[..]);
        let start = self.sec7_offset + 5;
        raw[start..start + payload.len()].copy_from_slice(&payload);
        self.raw = raw.freeze();
    }

    fn repack_with_new_parameters(&mut self, values: &[f64], dr: &DataRepresentation) {
        let decimal_scale = 10.0_f64.powi(dr.decimal_scale_factor as i32);
        let (min_scaled, max_scaled) = values.iter().fold(
            (f64::INFINITY, f64::NEG_INFINITY),
            |(min, max), &v| (min.min(v * decimal_scale), max.max(v * decimal_scale)),
        );

        let reference = min_scaled as f32;
        let range = max_scaled - min_scaled;
        let (bits_per_value, binary_scale_factor): (u8, i16) = if range <= 0.0 {
            (0, 0)
        } else {
            (16, (range / 65535.0).log2().ceil() as i16)
        };

        let payload = packing::pack_simple(
            values,
            bits_per_value,
            reference,
            binary_scale_factor,
            dr.decimal_scale_factor,
        );

        // Section 5, template 5.0 (21 bytes)
        let mut sec5 = Vec::with_capacity(21);
        sec5.extend_from_slice(&21u32.to_be_bytes());
        sec5.push(5);
        sec5.extend_from_slice(&(values.len() as u32).to_be_bytes());
        sec5.extend_from_slice(&0u16.to_be_bytes());
        sec5.extend_from_slice(&reference.to_be_bytes());
        sec5.extend_from_slice(&sections::encode_grib2_signed16(binary_scale_factor));
        sec5.extend_from_slice(&sections::encode_grib2_signed16(dr.decimal_scale_factor));
        sec5.push(bits_per_value);
        sec5.push(dr.original_data_type);

        // Section 7
        let sec7_length = 5 + payload.len();
        let mut sec7 = Vec::with_capacity(sec7_length);
        sec7.extend_from_slice(&(sec7_length as u32).to_be_bytes());
        sec7.push(7);
        sec7.extend_from_slice(&payload);

        // Splice: [..sec5] + sec5' + [sec6] + sec7' + "7777"
        let mut raw = BytesMut::new();
        raw.extend_from_slice(&self.raw[..self.sec5_offset]);
        raw.extend_from_slice(&sec5);
        raw.extend_from_slice(&self.raw[self.sec5_offset + self.sec5_length..self.sec7_offset]);
        raw.extend_from_slice(&sec7);
        raw.extend_from_slice(b"7777");

        let message_length = raw.len() as u64;
        raw[8..16].copy_from_slice(&message_length.to_be_bytes());

        let sec7_offset = self.sec7_offset + 21 - self.sec5_length;

        self.raw = raw.freeze();
        self.indicator.message_length = message_length;
        self.sec5_length = 21;
        self.sec7_offset = sec7_offset;
        self.sec7_length = sec7_length;
        self.data_representation = DataRepresentation {
            num_data_points: values.len() as u32,
            template_number: 0,
            reference_value: reference,
            binary_scale_factor,
            decimal_scale_factor: dr.decimal_scale_factor,
            bits_per_value,
            original_data_type: dr.original_data_type,
        };
    }
}
