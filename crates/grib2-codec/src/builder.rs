//! Synthetic GRIB2 message construction.
//!
//! Builds minimal but fully valid single messages (sections 0-8) for an
//! AIFS variable on a regular lat/lon grid. Used by fixtures and tests
//! in this workspace; also handy for generating deterministic sample
//! files from the CLI.

use crate::sections::{encode_grib2_signed, encode_grib2_signed16};
use crate::tables;
use crate::{packing, Grib2Error, Result};

/// Builder for one synthetic GRIB2 message.
#[derive(Debug, Clone)]
pub struct MessageBuilder {
    variable: String,
    level: u32,
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    ni: u32,
    nj: u32,
    la1: i32,
    lo1: i32,
    la2: i32,
    lo2: i32,
    values: Vec<f64>,
}

impl MessageBuilder {
    /// Start a message for the given AIFS variable and level (hPa for
    /// upper-air variables, `0` for surface variables).
    ///
    /// Defaults: 2024-03-02 00:00 UTC reference time and a 6x6 grid from
    /// 60N,-30E to 35N,-5E in 5 degree steps, all values zero.
    pub fn new(variable: &str, level: u32) -> Self {
        let ni = 6;
        let nj = 6;
        Self {
            variable: variable.to_string(),
            level,
            year: 2024,
            month: 3,
            day: 2,
            hour: 0,
            minute: 0,
            ni,
            nj,
            la1: 60_000_000,
            lo1: -30_000_000,
            la2: 35_000_000,
            lo2: -5_000_000,
            values: vec![0.0; (ni * nj) as usize],
        }
    }

    /// Set the reference date.
    pub fn reference_date(mut self, year: u16, month: u8, day: u8) -> Self {
        self.year = year;
        self.month = month;
        self.day = day;
        self
    }

    /// Set the data time as HHMM (e.g. `0` or `1800`).
    pub fn data_time(mut self, hhmm: u32) -> Self {
        self.hour = (hhmm / 100) as u8;
        self.minute = (hhmm % 100) as u8;
        self
    }

    /// Set the grid geometry. Corner coordinates are in degrees.
    pub fn grid(mut self, ni: u32, nj: u32, la1: f64, lo1: f64, la2: f64, lo2: f64) -> Self {
        self.ni = ni;
        self.nj = nj;
        self.la1 = (la1 * 1e6).round() as i32;
        self.lo1 = (lo1 * 1e6).round() as i32;
        self.la2 = (la2 * 1e6).round() as i32;
        self.lo2 = (lo2 * 1e6).round() as i32;
        self.values = vec![0.0; (ni * nj) as usize];
        self
    }

    /// Set every grid point to the same value.
    pub fn constant(mut self, value: f64) -> Self {
        self.values = vec![value; (self.ni * self.nj) as usize];
        self
    }

    /// Fill the grid with a linear ramp from `min_val` to `max_val`.
    pub fn gradient(mut self, min_val: f64, max_val: f64) -> Self {
        let n = (self.ni * self.nj) as usize;
        self.values = (0..n)
            .map(|i| min_val + (max_val - min_val) * (i as f64 / n as f64))
            .collect();
        self
    }

    /// Set the value array explicitly.
    pub fn values(mut self, values: Vec<f64>) -> Self {
        self.values = values;
        self
    }

    /// Assemble the complete message bytes.
    pub fn build(&self) -> Result<Vec<u8>> {
        let codes = tables::codes_for(&self.variable, self.level).ok_or_else(|| {
            Grib2Error::EncodingError(format!(
                "unknown variable {:?} at level {}",
                self.variable, self.level
            ))
        })?;

        if self.values.len() != (self.ni * self.nj) as usize {
            return Err(Grib2Error::EncodingError(format!(
                "grid is {}x{} but {} values were supplied",
                self.ni,
                self.nj,
                self.values.len()
            )));
        }

        self.build_with_codes(codes.discipline, codes.category, codes.number, codes.level_type, codes.level_value)
    }

    /// Assemble the message with explicit GRIB2 parameter codes, bypassing
    /// the AIFS table. Used to fabricate out-of-schema messages in tests.
    pub fn build_with_codes(
        &self,
        discipline: u8,
        category: u8,
        number: u8,
        level_type: u8,
        level_value: u32,
    ) -> Result<Vec<u8>> {
        let section1 = self.build_section1();
        let section3 = self.build_section3();
        let section4 = self.build_section4(category, number, level_type, level_value);
        let (section5, section7) = self.build_data_sections();
        let section6 = self.build_section6();

        let message_length = 16
            + section1.len()
            + section3.len()
            + section4.len()
            + section5.len()
            + section6.len()
            + section7.len()
            + 4;

        let mut message = Vec::with_capacity(message_length);

        // Section 0: Indicator
        message.extend_from_slice(b"GRIB");
        message.extend_from_slice(&[0, 0]);
        message.push(discipline);
        message.push(2);
        message.extend_from_slice(&(message_length as u64).to_be_bytes());

        message.extend_from_slice(&section1);
        message.extend_from_slice(&section3);
        message.extend_from_slice(&section4);
        message.extend_from_slice(&section5);
        message.extend_from_slice(&section6);
        message.extend_from_slice(&section7);

        // Section 8: End
        message.extend_from_slice(b"7777");

        Ok(message)
    }

    fn build_section1(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&21u32.to_be_bytes());
        section.push(1);

        section.extend_from_slice(&98u16.to_be_bytes()); // Centre (ECMWF)
        section.extend_from_slice(&0u16.to_be_bytes()); // Sub-centre
        section.push(2); // Master table version
        section.push(1); // Local table version
        section.push(1); // Significance of reference time

        section.extend_from_slice(&self.year.to_be_bytes());
        section.push(self.month);
        section.push(self.day);
        section.push(self.hour);
        section.push(self.minute);
        section.push(0); // Second

        section.push(0); // Production status (operational)
        section.push(1); // Type of data (forecast)

        section
    }

    fn build_section3(&self) -> Vec<u8> {
        let mut section = Vec::new();

        // Template 3.0: Latitude/Longitude, 58 template bytes
        section.extend_from_slice(&(14u32 + 58).to_be_bytes());
        section.push(3);

        section.push(0); // Source of grid definition
        section.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section.push(0); // Octets for optional list
        section.push(0); // Interpretation of optional list
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 3.0

        section.push(6); // Shape of Earth (spherical, radius 6371229m)
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section.extend_from_slice(&self.ni.to_be_bytes());
        section.extend_from_slice(&self.nj.to_be_bytes());
        section.extend_from_slice(&0u32.to_be_bytes()); // Basic angle
        section.extend_from_slice(&0xFFFF_FFFFu32.to_be_bytes()); // Subdivisions

        section.extend_from_slice(&encode_grib2_signed(self.la1));
        section.extend_from_slice(&encode_grib2_signed(self.lo1));
        section.push(48); // Resolution and component flags
        section.extend_from_slice(&encode_grib2_signed(self.la2));
        section.extend_from_slice(&encode_grib2_signed(self.lo2));

        let di = if self.ni > 1 {
            (self.lo2 - self.lo1).unsigned_abs() / (self.ni - 1)
        } else {
            0
        };
        let dj = if self.nj > 1 {
            (self.la2 - self.la1).unsigned_abs() / (self.nj - 1)
        } else {
            0
        };
        section.extend_from_slice(&di.to_be_bytes());
        section.extend_from_slice(&dj.to_be_bytes());
        section.push(0b0100_0000); // Scanning mode: +i, -j, i consecutive

        section
    }

    fn build_section4(&self, category: u8, number: u8, level_type: u8, level_value: u32) -> Vec<u8> {
        let mut section = Vec::new();

        // Template 4.0: Analysis or forecast at a horizontal level
        section.extend_from_slice(&34u32.to_be_bytes());
        section.push(4);

        section.extend_from_slice(&0u16.to_be_bytes()); // Coordinate values
        section.extend_from_slice(&0u16.to_be_bytes()); // Template 4.0

        section.push(category);
        section.push(number);
        section.push(2); // Generating process: forecast
        section.push(0);
        section.push(0);
        section.extend_from_slice(&0u16.to_be_bytes()); // Hours of cutoff
        section.push(0); // Minutes of cutoff
        section.push(1); // Time range unit (hours)
        section.extend_from_slice(&0u32.to_be_bytes()); // Forecast time

        section.push(level_type);
        section.push(0); // Scale factor
        section.extend_from_slice(&level_value.to_be_bytes());

        section.push(255); // Second fixed surface: none
        section.push(0);
        section.extend_from_slice(&0u32.to_be_bytes());

        section
    }

    fn build_data_sections(&self) -> (Vec<u8>, Vec<u8>) {
        let (min_val, max_val) = self
            .values
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), &v| {
                (min.min(v), max.max(v))
            });

        let reference = min_val as f32;
        let range = max_val - min_val;
        let (bits_per_value, binary_scale_factor): (u8, i16) = if range <= 0.0 {
            (0, 0)
        } else {
            (16, (range / 65535.0).log2().ceil() as i16)
        };

        let payload = packing::pack_simple(&self.values, bits_per_value, reference, binary_scale_factor, 0);

        let mut section5 = Vec::new();
        section5.extend_from_slice(&21u32.to_be_bytes());
        section5.push(5);
        section5.extend_from_slice(&(self.ni * self.nj).to_be_bytes());
        section5.extend_from_slice(&0u16.to_be_bytes()); // Template 5.0
        section5.extend_from_slice(&reference.to_be_bytes());
        section5.extend_from_slice(&encode_grib2_signed16(binary_scale_factor));
        section5.extend_from_slice(&encode_grib2_signed16(0)); // Decimal scale
        section5.push(bits_per_value);
        section5.push(0); // Original field type: floating point

        let mut section7 = Vec::new();
        section7.extend_from_slice(&((5 + payload.len()) as u32).to_be_bytes());
        section7.push(7);
        section7.extend_from_slice(&payload);

        (section5, section7)
    }

    fn build_section6(&self) -> Vec<u8> {
        let mut section = Vec::new();
        section.extend_from_slice(&6u32.to_be_bytes());
        section.push(6);
        section.push(255); // No bitmap, all data present
        section
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_produces_well_formed_message() {
        let data = MessageBuilder::new("msl", 0).constant(101_325.0).build().unwrap();

        assert_eq!(&data[0..4], b"GRIB");
        assert_eq!(data[7], 2);
        assert_eq!(&data[data.len() - 4..], b"7777");

        let length = u64::from_be_bytes(data[8..16].try_into().unwrap());
        assert_eq!(length as usize, data.len());
    }

    #[test]
    fn unknown_variable_is_rejected() {
        assert!(MessageBuilder::new("bogus", 0).build().is_err());
        // Upper-air variable at the surface is equally invalid
        assert!(MessageBuilder::new("u", 0).build().is_err());
    }

    #[test]
    fn value_count_must_match_grid() {
        let result = MessageBuilder::new("msl", 0).values(vec![1.0; 7]).build();
        assert!(result.is_err());
    }
}
