//! Schema validation: does a file carry the full expected coverage?

use std::collections::BTreeMap;

use grib2_codec::MessageSource;
use tracing::{info, warn};

use crate::coverage::{CoverageTable, ObservedCoverage};
use crate::Result;

/// Outcome of one validation pass.
///
/// Validation failure is advisory: the report carries diagnostics and a
/// verdict, and callers decide whether to proceed. Only codec failures
/// surface as errors.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    /// Variables not in the coverage table at all, keyed by data time.
    pub extra_variables: BTreeMap<u32, Vec<String>>,
    /// Variables seen at a level outside the union of valid levels,
    /// keyed by data time.
    pub extra_levels: BTreeMap<u32, Vec<String>>,
    /// Data times whose coverage differs from the table.
    pub incomplete_times: Vec<u32>,
    /// Everything that was actually seen, sorted at every layer.
    pub observed: ObservedCoverage,
}

impl ValidationReport {
    /// Whether the file matched the coverage table exactly.
    pub fn is_valid(&self) -> bool {
        self.extra_variables.is_empty()
            && self.extra_levels.is_empty()
            && self.incomplete_times.is_empty()
            && !self.observed.is_empty()
    }
}

/// Walk every message once and compare the observed coverage against the
/// table, per data time, for exact equality.
///
/// A file with zero messages fails: an empty observation can never
/// satisfy a non-empty coverage table.
pub fn validate<S: MessageSource>(
    source: &mut S,
    table: &CoverageTable,
) -> Result<ValidationReport> {
    let mut report = ValidationReport::default();
    let level_union = table.level_union();

    while let Some(message) = source.next_message()? {
        let variable = message.short_name().to_string();
        let level = message.level();
        let data_time = message.data_time();

        if !table.contains_variable(&variable) {
            report
                .extra_variables
                .entry(data_time)
                .or_default()
                .push(variable.clone());
        }

        if !level_union.contains(&level) {
            report
                .extra_levels
                .entry(data_time)
                .or_default()
                .push(variable.clone());
        }

        report
            .observed
            .entry(data_time)
            .or_default()
            .entry(variable)
            .or_default()
            .push(level);
    }

    for levels in report.observed.values_mut().flat_map(|m| m.values_mut()) {
        levels.sort_unstable();
    }

    if !report.extra_variables.is_empty() {
        warn!(extra_variables = ?report.extra_variables, "invalid grib: extra variables found");
    }
    if !report.extra_levels.is_empty() {
        warn!(extra_levels = ?report.extra_levels, "invalid grib: extra levels found");
    }

    if report.observed.is_empty() {
        warn!("invalid grib: file contains no messages");
    }

    for (data_time, observed_at_time) in &report.observed {
        if observed_at_time != table.as_map() {
            warn!(
                data_time,
                "time does not have all the expected variables and levels"
            );
            report.incomplete_times.push(*data_time);
        }
    }

    if report.is_valid() {
        info!(times = report.observed.len(), "grib file coverage is valid");
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata;
    use bytes::Bytes;
    use grib2_codec::{Grib2Reader, MessageBuilder};

    #[test]
    fn complete_file_is_valid() {
        let table = CoverageTable::standard();
        let mut reader = Grib2Reader::new(Bytes::from(testdata::complete_file(&[0, 1800])));

        let report = validate(&mut reader, &table).unwrap();
        assert!(report.is_valid());
        assert!(report.extra_variables.is_empty());
        assert_eq!(report.observed.len(), 2);
    }

    #[test]
    fn empty_file_is_invalid() {
        let table = CoverageTable::standard();
        let mut reader = Grib2Reader::new(Bytes::new());

        let report = validate(&mut reader, &table).unwrap();
        assert!(!report.is_valid());
        assert!(report.observed.is_empty());
    }

    #[test]
    fn extra_variable_fails_and_names_the_time() {
        let table = CoverageTable::standard();
        let mut file = testdata::complete_file(&[600]);
        // Parameter nobody expects: discipline 0, category 19, number 0
        file.extend(
            MessageBuilder::new("msl", 0)
                .data_time(600)
                .gradient(0.0, 10.0)
                .build_with_codes(0, 19, 0, 1, 0)
                .unwrap(),
        );

        let mut reader = Grib2Reader::new(Bytes::from(file));
        let report = validate(&mut reader, &table).unwrap();

        assert!(!report.is_valid());
        assert_eq!(report.extra_variables[&600], vec!["P0_19_0".to_string()]);
        assert_eq!(report.incomplete_times, vec![600]);
    }

    #[test]
    fn missing_level_fails() {
        let table = CoverageTable::standard();
        let file = testdata::complete_file_without(&[0], "t", 500);

        let mut reader = Grib2Reader::new(Bytes::from(file));
        let report = validate(&mut reader, &table).unwrap();

        assert!(!report.is_valid());
        assert_eq!(report.incomplete_times, vec![0]);
        assert!(report.extra_variables.is_empty());
    }

    #[test]
    fn one_bad_time_does_not_invalidate_the_other() {
        let table = CoverageTable::standard();
        let mut file = testdata::complete_file(&[0]);
        file.extend(testdata::complete_file_without(&[1800], "msl", 0));

        let mut reader = Grib2Reader::new(Bytes::from(file));
        let report = validate(&mut reader, &table).unwrap();

        assert!(!report.is_valid());
        assert_eq!(report.incomplete_times, vec![1800]);
    }
}
