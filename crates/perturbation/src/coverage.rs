//! Canonical AIFS coverage: which variables exist at which levels.

use std::collections::{BTreeMap, BTreeSet};

/// AIFS surface variables, mapped to the sentinel level 0.
pub const SURFACE_VARIABLES: [&str; 11] = [
    "10u", "10v", "2d", "2t", "lsm", "msl", "sdor", "skt", "slor", "sp", "tcw",
];

/// AIFS upper-air variables, present on every pressure level.
pub const UPPER_VARIABLES: [&str; 6] = ["q", "t", "w", "z", "u", "v"];

/// Pressure levels in hPa.
pub const PRESSURE_LEVELS: [u32; 13] = [
    50, 100, 150, 200, 250, 300, 400, 500, 600, 700, 850, 925, 1000,
];

/// The expected variable/level coverage of a valid AIFS file.
///
/// Surface variables carry the single sentinel level `0`; upper-air
/// variables carry all pressure levels; geopotential `z` carries both.
/// The table is static and does not depend on any input file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverageTable(BTreeMap<String, Vec<u32>>);

impl CoverageTable {
    /// The standard AIFS coverage table.
    pub fn standard() -> Self {
        let mut table = BTreeMap::new();

        for variable in SURFACE_VARIABLES {
            table.insert(variable.to_string(), vec![0]);
        }
        for variable in UPPER_VARIABLES {
            table.insert(variable.to_string(), PRESSURE_LEVELS.to_vec());
        }

        let mut z_levels = vec![0];
        z_levels.extend(PRESSURE_LEVELS);
        table.insert("z".to_string(), z_levels);

        Self(table)
    }

    /// Whether the table knows this variable.
    pub fn contains_variable(&self, variable: &str) -> bool {
        self.0.contains_key(variable)
    }

    /// Valid levels for one variable, sorted ascending.
    pub fn valid_levels(&self, variable: &str) -> Option<&[u32]> {
        self.0.get(variable).map(Vec::as_slice)
    }

    /// The union of all valid levels across every variable.
    pub fn level_union(&self) -> BTreeSet<u32> {
        self.0.values().flatten().copied().collect()
    }

    /// The full variable -> sorted levels mapping.
    pub fn as_map(&self) -> &BTreeMap<String, Vec<u32>> {
        &self.0
    }
}

/// Coverage observed in an actual file: data time -> variable -> sorted
/// levels seen at that time.
pub type ObservedCoverage = BTreeMap<u32, BTreeMap<String, Vec<u32>>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_table_shape() {
        let table = CoverageTable::standard();

        assert_eq!(table.as_map().len(), 17);
        assert_eq!(table.valid_levels("msl"), Some(&[0][..]));
        assert_eq!(table.valid_levels("t"), Some(&PRESSURE_LEVELS[..]));
        assert!(table.valid_levels("t").unwrap().windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn geopotential_has_surface_and_pressure_levels() {
        let table = CoverageTable::standard();
        let z = table.valid_levels("z").unwrap();

        assert_eq!(z.len(), PRESSURE_LEVELS.len() + 1);
        assert_eq!(z[0], 0);
        assert!(z.contains(&500));
    }

    #[test]
    fn level_union_includes_sentinel() {
        let union = CoverageTable::standard().level_union();
        assert!(union.contains(&0));
        assert!(union.contains(&1000));
        assert_eq!(union.len(), PRESSURE_LEVELS.len() + 1);
    }
}
