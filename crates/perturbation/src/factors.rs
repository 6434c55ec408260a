//! Per-variable, per-level multiplicative factor tables.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{PerturbationError, Result};

/// One (variable, level, factor) entry of a factor table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorEntry {
    pub variable: String,
    pub level: u32,
    pub factor: f64,
}

impl fmt::Display for FactorEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} x{}", self.variable, self.level, self.factor)
    }
}

/// An ordered list of factor entries, validated at construction.
///
/// Entries keep their given order; later entries for the same
/// (variable, level) pair shadow earlier ones at lookup time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorTable(Vec<FactorEntry>);

impl FactorTable {
    /// Build a table from entries, rejecting empty tables and non-finite
    /// factors up front.
    pub fn new(entries: Vec<FactorEntry>) -> Result<Self> {
        if entries.is_empty() {
            return Err(PerturbationError::InvalidFactorTable(
                "factor table is empty".to_string(),
            ));
        }
        for entry in &entries {
            if !entry.factor.is_finite() {
                return Err(PerturbationError::InvalidFactorTable(format!(
                    "non-finite factor for {} at level {}",
                    entry.variable, entry.level
                )));
            }
        }
        Ok(Self(entries))
    }

    /// Parse the JSON shape `{"variable": {"level": factor, ...}, ...}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: BTreeMap<String, BTreeMap<String, f64>> = serde_json::from_str(json)?;

        let mut entries = Vec::new();
        for (variable, levels) in raw {
            for (level, factor) in levels {
                let level: u32 = level.parse().map_err(|_| {
                    PerturbationError::InvalidFactorTable(format!(
                        "level {:?} for variable {:?} is not an integer",
                        level, variable
                    ))
                })?;
                entries.push(FactorEntry {
                    variable: variable.clone(),
                    level,
                    factor,
                });
            }
        }

        Self::new(entries)
    }

    /// Factor for a message, if any entry matches its variable and level.
    pub fn factor_for(&self, variable: &str, level: u32) -> Option<f64> {
        self.0
            .iter()
            .rev()
            .find(|e| e.variable == variable && e.level == level)
            .map(|e| e.factor)
    }

    pub fn entries(&self) -> &[FactorEntry] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_is_rejected() {
        assert!(matches!(
            FactorTable::new(vec![]),
            Err(PerturbationError::InvalidFactorTable(_))
        ));
    }

    #[test]
    fn non_finite_factor_is_rejected() {
        let result = FactorTable::new(vec![FactorEntry {
            variable: "t".to_string(),
            level: 500,
            factor: f64::NAN,
        }]);
        assert!(result.is_err());
    }

    #[test]
    fn lookup_matches_variable_and_level() {
        let table = FactorTable::new(vec![
            FactorEntry { variable: "t".to_string(), level: 500, factor: 1.1 },
            FactorEntry { variable: "msl".to_string(), level: 0, factor: 0.9 },
        ])
        .unwrap();

        assert_eq!(table.factor_for("t", 500), Some(1.1));
        assert_eq!(table.factor_for("msl", 0), Some(0.9));
        assert_eq!(table.factor_for("t", 850), None);
        assert_eq!(table.factor_for("u", 500), None);
    }

    #[test]
    fn later_entries_shadow_earlier_ones() {
        let table = FactorTable::new(vec![
            FactorEntry { variable: "t".to_string(), level: 500, factor: 1.1 },
            FactorEntry { variable: "t".to_string(), level: 500, factor: 1.3 },
        ])
        .unwrap();

        assert_eq!(table.factor_for("t", 500), Some(1.3));
    }

    #[test]
    fn json_shape_parses() {
        let table = FactorTable::from_json(r#"{"t": {"500": 1.1, "850": 1.2}, "msl": {"0": 0.95}}"#)
            .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.factor_for("t", 850), Some(1.2));
        assert_eq!(table.factor_for("msl", 0), Some(0.95));
    }

    #[test]
    fn entries_render_for_log_messages() {
        let entry = FactorEntry { variable: "t".to_string(), level: 500, factor: 1.1 };
        assert_eq!(entry.to_string(), "t@500 x1.1");
    }

    #[test]
    fn json_with_bad_level_is_rejected() {
        assert!(FactorTable::from_json(r#"{"t": {"surface": 1.1}}"#).is_err());
        assert!(FactorTable::from_json(r#"{}"#).is_err());
    }
}
