//! Key=value config files and CLI-over-config merging.
//!
//! Config files are flat `key = value` lines. A first line starting with
//! `#` or `$` is treated as a shebang-style header and skipped; blank
//! lines and lines starting with `#` are ignored everywhere.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};

/// Values loaded from an optional config file, merged with CLI arguments
/// one key at a time. CLI arguments always win.
#[derive(Debug, Default)]
pub struct FileConfig {
    values: HashMap<String, String>,
}

impl FileConfig {
    /// Load a config file; `None` yields an empty config.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;

        let mut lines = text.lines();
        let mut values = HashMap::new();

        let mut first = lines.next();
        if let Some(line) = first {
            if line.starts_with('#') || line.starts_with('$') {
                first = None;
            }
        }

        for line in first.into_iter().chain(lines) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                bail!("config line without '=' separator: {line:?}");
            };
            values.insert(key.trim().to_string(), value.trim().to_string());
        }

        Ok(Self { values })
    }

    /// Required value: CLI argument first, then the config file.
    pub fn require<T>(&self, cli: Option<T>, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        match self.optional(cli, key)? {
            Some(value) => Ok(value),
            None => bail!("missing required argument --{key} (not on the command line or in the config file)"),
        }
    }

    /// Optional value: CLI argument first, then the config file.
    pub fn optional<T>(&self, cli: Option<T>, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        if cli.is_some() {
            return Ok(cli);
        }
        match self.values.get(key) {
            Some(raw) => {
                let parsed = raw
                    .parse()
                    .with_context(|| format!("config value {key} = {raw:?}"))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Optional value with a fallback default.
    pub fn or_default<T>(&self, cli: Option<T>, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
        T::Err: std::error::Error + Send + Sync + 'static,
    {
        Ok(self.optional(cli, key)?.unwrap_or(default))
    }
}

/// Parse a comma-separated float list (`"1.1,0.9,2"`).
pub fn parse_list(value: &str) -> Result<Vec<f64>> {
    value
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f64>()
                .with_context(|| format!("invalid number in list: {part:?}"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(text.as_bytes()).unwrap();
        file
    }

    #[test]
    fn parses_key_value_lines() {
        let file = write_config("variable = msl\nlevel = 0\n\n# comment\nzmul = 1.1\n");
        let config = FileConfig::load(Some(file.path())).unwrap();

        assert_eq!(config.require::<String>(None, "variable").unwrap(), "msl");
        assert_eq!(config.require::<u32>(None, "level").unwrap(), 0);
        assert_eq!(config.require::<f64>(None, "zmul").unwrap(), 1.1);
    }

    #[test]
    fn first_header_line_is_skipped() {
        let file = write_config("$ perturbation run config\nvariable = t\n");
        let config = FileConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.require::<String>(None, "variable").unwrap(), "t");
    }

    #[test]
    fn cli_wins_over_config() {
        let file = write_config("level = 500\n");
        let config = FileConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.require(Some(850u32), "level").unwrap(), 850);
    }

    #[test]
    fn missing_required_key_fails() {
        let config = FileConfig::load(None).unwrap();
        assert!(config.require::<String>(None, "grib_file").is_err());
    }

    #[test]
    fn value_with_equals_sign_keeps_the_tail() {
        let file = write_config("note = a=b\n");
        let config = FileConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.require::<String>(None, "note").unwrap(), "a=b");
    }

    #[test]
    fn malformed_line_is_rejected() {
        let file = write_config("just a line without separator\n");
        assert!(FileConfig::load(Some(file.path())).is_err());
    }

    #[test]
    fn list_parsing() {
        assert_eq!(parse_list("1.1, 0.9,2").unwrap(), vec![1.1, 0.9, 2.0]);
        assert!(parse_list("1.1,oops").is_err());
    }
}
