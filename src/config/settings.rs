//! Store settings loaded from `canteen.toml` and the environment.
//!
//! Every field has a default, so an empty file (or no file at all) yields a usable
//! configuration. Environment variables, optionally read from a `.env` file,
//! override whatever the file says.

use crate::errors::{Error, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

/// Default `SQLite` location, created on first open.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/canteen.db?mode=rwc";

/// Currency applied to synced prices that arrive without one.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Settings for opening and reading the offline store
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// `SeaORM` connection URL
    pub database_url: String,
    /// Offset from UTC, in minutes, used to derive calendar dates and clock times
    pub utc_offset_minutes: i32,
    /// Currency code for prices synced without one
    pub default_currency: String,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            utc_offset_minutes: 0,
            default_currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl StoreSettings {
    /// Loads settings from a TOML file, then applies environment overrides.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if the file cannot be read or parsed, or if an
    /// override is malformed.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        debug!("Loading store settings from {:?}", path_ref);
        let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
            message: format!("Failed to read settings file {path_ref:?}: {e}"),
        })?;
        Self::parse(&contents)?.with_env_overrides()
    }

    /// Builds settings from defaults and the environment only.
    ///
    /// A `.env` file in the working directory is honoured if present.
    ///
    /// # Errors
    /// Returns [`Error::Config`] if an override is malformed.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Parses TOML settings without consulting the environment.
    ///
    /// # Errors
    /// Returns [`Error::Config`] on invalid TOML or an out-of-range offset.
    pub fn parse(contents: &str) -> Result<Self> {
        let settings: Self = toml::from_str(contents).map_err(|e| Error::Config {
            message: format!("Failed to parse store settings: {e}"),
        })?;
        settings.utc_offset()?;
        Ok(settings)
    }

    fn with_env_overrides(mut self) -> Result<Self> {
        dotenvy::dotenv().ok();

        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(raw) = std::env::var("CANTEEN_UTC_OFFSET_MINUTES") {
            self.utc_offset_minutes = raw.trim().parse().map_err(|e| Error::Config {
                message: format!("CANTEEN_UTC_OFFSET_MINUTES must be an integer: {e}"),
            })?;
        }
        if let Ok(currency) = std::env::var("CANTEEN_DEFAULT_CURRENCY") {
            self.default_currency = currency;
        }

        self.utc_offset()?;
        Ok(self)
    }

    /// The configured offset as a chrono [`FixedOffset`].
    ///
    /// # Errors
    /// Returns [`Error::Config`] when the offset exceeds one day.
    pub fn utc_offset(&self) -> Result<FixedOffset> {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or_else(|| Error::Config {
                message: format!(
                    "utc_offset_minutes out of range: {}",
                    self.utc_offset_minutes
                ),
            })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_partial_settings_keeps_defaults() {
        let settings = StoreSettings::parse("utc_offset_minutes = 330\n").unwrap();

        assert_eq!(settings.utc_offset_minutes, 330);
        assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(settings.default_currency, "INR");
        assert_eq!(settings.utc_offset().unwrap().local_minus_utc(), 330 * 60);
    }

    #[test]
    fn test_parse_rejects_out_of_range_offset() {
        let result = StoreSettings::parse("utc_offset_minutes = 5000\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_huge_offset_is_a_config_error() {
        let result = StoreSettings::parse("utc_offset_minutes = 100000000\n");
        assert!(matches!(result, Err(Error::Config { .. })));

        let settings = StoreSettings {
            utc_offset_minutes: i32::MIN,
            ..StoreSettings::default()
        };
        assert!(matches!(settings.utc_offset(), Err(Error::Config { .. })));
    }

    #[test]
    fn test_parse_rejects_invalid_toml() {
        let result = StoreSettings::parse("utc_offset_minutes = \"noon\"\n");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = StoreSettings::load("/nonexistent/canteen.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "default_currency = \"USD\"").unwrap();

        let settings = StoreSettings::load(file.path()).unwrap();
        // DATABASE_URL may be set in the environment, so only check the file value
        if std::env::var("CANTEEN_DEFAULT_CURRENCY").is_err() {
            assert_eq!(settings.default_currency, "USD");
        }
    }
}
