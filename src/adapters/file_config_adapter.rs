//! INI file configuration adapter.
//!
//! Section and key lookups are case-insensitive; values keep their case.
//! Numeric and boolean values are trimmed before parsing, and a value that
//! does not parse is reported against its section and key rather than
//! replaced by the default.

use crate::domain::error::TrendscopeError;
use crate::ports::config_port::ConfigPort;
use configparser::ini::Ini;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

pub struct FileConfigAdapter {
    config: Ini,
}

impl FileConfigAdapter {
    pub fn from_file<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let mut config = Ini::new();
        config.load(path).map_err(std::io::Error::other)?;
        Ok(Self { config })
    }

    pub fn from_string(content: &str) -> Result<Self, String> {
        let mut config = Ini::new();
        config.read(content.to_string())?;
        Ok(Self { config })
    }

    /// Raw value with surrounding whitespace removed; blank counts as absent.
    fn trimmed(&self, section: &str, key: &str) -> Option<String> {
        self.config
            .get(section, key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn typed<T>(&self, section: &str, key: &str, default: T) -> Result<T, TrendscopeError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.trimmed(section, key) {
            None => Ok(default),
            Some(raw) => raw.parse::<T>().map_err(|e| TrendscopeError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{raw}' ({e})"),
            }),
        }
    }

    fn parse_bool(value: &str) -> Option<bool> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Some(true),
            "false" | "no" | "off" | "0" => Some(false),
            _ => None,
        }
    }
}

impl ConfigPort for FileConfigAdapter {
    fn get_string(&self, section: &str, key: &str) -> Option<String> {
        self.config.get(section, key)
    }

    fn get_int(&self, section: &str, key: &str, default: i64) -> Result<i64, TrendscopeError> {
        self.typed(section, key, default)
    }

    fn get_double(&self, section: &str, key: &str, default: f64) -> Result<f64, TrendscopeError> {
        self.typed(section, key, default)
    }

    fn get_bool(&self, section: &str, key: &str, default: bool) -> Result<bool, TrendscopeError> {
        match self.trimmed(section, key) {
            None => Ok(default),
            Some(raw) => Self::parse_bool(&raw).ok_or_else(|| TrendscopeError::ConfigInvalid {
                section: section.to_string(),
                key: key.to_string(),
                reason: format!("'{raw}' is not a boolean"),
            }),
        }
    }

    fn get_list(&self, section: &str, key: &str) -> Vec<String> {
        self.trimmed(section, key)
            .map(|s| {
                s.split(',')
                    .map(|item| item.trim().to_string())
                    .filter(|item| !item.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }
}
