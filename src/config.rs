use once_cell::sync::Lazy;
use std::path::PathBuf;
use std::{fs, sync::Mutex};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::error::RingtailError;

pub const DEFAULT_LINES: usize = 10;

/// How a full window makes room for a new line.
#[derive(Serialize, Deserialize, clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Policy {
    #[default]
    Reconstruct,
    Reassign,
}

#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lines: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<Policy>,
}

impl Config {
    /// Reads the config file, falling back to defaults if it is missing or
    /// malformed.
    pub fn load() -> Self {
        Self::get_config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .map(|data| Self::parse(&data))
            .unwrap_or_default()
    }

    pub fn parse(data: &str) -> Self {
        toml::from_str(data).unwrap_or_default()
    }

    pub fn save(&self) -> Result<(), RingtailError> {
        let data = toml::to_string(&self)?;
        let path = Self::get_config_path().ok_or(RingtailError::NoConfigDir)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, data)?;
        Ok(())
    }

    pub fn get_config_path() -> Option<PathBuf> {
        let dirs = ProjectDirs::from("dev", "ringtail", "ringtail")?;
        Some(dirs.config_dir().join("ringtail.toml"))
    }

    pub fn lines(&self) -> usize {
        self.lines.unwrap_or(DEFAULT_LINES)
    }
}

pub static CONFIG: Lazy<Mutex<Config>> = Lazy::new(|| Mutex::new(Config::load()));

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_fields() {
        let config = Config::parse("lines = 3\nlog_level = \"debug\"\npolicy = \"reassign\"\n");
        assert_eq!(config.lines(), 3);
        assert_eq!(config.log_level.as_deref(), Some("debug"));
        assert_eq!(config.policy, Some(Policy::Reassign));
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let config = Config::parse("lines = \"many\"");
        assert_eq!(config, Config::default());
        assert_eq!(config.lines(), DEFAULT_LINES);
    }

    #[test]
    fn unset_fields_are_not_written() {
        let config = Config {
            lines: Some(5),
            ..Config::default()
        };
        let data = toml::to_string(&config).unwrap();
        assert_eq!(data.trim(), "lines = 5");
        assert_eq!(Config::parse(&data), config);
    }
}
