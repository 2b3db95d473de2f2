use directories::ProjectDirs;
use simplelog::*;
use std::{fs, path};

use crate::error::RingtailError;

fn make_path() -> Option<path::PathBuf> {
    let dirs = ProjectDirs::from("dev", "ringtail", "ringtail")?;
    let dir = dirs.data_dir();
    fs::create_dir_all(dir).ok()?;

    Some(dir.join("info.log"))
}

pub fn parse_level(level: &str) -> Result<LevelFilter, RingtailError> {
    level
        .parse()
        .map_err(|_| RingtailError::InvalidLogLevel(level.to_string()))
}

/// Logs to a file in the platform data directory. Without a data directory
/// logging stays off.
pub fn init(level: LevelFilter) -> Result<(), RingtailError> {
    if level == LevelFilter::Off {
        return Ok(());
    }
    if let Some(path) = make_path() {
        CombinedLogger::init(vec![WriteLogger::new(
            level,
            Config::default(),
            fs::File::create(&path)?,
        )])?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::Debug);
        assert_eq!(parse_level("WARN").unwrap(), LevelFilter::Warn);
        assert!(matches!(
            parse_level("loud"),
            Err(RingtailError::InvalidLogLevel(level)) if level == "loud"
        ));
    }
}
