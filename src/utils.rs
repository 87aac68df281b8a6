use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Profile mode for the application (dev or prod)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Dev,
    Prod,
}

impl Profile {
    fn app_name(self) -> &'static str {
        match self {
            Profile::Dev => "organizer-dev",
            Profile::Prod => "organizer",
        }
    }
}

/// Get the configuration directory path.
/// The dev profile uses "organizer-dev" so it never touches real data.
pub fn get_config_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "organizer", profile.app_name()).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the data directory path, where the database lives
pub fn get_data_dir(profile: Profile) -> Option<PathBuf> {
    ProjectDirs::from("com", "organizer", profile.app_name()).map(|dirs| dirs.data_dir().to_path_buf())
}

/// Expand `~` in a path string to the user's home directory
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}

/// Parse a date string in ISO 8601 format (YYYY-MM-DD)
pub fn parse_date(date_str: &str) -> Result<chrono::NaiveDate, chrono::ParseError> {
    chrono::NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
}

/// Parse a YYYY-MM-DD date as local midnight
pub fn parse_date_time(date_str: &str) -> Result<chrono::NaiveDateTime, chrono::ParseError> {
    Ok(parse_date(date_str)?.and_time(chrono::NaiveTime::MIN))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_home_prefix_only() {
        assert_eq!(expand_path("/var/db.sqlite"), PathBuf::from("/var/db.sqlite"));
        assert_eq!(expand_path("relative/~/x"), PathBuf::from("relative/~/x"));
        if let Some(home) = BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            assert_eq!(expand_path("~/a/b.db"), home.join("a/b.db"));
        }
    }

    #[test]
    fn parses_dates_at_midnight() {
        let dt = parse_date_time("2024-03-09").unwrap();
        assert_eq!(dt.to_string(), "2024-03-09 00:00:00");
        assert!(parse_date("09/03/2024").is_err());
    }
}
