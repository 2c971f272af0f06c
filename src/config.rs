//! Settings parser for ~/.config/rewind/config.toml

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use rewind_core::prelude::*;

const CONFIG_FILENAME: &str = "config.toml";
const REWIND_DIR: &str = "rewind";

/// User settings for the follower.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Default target URI used when none is passed on the command line.
    pub target: Option<String>,
    /// Print packets as JSON lines instead of human-readable text.
    pub json_output: bool,
    /// Prefix each message with its receive timestamp.
    pub show_timestamps: bool,
    /// Maximum number of retained console messages.
    pub max_messages: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: None,
            json_output: false,
            show_timestamps: true,
            max_messages: 10_000,
        }
    }
}

impl Settings {
    /// Load settings from the user config file, falling back to
    /// defaults when the file is missing or unreadable.
    pub fn load() -> Settings {
        let Some(path) = Settings::config_path() else {
            return Settings::default();
        };
        match Settings::load_from(&path) {
            Ok(settings) => settings,
            Err(Error::Io(err)) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("no config file at {}", path.display());
                Settings::default()
            }
            Err(err) => {
                tracing::warn!("ignoring invalid config {}: {}", path.display(), err);
                Settings::default()
            }
        }
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> Result<Settings> {
        let text = std::fs::read_to_string(path)?;
        toml::from_str(&text).map_err(|e| Error::config(format!("{}: {e}", path.display())))
    }

    /// Path of the user config file, if a config directory exists.
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(REWIND_DIR).join(CONFIG_FILENAME))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert!(settings.target.is_none());
        assert!(!settings.json_output);
        assert!(settings.show_timestamps);
        assert_eq!(settings.max_messages, 10_000);
    }

    #[test]
    fn test_load_from_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "target = \"ws://localhost:8000/session\"").unwrap();
        writeln!(file, "max_messages = 500").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        assert_eq!(settings.target.as_deref(), Some("ws://localhost:8000/session"));
        assert_eq!(settings.max_messages, 500);
        // Unspecified fields keep their defaults.
        assert!(settings.show_timestamps);
    }

    #[test]
    fn test_load_from_rejects_unknown_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "no_such_setting = true\n").unwrap();

        assert!(Settings::load_from(&path).is_err());
    }

    #[test]
    #[serial]
    fn test_load_without_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());

        assert_eq!(Settings::load(), Settings::default());

        std::env::remove_var("XDG_CONFIG_HOME");
    }

    #[test]
    #[serial]
    fn test_load_reads_user_config() {
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());

        let config_dir = dir.path().join(REWIND_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();
        std::fs::write(config_dir.join(CONFIG_FILENAME), "json_output = true\n").unwrap();

        let settings = Settings::load();
        assert!(settings.json_output);

        std::env::remove_var("XDG_CONFIG_HOME");
    }
}
