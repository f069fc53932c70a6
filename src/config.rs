use std::{
    fs,
    path::{Path, PathBuf},
};

use directories::ProjectDirs;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use which::which;

use crate::{NotesError, Result, DEFAULT_SUMMARY_LENGTH};

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Application configuration settings.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Base URL of the notes API, without trailing slash
    pub api_base_url: String,

    /// File holding the session token
    pub session_file: PathBuf,

    /// Default editor command
    pub editor_command: Option<String>,

    /// Number of characters shown in list previews
    pub preview_length: usize,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        let session_file = project_dirs()
            .map(|dirs| dirs.data_dir().join("session"))
            .unwrap_or_else(|| PathBuf::from(".notesuite_session"));

        Config {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            session_file,
            editor_command: None,
            preview_length: DEFAULT_SUMMARY_LENGTH,
            request_timeout_secs: 30,
        }
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "notesuite", "notesuite")
}

impl Config {
    /// Location of the config file when none is given on the command line.
    pub fn default_path() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads the config at `path` (or the default location). A missing file yields defaults.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        let path = match path.map(Path::to_path_buf).or_else(Config::default_path) {
            Some(path) => path,
            None => {
                debug!("No config location available, using defaults");
                return Ok(Config::default());
            }
        };

        if !path.exists() {
            debug!("Config file {} not found, using defaults", path.display());
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(&path)?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| NotesError::ConfigError {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Updates one setting from a `key=value` string.
    pub fn set_value(&mut self, assignment: &str) -> Result<()> {
        let (key, value) = assignment
            .split_once('=')
            .map(|(k, v)| (k.trim(), v.trim()))
            .ok_or_else(|| NotesError::ConfigError {
                message: format!("Expected key=value, got '{}'", assignment),
            })?;

        match key {
            "api_base_url" => self.api_base_url = normalize_base_url(value),
            "session_file" => self.session_file = PathBuf::from(value),
            "editor_command" => {
                self.editor_command = (!value.is_empty()).then(|| value.to_string())
            }
            "preview_length" => self.preview_length = parse_number(key, value)?,
            "request_timeout_secs" => self.request_timeout_secs = parse_number(key, value)?,
            _ => {
                return Err(NotesError::ConfigError {
                    message: format!("Unknown setting '{}'", key),
                })
            }
        }
        Ok(())
    }

    // This method provides smart fallbacks when no editor is configured
    pub fn get_editor_command(&self) -> String {
        if let Some(editor) = &self.editor_command {
            return editor.clone();
        }

        if let Ok(editor) = std::env::var("EDITOR") {
            return editor;
        }

        if cfg!(windows) {
            "notepad".to_string()
        } else if cfg!(target_os = "macos") {
            "open -W -t".to_string()
        } else {
            for editor in &["nano", "vim", "vi", "emacs"] {
                if which(editor).is_ok() {
                    return editor.to_string();
                }
            }
            "nano".to_string()
        }
    }
}

/// Strips trailing slashes so endpoints can be appended directly.
pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| NotesError::ConfigError {
        message: format!("Setting '{}' expects a number, got '{}'", key, value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.json"))).unwrap();
        assert_eq!(config.api_base_url, DEFAULT_API_BASE_URL);
        assert_eq!(config.preview_length, 100);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"api_base_url": "https://notes.example.com/api"}"#).unwrap();
        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.api_base_url, "https://notes.example.com/api");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn save_then_load_round_trips_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");
        let mut config = Config::default();
        config.set_value("api_base_url=https://x.test/api/").unwrap();
        config.set_value("preview_length = 40").unwrap();
        config.save(&path).unwrap();
        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.api_base_url, "https://x.test/api");
        assert_eq!(loaded.preview_length, 40);
    }

    #[test]
    fn set_value_rejects_bad_input() {
        let mut config = Config::default();
        assert!(config.set_value("preview_length").is_err());
        assert!(config.set_value("preview_length=many").is_err());
        assert!(config.set_value("colour=blue").is_err());
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{not json").unwrap();
        assert!(matches!(
            Config::load(Some(&path)),
            Err(NotesError::ConfigError { .. })
        ));
    }
}
