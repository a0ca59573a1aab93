//! Application configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Directory where projects are stored.
    pub projects_dir: PathBuf,

    /// Editing session behaviour.
    pub editor: EditorDefaults,

    /// Export defaults.
    pub export: ExportDefaults,

    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Editing session defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorDefaults {
    /// Maximum number of undo snapshots retained.
    pub history_capacity: usize,

    /// Quiet period after the last edit before a history snapshot is taken.
    pub history_settle_ms: u64,

    /// Quiet period after the last edit before the project is saved.
    pub autosave_settle_ms: u64,

    /// Cursor smoothing preset name (`slow`, `mellow`, `quick`, `rapid`).
    pub cursor_speed: String,
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportDefaults {
    /// Interval used while waiting on preprocessing jobs.
    pub poll_interval_ms: u64,

    /// Output frame rate.
    pub fps: u32,

    /// Output width in pixels.
    pub width: u32,

    /// Output height in pixels.
    pub height: u32,

    /// Output container/codec (`mp4-h264`, `mp4-h265`, `webm`, `gif`).
    pub format: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "reframe=debug,warn").
    pub level: String,

    /// Whether to output structured JSON logs.
    pub json: bool,

    /// Optional log file path.
    pub file: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            projects_dir: dirs_default_projects(),
            editor: EditorDefaults::default(),
            export: ExportDefaults::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for EditorDefaults {
    fn default() -> Self {
        Self {
            history_capacity: 50,
            history_settle_ms: 1500,
            autosave_settle_ms: 1000,
            cursor_speed: "mellow".to_string(),
        }
    }
}

impl Default for ExportDefaults {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            fps: 60,
            width: 1920,
            height: 1080,
            format: "mp4-h264".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    /// Load `$XDG_CONFIG_HOME/reframe/config.json`, or defaults when it is
    /// absent or unreadable.
    pub fn load() -> Self {
        Self::load_from(&config_file_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        let parsed = std::fs::read_to_string(path)
            .map_err(|e| e.to_string())
            .and_then(|content| serde_json::from_str(&content).map_err(|e| e.to_string()));
        parsed.unwrap_or_else(|error| {
            tracing::warn!(path = %path.display(), %error, "Ignoring config file, using defaults");
            Self::default()
        })
    }

    /// Write to the standard location, creating its directory.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// `$<var>`, else `$HOME/<fallback>`, else `/tmp/<fallback>`.
fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    std::env::var_os(var).map(PathBuf::from).unwrap_or_else(|| {
        let mut dir = std::env::var_os("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("/tmp"));
        dir.extend(fallback);
        dir
    })
}

fn config_file_path() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).join("reframe").join("config.json")
}

fn dirs_default_projects() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"]).join("reframe").join("projects")
}
