//! Application configuration for CourseDocs.
//!
//! User config lives at `~/.coursedocs/coursedocs.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CourseDocsError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "coursedocs.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".coursedocs";

// ---------------------------------------------------------------------------
// Config structs (matching coursedocs.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Global defaults.
    #[serde(default)]
    pub defaults: DefaultsConfig,

    /// Date anchor settings.
    #[serde(default)]
    pub anchor: AnchorConfig,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Replacement text for the date anchor.
    #[serde(default = "default_date_text")]
    pub date_text: String,

    /// Days text prepended to the raw schedule in `{{SCHEDULE}}`.
    #[serde(default = "default_days_text")]
    pub days_text: String,

    /// File name of the output archive.
    #[serde(default = "default_archive_name")]
    pub archive_name: String,

    /// Whether to append the row id to generated file names.
    #[serde(default)]
    pub unique_ids: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            date_text: default_date_text(),
            days_text: default_days_text(),
            archive_name: default_archive_name(),
            unique_ids: false,
        }
    }
}

fn default_date_text() -> String {
    "24 de febrero de 2026".into()
}
fn default_days_text() -> String {
    "TUESDAY TO FRIDAY".into()
}
fn default_archive_name() -> String {
    "coursedocs.zip".into()
}

/// `[anchor]` section.
///
/// The anchor is the regex that locates the course start date inside template
/// paragraphs. Templates in circulation carry a literal date, so the default
/// matches that wording; newer templates can ship their own pattern here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnchorConfig {
    /// Regex matched against each paragraph; the first match is replaced
    /// with `date_text`.
    #[serde(default = "default_anchor_pattern")]
    pub pattern: String,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            pattern: default_anchor_pattern(),
        }
    }
}

fn default_anchor_pattern() -> String {
    r"(?i)24 de \w+ de 2025".into()
}

// ---------------------------------------------------------------------------
// Generate options (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Runtime options for one generation batch, merged from config file + CLI
/// flags.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Replacement text for the date anchor.
    pub date_text: String,
    /// Days text prepended to the raw schedule in `{{SCHEDULE}}`.
    pub days_text: String,
    /// Regex locating the date anchor in template paragraphs.
    pub anchor_pattern: String,
    /// Whether to append the row id to generated file names.
    pub unique_ids: bool,
}

impl From<&AppConfig> for GenerateOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            date_text: config.defaults.date_text.clone(),
            days_text: config.defaults.days_text.clone(),
            anchor_pattern: config.anchor.pattern.clone(),
            unique_ids: config.defaults.unique_ids,
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.coursedocs/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CourseDocsError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.coursedocs/coursedocs.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| CourseDocsError::io(path, e))?;

    toml::from_str(&content).map_err(|e| {
        CourseDocsError::config(format!("failed to parse {}: {e}", path.display()))
    })
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| CourseDocsError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| CourseDocsError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| CourseDocsError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}
