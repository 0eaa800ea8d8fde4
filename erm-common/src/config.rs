//! Bootstrap configuration and telemetry directory resolution
//!
//! Two-tier configuration:
//! 1. **TOML Bootstrap**: database path, telemetry directory, logging (read once at startup)
//! 2. **Runtime settings**: thresholds and the shadow-mode flag, see [`crate::settings`]
//!
//! # Telemetry Directory Priority
//!
//! 1. Command-line argument (highest priority)
//! 2. Environment variable `ERM_TELEMETRY_DIR`
//! 3. TOML config file (`telemetry_dir`)
//! 4. OS-dependent default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Environment variable overriding the telemetry directory
pub const TELEMETRY_DIR_ENV: &str = "ERM_TELEMETRY_DIR";

/// Bootstrap configuration loaded from TOML file
///
/// These settings cannot change during runtime.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Path to SQLite database holding the registry, decisions and settings
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Directory for comparison logs and the run summary
    #[serde(default)]
    pub telemetry_dir: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Load bootstrap configuration from a TOML file
///
/// A missing file yields defaults; a malformed file is an error.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file not found, using defaults");
        return Ok(TomlConfig::default());
    }

    let content = std::fs::read_to_string(path)?;
    let config: TomlConfig = toml::from_str(&content)?;

    if config.logging.level.trim().is_empty() {
        return Err(Error::Config("logging.level must not be empty".to_string()));
    }

    Ok(config)
}

/// Resolve the telemetry directory
pub fn resolve_telemetry_dir(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(TELEMETRY_DIR_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.telemetry_dir {
        return path.clone();
    }

    // Priority 4: OS-dependent default
    default_telemetry_dir()
}

/// OS-dependent default telemetry directory
fn default_telemetry_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("erm").join("telemetry"))
        .unwrap_or_else(|| PathBuf::from("./erm_data/telemetry"))
}

/// Write a file atomically (temp file + rename)
///
/// Readers see either the previous contents or the new contents, never a
/// partially written file. The parent directory is created if missing.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Not a file path: {}", path.display())))?;
    let mut temp_name = file_name.to_os_string();
    temp_name.push(".tmp");
    let temp_path = path.with_file_name(temp_name);

    {
        let mut file = std::fs::File::create(&temp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
    }

    if let Err(e) = std::fs::rename(&temp_path, path) {
        let _ = std::fs::remove_file(&temp_path);
        return Err(Error::Io(e));
    }

    Ok(())
}
