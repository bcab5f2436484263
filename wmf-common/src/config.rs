//! Configuration loading and root folder resolution
//!
//! Root folder priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable (`WMF_ROOT_FOLDER`, then `WMF_ROOT`)
//! 3. TOML config file (`root_folder` key)
//! 4. OS-dependent compiled default (fallback)
//!
//! A missing or unreadable TOML file never aborts startup: the caller gets the
//! compiled defaults and a warning is logged.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Database file name inside the root folder
pub const DATABASE_FILE_NAME: &str = "wmf.db";

/// Remote feature config year id used when the TOML file does not name one
pub const DEFAULT_TARGET_CONFIG_YEAR_ID: &str = "2024.1";

/// Report year used for entry point checks when the TOML file does not name one
pub const DEFAULT_REPORT_YEAR: i32 = 2024;

/// Logging section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive (overridden by `RUST_LOG`)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Optional log file path; stdout when absent
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            log_file: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// MediaWiki API client section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaWikiConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Replaces the per-project `api.php` URL (local mirrors, tests)
    #[serde(default)]
    pub api_url_override: Option<String>,
}

impl Default for MediaWikiConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
            api_url_override: None,
        }
    }
}

fn default_user_agent() -> String {
    format!("WMF-YiR/{} (https://github.com/wikimedia)", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_secs() -> u64 {
    30
}

/// Year in Review section of the TOML config
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearInReviewConfig {
    #[serde(default = "default_target_config_year_id")]
    pub target_config_year_id: String,
    #[serde(default = "default_report_year")]
    pub report_year: i32,
}

impl Default for YearInReviewConfig {
    fn default() -> Self {
        Self {
            target_config_year_id: default_target_config_year_id(),
            report_year: default_report_year(),
        }
    }
}

fn default_target_config_year_id() -> String {
    DEFAULT_TARGET_CONFIG_YEAR_ID.to_string()
}

fn default_report_year() -> i32 {
    DEFAULT_REPORT_YEAR
}

/// Contents of a module TOML file (`~/.config/wmf/<module>.toml`)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub mediawiki: MediaWikiConfig,
    #[serde(default)]
    pub year_in_review: YearInReviewConfig,
}

impl TomlConfig {
    /// Load config from an explicit path, or the module's default location.
    ///
    /// Falls back to defaults (with a warning) when no file is found or it
    /// fails to parse.
    pub fn load_or_default(module_name: &str, explicit_path: Option<&Path>) -> Self {
        let path = match explicit_path {
            Some(path) => path.to_path_buf(),
            None => match config_file_path(module_name) {
                Some(path) => path,
                None => {
                    debug!(module = module_name, "No config file found, using defaults");
                    return Self::default();
                }
            },
        };

        match load_toml_config(&path) {
            Ok(config) => {
                debug!("Loaded config from {}", path.display());
                config
            }
            Err(e) => {
                warn!("Using default configuration: {}", e);
                Self::default()
            }
        }
    }
}

/// Parse a TOML config file
///
/// Fails with `NotFound` when the file does not exist.
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
        _ => Error::Config(format!("Read {} failed: {}", path.display(), e)),
    })?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Write a TOML config file atomically (temp file + rename)
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let tmp_path = path.with_extension("toml.tmp");
    std::fs::write(&tmp_path, content)?;
    std::fs::rename(&tmp_path, path)?;

    Ok(())
}

/// Locate an existing config file for the module
///
/// Linux checks `~/.config/wmf/<module>.toml` then `/etc/wmf/<module>.toml`;
/// other platforms only check the user config directory.
pub fn config_file_path(module_name: &str) -> Option<PathBuf> {
    let file_name = format!("{}.toml", module_name);

    let user_config = dirs::config_dir().map(|d| d.join("wmf").join(&file_name));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/wmf").join(&file_name);
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}

/// Compiled platform defaults
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub root_folder: PathBuf,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        Self {
            root_folder: default_root_folder(),
            log_level: default_log_level(),
        }
    }
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/wmf (or /var/lib/wmf for system-wide)
        dirs::data_local_dir()
            .map(|d| d.join("wmf"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/wmf"))
    } else if cfg!(target_os = "macos") {
        // ~/Library/Application Support/wmf
        dirs::data_dir()
            .map(|d| d.join("wmf"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/wmf"))
    } else if cfg!(target_os = "windows") {
        // %LOCALAPPDATA%\wmf
        dirs::data_local_dir()
            .map(|d| d.join("wmf"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\wmf"))
    } else {
        PathBuf::from("./wmf_data")
    }
}

/// Resolves the root folder following the documented priority order
pub struct RootFolderResolver {
    module_name: String,
    cli_arg: Option<PathBuf>,
    toml_root: Option<PathBuf>,
}

impl RootFolderResolver {
    pub fn new(module_name: &str) -> Self {
        Self {
            module_name: module_name.to_string(),
            cli_arg: None,
            toml_root: None,
        }
    }

    /// Command-line override (priority 1)
    pub fn with_cli_arg(mut self, path: Option<PathBuf>) -> Self {
        self.cli_arg = path;
        self
    }

    /// Already-loaded TOML config (priority 3); skips the file lookup
    pub fn with_toml_config(mut self, config: &TomlConfig) -> Self {
        self.toml_root = config.root_folder.clone();
        self
    }

    pub fn resolve(&self) -> PathBuf {
        if let Some(path) = &self.cli_arg {
            return path.clone();
        }

        if let Ok(path) = std::env::var("WMF_ROOT_FOLDER") {
            return PathBuf::from(path);
        }
        if let Ok(path) = std::env::var("WMF_ROOT") {
            return PathBuf::from(path);
        }

        if let Some(path) = &self.toml_root {
            return path.clone();
        }
        if let Some(path) = TomlConfig::load_or_default(&self.module_name, None).root_folder {
            return path;
        }

        CompiledDefaults::for_current_platform().root_folder
    }
}

/// Creates the root folder and locates the database inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder (and parents) if missing; idempotent
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder)?;
        Ok(())
    }

    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE_NAME)
    }

    pub fn database_exists(&self) -> bool {
        self.database_path().exists()
    }
}
