//! Configuration system using TOML files.
//!
//! Config is stored in the OS-standard config directory:
//! - Windows: %APPDATA%\mirror-fetch\config.toml
//! - macOS: ~/Library/Application Support/mirror-fetch/config.toml
//! - Linux: ~/.config/mirror-fetch/config.toml
//!
//! The config file is human-readable and editable. Any section or field may
//! be omitted; missing values fall back to defaults. Command-line flags
//! override what is loaded here.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::model::MirrorEndpoint;

/// Application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Mirror endpoints
    pub mirrors: MirrorsConfig,

    /// Resolver settings
    pub resolver: ResolverConfig,

    /// Download pipeline settings
    pub download: DownloadConfig,

    /// Catalog query defaults
    pub catalog: CatalogConfig,

    /// Audit trail files
    pub audit: AuditConfig,
}

/// Mirror endpoints to resolve against
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorsConfig {
    /// Base URLs, e.g. "https://mirror.example"
    pub endpoints: Vec<String>,
}

impl Default for MirrorsConfig {
    fn default() -> Self {
        Self {
            endpoints: vec![
                "https://triton.squid.wtf".to_string(),
                "https://api.tidalhifi.com".to_string(),
                "https://tidal.sharkr.dev".to_string(),
            ],
        }
    }
}

impl MirrorsConfig {
    /// Endpoints as typed values, blanks dropped.
    pub fn endpoints(&self) -> Vec<MirrorEndpoint> {
        self.endpoints
            .iter()
            .map(|url| url.trim())
            .filter(|url| !url.is_empty())
            .map(MirrorEndpoint::new)
            .collect()
    }
}

/// Resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Per-request timeout for mirror calls
    pub request_timeout_secs: u64,

    /// Audio tier requested in the manifest fetch
    pub quality: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 5,
            quality: crate::mirror::client::DEFAULT_QUALITY.to_string(),
        }
    }
}

impl ResolverConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Download pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Where audio files are written
    pub output_dir: PathBuf,

    /// Pause after a rate-limited download before retrying the same track
    pub rate_limit_pause_secs: u64,

    /// Retries of one track after rate limiting before giving up on it
    pub max_rate_limit_retries: u32,

    /// Lower bound of the random pause between processed tracks
    pub min_delay_ms: u64,

    /// Upper bound of the random pause between processed tracks
    pub max_delay_ms: u64,

    /// Give up on a download when no data arrives for this long
    pub stall_timeout_secs: u64,
}

impl DownloadConfig {
    pub fn stall_timeout(&self) -> Duration {
        Duration::from_secs(self.stall_timeout_secs)
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("downloads"),
            rate_limit_pause_secs: 30,
            max_rate_limit_retries: 3,
            min_delay_ms: 2000,
            max_delay_ms: 5000,
            stall_timeout_secs: 30,
        }
    }
}

/// Catalog query defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Genres to select when none are given on the command line
    pub genres: Vec<String>,

    /// Maximum number of tracks (0 = no limit)
    pub limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            genres: crate::catalog::DEFAULT_GENRES
                .iter()
                .map(|g| g.to_string())
                .collect(),
            limit: 100,
        }
    }
}

/// Audit trail files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// Timestamped session log
    pub log_file: PathBuf,

    /// Per-track CSV ledger
    pub ledger_file: PathBuf,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            log_file: PathBuf::from("download_log.txt"),
            ledger_file: PathBuf::from("track_mapping.csv"),
        }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("mirror-fetch"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from an explicit file
///
/// Unlike [`load`], a missing or invalid file is an error.
pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
    toml::from_str(&contents).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))
}

/// Save configuration to the default location
///
/// Creates the config directory if it doesn't exist.
pub fn save(config: &Config) -> Result<PathBuf, ConfigError> {
    let dir = config_dir().ok_or(ConfigError::NoConfigDir)?;
    save_to(config, &dir.join("config.toml"))
}

/// Save configuration to an explicit file
pub fn save_to(config: &Config, path: &Path) -> Result<PathBuf, ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|e| ConfigError::CreateDir(dir.to_path_buf(), e))?;
    }

    // Serialize to pretty TOML
    let contents = toml::to_string_pretty(config).map_err(ConfigError::Serialize)?;

    // Write atomically (write to temp, then rename)
    let temp_path = path.with_extension("toml.tmp");
    std::fs::write(&temp_path, &contents).map_err(|e| ConfigError::Write(temp_path.clone(), e))?;
    std::fs::rename(&temp_path, path)
        .map_err(|e| ConfigError::Rename(temp_path, path.to_path_buf(), e))?;

    tracing::info!("Saved config to {:?}", path);
    Ok(path.to_path_buf())
}

// ============================================================================
// Error Types
// ============================================================================

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("Failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),

    #[error("Failed to create config directory {0}: {1}")]
    CreateDir(PathBuf, std::io::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(toml::ser::Error),

    #[error("Failed to write config to {0}: {1}")]
    Write(PathBuf, std::io::Error),

    #[error("Failed to rename temp file {0} to {1}: {2}")]
    Rename(PathBuf, PathBuf, std::io::Error),
}

// ============================================================================
// Tests
// ============================================================================
