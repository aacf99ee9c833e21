//! Configuration loading and resolution
//!
//! Every value the core consumes is resolved once at startup into an
//! [`InsightsConfig`] and passed to constructors. Priority per field:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const ENV_BASE_URI: &str = "AQUA_BASE_URI";
pub const ENV_API_KEY: &str = "AQUA_API_KEY";
pub const ENV_API_KEY_HEADER: &str = "AQUA_API_KEY_HEADER";
pub const ENV_NAMESPACE: &str = "AQUA_NAMESPACE";
pub const ENV_ASSESSMENT_ID: &str = "AQUA_ASSESSMENT_ID";
pub const ENV_ROOT_FOLDER: &str = "AQUA_ROOT_FOLDER";
pub const ENV_CACHE_MAX_AGE_SECS: &str = "AQUA_CACHE_MAX_AGE_SECS";
pub const ENV_PORT: &str = "AQUA_PORT";

/// Compiled defaults
pub const DEFAULT_BASE_URI: &str = "https://fxmhfbayk4.us-east-1.awsapprunner.com/v2";
pub const DEFAULT_API_KEY_HEADER: &str = "api_key";
pub const DEFAULT_NAMESPACE: &str = "aqua";
pub const DEFAULT_PERSISTENCE_VERSION: u32 = 1;
pub const DEFAULT_PORT: u16 = 5790;

/// How long persisted result sets stay valid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Entries live until explicitly evicted
    #[default]
    UntilEvicted,
    /// Entries older than the given age are refetched
    MaxAge(Duration),
}

impl CachePolicy {
    /// 0 means no expiry
    pub fn from_max_age_secs(secs: u64) -> Self {
        if secs == 0 {
            CachePolicy::UntilEvicted
        } else {
            CachePolicy::MaxAge(Duration::from_secs(secs))
        }
    }
}

/// Logging section of the TOML file
///
/// `level` is either a bare level (`warn`) applied to the service, or a full
/// `RUST_LOG`-style directive string. `RUST_LOG` itself takes precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// On-disk configuration file. Every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    #[serde(default)]
    pub logging: LoggingConfig,
    pub base_uri: Option<String>,
    pub api_key: Option<String>,
    pub api_key_header: Option<String>,
    pub namespace: Option<String>,
    pub assessment_id: Option<u32>,
    pub cache_max_age_secs: Option<u64>,
    pub port: Option<u16>,
}

/// Values supplied on the command line
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub root_folder: Option<PathBuf>,
    pub base_uri: Option<String>,
    pub api_key: Option<String>,
    pub api_key_header: Option<String>,
    pub namespace: Option<String>,
    pub assessment_id: Option<u32>,
    pub cache_max_age_secs: Option<u64>,
    pub port: Option<u16>,
}

/// Fully resolved configuration handed to the core at construction time
#[derive(Debug, Clone)]
pub struct InsightsConfig {
    /// Remote base address, no trailing slash
    pub base_uri: String,
    /// Name of the credential header sent with every remote request
    pub api_key_header: String,
    pub api_key: String,
    /// Persistence namespace
    pub namespace: String,
    pub persistence_version: u32,
    /// Assessment shown by the interactive session
    pub assessment_id: Option<u32>,
    pub cache_policy: CachePolicy,
    pub root_folder: PathBuf,
    pub port: u16,
}

impl InsightsConfig {
    /// Resolve from overrides, environment, TOML and compiled defaults
    pub fn resolve(overrides: &ConfigOverrides, toml_config: &TomlConfig) -> Result<Self> {
        let base_uri = overrides
            .base_uri
            .clone()
            .or_else(|| env_string(ENV_BASE_URI))
            .or_else(|| toml_config.base_uri.clone())
            .unwrap_or_else(|| DEFAULT_BASE_URI.to_string());

        let api_key = overrides
            .api_key
            .clone()
            .or_else(|| env_string(ENV_API_KEY))
            .or_else(|| toml_config.api_key.clone())
            .filter(|key| is_valid_key(key))
            .ok_or_else(|| {
                Error::Config(format!(
                    "API key not configured. Please configure using one of:\n\
                     1. Command line: --api-key <key>\n\
                     2. Environment: {}=<key>\n\
                     3. TOML config: {} (api_key = \"<key>\")",
                    ENV_API_KEY,
                    default_config_path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "aqua-insights.toml".to_string())
                ))
            })?;

        let api_key_header = overrides
            .api_key_header
            .clone()
            .filter(|header| is_valid_key(header))
            .or_else(|| env_string(ENV_API_KEY_HEADER))
            .or_else(|| toml_config.api_key_header.clone())
            .unwrap_or_else(|| DEFAULT_API_KEY_HEADER.to_string());

        let namespace = overrides
            .namespace
            .clone()
            .or_else(|| env_string(ENV_NAMESPACE))
            .or_else(|| toml_config.namespace.clone())
            .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

        let assessment_id = match overrides.assessment_id {
            Some(id) => Some(id),
            None => match env_string(ENV_ASSESSMENT_ID) {
                Some(raw) => Some(raw.parse::<u32>().map_err(|e| {
                    Error::Config(format!("{} is not a number: {}", ENV_ASSESSMENT_ID, e))
                })?),
                None => toml_config.assessment_id,
            },
        };

        let max_age_secs = match overrides.cache_max_age_secs {
            Some(secs) => Some(secs),
            None => match env_string(ENV_CACHE_MAX_AGE_SECS) {
                Some(raw) => Some(raw.parse::<u64>().map_err(|e| {
                    Error::Config(format!("{} is not a number: {}", ENV_CACHE_MAX_AGE_SECS, e))
                })?),
                None => toml_config.cache_max_age_secs,
            },
        };

        let port = match overrides.port {
            Some(port) => port,
            None => match env_string(ENV_PORT) {
                Some(raw) => raw.parse::<u16>().map_err(|e| {
                    Error::Config(format!("{} is not a port number: {}", ENV_PORT, e))
                })?,
                None => toml_config.port.unwrap_or(DEFAULT_PORT),
            },
        };

        let root_folder = resolve_root_folder(overrides.root_folder.as_deref(), toml_config);

        Ok(Self {
            base_uri: base_uri.trim_end_matches('/').to_string(),
            api_key_header,
            api_key,
            namespace,
            persistence_version: DEFAULT_PERSISTENCE_VERSION,
            assessment_id,
            cache_policy: CachePolicy::from_max_age_secs(max_age_secs.unwrap_or(0)),
            root_folder,
            port,
        })
    }

    /// SQLite file backing the persistent cache
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join("aqua-insights.db")
    }
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Root folder: CLI → ENV → TOML → platform default
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: &TomlConfig) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Some(path) = env_string(ENV_ROOT_FOLDER) {
        return PathBuf::from(path);
    }

    if let Some(path) = &toml_config.root_folder {
        return path.clone();
    }

    get_default_root_folder()
}

/// `~/.config/aqua/aqua-insights.toml` (platform equivalent elsewhere)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("aqua").join("aqua-insights.toml"))
}

/// Read the TOML config; `Ok(None)` when the file does not exist
///
/// Callers treat an `Err` as "use defaults" after reporting it.
pub fn read_toml_config(path: &Path) -> Result<Option<TomlConfig>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    toml::from_str::<TomlConfig>(&content)
        .map(Some)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}

/// Get OS-dependent default root folder path
fn get_default_root_folder() -> PathBuf {
    if cfg!(target_os = "linux") {
        // ~/.local/share/aqua
        dirs::data_local_dir()
            .map(|d| d.join("aqua"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/aqua"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("aqua"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/aqua"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("aqua"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\aqua"))
    } else {
        PathBuf::from("./aqua_data")
    }
}
