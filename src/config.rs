//! Configuration management for SST Fetcher
//!
//! Settings are layered: built-in defaults, then a TOML config file, then
//! environment variables (a `.env` file is honoured), then CLI arguments.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use url::Url;

use crate::app::{CacheConfig, ClientConfig, TransferConfig};
use crate::constants::{env, files, http, limits, noaa};
use crate::errors::{ConfigError, ConfigResult};

/// Unified application configuration for TOML serialization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Remote archive and HTTP client settings
    pub client: ClientConfigToml,
    /// Destination, pacing and progress display
    pub transfer: TransferConfig,
    /// Target cache location
    pub cache: CacheConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// TOML-friendly client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfigToml {
    /// Root of the archive index
    pub base_url: String,
    /// Timeout for index pages and HEAD requests, and for download headers
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Longest gap between body chunks while streaming a download
    #[serde(with = "humantime_serde")]
    pub read_timeout: Duration,
    /// Connect timeout
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
    /// Maximum idle connections per host
    pub pool_max_per_host: usize,
    /// Rate limit (requests per second)
    pub rate_limit_rps: u32,
    /// Retries for connection errors, 429 and 503
    pub max_retries: u32,
    /// Base delay for exponential backoff
    #[serde(with = "humantime_serde")]
    pub retry_base_delay: Duration,
}

impl Default for ClientConfigToml {
    fn default() -> Self {
        Self {
            base_url: noaa::BASE_URL.to_string(),
            request_timeout: http::DEFAULT_TIMEOUT,
            read_timeout: http::READ_TIMEOUT,
            connect_timeout: http::CONNECT_TIMEOUT,
            pool_max_per_host: http::POOL_MAX_PER_HOST,
            rate_limit_rps: limits::DEFAULT_RATE_LIMIT_RPS,
            max_retries: limits::MAX_RETRIES,
            retry_base_delay: Duration::from_millis(limits::RETRY_BASE_DELAY_MS),
        }
    }
}

impl ClientConfigToml {
    /// Convert to runtime ClientConfig
    pub fn to_runtime_config(&self) -> ClientConfig {
        ClientConfig {
            request_timeout: self.request_timeout,
            read_timeout: self.read_timeout,
            connect_timeout: self.connect_timeout,
            pool_max_per_host: self.pool_max_per_host,
            rate_limit_rps: self.rate_limit_rps,
            max_retries: self.max_retries,
            retry_base_delay: self.retry_base_delay,
            ..ClientConfig::default()
        }
    }

    /// Parsed archive root
    pub fn base_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidValue {
            field: "client.base_url".to_string(),
            value: self.base_url.clone(),
            reason: e.to_string(),
        })
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level used when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl LoggingConfig {
    /// Parsed default level
    pub fn default_level(&self) -> ConfigResult<tracing::Level> {
        self.level
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                field: "logging.level".to_string(),
                value: self.level.clone(),
                reason: "Expected one of error, warn, info, debug, trace".to_string(),
            })
    }
}

impl AppConfig {
    /// Load configuration with multi-source precedence:
    /// 1. Default values
    /// 2. Config file (if exists)
    /// 3. Environment variables
    ///
    /// CLI arguments are applied on top by the command handlers.
    pub async fn load(config_file_override: Option<&Path>) -> ConfigResult<Self> {
        let config_path = match config_file_override {
            Some(path) => Some(path.to_path_buf()),
            None => Self::find_config_file(),
        };

        let mut config = match config_path {
            Some(path) if path.exists() => Self::load_from_file(&path).await?,
            Some(path) if config_file_override.is_some() => {
                return Err(ConfigError::NotFound { path })
            }
            _ => Self::default(),
        };

        config.apply_overrides_from(|key| std::env::var(key).ok())?;
        config.client.base_url()?;
        config.logging.default_level()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup such as the process environment
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(env::BASE_URL) {
            Url::parse(&value).map_err(|e| ConfigError::InvalidValue {
                field: env::BASE_URL.to_string(),
                value: value.clone(),
                reason: e.to_string(),
            })?;
            debug!("Base URL overridden from environment: {}", value);
            self.client.base_url = value;
        }

        if let Some(value) = lookup(env::DATA_DIR) {
            debug!("Data directory overridden from environment: {}", value);
            self.transfer.dest_root = PathBuf::from(value);
        }

        if let Some(value) = lookup(env::CACHE_DIR) {
            debug!("Cache directory overridden from environment: {}", value);
            self.cache.cache_dir = Some(PathBuf::from(value));
        }

        Ok(())
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut search_paths = vec![PathBuf::from("./sst_fetcher.toml")];
        if let Some(path) = Self::default_config_path() {
            search_paths.push(path);
        }

        for path in search_paths {
            if path.exists() {
                debug!("Found config file: {}", path.display());
                return Some(path);
            }
        }

        debug!("No config file found in standard locations");
        None
    }

    /// Default config file path for the current user
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(files::APP_DIR_NAME).join(files::CONFIG_FILE_NAME))
    }

    /// Load configuration from a TOML file
    async fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;

        let config: AppConfig = toml::from_str(&content)?;

        info!("Loaded configuration from: {}", path.display());
        Ok(config)
    }
}
