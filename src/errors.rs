//! Error types for SST Fetcher
//!
//! Errors are split by the phase that raises them. Discovery, cache and
//! configuration errors abort a run; download errors are caught at the
//! per-file boundary by the transfer engine and only fail that one file.
//! Filename decoding has its own non-fatal outcome ([`NotADataFile`]) that
//! callers treat as "exclude this entry".

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// A name that does not follow the archive's data file naming convention
///
/// This is an exclusion signal, not a fault. It is deliberately not
/// convertible into [`AppError`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Not a recognized data file: {name}")]
pub struct NotADataFile {
    /// The rejected name
    pub name: String,
}

/// Download and HTTP client errors
#[derive(Error, Debug)]
pub enum DownloadError {
    /// HTTP request error
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// I/O error during file operations
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid URL provided
    #[error("Invalid URL: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// Server returned error status
    #[error("Server error: HTTP {status}")]
    ServerError { status: u16 },

    /// Resource not found
    #[error("Not found: {url}")]
    NotFound { url: String },

    /// Rate limit exceeded
    #[error("Rate limit exceeded. Server responded with HTTP 429")]
    RateLimitExceeded,

    /// Server overloaded
    #[error("Server overloaded. Server responded with HTTP 503")]
    ServerOverloaded,

    /// Maximum retries exceeded
    #[error("Maximum retry attempts ({max_retries}) exceeded for request")]
    MaxRetriesExceeded { max_retries: u32 },

    /// The response carried no usable Content-Length
    #[error("File size could not be determined for {url}")]
    SizeIndeterminate { url: String },

    /// The size is beyond the largest unit the size formatter knows
    #[error("File too large: {size} bytes")]
    FileTooLarge { size: u64 },

    /// No response headers, or no body data, arrived in time
    #[error("Timed out after {timeout:?} waiting for {url}")]
    Timeout { url: String, timeout: Duration },

    /// Stream ended before the announced length was received
    #[error("Incomplete download: received {received} bytes, expected {expected} bytes")]
    IncompleteDownload { received: u64, expected: u64 },

    /// Atomic file operation failed
    #[error("Atomic file operation failed: could not rename {temp_path} to {final_path}")]
    AtomicOperationFailed {
        temp_path: PathBuf,
        final_path: PathBuf,
    },

    /// Rate limit configured as zero requests per second
    #[error("Invalid rate limit: {rps} requests per second")]
    InvalidRateLimit { rps: u32 },

    /// The run was cancelled while this file was in flight
    #[error("Transfer cancelled")]
    Cancelled,
}

/// Target discovery errors
#[derive(Error, Debug)]
pub enum DiscoveryError {
    /// An index page could not be fetched
    #[error("Failed to fetch index page {url}: {source}")]
    Fetch {
        url: String,
        #[source]
        source: DownloadError,
    },

    /// A link could not be resolved against its index page
    #[error("Invalid URL discovered: {url} - {error}")]
    InvalidUrl { url: String, error: String },

    /// CSS selector error
    #[error("Invalid CSS selector: {selector}")]
    InvalidSelector { selector: String },
}

/// Target cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache file exists but cannot be decoded
    #[error("Target cache corrupted at {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// Target map could not be encoded
    #[error("Failed to serialize target map: {0}")]
    Serialize(#[source] serde_json::Error),

    /// I/O error while reading or writing the cache
    #[error("Target cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No cache directory could be determined
    #[error("Cache directory not accessible: {path}")]
    DirectoryNotAccessible { path: PathBuf },
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    NotFound { path: PathBuf },

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration format
    #[error("Invalid configuration format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration value for {field}: {value}. {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}

/// Top-level application error that can represent any error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Download error
    #[error(transparent)]
    Download(#[from] DownloadError),

    /// Discovery error
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    /// Cache error
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Generic I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Generic application error with context
    #[error("Application error: {message}")]
    Generic { message: String },
}

impl AppError {
    /// Create a generic application error with a message
    pub fn generic(message: impl Into<String>) -> Self {
        Self::Generic {
            message: message.into(),
        }
    }

    /// Check if the error is recoverable (transient)
    pub fn is_recoverable(&self) -> bool {
        match self {
            AppError::Download(e) => e.is_transient(),
            AppError::Discovery(DiscoveryError::Fetch { source, .. }) => source.is_transient(),
            _ => false,
        }
    }

    /// Get error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            AppError::Download(_) => "download",
            AppError::Discovery(_) => "discovery",
            AppError::Cache(_) => "cache",
            AppError::Config(_) => "config",
            AppError::Io(_) => "io",
            AppError::Generic { .. } => "generic",
        }
    }
}

impl DownloadError {
    /// Whether retrying the same request later may succeed
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            DownloadError::Http(_)
                | DownloadError::RateLimitExceeded
                | DownloadError::ServerOverloaded
                | DownloadError::MaxRetriesExceeded { .. }
                | DownloadError::IncompleteDownload { .. }
                | DownloadError::Timeout { .. }
        )
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

/// Download result type alias
pub type DownloadResult<T> = std::result::Result<T, DownloadError>;

/// Discovery result type alias
pub type DiscoveryResult<T> = std::result::Result<T, DiscoveryError>;

/// Cache result type alias
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Config result type alias
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        let err = AppError::from(CacheError::DirectoryNotAccessible {
            path: PathBuf::from("/nowhere"),
        });
        assert_eq!(err.category(), "cache");
        assert!(!err.is_recoverable());

        let err = AppError::from(DownloadError::ServerOverloaded);
        assert_eq!(err.category(), "download");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_discovery_fetch_recoverability_follows_source() {
        let transient = AppError::from(DiscoveryError::Fetch {
            url: "https://example.com/".to_string(),
            source: DownloadError::RateLimitExceeded,
        });
        assert!(transient.is_recoverable());

        let permanent = AppError::from(DiscoveryError::Fetch {
            url: "https://example.com/".to_string(),
            source: DownloadError::NotFound {
                url: "https://example.com/".to_string(),
            },
        });
        assert!(!permanent.is_recoverable());
    }

    #[test]
    fn test_size_errors_are_not_transient() {
        assert!(!DownloadError::SizeIndeterminate {
            url: "https://example.com/a.nc".to_string()
        }
        .is_transient());
        assert!(!DownloadError::FileTooLarge { size: u64::MAX }.is_transient());
    }

    #[test]
    fn test_timeouts_are_transient() {
        let err = DownloadError::Timeout {
            url: "https://example.com/a.nc".to_string(),
            timeout: Duration::from_secs(120),
        };
        assert!(err.is_transient());
        assert!(err.to_string().contains("Timed out after 120s"));
    }
}
