//! Application constants for SST Fetcher
//!
//! This module centralizes all constants used throughout the application,
//! organized by functional domain for maintainability and clarity.

use std::time::Duration;

/// Environment variable names for configuration overrides
pub mod env {
    /// Overrides the remote archive index URL
    pub const BASE_URL: &str = "SST_FETCHER_BASE_URL";

    /// Overrides the local data directory
    pub const DATA_DIR: &str = "SST_FETCHER_DATA_DIR";

    /// Overrides the target cache directory
    pub const CACHE_DIR: &str = "SST_FETCHER_CACHE_DIR";
}

/// HTTP client configuration constants
pub mod http {
    use super::Duration;

    /// Default user agent for all HTTP requests
    pub const USER_AGENT: &str = "SST-Fetcher/0.1.0 (Climate Research Tool)";

    /// Whole-request timeout for index pages and HEAD requests, and the wait
    /// for response headers on downloads
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(600);

    /// Longest silence tolerated while streaming a download body
    pub const READ_TIMEOUT: Duration = Duration::from_secs(120);

    /// Connection establishment timeout
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

    /// Connection pool idle timeout
    pub const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);

    /// Maximum idle connections per host in pool
    pub const POOL_MAX_PER_HOST: usize = 2;
}

/// Rate limiting and retry configuration
pub mod limits {
    /// Default request rate limit (requests per second)
    pub const DEFAULT_RATE_LIMIT_RPS: u32 = 5;

    /// Maximum retry attempts for failed requests
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (milliseconds)
    pub const RETRY_BASE_DELAY_MS: u64 = 1000;
}

/// NOAA archive location and dataset naming
pub mod noaa {
    /// Index of the WHOI sea surface temperature archive, one directory per year
    pub const BASE_URL: &str = "https://www.ncei.noaa.gov/data/sea-surface-temperature-whoi/access/";

    /// Prefix shared by every data file in the archive
    pub const FILE_PREFIX: &str = "SEAFLUX-OSB-CDR";

    /// Fixed product tag between the prefix and the encoded date
    pub const PRODUCT_TAG: &str = "_V02R00_SST_D";

    /// Separator before the eight-digit creation date
    pub const CREATION_TAG: &str = "_C";

    /// Extension of every data file in the archive
    pub const FILE_EXTENSION: &str = ".nc";
}

/// CSS selectors for the archive index pages
pub mod selectors {
    /// Every anchor that links somewhere
    pub const LINK_SELECTOR: &str = "a[href]";
}

/// File operation constants
pub mod files {
    /// Suffix marking in-flight downloads, followed by a unique tag
    pub const TEMP_FILE_SUFFIX: &str = "_tmp";

    /// File name of the serialized target map inside the cache directory
    pub const TARGETS_CACHE_FILE: &str = "targets.json";

    /// Application directory name under OS cache/config directories
    pub const APP_DIR_NAME: &str = "sst_fetcher";

    /// Configuration file name
    pub const CONFIG_FILE_NAME: &str = "config.toml";

    /// Default local data directory
    pub const DEFAULT_DATA_DIR: &str = "data";

    /// Streaming write chunk size (5MB)
    pub const DOWNLOAD_CHUNK_SIZE: usize = 5 * 1024 * 1024;
}

/// Transfer engine defaults
pub mod transfer {
    use super::Duration;

    /// Politeness delay applied after every file, whatever its outcome
    pub const DEFAULT_INTER_REQUEST_DELAY: Duration = Duration::from_millis(100);
}

/// Progress reporting
pub mod progress {
    /// Width of the bar in characters
    pub const BAR_WIDTH: usize = 50;

    /// Character used for the filled part of the bar
    pub const FILL_CHAR: char = '#';

    /// Unit label used in raw counter mode
    pub const DEFAULT_UNIT: &str = "Bytes";

    /// Width of the blanking pass in raw counter mode
    pub const RAW_CLEAR_WIDTH: usize = 100;
}

/// Human-readable size units, smallest first
pub const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

// Re-export commonly used constants for convenience
pub use files::{TARGETS_CACHE_FILE, TEMP_FILE_SUFFIX};
pub use http::{DEFAULT_TIMEOUT as HTTP_TIMEOUT, USER_AGENT};
pub use limits::{DEFAULT_RATE_LIMIT_RPS, MAX_RETRIES, RETRY_BASE_DELAY_MS};
pub use noaa::BASE_URL as NOAA_BASE_URL;
