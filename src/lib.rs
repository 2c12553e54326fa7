//! SST Fetcher Library
//!
//! A Rust library for mirroring the NOAA WHOI sea surface temperature archive.
//! Discovers targets from the year-indexed archive listing, caches them, and
//! downloads files sequentially with size validation, atomic writes and a
//! fixed politeness delay.

pub mod app;
pub mod cli;
pub mod config;
pub mod constants;
pub mod errors;
pub mod prelude;

// Re-export commonly used types for convenience
pub use errors::{AppError, Result};

#[cfg(test)]
mod tests {
    use super::*;
    use constants::*;

    #[test]
    fn test_constants_accessible() {
        assert_eq!(TARGETS_CACHE_FILE, "targets.json");
        assert_eq!(DEFAULT_RATE_LIMIT_RPS, 5);
        assert!(USER_AGENT.contains("SST-Fetcher"));
        assert!(NOAA_BASE_URL.ends_with('/'));
    }

    #[test]
    fn test_error_types() {
        let cache_error = errors::CacheError::DirectoryNotAccessible {
            path: std::path::PathBuf::from("/nowhere"),
        };
        let app_error = AppError::Cache(cache_error);

        assert_eq!(app_error.category(), "cache");
        assert!(!app_error.is_recoverable());
    }
}
