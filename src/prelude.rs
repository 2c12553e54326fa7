//! Prelude module for SST Fetcher Library
//!
//! Re-exports the items needed for typical library usage with a single
//! `use sst_fetcher::prelude::*;` statement.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sst_fetcher::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let client = Arc::new(ArchiveClient::from_base_str(NOAA_BASE_URL, ClientConfig::default())?);
//!     let cache = TargetCache::new(&CacheConfig::default())?;
//!     let engine = TransferEngine::new(client, TransferConfig::default());
//!
//!     let summary = engine.run_session(&cache, true).await?;
//!     println!("{}", summary);
//!     Ok(())
//! }
//! ```

// Core result types
pub use crate::errors::{AppError, Result};

pub use crate::app::{
    ArchiveClient, CacheConfig, ClientConfig, FileDate, LocalInventory, TargetCache,
    TargetDiscovery, TargetMap, TransferConfig, TransferEngine, TransferSummary,
};

// Commonly used constants
pub use crate::constants::{NOAA_BASE_URL, USER_AGENT};

// Standard library re-exports that are commonly needed
pub use std::path::{Path, PathBuf};
pub use std::sync::Arc;

pub use tokio;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prelude_imports() {
        let _cache_config = CacheConfig::default();
        let _transfer_config = TransferConfig::default();
        let _client_config = ClientConfig::default();
        assert!(USER_AGENT.contains("SST-Fetcher"));
    }

    #[tokio::test]
    async fn test_prelude_integration_pattern() {
        use tempfile::TempDir;

        let temp_dir = TempDir::new().unwrap();
        let cache = TargetCache::new(&CacheConfig::with_cache_dir(temp_dir.path().to_path_buf()))
            .unwrap();
        assert!(cache.load().await.unwrap().is_none());

        let client =
            Arc::new(ArchiveClient::from_base_str(NOAA_BASE_URL, ClientConfig::default()).unwrap());
        let engine = TransferEngine::new(client, TransferConfig::default());
        assert_eq!(engine.config().dest_root, PathBuf::from("data"));
    }
}
