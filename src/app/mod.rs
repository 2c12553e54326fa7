//! Core application logic for SST Fetcher
//!
//! This module contains the HTTP client, the file name codec and target
//! models, index discovery, the target cache, the transfer engine and the
//! local mirror checks.
//!
//! # Examples
//!
//! ```rust,no_run
//! use sst_fetcher::app::{ArchiveClient, ClientConfig, TargetDiscovery};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ArchiveClient::from_base_str(
//!     "https://www.ncei.noaa.gov/data/sea-surface-temperature-whoi/access/",
//!     ClientConfig::default(),
//! )?;
//!
//! let targets = TargetDiscovery::new(&client).discover(client.base_url()).await?;
//! for (year, urls) in targets.iter() {
//!     println!("{}: {} files", year, urls.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod client;
pub mod coordinator;
pub mod discovery;
pub mod local;
pub mod models;

// Re-export main public API
pub use cache::{CacheConfig, SaveOutcome, TargetCache};
pub use client::{ArchiveClient, ClientConfig, DownloadOptions};
pub use coordinator::{
    format_size, FailedTransfer, ProgressReporter, SignalHandler, TransferConfig, TransferEngine,
    TransferSummary,
};
pub use discovery::TargetDiscovery;
pub use local::{LocalInventory, SizeValidator};
pub use models::{FileDate, TargetMap};
