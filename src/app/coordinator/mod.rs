//! Transfer orchestration
//!
//! The engine walks the target map year by year and file by file. Each file
//! ends in exactly one of three states:
//!
//! - skipped: a local copy exists and its size matches the remote size
//! - downloaded: the file was streamed and atomically moved into place
//! - failed: the error is logged with its URL and destination, and the run
//!   moves on to the next file
//!
//! Transfers are strictly sequential and a fixed pause follows every file.
//!
//! - [`config`] - Destination, pacing and display settings
//! - [`stats`] - Run counters and the final summary
//! - [`progress`] - Single-line progress display
//! - [`signals`] - Signal handling for graceful shutdown
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use sst_fetcher::app::{ArchiveClient, CacheConfig, ClientConfig, TargetCache};
//! use sst_fetcher::app::coordinator::{TransferConfig, TransferEngine};
//! use sst_fetcher::constants::NOAA_BASE_URL;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(ArchiveClient::from_base_str(NOAA_BASE_URL, ClientConfig::default())?);
//! let cache = TargetCache::new(&CacheConfig::default())?;
//! let engine = TransferEngine::new(client, TransferConfig::default().with_dest_root("data"));
//!
//! let summary = engine.run_session(&cache, true).await?;
//! print!("{}", summary);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod progress;
pub mod signals;
pub mod stats;

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::app::cache::TargetCache;
use crate::app::client::ArchiveClient;
use crate::app::discovery::TargetDiscovery;
use crate::app::models::{file_name_from_url, FileDate, TargetMap};
use crate::errors::{AppError, ConfigError, DownloadError, DownloadResult, Result};

pub use config::TransferConfig;
pub use progress::{ProgressMode, ProgressReporter};
pub use signals::SignalHandler;
pub use stats::{format_size, FailedTransfer, TransferState, TransferSummary};

/// Terminal state of a file that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileOutcome {
    Skipped,
    Downloaded(u64),
}

/// Sequential, resumable mirror of a target map
pub struct TransferEngine {
    client: Arc<ArchiveClient>,
    config: TransferConfig,
    cancel: CancellationToken,
}

impl TransferEngine {
    /// Create an engine with its own cancellation token
    pub fn new(client: Arc<ArchiveClient>, config: TransferConfig) -> Self {
        Self::with_cancellation(client, config, CancellationToken::new())
    }

    /// Create an engine that stops when `cancel` fires
    pub fn with_cancellation(
        client: Arc<ArchiveClient>,
        config: TransferConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            config,
            cancel,
        }
    }

    /// Token that stops this engine's runs
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Engine configuration
    pub fn config(&self) -> &TransferConfig {
        &self.config
    }

    /// Load the target map from `cache`, or discover and cache it
    ///
    /// With `use_cache` false the cache is not read at all, which forces a
    /// fresh discovery. A discovered map always replaces the cached one.
    ///
    /// # Errors
    ///
    /// Discovery failures and cache failures (including a corrupt cache) are
    /// fatal for the run.
    pub async fn acquire_targets(&self, cache: &TargetCache, use_cache: bool) -> Result<TargetMap> {
        if use_cache {
            if let Some(map) = cache.load().await? {
                info!(
                    "Using cached targets from {} ({} files across {} years)",
                    cache.path().display(),
                    map.file_count(),
                    map.year_count()
                );
                return Ok(map);
            }
            info!("No target cache found, discovering targets");
        } else {
            info!("Ignoring target cache, discovering targets");
        }

        let map = TargetDiscovery::new(&self.client)
            .discover(self.client.base_url())
            .await?;
        cache.save(&map, true).await?;
        Ok(map)
    }

    /// Acquire targets and mirror them
    pub async fn run_session(&self, cache: &TargetCache, use_cache: bool) -> Result<TransferSummary> {
        let targets = self.acquire_targets(cache, use_cache).await?;
        self.run(&targets).await
    }

    /// Mirror every target in `targets` under the destination root
    ///
    /// Per-file errors never abort the run; they are logged and listed in
    /// the summary. Cancellation stops the run at the next file boundary, or
    /// mid-stream, and the summary reports it.
    ///
    /// # Errors
    ///
    /// Returns an error only for an invalid configuration or a year directory
    /// that cannot be created.
    pub async fn run(&self, targets: &TargetMap) -> Result<TransferSummary> {
        self.config.validate().map_err(|reason| {
            AppError::from(ConfigError::InvalidValue {
                field: "transfer".to_string(),
                value: format!("{:?}", self.config),
                reason,
            })
        })?;

        let total = targets.file_count();
        let mut state = TransferState::new(total);
        let mut index = 0;
        let mut cancelled = false;

        info!(
            "Starting transfer of {} files into {}",
            total,
            self.config.dest_root.display()
        );

        'years: for (year, urls) in targets.iter() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let year_dir = self.config.dest_root.join(year.to_string());
            tokio::fs::create_dir_all(&year_dir).await.map_err(|e| {
                error!("Failed to create {}: {}", year_dir.display(), e);
                AppError::Io(e)
            })?;
            debug!("Year {}: {} targets in {}", year, urls.len(), year_dir.display());

            for url in urls {
                if self.cancel.is_cancelled() {
                    warn!("Run cancelled before {}", url);
                    cancelled = true;
                    break 'years;
                }
                index += 1;

                let Some(name) = file_name_from_url(url) else {
                    error!(url = %url, "Target has no file name");
                    state.record_failed(FailedTransfer {
                        url: url.to_string(),
                        destination: year_dir.clone(),
                        reason: "URL has no file name".to_string(),
                    });
                    self.pause().await;
                    continue;
                };
                let destination = year_dir.join(name);

                let date = FileDate::from_url(url)
                    .map(|d| d.to_string())
                    .unwrap_or_else(|_| "unknown date".to_string());
                info!("File {}/{}: {} {}", index, total, date, url);
                info!("Destination: {}", destination.display());

                match self.process_file(url, &destination).await {
                    Ok(FileOutcome::Skipped) => {
                        info!("Already present and complete, skipping");
                        state.record_skipped();
                    }
                    Ok(FileOutcome::Downloaded(bytes)) => {
                        info!("Downloaded {} bytes", bytes);
                        state.record_downloaded(bytes);
                    }
                    Err(DownloadError::Cancelled) => {
                        warn!("Run cancelled during {}", url);
                        cancelled = true;
                        break 'years;
                    }
                    Err(e) => {
                        error!(
                            url = %url,
                            destination = %destination.display(),
                            "Failed to download: {}",
                            e
                        );
                        state.record_failed(FailedTransfer {
                            url: url.to_string(),
                            destination,
                            reason: e.to_string(),
                        });
                    }
                }
                debug!("{} of {} files processed", state.processed(), state.total_files());

                self.pause().await;
            }
        }

        let summary = state.finish(cancelled || self.cancel.is_cancelled());
        info!(
            "Transfer finished: {} downloaded, {} touched, {} failed of {}",
            summary.files_downloaded, summary.files_touched, summary.files_failed, summary.total_files
        );
        Ok(summary)
    }

    async fn process_file(&self, url: &Url, destination: &Path) -> DownloadResult<FileOutcome> {
        if self.has_valid_local_copy(url, destination).await {
            return Ok(FileOutcome::Skipped);
        }

        let bytes = self
            .client
            .download_file(url, destination, &self.config.download_options(), &self.cancel)
            .await?;
        Ok(FileOutcome::Downloaded(bytes))
    }

    /// A local copy is valid only if its size equals the remote size
    ///
    /// An unknown remote size makes the copy invalid.
    async fn has_valid_local_copy(&self, url: &Url, destination: &Path) -> bool {
        let local_size = match tokio::fs::metadata(destination).await {
            Ok(metadata) if metadata.is_file() => metadata.len(),
            _ => return false,
        };

        match self.client.remote_size(url).await {
            Ok(Some(remote_size)) if remote_size == local_size => true,
            Ok(Some(remote_size)) => {
                info!(
                    "Local size {} differs from remote size {}, downloading again",
                    local_size, remote_size
                );
                false
            }
            Ok(None) => {
                warn!("Remote size unknown for {}, downloading again", url);
                false
            }
            Err(e) => {
                warn!("Could not check remote size for {}: {}", url, e);
                false
            }
        }
    }

    /// Politeness delay, cut short by cancellation
    async fn pause(&self) {
        let delay = self.config.inter_request_delay;
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(delay) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}
