//! Configuration for the transfer engine
//!
//! Controls where files land, how hard the remote server is hit and how
//! progress is shown.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::client::DownloadOptions;
use crate::constants::{files, transfer};

/// Configuration for a transfer run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Root of the local mirror; files land in `dest_root/<year>/<name>`
    pub dest_root: PathBuf,
    /// Pause after every file, whatever its outcome
    #[serde(with = "humantime_serde")]
    pub inter_request_delay: Duration,
    /// Streaming buffer size in bytes
    pub chunk_size: usize,
    /// Draw a progress bar for each download
    pub show_progress: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            dest_root: PathBuf::from(files::DEFAULT_DATA_DIR),
            inter_request_delay: transfer::DEFAULT_INTER_REQUEST_DELAY,
            chunk_size: files::DOWNLOAD_CHUNK_SIZE,
            show_progress: true,
        }
    }
}

impl TransferConfig {
    /// Set the mirror root
    pub fn with_dest_root(mut self, dest_root: impl Into<PathBuf>) -> Self {
        self.dest_root = dest_root.into();
        self
    }

    /// Set the pause applied after every file
    pub fn with_inter_request_delay(mut self, delay: Duration) -> Self {
        self.inter_request_delay = delay;
        self
    }

    /// Enable or disable the per-file progress bar
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.show_progress = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.chunk_size == 0 {
            return Err("Chunk size cannot be zero".to_string());
        }

        if self.dest_root.as_os_str().is_empty() {
            return Err("Destination directory cannot be empty".to_string());
        }

        Ok(())
    }

    /// Per-download options derived from this configuration
    pub fn download_options(&self) -> DownloadOptions {
        DownloadOptions {
            chunk_size: self.chunk_size,
            show_progress: self.show_progress,
        }
    }
}
