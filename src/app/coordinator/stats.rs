//! Transfer statistics tracking and reporting
//!
//! This module holds the per-run counters mutated by the transfer engine and
//! the summary printed when a run ends, along with the human-readable size
//! formatting shared by progress output and summaries.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::SIZE_UNITS;

/// Format a byte count with a binary unit, e.g. `" 1.5 MB"`
///
/// Returns `None` when the value does not fit below 1024 of the largest unit.
pub fn format_size(bytes: u64) -> Option<String> {
    let mut size = bytes as f64;
    for unit in SIZE_UNITS {
        if size >= 1024.0 {
            size /= 1024.0;
        } else {
            return Some(format!("{:4.1} {}", size, unit));
        }
    }
    None
}

/// A file that could not be transferred during a run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedTransfer {
    /// Remote URL of the target
    pub url: String,
    /// Local destination the file would have been written to
    pub destination: PathBuf,
    /// Error description
    pub reason: String,
}

/// Counters for a single transfer run
///
/// Created at run start, only ever incremented, reported at the end.
#[derive(Debug, Clone)]
pub struct TransferState {
    total_files: usize,
    files_downloaded: usize,
    files_touched: usize,
    total_bytes: u64,
    failures: Vec<FailedTransfer>,
    started_at: DateTime<Utc>,
}

impl TransferState {
    /// Start tracking a run over `total_files` targets
    pub fn new(total_files: usize) -> Self {
        Self {
            total_files,
            files_downloaded: 0,
            files_touched: 0,
            total_bytes: 0,
            failures: Vec::new(),
            started_at: Utc::now(),
        }
    }

    /// A valid local copy was already present
    pub fn record_skipped(&mut self) {
        self.files_touched += 1;
    }

    /// A file was streamed and moved into place
    pub fn record_downloaded(&mut self, bytes: u64) {
        self.files_downloaded += 1;
        self.files_touched += 1;
        self.total_bytes += bytes;
    }

    /// A file failed; it counts as neither downloaded nor touched
    pub fn record_failed(&mut self, failure: FailedTransfer) {
        self.failures.push(failure);
    }

    /// Total targets in the run
    pub fn total_files(&self) -> usize {
        self.total_files
    }

    /// Files processed so far, whatever their outcome
    pub fn processed(&self) -> usize {
        self.files_touched + self.failures.len()
    }

    /// Freeze the counters into a summary
    pub fn finish(self, cancelled: bool) -> TransferSummary {
        let elapsed = Utc::now()
            .signed_duration_since(self.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        TransferSummary {
            total_files: self.total_files,
            files_downloaded: self.files_downloaded,
            files_touched: self.files_touched,
            files_failed: self.failures.len(),
            total_bytes: self.total_bytes,
            failures: self.failures,
            cancelled,
            started_at: self.started_at,
            elapsed,
        }
    }
}

/// Final result of a transfer run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferSummary {
    /// Targets in the map
    pub total_files: usize,
    /// Files newly downloaded in this run
    pub files_downloaded: usize,
    /// Files valid locally at the end of the run (downloaded or skipped)
    pub files_touched: usize,
    /// Files that failed
    pub files_failed: usize,
    /// Bytes streamed to disk in this run
    pub total_bytes: u64,
    /// Failed transfers, for manual retry
    pub failures: Vec<FailedTransfer>,
    /// Whether the run stopped early on cancellation
    pub cancelled: bool,
    /// Run start time
    pub started_at: DateTime<Utc>,
    /// Wall-clock duration of the run
    pub elapsed: Duration,
}

impl TransferSummary {
    /// Whether every target is valid locally
    pub fn is_complete(&self) -> bool {
        self.files_touched == self.total_files
    }

    /// Human-readable total data volume
    pub fn total_size_string(&self) -> String {
        format_size(self.total_bytes).unwrap_or_else(|| format!("{} B", self.total_bytes))
    }
}

impl fmt::Display for TransferSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Files downloaded: {}/{}",
            self.files_downloaded, self.total_files
        )?;
        writeln!(f, "Files touched: {}/{}", self.files_touched, self.total_files)?;
        if self.files_failed > 0 {
            writeln!(f, "Files failed: {}", self.files_failed)?;
        }
        if self.cancelled {
            writeln!(f, "Run cancelled before completion")?;
        }
        write!(f, "Total data: {}", self.total_size_string().trim_start())
    }
}
