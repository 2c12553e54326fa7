//! Checks of the local mirror against the archive's naming rules and sizes
//!
//! The remote feed occasionally files data under the wrong year (most
//! notably 2012 headers turning up in other years). Those files, and any
//! leftovers that are not data files at all, are "out of place". A separate
//! check compares local sizes with the sizes the server reports.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::client::ArchiveClient;
use crate::app::local::inventory::{has_data_extension, list_files, year_dirs};
use crate::app::models::{file_name_from_url, FileDate, TargetMap};

/// Why a file does not belong where it is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutOfPlaceReason {
    /// Not a `.nc` file
    NotDataFile,
    /// A `.nc` file whose name does not decode to a date
    UnrecognizedName,
    /// A data file dated in another year
    WrongYear { found: i32 },
}

impl fmt::Display for OutOfPlaceReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutOfPlaceReason::NotDataFile => write!(f, "not a data file"),
            OutOfPlaceReason::UnrecognizedName => write!(f, "unrecognized file name"),
            OutOfPlaceReason::WrongYear { found } => write!(f, "dated {}", found),
        }
    }
}

/// A file found in a year directory it does not belong to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutOfPlaceFile {
    /// Year of the directory holding the file
    pub year: i32,
    /// Full path of the file
    pub path: PathBuf,
    /// What is wrong with it
    pub reason: OutOfPlaceReason,
}

/// Decide whether a file name belongs in the directory for `year`
pub fn classify(year: i32, path: &Path) -> Option<OutOfPlaceReason> {
    if !has_data_extension(path) {
        return Some(OutOfPlaceReason::NotDataFile);
    }
    let name = path.file_name().and_then(|name| name.to_str())?;
    match FileDate::parse(name) {
        Ok(date) if date.year() == year => None,
        Ok(date) => Some(OutOfPlaceReason::WrongYear { found: date.year() }),
        Err(_) => Some(OutOfPlaceReason::UnrecognizedName),
    }
}

/// Every out-of-place file under `data_dir`, by year then name
pub async fn find_out_of_place(data_dir: &Path) -> io::Result<Vec<OutOfPlaceFile>> {
    let mut found = Vec::new();
    for (year, year_dir) in year_dirs(data_dir).await? {
        info!("Checking {}", year);
        for path in list_files(&year_dir).await? {
            if let Some(reason) = classify(year, &path) {
                debug!("{} is out of place: {}", path.display(), reason);
                found.push(OutOfPlaceFile { year, path, reason });
            }
        }
    }
    Ok(found)
}

/// Delete `paths`, or only report them when `dry_run` is set
///
/// Returns how many files were (or would have been) removed. A file that
/// vanished in the meantime is not an error.
pub async fn remove_files<'a, I>(paths: I, dry_run: bool) -> io::Result<usize>
where
    I: IntoIterator<Item = &'a Path>,
{
    let mut removed = 0;
    for path in paths {
        if dry_run {
            info!("Would remove {}", path.display());
            removed += 1;
            continue;
        }
        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                info!("Removed {}", path.display());
                removed += 1;
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(e),
        }
    }
    Ok(removed)
}

/// A local file whose size disagrees with the server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SizeMismatch {
    /// Local path
    pub path: PathBuf,
    /// Size on disk
    pub local: u64,
    /// Size the server reports
    pub remote: u64,
}

/// Outcome of a size check over the target map
#[derive(Debug, Clone, Default)]
pub struct SizeReport {
    /// Local files compared against the server
    pub files_checked: usize,
    /// Local files that match
    pub files_matching: usize,
    /// Targets with no local copy (not requested)
    pub files_missing: usize,
    /// Local files of the wrong size
    pub mismatched: Vec<SizeMismatch>,
    /// Local files whose remote size could not be determined
    pub unknown: Vec<PathBuf>,
    /// Whether the check stopped early on cancellation
    pub cancelled: bool,
}

impl SizeReport {
    /// Paths of the files whose size is wrong
    pub fn mismatched_paths(&self) -> impl Iterator<Item = &Path> + '_ {
        self.mismatched.iter().map(|m| m.path.as_path())
    }
}

/// Compares local copies of the targets with the remote sizes
pub struct SizeValidator<'a> {
    client: &'a ArchiveClient,
    delay: Duration,
    cancel: CancellationToken,
}

impl<'a> SizeValidator<'a> {
    /// Create a validator pausing `delay` after every remote request
    pub fn new(client: &'a ArchiveClient, delay: Duration, cancel: CancellationToken) -> Self {
        Self {
            client,
            delay,
            cancel,
        }
    }

    /// Check every target that has a local copy under `data_dir`
    pub async fn check(&self, targets: &TargetMap, data_dir: &Path) -> SizeReport {
        let mut report = SizeReport::default();

        for (year, urls) in targets.iter() {
            let year_dir = data_dir.join(year.to_string());
            for url in urls {
                if self.cancel.is_cancelled() {
                    report.cancelled = true;
                    return report;
                }
                let Some(name) = file_name_from_url(url) else {
                    continue;
                };
                let path = year_dir.join(name);

                let local = match tokio::fs::metadata(&path).await {
                    Ok(metadata) if metadata.is_file() => metadata.len(),
                    _ => {
                        report.files_missing += 1;
                        continue;
                    }
                };

                report.files_checked += 1;
                match self.client.remote_size(url).await {
                    Ok(Some(remote)) if remote == local => report.files_matching += 1,
                    Ok(Some(remote)) => {
                        warn!(
                            "{}: local size {} but remote size {}",
                            path.display(),
                            local,
                            remote
                        );
                        report.mismatched.push(SizeMismatch {
                            path,
                            local,
                            remote,
                        });
                    }
                    Ok(None) => {
                        warn!("{}: remote size unknown", path.display());
                        report.unknown.push(path);
                    }
                    Err(e) => {
                        warn!("{}: could not get remote size: {}", path.display(), e);
                        report.unknown.push(path);
                    }
                }

                self.pause().await;
            }
        }

        report
    }

    async fn pause(&self) {
        if self.delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = tokio::time::sleep(self.delay) => {}
            _ = self.cancel.cancelled() => {}
        }
    }
}
