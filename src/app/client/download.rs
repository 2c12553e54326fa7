//! File download operations with atomic writes and streaming
//!
//! A download streams the response body into a uniquely named sibling
//! temporary file and renames it onto the destination only after the whole
//! announced length has been received. On any failure the temporary file is
//! removed and the destination is left exactly as it was.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use reqwest::Response;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::app::client::http::{declared_content_length, HttpHandler};
use crate::app::coordinator::progress::ProgressReporter;
use crate::app::coordinator::stats::format_size;
use crate::constants::files;
use crate::errors::{DownloadError, DownloadResult};

/// Per-download behaviour
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Bytes buffered between disk writes and progress redraws
    pub chunk_size: usize,
    /// Draw the progress bar on stdout
    pub show_progress: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            chunk_size: files::DOWNLOAD_CHUNK_SIZE,
            show_progress: true,
        }
    }
}

/// File download operations handler
pub struct DownloadHandler<'a> {
    http_handler: &'a HttpHandler,
}

impl<'a> DownloadHandler<'a> {
    /// Creates a new DownloadHandler with the given HTTP handler
    pub fn new(http_handler: &'a HttpHandler) -> Self {
        Self { http_handler }
    }

    /// Streams `url` to `destination` atomically, returning the bytes written
    ///
    /// The size check happens before anything touches the disk: a response
    /// without a Content-Length, or one too large to describe, fails the file
    /// without creating a temporary file.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The request fails or the server answers with an error status
    /// - The size cannot be determined or is too large
    /// - The stream breaks or ends short of the announced length
    /// - File I/O or the final rename fails
    /// - `cancel` fires while the body is streaming
    pub async fn download_file(
        &self,
        url: &Url,
        destination: &Path,
        options: &DownloadOptions,
        cancel: &CancellationToken,
    ) -> DownloadResult<u64> {
        if cancel.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }

        let response = self.http_handler.get_response(url).await?;

        let size =
            declared_content_length(&response).ok_or_else(|| DownloadError::SizeIndeterminate {
                url: url.to_string(),
            })?;
        let size_str = format_size(size).ok_or(DownloadError::FileTooLarge { size })?;
        info!("Downloading: {}", size_str.trim_start());

        let temp_path = temp_path_for(destination);
        let result = self
            .stream_to_temp(response, &temp_path, size, options, cancel)
            .await;

        match result {
            Ok(bytes) => {
                if let Err(e) = tokio::fs::rename(&temp_path, destination).await {
                    warn!(
                        "Failed to move {} into place: {}",
                        temp_path.display(),
                        e
                    );
                    remove_temp_file(&temp_path).await;
                    return Err(DownloadError::AtomicOperationFailed {
                        temp_path,
                        final_path: destination.to_path_buf(),
                    });
                }
                debug!("Moved {} to {}", temp_path.display(), destination.display());
                Ok(bytes)
            }
            Err(e) => {
                remove_temp_file(&temp_path).await;
                Err(e)
            }
        }
    }

    /// Writes the body to `temp_path`, checking it matches `expected` bytes
    async fn stream_to_temp(
        &self,
        response: Response,
        temp_path: &Path,
        expected: u64,
        options: &DownloadOptions,
        cancel: &CancellationToken,
    ) -> DownloadResult<u64> {
        let mut file = File::create(temp_path).await?;

        let out: Box<dyn Write + Send> = if options.show_progress {
            Box::new(io::stdout())
        } else {
            Box::new(io::sink())
        };
        let mut reporter = ProgressReporter::for_bytes(expected, out);

        let streamed = stream_to_file(
            &mut file,
            response,
            &mut reporter,
            options.chunk_size,
            self.http_handler.read_timeout(),
            cancel,
        )
        .await;
        if let Err(e) = reporter.done() {
            debug!("Progress display error: {}", e);
        }
        let received = streamed?;

        if received != expected {
            return Err(DownloadError::IncompleteDownload { received, expected });
        }

        file.sync_all().await?;
        Ok(received)
    }
}

/// Streams the response body to `file`, feeding the running total to `reporter`
///
/// Fails with `DownloadError::Timeout` when no chunk arrives within
/// `read_timeout`.
async fn stream_to_file<W: Write>(
    file: &mut File,
    response: Response,
    reporter: &mut ProgressReporter<W>,
    chunk_size: usize,
    read_timeout: Duration,
    cancel: &CancellationToken,
) -> DownloadResult<u64> {
    let url = response.url().to_string();
    let mut writer = BufWriter::with_capacity(chunk_size, file);
    let mut stream = response.bytes_stream();
    let mut written: u64 = 0;
    let mut reported: u64 = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
            next = tokio::time::timeout(read_timeout, stream.next()) => next,
        };
        let next = next.map_err(|_| DownloadError::Timeout {
            url: url.clone(),
            timeout: read_timeout,
        })?;
        let chunk = match next {
            Some(chunk) => chunk?,
            None => break,
        };

        writer.write_all(&chunk).await?;
        written += chunk.len() as u64;

        if written - reported >= chunk_size as u64 {
            redraw(reporter, written);
            reported = written;
        }
    }

    // Ensure all data is flushed to disk
    writer.flush().await?;
    redraw(reporter, written);

    Ok(written)
}

fn redraw<W: Write>(reporter: &mut ProgressReporter<W>, value: u64) {
    if let Err(e) = reporter.update(value) {
        debug!("Progress display error: {}", e);
    }
}

/// Sibling path for an in-flight download of `destination`
///
/// The name carries the process id and a random tag so it cannot collide
/// with an unrelated file or with another process writing the same target.
pub fn temp_path_for(destination: &Path) -> PathBuf {
    let file_name = destination
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "download".to_string());
    let temp_name = format!(
        "{}{}.{}.{:08x}",
        file_name,
        files::TEMP_FILE_SUFFIX,
        std::process::id(),
        fastrand::u32(..)
    );
    destination.with_file_name(temp_name)
}

async fn remove_temp_file(temp_path: &Path) {
    match tokio::fs::remove_file(temp_path).await {
        Ok(()) => debug!("Removed temporary file {}", temp_path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!(
            "Failed to remove temporary file {}: {}",
            temp_path.display(),
            e
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_path_is_sibling() {
        let dest = Path::new("/data/2019/SEAFLUX-OSB-CDR_V02R00_SST_D20190101_C20190301.nc");
        let temp = temp_path_for(dest);
        assert_eq!(temp.parent(), dest.parent());

        let name = temp.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("SEAFLUX-OSB-CDR_V02R00_SST_D20190101_C20190301.nc_tmp."));
        assert!(name.contains(&std::process::id().to_string()));
        assert!(!name.ends_with(".nc"));
    }

    #[test]
    fn test_temp_paths_are_unique() {
        let dest = Path::new("/data/2019/file.nc");
        let names: std::collections::HashSet<_> = (0..64).map(|_| temp_path_for(dest)).collect();
        assert!(names.len() > 1);
    }

    #[test]
    fn test_default_options() {
        let options = DownloadOptions::default();
        assert_eq!(options.chunk_size, files::DOWNLOAD_CHUNK_SIZE);
        assert!(options.show_progress);
    }
}
