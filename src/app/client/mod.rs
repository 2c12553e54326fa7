//! HTTP client for the NOAA sea surface temperature archive
//!
//! The module is organized into specialized components:
//! - `config`: HTTP client configuration and building
//! - `http`: Core HTTP operations with rate limiting and retries
//! - `download`: Streamed file downloads with atomic writes

use std::path::Path;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::errors::{DownloadError, DownloadResult};

pub mod config;
pub mod download;
pub mod http;

pub use config::ClientConfig;
pub use download::{temp_path_for, DownloadOptions};

use download::DownloadHandler;
use http::HttpHandler;

/// HTTP client for the archive index and its data files
#[derive(Debug)]
pub struct ArchiveClient {
    http_handler: HttpHandler,
    base_url: Url,
}

impl ArchiveClient {
    /// Creates a client for the archive rooted at `base_url`
    ///
    /// A trailing slash is added to the base URL if missing so that year
    /// directories resolve beneath it.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if the HTTP client cannot be built or the rate
    /// limit is invalid
    pub fn new(base_url: Url, config: ClientConfig) -> DownloadResult<Self> {
        let client = config.build_http_client()?;
        let http_handler = HttpHandler::new(client, &config)?;
        let base_url = ensure_trailing_slash(base_url);

        tracing::debug!("Created archive client for {}", base_url);

        Ok(Self {
            http_handler,
            base_url,
        })
    }

    /// Creates a client from a base URL string
    pub fn from_base_str(base_url: &str, config: ClientConfig) -> DownloadResult<Self> {
        let url = Url::parse(base_url).map_err(|e| DownloadError::InvalidUrl {
            url: base_url.to_string(),
            error: e.to_string(),
        })?;
        Self::new(url, config)
    }

    /// Fetches the HTML content of an index page
    pub async fn get_page(&self, url: &Url) -> DownloadResult<String> {
        self.http_handler.get_page(url).await
    }

    /// Size of a remote file from a metadata-only request
    ///
    /// `Ok(None)` means the server did not say.
    pub async fn remote_size(&self, url: &Url) -> DownloadResult<Option<u64>> {
        self.http_handler.head_content_length(url).await
    }

    /// Streams a file to `destination` atomically, returning bytes written
    pub async fn download_file(
        &self,
        url: &Url,
        destination: &Path,
        options: &DownloadOptions,
        cancel: &CancellationToken,
    ) -> DownloadResult<u64> {
        DownloadHandler::new(&self.http_handler)
            .download_file(url, destination, options, cancel)
            .await
    }

    /// Root of the archive index
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }
}

fn ensure_trailing_slash(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}
