//! Target discovery from the remote archive index
//!
//! The archive is a plain HTML directory listing: the root lists one
//! `YYYY/` directory per year and each year directory lists its data files.
//! Discovery scrapes both levels, keeps the data file links in lexical (and
//! therefore chronological) order and drops any file whose encoded date
//! belongs to a different year than the directory it was listed under.

use scraper::{Html, Selector};
use tracing::{debug, info, warn};
use url::Url;

use crate::app::client::ArchiveClient;
use crate::app::models::{is_data_file_name, FileDate, TargetMap};
use crate::constants::selectors;
use crate::errors::{DiscoveryError, DiscoveryResult};

/// Scraper for the year-indexed archive listing
pub struct TargetDiscovery<'a> {
    client: &'a ArchiveClient,
}

impl<'a> TargetDiscovery<'a> {
    /// Create a discovery pass using `client` for all page fetches
    pub fn new(client: &'a ArchiveClient) -> Self {
        Self { client }
    }

    /// Build the year to URL-list mapping for the archive at `base_url`
    ///
    /// Years whose listing contains no valid files still appear with an
    /// empty list.
    ///
    /// # Errors
    ///
    /// Returns `DiscoveryError::Fetch` if the root or any year page cannot be
    /// retrieved. Discovery never returns a partial map.
    pub async fn discover(&self, base_url: &Url) -> DiscoveryResult<TargetMap> {
        info!("Scraping targets from {}", base_url);

        let mut years: Vec<i32> = self
            .scrape_links(base_url)
            .await?
            .iter()
            .filter_map(|href| year_from_link(href))
            .collect();
        years.sort_unstable();
        years.dedup();
        debug!("Found {} year directories", years.len());

        let mut targets = TargetMap::new();
        for year in years {
            let year_url = join_url(base_url, &format!("{}/", year))?;
            let names: Vec<String> = self
                .scrape_links(&year_url)
                .await?
                .into_iter()
                .filter(|href| is_data_file_name(href))
                .collect();
            let urls = resolve_year_targets(&year_url, year, names)?;
            debug!("Year {}: {} targets", year, urls.len());
            targets.insert(year, urls);
        }

        info!(
            "Discovered {} data files across {} years",
            targets.file_count(),
            targets.year_count()
        );
        Ok(targets)
    }

    async fn scrape_links(&self, url: &Url) -> DiscoveryResult<Vec<String>> {
        info!("Scraping for links: {}", url);
        let html = self
            .client
            .get_page(url)
            .await
            .map_err(|source| DiscoveryError::Fetch {
                url: url.to_string(),
                source,
            })?;
        extract_links(&html)
    }
}

/// All anchor `href` values in document order
pub fn extract_links(html: &str) -> DiscoveryResult<Vec<String>> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(selectors::LINK_SELECTOR).map_err(|_| DiscoveryError::InvalidSelector {
            selector: selectors::LINK_SELECTOR.to_string(),
        })?;

    Ok(document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .map(str::to_string)
        .collect())
}

/// Year of a directory link of the form `YYYY/...`
pub fn year_from_link(href: &str) -> Option<i32> {
    let bytes = href.as_bytes();
    if bytes.len() < 5 || bytes[4] != b'/' || !bytes[..4].iter().all(u8::is_ascii_digit) {
        return None;
    }
    href[..4].parse().ok()
}

/// Sort, resolve and validate the data file names listed for one year
///
/// Names that do not decode as a data file, or whose encoded year differs
/// from `year`, are dropped.
pub fn resolve_year_targets(
    year_url: &Url,
    year: i32,
    mut names: Vec<String>,
) -> DiscoveryResult<Vec<Url>> {
    names.sort();
    names.dedup();

    let mut urls = Vec::with_capacity(names.len());
    for name in names {
        let url = join_url(year_url, &name)?;
        match FileDate::from_url(&url) {
            Ok(date) if date.year() == year => urls.push(url),
            Ok(date) => warn!(
                "Dropping {}: dated {} but listed under {}",
                url, date, year
            ),
            Err(e) => debug!("Dropping {}: {}", url, e),
        }
    }
    Ok(urls)
}

fn join_url(base: &Url, reference: &str) -> DiscoveryResult<Url> {
    base.join(reference).map_err(|e| DiscoveryError::InvalidUrl {
        url: format!("{}{}", base, reference),
        error: e.to_string(),
    })
}
