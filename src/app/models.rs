//! Data models for SST Fetcher
//!
//! This module defines the core data structures used throughout the application:
//! the calendar date encoded in archive file names and the year-indexed map of
//! download targets.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::constants::noaa;
use crate::errors::NotADataFile;

/// Calendar date decoded from an archive file name
///
/// File names follow a fixed grammar:
///
/// ```text
/// SEAFLUX-OSB-CDR_V02R00_SST_D{YYYY}{MM}{DD}_C{8 digits}.nc
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileDate(NaiveDate);

impl FileDate {
    /// Decode the date embedded in a data file name
    ///
    /// The whole name must match the grammar exactly (case-sensitive). A name
    /// that does not match, or whose digits do not form a real calendar date,
    /// is reported as [`NotADataFile`].
    ///
    /// # Example
    ///
    /// ```rust
    /// use sst_fetcher::app::models::FileDate;
    ///
    /// let date = FileDate::parse("SEAFLUX-OSB-CDR_V02R00_SST_D19880101_C20170525.nc").unwrap();
    /// assert_eq!((date.year(), date.month(), date.day()), (1988, 1, 1));
    /// ```
    pub fn parse(file_name: &str) -> Result<Self, NotADataFile> {
        let reject = || NotADataFile {
            name: file_name.to_string(),
        };

        let rest = file_name
            .strip_prefix(noaa::FILE_PREFIX)
            .and_then(|s| s.strip_prefix(noaa::PRODUCT_TAG))
            .and_then(|s| s.strip_suffix(noaa::FILE_EXTENSION))
            .ok_or_else(reject)?;

        // {YYYYMMDD}_C{CCCCCCCC}
        let (date_digits, creation) = rest.split_once(noaa::CREATION_TAG).ok_or_else(reject)?;
        if date_digits.len() != 8 || !is_ascii_digits(date_digits) {
            return Err(reject());
        }
        if creation.len() != 8 || !is_ascii_digits(creation) {
            return Err(reject());
        }

        let year: i32 = date_digits[0..4].parse().map_err(|_| reject())?;
        let month: u32 = date_digits[4..6].parse().map_err(|_| reject())?;
        let day: u32 = date_digits[6..8].parse().map_err(|_| reject())?;

        NaiveDate::from_ymd_opt(year, month, day)
            .map(Self)
            .ok_or_else(reject)
    }

    /// Decode the date from the last path segment of a URL
    pub fn from_url(url: &Url) -> Result<Self, NotADataFile> {
        match file_name_from_url(url) {
            Some(name) => Self::parse(name),
            None => Err(NotADataFile {
                name: url.to_string(),
            }),
        }
    }

    /// Four-digit year
    pub fn year(&self) -> i32 {
        self.0.year()
    }

    /// Month, 1-12
    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// Day of month, 1-31
    pub fn day(&self) -> u32 {
        self.0.day()
    }
}

impl fmt::Display for FileDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

fn is_ascii_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Whether a link name looks like an archive data file (prefix and extension only)
pub fn is_data_file_name(name: &str) -> bool {
    name.starts_with(noaa::FILE_PREFIX) && name.ends_with(noaa::FILE_EXTENSION)
}

/// Last non-empty path segment of a URL, the local file name of a target
pub fn file_name_from_url(url: &Url) -> Option<&str> {
    url.path_segments()?
        .filter(|segment| !segment.is_empty())
        .last()
}

/// Year-indexed download targets
///
/// Years are iterated in increasing order; each year's URLs keep the order
/// they were inserted in, which discovery guarantees to be lexical (and so
/// chronological) file name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetMap {
    years: BTreeMap<i32, Vec<Url>>,
}

impl TargetMap {
    /// Create an empty target map
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the target list for a year, replacing any previous list
    pub fn insert(&mut self, year: i32, urls: Vec<Url>) {
        self.years.insert(year, urls);
    }

    /// Targets for one year
    pub fn get(&self, year: i32) -> Option<&[Url]> {
        self.years.get(&year).map(Vec::as_slice)
    }

    /// Years present in the map, ascending
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// Iterate `(year, targets)` pairs in ascending year order
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[Url])> + '_ {
        self.years.iter().map(|(year, urls)| (*year, urls.as_slice()))
    }

    /// Number of years, including years with no targets
    pub fn year_count(&self) -> usize {
        self.years.len()
    }

    /// Total number of targets across all years
    pub fn file_count(&self) -> usize {
        self.years.values().map(Vec::len).sum()
    }

    /// Whether the map has no years at all
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }
}

impl FromIterator<(i32, Vec<Url>)> for TargetMap {
    fn from_iter<T: IntoIterator<Item = (i32, Vec<Url>)>>(iter: T) -> Self {
        Self {
            years: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "SEAFLUX-OSB-CDR_V02R00_SST_D20190315_C20190601.nc";

    #[test]
    fn test_parse_valid_file_name() {
        let date = FileDate::parse(VALID).unwrap();
        assert_eq!(date.year(), 2019);
        assert_eq!(date.month(), 3);
        assert_eq!(date.day(), 15);
        assert_eq!(date.to_string(), "2019-03-15");
    }

    #[test]
    fn test_parse_round_trips_digits() {
        for (y, m, d) in [(1988, 1, 1), (2000, 2, 29), (2012, 12, 31), (2021, 7, 9)] {
            let name = format!(
                "SEAFLUX-OSB-CDR_V02R00_SST_D{:04}{:02}{:02}_C20220101.nc",
                y, m, d
            );
            let date = FileDate::parse(&name).unwrap();
            assert_eq!((date.year(), date.month(), date.day()), (y, m, d));
        }
    }

    #[test]
    fn test_parse_rejects_malformed_names() {
        let bad = [
            "",
            "index.html",
            "seaflux-osb-cdr_V02R00_SST_D20190315_C20190601.nc",
            "SEAFLUX-OSB-CDR_V02R00_SST_D20190315_C20190601.NC",
            "SEAFLUX-OSB-CDR_V02R00_SST_D2019031_C20190601.nc",
            "SEAFLUX-OSB-CDR_V02R00_SST_D201903155_C20190601.nc",
            "SEAFLUX-OSB-CDR_V02R00_SST_D2019O315_C20190601.nc",
            "SEAFLUX-OSB-CDR_V02R00_SST_D20190315_C2019060.nc",
            "SEAFLUX-OSB-CDR_V02R00_SST_D20190315_C20190601.nc.md5",
            "SEAFLUX-OSB-CDR_V02R00_SST_D20190315.nc",
            "SEAFLUX-OSB-CDR_V01R00_SST_D20190315_C20190601.nc",
            "XSEAFLUX-OSB-CDR_V02R00_SST_D20190315_C20190601.nc",
        ];
        for name in bad {
            let err = FileDate::parse(name).unwrap_err();
            assert_eq!(err.name, name);
        }
    }

    #[test]
    fn test_parse_rejects_impossible_dates() {
        assert!(FileDate::parse("SEAFLUX-OSB-CDR_V02R00_SST_D20191301_C20190601.nc").is_err());
        assert!(FileDate::parse("SEAFLUX-OSB-CDR_V02R00_SST_D20190230_C20190601.nc").is_err());
        assert!(FileDate::parse("SEAFLUX-OSB-CDR_V02R00_SST_D20190100_C20190601.nc").is_err());
    }

    #[test]
    fn test_from_url_uses_last_segment() {
        let url = Url::parse(&format!("https://example.com/access/2019/{}", VALID)).unwrap();
        assert_eq!(FileDate::from_url(&url).unwrap().year(), 2019);

        let dir = Url::parse("https://example.com/access/2019/").unwrap();
        assert!(FileDate::from_url(&dir).is_err());
    }

    #[test]
    fn test_is_data_file_name() {
        assert!(is_data_file_name(VALID));
        assert!(is_data_file_name("SEAFLUX-OSB-CDR_anything.nc"));
        assert!(!is_data_file_name("../"));
        assert!(!is_data_file_name("SEAFLUX-OSB-CDR_V02R00_SST_D20190315_C20190601.nc.md5"));
    }

    #[test]
    fn test_target_map_counts_and_order() {
        let url = |name: &str| Url::parse(&format!("https://example.com/{}", name)).unwrap();
        let map: TargetMap = vec![
            (2020, vec![url("c.nc")]),
            (2019, vec![url("a.nc"), url("b.nc")]),
            (2021, vec![]),
        ]
        .into_iter()
        .collect();

        assert_eq!(map.year_count(), 3);
        assert_eq!(map.file_count(), 3);
        assert_eq!(map.years().collect::<Vec<_>>(), vec![2019, 2020, 2021]);
        assert_eq!(map.get(2019).unwrap()[1].as_str(), "https://example.com/b.nc");
        assert_eq!(map.get(2021).unwrap().len(), 0);
    }

    #[test]
    fn test_target_map_json_shape() {
        let mut map = TargetMap::new();
        map.insert(
            2019,
            vec![Url::parse("https://example.com/2019/a.nc").unwrap()],
        );
        let json = serde_json::to_string(&map).unwrap();
        assert_eq!(json, r#"{"2019":["https://example.com/2019/a.nc"]}"#);

        let back: TargetMap = serde_json::from_str(&json).unwrap();
        assert_eq!(back, map);
    }
}
