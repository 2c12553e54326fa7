//! Scan of the local mirror
//!
//! The mirror layout is `data_dir/<YYYY>/<file>.nc`. Anything else under the
//! data directory is ignored.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::debug;

use crate::constants::noaa;

/// Local data files grouped by year directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalInventory {
    years: BTreeMap<i32, Vec<PathBuf>>,
}

impl LocalInventory {
    /// List the `.nc` files in every year directory of `data_dir`
    ///
    /// A missing data directory yields an empty inventory. Files are sorted by
    /// name within each year, which is chronological order for archive files.
    pub async fn scan(data_dir: &Path) -> io::Result<Self> {
        let mut years = BTreeMap::new();

        for (year, year_dir) in year_dirs(data_dir).await? {
            let files = list_files(&year_dir)
                .await?
                .into_iter()
                .filter(|path| has_data_extension(path))
                .collect::<Vec<_>>();
            debug!("{}: {} local files", year_dir.display(), files.len());
            years.insert(year, files);
        }

        Ok(Self { years })
    }

    /// Files for one year
    pub fn get(&self, year: i32) -> Option<&[PathBuf]> {
        self.years.get(&year).map(Vec::as_slice)
    }

    /// Years with a directory, ascending
    pub fn years(&self) -> impl Iterator<Item = i32> + '_ {
        self.years.keys().copied()
    }

    /// Iterate `(year, files)` pairs in ascending year order
    pub fn iter(&self) -> impl Iterator<Item = (i32, &[PathBuf])> + '_ {
        self.years.iter().map(|(year, files)| (*year, files.as_slice()))
    }

    /// Total number of local data files
    pub fn file_count(&self) -> usize {
        self.years.values().map(Vec::len).sum()
    }
}

/// Year of a directory named exactly four ASCII digits
pub fn year_from_dir_name(name: &str) -> Option<i32> {
    if name.len() == 4 && name.bytes().all(|b| b.is_ascii_digit()) {
        name.parse().ok()
    } else {
        None
    }
}

/// Year directories directly under `data_dir`, ascending by year
pub(crate) async fn year_dirs(data_dir: &Path) -> io::Result<Vec<(i32, PathBuf)>> {
    let mut entries = match fs::read_dir(data_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut dirs = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        if let Some(year) = entry.file_name().to_str().and_then(year_from_dir_name) {
            dirs.push((year, entry.path()));
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Regular files directly in `dir`, sorted by path
pub(crate) async fn list_files(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

pub(crate) fn has_data_extension(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.ends_with(noaa::FILE_EXTENSION))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_year_from_dir_name() {
        assert_eq!(year_from_dir_name("2019"), Some(2019));
        assert_eq!(year_from_dir_name("201"), None);
        assert_eq!(year_from_dir_name("20190"), None);
        assert_eq!(year_from_dir_name("year"), None);
    }

    #[tokio::test]
    async fn test_scan_missing_dir_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let inventory = LocalInventory::scan(&temp_dir.path().join("absent"))
            .await
            .unwrap();
        assert_eq!(inventory.file_count(), 0);
    }

    #[tokio::test]
    async fn test_scan_groups_and_sorts() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("2019")).unwrap();
        std::fs::create_dir_all(root.join("2020")).unwrap();
        std::fs::create_dir_all(root.join("plots")).unwrap();
        std::fs::write(root.join("2019/b.nc"), b"b").unwrap();
        std::fs::write(root.join("2019/a.nc"), b"a").unwrap();
        std::fs::write(root.join("2019/notes.txt"), b"x").unwrap();
        std::fs::write(root.join("plots/c.nc"), b"c").unwrap();

        let inventory = LocalInventory::scan(root).await.unwrap();
        assert_eq!(inventory.years().collect::<Vec<_>>(), vec![2019, 2020]);
        assert_eq!(
            inventory.get(2019).unwrap(),
            &[root.join("2019/a.nc"), root.join("2019/b.nc")]
        );
        assert!(inventory.get(2020).unwrap().is_empty());
        assert_eq!(inventory.file_count(), 2);
    }
}
