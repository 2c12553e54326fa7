//! Target cache configuration and location resolution

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

/// Configuration for the target cache
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Directory holding the cache file (OS-specific if None)
    pub cache_dir: Option<PathBuf>,
    /// File name of the serialized target map
    pub file_name: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            cache_dir: None, // Will use OS-specific cache directory
            file_name: files::TARGETS_CACHE_FILE.to_string(),
        }
    }
}

impl CacheConfig {
    /// Create a configuration rooted at an explicit directory
    pub fn with_cache_dir(cache_dir: PathBuf) -> Self {
        Self {
            cache_dir: Some(cache_dir),
            ..Default::default()
        }
    }

    /// Directory the cache file lives in
    ///
    /// - Linux: ~/.cache/sst_fetcher
    /// - macOS: ~/Library/Caches/sst_fetcher
    /// - Windows: %LOCALAPPDATA%/sst_fetcher
    pub fn resolve_dir(&self) -> CacheResult<PathBuf> {
        if let Some(dir) = &self.cache_dir {
            return Ok(dir.clone());
        }
        dirs::cache_dir()
            .map(|dir| dir.join(files::APP_DIR_NAME))
            .ok_or_else(|| CacheError::DirectoryNotAccessible {
                path: PathBuf::from("system cache directory"),
            })
    }

    /// Full path of the cache file
    pub fn resolve_path(&self) -> CacheResult<PathBuf> {
        Ok(self.resolve_dir()?.join(&self.file_name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CacheConfig::default();
        assert_eq!(config.cache_dir, None);
        assert_eq!(config.file_name, "targets.json");
    }

    #[test]
    fn test_explicit_dir_wins() {
        let config = CacheConfig::with_cache_dir(PathBuf::from("/tmp/sst"));
        assert_eq!(config.resolve_dir().unwrap(), PathBuf::from("/tmp/sst"));
        assert_eq!(
            config.resolve_path().unwrap(),
            PathBuf::from("/tmp/sst/targets.json")
        );
    }

    #[test]
    fn test_default_dir_is_app_scoped() {
        if let Ok(dir) = CacheConfig::default().resolve_dir() {
            assert!(dir.ends_with("sst_fetcher"));
        }
    }
}
