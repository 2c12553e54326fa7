//! Persistent store for the discovered target map
//!
//! The whole map is written as one JSON document. Writes go through a
//! sibling temporary file and a rename, so a reader never observes a
//! half-written cache.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{debug, error, info, warn};

use crate::app::cache::config::CacheConfig;
use crate::app::client::temp_path_for;
use crate::app::models::TargetMap;
use crate::errors::{CacheError, CacheResult};

/// What a call to [`TargetCache::save`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No cache existed; a new one was written
    Written,
    /// An existing cache was replaced
    Overwritten,
    /// A cache already existed and `force` was not set; nothing was written
    Conflict,
}

/// JSON file holding the last discovered target map
#[derive(Debug, Clone)]
pub struct TargetCache {
    path: PathBuf,
}

impl TargetCache {
    /// Open the cache described by `config`
    ///
    /// Nothing is read or created until the first `load` or `save`.
    pub fn new(config: &CacheConfig) -> CacheResult<Self> {
        Ok(Self::at(config.resolve_path()?))
    }

    /// Open a cache at an explicit file path
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the cache file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached map
    ///
    /// Returns `Ok(None)` when no cache file exists.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Corrupt` if the file exists but does not decode,
    /// or `CacheError::Io` if it cannot be read.
    pub async fn load(&self) -> CacheResult<Option<TargetMap>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No target cache at {}", self.path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let map: TargetMap =
            serde_json::from_str(&content).map_err(|source| CacheError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        debug!(
            "Loaded {} targets across {} years from {}",
            map.file_count(),
            map.year_count(),
            self.path.display()
        );
        Ok(Some(map))
    }

    /// Persist `map`, replacing an existing cache only when `force` is set
    pub async fn save(&self, map: &TargetMap, force: bool) -> CacheResult<SaveOutcome> {
        let existed = fs::try_exists(&self.path)
            .await
            .map_err(|source| self.io_error(source))?;
        if existed && !force {
            warn!(
                "Target cache already exists at {}; not overwriting",
                self.path.display()
            );
            return Ok(SaveOutcome::Conflict);
        }

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await.map_err(|e| {
                    error!("Failed to create cache directory: {}", e);
                    CacheError::DirectoryNotAccessible {
                        path: parent.to_path_buf(),
                    }
                })?;
            }
        }

        let json = serde_json::to_vec_pretty(map).map_err(CacheError::Serialize)?;

        let temp_path = temp_path_for(&self.path);
        if let Err(source) = fs::write(&temp_path, &json).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(CacheError::Io {
                path: temp_path,
                source,
            });
        }
        if let Err(source) = fs::rename(&temp_path, &self.path).await {
            let _ = fs::remove_file(&temp_path).await;
            return Err(self.io_error(source));
        }

        info!(
            "Saved {} targets across {} years to {}",
            map.file_count(),
            map.year_count(),
            self.path.display()
        );
        Ok(if existed {
            SaveOutcome::Overwritten
        } else {
            SaveOutcome::Written
        })
    }

    /// Delete the cache file, returning whether one existed
    pub async fn clear(&self) -> CacheResult<bool> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                info!("Removed target cache {}", self.path.display());
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(self.io_error(source)),
        }
    }

    fn io_error(&self, source: io::Error) -> CacheError {
        CacheError::Io {
            path: self.path.clone(),
            source,
        }
    }
}
