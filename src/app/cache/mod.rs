//! Target cache
//!
//! Discovery walks the whole remote index, which is slow. The resulting
//! target map is persisted so later runs can skip straight to transfers.
//!
//! - [`config`] - Cache location and defaults
//! - [`store`] - Load, save and clear operations
//!
//! # Examples
//!
//! ```rust,no_run
//! use sst_fetcher::app::cache::{CacheConfig, TargetCache};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = TargetCache::new(&CacheConfig::default())?;
//! match cache.load().await? {
//!     Some(map) => println!("{} cached targets", map.file_count()),
//!     None => println!("No cache yet"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod store;

pub use config::CacheConfig;
pub use store::{SaveOutcome, TargetCache};
