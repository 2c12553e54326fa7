//! Command handlers for SST Fetcher CLI
//!
//! This module implements the command handlers that merge CLI arguments into
//! the loaded configuration and drive the core application components.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use url::Url;

use crate::app::local::{find_out_of_place, remove_files};
use crate::app::{
    ArchiveClient, LocalInventory, SignalHandler, SizeValidator, TargetCache, TargetMap,
    TransferEngine, TransferSummary,
};
use crate::cli::{DownloadArgs, GlobalArgs, TargetsAction, TargetsArgs, ValidateArgs};
use crate::config::AppConfig;
use crate::errors::{AppError, ConfigError, Result};

/// Fold global CLI flags into the loaded configuration
pub fn apply_global_overrides(config: &mut AppConfig, global: &GlobalArgs) {
    if let Some(dir) = &global.cache_dir {
        config.cache.cache_dir = Some(dir.clone());
    }
}

/// Handle the download command
///
/// Loads or discovers the targets, mirrors them and prints the summary.
/// Per-file failures are reported in the summary, not as an error.
pub async fn handle_download(mut config: AppConfig, args: DownloadArgs) -> Result<()> {
    if let Some(dir) = args.data_dir {
        config.transfer.dest_root = dir;
    }
    if let Some(delay) = args.delay {
        config.transfer.inter_request_delay = delay;
    }
    if args.no_progress {
        config.transfer.show_progress = false;
    }

    let client = Arc::new(build_client(&config, args.base_url.as_deref())?);
    let cache = TargetCache::new(&config.cache)?;

    let cancel = CancellationToken::new();
    let signal_task = SignalHandler::new(cancel.clone()).setup();
    let engine = TransferEngine::with_cancellation(client, config.transfer.clone(), cancel);

    let targets = load_targets(&engine, &cache, !args.clear_cache).await?;
    if targets.file_count() == 0 {
        warn!("No targets to download");
    }

    let summary = engine.run(&targets).await;
    signal_task.abort();
    let summary = summary?;

    print_summary(&summary);
    Ok(())
}

/// Handle target list management
pub async fn handle_targets(config: AppConfig, args: TargetsArgs) -> Result<()> {
    let cache = TargetCache::new(&config.cache)?;

    match args.action {
        TargetsAction::Show { year } => {
            let Some(targets) = cache.load().await? else {
                println!("No cached targets at {}", cache.path().display());
                println!("Run 'sst_fetcher targets refresh' to discover them.");
                return Ok(());
            };
            show_targets(&targets, year);
        }
        TargetsAction::Refresh { base_url } => {
            let client = Arc::new(build_client(&config, base_url.as_deref())?);
            let engine = TransferEngine::new(client, config.transfer.clone());
            let targets = load_targets(&engine, &cache, false).await?;
            println!(
                "Cached {} files across {} years at {}",
                targets.file_count(),
                targets.year_count(),
                cache.path().display()
            );
        }
        TargetsAction::Clear => {
            if cache.clear().await? {
                println!("Removed {}", cache.path().display());
            } else {
                println!("No target cache at {}", cache.path().display());
            }
        }
    }

    Ok(())
}

/// Handle local mirror validation
pub async fn handle_validate(config: AppConfig, args: ValidateArgs) -> Result<()> {
    args.validate().map_err(AppError::generic)?;
    let data_dir: PathBuf = args
        .data_dir
        .clone()
        .unwrap_or_else(|| config.transfer.dest_root.clone());
    let verb = if args.dry_run { "Would remove" } else { "Removed" };

    let inventory = LocalInventory::scan(&data_dir).await?;
    println!(
        "{} local data files across {} years in {}",
        inventory.file_count(),
        inventory.years().count(),
        data_dir.display()
    );

    if args.out_of_place {
        info!("Checking for out of place files in {}", data_dir.display());
        let found = find_out_of_place(&data_dir).await?;
        for file in &found {
            println!("{}: {}", file.path.display(), file.reason);
        }
        let removed = remove_files(found.iter().map(|f| f.path.as_path()), args.dry_run).await?;
        println!("{} {} out of place files", verb, removed);
    }

    if args.size {
        let client = Arc::new(build_client(&config, None)?);
        let cache = TargetCache::new(&config.cache)?;
        let cancel = CancellationToken::new();
        let signal_task = SignalHandler::new(cancel.clone()).setup();

        let engine = TransferEngine::with_cancellation(
            client.clone(),
            config.transfer.clone(),
            cancel.clone(),
        );
        let targets = load_targets(&engine, &cache, true).await?;

        info!("Checking local file sizes against {}", client.base_url());
        let report = SizeValidator::new(&client, config.transfer.inter_request_delay, cancel)
            .check(&targets, &data_dir)
            .await;
        signal_task.abort();

        for mismatch in &report.mismatched {
            println!(
                "{}: local {} bytes, remote {} bytes",
                mismatch.path.display(),
                mismatch.local,
                mismatch.remote
            );
        }
        for path in &report.unknown {
            println!("{}: remote size unknown, kept", path.display());
        }
        let removed = remove_files(report.mismatched_paths(), args.dry_run).await?;
        println!(
            "Checked {} files: {} match, {} {} with wrong size, {} unknown, {} not downloaded",
            report.files_checked,
            report.files_matching,
            verb.to_lowercase(),
            removed,
            report.unknown.len(),
            report.files_missing
        );
        if report.cancelled {
            println!("Size check cancelled before completion");
        }
    }

    Ok(())
}

fn build_client(config: &AppConfig, base_url_override: Option<&str>) -> Result<ArchiveClient> {
    let base_url = match base_url_override {
        Some(value) => Url::parse(value).map_err(|e| ConfigError::InvalidValue {
            field: "--base-url".to_string(),
            value: value.to_string(),
            reason: e.to_string(),
        })?,
        None => config.client.base_url()?,
    };
    Ok(ArchiveClient::new(base_url, config.client.to_runtime_config())?)
}

/// Acquire targets with a spinner while the archive index is scraped
async fn load_targets(
    engine: &TransferEngine,
    cache: &TargetCache,
    use_cache: bool,
) -> Result<TargetMap> {
    let spinner = spinner("Loading download targets...");
    let targets = engine.acquire_targets(cache, use_cache).await;
    if let Some(spinner) = spinner {
        spinner.finish_and_clear();
    }
    targets
}

/// Spinner shown only when stdout is a terminal
fn spinner(message: &str) -> Option<ProgressBar> {
    if !atty::is(atty::Stream::Stdout) {
        return None;
    }

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style.tick_strings(&["◐", "◓", "◑", "◒"]));
    }
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(120));
    Some(spinner)
}

fn show_targets(targets: &TargetMap, year: Option<i32>) {
    match year {
        Some(year) => match targets.get(year) {
            Some(urls) => {
                println!("{}: {} files", year, urls.len());
                for url in urls {
                    println!("  {}", url);
                }
            }
            None => println!("{} is not in the cached targets", year),
        },
        None => {
            for (year, urls) in targets.iter() {
                println!("{}: {} files", year, urls.len());
            }
            println!(
                "Total: {} files across {} years",
                targets.file_count(),
                targets.year_count()
            );
        }
    }
}

fn print_summary(summary: &TransferSummary) {
    println!();
    print!("{}", summary);
    println!("Elapsed: {:.1?}", summary.elapsed);

    if !summary.failures.is_empty() {
        println!();
        println!("Failed transfers:");
        for failure in &summary.failures {
            println!("  {} -> {}", failure.url, failure.destination.display());
            println!("    {}", failure.reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn global(cache_dir: Option<PathBuf>) -> GlobalArgs {
        GlobalArgs {
            verbose: false,
            very_verbose: false,
            quiet: false,
            config: None,
            cache_dir,
        }
    }

    #[test]
    fn test_global_cache_dir_override() {
        let mut config = AppConfig::default();
        apply_global_overrides(&mut config, &global(Some(PathBuf::from("/tmp/c"))));
        assert_eq!(config.cache.cache_dir, Some(PathBuf::from("/tmp/c")));

        let mut config = AppConfig::default();
        apply_global_overrides(&mut config, &global(None));
        assert_eq!(config.cache.cache_dir, None);
    }

    #[test]
    fn test_build_client_override() {
        let config = AppConfig::default();
        let client = build_client(&config, Some("http://localhost:1234/sst")).unwrap();
        assert_eq!(client.base_url().as_str(), "http://localhost:1234/sst/");

        let err = build_client(&config, Some("nope")).unwrap_err();
        assert_eq!(err.category(), "config");
    }

    #[tokio::test]
    async fn test_validate_out_of_place_dry_run() {
        let temp_dir = TempDir::new().unwrap();
        let year_dir = temp_dir.path().join("2019");
        std::fs::create_dir_all(&year_dir).unwrap();
        let stray = year_dir.join("SEAFLUX-OSB-CDR_V02R00_SST_D20120101_C20190301.nc");
        std::fs::write(&stray, b"header").unwrap();

        let args = ValidateArgs {
            data_dir: Some(temp_dir.path().to_path_buf()),
            out_of_place: true,
            size: false,
            dry_run: true,
        };
        handle_validate(AppConfig::default(), args.clone()).await.unwrap();
        assert!(stray.exists());

        handle_validate(
            AppConfig::default(),
            ValidateArgs {
                dry_run: false,
                ..args
            },
        )
        .await
        .unwrap();
        assert!(!stray.exists());
    }

    #[tokio::test]
    async fn test_targets_clear_without_cache() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.cache.cache_dir = Some(temp_dir.path().to_path_buf());

        handle_targets(
            config,
            TargetsArgs {
                action: TargetsAction::Clear,
            },
        )
        .await
        .unwrap();
    }
}
