//! Command-line argument parsing for SST Fetcher
//!
//! This module defines the CLI structure using clap derive macros: mirroring
//! the archive, managing the cached target list and validating the local
//! mirror.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

/// SST Fetcher - Mirror the NOAA WHOI sea surface temperature archive
#[derive(Parser, Debug)]
#[command(
    name = "sst_fetcher",
    version,
    about = "Mirror the NOAA WHOI sea surface temperature archive",
    long_about = "Discovers every daily file in the NOAA WHOI SST archive and keeps a local mirror in sync.
Downloads are sequential, size-validated against the server and written atomically."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (trace level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - only errors are logged
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory holding the target cache
    #[arg(long, global = true, value_name = "DIR")]
    pub cache_dir: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Download every missing or incomplete archive file
    Download(DownloadArgs),

    /// Inspect or manage the cached target list
    Targets(TargetsArgs),

    /// Check the local mirror for misplaced or wrongly sized files
    Validate(ValidateArgs),
}

/// Arguments for the download command
#[derive(Args, Debug, Clone, Default)]
pub struct DownloadArgs {
    /// Root directory of the local mirror
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Ignore the cached target list and scrape the archive again
    #[arg(long)]
    pub clear_cache: bool,

    /// Pause after every file (e.g. "100ms", "2s")
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub delay: Option<Duration>,

    /// Archive index URL
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Do not draw per-file progress bars
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for target list management
#[derive(Args, Debug)]
pub struct TargetsArgs {
    #[command(subcommand)]
    pub action: TargetsAction,
}

/// Target list actions
#[derive(Subcommand, Debug)]
pub enum TargetsAction {
    /// Print the cached targets
    Show {
        /// Only show this year
        #[arg(short, long)]
        year: Option<i32>,
    },

    /// Scrape the archive and replace the cached targets
    Refresh {
        /// Archive index URL
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Delete the cached targets
    Clear,
}

/// Arguments for the validate command
#[derive(Args, Debug, Clone, Default)]
pub struct ValidateArgs {
    /// Root directory of the local mirror
    #[arg(short, long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Find and remove files that do not belong in their year directory
    #[arg(short, long)]
    pub out_of_place: bool,

    /// Find and remove files whose size differs from the server's (uses HTTP requests)
    #[arg(short, long)]
    pub size: bool,

    /// Report what would be removed without removing anything
    #[arg(long)]
    pub dry_run: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level from the global flags, falling back to `default`
    pub fn log_level(&self, default: tracing::Level) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::TRACE
        } else if self.global.verbose {
            tracing::Level::DEBUG
        } else {
            default
        }
    }
}

impl ValidateArgs {
    /// At least one check must be requested
    pub fn validate(&self) -> Result<(), String> {
        if !self.out_of_place && !self.size {
            return Err("Nothing to validate: pass --out-of-place and/or --size".to_string());
        }
        Ok(())
    }
}

fn parse_duration(value: &str) -> Result<Duration, String> {
    humantime::parse_duration(value).map_err(|e| format!("invalid duration '{}': {}", value, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_download_args_parse() {
        let cli = Cli::try_parse_from([
            "sst_fetcher",
            "download",
            "--data-dir",
            "/srv/sst",
            "--clear-cache",
            "--delay",
            "250ms",
            "--no-progress",
        ])
        .unwrap();

        match cli.command {
            Commands::Download(args) => {
                assert_eq!(args.data_dir, Some(PathBuf::from("/srv/sst")));
                assert!(args.clear_cache);
                assert_eq!(args.delay, Some(Duration::from_millis(250)));
                assert!(args.no_progress);
                assert_eq!(args.base_url, None);
            }
            other => panic!("Expected download command, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_delay_rejected() {
        assert!(Cli::try_parse_from(["sst_fetcher", "download", "--delay", "soon"]).is_err());
    }

    #[test]
    fn test_targets_show_year() {
        let cli = Cli::try_parse_from(["sst_fetcher", "targets", "show", "--year", "2019"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Targets(TargetsArgs {
                action: TargetsAction::Show { year: Some(2019) }
            })
        ));
    }

    #[test]
    fn test_validate_requires_a_check() {
        let args = ValidateArgs::default();
        assert!(args.validate().is_err());

        let args = ValidateArgs {
            size: true,
            ..Default::default()
        };
        assert!(args.validate().is_ok());
    }

    #[test]
    fn test_log_level() {
        let cli = |args: &[&str]| Cli::try_parse_from(args.iter().copied()).unwrap();

        let quiet = cli(&["sst_fetcher", "-q", "targets", "clear"]);
        let verbose = cli(&["sst_fetcher", "targets", "clear", "-v"]);
        let plain = cli(&["sst_fetcher", "targets", "clear"]);

        assert_eq!(quiet.log_level(tracing::Level::INFO), tracing::Level::ERROR);
        assert_eq!(verbose.log_level(tracing::Level::INFO), tracing::Level::DEBUG);
        assert_eq!(plain.log_level(tracing::Level::WARN), tracing::Level::WARN);
    }
}
