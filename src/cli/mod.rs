//! Command-line interface components
//!
//! This module contains CLI-specific code for the SST Fetcher application:
//! argument parsing and the command handlers.

pub mod args;
pub mod commands;

pub use args::{
    Cli, Commands, DownloadArgs, GlobalArgs, TargetsAction, TargetsArgs, ValidateArgs,
};
pub use commands::{apply_global_overrides, handle_download, handle_targets, handle_validate};
