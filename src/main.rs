//! SST Fetcher CLI application
//!
//! Command-line interface for mirroring the NOAA WHOI sea surface temperature
//! archive with validated, atomic downloads.

use std::process;

use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

// Import CLI modules through the library (module is public but not re-exported)
use sst_fetcher::cli::{
    apply_global_overrides, handle_download, handle_targets, handle_validate, Cli, Commands,
};
use sst_fetcher::config::AppConfig;
use sst_fetcher::errors::Result;

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> Result<()> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok(); // Ignore errors if file doesn't exist

    // Parse command line arguments
    let cli = Cli::parse_args();

    let mut config = AppConfig::load(cli.global.config.as_deref()).await?;
    apply_global_overrides(&mut config, &cli.global);

    // Initialize logging based on verbosity
    init_logging(&cli, config.logging.default_level()?);

    info!("SST Fetcher v{} starting", env!("CARGO_PKG_VERSION"));

    // Execute the appropriate command
    match cli.command {
        Commands::Download(args) => {
            info!("Executing download command");
            handle_download(config, args).await
        }
        Commands::Targets(args) => {
            info!("Executing targets command");
            handle_targets(config, args).await
        }
        Commands::Validate(args) => {
            info!("Executing validate command");
            handle_validate(config, args).await
        }
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli, default_level: tracing::Level) {
    let log_level = cli.log_level(default_level);

    // Create environment filter
    let mut filter = EnvFilter::from_default_env();
    if let Ok(directive) = format!("sst_fetcher={}", log_level).parse() {
        filter = filter.add_directive(directive);
    }

    // Initialize subscriber
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.verbose || cli.global.very_verbose) // Show levels only when verbose
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
