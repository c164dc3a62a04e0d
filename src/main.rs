//! Channel Harvester main entry point
//!
//! This is the command-line interface for harvesting public channel history.

use channel_harvester::config::{
    compute_config_hash, load_config, validate, write_default_config, Config,
};
use channel_harvester::output::{print_statistics, HarvestStatistics, OutputFormat};
use channel_harvester::Coordinator;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tokio::sync::watch;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Channel Harvester: walks public channel previews back in time
///
/// Every configured channel is paged backwards, starting below its configured
/// start id (or at its newest message), until it reaches its first message or
/// a run of empty pages.
/// The merged, newest-first result is written in the selected format.
#[derive(Parser, Debug)]
#[command(name = "channel-harvester")]
#[command(version = "1.0.0")]
#[command(about = "Harvests public channel history", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG", default_value = "config.toml")]
    config: PathBuf,

    /// Output format (json, txt, markdown, pdf, html, xlsx, docx, csv)
    #[arg(short, long, value_parser = parse_format)]
    format: Option<OutputFormat>,

    /// Custom delimiter for txt and csv output
    #[arg(short, long)]
    delimiter: Option<String>,

    /// Channels to harvest, replacing the configured list
    #[arg(long, num_args = 1..)]
    channels: Option<Vec<String>>,

    /// Write a default configuration file and exit
    #[arg(long)]
    create_config: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Also write log output to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

fn parse_format(s: &str) -> Result<OutputFormat, String> {
    s.parse().map_err(|e| format!("{}", e))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet, cli.log_file.as_deref())?;

    if cli.create_config {
        write_default_config(&cli.config)?;
        println!("✓ Default configuration written to: {}", cli.config.display());
        return Ok(());
    }

    // Load configuration, then let the command line override it
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let mut config = load_config(&cli.config)?;
    apply_overrides(&mut config, &cli);

    if let Err(e) = validate(&config) {
        tracing::error!("Invalid configuration: {}", e);
        return Err(e.into());
    }

    if cli.config.exists() {
        let hash = compute_config_hash(&cli.config)?;
        tracing::info!("Configuration loaded successfully (hash: {})", hash);
    }

    handle_harvest(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// Console output goes to stderr. When a log file is given, the same events
/// are appended to it without ANSI colours.
fn setup_logging(verbose: u8, quiet: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("channel_harvester=info,warn"),
            1 => EnvFilter::new("channel_harvester=debug,info"),
            2 => EnvFilter::new("channel_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_target(false),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false),
        )
        .with(file_layer)
        .init();

    Ok(())
}

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(format) = cli.format {
        config.output_format = format.to_string();
    }
    if let Some(delimiter) = &cli.delimiter {
        config.delimiter = Some(delimiter.clone());
    }
    if let Some(channels) = &cli.channels {
        config.channels = channels.clone();
    }
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        "Channels: {}, output format: {}",
        config.channels.join(", "),
        config.output_format
    );

    let (cancel_tx, cancel_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping walkers and saving partial results");
            let _ = cancel_tx.send(true);
        }
    });

    let coordinator = Coordinator::new(config)?;
    let outcome = coordinator.run(cancel_rx).await;

    let saved = coordinator.deliver(&outcome);

    print_statistics(&HarvestStatistics::from_outcome(&outcome));

    match saved {
        Ok(path) => {
            println!("✓ Results saved to: {}", path.display());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
