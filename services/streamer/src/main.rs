//! Ticket streamer entry point

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use export::extensions::Extensions;
use std::path::PathBuf;
use std::sync::Arc;
use streamer_config::{StreamerConfig, DEFAULT_CONFIG_PATH};
use ticket_streamer::{bootstrap, format_tables, intake, logging, IntakeStats};
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Environment overlay, read from `environments/<ENV>.toml` next to the
    /// configuration file
    #[arg(short, long)]
    env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read ticket events as NDJSON and export them
    Run {
        /// Input file; standard input when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Print every registered format
    Formats,
    /// Load and validate the configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    match args.command {
        Command::Formats => {
            for (family, formats) in format_tables(&Extensions::default()) {
                println!("{}:", family);
                for (name, label) in formats {
                    println!("  {:<20} {}", name, label);
                }
            }
            Ok(())
        }
        Command::Check => {
            let config = load(&args)?;
            println!(
                "Configuration OK: {} use case(s) enabled",
                config.enabled_use_cases().len()
            );
            Ok(())
        }
        Command::Run { ref input } => {
            let config = load(&args)?;
            logging::init(&config.logging)?;
            run(config, input.clone()).await
        }
    }
}

fn load(args: &Args) -> Result<StreamerConfig> {
    let config = StreamerConfig::load(Some(&args.config), args.env.as_deref())
        .with_context(|| format!("Failed to load {:?}", args.config))?;
    config.validate()?;
    Ok(config)
}

async fn run(config: StreamerConfig, input: Option<PathBuf>) -> Result<()> {
    info!("Starting ticket streamer");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut dispatcher = bootstrap(Arc::new(config), &Extensions::default());
    if dispatcher.is_empty() {
        warn!("No use case enabled, tickets will be read and dropped");
    }

    let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &input {
        Some(path) => Box::new(BufReader::new(
            tokio::fs::File::open(path)
                .await
                .with_context(|| format!("Failed to open {:?}", path))?,
        )),
        None => Box::new(BufReader::new(tokio::io::stdin())),
    };

    let mut stats = IntakeStats::default();
    tokio::select! {
        result = intake::run(reader, &mut dispatcher) => {
            stats = result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received");
        }
    }

    dispatcher.shutdown().await;
    info!(
        events = stats.events,
        skipped = stats.skipped,
        handled = stats.handled,
        "Ticket streamer stopped"
    );
    Ok(())
}
