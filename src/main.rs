use anyhow::{Context, Result};
use clap::Parser;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use fabricator_scanner::api::ScanApiClient;
use fabricator_scanner::config;
use fabricator_scanner::controller::ScreenController;
use fabricator_scanner::devices::{FeedbackSink, SilentFeedback, TerminalBell, WedgeScanner};
use fabricator_scanner::station::{Station, StationInput};
use fabricator_scanner::terminal::{parse_line, Line, TerminalScreen, HELP};

#[derive(Debug, Parser)]
#[command(author, version, about = "Scan fabricator and mattress barcodes and submit them")]
struct Args {
    /// Path to YAML config file
    #[arg(long, default_value = "config.yaml")]
    config: PathBuf,

    /// Print an example config and exit
    #[arg(long)]
    print_config: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    if args.print_config {
        print!("{}", config::example());
        return Ok(());
    }

    let cfg = config::load(Some(&args.config))
        .with_context(|| format!("failed to load {}", args.config.display()))?;
    let client = ScanApiClient::from_config(&cfg)?;
    info!(endpoint = %client.endpoint(), "using scan endpoint");

    let feedback: Arc<dyn FeedbackSink> = if cfg.station.beep {
        Arc::new(TerminalBell)
    } else {
        Arc::new(SilentFeedback)
    };
    let station = Station::new(
        ScreenController::new(cfg.station.success_notice()),
        Arc::new(client),
        feedback,
        Arc::new(TerminalScreen::new()),
    );

    let (input_tx, input_rx) = mpsc::channel::<StationInput>(32);

    // Stdin carries both the keyboard-wedge scanner and operator commands;
    // one channel keeps them in typed order.
    // A plain thread: a blocking stdin read would hold up runtime shutdown.
    std::thread::spawn(move || {
        println!("{HELP}");
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(?err, "failed to read stdin");
                    break;
                }
            };
            let sent = match parse_line(&line) {
                None => true,
                Some(Line::Input(input)) => input_tx.blocking_send(input).is_ok(),
                Some(Line::Help) => {
                    println!("{HELP}");
                    true
                }
                Some(Line::Unknown(text)) => {
                    println!("unknown command: {text} (:help)");
                    true
                }
            };
            if !sent {
                break;
            }
        }
        // Dropping `input_tx` stops the station.
    });

    let mut scanner = WedgeScanner::new();
    station.run(&mut scanner, input_rx).await?;
    Ok(())
}
