//! Attention Monitor - Main Entry Point

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use monitor::config::Preset;
use monitor::{init_logging, report::log_summary, run, MonitorConfig};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON-lines landmark trace to replay ("-" reads stdin)
    trace: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Threshold preset the configuration file and environment build on
    #[arg(long, value_enum, default_value_t = Preset::Standard)]
    preset: Preset,

    /// Write every frame report to stdout as a JSON line
    #[arg(long)]
    json: bool,

    /// Seconds without a centered gaze before attention is required
    #[arg(long)]
    alert_threshold: Option<f64>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = MonitorConfig::load(args.config.as_deref(), args.preset)
        .context("Failed to load configuration")?;
    if let Some(seconds) = args.alert_threshold {
        config.attention.alert.threshold_seconds = seconds;
    }
    if args.debug {
        config.log.level = "debug".to_string();
    }

    init_logging(&config.log)?;
    info!("=== Attention Monitor v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Preset: {:?}", args.preset);

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let summary = if args.trace.as_os_str() == "-" {
        run(&config, io::stdin().lock(), &mut out, args.json)?
    } else {
        let file = File::open(&args.trace)
            .with_context(|| format!("Failed to open trace {}", args.trace.display()))?;
        run(&config, BufReader::new(file), &mut out, args.json)?
    };

    log_summary(&summary);
    Ok(())
}
