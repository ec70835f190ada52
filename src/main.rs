//! blesniff - BLE sniffer capture
//!
//! Captures frames from a serial BLE sniffer into pcap or raw dump files,
//! and converts raw dumps to pcap afterwards.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use blesniff::convert;
use blesniff::reporter::{ConsoleReporter, StatusReporter, StatusSampler};
use blesniff::{CaptureConfig, CaptureController, DeviceHeartbeatTracker, OutputFormat};

/// How often the status loop checks whether the capture thread has exited
const STATUS_POLL: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "blesniff")]
#[command(about = "Capture BLE sniffer frames to pcap")]
struct Cli {
    /// Config file (key = value lines)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Capture from the sniffer until it disconnects or Ctrl+C
    Capture {
        /// Serial device of the sniffer (e.g., /dev/tty_ble)
        #[arg(short, long)]
        device: Option<String>,
        /// Directory for the capture file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
        /// Output format
        #[arg(short, long, value_enum)]
        format: Option<OutputFormat>,
    },
    /// Convert a raw dump into a pcap file
    Unpack {
        /// Raw dump written by `capture --format raw`
        input: PathBuf,
        /// Output pcap (defaults to <input>.pcap)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match CaptureConfig::load(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Capture {
            device,
            output_dir,
            format,
        } => {
            let mut config = config;
            if let Some(device) = device {
                config.device = device;
            }
            if let Some(output_dir) = output_dir {
                config.output_dir = output_dir;
            }
            if let Some(format) = format {
                config.format = format;
            }
            run_capture(&config)
        }
        Commands::Unpack { input, output } => run_unpack(input, output),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

fn run_capture(config: &CaptureConfig) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .context("Failed to set Ctrl+C handler")?;

    let output = config.output_path(Utc::now());
    let heartbeat = Arc::new(DeviceHeartbeatTracker::new());
    let controller =
        CaptureController::open(config, &output, Arc::clone(&heartbeat), running.clone())
            .with_context(|| format!("Failed to start capture on {}", config.device))?;

    let reporter = ConsoleReporter::new();
    let mut sampler = StatusSampler::new(
        controller.stats(),
        Arc::clone(&heartbeat),
        config.heartbeat_window(),
    );

    let handle = thread::Builder::new()
        .name("ble-capture".to_string())
        .spawn(move || controller.run())
        .context("Failed to spawn capture thread")?;

    reporter.on_start(&config.device, &output);

    let interval = config.status_interval();
    let mut waited = Duration::ZERO;
    while !handle.is_finished() {
        thread::sleep(STATUS_POLL);
        waited += STATUS_POLL;
        if waited >= interval {
            waited = Duration::ZERO;
            reporter.report(&sampler.sample(Utc::now()));
        }
    }

    let outcome = handle
        .join()
        .map_err(|_| anyhow!("Capture thread panicked"))?;
    reporter.on_stop(&sampler.sample(Utc::now()));

    outcome.with_context(|| format!("BLE capture on {} failed", config.device))?;
    Ok(())
}

fn run_unpack(input: PathBuf, output: Option<PathBuf>) -> Result<()> {
    let output = output.unwrap_or_else(|| {
        let mut name = input.clone().into_os_string();
        name.push(".pcap");
        PathBuf::from(name)
    });

    let summary = convert::unpack_file(&input, &output)
        .with_context(|| format!("Failed to unpack {}", input.display()))?;

    println!(
        "{}: {} records, {} written, {} skipped",
        output.display(),
        summary.records,
        summary.written,
        summary.skipped
    );
    if let Some(offset) = summary.corrupt_at {
        println!("stopped at corrupt record (offset {})", offset);
    }
    Ok(())
}
