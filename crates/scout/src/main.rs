//! serial-scout
//!
//! Discovers attached USB devices, matches them against the known
//! serial-driver capability tables, and brokers host authorization before
//! handing an authorized device to the console.

mod config;
mod console;
mod coordinator;
mod permission;
mod publisher;
mod scheduler;
mod session;
mod usb;

use anyhow::{Context, Result};
use clap::Parser;
use common::{ScanBridge, ScanCommand, ScanEvent, create_scan_bridge, setup_logging};
use config::ScoutConfig;
use console::TerminalConsole;
use coordinator::PermissionCoordinator;
use permission::HostPermissionService;
use probe::EntrySnapshot;
use publisher::{ResultPublisher, SnapshotListener};
use session::spawn_session;
use std::time::Duration;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use usb::spawn_scan_worker;

#[derive(Parser, Debug)]
#[command(name = "serial-scout")]
#[command(
    author,
    version,
    about = "Discover USB serial adapters and hand them to a console"
)]
#[command(long_about = "
Watches the USB bus for serial adapters (FTDI, CP210x, CH34x, Prolific,
CDC-ACM), shows every attached device with the driver able to speak to it,
and asks the host for permission before opening one.

EXAMPLES:
    # Interactive device list with periodic refresh
    serial-scout

    # One enumeration pass, then exit
    serial-scout --list-devices

    # Same, as JSON
    serial-scout --list-devices --json

    # Custom config and debug logging
    serial-scout --config ~/.config/serial-scout/scout.toml --log-level debug

CONFIGURATION:
    Configuration files are looked up in the following order:
    1. Path specified with --config
    2. ~/.config/serial-scout/scout.toml
    3. /etc/serial-scout/scout.toml
    4. Built-in defaults
")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<String>,

    /// Save default configuration to the default location and exit
    #[arg(long)]
    save_config: bool,

    /// Run one enumeration pass, print the device list, and exit
    #[arg(long)]
    list_devices: bool,

    /// Print the device list as JSON (with --list-devices)
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, value_name = "LEVEL")]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.save_config {
        let config = ScoutConfig::default();
        let path = ScoutConfig::default_path();
        config.save(&path).context("Failed to save configuration")?;
        println!("Configuration saved to: {}", path.display());
        return Ok(());
    }

    let config = if let Some(ref path) = args.config {
        ScoutConfig::load(Some(config::expand_path(path)))
            .context("Failed to load configuration")?
    } else {
        ScoutConfig::load_or_default()
    };

    let log_level = args.log_level.as_deref().unwrap_or(&config.scout.log_level);
    setup_logging(log_level).context("Failed to setup logging")?;

    info!("serial-scout v{}", env!("CARGO_PKG_VERSION"));

    let (bridge, worker) = create_scan_bridge();
    let scan_handle = spawn_scan_worker(worker, config.prober());

    let result = if args.list_devices {
        list_devices_mode(&bridge, args.json).await
    } else {
        run_interactive(&config, bridge.clone()).await
    };

    info!("shutting down");
    if let Err(e) = bridge.send_command(ScanCommand::Shutdown).await {
        // Already gone if the scan thread exited first.
        tracing::debug!("scan thread shutdown notice not delivered: {e}");
    }
    if scan_handle.join().is_err() {
        error!("scan thread panicked");
    }

    result
}

/// Run one enumeration pass and print the result.
async fn list_devices_mode(bridge: &ScanBridge, json: bool) -> Result<()> {
    bridge
        .send_command(ScanCommand::Scan { seq: 1 })
        .await
        .context("Failed to reach the scan thread")?;

    let ScanEvent::Completed { snapshot } = bridge
        .recv_event()
        .await
        .context("Scan thread did not report a result")?;

    if json {
        println!("{}", serde_json::to_string_pretty(snapshot.entries())?);
        return Ok(());
    }

    if snapshot.is_empty() {
        println!("No USB devices found.");
    } else {
        print_snapshot(&snapshot);
    }
    Ok(())
}

fn print_snapshot(snapshot: &EntrySnapshot) {
    println!("{} device(s) found", snapshot.len());
    for (index, entry) in snapshot.iter().enumerate() {
        let driver = entry
            .driver
            .map(|binding| binding.kind.to_string())
            .unwrap_or_else(|| "No Driver".to_string());
        let product = entry
            .descriptor
            .product
            .as_deref()
            .map(|p| format!(" ({p})"))
            .unwrap_or_default();
        println!("  [{index}] {} - {driver}{product}", entry.descriptor.label());
    }
}

/// Presentation listener: renders each published snapshot on the terminal.
struct TerminalListing;

impl SnapshotListener for TerminalListing {
    fn on_snapshot_changed(&self, snapshot: &EntrySnapshot, count: usize) {
        if count == 0 {
            println!("No USB devices found.");
        } else {
            print_snapshot(snapshot);
        }
    }
}

/// Interactive mode: periodic refresh plus a line-based command surface.
async fn run_interactive(config: &ScoutConfig, bridge: ScanBridge) -> Result<()> {
    let (decision_tx, decision_rx) = mpsc::unbounded_channel();

    let coordinator = PermissionCoordinator::new(
        Box::new(HostPermissionService::new(decision_tx)),
        Box::new(TerminalConsole),
    );
    let publisher = ResultPublisher::new(Box::new(TerminalListing));
    let refresh_interval = Duration::from_secs(config.scout.refresh_interval_secs);

    let (session, session_task) =
        spawn_session(bridge, publisher, coordinator, decision_rx, refresh_interval);

    session.activate();
    println!("Commands: <index> select device, r refresh, p pause/resume, q quit");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    let mut paused = false;

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => {
                    if !handle_line(line.trim(), &session, &mut paused) {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("stdin closed: {e}");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }

    session.shutdown();
    let _ = session_task.await;
    Ok(())
}

/// Dispatch one input line; returns false to quit.
fn handle_line(line: &str, session: &session::SessionHandle, paused: &mut bool) -> bool {
    match line {
        "" => {}
        "q" | "quit" => return false,
        "r" => session.refresh(),
        "p" => {
            if *paused {
                session.activate();
                println!("Resumed.");
            } else {
                session.deactivate();
                println!("Paused; refresh and pending authorization released.");
            }
            *paused = !*paused;
        }
        other => match other.parse::<usize>() {
            Ok(index) => session.select(index),
            Err(_) => println!("Unrecognised command: {other}"),
        },
    }
    true
}
