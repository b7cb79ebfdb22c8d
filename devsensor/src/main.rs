//! devsensor - host integration CLI for the development activity sensor
//!
//! This tool provides commands for:
//! - Checking sensor configuration and status
//! - Replaying a recorded observation log through a live sensor
//! - Feeding observations from stdin (for editor plugins that shell out)
//! - Checking that the collector is reachable
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/devsensor/config.toml (~/.config/devsensor/config.toml)
//! - Logs: $XDG_STATE_HOME/devsensor/ (~/.local/state/devsensor/)

mod observation;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use devsensor_core::collector::{BlockingCollector, PublishStats};
use devsensor_core::{Config, NoMetrics, SensorCore};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "devsensor")]
#[command(about = "Development activity sensor for editor hosts")]
#[command(version)]
struct Args {
    /// Write logs to the state directory
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show sensor configuration and status
    Status,

    /// Replay a JSON-lines observation log through a live sensor
    Replay {
        /// Observation log to read
        file: PathBuf,

        /// Stop at the first malformed line instead of skipping it
        #[arg(long)]
        strict: bool,
    },

    /// Read observations from stdin until EOF or Ctrl+C
    Listen,

    /// Check that the collector answers its health endpoint
    Ping,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Keep the guard alive for the whole run so buffered log lines are flushed
    let _log_guard = if args.verbose {
        Some(devsensor_core::logging::init(&config.logging).context("failed to initialize logging")?)
    } else {
        None
    };

    match args.command {
        Command::Status => cmd_status(&config),
        Command::Replay { file, strict } => cmd_replay(&config, &file, strict),
        Command::Listen => cmd_listen(&config),
        Command::Ping => cmd_ping(&config),
    }
}

fn cmd_status(config: &Config) -> Result<()> {
    println!("Sensor Configuration");
    println!("====================");
    println!();

    let sensor = &config.sensor;

    println!("Config File:     {}", Config::config_path().display());
    println!(
        "Log Dir:         {}",
        devsensor_core::logging::log_dir().display()
    );
    println!("Enabled:         {}", sensor.enabled);

    if !sensor.enabled {
        println!();
        println!("Sensor is disabled. Enable it in config.toml:");
        println!();
        println!("  [sensor]");
        println!("  enabled = true");
        println!("  host = \"https://collector.example.com\"");
        println!("  user = \"dev@example.com\"");
        println!("  key = \"xxxxxxxxxxxx\"");
        return Ok(());
    }

    println!(
        "Host:            {}",
        sensor.host.as_deref().unwrap_or("<not set>")
    );
    println!(
        "User:            {}",
        sensor.user.as_deref().unwrap_or("<not set>")
    );
    println!(
        "Key:             {}",
        if sensor.key.is_some() {
            "<set>"
        } else {
            "<not set>"
        }
    );
    println!("Tool:            {}", sensor.tool);
    println!("State Change:    {}s", sensor.state_change_interval_secs);
    println!(
        "Buffer Trans:    {}",
        if sensor.buffer_transitions {
            format!("{}s", sensor.buffer_trans_interval_secs)
        } else {
            "off".to_string()
        }
    );
    println!("Autosend:        {}s", sensor.autosend_interval_secs);
    println!("Timeout:         {}s", sensor.timeout_secs);
    println!("On Failure:      {:?}", sensor.on_failure);
    println!("Max Buffered:    {}", sensor.max_buffered_events);

    println!();
    if sensor.is_ready() {
        println!("Status: Ready to publish");
    } else {
        println!("Status: Not ready (missing required configuration)");
    }

    Ok(())
}

fn start_sensor(config: &Config) -> Result<Arc<SensorCore>> {
    let sensor = SensorCore::from_config(config.sensor.clone(), Arc::new(NoMetrics))
        .context("failed to create sensor")?;
    sensor.start().context("failed to start sensor timers")?;
    Ok(sensor)
}

fn print_summary(sensor: &SensorCore, pending: usize) {
    let report = sensor.shutdown();
    let stats: PublishStats = sensor.stats();

    println!();
    println!("Events buffered at exit: {}", pending);
    if let Some(report) = report {
        println!("Final delivery:  {}", report.describe());
    }
    if stats.api_calls > 0 {
        println!();
        println!("Stats:");
        println!("  API Calls:  {}", stats.api_calls);
        println!("  Sent:       {}", stats.events_sent);
        println!("  Rejected:   {}", stats.events_rejected);
        println!("  Requeued:   {}", stats.events_requeued);
        println!("  Dropped:    {}", stats.events_dropped);
        println!("  Failures:   {}", stats.api_failures);
    }
}

fn cmd_replay(config: &Config, file: &Path, strict: bool) -> Result<()> {
    let content = fs::read_to_string(file)
        .with_context(|| format!("failed to read observation log {}", file.display()))?;
    let lines: Vec<&str> = content.lines().collect();

    let sensor = start_sensor(config)?;

    let pb = ProgressBar::new(lines.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .context("invalid progress template")?
            .progress_chars("#>-"),
    );

    let mut applied = 0;
    let mut skipped = 0;
    for (idx, line) in lines.iter().enumerate() {
        match observation::parse_line(line) {
            Ok(Some(obs)) => {
                obs.apply(&sensor);
                applied += 1;
            }
            Ok(None) => {}
            Err(e) if strict => {
                pb.abandon();
                sensor.shutdown();
                bail!("{}:{}: {}", file.display(), idx + 1, e);
            }
            Err(e) => {
                tracing::warn!(line = idx + 1, error = %e, "Skipping malformed observation");
                skipped += 1;
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("done");

    println!("Replayed {} observation(s) from {}", applied, file.display());
    if skipped > 0 {
        println!("Skipped {} malformed line(s)", skipped);
    }

    let pending = sensor.pending_count();
    print_summary(&sensor, pending);
    Ok(())
}

fn cmd_listen(config: &Config) -> Result<()> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        eprintln!("\nShutting down...");
        r.store(false, Ordering::SeqCst);
    })
    .context("failed to set Ctrl+C handler")?;

    let sensor = start_sensor(config)?;

    // stdin blocks, so read it on its own thread and poll the channel
    let (tx, rx) = mpsc::channel::<String>();
    thread::Builder::new()
        .name("devsensor-stdin".to_string())
        .spawn(move || {
            let stdin = std::io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        })
        .context("failed to spawn stdin reader")?;

    let mut applied = 0;
    while running.load(Ordering::SeqCst) {
        match rx.recv_timeout(Duration::from_millis(200)) {
            Ok(line) => match observation::parse_line(&line) {
                Ok(Some(obs)) => {
                    obs.apply(&sensor);
                    applied += 1;
                }
                Ok(None) => {}
                Err(e) => eprintln!("Skipping malformed observation: {}", e),
            },
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    println!("Received {} observation(s)", applied);
    let pending = sensor.pending_count();
    print_summary(&sensor, pending);
    Ok(())
}

fn cmd_ping(config: &Config) -> Result<()> {
    let collector = BlockingCollector::from_config(&config.sensor, "ping")
        .context("failed to create collector client")?;
    let Some(collector) = collector else {
        println!("Collector is not configured. Run 'status' for details.");
        return Ok(());
    };

    let url = collector.client().base_url().to_string();
    if collector.health_check()? {
        println!("Collector at {} is reachable", url);
        Ok(())
    } else {
        bail!("collector at {} is unreachable", url)
    }
}
