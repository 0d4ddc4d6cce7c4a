//! # Pitstop Telemetry
//!
//! Pitstop-side receiver for electric vehicle telemetry sent over LoRa.
//!
//! Polls a serial-attached LoRa module, decodes each telemetry frame, and
//! reports link reliability, signal quality, and vehicle alerts.

use anyhow::{Context, Result};
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{error, info};

use pitstop_telemetry::config::Config;
use pitstop_telemetry::monitor::{MonotonicClock, TelemetryMonitor};
use pitstop_telemetry::radio::serial::SerialRadio;
use pitstop_telemetry::report::console::ConsoleReporter;
use pitstop_telemetry::report::jsonl::JsonlRecorder;
use pitstop_telemetry::report::EventSink;

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Main entry point for the pitstop receiver
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Set up non-blocking logging with tracing subscriber
///    - Load configuration (first argument, or `config/default.toml`)
///    - Open the LoRa module, retrying a bounded number of times
///
/// 2. **Main Loop**
///    - Poll the radio every `poll_interval_ms` (never waits for a packet)
///    - Emit a statistics snapshot every `periodic_report_interval_ms`
///    - Handle Ctrl+C for graceful shutdown
///
/// 3. **Shutdown**
///    - Emit a final snapshot so accumulated counters are not lost
///
/// # Errors
///
/// Returns error if:
/// - Configuration is missing or invalid
/// - The LoRa module cannot be opened
/// - The radio faults while running
///
/// # Examples
///
/// ```bash
/// cargo run --release -- config/default.toml
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging; stdout writes happen off the poll loop
    let (writer, _log_guard) = tracing_appender::non_blocking(std::io::stdout());
    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .init();

    info!("Pitstop Telemetry v{} starting...", env!("CARGO_PKG_VERSION"));

    let config_path = std::env::args().nth(1).unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let config = Config::load(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path))?;
    info!("Configuration loaded from {}", config_path);

    let mut radio = SerialRadio::open(&config.radio).await?;

    let mut sinks: Vec<Box<dyn EventSink + Send>> = vec![Box::new(ConsoleReporter::new())];
    if config.telemetry.enabled {
        sinks.push(Box::new(JsonlRecorder::new(&config.telemetry)?));
    }

    let clock = MonotonicClock::new();
    let mut monitor = TelemetryMonitor::new(&config.monitor, &config.alerts, clock.now_ms())?;

    let mut poll_interval = interval(Duration::from_millis(config.monitor.poll_interval_ms));
    poll_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut report_interval = interval(Duration::from_millis(config.monitor.periodic_report_interval_ms));
    report_interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately; skip the empty report
    report_interval.tick().await;

    info!(
        "Listening on {} (poll {} ms, timeout {} ms)",
        radio.device_path(),
        config.monitor.poll_interval_ms,
        config.monitor.timeout_ms
    );
    info!("Press Ctrl+C to exit");

    let result = loop {
        tokio::select! {
            _ = poll_interval.tick() => {
                if let Err(e) = monitor.poll(&mut radio, &mut sinks, clock.now_ms()) {
                    break Err(e);
                }
            }

            _ = report_interval.tick() => {
                monitor.report(&mut sinks, clock.now_ms());
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break Ok(());
            }
        }
    };

    monitor.report(&mut sinks, clock.now_ms());

    if let Err(e) = result {
        error!("Stopping on radio failure: {}", e);
        return Err(e.into());
    }

    Ok(())
}
