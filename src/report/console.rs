//! # Console Reporter
//!
//! Human-readable reporting through `tracing`, laid out for the pit wall.
//!
//! Receptions, connects, and snapshots log at `info!`. Lost frames,
//! corrupted receptions, timeouts, and newly latched alerts log at `warn!`.
//! Each line is built by a `describe_*` function so the wording can be
//! checked without a subscriber.

use tracing::{info, warn};

use super::{EventSink, MonitorEvent};
use crate::link::quality::SignalQuality;
use crate::link::stats::LinkStats;
use crate::monitor::AlertFlags;
use crate::telemetry::frame::{LinkSample, TelemetryFrame};

/// Logs every event in a pit-wall friendly format
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

/// Names of the set flags, e.g. `"LOW BATTERY, OVERSPEED"`
pub fn describe_alerts(alerts: &AlertFlags) -> String {
    let mut names = Vec::new();
    if alerts.low_battery {
        names.push("LOW BATTERY");
    }
    if alerts.high_temp {
        names.push("HIGH TEMPERATURE");
    }
    if alerts.overspeed {
        names.push("OVERSPEED");
    }
    names.join(", ")
}

/// Header line for an accepted frame: sequence, sender, and link metrics
pub fn describe_reception(frame: &TelemetryFrame, sample: &LinkSample) -> String {
    format!(
        "Frame #{} from {} | {} bytes | RSSI {:.0} dBm ({}) | SNR {:.1} dB | sent at {}s",
        frame.sequence_id,
        frame.vehicle_id,
        sample.size_bytes,
        sample.rssi_dbm,
        SignalQuality::from_rssi(sample.rssi_dbm),
        sample.snr_db,
        frame.timestamp_ms / 1000
    )
}

/// Battery, motor, and vehicle readings, one line each
pub fn describe_readings(frame: &TelemetryFrame) -> [String; 3] {
    let battery = &frame.battery;
    let motor = &frame.motor;
    let vehicle = &frame.vehicle;

    [
        format!(
            "  Battery: {:.1} V, {:.1} A, {:.1}%, {:.1}°C",
            battery.voltage_v, battery.current_a, battery.soc_percent, battery.temp_c
        ),
        format!(
            "  Motor:   {:.1}°C, {:.1} A, {} RPM, {}%",
            motor.temp_c, motor.current_a, motor.rpm, motor.efficiency_percent
        ),
        format!("  Vehicle: {:.1} km/h, {:.1} Wh/km", vehicle.speed_kmh, vehicle.energy_wh_per_km),
    ]
}

pub fn describe_corrupted(reason: &str, sample: &LinkSample) -> String {
    format!(
        "Corrupted reception ({} bytes, RSSI {:.0} dBm): {}",
        sample.size_bytes, sample.rssi_dbm, reason
    )
}

pub fn describe_timeout(vehicle_id: &str, silent_for_ms: u64) -> String {
    format!(
        "Vehicle {} communication timeout: no telemetry for {:.1}s",
        vehicle_id,
        silent_for_ms as f64 / 1000.0
    )
}

/// Counter and throughput line of a snapshot
pub fn describe_stats(stats: &LinkStats) -> String {
    format!(
        "Stats: total {} | lost {} | corrupted {} | success {:.1}% | {:.1} pkt/min | {:.1} B/s | uptime {}s | {}",
        stats.total_received,
        stats.lost_count,
        stats.corrupted_count,
        stats.success_rate,
        stats.packets_per_minute,
        stats.data_rate_bytes_per_sec,
        stats.uptime_ms / 1000,
        stats.connection
    )
}

/// Signal line of a snapshot, `None` before the first reception
pub fn describe_signal(stats: &LinkStats) -> Option<String> {
    let (rssi, snr) = (stats.rssi?, stats.snr?);
    Some(format!(
        "Signal: RSSI avg {:.1} / best {:.0} / worst {:.0} dBm | SNR avg {:.1} / best {:.1} / worst {:.1} dB",
        rssi.average, rssi.best, rssi.worst, snr.average, snr.best, snr.worst
    ))
}

fn log_snapshot(stats: &LinkStats) {
    info!("{}", describe_stats(stats));

    if let Some(signal) = describe_signal(stats) {
        info!("{}", signal);
    }

    if stats.alerts.any() {
        warn!("Latched alerts: {}", describe_alerts(&stats.alerts));
    }
}

impl EventSink for ConsoleReporter {
    fn emit(&mut self, event: &MonitorEvent) {
        match event {
            MonitorEvent::FrameAccepted { frame, sample, loss_delta, newly_latched, .. } => {
                info!("{}", describe_reception(frame, sample));
                for line in describe_readings(frame) {
                    info!("{}", line);
                }

                if *loss_delta > 0 {
                    warn!("Lost {} frame(s) before #{}", loss_delta, frame.sequence_id);
                }
                if newly_latched.any() {
                    warn!("ALERT: {}", describe_alerts(newly_latched));
                }
            }

            MonitorEvent::FrameCorrupted { raw_payload, reason, sample } => {
                warn!("{}", describe_corrupted(reason, sample));
                warn!("  Raw data: {}", raw_payload);
            }

            MonitorEvent::VehicleConnected { vehicle_id, .. } => {
                info!("Vehicle {} connected", vehicle_id);
            }

            MonitorEvent::ConnectionTimeout { vehicle_id, silent_for_ms, .. } => {
                warn!("{}", describe_timeout(vehicle_id, *silent_for_ms));
            }

            MonitorEvent::PeriodicSnapshot { stats } => log_snapshot(stats),
        }
    }
}
