//! # Report Module
//!
//! Events emitted by the monitor and the sinks that present or record them.
//!
//! This module handles:
//! - The [`MonitorEvent`] vocabulary shared by all sinks
//! - Human-readable console reporting through `tracing`
//! - JSON-lines telemetry files with rotation
//!
//! Sinks only consume events. Nothing a sink does can change monitor state.

use serde::Serialize;

use crate::link::stats::LinkStats;
use crate::monitor::AlertFlags;
use crate::telemetry::frame::{LinkSample, TelemetryFrame};

pub mod console;
pub mod jsonl;

/// Discrete event produced by the monitor
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MonitorEvent {
    /// A reception decoded into a telemetry frame
    FrameAccepted {
        frame: TelemetryFrame,
        sample: LinkSample,
        /// Sequence ids skipped since the previous frame
        loss_delta: u64,
        /// Latched alert flags after this frame
        alerts: AlertFlags,
        /// Flags this frame raised for the first time
        newly_latched: AlertFlags,
    },

    /// A reception that failed to decode
    FrameCorrupted {
        raw_payload: String,
        reason: String,
        sample: LinkSample,
    },

    /// The link went from disconnected to connected
    VehicleConnected { vehicle_id: String, at_ms: u64 },

    /// The vehicle went silent for longer than the timeout
    ConnectionTimeout {
        vehicle_id: String,
        since_ms: u64,
        silent_for_ms: u64,
    },

    /// Periodic statistics report
    PeriodicSnapshot { stats: LinkStats },
}

impl MonitorEvent {
    /// Short event name, matching the serialized `event` tag
    pub fn name(&self) -> &'static str {
        match self {
            Self::FrameAccepted { .. } => "frame_accepted",
            Self::FrameCorrupted { .. } => "frame_corrupted",
            Self::VehicleConnected { .. } => "vehicle_connected",
            Self::ConnectionTimeout { .. } => "connection_timeout",
            Self::PeriodicSnapshot { .. } => "periodic_snapshot",
        }
    }
}

/// Consumer of monitor events
#[cfg_attr(test, mockall::automock)]
pub trait EventSink {
    /// Present or record one event
    fn emit(&mut self, event: &MonitorEvent);
}

impl EventSink for Vec<Box<dyn EventSink + Send>> {
    fn emit(&mut self, event: &MonitorEvent) {
        for sink in self.iter_mut() {
            sink.emit(event);
        }
    }
}
