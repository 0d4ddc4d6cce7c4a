//! # Telemetry Monitor
//!
//! Composes the decoder, sequence tracker, quality aggregator, and connection
//! state machine into one poll cycle.
//!
//! All mutable state lives in a single [`MonitorState`] owned by the
//! [`TelemetryMonitor`]. The monitor never blocks: each [`poll`] asks the
//! radio for a pending reception and returns immediately when there is none.
//! The caller re-invokes it at a fixed interval.
//!
//! ## Usage
//!
//! ```no_run
//! use pitstop_telemetry::config::{AlertConfig, MonitorConfig};
//! use pitstop_telemetry::monitor::{MonotonicClock, TelemetryMonitor};
//! # use pitstop_telemetry::radio::Radio;
//! # use pitstop_telemetry::report::EventSink;
//! # fn run(radio: &mut dyn Radio, sink: &mut dyn EventSink) -> pitstop_telemetry::error::Result<()> {
//!
//! let clock = MonotonicClock::new();
//! let mut monitor = TelemetryMonitor::new(&MonitorConfig::default(), &AlertConfig::default(), clock.now_ms())?;
//!
//! loop {
//!     monitor.poll(radio, sink, clock.now_ms())?;
//!     // sleep for the poll interval...
//! }
//! # }
//! ```
//!
//! [`poll`]: TelemetryMonitor::poll

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::config::{AlertConfig, MonitorConfig};
use crate::error::Result;
use crate::link::connection::ConnectionMonitor;
use crate::link::quality::LinkQualityAggregator;
use crate::link::sequence::SequenceTracker;
use crate::link::stats::LinkStats;
use crate::radio::Radio;
use crate::report::{EventSink, MonitorEvent};
use crate::telemetry::decoder::decode_frame;
use crate::telemetry::frame::{LinkSample, Reception, TelemetryFrame};

/// Latched vehicle alerts
///
/// A flag, once set, stays set for the life of the monitor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AlertFlags {
    /// Battery state of charge below threshold
    pub low_battery: bool,
    /// Battery or motor temperature above threshold
    pub high_temp: bool,
    /// Vehicle speed above threshold
    pub overspeed: bool,
}

impl AlertFlags {
    /// Conditions present in a single frame
    pub fn evaluate(frame: &TelemetryFrame, thresholds: &AlertConfig) -> Self {
        Self {
            low_battery: frame.battery.soc_percent < thresholds.low_soc_percent,
            high_temp: frame.battery.temp_c > thresholds.battery_temp_c
                || frame.motor.temp_c > thresholds.motor_temp_c,
            overspeed: frame.vehicle.speed_kmh > thresholds.overspeed_kmh,
        }
    }

    /// Latch `raised` into these flags, returning the flags that were newly set
    pub fn latch(&mut self, raised: AlertFlags) -> AlertFlags {
        let newly = AlertFlags {
            low_battery: raised.low_battery && !self.low_battery,
            high_temp: raised.high_temp && !self.high_temp,
            overspeed: raised.overspeed && !self.overspeed,
        };

        self.low_battery |= raised.low_battery;
        self.high_temp |= raised.high_temp;
        self.overspeed |= raised.overspeed;

        newly
    }

    pub fn any(&self) -> bool {
        self.low_battery || self.high_temp || self.overspeed
    }
}

/// Reception counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counters {
    /// Every physical reception, decoded or not
    pub total_received: u64,
    /// Sequence ids skipped between accepted frames
    pub lost_count: u64,
    /// Receptions that failed to decode
    pub corrupted_count: u64,
    /// Payload bytes over all receptions
    pub total_bytes: u64,
}

/// Everything the monitor accumulates over its lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorState {
    pub counters: Counters,
    pub sequence: SequenceTracker,
    pub quality: LinkQualityAggregator,
    pub connection: ConnectionMonitor,
    pub alerts: AlertFlags,
    /// Receiver time the monitor started (ms)
    pub started_at_ms: u64,
}

impl MonitorState {
    /// Zeroed state, disconnected
    pub fn new(timeout_ms: u64, started_at_ms: u64) -> Self {
        Self {
            counters: Counters::default(),
            sequence: SequenceTracker::new(),
            quality: LinkQualityAggregator::new(),
            connection: ConnectionMonitor::new(timeout_ms),
            alerts: AlertFlags::default(),
            started_at_ms,
        }
    }
}

/// What one poll cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No reception pending, link state unchanged
    Idle,
    /// No reception pending and the link just timed out
    TimedOut,
    /// A frame decoded; carries the sequence gap it revealed
    Accepted { loss_delta: u64 },
    /// A reception failed to decode
    Corrupted,
}

/// Milliseconds since construction, from a monotonic clock
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    start: Instant,
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self { start: Instant::now() }
    }

    pub fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Receiving-side link monitor for one vehicle
#[derive(Debug, Clone)]
pub struct TelemetryMonitor {
    state: MonitorState,
    thresholds: AlertConfig,
}

impl TelemetryMonitor {
    /// Create a monitor with zeroed counters in the `Disconnected` state
    ///
    /// # Arguments
    ///
    /// * `config` - Timing configuration
    /// * `thresholds` - Alert thresholds
    /// * `started_at_ms` - Receiver time of monitor start, the origin for uptime
    ///
    /// # Errors
    ///
    /// Returns `PitstopError::Configuration` if the timing or thresholds are invalid
    pub fn new(config: &MonitorConfig, thresholds: &AlertConfig, started_at_ms: u64) -> Result<Self> {
        config.validate()?;
        thresholds.validate()?;

        Ok(Self {
            state: MonitorState::new(config.timeout_ms, started_at_ms),
            thresholds: *thresholds,
        })
    }

    /// Run one poll cycle
    ///
    /// Asks the radio for a pending reception. If there is none, evaluates the
    /// connection timeout. Otherwise records the link sample and decodes the
    /// payload.
    ///
    /// # Arguments
    ///
    /// * `radio` - Source of receptions and signal metrics
    /// * `sink` - Destination for emitted events
    /// * `now_ms` - Current receiver time (ms)
    ///
    /// # Returns
    ///
    /// * `Result<PollOutcome>` - What this cycle did
    ///
    /// # Errors
    ///
    /// Returns `PitstopError::RadioFault` if the radio reports a failure.
    /// Decode failures are never errors; they become events.
    pub fn poll<R, S>(&mut self, radio: &mut R, sink: &mut S, now_ms: u64) -> Result<PollOutcome>
    where
        R: Radio + ?Sized,
        S: EventSink + ?Sized,
    {
        let Some(reception) = radio.poll_reception()? else {
            return Ok(self.idle(sink, now_ms));
        };

        let sample = LinkSample {
            rssi_dbm: radio.last_rssi_dbm(),
            snr_db: radio.last_snr_db(),
            size_bytes: reception.size_bytes,
            arrived_at_ms: now_ms,
        };

        Ok(self.process_reception(&reception, sample, sink))
    }

    /// Account for one reception and its signal metrics
    pub fn process_reception<S>(&mut self, reception: &Reception, sample: LinkSample, sink: &mut S) -> PollOutcome
    where
        S: EventSink + ?Sized,
    {
        debug!(
            "Reception: {} bytes, RSSI {:.0} dBm, SNR {:.1} dB",
            sample.size_bytes, sample.rssi_dbm, sample.snr_db
        );

        self.state.quality.record(sample.rssi_dbm, sample.snr_db);

        let counters = &mut self.state.counters;
        counters.total_received = counters.total_received.saturating_add(1);
        counters.total_bytes = counters.total_bytes.saturating_add(sample.size_bytes as u64);

        match decode_frame(&reception.payload) {
            Ok(frame) => self.accept(frame, sample, sink),
            Err(e) => {
                self.state.counters.corrupted_count = self.state.counters.corrupted_count.saturating_add(1);
                debug!("Decode failed ({} bytes): {}", sample.size_bytes, e.reason);

                sink.emit(&MonitorEvent::FrameCorrupted {
                    raw_payload: e.raw_payload,
                    reason: e.reason,
                    sample,
                });
                PollOutcome::Corrupted
            }
        }
    }

    fn accept<S>(&mut self, frame: TelemetryFrame, sample: LinkSample, sink: &mut S) -> PollOutcome
    where
        S: EventSink + ?Sized,
    {
        let loss_delta = self.state.sequence.observe(frame.sequence_id);
        // A sender jumping across the whole id range reports a gap near u64::MAX
        self.state.counters.lost_count = self.state.counters.lost_count.saturating_add(loss_delta);
        if loss_delta > 0 {
            debug!("Sequence gap of {} before #{}", loss_delta, frame.sequence_id);
        }

        if self.state.connection.on_frame(sample.arrived_at_ms, &frame.vehicle_id) {
            debug!("Link up: {}", frame.vehicle_id);
            sink.emit(&MonitorEvent::VehicleConnected {
                vehicle_id: frame.vehicle_id.clone(),
                at_ms: sample.arrived_at_ms,
            });
        }

        let newly_latched = self.state.alerts.latch(AlertFlags::evaluate(&frame, &self.thresholds));
        if newly_latched.any() {
            debug!("Alerts latched by frame #{}: {:?}", frame.sequence_id, newly_latched);
        }

        sink.emit(&MonitorEvent::FrameAccepted {
            frame,
            sample,
            loss_delta,
            alerts: self.state.alerts,
            newly_latched,
        });

        PollOutcome::Accepted { loss_delta }
    }

    fn idle<S>(&mut self, sink: &mut S, now_ms: u64) -> PollOutcome
    where
        S: EventSink + ?Sized,
    {
        let Some(timeout) = self.state.connection.check_timeout(now_ms) else {
            return PollOutcome::Idle;
        };

        debug!("Link down: {} silent for {} ms", timeout.vehicle_id, timeout.silent_for_ms);
        sink.emit(&MonitorEvent::ConnectionTimeout {
            vehicle_id: timeout.vehicle_id,
            since_ms: timeout.since_ms,
            silent_for_ms: timeout.silent_for_ms,
        });
        PollOutcome::TimedOut
    }

    /// Current statistics, derived fresh from the state
    pub fn snapshot(&self, now_ms: u64) -> LinkStats {
        LinkStats::from_state(&self.state, now_ms)
    }

    /// Emit a periodic statistics snapshot
    pub fn report<S>(&self, sink: &mut S, now_ms: u64) -> LinkStats
    where
        S: EventSink + ?Sized,
    {
        let stats = self.snapshot(now_ms);
        sink.emit(&MonitorEvent::PeriodicSnapshot { stats: stats.clone() });
        stats
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }
}
