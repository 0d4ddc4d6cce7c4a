//! # Telemetry Frame Types
//!
//! Typed view of one vehicle telemetry message, plus the physical-layer
//! metadata that accompanies every reception.
//!
//! Field names on the wire follow the vehicle firmware's JSON keys; the Rust
//! names carry their units.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Battery management system readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatteryReadings {
    /// Pack voltage in volts
    #[serde(rename = "voltage")]
    pub voltage_v: f64,

    /// Pack current in amperes
    #[serde(rename = "current")]
    pub current_a: f64,

    /// State of charge (0-100%)
    #[serde(rename = "soc")]
    pub soc_percent: f64,

    /// Pack temperature in °C
    #[serde(rename = "temp")]
    pub temp_c: f64,
}

/// Motor controller readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorReadings {
    /// Motor temperature in °C
    #[serde(rename = "temp")]
    pub temp_c: f64,

    /// Motor current in amperes
    #[serde(rename = "current")]
    pub current_a: f64,

    /// Shaft speed in revolutions per minute
    pub rpm: i32,

    /// Motor efficiency (0-100%)
    #[serde(rename = "efficiency")]
    pub efficiency_percent: i32,
}

/// Vehicle dynamics readings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleReadings {
    /// Ground speed in km/h
    #[serde(rename = "speed")]
    pub speed_kmh: f64,

    /// Energy consumption in Wh/km
    #[serde(rename = "energy_consumption")]
    pub energy_wh_per_km: f64,
}

/// One decoded telemetry message.
///
/// Only produced by [`decode_frame`](super::decoder::decode_frame), which
/// either fills every field or rejects the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryFrame {
    /// Sender-assigned, monotonically increasing counter
    #[serde(rename = "id")]
    pub sequence_id: i64,

    /// Vehicle identifier (e.g. "AKS-2025-001")
    pub vehicle_id: String,

    /// Sender clock in milliseconds; not synchronized with the receiver
    #[serde(rename = "timestamp")]
    pub timestamp_ms: u64,

    pub battery: BatteryReadings,
    pub motor: MotorReadings,
    pub vehicle: VehicleReadings,
}

/// Physical-layer metadata for one reception.
///
/// Exists for every reception, whether or not the payload decodes.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinkSample {
    /// Received signal strength in dBm
    pub rssi_dbm: f64,

    /// Signal-to-noise ratio in dB
    pub snr_db: f64,

    /// Payload size in bytes
    pub size_bytes: usize,

    /// Receiver clock at arrival, in milliseconds since monitor start
    pub arrived_at_ms: u64,
}

/// Raw bytes of one reception, as handed over by the radio
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reception {
    pub payload: Bytes,
    pub size_bytes: usize,
}

impl Reception {
    /// Wrap a payload, taking its length as the reception size
    pub fn new(payload: impl Into<Bytes>) -> Self {
        let payload = payload.into();
        let size_bytes = payload.len();
        Self { payload, size_bytes }
    }
}
