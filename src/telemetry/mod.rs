//! # Telemetry Module
//!
//! Vehicle telemetry payloads received over the LoRa link.
//!
//! This module handles:
//! - Typed telemetry frames (battery, motor, vehicle readings)
//! - Physical-layer reception metadata (RSSI, SNR, size)
//! - Decoding and validating the JSON wire payload

pub mod frame;
pub mod decoder;
