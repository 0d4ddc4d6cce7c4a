//! # Pitstop Telemetry Library
//!
//! Pitstop-side receiver for electric vehicle telemetry sent over LoRa.
//!
//! This library decodes the vehicle's JSON telemetry frames and monitors the
//! link: lost frames, signal quality, connection state, and derived
//! throughput statistics.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod link;
pub mod monitor;
pub mod radio;
pub mod report;
