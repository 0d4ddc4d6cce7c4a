//! # Link Module
//!
//! Reliability and quality tracking for the vehicle → pitstop LoRa link.
//!
//! This module handles:
//! - Lost frame detection from the sender's sequence counter
//! - RSSI/SNR best, worst, and average
//! - Connected/Disconnected state with single-fire timeout
//! - Derived statistics (success rate, throughput, packet rate)

pub mod sequence;
pub mod quality;
pub mod connection;
pub mod stats;
