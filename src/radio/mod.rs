//! # Radio Module
//!
//! Boundary between the monitor and the LoRa receiver hardware.
//!
//! This module handles:
//! - The [`Radio`] trait the monitor polls each cycle
//! - A serial-attached LoRa receiver module ([`serial::SerialRadio`])

use crate::error::Result;
use crate::telemetry::frame::Reception;

pub mod serial;

/// Source of physical-layer receptions
///
/// Every method must return immediately. Signal metrics describe the most
/// recent reception returned by [`poll_reception`](Radio::poll_reception).
#[cfg_attr(test, mockall::automock)]
pub trait Radio {
    /// Take the next pending reception, if any
    ///
    /// # Errors
    ///
    /// Returns `PitstopError::RadioFault` if the transceiver has failed
    fn poll_reception(&mut self) -> Result<Option<Reception>>;

    /// RSSI of the last reception, in dBm
    fn last_rssi_dbm(&self) -> f64;

    /// SNR of the last reception, in dB
    fn last_snr_db(&self) -> f64;
}
