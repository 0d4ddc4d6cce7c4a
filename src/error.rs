//! # Error Types
//!
//! Custom error types for the pitstop telemetry receiver using `thiserror`.

use thiserror::Error;

/// A reception that could not be turned into a [`TelemetryFrame`].
///
/// Carries a lossy UTF-8 echo of the received bytes so the reporter can show
/// exactly what came over the air.
///
/// [`TelemetryFrame`]: crate::telemetry::frame::TelemetryFrame
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{reason}")]
pub struct DecodeError {
    /// Why the payload was rejected
    pub reason: String,

    /// The payload as received (lossy UTF-8)
    pub raw_payload: String,
}

impl DecodeError {
    pub fn new(reason: impl Into<String>, raw: &[u8]) -> Self {
        Self {
            reason: reason.into(),
            raw_payload: String::from_utf8_lossy(raw).into_owned(),
        }
    }
}

/// Main error type for the pitstop telemetry receiver
#[derive(Debug, Error)]
pub enum PitstopError {
    /// Malformed or incomplete telemetry payload
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// Transceiver-level failure reported by the radio
    #[error("Radio fault: {0}")]
    RadioFault(String),

    /// Invalid configuration values
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Configuration file could not be parsed
    #[error("Configuration parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// Serial port errors
    #[error("Serial error: {0}")]
    Serial(String),

    /// No usable serial device
    #[error("Serial port not found (tried: {0})")]
    SerialPortNotFound(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for the pitstop telemetry receiver
pub type Result<T> = std::result::Result<T, PitstopError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_echoes_payload() {
        let err = DecodeError::new("missing field `id`", b"{\"vehicle_id\":\"V1\"}");
        assert_eq!(err.reason, "missing field `id`");
        assert_eq!(err.raw_payload, "{\"vehicle_id\":\"V1\"}");
        assert_eq!(err.to_string(), "missing field `id`");
    }

    #[test]
    fn test_decode_error_lossy_echo() {
        // Invalid UTF-8 is replaced, not rejected
        let err = DecodeError::new("bad bytes", &[0x7B, 0xFF, 0x7D]);
        assert_eq!(err.raw_payload, "{\u{FFFD}}");
    }

    #[test]
    fn test_error_display() {
        let err = PitstopError::RadioFault("serial port closed".to_string());
        assert_eq!(err.to_string(), "Radio fault: serial port closed");

        let err = PitstopError::Configuration("timeout_ms must be greater than 0".to_string());
        assert!(err.to_string().starts_with("Configuration error:"));
    }
}
