//! # Telemetry Frame Decoder
//!
//! Decodes the JSON payload sent by the vehicle into a [`TelemetryFrame`].
//!
//! The whole reception is one message; there is no length prefix. A payload
//! is accepted only if every required field is present with the expected
//! type. Unknown keys are ignored.

use super::frame::TelemetryFrame;
use crate::error::DecodeError;

/// Decode one reception into a telemetry frame
///
/// # Arguments
///
/// * `payload` - Raw bytes of the reception
///
/// # Returns
///
/// * `Result<TelemetryFrame, DecodeError>` - Decoded frame, or the reason it was rejected
///
/// # Errors
///
/// Returns error if:
/// - Payload is empty or not valid JSON
/// - A required field is missing or `null`
/// - A field has the wrong type (including fractional values for integer
///   fields and integers that don't fit their target type)
///
/// # Examples
///
/// ```
/// use pitstop_telemetry::telemetry::decoder::decode_frame;
///
/// let payload = br#"{"id":1,"vehicle_id":"V1","timestamp":100,
///     "battery":{"voltage":48,"current":10,"soc":85,"temp":30},
///     "motor":{"temp":40,"current":10,"rpm":1500,"efficiency":90},
///     "vehicle":{"speed":30,"energy_consumption":100}}"#;
///
/// let frame = decode_frame(payload).unwrap();
/// assert_eq!(frame.sequence_id, 1);
/// assert_eq!(frame.motor.rpm, 1500);
/// ```
pub fn decode_frame(payload: &[u8]) -> Result<TelemetryFrame, DecodeError> {
    if payload.is_empty() {
        return Err(DecodeError::new("Empty payload", payload));
    }

    serde_json::from_slice::<TelemetryFrame>(payload)
        .map_err(|e| DecodeError::new(format!("Invalid telemetry payload: {}", e), payload))
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_PAYLOAD: &str = r#"{"id":1,"vehicle_id":"V1","timestamp":100,"battery":{"voltage":48,"current":10,"soc":85,"temp":30},"motor":{"temp":40,"current":10,"rpm":1500,"efficiency":90},"vehicle":{"speed":30,"energy_consumption":100}}"#;

    #[test]
    fn test_decode_valid_frame() {
        let frame = decode_frame(VALID_PAYLOAD.as_bytes()).unwrap();

        assert_eq!(frame.sequence_id, 1);
        assert_eq!(frame.vehicle_id, "V1");
        assert_eq!(frame.timestamp_ms, 100);

        assert_eq!(frame.battery.voltage_v, 48.0);
        assert_eq!(frame.battery.current_a, 10.0);
        assert_eq!(frame.battery.soc_percent, 85.0);
        assert_eq!(frame.battery.temp_c, 30.0);

        assert_eq!(frame.motor.temp_c, 40.0);
        assert_eq!(frame.motor.current_a, 10.0);
        assert_eq!(frame.motor.rpm, 1500);
        assert_eq!(frame.motor.efficiency_percent, 90);

        assert_eq!(frame.vehicle.speed_kmh, 30.0);
        assert_eq!(frame.vehicle.energy_wh_per_km, 100.0);
    }

    #[test]
    fn test_decode_sender_firmware_payload() {
        // Shape produced by the vehicle firmware (one-decimal floats)
        let payload = r#"{"id":42,"timestamp":215000,"vehicle_id":"AKS-2025-001","battery":{"voltage":48.5,"current":15.3,"soc":85.2,"temp":32.1},"motor":{"temp":45.7,"current":12.8,"rpm":1850,"efficiency":94},"vehicle":{"speed":42.3,"energy_consumption":156.7}}"#;

        let frame = decode_frame(payload.as_bytes()).unwrap();
        assert_eq!(frame.sequence_id, 42);
        assert_eq!(frame.vehicle_id, "AKS-2025-001");
        assert!((frame.battery.soc_percent - 85.2).abs() < 1e-9);
        assert!((frame.vehicle.speed_kmh - 42.3).abs() < 1e-9);
    }

    #[test]
    fn test_decode_large_integers_exact() {
        let payload = VALID_PAYLOAD
            .replace(r#""id":1"#, r#""id":9007199254740993"#)
            .replace(r#""rpm":1500"#, r#""rpm":2147483647"#);

        let frame = decode_frame(payload.as_bytes()).unwrap();
        assert_eq!(frame.sequence_id, 9_007_199_254_740_993);
        assert_eq!(frame.motor.rpm, i32::MAX);
    }

    #[test]
    fn test_decode_missing_battery_temp() {
        let payload = VALID_PAYLOAD.replace(r#","temp":30"#, "");
        let err = decode_frame(payload.as_bytes()).unwrap_err();

        assert!(err.reason.contains("temp"), "reason: {}", err.reason);
        assert_eq!(err.raw_payload, payload);
    }

    #[test]
    fn test_decode_missing_top_level_field() {
        let payload = VALID_PAYLOAD.replace(r#""vehicle_id":"V1","#, "");
        assert!(decode_frame(payload.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_missing_section() {
        let payload = r#"{"id":1,"vehicle_id":"V1","timestamp":100,"battery":{"voltage":48,"current":10,"soc":85,"temp":30},"vehicle":{"speed":30,"energy_consumption":100}}"#;
        let err = decode_frame(payload.as_bytes()).unwrap_err();
        assert!(err.reason.contains("motor"), "reason: {}", err.reason);
    }

    #[test]
    fn test_decode_wrong_type() {
        let payload = VALID_PAYLOAD.replace(r#""soc":85"#, r#""soc":"85""#);
        assert!(decode_frame(payload.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_null_field() {
        let payload = VALID_PAYLOAD.replace(r#""speed":30"#, r#""speed":null"#);
        assert!(decode_frame(payload.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_fractional_integer_field() {
        let payload = VALID_PAYLOAD.replace(r#""rpm":1500"#, r#""rpm":1500.5"#);
        assert!(decode_frame(payload.as_bytes()).is_err());

        let payload = VALID_PAYLOAD.replace(r#""id":1"#, r#""id":1.0"#);
        assert!(decode_frame(payload.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_integer_out_of_range() {
        let payload = VALID_PAYLOAD.replace(r#""efficiency":90"#, r#""efficiency":3000000000"#);
        assert!(decode_frame(payload.as_bytes()).is_err());

        // Sender clock is unsigned
        let payload = VALID_PAYLOAD.replace(r#""timestamp":100"#, r#""timestamp":-1"#);
        assert!(decode_frame(payload.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_truncated_payload() {
        let payload = &VALID_PAYLOAD.as_bytes()[..VALID_PAYLOAD.len() / 2];
        let err = decode_frame(payload).unwrap_err();
        assert_eq!(err.raw_payload.as_bytes(), payload);
    }

    #[test]
    fn test_decode_empty_payload() {
        let err = decode_frame(&[]).unwrap_err();
        assert_eq!(err.reason, "Empty payload");
        assert!(err.raw_payload.is_empty());
    }

    #[test]
    fn test_decode_garbage_bytes() {
        assert!(decode_frame(&[0xFF, 0x00, 0x13, 0x37]).is_err());
        assert!(decode_frame(b"hello").is_err());
        assert!(decode_frame(b"[1,2,3]").is_err());
    }

    #[test]
    fn test_decode_trailing_garbage() {
        let payload = format!("{}xyz", VALID_PAYLOAD);
        assert!(decode_frame(payload.as_bytes()).is_err());
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let payload = VALID_PAYLOAD.replacen('{', r#"{"firmware":"1.2.0","#, 1);
        let frame = decode_frame(payload.as_bytes()).unwrap();
        assert_eq!(frame.sequence_id, 1);
    }

    #[test]
    fn test_decode_is_deterministic() {
        let a = decode_frame(VALID_PAYLOAD.as_bytes()).unwrap();
        let b = decode_frame(VALID_PAYLOAD.as_bytes()).unwrap();
        assert_eq!(a, b);
    }
}
