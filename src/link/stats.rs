//! # Link Statistics
//!
//! Point-in-time report derived from [`MonitorState`]. Nothing here is
//! stored between reports; every figure is recomputed from the counters.

use serde::Serialize;

use super::connection::ConnectionState;
use super::quality::SignalQuality;
use crate::monitor::{AlertFlags, MonitorState};

/// Best/worst/average of one signal metric
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignalSummary {
    pub best: f64,
    pub worst: f64,
    pub average: f64,
}

/// Snapshot of link reliability and quality
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkStats {
    /// Time since the monitor started (ms)
    pub uptime_ms: u64,

    pub total_received: u64,
    pub lost_count: u64,
    pub corrupted_count: u64,
    pub total_bytes: u64,

    /// Share of receptions that decoded (0-100%)
    pub success_rate: f64,
    pub packets_per_minute: f64,
    pub data_rate_bytes_per_sec: f64,

    /// RSSI in dBm, `None` before the first reception
    pub rssi: Option<SignalSummary>,
    /// SNR in dB, `None` before the first reception
    pub snr: Option<SignalSummary>,
    /// Bucket of the average RSSI
    pub signal_quality: Option<SignalQuality>,

    pub connection: ConnectionState,
    pub vehicle_id: String,
    pub last_sequence_id: Option<i64>,
    pub alerts: AlertFlags,
}

impl LinkStats {
    /// Derive a snapshot from the monitor state
    ///
    /// # Arguments
    ///
    /// * `state` - Accumulated monitor state
    /// * `now_ms` - Current receiver time (ms)
    pub fn from_state(state: &MonitorState, now_ms: u64) -> Self {
        let counters = &state.counters;
        let quality = &state.quality;
        let uptime_ms = now_ms.saturating_sub(state.started_at_ms);

        let success_rate = if counters.total_received == 0 {
            0.0
        } else {
            let decoded = counters.total_received.saturating_sub(counters.corrupted_count);
            decoded as f64 / counters.total_received as f64 * 100.0
        };

        let (packets_per_minute, data_rate_bytes_per_sec) = if uptime_ms == 0 {
            (0.0, 0.0)
        } else {
            (
                counters.total_received as f64 * 60_000.0 / uptime_ms as f64,
                counters.total_bytes as f64 * 1_000.0 / uptime_ms as f64,
            )
        };

        let rssi = summarize(quality.best_rssi(), quality.worst_rssi(), quality.average_rssi());
        let snr = summarize(quality.best_snr(), quality.worst_snr(), quality.average_snr());

        Self {
            uptime_ms,
            total_received: counters.total_received,
            lost_count: counters.lost_count,
            corrupted_count: counters.corrupted_count,
            total_bytes: counters.total_bytes,
            success_rate,
            packets_per_minute,
            data_rate_bytes_per_sec,
            rssi,
            snr,
            signal_quality: rssi.map(|r| SignalQuality::from_rssi(r.average)),
            connection: state.connection.state(),
            vehicle_id: state.connection.vehicle_id().to_string(),
            last_sequence_id: state.sequence.last_sequence_id(),
            alerts: state.alerts,
        }
    }
}

fn summarize(best: Option<f64>, worst: Option<f64>, average: Option<f64>) -> Option<SignalSummary> {
    Some(SignalSummary {
        best: best?,
        worst: worst?,
        average: average?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with(total: u64, corrupted: u64, bytes: u64) -> MonitorState {
        let mut state = MonitorState::new(15_000, 0);
        state.counters.total_received = total;
        state.counters.corrupted_count = corrupted;
        state.counters.total_bytes = bytes;
        state
    }

    #[test]
    fn test_empty_state() {
        let stats = LinkStats::from_state(&MonitorState::new(15_000, 0), 0);

        assert_eq!(stats.uptime_ms, 0);
        assert_eq!(stats.success_rate, 0.0);
        assert_eq!(stats.packets_per_minute, 0.0);
        assert_eq!(stats.data_rate_bytes_per_sec, 0.0);
        assert_eq!(stats.rssi, None);
        assert_eq!(stats.snr, None);
        assert_eq!(stats.signal_quality, None);
        assert_eq!(stats.connection, ConnectionState::Disconnected);
        assert_eq!(stats.last_sequence_id, None);
    }

    #[test]
    fn test_success_rate_all_decoded() {
        let stats = LinkStats::from_state(&state_with(12, 0, 0), 1_000);
        assert_eq!(stats.success_rate, 100.0);
    }

    #[test]
    fn test_success_rate_with_corruption() {
        let stats = LinkStats::from_state(&state_with(8, 2, 0), 1_000);
        assert_eq!(stats.success_rate, 75.0);

        let stats = LinkStats::from_state(&state_with(3, 3, 0), 1_000);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn test_success_rate_ignores_lost_frames() {
        // Lost frames were never received, so they don't lower the rate
        let mut state = state_with(4, 0, 0);
        state.counters.lost_count = 10;
        let stats = LinkStats::from_state(&state, 1_000);
        assert_eq!(stats.success_rate, 100.0);
        assert_eq!(stats.lost_count, 10);
    }

    #[test]
    fn test_rates() {
        // 12 receptions and 2400 bytes over 60 seconds
        let stats = LinkStats::from_state(&state_with(12, 0, 2_400), 60_000);

        assert_eq!(stats.uptime_ms, 60_000);
        assert_eq!(stats.packets_per_minute, 12.0);
        assert_eq!(stats.data_rate_bytes_per_sec, 40.0);
    }

    #[test]
    fn test_uptime_from_start_time() {
        let mut state = state_with(1, 0, 100);
        state.started_at_ms = 5_000;

        let stats = LinkStats::from_state(&state, 15_000);
        assert_eq!(stats.uptime_ms, 10_000);
        assert_eq!(stats.data_rate_bytes_per_sec, 10.0);

        // A clock reading before the start yields zero uptime, not a panic
        let stats = LinkStats::from_state(&state, 1_000);
        assert_eq!(stats.uptime_ms, 0);
        assert_eq!(stats.packets_per_minute, 0.0);
    }

    #[test]
    fn test_quality_summary() {
        let mut state = MonitorState::new(15_000, 0);
        for (rssi, snr) in [(-90.0, 2.0), (-40.0, 10.0), (-65.0, 6.0)] {
            state.quality.record(rssi, snr);
        }

        let stats = LinkStats::from_state(&state, 1_000);
        assert_eq!(stats.rssi, Some(SignalSummary { best: -40.0, worst: -90.0, average: -65.0 }));
        assert_eq!(stats.snr, Some(SignalSummary { best: 10.0, worst: 2.0, average: 6.0 }));
        assert_eq!(stats.signal_quality, Some(SignalQuality::Good));
    }

    #[test]
    fn test_success_rate_bounds() {
        for total in 0..20u64 {
            for corrupted in 0..=total {
                let stats = LinkStats::from_state(&state_with(total, corrupted, 0), 1_000);
                assert!((0.0..=100.0).contains(&stats.success_rate));
            }
        }
    }

    #[test]
    fn test_stats_serialize() {
        let stats = LinkStats::from_state(&state_with(2, 1, 300), 1_000);
        let json = serde_json::to_value(&stats).unwrap();

        assert_eq!(json["total_received"], 2);
        assert_eq!(json["success_rate"], 50.0);
        assert_eq!(json["connection"], "disconnected");
        assert!(json["rssi"].is_null());
    }
}
