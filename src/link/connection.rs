//! # Connection Monitor
//!
//! Two-state machine reporting whether the vehicle is currently heard.
//!
//! ```text
//!                 decoded frame
//!   Disconnected ───────────────▶ Connected ──┐ decoded frame
//!        ▲                            │  ◀────┘ (refresh arrival time)
//!        └────────────────────────────┘
//!          idle poll, now - last_arrival > timeout
//! ```
//!
//! Both transitions are edges: the timeout fires once when the link drops
//! and stays quiet until a frame brings the link back. Only decoded frames
//! count as arrivals; corrupted receptions never touch this machine.

use serde::Serialize;

/// Whether the vehicle is currently heard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => f.write_str("DISCONNECTED"),
            Self::Connected => f.write_str("CONNECTED"),
        }
    }
}

/// One-shot notice produced when the link times out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTimeout {
    /// Last vehicle heard
    pub vehicle_id: String,

    /// Receiver time of the last decoded frame (ms)
    pub since_ms: u64,

    /// How long the vehicle had been silent when the timeout fired (ms)
    pub silent_for_ms: u64,
}

/// Connected/Disconnected state machine driven by arrivals and idle polls
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionMonitor {
    state: ConnectionState,
    last_arrival_ms: u64,
    vehicle_id: String,
    timeout_ms: u64,
}

impl ConnectionMonitor {
    /// Create a monitor in the `Disconnected` state
    ///
    /// # Arguments
    ///
    /// * `timeout_ms` - Silence longer than this drops the connection
    pub fn new(timeout_ms: u64) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            last_arrival_ms: 0,
            vehicle_id: String::new(),
            timeout_ms,
        }
    }

    /// Register a successfully decoded frame
    ///
    /// # Returns
    ///
    /// * `bool` - `true` if this frame moved the link from `Disconnected` to `Connected`
    pub fn on_frame(&mut self, now_ms: u64, vehicle_id: &str) -> bool {
        let was_disconnected = self.state == ConnectionState::Disconnected;

        self.state = ConnectionState::Connected;
        self.last_arrival_ms = now_ms;
        if self.vehicle_id != vehicle_id {
            self.vehicle_id = vehicle_id.to_string();
        }

        was_disconnected
    }

    /// Evaluate the timeout on a poll with no reception
    ///
    /// # Returns
    ///
    /// * `Option<ConnectionTimeout>` - `Some` exactly once per connected period,
    ///   on the first idle poll past the timeout
    pub fn check_timeout(&mut self, now_ms: u64) -> Option<ConnectionTimeout> {
        if self.state != ConnectionState::Connected {
            return None;
        }

        let silent_for_ms = now_ms.saturating_sub(self.last_arrival_ms);
        if silent_for_ms <= self.timeout_ms {
            return None;
        }

        self.state = ConnectionState::Disconnected;
        Some(ConnectionTimeout {
            vehicle_id: self.vehicle_id.clone(),
            since_ms: self.last_arrival_ms,
            silent_for_ms,
        })
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Receiver time of the last decoded frame (0 before the first one)
    pub fn last_arrival_ms(&self) -> u64 {
        self.last_arrival_ms
    }

    /// Last vehicle heard (empty before the first frame)
    pub fn vehicle_id(&self) -> &str {
        &self.vehicle_id
    }

    pub fn timeout_ms(&self) -> u64 {
        self.timeout_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TIMEOUT_MS: u64 = 15_000;

    #[test]
    fn test_initial_state() {
        let monitor = ConnectionMonitor::new(TIMEOUT_MS);
        assert_eq!(monitor.state(), ConnectionState::Disconnected);
        assert!(!monitor.is_connected());
        assert_eq!(monitor.vehicle_id(), "");
        assert_eq!(monitor.timeout_ms(), TIMEOUT_MS);
    }

    #[test]
    fn test_idle_while_disconnected_never_fires() {
        let mut monitor = ConnectionMonitor::new(TIMEOUT_MS);
        assert_eq!(monitor.check_timeout(1_000_000), None);
        assert_eq!(monitor.state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_first_frame_connects_once() {
        let mut monitor = ConnectionMonitor::new(TIMEOUT_MS);

        assert!(monitor.on_frame(1_000, "V1"));
        assert_eq!(monitor.state(), ConnectionState::Connected);
        assert_eq!(monitor.last_arrival_ms(), 1_000);
        assert_eq!(monitor.vehicle_id(), "V1");

        // Further frames refresh arrival time without another edge
        assert!(!monitor.on_frame(6_000, "V1"));
        assert_eq!(monitor.last_arrival_ms(), 6_000);
    }

    #[test]
    fn test_timeout_fires_exactly_once() {
        let mut monitor = ConnectionMonitor::new(TIMEOUT_MS);
        monitor.on_frame(1_000, "V1");

        // Exactly at the threshold is still connected
        assert_eq!(monitor.check_timeout(1_000 + TIMEOUT_MS), None);
        assert!(monitor.is_connected());

        let notice = monitor.check_timeout(1_000 + TIMEOUT_MS + 1).unwrap();
        assert_eq!(notice.vehicle_id, "V1");
        assert_eq!(notice.since_ms, 1_000);
        assert_eq!(notice.silent_for_ms, TIMEOUT_MS + 1);
        assert_eq!(monitor.state(), ConnectionState::Disconnected);

        // Second idle poll past the threshold stays silent
        assert_eq!(monitor.check_timeout(1_000 + TIMEOUT_MS + 100), None);
        assert_eq!(monitor.check_timeout(1_000 + 10 * TIMEOUT_MS), None);
    }

    #[test]
    fn test_reconnect_after_timeout() {
        let mut monitor = ConnectionMonitor::new(TIMEOUT_MS);
        monitor.on_frame(0, "V1");
        assert!(monitor.check_timeout(20_000).is_some());

        assert!(monitor.on_frame(25_000, "V1"));
        assert!(monitor.is_connected());

        // A new connected period can time out again
        assert_eq!(monitor.check_timeout(30_000), None);
        let notice = monitor.check_timeout(40_001).unwrap();
        assert_eq!(notice.since_ms, 25_000);
    }

    #[test]
    fn test_frames_keep_link_alive() {
        let mut monitor = ConnectionMonitor::new(TIMEOUT_MS);
        for t in (0..120_000).step_by(5_000) {
            monitor.on_frame(t, "V1");
            assert_eq!(monitor.check_timeout(t + 100), None);
        }
        assert!(monitor.is_connected());
    }

    #[test]
    fn test_vehicle_id_follows_frames() {
        let mut monitor = ConnectionMonitor::new(TIMEOUT_MS);
        monitor.on_frame(0, "V1");
        monitor.on_frame(10, "V2");
        assert_eq!(monitor.vehicle_id(), "V2");
    }

    #[test]
    fn test_clock_behind_last_arrival_does_not_fire() {
        let mut monitor = ConnectionMonitor::new(TIMEOUT_MS);
        monitor.on_frame(50_000, "V1");
        assert_eq!(monitor.check_timeout(10_000), None);
        assert!(monitor.is_connected());
    }

    #[test]
    fn test_state_display() {
        assert_eq!(ConnectionState::Connected.to_string(), "CONNECTED");
        assert_eq!(ConnectionState::Disconnected.to_string(), "DISCONNECTED");
    }
}
