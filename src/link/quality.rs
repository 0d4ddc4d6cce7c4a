//! # Link Quality Aggregator
//!
//! Running RSSI and SNR statistics over every reception, decoded or not.
//!
//! Averages are the exact cumulative mean (`sum / count`) computed on read.
//! Sums are kept in `f64`, which is ample for receptions arriving every few
//! seconds over a race day.

use serde::Serialize;

/// Coarse signal quality bucket derived from RSSI
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SignalQuality {
    /// RSSI above -50 dBm
    Excellent,
    /// RSSI above -70 dBm
    Good,
    /// RSSI above -85 dBm
    Fair,
    /// Anything weaker
    Poor,
}

impl SignalQuality {
    /// Classify an RSSI reading
    ///
    /// # Examples
    ///
    /// ```
    /// use pitstop_telemetry::link::quality::SignalQuality;
    ///
    /// assert_eq!(SignalQuality::from_rssi(-45.0), SignalQuality::Excellent);
    /// assert_eq!(SignalQuality::from_rssi(-70.0), SignalQuality::Fair);
    /// ```
    pub fn from_rssi(rssi_dbm: f64) -> Self {
        if rssi_dbm > -50.0 {
            Self::Excellent
        } else if rssi_dbm > -70.0 {
            Self::Good
        } else if rssi_dbm > -85.0 {
            Self::Fair
        } else {
            Self::Poor
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::Poor => "POOR",
        }
    }
}

impl std::fmt::Display for SignalQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best, worst, and running sum for one measured quantity
#[derive(Debug, Clone, Copy, PartialEq)]
struct Extrema {
    best: f64,
    worst: f64,
    sum: f64,
}

impl Extrema {
    // Seeds lose against any real sample
    const SEED: Self = Self {
        best: f64::NEG_INFINITY,
        worst: f64::INFINITY,
        sum: 0.0,
    };

    fn record(&mut self, value: f64) {
        self.best = self.best.max(value);
        self.worst = self.worst.min(value);
        self.sum += value;
    }
}

/// Aggregates RSSI and SNR across receptions
#[derive(Debug, Clone, PartialEq)]
pub struct LinkQualityAggregator {
    rssi: Extrema,
    snr: Extrema,
    sample_count: u64,
}

impl Default for LinkQualityAggregator {
    fn default() -> Self {
        Self {
            rssi: Extrema::SEED,
            snr: Extrema::SEED,
            sample_count: 0,
        }
    }
}

impl LinkQualityAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one reception's signal metrics
    ///
    /// # Arguments
    ///
    /// * `rssi_dbm` - Received signal strength in dBm
    /// * `snr_db` - Signal-to-noise ratio in dB
    pub fn record(&mut self, rssi_dbm: f64, snr_db: f64) {
        self.rssi.record(rssi_dbm);
        self.snr.record(snr_db);
        self.sample_count += 1;
    }

    /// Number of receptions recorded
    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    /// Strongest RSSI seen, in dBm
    pub fn best_rssi(&self) -> Option<f64> {
        self.observed(self.rssi.best)
    }

    /// Weakest RSSI seen, in dBm
    pub fn worst_rssi(&self) -> Option<f64> {
        self.observed(self.rssi.worst)
    }

    /// Mean RSSI over all receptions, in dBm
    pub fn average_rssi(&self) -> Option<f64> {
        self.mean(self.rssi.sum)
    }

    /// Best SNR seen, in dB
    pub fn best_snr(&self) -> Option<f64> {
        self.observed(self.snr.best)
    }

    /// Worst SNR seen, in dB
    pub fn worst_snr(&self) -> Option<f64> {
        self.observed(self.snr.worst)
    }

    /// Mean SNR over all receptions, in dB
    pub fn average_snr(&self) -> Option<f64> {
        self.mean(self.snr.sum)
    }

    fn observed(&self, value: f64) -> Option<f64> {
        (self.sample_count > 0).then_some(value)
    }

    fn mean(&self, sum: f64) -> Option<f64> {
        (self.sample_count > 0).then(|| sum / self.sample_count as f64)
    }
}
