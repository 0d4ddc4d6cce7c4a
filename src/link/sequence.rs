//! # Sequence Tracker
//!
//! Detects lost frames from the sender's sequence counter.
//!
//! The gap between two consecutive accepted frames is
//! `max(0, id - last_id - 1)`. The tracker always re-baselines on the newest
//! id, so a sender reboot (counter back to 0) or a duplicate reports no loss
//! and tracking continues from the new value. Reordered or repeated frames
//! are not otherwise detected.

/// Tracks the last accepted sequence id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceTracker {
    last_sequence_id: Option<i64>,
}

impl SequenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Observe the sequence id of an accepted frame
    ///
    /// # Arguments
    ///
    /// * `sequence_id` - Sender-assigned id of the frame
    ///
    /// # Returns
    ///
    /// * `u64` - Number of ids skipped since the previous frame (0 on the first
    ///   observation, and whenever the id did not move forward by more than one)
    ///
    /// # Examples
    ///
    /// ```
    /// use pitstop_telemetry::link::sequence::SequenceTracker;
    ///
    /// let mut tracker = SequenceTracker::new();
    /// assert_eq!(tracker.observe(0), 0);
    /// assert_eq!(tracker.observe(1), 0);
    /// assert_eq!(tracker.observe(5), 3);
    /// ```
    pub fn observe(&mut self, sequence_id: i64) -> u64 {
        let lost = match self.last_sequence_id {
            // i128 so extreme ids cannot overflow the subtraction
            Some(last) => (sequence_id as i128 - last as i128 - 1).max(0) as u64,
            None => 0,
        };
        self.last_sequence_id = Some(sequence_id);
        lost
    }

    /// Id of the last accepted frame, if any
    pub fn last_sequence_id(&self) -> Option<i64> {
        self.last_sequence_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_observation_is_baseline() {
        let mut tracker = SequenceTracker::new();
        assert_eq!(tracker.last_sequence_id(), None);

        // A first id far from zero is not a loss
        assert_eq!(tracker.observe(500), 0);
        assert_eq!(tracker.last_sequence_id(), Some(500));
    }

    #[test]
    fn test_gap_sequence() {
        let mut tracker = SequenceTracker::new();
        let gaps: Vec<u64> = [0, 1, 2, 5, 6].iter().map(|&id| tracker.observe(id)).collect();

        assert_eq!(gaps, vec![0, 0, 0, 2, 0]);
        assert_eq!(gaps.iter().sum::<u64>(), 2);
    }

    #[test]
    fn test_cumulative_loss_for_increasing_ids() {
        let ids = [3i64, 4, 7, 8, 9, 15, 16, 40];
        let mut tracker = SequenceTracker::new();
        let total: u64 = ids.iter().map(|&id| tracker.observe(id)).sum();

        let first = ids[0];
        let last = ids[ids.len() - 1];
        assert_eq!(total as i64, last - first + 1 - ids.len() as i64);
    }

    #[test]
    fn test_duplicate_reports_no_loss() {
        let mut tracker = SequenceTracker::new();
        tracker.observe(10);
        assert_eq!(tracker.observe(10), 0);
        assert_eq!(tracker.observe(11), 0);
    }

    #[test]
    fn test_sender_reset_rebaselines() {
        // Sender rebooted: counter restarts at 0. No loss is reported and
        // the next gap is measured from the new baseline.
        let mut tracker = SequenceTracker::new();
        tracker.observe(100);
        assert_eq!(tracker.observe(0), 0);
        assert_eq!(tracker.last_sequence_id(), Some(0));
        assert_eq!(tracker.observe(3), 2);
    }

    #[test]
    fn test_out_of_order_frame() {
        let mut tracker = SequenceTracker::new();
        tracker.observe(5);
        assert_eq!(tracker.observe(4), 0);
        // Moving back to 6 after 4 counts 5 as lost again
        assert_eq!(tracker.observe(6), 1);
    }

    #[test]
    fn test_extreme_ids_do_not_overflow() {
        let mut tracker = SequenceTracker::new();
        tracker.observe(i64::MIN);
        assert_eq!(tracker.observe(i64::MAX), u64::MAX - 1);
        assert_eq!(tracker.observe(i64::MIN), 0);
    }
}
