//! Logpoint lifecycle tracking.
//!
//! A logpoint hit moves through `Loading → Result → Cleared`, keyed by
//! its log group. The tracker enforces that groups never move backward
//! and that clears are idempotent.

use std::collections::HashMap;

use tracing::debug;

/// Lifecycle state of one log group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogGroupState {
    /// The target is evaluating the hit; a placeholder packet is shown.
    Loading,
    /// At least one evaluation result arrived.
    Result,
    /// The logpoint was removed; terminal for this group id.
    Cleared,
}

/// Tracks the lifecycle state of every known log group.
#[derive(Debug, Default)]
pub struct LogpointTracker {
    groups: HashMap<String, LogGroupState>,
}

impl LogpointTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the start of a hit evaluation.
    ///
    /// Returns `false` when the packet must be dropped: the group was
    /// already cleared, and a re-enabled logpoint gets a fresh group id.
    pub fn begin_loading(&mut self, log_group_id: &str) -> bool {
        match self.groups.get(log_group_id) {
            Some(LogGroupState::Cleared) => {
                debug!("dropping loading for cleared log group {}", log_group_id);
                false
            }
            _ => {
                self.groups
                    .insert(log_group_id.to_string(), LogGroupState::Loading);
                true
            }
        }
    }

    /// Record an evaluation result.
    ///
    /// Requires a preceding `loading`; results for unknown or cleared
    /// groups are dropped.
    pub fn record_result(&mut self, log_group_id: &str) -> bool {
        match self.groups.get(log_group_id) {
            Some(LogGroupState::Loading) | Some(LogGroupState::Result) => {
                self.groups
                    .insert(log_group_id.to_string(), LogGroupState::Result);
                true
            }
            Some(LogGroupState::Cleared) => {
                debug!("dropping result for cleared log group {}", log_group_id);
                false
            }
            None => {
                debug!("dropping result for unknown log group {}", log_group_id);
                false
            }
        }
    }

    /// Mark a group cleared. Idempotent: clearing an unknown or already
    /// cleared group is a no-op.
    pub fn clear(&mut self, log_group_id: &str) {
        self.groups
            .insert(log_group_id.to_string(), LogGroupState::Cleared);
    }

    pub fn state(&self, log_group_id: &str) -> Option<LogGroupState> {
        self.groups.get(log_group_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_lifecycle() {
        let mut tracker = LogpointTracker::new();
        assert!(tracker.begin_loading("g1"));
        assert_eq!(tracker.state("g1"), Some(LogGroupState::Loading));

        assert!(tracker.record_result("g1"));
        assert_eq!(tracker.state("g1"), Some(LogGroupState::Result));

        // Repeated hits of the same group keep reporting results.
        assert!(tracker.record_result("g1"));

        tracker.clear("g1");
        assert_eq!(tracker.state("g1"), Some(LogGroupState::Cleared));
    }

    #[test]
    fn test_cleared_is_terminal() {
        let mut tracker = LogpointTracker::new();
        tracker.clear("g1");
        assert!(!tracker.begin_loading("g1"));
        assert!(!tracker.record_result("g1"));
        assert_eq!(tracker.state("g1"), Some(LogGroupState::Cleared));
    }

    #[test]
    fn test_result_without_loading_is_dropped() {
        let mut tracker = LogpointTracker::new();
        assert!(!tracker.record_result("g1"));
        assert_eq!(tracker.state("g1"), None);
    }

    #[test]
    fn test_clear_unknown_group_is_noop() {
        let mut tracker = LogpointTracker::new();
        tracker.clear("never-seen");
        tracker.clear("never-seen");
        assert_eq!(tracker.state("never-seen"), Some(LogGroupState::Cleared));
    }
}
