//! Per-parse suppression of repeated observations.
//!
//! History is kept per descriptor as one flat list holding the values of
//! every label tuple emitted so far. A new tuple counts as seen when each of
//! its values appears somewhere in that list. This is a containment check on
//! values, not an exact tuple match: a tuple assembled from values of
//! different earlier rows is also reported as seen.

use std::collections::HashMap;

use crate::catalog::MetricId;

#[derive(Debug, Default)]
pub struct DedupTracker {
    history: HashMap<MetricId, Vec<String>>,
}

impl DedupTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if every value of `labels` was already emitted for `metric`.
    pub fn seen(&self, metric: MetricId, labels: &[String]) -> bool {
        let Some(history) = self.history.get(&metric) else {
            return false;
        };
        if labels.len() > history.len() {
            return false;
        }
        labels.iter().all(|value| history.contains(value))
    }

    /// Appends a freshly emitted label tuple to the history of `metric`.
    pub fn record(&mut self, metric: MetricId, labels: &[String]) {
        self.history
            .entry(metric)
            .or_default()
            .extend(labels.iter().cloned());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_fresh_tracker_has_seen_nothing() {
        let tracker = DedupTracker::new();
        assert!(!tracker.seen(MetricId::ServerClientSentBytes, &tuple(&["s", "alice"])));
    }

    #[test]
    fn test_identical_tuple_is_seen() {
        let mut tracker = DedupTracker::new();
        let labels = tuple(&["s", "alice", "1.2.3.4:5"]);
        tracker.record(MetricId::ServerClientSentBytes, &labels);
        assert!(tracker.seen(MetricId::ServerClientSentBytes, &labels));
    }

    #[test]
    fn test_differing_value_is_not_seen() {
        let mut tracker = DedupTracker::new();
        tracker.record(MetricId::ServerClientSentBytes, &tuple(&["s", "alice", "1.2.3.4:5"]));
        assert!(!tracker.seen(MetricId::ServerClientSentBytes, &tuple(&["s", "bob", "1.2.3.4:5"])));
    }

    #[test]
    fn test_history_is_per_metric() {
        let mut tracker = DedupTracker::new();
        let labels = tuple(&["s", "alice"]);
        tracker.record(MetricId::ServerClientSentBytes, &labels);
        assert!(!tracker.seen(MetricId::ServerClientReceivedBytes, &labels));
    }

    #[test]
    fn test_longer_tuple_than_history_is_not_seen() {
        let mut tracker = DedupTracker::new();
        tracker.record(MetricId::ServerRouteLastReference, &tuple(&["s", "alice"]));
        assert!(!tracker.seen(
            MetricId::ServerRouteLastReference,
            &tuple(&["s", "alice", "alice"])
        ));
    }

    // Known quirk: containment is checked against the flattened values of all
    // earlier tuples, so a new combination of already-seen values is
    // suppressed even though no earlier row had exactly these labels.
    #[test]
    fn test_quirk_mixed_tuple_is_reported_seen() {
        let mut tracker = DedupTracker::new();
        let metric = MetricId::ServerRouteLastReference;
        tracker.record(metric, &tuple(&["s", "alice", "1.1.1.1:1", "10.8.0.6"]));
        tracker.record(metric, &tuple(&["s", "bob", "2.2.2.2:2", "10.8.0.7"]));

        assert!(tracker.seen(metric, &tuple(&["s", "alice", "2.2.2.2:2", "10.8.0.7"])));
        assert!(!tracker.seen(metric, &tuple(&["s", "carol", "2.2.2.2:2", "10.8.0.7"])));
    }

    #[test]
    fn test_quirk_shorter_subset_is_reported_seen() {
        let mut tracker = DedupTracker::new();
        let metric = MetricId::ServerClientReceivedBytes;
        tracker.record(metric, &tuple(&["s", "alice", "1492071121"]));
        assert!(tracker.seen(metric, &tuple(&["s", "alice"])));
    }
}
