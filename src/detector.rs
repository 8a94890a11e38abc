use crate::event::{FeedSnapshot, QuakeEvent};

/// Outcome of observing one feed snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum AlertDecision {
    /// Nothing new at the top of the feed.
    None,
    /// The top-of-feed key changed: a new event arrived.
    Alert { key: String, event: QuakeEvent },
}

/// Edge-triggered new-event detector.
///
/// Remembers the key of the most recent event seen across snapshots and
/// fires exactly once per distinct new top-of-feed key. The very first
/// snapshot after (re)start never fires, so a freshly started process is
/// not alerted about history that predates it. State lives only in this
/// field for the lifetime of the subscription; a restart may therefore
/// re-alert or miss an event, which is accepted.
#[derive(Debug, Default)]
pub struct ChangeDetector {
    last_key: Option<String>,
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_key(&self) -> Option<&str> {
        self.last_key.as_deref()
    }

    /// Process one snapshot (ordered most-recent-first) and decide whether
    /// to alert. An empty snapshot clears the state and never alerts.
    pub fn observe(&mut self, snapshot: &FeedSnapshot) -> AlertDecision {
        let Some((key, event)) = snapshot.first() else {
            self.last_key = None;
            return AlertDecision::None;
        };

        match self.last_key.as_deref() {
            // First observation: remember, but stay quiet.
            None => {
                self.last_key = Some(key.clone());
                AlertDecision::None
            }
            Some(prev) if prev == key => AlertDecision::None,
            Some(_) => {
                self.last_key = Some(key.clone());
                AlertDecision::Alert {
                    key: key.clone(),
                    event: event.clone(),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(magnitude: f64) -> QuakeEvent {
        QuakeEvent {
            magnitude: Some(magnitude),
            timestamp: None,
            classification: None,
        }
    }

    fn snapshot(keys: &[(&str, f64)]) -> FeedSnapshot {
        keys.iter()
            .map(|(k, m)| (k.to_string(), event(*m)))
            .collect()
    }

    #[test]
    fn test_first_snapshot_suppressed() {
        let mut detector = ChangeDetector::new();
        let decision = detector.observe(&snapshot(&[("k1", 6.5)]));
        assert_eq!(decision, AlertDecision::None);
        assert_eq!(detector.last_key(), Some("k1"));
    }

    #[test]
    fn test_new_key_alerts() {
        let mut detector = ChangeDetector::new();
        detector.observe(&snapshot(&[("k1", 4.0)]));
        let decision = detector.observe(&snapshot(&[("k2", 5.8), ("k1", 4.0)]));
        match decision {
            AlertDecision::Alert { key, event } => {
                assert_eq!(key, "k2");
                assert_eq!(event.magnitude, Some(5.8));
            }
            AlertDecision::None => panic!("expected an alert for the new key"),
        }
        assert_eq!(detector.last_key(), Some("k2"));
    }

    #[test]
    fn test_identical_snapshot_is_idempotent() {
        let mut detector = ChangeDetector::new();
        let snap = snapshot(&[("k2", 5.8), ("k1", 4.0)]);
        detector.observe(&snap);
        assert_eq!(detector.observe(&snap), AlertDecision::None);
        assert_eq!(detector.observe(&snap), AlertDecision::None);
    }

    #[test]
    fn test_empty_snapshot_clears_state() {
        let mut detector = ChangeDetector::new();
        detector.observe(&snapshot(&[("k1", 3.0)]));
        assert_eq!(detector.observe(&Vec::new()), AlertDecision::None);
        assert_eq!(detector.last_key(), None);

        // After a clear, the next non-empty snapshot is a "first" again.
        assert_eq!(detector.observe(&snapshot(&[("k1", 3.0)])), AlertDecision::None);
    }

    #[test]
    fn test_alert_fires_regardless_of_magnitude() {
        // The alert is keyed on "new event" only; the push tier decides
        // separately whether anything leaves the process.
        let mut detector = ChangeDetector::new();
        detector.observe(&snapshot(&[("k1", 6.0)]));
        let decision = detector.observe(&snapshot(&[("k2", 0.4), ("k1", 6.0)]));
        assert!(matches!(decision, AlertDecision::Alert { .. }));
    }
}
