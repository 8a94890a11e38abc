use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::severity::classify;

/// One earthquake record as stored upstream. Read-only from our side.
///
/// The feed occasionally carries records without a magnitude (sensor still
/// calibrating); those are displayed with a placeholder and never classified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuakeEvent {
    #[serde(default)]
    pub magnitude: Option<f64>,
    /// Unix epoch seconds.
    #[serde(default)]
    pub timestamp: Option<i64>,
    /// Severity label assigned upstream, if any. Trusted when present,
    /// derived from the magnitude otherwise.
    #[serde(default)]
    pub classification: Option<String>,
}

impl QuakeEvent {
    /// Severity label for display: the upstream classification when the
    /// record carries one, else derived from the magnitude. `None` when
    /// neither is available.
    pub fn severity_label(&self) -> Option<String> {
        self.classification
            .clone()
            .or_else(|| self.magnitude.map(|m| classify(m).to_string()))
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.timestamp
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
    }
}

/// Full value at the subscribed feed path, ordered most-recent-first.
/// The feed itself stores events append-only, oldest first.
pub type FeedSnapshot = Vec<(String, QuakeEvent)>;

/// Decode the raw JSON value at the feed path into a snapshot.
///
/// A `null` value (path never written) decodes as an empty snapshot.
/// Malformed records are skipped with a warning rather than failing the
/// whole snapshot. Key order relies on serde_json's `preserve_order`
/// feature so the feed's insertion order survives decoding; entries are
/// then reversed to put the newest event first.
pub fn decode_snapshot(value: &serde_json::Value) -> FeedSnapshot {
    let mut entries: FeedSnapshot = Vec::new();
    if let Some(map) = value.as_object() {
        for (key, raw) in map {
            match serde_json::from_value::<QuakeEvent>(raw.clone()) {
                Ok(event) => entries.push((key.clone(), event)),
                Err(e) => warn!("feed: skipping malformed record '{}': {}", key, e),
            }
        }
    } else if !value.is_null() {
        warn!("feed: expected an object at the feed path, got {}", value);
    }
    entries.reverse();
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_orders_most_recent_first() {
        let value = json!({
            "-Nx1": { "magnitude": 4.9, "timestamp": 1694340900 },
            "-Nx2": { "magnitude": 6.1, "timestamp": 1701784020 },
            "-Nx3": { "magnitude": 5.8, "timestamp": 1704082320 },
        });
        let snapshot = decode_snapshot(&value);
        assert_eq!(snapshot.len(), 3);
        assert_eq!(snapshot[0].0, "-Nx3");
        assert_eq!(snapshot[0].1.magnitude, Some(5.8));
        assert_eq!(snapshot[2].0, "-Nx1");
    }

    #[test]
    fn test_decode_null_is_empty() {
        assert!(decode_snapshot(&serde_json::Value::Null).is_empty());
    }

    #[test]
    fn test_decode_skips_malformed_records() {
        let value = json!({
            "bad": { "magnitude": "huge" },
            "good": { "magnitude": 3.2 },
        });
        let snapshot = decode_snapshot(&value);
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].0, "good");
    }

    #[test]
    fn test_severity_label_trusts_upstream() {
        let event = QuakeEvent {
            magnitude: Some(5.5),
            timestamp: None,
            classification: Some("Severe".to_string()),
        };
        assert_eq!(event.severity_label().as_deref(), Some("Severe"));
    }

    #[test]
    fn test_severity_label_derived_when_absent() {
        let event = QuakeEvent {
            magnitude: Some(5.5),
            timestamp: None,
            classification: None,
        };
        assert_eq!(event.severity_label().as_deref(), Some("Strong"));

        let blank = QuakeEvent { magnitude: None, timestamp: None, classification: None };
        assert_eq!(blank.severity_label(), None);
    }

    #[test]
    fn test_event_time() {
        let event = QuakeEvent {
            magnitude: Some(6.5),
            timestamp: Some(1688828400),
            classification: None,
        };
        assert_eq!(event.time().unwrap().timestamp(), 1688828400);
        let untimed = QuakeEvent { magnitude: Some(1.0), timestamp: None, classification: None };
        assert!(untimed.time().is_none());
    }
}
