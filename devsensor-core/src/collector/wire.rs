//! Wire format for the collector's events API
//!
//! One request carries one delivery cycle's batch:
//!
//! ```text
//! {
//!   "sensor": {"tool": "Eclipse", "session_id": "...", "user": "..."},
//!   "events": [
//!     {"kind": "DevEvent", "type": "Edit", "path": "/p/A.java",
//!      "timestamp": "2024-05-01T10:00:00.000001Z", "event_hash": "...",
//!      "properties": {"subtype": "Save", ...}}
//!   ]
//! }
//! ```
//!
//! The record's display message stays local and is never sent.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::event::{EventRecord, Properties};

/// Who produced a batch
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SensorIdentity {
    /// Host tool name (e.g. "Eclipse")
    pub tool: String,
    /// Random id for this sensor session
    pub session_id: String,
    /// User the events are attributed to
    pub user: String,
}

/// One event as the collector expects it
#[derive(Debug, Serialize)]
pub struct WireEvent<'a> {
    pub kind: &'static str,

    #[serde(rename = "type")]
    pub event_type: &'a str,

    pub path: &'a str,

    pub timestamp: DateTime<Utc>,

    /// Content-based hash so the collector can drop re-sent events (32-char hex)
    pub event_hash: String,

    pub properties: &'a Properties,
}

impl<'a> WireEvent<'a> {
    pub fn from_record(record: &'a EventRecord) -> Self {
        WireEvent {
            kind: record.kind().as_str(),
            event_type: record.event_type(),
            path: record.path(),
            timestamp: record.timestamp(),
            event_hash: compute_event_hash(record),
            properties: record.properties(),
        }
    }
}

/// Request body for POST /sensors/events
#[derive(Debug, Serialize)]
pub struct EventBatch<'a> {
    pub sensor: &'a SensorIdentity,
    pub events: Vec<WireEvent<'a>>,
}

impl<'a> EventBatch<'a> {
    pub fn new(sensor: &'a SensorIdentity, records: &'a [EventRecord]) -> Self {
        Self {
            sensor,
            events: records.iter().map(WireEvent::from_record).collect(),
        }
    }
}

/// Compute a content-based hash for server-side deduplication
///
/// Returns a 32-character hex digest of
/// SHA-256(kind + type + path + timestamp + properties). Requeued events keep
/// their timestamp, so a batch that reached the server but whose response
/// was lost hashes the same the second time.
fn compute_event_hash(record: &EventRecord) -> String {
    let props = serde_json::to_string(record.properties()).unwrap_or_default();
    let hash_input = format!(
        "{}:{}:{}:{}:{}",
        record.kind(),
        record.event_type(),
        record.path(),
        record.timestamp().to_rfc3339_opts(SecondsFormat::Micros, true),
        props
    );

    let mut hasher = Sha256::new();
    hasher.update(hash_input.as_bytes());
    let result = hasher.finalize();

    // Take first 16 bytes (32 hex chars)
    hex::encode(&result[..16])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventKind, SessionClock, Submission};

    fn identity() -> SensorIdentity {
        SensorIdentity {
            tool: "Eclipse".to_string(),
            session_id: "session-1".to_string(),
            user: "dev@example.com".to_string(),
        }
    }

    fn save_record(clock: &SessionClock) -> EventRecord {
        Submission::new(EventKind::DevEvent, "Edit")
            .path("/p/src/Foo.java")
            .property("subtype", "Save")
            .property("current-size", "120")
            .message("Save File : Foo.java")
            .into_record(clock.now())
    }

    #[test]
    fn test_batch_shape() {
        let clock = SessionClock::new();
        let records = vec![save_record(&clock)];
        let sensor = identity();
        let batch = EventBatch::new(&sensor, &records);

        let json = serde_json::to_value(&batch).unwrap();
        assert_eq!(json["sensor"]["tool"], "Eclipse");
        assert_eq!(json["sensor"]["user"], "dev@example.com");

        let event = &json["events"][0];
        assert_eq!(event["kind"], "DevEvent");
        assert_eq!(event["type"], "Edit");
        assert_eq!(event["path"], "/p/src/Foo.java");
        assert_eq!(event["properties"]["subtype"], "Save");
        assert_eq!(event["properties"]["current-size"], "120");
        assert_eq!(event["event_hash"].as_str().unwrap().len(), 32);
        assert!(event.get("message").is_none());
    }

    #[test]
    fn test_event_hash_deterministic() {
        let clock = SessionClock::new();
        let record = save_record(&clock);
        assert_eq!(compute_event_hash(&record), compute_event_hash(&record.clone()));

        let other = save_record(&clock);
        assert_ne!(compute_event_hash(&record), compute_event_hash(&other));
    }
}
