//! Development event records
//!
//! An [`EventRecord`] is the unit the sensor buffers and delivers. Host
//! adapters describe what they observed with a [`Submission`]; the sensor
//! stamps it with a session timestamp and seals it into a record, after
//! which it never changes.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::sync::atomic::{AtomicI64, Ordering};

/// Category of an observed development event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    Activity,
    DevEvent,
    BufferTransition,
    StateChange,
    UnitTest,
    BuildError,
    Refactor,
    Breakpoint,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Activity => "Activity",
            EventKind::DevEvent => "DevEvent",
            EventKind::BufferTransition => "BufferTransition",
            EventKind::StateChange => "StateChange",
            EventKind::UnitTest => "UnitTest",
            EventKind::BuildError => "BuildError",
            EventKind::Refactor => "Refactor",
            EventKind::Breakpoint => "Breakpoint",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Activity" => Ok(EventKind::Activity),
            "DevEvent" => Ok(EventKind::DevEvent),
            "BufferTransition" => Ok(EventKind::BufferTransition),
            "StateChange" => Ok(EventKind::StateChange),
            "UnitTest" => Ok(EventKind::UnitTest),
            "BuildError" => Ok(EventKind::BuildError),
            "Refactor" => Ok(EventKind::Refactor),
            "Breakpoint" => Ok(EventKind::Breakpoint),
            _ => Err(format!("unknown event kind: {}", s)),
        }
    }
}

/// Well-known property keys
pub mod keys {
    pub const SUBTYPE: &str = "subtype";
    pub const UNIT_TYPE: &str = "unit-type";
    pub const UNIT_NAME: &str = "unit-name";
    pub const LANGUAGE: &str = "language";
    pub const CLASS_NAME: &str = "class-name";
    pub const CURRENT_SIZE: &str = "current-size";
    pub const CURRENT_METHODS: &str = "current-methods";
    pub const CURRENT_STATEMENTS: &str = "current-statements";
    pub const CURRENT_TEST_METHODS: &str = "current-test-methods";
    pub const CURRENT_TEST_ASSERTIONS: &str = "current-test-assertions";
    pub const FROM_BUFFER: &str = "from-buff-name";
    pub const TO_BUFFER: &str = "to-buff-name";
    pub const MODIFIED: &str = "modified";
}

/// Ordered string-to-string mapping with unique keys
///
/// Insertion order is kept; inserting an existing key replaces its value in
/// place. Serializes as a flat JSON object.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    entries: Vec<(String, String)>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Value for `key`, or the empty string when missing
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut props = Properties::new();
        for (k, v) in iter {
            props.insert(k, v);
        }
        props
    }
}

impl Serialize for Properties {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (k, v) in &self.entries {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Properties {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(PropertiesVisitor)
    }
}

/// Reads a map in document order; non-string scalars are kept as their JSON text
struct PropertiesVisitor;

impl<'de> serde::de::Visitor<'de> for PropertiesVisitor {
    type Value = Properties;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a map of string properties")
    }

    fn visit_map<A: serde::de::MapAccess<'de>>(self, mut access: A) -> Result<Properties, A::Error> {
        let mut props = Properties::new();
        while let Some((key, value)) = access.next_entry::<String, serde_json::Value>()? {
            let value = match value {
                serde_json::Value::String(s) => s,
                serde_json::Value::Null => String::new(),
                other => other.to_string(),
            };
            props.insert(key, value);
        }
        Ok(props)
    }
}

/// An observation as reported by a host adapter, before it is stamped
///
/// Missing pieces default to empty strings rather than failing.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Submission {
    pub kind: EventKind,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub properties: Properties,
    #[serde(default)]
    pub message: String,
}

impl Submission {
    pub fn new(kind: EventKind, event_type: impl Into<String>) -> Self {
        Self {
            kind,
            event_type: event_type.into(),
            path: String::new(),
            properties: Properties::new(),
            message: String::new(),
        }
    }

    pub fn path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key, value);
        self
    }

    pub fn properties(mut self, properties: Properties) -> Self {
        for (k, v) in properties.iter() {
            self.properties.insert(k, v);
        }
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Seal into an immutable record
    pub fn into_record(self, timestamp: DateTime<Utc>) -> EventRecord {
        EventRecord {
            kind: self.kind,
            event_type: self.event_type,
            path: self.path,
            properties: self.properties,
            message: self.message,
            timestamp,
        }
    }
}

/// One observed development event
///
/// Fields are private; a record is read-only once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    kind: EventKind,
    event_type: String,
    path: String,
    properties: Properties,
    message: String,
    timestamp: DateTime<Utc>,
}

impl EventRecord {
    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn properties(&self) -> &Properties {
        &self.properties
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }

    /// Local display summary; not part of the wire format
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

/// Hands out strictly increasing timestamps for one sensor session
///
/// Two submissions in the same microsecond get distinct stamps, so the
/// collector can use the timestamp as a key.
#[derive(Debug, Default)]
pub struct SessionClock {
    last_micros: AtomicI64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> DateTime<Utc> {
        let wall = Utc::now().timestamp_micros();
        let previous = self
            .last_micros
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |last| {
                Some(wall.max(last + 1))
            })
            .unwrap_or(wall);
        let stamped = wall.max(previous + 1);
        DateTime::<Utc>::from_timestamp_micros(stamped).unwrap_or_else(Utc::now)
    }
}

/// Last path segment of a `/`-separated path
pub fn extract_file_name(path: &str) -> &str {
    match path.rfind('/') {
        Some(idx) if idx > 0 || path.len() > 1 => &path[idx + 1..],
        _ => path,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_replace_in_place() {
        let mut props = Properties::new();
        props.insert("subtype", "Open");
        props.insert("unit-name", "Foo.java");
        assert_eq!(props.insert("subtype", "Close"), Some("Open".to_string()));

        let collected: Vec<_> = props.iter().collect();
        assert_eq!(
            collected,
            vec![("subtype", "Close"), ("unit-name", "Foo.java")]
        );
        assert_eq!(props.get_or_empty("missing"), "");
    }

    #[test]
    fn test_properties_serialize_in_order() {
        let props: Properties = [("z", "1"), ("a", "2")].into_iter().collect();
        let json = serde_json::to_string(&props).unwrap();
        assert_eq!(json, r#"{"z":"1","a":"2"}"#);
    }

    #[test]
    fn test_submission_defaults_from_json() {
        let sub: Submission = serde_json::from_str(r#"{"kind":"DevEvent"}"#).unwrap();
        assert_eq!(sub.kind, EventKind::DevEvent);
        assert_eq!(sub.event_type, "");
        assert_eq!(sub.path, "");
        assert!(sub.properties.is_empty());

        let sub: Submission = serde_json::from_str(
            r#"{"kind":"StateChange","type":"Edit","path":"/p/A.java","properties":{"current-size":100}}"#,
        )
        .unwrap();
        assert_eq!(sub.properties.get("current-size"), Some("100"));
    }

    #[test]
    fn test_session_clock_strictly_increasing() {
        let clock = SessionClock::new();
        let stamps: Vec<_> = (0..1000).map(|_| clock.now()).collect();
        assert!(stamps.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_extract_file_name() {
        assert_eq!(extract_file_name("/p/src/Foo.java"), "Foo.java");
        assert_eq!(extract_file_name("Foo.java"), "Foo.java");
        assert_eq!(extract_file_name(""), "");
    }

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [EventKind::StateChange, EventKind::Breakpoint] {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
        }
        assert!("Nope".parse::<EventKind>().is_err());
    }
}
