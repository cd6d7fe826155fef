//! Core types for the logbook.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Unique identifier for an event.
///
/// Assigned once when the event is created and never reused. Serialized as
/// its canonical hyphenated string in every encoding.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Generate a fresh random id.
    pub fn new() -> Self {
        EventId(Uuid::new_v4())
    }
}

impl Default for EventId {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for EventId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0.hyphenated())
    }
}

impl<'de> Deserialize<'de> for EventId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Uuid::parse_str(&text)
            .map(EventId)
            .map_err(serde::de::Error::custom)
    }
}

impl fmt::Debug for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventId({})", self.0)
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        Timestamp(micros)
    }

    pub const fn from_micros(micros: i64) -> Self {
        Timestamp(micros)
    }

    pub const fn from_secs(secs: i64) -> Self {
        Timestamp(secs.saturating_mul(1_000_000))
    }

    pub const fn as_micros(self) -> i64 {
        self.0
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// What kind of activity an event records.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Flight,
    Simulator,
    GroundInstruction,
}

/// A typed experience value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ExperienceValue {
    Text(String),
    Count(u64),
    Duration(Duration),
    List(Vec<String>),
    Flag(bool),
}

/// Named experience values attached to one event.
///
/// Keys are unique and never empty.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Experience(BTreeMap<String, ExperienceValue>);

impl Experience {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a value. Returns `false` (and stores nothing) for
    /// an empty key.
    pub fn insert(&mut self, key: impl Into<String>, value: ExperienceValue) -> bool {
        let key = key.into();
        if key.is_empty() {
            return false;
        }
        self.0.insert(key, value);
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<ExperienceValue> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&ExperienceValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        !key.is_empty() && self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ExperienceValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Tamper seal over an event's content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Endorsement {
    /// Who endorsed the event.
    pub signer: String,
    /// Hex SHA-256 of the sealed content.
    pub digest: String,
    /// When the seal was applied.
    pub sealed_at: Timestamp,
}

/// Fields covered by an endorsement digest.
#[derive(Serialize)]
struct SealedContent<'a> {
    id: &'a EventId,
    date: &'a Timestamp,
    kind: &'a EventKind,
    equipment: &'a Option<String>,
    remarks: &'a str,
    experience: &'a Experience,
}

/// A single dated logbook entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier (assigned at creation).
    pub id: EventId,

    /// When the event happened; the chronological sort key.
    pub date: Timestamp,

    pub kind: EventKind,

    /// Aircraft or device used, if any.
    #[serde(default)]
    pub equipment: Option<String>,

    /// Free-form comments.
    #[serde(default)]
    pub remarks: String,

    #[serde(default)]
    pub experience: Experience,

    #[serde(default)]
    pub endorsement: Option<Endorsement>,
}

impl Event {
    /// Create a new event with a fresh id.
    pub fn new(kind: EventKind, date: Timestamp) -> Self {
        Self {
            id: EventId::new(),
            date,
            kind,
            equipment: None,
            remarks: String::new(),
            experience: Experience::new(),
            endorsement: None,
        }
    }

    /// Copy of this event moved to another date. The id is kept.
    pub fn at(mut self, date: Timestamp) -> Self {
        self.date = date;
        self
    }

    pub fn with_equipment(mut self, equipment: impl Into<String>) -> Self {
        self.equipment = Some(equipment.into());
        self
    }

    pub fn with_remarks(mut self, remarks: impl Into<String>) -> Self {
        self.remarks = remarks.into();
        self
    }

    /// Add an experience value. Empty keys are ignored.
    pub fn with_experience(mut self, key: impl Into<String>, value: ExperienceValue) -> Self {
        self.experience.insert(key, value);
        self
    }

    pub fn has_experience(&self, key: &str) -> bool {
        self.experience.contains_key(key)
    }

    /// Digest of the sealed content, as hex.
    pub fn content_digest(&self) -> String {
        let content = SealedContent {
            id: &self.id,
            date: &self.date,
            kind: &self.kind,
            equipment: &self.equipment,
            remarks: &self.remarks,
            experience: &self.experience,
        };
        // Serializing plain data with ordered maps cannot fail.
        let bytes = serde_json::to_vec(&content).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        hex::encode(hasher.finalize())
    }

    /// Seal the current content under `signer`, replacing any earlier seal.
    pub fn endorse(mut self, signer: impl Into<String>) -> Self {
        self.endorsement = Some(Endorsement {
            signer: signer.into(),
            digest: self.content_digest(),
            sealed_at: Timestamp::now(),
        });
        self
    }

    /// `Some(true)` if the seal matches the content, `Some(false)` if the
    /// content changed after sealing, `None` if unendorsed.
    pub fn is_endorsement_valid(&self) -> Option<bool> {
        self.endorsement
            .as_ref()
            .map(|e| e.digest == self.content_digest())
    }
}

/// Logbook statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LogbookStats {
    pub event_count: u64,
    pub date_count: u64,
    pub file_size_bytes: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_ids_are_unique() {
        let a = Event::new(EventKind::Flight, Timestamp(0));
        let b = Event::new(EventKind::Flight, Timestamp(0));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_timestamp_ordering() {
        assert!(Timestamp::from_secs(1) > Timestamp::from_micros(999_999));
        assert_eq!(Timestamp::from_secs(2).as_micros(), 2_000_000);
    }

    #[test]
    fn test_experience_rejects_empty_key() {
        let mut experience = Experience::new();
        assert!(!experience.insert("", ExperienceValue::Flag(true)));
        assert!(experience.insert("PIC", ExperienceValue::Duration(Duration::from_secs(3600))));
        assert_eq!(experience.len(), 1);
        assert!(!experience.contains_key(""));
        assert!(experience.contains_key("PIC"));
    }

    #[test]
    fn test_at_keeps_id() {
        let event = Event::new(EventKind::Simulator, Timestamp(10));
        let moved = event.clone().at(Timestamp(20));
        assert_eq!(moved.id, event.id);
        assert_eq!(moved.date, Timestamp(20));
    }

    #[test]
    fn test_endorsement_detects_tampering() {
        let event = Event::new(EventKind::Flight, Timestamp(0))
            .with_equipment("N12345")
            .with_experience("Landings", ExperienceValue::Count(3));
        assert_eq!(event.is_endorsement_valid(), None);

        let sealed = event.endorse("CFI Example");
        assert_eq!(sealed.is_endorsement_valid(), Some(true));

        let tampered = sealed.with_experience("Landings", ExperienceValue::Count(30));
        assert_eq!(tampered.is_endorsement_valid(), Some(false));
    }

    #[test]
    fn test_event_id_is_a_string_in_messagepack() {
        let id = EventId::new();
        let canonical = id.0.hyphenated().to_string();

        let packed = rmp_serde::to_vec_named(&id).unwrap();
        let as_text: String = rmp_serde::from_slice(&packed).unwrap();
        assert_eq!(as_text, canonical);
        assert_eq!(rmp_serde::from_slice::<EventId>(&packed).unwrap(), id);

        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(canonical));
    }

    #[test]
    fn test_event_id_rejects_malformed_string() {
        let packed = rmp_serde::to_vec_named("not-a-uuid").unwrap();
        assert!(rmp_serde::from_slice::<EventId>(&packed).is_err());
    }

    #[test]
    fn test_experience_value_json_shape() {
        let value = ExperienceValue::List(vec!["ILS".into(), "VOR".into()]);
        let json = serde_json::to_value(&value).unwrap();
        assert_eq!(json["type"], "list");
        assert_eq!(json["value"][1], "VOR");
    }
}
