use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::{self, IgnoredAny, MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{Error, Result};

/// Version tag written into every persisted [`ScheduleDocument`].
pub const SCHEMA_VERSION: &str = "1.0.0";

/// A persisted instant.
///
/// Stored schedules are plain JSON, so a start or end time can come back from
/// storage as anything. Deserializing a `Timestamp` never fails: text that does
/// not parse as RFC 3339 is kept verbatim as [`Timestamp::Malformed`] and
/// written back unchanged on the next save.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Timestamp {
    Valid(DateTime<Utc>),
    Malformed(String),
}

impl Timestamp {
    pub fn parse(raw: &str) -> Self {
        match DateTime::parse_from_rfc3339(raw.trim()) {
            Ok(parsed) => Self::Valid(parsed.with_timezone(&Utc)),
            Err(_) => Self::Malformed(raw.to_string()),
        }
    }

    fn from_millis(millis: i64) -> Self {
        DateTime::from_timestamp_millis(millis)
            .map_or_else(|| Self::Malformed(millis.to_string()), Self::Valid)
    }

    #[must_use]
    pub fn instant(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Valid(instant) => Some(*instant),
            Self::Malformed(_) => None,
        }
    }

    #[must_use]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::Malformed(String::new())
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(instant: DateTime<Utc>) -> Self {
        Self::Valid(instant)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid(instant) => f.write_str(&instant.to_rfc3339_opts(SecondsFormat::Millis, true)),
            Self::Malformed(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

struct TimestampVisitor;

impl<'de> Visitor<'de> for TimestampVisitor {
    type Value = Timestamp;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an RFC 3339 timestamp or epoch milliseconds")
    }

    fn visit_str<E: de::Error>(self, value: &str) -> std::result::Result<Timestamp, E> {
        Ok(Timestamp::parse(value))
    }

    fn visit_i64<E: de::Error>(self, value: i64) -> std::result::Result<Timestamp, E> {
        Ok(Timestamp::from_millis(value))
    }

    fn visit_u64<E: de::Error>(self, value: u64) -> std::result::Result<Timestamp, E> {
        Ok(i64::try_from(value)
            .map_or_else(|_| Timestamp::Malformed(value.to_string()), Timestamp::from_millis))
    }

    fn visit_f64<E: de::Error>(self, value: f64) -> std::result::Result<Timestamp, E> {
        Ok(Timestamp::Malformed(value.to_string()))
    }

    fn visit_bool<E: de::Error>(self, value: bool) -> std::result::Result<Timestamp, E> {
        Ok(Timestamp::Malformed(value.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<Timestamp, E> {
        Ok(Timestamp::default())
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<Timestamp, E> {
        Ok(Timestamp::default())
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<Timestamp, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<Timestamp, A::Error> {
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(Timestamp::default())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Timestamp, A::Error> {
        while map.next_entry::<IgnoredAny, IgnoredAny>()?.is_some() {}
        Ok(Timestamp::default())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(TimestampVisitor)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    #[default]
    Lecture,
    Lab,
    Seminar,
    Exam,
    Assignment,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Lecture,
        EventKind::Lab,
        EventKind::Seminar,
        EventKind::Exam,
        EventKind::Assignment,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Lecture => "lecture",
            Self::Lab => "lab",
            Self::Seminar => "seminar",
            Self::Exam => "exam",
            Self::Assignment => "assignment",
        }
    }

    /// Accent colour given to events created from a draft.
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            Self::Lecture => "#2563EB",
            Self::Lab => "#059669",
            Self::Seminar => "#EA580C",
            Self::Exam => "#EF4444",
            Self::Assignment => "#7C3AED",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instructor {
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// One scheduled class or session.
///
/// `is_live` and `is_upcoming` are derived from the time window and the
/// current instant; see [`crate::refresh_statuses`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub start_time: Timestamp,
    #[serde(default)]
    pub end_time: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meet_link: Option<String>,
    pub instructor: Instructor,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "type")]
    pub kind: EventKind,
    #[serde(default)]
    pub is_live: bool,
    #[serde(default)]
    pub is_upcoming: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_available: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub materials: Vec<String>,
    #[serde(default)]
    pub color: String,
}

/// The JSON document a schedule is persisted and exchanged as.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduleDocument {
    pub classes: Vec<Event>,
    #[serde(default)]
    pub last_updated: Timestamp,
    #[serde(default = "default_version")]
    pub version: String,
    /// Stored entries that could not be read as events. Only filled in by
    /// [`crate::import_json`].
    #[serde(skip)]
    pub skipped: Vec<SkippedEvent>,
}

/// A stored schedule entry that was dropped while loading.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("stored event #{index} ({id}) could not be read: {reason}")]
pub struct SkippedEvent {
    pub index: usize,
    pub id: String,
    pub reason: String,
}

pub(crate) fn default_version() -> String {
    SCHEMA_VERSION.to_string()
}

impl ScheduleDocument {
    pub fn new(classes: Vec<Event>, now: DateTime<Utc>) -> Self {
        Self {
            classes,
            last_updated: Timestamp::Valid(now),
            version: default_version(),
            skipped: Vec::new(),
        }
    }
}

/// User input for creating an event, or editing one when `id` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub meet_link: String,
    pub instructor_name: String,
    #[serde(default)]
    pub instructor_email: String,
    #[serde(default)]
    pub subject: String,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    #[serde(default)]
    pub materials: Vec<String>,
}

impl EventDraft {
    pub fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() {
            return Err(Error::MissingField("title"));
        }

        if self.instructor_name.trim().is_empty() {
            return Err(Error::MissingField("instructorName"));
        }

        Ok(())
    }

    /// Builds the stored record. Status flags are left unset for the caller
    /// to derive.
    pub(crate) fn into_event(self, id: String) -> Event {
        let non_blank = |value: String| (!value.trim().is_empty()).then_some(value);

        Event {
            id,
            title: self.title,
            description: self.description,
            start_time: Timestamp::Valid(self.start_time),
            end_time: Timestamp::Valid(self.end_time),
            location: non_blank(self.location),
            meet_link: non_blank(self.meet_link),
            instructor: Instructor {
                name: self.instructor_name,
                email: self.instructor_email,
                avatar: None,
            },
            subject: self.subject,
            kind: self.kind,
            is_live: false,
            is_upcoming: false,
            attendee_count: None,
            recording_available: None,
            recording_url: None,
            materials: self.materials,
            color: self.kind.color().to_string(),
        }
    }
}
