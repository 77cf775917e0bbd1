use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{Event, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Live,
    Upcoming,
    Past,
}

impl Status {
    /// Classifies a time window against `now`.
    ///
    /// Both ends of the window are inclusive for `Live`. A window with either
    /// end malformed is `Past`.
    pub fn at(start: &Timestamp, end: &Timestamp, now: DateTime<Utc>) -> Self {
        let (Some(start), Some(end)) = (start.instant(), end.instant()) else {
            return Self::Past;
        };

        if now < start {
            Self::Upcoming
        } else if now <= end {
            Self::Live
        } else {
            Self::Past
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Live => "live",
            Self::Upcoming => "upcoming",
            Self::Past => "past",
        })
    }
}

impl Event {
    #[must_use]
    pub fn status_at(&self, now: DateTime<Utc>) -> Status {
        Status::at(&self.start_time, &self.end_time, now)
    }

    /// Status as of the last refresh.
    #[must_use]
    pub fn status(&self) -> Status {
        match (self.is_live, self.is_upcoming) {
            (true, _) => Status::Live,
            (false, true) => Status::Upcoming,
            (false, false) => Status::Past,
        }
    }

    pub(crate) fn set_status(&mut self, status: Status) {
        self.is_live = status == Status::Live;
        self.is_upcoming = status == Status::Upcoming;
    }
}

/// Returns a copy of `events` with the live/upcoming flags recomputed for `now`.
pub fn refresh_statuses(events: &[Event], now: DateTime<Utc>) -> Vec<Event> {
    events
        .iter()
        .map(|event| {
            let mut event = event.clone();
            event.set_status(event.status_at(now));
            event
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimestampField {
    StartTime,
    EndTime,
}

impl fmt::Display for TimestampField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::StartTime => "startTime",
            Self::EndTime => "endTime",
        })
    }
}

/// An event whose stored time could not be read. Never raised by status
/// computation, only reported.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("event `{event_id}` has a malformed {field}: {raw:?}")]
pub struct MalformedTimestamp {
    pub event_id: String,
    pub field: TimestampField,
    pub raw: String,
}

pub fn malformed_timestamps(events: &[Event]) -> Vec<MalformedTimestamp> {
    let mut found = Vec::new();

    for event in events {
        for (field, timestamp) in [
            (TimestampField::StartTime, &event.start_time),
            (TimestampField::EndTime, &event.end_time),
        ] {
            if let Timestamp::Malformed(raw) = timestamp {
                found.push(MalformedTimestamp {
                    event_id: event.id.clone(),
                    field,
                    raw: raw.clone(),
                });
            }
        }
    }

    found
}
