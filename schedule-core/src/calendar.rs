use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::Serialize;

use crate::{Event, EventKind};

/// Events keyed by the UTC date they start on.
pub type DateBuckets = BTreeMap<NaiveDate, Vec<Event>>;

/// Buckets events by start date. Each day is ordered by start time, ties kept
/// in input order. Events without a readable start time are left out.
pub fn group_by_date(events: &[Event]) -> DateBuckets {
    let mut buckets = DateBuckets::new();

    for event in events {
        if let Some(start) = event.start_time.instant() {
            buckets
                .entry(start.date_naive())
                .or_default()
                .push(event.clone());
        }
    }

    for day in buckets.values_mut() {
        day.sort_by_key(|event| event.start_time.instant());
    }

    buckets
}

/// The Sunday starting the week that contains `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub is_today: bool,
    pub events: Vec<Event>,
}

/// Seven days from `week_start`. An empty `kinds` selection shows every kind.
pub fn week_days(
    week_start: NaiveDate,
    buckets: &DateBuckets,
    today: NaiveDate,
    kinds: &[EventKind],
) -> Vec<CalendarDay> {
    week_start
        .iter_days()
        .take(7)
        .map(|date| CalendarDay {
            date,
            is_today: date == today,
            events: buckets
                .get(&date)
                .into_iter()
                .flatten()
                .filter(|event| kinds.is_empty() || kinds.contains(&event.kind))
                .cloned()
                .collect(),
        })
        .collect()
}

impl Event {
    /// Length of the event in whole minutes, e.g. `"90 min"`.
    #[must_use]
    pub fn duration_label(&self) -> Option<String> {
        let start = self.start_time.instant()?;
        let end = self.end_time.instant()?;
        let minutes = ((end - start).num_seconds() as f64 / 60.0).round() as i64;
        Some(format!("{minutes} min"))
    }

    fn window(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((self.start_time.instant()?, self.end_time.instant()?))
    }
}

/// Id pairs of events whose windows intersect, bounds inclusive.
pub fn overlapping_pairs(events: &[Event]) -> Vec<(String, String)> {
    let windows = events
        .iter()
        .filter_map(|event| Some((event.id.as_str(), event.window()?)))
        .collect::<Vec<_>>();

    let mut pairs = Vec::new();
    for (idx, (id, (start, end))) in windows.iter().enumerate() {
        for (other_id, (other_start, other_end)) in &windows[idx + 1..] {
            if start <= other_end && other_start <= end {
                pairs.push((id.to_string(), other_id.to_string()));
            }
        }
    }

    pairs
}
