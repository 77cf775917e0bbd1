use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

use crate::{Error, Event, EventKind, Result};

const ALL: &str = "all";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TypeFilter {
    #[default]
    All,
    Only(EventKind),
}

impl TypeFilter {
    pub fn matches(self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::Only(kind) => event.kind == kind,
        }
    }
}

impl FromStr for TypeFilter {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s == ALL {
            return Ok(Self::All);
        }

        s.parse().map(Self::Only)
    }
}

impl fmt::Display for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Only(kind) => fmt::Display::fmt(kind, f),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum InstructorFilter {
    #[default]
    All,
    Named(String),
}

impl InstructorFilter {
    pub fn matches(&self, event: &Event) -> bool {
        match self {
            Self::All => true,
            Self::Named(name) => event.instructor.name == *name,
        }
    }
}

impl From<&str> for InstructorFilter {
    fn from(s: &str) -> Self {
        if s == ALL {
            Self::All
        } else {
            Self::Named(s.to_string())
        }
    }
}

impl fmt::Display for InstructorFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str(ALL),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl Serialize for InstructorFilter {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The active selectors of a schedule view. All of them must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filters {
    pub kind: TypeFilter,
    pub instructor: InstructorFilter,
    pub query: String,
}

impl Filters {
    pub fn matches(&self, event: &Event) -> bool {
        self.kind.matches(event) && self.instructor.matches(event) && self.matches_query(event)
    }

    /// Case-insensitive substring search over title, description, subject and
    /// instructor name. A blank query matches everything.
    fn matches_query(&self, event: &Event) -> bool {
        if self.query.trim().is_empty() {
            return true;
        }

        let query = self.query.to_lowercase();
        [
            &event.title,
            &event.description,
            &event.subject,
            &event.instructor.name,
        ]
        .into_iter()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Keeps the events matching `filters`, in their original order.
pub fn apply_filters(events: &[Event], filters: &Filters) -> Vec<Event> {
    events
        .iter()
        .filter(|event| filters.matches(event))
        .cloned()
        .collect()
}

/// The instructor selector's options: `All`, then each distinct name in the
/// order it first appears.
pub fn instructor_options(events: &[Event]) -> Vec<InstructorFilter> {
    let mut seen = HashSet::new();

    std::iter::once(InstructorFilter::All)
        .chain(
            events
                .iter()
                .map(|event| event.instructor.name.as_str())
                .filter(|name| seen.insert(*name))
                .map(|name| InstructorFilter::Named(name.to_string())),
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::sample::sample_events;

    fn events() -> Vec<Event> {
        sample_events(Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap())
    }

    fn ids(events: &[Event]) -> Vec<&str> {
        events.iter().map(|event| event.id.as_str()).collect()
    }

    #[test]
    fn default_filters_keep_everything() {
        let events = events();
        assert_eq!(apply_filters(&events, &Filters::default()), events);
    }

    #[test]
    fn type_filter_keeps_only_that_type() {
        let mut events = events();
        for event in &mut events[..3] {
            event.kind = EventKind::Lecture;
        }

        let filters = Filters {
            kind: TypeFilter::Only(EventKind::Exam),
            ..Filters::default()
        };
        assert_eq!(ids(&apply_filters(&events, &filters)), ["4"]);
    }

    #[test]
    fn instructor_filter_is_exact() {
        let events = events();

        let filters = Filters {
            instructor: "Prof. Michael Chen".into(),
            ..Filters::default()
        };
        assert_eq!(ids(&apply_filters(&events, &filters)), ["2"]);

        let filters = Filters {
            instructor: "Prof. Michael".into(),
            ..Filters::default()
        };
        assert!(apply_filters(&events, &filters).is_empty());
    }

    #[test]
    fn query_matches_any_field_ignoring_case() {
        let events = events();

        let filters = Filters {
            query: "chemistry".into(),
            ..Filters::default()
        };
        assert_eq!(ids(&apply_filters(&events, &filters)), ["2"]);

        let filters = Filters {
            query: "EMILY".into(),
            ..Filters::default()
        };
        assert_eq!(ids(&apply_filters(&events, &filters)), ["3"]);

        let filters = Filters {
            query: "   ".into(),
            ..Filters::default()
        };
        assert_eq!(apply_filters(&events, &filters).len(), events.len());
    }

    #[test]
    fn subject_match_ignores_title() {
        let mut events = events();
        events[1].title = "Morning session".into();
        events[1].description = String::new();

        let filters = Filters {
            query: "chemistry".into(),
            ..Filters::default()
        };
        assert_eq!(ids(&apply_filters(&events, &filters)), ["2"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let events = events();
        let filters = Filters {
            kind: TypeFilter::Only(EventKind::Lecture),
            query: "calc".into(),
            ..Filters::default()
        };

        let once = apply_filters(&events, &filters);
        assert_eq!(apply_filters(&once, &filters), once);
    }

    #[test]
    fn filters_compose_in_any_order() {
        let events = events();
        let by_type = Filters {
            kind: TypeFilter::Only(EventKind::Lecture),
            ..Filters::default()
        };
        let by_query = Filters {
            query: "calc".into(),
            ..Filters::default()
        };
        let both = Filters {
            kind: TypeFilter::Only(EventKind::Lecture),
            query: "calc".into(),
            ..Filters::default()
        };

        let type_then_query = apply_filters(&apply_filters(&events, &by_type), &by_query);
        let query_then_type = apply_filters(&apply_filters(&events, &by_query), &by_type);
        let combined = apply_filters(&events, &both);

        assert_eq!(type_then_query, combined);
        assert_eq!(query_then_type, combined);
        assert_eq!(ids(&combined), ["1"]);
    }

    #[test]
    fn instructor_options_are_distinct_with_all_first() {
        let mut events = events();
        events.push(events[1].clone());
        events.push(events[0].clone());

        let options = instructor_options(&events);
        assert_eq!(options[0], InstructorFilter::All);
        assert_eq!(
            options.iter().map(ToString::to_string).collect::<Vec<_>>(),
            [
                "all",
                "Dr. Sarah Johnson",
                "Prof. Michael Chen",
                "Dr. Emily Rodriguez",
                "Dr. Amanda Foster",
            ]
        );
    }

    #[test]
    fn type_filter_parses_the_all_sentinel() {
        assert_eq!("all".parse::<TypeFilter>().unwrap(), TypeFilter::All);
        assert_eq!(
            "seminar".parse::<TypeFilter>().unwrap(),
            TypeFilter::Only(EventKind::Seminar)
        );
        assert!("workshop".parse::<TypeFilter>().is_err());
    }
}
