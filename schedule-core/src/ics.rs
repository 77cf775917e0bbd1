use chrono::{DateTime, Utc};
use ics::{
    escape_text,
    properties::{Categories, Description, DtEnd, DtStart, Location, Organizer, Summary, URL},
};

use crate::{Event, ScheduleDocument};

const PRODUCT_ID: &str = "-//schedule-core//class schedule//EN";

fn ics_time(instant: DateTime<Utc>) -> String {
    instant.format("%Y%m%dT%H%M%SZ").to_string()
}

impl ScheduleDocument {
    /// Calendar with one VEVENT per event that has a readable time window.
    #[must_use]
    pub fn to_ics(&self) -> ics::ICalendar<'_> {
        let mut icalendar = ics::ICalendar::new("2.0", PRODUCT_ID);

        for event in &self.classes {
            if let Some(ics_event) = event.to_ics() {
                icalendar.add_event(ics_event);
            }
        }

        icalendar
    }
}

impl Event {
    #[must_use]
    pub fn to_ics(&self) -> Option<ics::Event<'_>> {
        let start = ics_time(self.start_time.instant()?);
        let end = ics_time(self.end_time.instant()?);

        let mut ics_event = ics::Event::new(format!("{}@schedule-core", self.id), start.clone());

        ics_event.push(DtStart::new(start));
        ics_event.push(DtEnd::new(end));
        ics_event.push(Summary::new(escape_text(self.title.as_str())));

        if !self.description.is_empty() {
            ics_event.push(Description::new(escape_text(self.description.as_str())));
        }

        if let Some(location) = &self.location {
            ics_event.push(Location::new(escape_text(location.as_str())));
        }

        if !self.instructor.email.is_empty() {
            ics_event.push(Organizer::new(format!("mailto:{}", self.instructor.email)));
        }

        if let Some(meet_link) = &self.meet_link {
            ics_event.push(URL::new(meet_link.as_str()));
        }

        let mut categories = vec![escape_text(self.kind.as_str())];
        if !self.subject.is_empty() {
            categories.push(escape_text(self.subject.as_str()));
        }
        ics_event.push(Categories::new(categories.join(",")));

        Some(ics_event)
    }
}
