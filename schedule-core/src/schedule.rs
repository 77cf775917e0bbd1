use chrono::{DateTime, Utc};

use crate::{
    apply_filters, group_by_date, instructor_options, refresh_statuses, sample::sample_events,
    DateBuckets, Error, Event, EventDraft, Filters, InstructorFilter, Result, ScheduleDocument,
};

/// Replaces the event with the same id, or appends `event` when there is none.
pub fn upsert_event(events: &[Event], event: Event) -> Vec<Event> {
    let mut replaced = false;
    let mut updated = events
        .iter()
        .map(|existing| {
            if existing.id == event.id {
                replaced = true;
                event.clone()
            } else {
                existing.clone()
            }
        })
        .collect::<Vec<_>>();

    if !replaced {
        updated.push(event);
    }

    updated
}

/// `None` when no event has that id.
pub fn remove_event(events: &[Event], id: &str) -> Option<Vec<Event>> {
    events.iter().any(|event| event.id == id).then(|| {
        events
            .iter()
            .filter(|event| event.id != id)
            .cloned()
            .collect()
    })
}

/// Owns a schedule's events and derives every view of them.
#[derive(Debug, Clone)]
pub struct Schedule {
    events: Vec<Event>,
    last_tick: DateTime<Utc>,
}

impl Schedule {
    pub fn new(events: Vec<Event>, now: DateTime<Utc>) -> Self {
        Self {
            events: refresh_statuses(&events, now),
            last_tick: now,
        }
    }

    pub fn seeded(now: DateTime<Utc>) -> Self {
        Self::new(sample_events(now), now)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn last_tick(&self) -> DateTime<Utc> {
        self.last_tick
    }

    pub fn get(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    /// Re-evaluates every event's status at `now`.
    pub fn tick(&mut self, now: DateTime<Utc>) {
        self.events = refresh_statuses(&self.events, now);
        self.last_tick = now;
    }

    /// Creates an event from `draft`, or replaces the one named by `draft.id`.
    pub fn save(&mut self, draft: EventDraft, now: DateTime<Utc>) -> Result<&Event> {
        draft.validate()?;

        let id = match draft.id.clone() {
            Some(id) if self.get(&id).is_none() => return Err(Error::UnknownEvent(id)),
            Some(id) => id,
            None => self.next_id(now),
        };

        let mut event = draft.into_event(id.clone());
        event.set_status(event.status_at(now));
        self.events = upsert_event(&self.events, event);

        self.get(&id).ok_or(Error::UnknownEvent(id))
    }

    pub fn delete(&mut self, id: &str) -> Result<Event> {
        let removed = self
            .get(id)
            .cloned()
            .ok_or_else(|| Error::UnknownEvent(id.to_string()))?;

        if let Some(events) = remove_event(&self.events, id) {
            self.events = events;
        }

        Ok(removed)
    }

    pub fn replace_all(&mut self, events: Vec<Event>, now: DateTime<Utc>) {
        *self = Self::new(events, now);
    }

    pub fn view(&self, filters: &Filters) -> Vec<Event> {
        apply_filters(&self.events, filters)
    }

    pub fn instructors(&self) -> Vec<InstructorFilter> {
        instructor_options(&self.events)
    }

    pub fn calendar(&self, filters: &Filters) -> DateBuckets {
        group_by_date(&self.view(filters))
    }

    pub fn document(&self, now: DateTime<Utc>) -> ScheduleDocument {
        ScheduleDocument::new(self.events.clone(), now)
    }

    /// Millisecond timestamp of `now`, bumped past any id already taken.
    fn next_id(&self, now: DateTime<Utc>) -> String {
        let mut candidate = now.timestamp_millis();
        while self.get(&candidate.to_string()).is_some() {
            candidate += 1;
        }
        candidate.to_string()
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;
    use crate::{EventKind, Status, TypeFilter};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap()
    }

    fn draft(title: &str) -> EventDraft {
        EventDraft {
            id: None,
            title: title.to_string(),
            description: "Proof techniques".into(),
            start_time: now() - Duration::minutes(5),
            end_time: now() + Duration::minutes(55),
            location: "Room 12".into(),
            meet_link: String::new(),
            instructor_name: "Dr. Ada Park".into(),
            instructor_email: "ada.park@school.edu".into(),
            subject: "Mathematics".into(),
            kind: EventKind::Seminar,
            materials: vec!["Notes".into()],
        }
    }

    #[test]
    fn upsert_replaces_in_place_or_appends() {
        let events = sample_events(now());

        let mut edited = events[1].clone();
        edited.title = "Renamed".into();
        let updated = upsert_event(&events, edited);
        assert_eq!(updated.len(), events.len());
        assert_eq!(updated[1].title, "Renamed");
        assert_eq!(events[1].title, "Organic Chemistry Lab");

        let mut fresh = events[1].clone();
        fresh.id = "99".into();
        let updated = upsert_event(&events, fresh);
        assert_eq!(updated.len(), events.len() + 1);
        assert_eq!(updated.last().unwrap().id, "99");
    }

    #[test]
    fn remove_needs_a_known_id() {
        let events = sample_events(now());
        assert_eq!(remove_event(&events, "2").unwrap().len(), 3);
        assert!(remove_event(&events, "nope").is_none());
    }

    #[test]
    fn new_events_get_status_and_millisecond_ids() {
        let mut schedule = Schedule::new(Vec::new(), now());

        let first = schedule.save(draft("Graph Theory"), now()).unwrap().clone();
        assert_eq!(first.id, now().timestamp_millis().to_string());
        assert_eq!(first.status(), Status::Live);
        assert_eq!(first.color, EventKind::Seminar.color());

        let second = schedule.save(draft("Number Theory"), now()).unwrap().clone();
        assert_eq!(second.id, (now().timestamp_millis() + 1).to_string());
        assert_eq!(schedule.events().len(), 2);
    }

    #[test]
    fn editing_replaces_the_whole_record() {
        let mut schedule = Schedule::seeded(now());

        let mut edit = draft("Calculus II");
        edit.id = Some("1".into());
        edit.start_time = now() + Duration::hours(5);
        edit.end_time = now() + Duration::hours(6);
        schedule.save(edit, now()).unwrap();

        let event = schedule.get("1").unwrap();
        assert_eq!(event.title, "Calculus II");
        assert_eq!(event.instructor.name, "Dr. Ada Park");
        assert_eq!(event.meet_link, None);
        assert_eq!(event.status(), Status::Upcoming);
        assert_eq!(schedule.events()[0].id, "1");
    }

    #[test]
    fn editing_an_unknown_event_fails() {
        let mut schedule = Schedule::seeded(now());
        let mut edit = draft("Ghost");
        edit.id = Some("404".into());

        assert!(matches!(schedule.save(edit, now()), Err(Error::UnknownEvent(id)) if id == "404"));
        assert_eq!(schedule.events().len(), 4);
    }

    #[test]
    fn invalid_drafts_change_nothing() {
        let mut schedule = Schedule::seeded(now());
        let before = schedule.events().to_vec();

        assert!(schedule.save(draft(""), now()).is_err());
        assert_eq!(schedule.events(), before.as_slice());
    }

    #[test]
    fn delete_returns_the_removed_event() {
        let mut schedule = Schedule::seeded(now());

        assert_eq!(schedule.delete("3").unwrap().id, "3");
        assert!(schedule.get("3").is_none());
        assert!(matches!(schedule.delete("3"), Err(Error::UnknownEvent(_))));
    }

    #[test]
    fn tick_moves_events_along() {
        let mut schedule = Schedule::seeded(now());
        assert_eq!(schedule.get("1").unwrap().status(), Status::Upcoming);

        let later = now() + Duration::minutes(45);
        schedule.tick(later);
        assert_eq!(schedule.last_tick(), later);
        assert_eq!(schedule.get("1").unwrap().status(), Status::Live);
        assert_eq!(schedule.get("2").unwrap().status(), Status::Past);
    }

    #[test]
    fn views_are_derived_from_the_owned_events() {
        let schedule = Schedule::seeded(now());
        let filters = Filters {
            kind: TypeFilter::Only(EventKind::Exam),
            ..Filters::default()
        };

        let view = schedule.view(&filters);
        assert_eq!(view.len(), 1);
        assert_eq!(schedule.calendar(&filters).len(), 1);
        assert_eq!(schedule.instructors().len(), 5);
        assert_eq!(schedule.document(now()).classes.len(), 4);
    }
}
