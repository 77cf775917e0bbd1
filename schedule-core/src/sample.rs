//! Classes seeded into an empty schedule.

use chrono::{DateTime, Duration, Utc};

use crate::{refresh_statuses, Event, EventKind, Instructor, Timestamp};

struct Seed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    starts_in: Duration,
    ends_in: Duration,
    location: &'static str,
    meet_link: Option<&'static str>,
    instructor: (&'static str, &'static str),
    subject: &'static str,
    kind: EventKind,
    attendee_count: u32,
    materials: [&'static str; 2],
    color: &'static str,
}

fn seeds() -> [Seed; 4] {
    [
        Seed {
            id: "1",
            title: "Advanced Calculus: Derivatives and Applications",
            description: "Deep dive into derivative applications in real-world scenarios",
            starts_in: Duration::minutes(30),
            ends_in: Duration::minutes(90),
            location: "Room 301, Math Building",
            meet_link: Some("https://meet.google.com/abc-defg-hij"),
            instructor: ("Dr. Sarah Johnson", "sarah.johnson@school.edu"),
            subject: "Mathematics",
            kind: EventKind::Lecture,
            attendee_count: 24,
            materials: ["Calculus Textbook Ch. 3", "Problem Set 5"],
            color: "#2563EB",
        },
        Seed {
            id: "2",
            title: "Organic Chemistry Lab",
            description: "Synthesis of aspirin and analysis of reaction mechanisms",
            starts_in: Duration::minutes(-30),
            ends_in: Duration::minutes(30),
            location: "Chemistry Lab 2",
            meet_link: None,
            instructor: ("Prof. Michael Chen", "michael.chen@school.edu"),
            subject: "Chemistry",
            kind: EventKind::Lab,
            attendee_count: 18,
            materials: ["Lab Manual Ch. 8", "Safety Guidelines"],
            color: "#059669",
        },
        Seed {
            id: "3",
            title: "Physics Seminar: Quantum Mechanics",
            description: "Guest lecture on quantum entanglement and applications",
            starts_in: Duration::hours(2),
            ends_in: Duration::hours(3),
            location: "Auditorium A",
            meet_link: Some("https://meet.google.com/pqr-stuv-wxy"),
            instructor: ("Dr. Emily Rodriguez", "emily.rodriguez@school.edu"),
            subject: "Physics",
            kind: EventKind::Seminar,
            attendee_count: 0,
            materials: ["Quantum Physics Notes", "Research Papers"],
            color: "#EA580C",
        },
        Seed {
            id: "4",
            title: "Biology Midterm Exam",
            description: "Comprehensive exam covering cellular biology and genetics",
            starts_in: Duration::hours(24),
            ends_in: Duration::hours(26),
            location: "Exam Hall B",
            meet_link: None,
            instructor: ("Dr. Amanda Foster", "amanda.foster@school.edu"),
            subject: "Biology",
            kind: EventKind::Exam,
            attendee_count: 45,
            materials: ["Study Guide", "Practice Exam"],
            color: "#7C3AED",
        },
    ]
}

/// Sample classes placed around `now`: one live lab, a lecture and a seminar
/// later today, and an exam tomorrow.
pub fn sample_events(now: DateTime<Utc>) -> Vec<Event> {
    let events = seeds()
        .into_iter()
        .map(|seed| Event {
            id: seed.id.to_string(),
            title: seed.title.to_string(),
            description: seed.description.to_string(),
            start_time: Timestamp::Valid(now + seed.starts_in),
            end_time: Timestamp::Valid(now + seed.ends_in),
            location: Some(seed.location.to_string()),
            meet_link: seed.meet_link.map(str::to_string),
            instructor: Instructor {
                name: seed.instructor.0.to_string(),
                email: seed.instructor.1.to_string(),
                avatar: None,
            },
            subject: seed.subject.to_string(),
            kind: seed.kind,
            is_live: false,
            is_upcoming: false,
            attendee_count: Some(seed.attendee_count),
            recording_available: Some(false),
            recording_url: None,
            materials: seed.materials.iter().map(|m| m.to_string()).collect(),
            color: seed.color.to_string(),
        })
        .collect::<Vec<_>>();

    refresh_statuses(&events, now)
}
