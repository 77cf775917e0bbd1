mod calendar;
mod error;
mod filter;
mod schedule;
mod status;
mod store;
mod structs;

pub mod sample;

#[cfg(feature = "ics")]
mod ics;

pub use calendar::{group_by_date, overlapping_pairs, week_days, week_start, CalendarDay, DateBuckets};
pub use error::{Error, Result};
pub use filter::{apply_filters, instructor_options, Filters, InstructorFilter, TypeFilter};
pub use schedule::{remove_event, upsert_event, Schedule};
pub use status::{malformed_timestamps, refresh_statuses, MalformedTimestamp, Status, TimestampField};
pub use store::{
    export_file_name, export_json, import_json, FileStorage, MemoryStorage, ScheduleStore, Storage,
    BACKUP_KEY, SCHEDULE_KEY,
};
pub use structs::{
    Event, EventDraft, EventKind, Instructor, ScheduleDocument, SkippedEvent, Timestamp,
    SCHEMA_VERSION,
};
