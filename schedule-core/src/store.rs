use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::structs::default_version;
use crate::{Error, Event, Result, ScheduleDocument, SkippedEvent, Timestamp, SCHEMA_VERSION};

/// Storage key the schedule document lives under.
pub const SCHEDULE_KEY: &str = "scheduleData";

/// Storage key a copy of an unreadable schedule is kept under.
pub const BACKUP_KEY: &str = "scheduleData-backup";

/// String key-value storage.
pub trait Storage {
    fn get_item(&self, key: &str) -> Result<Option<String>>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove_item(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: HashMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.items.get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        self.items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        self.items.remove(key);
        Ok(())
    }
}

/// Keeps each key in its own `<key>.json` file inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Opens `dir`, creating it if needed.
    pub fn open<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

        if !valid {
            return Err(Error::InvalidKey(key.to_string()));
        }

        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        match fs::read_to_string(self.path(key)?) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<()> {
        let path = self.path(key)?;
        let partial = path.with_extension("json.partial");

        fs::write(&partial, value)?;
        fs::rename(&partial, &path)?;
        Ok(())
    }

    fn remove_item(&mut self, key: &str) -> Result<()> {
        match fs::remove_file(self.path(key)?) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => Err(err.into()),
            _ => Ok(()),
        }
    }
}

/// Reads and writes the schedule document through a [`Storage`].
#[derive(Debug)]
pub struct ScheduleStore<S> {
    storage: S,
}

impl<S: Storage> ScheduleStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// `Ok(None)` when nothing has been saved yet.
    pub fn load(&self) -> Result<Option<ScheduleDocument>> {
        let Some(raw) = self.storage.get_item(SCHEDULE_KEY)? else {
            debug!("No stored schedule under `{SCHEDULE_KEY}`");
            return Ok(None);
        };

        let document = import_json(&raw)?;
        debug!(
            "Loaded {} events saved at {}",
            document.classes.len(),
            document.last_updated
        );

        Ok(Some(document))
    }

    pub fn save(&mut self, events: &[Event], now: DateTime<Utc>) -> Result<()> {
        let document = ScheduleDocument::new(events.to_vec(), now);
        self.storage
            .set_item(SCHEDULE_KEY, &serde_json::to_string(&document)?)?;

        debug!("Saved {} events", events.len());
        Ok(())
    }

    /// Copies the stored document to [`BACKUP_KEY`]. `Ok(false)` when there
    /// is nothing stored.
    pub fn backup(&mut self) -> Result<bool> {
        let Some(raw) = self.storage.get_item(SCHEDULE_KEY)? else {
            return Ok(false);
        };

        self.storage.set_item(BACKUP_KEY, &raw)?;
        debug!("Copied stored schedule to `{BACKUP_KEY}`");
        Ok(true)
    }

    pub fn clear(&mut self) -> Result<()> {
        self.storage.remove_item(SCHEDULE_KEY)
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }
}

/// The document as a human-readable export.
pub fn export_json(events: &[Event], now: DateTime<Utc>) -> Result<String> {
    let document = ScheduleDocument::new(events.to_vec(), now);
    Ok(serde_json::to_string_pretty(&document)?)
}

/// e.g. `schedule-2024-09-02.json`
pub fn export_file_name(now: DateTime<Utc>) -> String {
    format!("schedule-{}.json", now.format("%Y-%m-%d"))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    classes: Vec<Value>,
    #[serde(default)]
    last_updated: Timestamp,
    #[serde(default = "default_version")]
    version: String,
}

/// Parses a stored or exported document. Entries that are not valid events
/// are left out and listed in [`ScheduleDocument::skipped`].
pub fn import_json(raw: &str) -> Result<ScheduleDocument> {
    let stored: StoredDocument = serde_json::from_str(raw)?;

    let mut classes = Vec::with_capacity(stored.classes.len());
    let mut skipped = Vec::new();

    for (index, entry) in stored.classes.into_iter().enumerate() {
        let id = entry
            .get("id")
            .and_then(Value::as_str)
            .unwrap_or("no id")
            .to_string();

        match serde_json::from_value::<Event>(entry) {
            Ok(event) => classes.push(event),
            Err(err) => {
                let entry = SkippedEvent {
                    index,
                    id,
                    reason: err.to_string(),
                };
                warn!("{entry}");
                skipped.push(entry);
            }
        }
    }

    let document = ScheduleDocument {
        classes,
        last_updated: stored.last_updated,
        version: stored.version,
        skipped,
    };

    if document.version != SCHEMA_VERSION {
        warn!(
            "Schedule document has version {}, expected {SCHEMA_VERSION}",
            document.version
        );
    }

    Ok(document)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::sample::sample_events;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 2, 10, 0, 0).unwrap()
    }

    #[test]
    fn empty_storage_loads_nothing() {
        let store = ScheduleStore::new(MemoryStorage::new());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn saved_schedule_loads_back() {
        let events = sample_events(now());
        let mut store = ScheduleStore::new(MemoryStorage::new());
        store.save(&events, now()).unwrap();

        let document = store.load().unwrap().unwrap();
        assert_eq!(document.classes, events);
        assert_eq!(document.version, SCHEMA_VERSION);
        assert_eq!(document.last_updated, Timestamp::Valid(now()));

        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn corrupt_document_is_an_error() {
        let mut storage = MemoryStorage::new();
        storage.set_item(SCHEDULE_KEY, "{\"classes\": [").unwrap();

        let store = ScheduleStore::new(storage);
        assert!(matches!(store.load(), Err(Error::Json(_))));
    }

    #[test]
    fn file_storage_persists_between_opens() {
        let dir = tempfile::tempdir().unwrap();
        let events = sample_events(now());

        let mut store = ScheduleStore::new(FileStorage::open(dir.path()).unwrap());
        store.save(&events, now()).unwrap();
        assert!(dir.path().join("scheduleData.json").exists());
        assert!(!dir.path().join("scheduleData.json.partial").exists());

        let reopened = ScheduleStore::new(FileStorage::open(dir.path()).unwrap());
        assert_eq!(reopened.load().unwrap().unwrap().classes, events);
    }

    #[test]
    fn file_storage_rejects_path_like_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = FileStorage::open(dir.path()).unwrap();

        assert!(matches!(
            storage.set_item("../escape", "{}"),
            Err(Error::InvalidKey(_))
        ));
        assert!(storage.get_item("missing").unwrap().is_none());
        storage.remove_item("missing").unwrap();
    }

    #[test]
    fn unreadable_entries_are_skipped_not_fatal() {
        let raw = r#"{
            "classes": [
                { "id": "w", "title": "Pottery", "instructor": { "name": "Kim" }, "type": "workshop" },
                { "id": "s", "title": "Statistics", "instructor": { "name": "Lee" }, "type": "lecture" },
                "not an event"
            ],
            "version": "1.0.0"
        }"#;

        let document = import_json(raw).unwrap();
        assert_eq!(document.classes.len(), 1);
        assert_eq!(document.classes[0].id, "s");

        let skipped = document
            .skipped
            .iter()
            .map(|entry| (entry.index, entry.id.as_str()))
            .collect::<Vec<_>>();
        assert_eq!(skipped, [(0, "w"), (2, "no id")]);
        assert!(document.skipped[0].reason.contains("workshop"));
    }

    #[test]
    fn backup_copies_the_stored_document() {
        let mut store = ScheduleStore::new(MemoryStorage::new());
        assert!(!store.backup().unwrap());

        store.save(&sample_events(now()), now()).unwrap();
        assert!(store.backup().unwrap());

        let storage = store.storage();
        assert_eq!(
            storage.get_item(BACKUP_KEY).unwrap(),
            storage.get_item(SCHEDULE_KEY).unwrap()
        );
    }

    #[test]
    fn export_is_pretty_and_reimportable() {
        let events = sample_events(now());
        let exported = export_json(&events, now()).unwrap();

        assert!(exported.contains("\n  \"classes\": ["));
        assert_eq!(import_json(&exported).unwrap().classes, events);
        assert_eq!(export_file_name(now()), "schedule-2024-09-02.json");
    }
}
