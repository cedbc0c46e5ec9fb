//! On-disk storage for history, settings and tasks
//!
//! Everything lives as pretty-printed JSON under one data directory:
//! - History: <data>/history.json (array of session records, newest first)
//! - Settings: <data>/settings.json
//! - Tasks: <data>/tasks.json
//!
//! Loading never fails. Missing files give defaults and damaged files give
//! defaults with a warning. Within a file that parses, a field with a bad
//! value is ignored on its own, so the other stored values survive. A history
//! entry is dropped only when its start time is missing or unusable.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::history::History;
use crate::session::SessionRecord;
use crate::settings::Settings;
use crate::tasks::TaskList;

const HISTORY_FILE: &str = "history.json";
const SETTINGS_FILE: &str = "settings.json";
const TASKS_FILE: &str = "tasks.json";

pub struct Store {
    data_dir: PathBuf,
}

impl Store {
    /// Open a store rooted at `data_dir`, creating the directory if needed
    pub fn new(data_dir: &Path) -> Result<Self> {
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path(&self, name: &str) -> PathBuf {
        self.data_dir.join(name)
    }

    /// Raw file contents, or `None` when the file is absent or unreadable
    fn read(&self, name: &str) -> Option<String> {
        let path = self.path(name);
        if !path.exists() {
            return None;
        }
        match fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => None,
            Ok(content) => Some(content),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "could not read stored data, using defaults");
                None
            }
        }
    }

    /// Load a JSON object onto the type's defaults, one field at a time
    fn load_or_default<T: Serialize + DeserializeOwned + Default>(&self, name: &str) -> T {
        let Some(content) = self.read(name) else {
            return T::default();
        };
        let stored = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(stored)) => stored,
            Ok(_) => {
                warn!(file = name, "stored data is not an object, using defaults");
                return T::default();
            }
            Err(e) => {
                warn!(file = name, error = %e, "stored data is malformed, using defaults");
                return T::default();
            }
        };

        let defaults = match serde_json::to_value(T::default()) {
            Ok(Value::Object(defaults)) => defaults,
            _ => Map::new(),
        };
        overlay(defaults, stored, name).unwrap_or_default()
    }

    fn write<T: Serialize + ?Sized>(&self, name: &str, value: &T) -> Result<()> {
        let path = self.path(name);
        let content = serde_json::to_string_pretty(value)
            .with_context(|| format!("Failed to serialize {}", name))?;

        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        debug!(path = %path.display(), "saved");
        Ok(())
    }

    /// Load the session history, skipping entries with no usable start time
    pub fn load_history(&self) -> History {
        let Some(content) = self.read(HISTORY_FILE) else {
            return History::new();
        };

        let entries = match serde_json::from_str::<Value>(&content) {
            Ok(Value::Array(entries)) => entries,
            Ok(_) => {
                warn!(file = HISTORY_FILE, "history is not a list, starting empty");
                return History::new();
            }
            Err(e) => {
                warn!(file = HISTORY_FILE, error = %e, "history is malformed, starting empty");
                return History::new();
            }
        };

        let mut sessions = Vec::with_capacity(entries.len());
        for (index, entry) in entries.into_iter().enumerate() {
            match history_entry(entry) {
                Some(session) => sessions.push(session),
                None => warn!(index, "skipping history entry without a usable start time"),
            }
        }
        History::from_records(sessions)
    }

    pub fn save_history(&self, history: &History) -> Result<()> {
        self.write(HISTORY_FILE, history.sessions())
    }

    pub fn load_settings(&self) -> Settings {
        self.load_or_default(SETTINGS_FILE)
    }

    pub fn save_settings(&self, settings: &Settings) -> Result<()> {
        self.write(SETTINGS_FILE, settings)
    }

    pub fn load_tasks(&self) -> TaskList {
        self.load_or_default(TASKS_FILE)
    }

    pub fn save_tasks(&self, tasks: &TaskList) -> Result<()> {
        self.write(TASKS_FILE, tasks)
    }
}

/// Apply stored fields on top of `base`, skipping any field that would make
/// the result fail to deserialize
fn overlay<T: DeserializeOwned>(mut merged: Map<String, Value>, stored: Map<String, Value>, file: &str) -> Option<T> {
    for (key, value) in stored {
        let previous = merged.insert(key.clone(), value);
        if serde_json::from_value::<T>(Value::Object(merged.clone())).is_err() {
            warn!(file, key = %key, "ignoring invalid stored value");
            match previous {
                Some(previous) => merged.insert(key, previous),
                None => merged.remove(&key),
            };
        }
    }
    serde_json::from_value(Value::Object(merged)).ok()
}

/// One stored session. Only `startTime` is essential; other bad fields fall
/// back to their defaults.
fn history_entry(entry: Value) -> Option<SessionRecord> {
    let mut session = match serde_json::from_value::<SessionRecord>(entry.clone()) {
        Ok(session) => session,
        Err(_) => {
            let Value::Object(fields) = entry else {
                return None;
            };
            let mut base = Map::new();
            base.insert("startTime".to_string(), fields.get("startTime")?.clone());
            overlay(base, fields, HISTORY_FILE)?
        }
    };

    if session.id.is_empty() {
        session.id = Uuid::new_v4().to_string();
    }
    session.end_time = session.end_time.max(session.start_time);
    Some(session)
}
