//! Persisted client key-value storage.
//!
//! The auth flow keeps the session token here, the calendar view keeps the
//! last selected view. `FileStorage` rewrites a small JSON object on every
//! change so a restarted client can resume the session.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

pub const TOKEN_KEY: &str = "token";
pub const TOKEN_INIT_DATE_KEY: &str = "token-init-date";
pub const LAST_VIEW_KEY: &str = "lastView";

/// String key-value store with the semantics of browser local storage.
pub trait Storage {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn clear(&mut self) -> Result<(), StorageError>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        Ok(())
    }
}

/// Storage backed by a JSON file.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStorage {
    /// Open `path`, starting empty when the file does not exist yet.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&self.entries)?)?;
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()
    }

    fn clear(&mut self) -> Result<(), StorageError> {
        self.entries.clear();
        self.flush()
    }
}

/// Calendar layouts a host can remember between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalendarView {
    Month,
    #[default]
    Week,
    WorkWeek,
    Day,
    Agenda,
}

impl CalendarView {
    pub fn as_str(self) -> &'static str {
        match self {
            CalendarView::Month => "month",
            CalendarView::Week => "week",
            CalendarView::WorkWeek => "work_week",
            CalendarView::Day => "day",
            CalendarView::Agenda => "agenda",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "month" => CalendarView::Month,
            "week" => CalendarView::Week,
            "work_week" => CalendarView::WorkWeek,
            "day" => CalendarView::Day,
            "agenda" => CalendarView::Agenda,
            _ => return None,
        })
    }
}

/// The remembered view, `week` when nothing (or garbage) is stored.
pub fn load_last_view(storage: &impl Storage) -> CalendarView {
    storage
        .get(LAST_VIEW_KEY)
        .and_then(|raw| CalendarView::parse(&raw))
        .unwrap_or_default()
}

pub fn save_last_view(storage: &mut impl Storage, view: CalendarView) -> Result<(), StorageError> {
    storage.set(LAST_VIEW_KEY, view.as_str())
}
