//! Durable storage for the four persisted slots.
//!
//! Each slot is a small JSON document. `FileStorage` keeps one file per slot
//! in the data directory and replaces it atomically on every write;
//! `MemoryStorage` keeps them in a map for tests and embedding.

use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::error::PersistenceError;

/// One independently persisted piece of state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Slot {
    /// Active task list.
    Active,
    /// Completed task list.
    Completed,
    /// Selected ranking criterion.
    Ranking,
    /// Last category used in the task form.
    LastCategory,
}

impl Slot {
    pub const ALL: [Slot; 4] = [Slot::Active, Slot::Completed, Slot::Ranking, Slot::LastCategory];

    /// File name of the slot inside the data directory.
    pub fn file_name(self) -> &'static str {
        match self {
            Slot::Active => "tasks.json",
            Slot::Completed => "completed.json",
            Slot::Ranking => "ranking.json",
            Slot::LastCategory => "last_category.json",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Slot::Active => "active tasks",
            Slot::Completed => "completed tasks",
            Slot::Ranking => "ranking criterion",
            Slot::LastCategory => "last used category",
        })
    }
}

/// Somewhere the slots can be read from and written to.
pub trait Storage {
    /// Contents of a slot, or `None` if it has never been written.
    fn read(&self, slot: Slot) -> Result<Option<String>, PersistenceError>;

    /// Replace a slot's contents in full.
    fn write(&mut self, slot: Slot, contents: &str) -> Result<(), PersistenceError>;
}

/// One JSON file per slot in a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Storage rooted at `dir`. The directory must already exist.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FileStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a slot file.
    pub fn path(&self, slot: Slot) -> PathBuf {
        self.dir.join(slot.file_name())
    }
}

impl Storage for FileStorage {
    fn read(&self, slot: Slot) -> Result<Option<String>, PersistenceError> {
        let path = self.path(slot);
        match fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Io { op: "read", path, source }),
        }
    }

    fn write(&mut self, slot: Slot, contents: &str) -> Result<(), PersistenceError> {
        let path = self.path(slot);
        // Atomic-ish write via temp + rename.
        let tmp = path.with_extension("json.tmp");
        let io_err = |source| PersistenceError::Io {
            op: "write",
            path: path.clone(),
            source,
        };
        let mut f = File::create(&tmp).map_err(io_err)?;
        f.write_all(contents.as_bytes()).map_err(io_err)?;
        f.flush().map_err(io_err)?;
        fs::rename(&tmp, &path).map_err(io_err)?;
        tracing::debug!(slot = %slot, path = %path.display(), bytes = contents.len(), "wrote slot");
        Ok(())
    }
}

/// Slots kept in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    slots: HashMap<Slot, String>,
    reject_writes: bool,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-filled with slot contents.
    pub fn with(mut self, slot: Slot, contents: impl Into<String>) -> Self {
        self.slots.insert(slot, contents.into());
        self
    }

    /// Make every following write fail (or succeed again).
    pub fn reject_writes(&mut self, reject: bool) {
        self.reject_writes = reject;
    }

    /// Current contents of a slot.
    pub fn get(&self, slot: Slot) -> Option<&str> {
        self.slots.get(&slot).map(String::as_str)
    }
}

impl Storage for MemoryStorage {
    fn read(&self, slot: Slot) -> Result<Option<String>, PersistenceError> {
        Ok(self.slots.get(&slot).cloned())
    }

    fn write(&mut self, slot: Slot, contents: &str) -> Result<(), PersistenceError> {
        if self.reject_writes {
            return Err(PersistenceError::Rejected { slot });
        }
        self.slots.insert(slot, contents.to_string());
        Ok(())
    }
}
