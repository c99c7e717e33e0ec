//! The persistence bridge between the task store and durable storage.
//!
//! A `Workspace` loads every slot through the migrator on open and rewrites
//! the affected slots in full after each mutation. Writes happen after the
//! in-memory change: if storage fails, the change stays and the caller gets
//! `Error::Persistence`.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::error::{Collection, Error, PersistenceError, Result};
use crate::fields::{CategoryFilter, RankingCriterion};
use crate::migrate::migrate_all;
use crate::rank::{rank, Ranked};
use crate::registry;
use crate::storage::{Slot, Storage};
use crate::store::TaskStore;
use crate::task::{Task, TaskDraft, TaskPatch};

/// Task store, ranking choice and the storage that backs them.
#[derive(Debug)]
pub struct Workspace<S: Storage> {
    store: TaskStore,
    criterion: RankingCriterion,
    storage: S,
}

impl<S: Storage> Workspace<S> {
    /// Load all state from `storage`. Missing or malformed slots start empty.
    pub fn open(storage: S) -> Self {
        let active = load_tasks(&storage, Slot::Active);
        let completed = load_tasks(&storage, Slot::Completed);
        let criterion = load_text(&storage, Slot::Ranking)
            .map(|s| RankingCriterion::from_stored(&s))
            .unwrap_or_default();
        let last_used_category = load_text(&storage, Slot::LastCategory).unwrap_or_default();

        let store = TaskStore::from_parts(active, completed, last_used_category);
        tracing::info!(
            active = store.active().len(),
            completed = store.completed().len(),
            criterion = %criterion,
            "workspace loaded"
        );
        Workspace {
            store,
            criterion,
            storage,
        }
    }

    /// Read-only view of the tasks.
    pub fn store(&self) -> &TaskStore {
        &self.store
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// The selected ranking criterion.
    pub fn criterion(&self) -> RankingCriterion {
        self.criterion
    }

    pub fn set_criterion(&mut self, criterion: RankingCriterion) -> Result<()> {
        self.criterion = criterion;
        self.persist(&[Slot::Ranking])
    }

    pub fn set_last_used_category(&mut self, category: impl Into<String>) -> Result<()> {
        self.store.set_last_used_category(category);
        self.persist(&[Slot::LastCategory])
    }

    pub fn create(&mut self, draft: TaskDraft) -> Result<Task> {
        let task = self.store.create(draft)?;
        self.persist(&[Slot::Active, Slot::LastCategory])?;
        Ok(task)
    }

    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        let task = self.store.update(id, patch)?;
        self.persist(&[Slot::Active, Slot::LastCategory])?;
        Ok(task)
    }

    pub fn complete(&mut self, id: &str) -> Result<Task> {
        let task = self.store.complete(id)?;
        self.persist(&[Slot::Active, Slot::Completed])?;
        Ok(task)
    }

    pub fn restore(&mut self, id: &str) -> Result<Task> {
        let task = self.store.restore(id)?;
        self.persist(&[Slot::Active, Slot::Completed])?;
        Ok(task)
    }

    /// Delete from either collection. Unknown ids are a no-op and write nothing.
    pub fn delete(&mut self, id: &str) -> Result<Option<Task>> {
        let Some((task, from)) = self.store.delete(id) else {
            return Ok(None);
        };
        let slot = match from {
            Collection::Active => Slot::Active,
            Collection::Completed => Slot::Completed,
        };
        self.persist(&[slot])?;
        Ok(Some(task))
    }

    /// Drop the whole history. Returns how many tasks were discarded.
    pub fn clear_history(&mut self) -> Result<usize> {
        let dropped = self.store.clear_history();
        self.persist(&[Slot::Completed])?;
        Ok(dropped)
    }

    /// Rank active tasks under the selected criterion.
    pub fn rank(&self, filter: &CategoryFilter) -> Ranked<'_> {
        rank(self.store.active(), filter, self.criterion)
    }

    /// Rank active tasks under an explicit criterion without changing the selection.
    pub fn rank_by(&self, filter: &CategoryFilter, criterion: RankingCriterion) -> Ranked<'_> {
        rank(self.store.active(), filter, criterion)
    }

    pub fn categories(&self) -> Vec<String> {
        registry::categories(self.store.active())
    }

    pub fn category_colors(&self) -> BTreeMap<String, String> {
        registry::category_colors(self.store.active())
    }

    pub fn new_task_defaults(&self) -> TaskDraft {
        registry::new_task_defaults(&self.store)
    }

    /// Rewrite `slots` from the current state. Every slot is attempted; the
    /// first failure is returned.
    fn persist(&mut self, slots: &[Slot]) -> Result<()> {
        let mut first_err: Option<PersistenceError> = None;
        for &slot in slots {
            let written = self
                .encode(slot)
                .and_then(|text| self.storage.write(slot, &text));
            if let Err(e) = written {
                tracing::error!(slot = %slot, error = %e, "failed to persist slot");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(Error::Persistence(e)),
            None => Ok(()),
        }
    }

    fn encode(&self, slot: Slot) -> std::result::Result<String, PersistenceError> {
        match slot {
            Slot::Active => to_json(slot, self.store.active()),
            Slot::Completed => to_json(slot, self.store.completed()),
            Slot::Ranking => to_json(slot, &self.criterion),
            Slot::LastCategory => to_json(slot, self.store.last_used_category()),
        }
    }
}

fn to_json<T: Serialize + ?Sized>(slot: Slot, value: &T) -> std::result::Result<String, PersistenceError> {
    serde_json::to_string_pretty(value).map_err(|source| PersistenceError::Encode { slot, source })
}

fn read_slot<S: Storage>(storage: &S, slot: Slot) -> Option<String> {
    match storage.read(slot) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(slot = %slot, error = %e, "error reading slot, starting fresh");
            None
        }
    }
}

fn load_tasks<S: Storage>(storage: &S, slot: Slot) -> Vec<Task> {
    let Some(text) = read_slot(storage, slot) else {
        return Vec::new();
    };
    match serde_json::from_str::<Vec<Value>>(&text) {
        Ok(records) => migrate_all(records),
        Err(e) => {
            tracing::warn!(slot = %slot, error = %e, "error parsing slot, starting fresh");
            Vec::new()
        }
    }
}

/// A text slot, accepted either as a JSON string or as raw text.
fn load_text<S: Storage>(storage: &S, slot: Slot) -> Option<String> {
    let text = read_slot(storage, slot)?;
    Some(serde_json::from_str::<String>(&text).unwrap_or_else(|_| text.trim().to_string()))
}
