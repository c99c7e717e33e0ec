//! The authoritative in-memory collection of tasks.
//!
//! `TaskStore` owns two disjoint lists, active and completed, and is the only
//! place either list is mutated. Every operation validates its input before
//! touching anything, so a failed call leaves the store exactly as it was.

use std::collections::HashSet;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{Collection, Error, Result};
use crate::fields::LEVEL_MAX;
use crate::task::{Task, TaskDraft, TaskPatch};

/// Shortest id prefix accepted when resolving a task by partial id.
pub const MIN_ID_PREFIX: usize = 3;

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn required_text(field: &'static str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::validation(field, "must not be empty"));
    }
    Ok(trimmed.to_string())
}

fn checked_level(field: &'static str, value: u8) -> Result<u8> {
    if value > LEVEL_MAX {
        return Err(Error::validation(field, format!("must be between 0 and {LEVEL_MAX}, got {value}")));
    }
    Ok(value)
}

/// Accepts `#rrggbb` and stores it lowercase.
fn checked_color(value: Option<String>) -> Result<Option<String>> {
    let Some(color) = optional_text(value) else {
        return Ok(None);
    };
    let digits = color.strip_prefix('#').unwrap_or_default();
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(Error::validation("tag color", format!("expected #rrggbb, got '{color}'")));
    }
    Ok(Some(color.to_ascii_lowercase()))
}

fn optional_text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Active and completed tasks plus the last category the user picked.
#[derive(Debug, Clone, Default)]
pub struct TaskStore {
    active: Vec<Task>,
    completed: Vec<Task>,
    last_used_category: String,
}

impl TaskStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from persisted collections, repairing anything that
    /// breaks the collection invariants.
    ///
    /// Active tasks lose a stray `completed_at`, completed tasks without one
    /// get their creation time, and duplicate ids are replaced with fresh ones.
    pub fn from_parts(mut active: Vec<Task>, mut completed: Vec<Task>, last_used_category: String) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        for task in active.iter_mut().chain(completed.iter_mut()) {
            if !seen.insert(task.id.clone()) {
                let fresh = fresh_id(|id| seen.contains(id));
                tracing::warn!(old = %task.id, new = %fresh, "duplicate task id; reassigning");
                task.id = fresh.clone();
                seen.insert(fresh);
            }
        }
        for task in active.iter_mut() {
            if task.completed_at.take().is_some() {
                tracing::debug!(id = %task.id, "cleared completion time on active task");
            }
        }
        for task in completed.iter_mut() {
            if task.completed_at.is_none() {
                task.completed_at = Some(task.created_at);
            }
        }
        TaskStore {
            active,
            completed,
            last_used_category,
        }
    }

    /// Tasks still to do, in insertion order.
    pub fn active(&self) -> &[Task] {
        &self.active
    }

    /// Finished tasks, in completion order.
    pub fn completed(&self) -> &[Task] {
        &self.completed
    }

    /// Completed tasks, most recently completed first.
    pub fn history(&self) -> Vec<&Task> {
        let mut done: Vec<&Task> = self.completed.iter().collect();
        done.sort_by(|a, b| b.completed_at.cmp(&a.completed_at));
        done
    }

    /// Tasks in the given collection.
    pub fn list(&self, collection: Collection) -> &[Task] {
        match collection {
            Collection::Active => &self.active,
            Collection::Completed => &self.completed,
        }
    }

    /// The category of the most recently created or edited task.
    pub fn last_used_category(&self) -> &str {
        &self.last_used_category
    }

    pub fn set_last_used_category(&mut self, category: impl Into<String>) {
        self.last_used_category = category.into();
    }

    /// Find an active task by exact id.
    pub fn find_active(&self, id: &str) -> Option<&Task> {
        self.active.iter().find(|t| t.id == id)
    }

    /// Find a completed task by exact id.
    pub fn find_completed(&self, id: &str) -> Option<&Task> {
        self.completed.iter().find(|t| t.id == id)
    }

    /// Find a task in either collection.
    pub fn get(&self, id: &str) -> Option<(&Task, Collection)> {
        self.find_active(id)
            .map(|t| (t, Collection::Active))
            .or_else(|| self.find_completed(id).map(|t| (t, Collection::Completed)))
    }

    /// Whether any task, active or completed, has this id.
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    /// Create a task stamped with the current time.
    pub fn create(&mut self, draft: TaskDraft) -> Result<Task> {
        self.create_at(draft, now_millis())
    }

    /// Create a task stamped with `created_at` (ms since epoch).
    pub fn create_at(&mut self, draft: TaskDraft, created_at: i64) -> Result<Task> {
        let title = required_text("title", &draft.title)?;
        let category = required_text("category", &draft.category)?;
        let priority = checked_level("priority", draft.priority)?;
        let bothered_level = checked_level("bothered level", draft.bothered_level)?;
        let difficulty_level = checked_level("difficulty level", draft.difficulty_level)?;
        let tag_color = checked_color(draft.tag_color)?;

        let task = Task {
            id: fresh_id(|id| self.contains(id)),
            title,
            description: optional_text(draft.description),
            priority,
            bothered_level,
            difficulty_level,
            category: category.clone(),
            tag_color,
            deadline: draft.deadline,
            created_at,
            completed_at: None,
        };
        tracing::debug!(id = %task.id, title = %task.title, "created task");
        self.active.push(task.clone());
        self.last_used_category = category;
        Ok(task)
    }

    /// Merge `patch` into an active task. `id` and `created_at` never change.
    pub fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task> {
        let idx = position(&self.active, id).ok_or_else(|| Error::not_found(id, Collection::Active))?;

        let title = patch.title.as_deref().map(|t| required_text("title", t)).transpose()?;
        let category = patch.category.as_deref().map(|c| required_text("category", c)).transpose()?;
        let priority = patch.priority.map(|v| checked_level("priority", v)).transpose()?;
        let bothered = patch.bothered_level.map(|v| checked_level("bothered level", v)).transpose()?;
        let difficulty = patch.difficulty_level.map(|v| checked_level("difficulty level", v)).transpose()?;
        let tag_color = patch.tag_color.map(checked_color).transpose()?;

        let task = &mut self.active[idx];
        if let Some(title) = title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = optional_text(description);
        }
        if let Some(priority) = priority {
            task.priority = priority;
        }
        if let Some(bothered) = bothered {
            task.bothered_level = bothered;
        }
        if let Some(difficulty) = difficulty {
            task.difficulty_level = difficulty;
        }
        if let Some(category) = category {
            task.category = category;
        }
        if let Some(color) = tag_color {
            task.tag_color = color;
        }
        if let Some(deadline) = patch.deadline {
            task.deadline = deadline;
        }
        tracing::debug!(id = %task.id, "updated task");
        self.last_used_category = task.category.clone();
        Ok(task.clone())
    }

    /// Move an active task into the completed collection, stamped now.
    pub fn complete(&mut self, id: &str) -> Result<Task> {
        self.complete_at(id, now_millis())
    }

    /// Move an active task into the completed collection, stamped `completed_at`.
    pub fn complete_at(&mut self, id: &str, completed_at: i64) -> Result<Task> {
        let idx = position(&self.active, id).ok_or_else(|| Error::not_found(id, Collection::Active))?;
        let mut task = self.active.remove(idx);
        task.completed_at = Some(completed_at);
        tracing::debug!(id = %task.id, "completed task");
        self.completed.push(task.clone());
        Ok(task)
    }

    /// Move a completed task back to the active collection.
    pub fn restore(&mut self, id: &str) -> Result<Task> {
        let idx = position(&self.completed, id).ok_or_else(|| Error::not_found(id, Collection::Completed))?;
        let mut task = self.completed.remove(idx);
        task.completed_at = None;
        tracing::debug!(id = %task.id, "restored task");
        self.active.push(task.clone());
        Ok(task)
    }

    /// Remove a task from whichever collection holds it.
    ///
    /// Deleting an unknown id is a silent no-op and returns `None`.
    pub fn delete(&mut self, id: &str) -> Option<(Task, Collection)> {
        if let Some(idx) = position(&self.active, id) {
            tracing::debug!(id, "deleted active task");
            return Some((self.active.remove(idx), Collection::Active));
        }
        if let Some(idx) = position(&self.completed, id) {
            tracing::debug!(id, "deleted completed task");
            return Some((self.completed.remove(idx), Collection::Completed));
        }
        None
    }

    /// Discard every completed task. Returns how many were dropped.
    pub fn clear_history(&mut self) -> usize {
        let dropped = self.completed.len();
        self.completed.clear();
        tracing::debug!(dropped, "cleared history");
        dropped
    }

    /// Resolve a user-typed identifier within one collection.
    ///
    /// Tries, in order: exact id, unique id prefix, unique case-insensitive title.
    pub fn resolve(&self, query: &str, collection: Collection) -> Result<&Task> {
        let list = self.list(collection);
        let query = query.trim();

        if let Some(task) = list.iter().find(|t| t.id == query) {
            return Ok(task);
        }

        if query.len() >= MIN_ID_PREFIX {
            let by_prefix: Vec<&Task> = list.iter().filter(|t| t.id.starts_with(query)).collect();
            match by_prefix.len() {
                0 => {}
                1 => return Ok(by_prefix[0]),
                _ => return Err(ambiguous(query, &by_prefix)),
            }
        }

        let lowered = query.to_lowercase();
        let by_title: Vec<&Task> = list.iter().filter(|t| t.title.to_lowercase() == lowered).collect();
        match by_title.len() {
            0 => Err(Error::not_found(query, collection)),
            1 => Ok(by_title[0]),
            _ => Err(ambiguous(query, &by_title)),
        }
    }
}

fn position(list: &[Task], id: &str) -> Option<usize> {
    list.iter().position(|t| t.id == id)
}

fn ambiguous(query: &str, matches: &[&Task]) -> Error {
    Error::Ambiguous {
        query: query.to_string(),
        matches: matches
            .iter()
            .map(|t| format!("{} ({})", t.short_id(), t.title))
            .collect(),
    }
}

/// A new UUID v4 string that `taken` does not claim.
fn fresh_id(taken: impl Fn(&str) -> bool) -> String {
    loop {
        let id = Uuid::new_v4().to_string();
        if !taken(&id) {
            return id;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(titles: &[(&str, &str)]) -> (TaskStore, Vec<String>) {
        let mut store = TaskStore::new();
        let ids = titles
            .iter()
            .enumerate()
            .map(|(i, (title, cat))| store.create_at(TaskDraft::new(*title, *cat), 100 * (i as i64 + 1)).unwrap().id)
            .collect();
        (store, ids)
    }

    #[test]
    fn test_create_assigns_id_and_timestamp() {
        let mut store = TaskStore::new();
        let task = store.create_at(TaskDraft::new("  Write essay ", "School"), 1234).unwrap();
        assert_eq!(task.title, "Write essay");
        assert_eq!(task.created_at, 1234);
        assert!(task.completed_at.is_none());
        assert!(Uuid::parse_str(&task.id).is_ok());
        assert_eq!(store.active().len(), 1);
        assert_eq!(store.last_used_category(), "School");
    }

    #[test]
    fn test_create_ids_are_unique() {
        let (store, ids) = store_with(&[("a", "x"), ("b", "x"), ("c", "x")]);
        let unique: HashSet<_> = ids.iter().collect();
        assert_eq!(unique.len(), 3);
        assert_eq!(store.active().len(), 3);
    }

    #[test]
    fn test_create_rejects_empty_title_or_category() {
        let mut store = TaskStore::new();
        let err = store.create(TaskDraft::new("   ", "Home")).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "title", .. }));
        let err = store.create(TaskDraft::new("Shop", "")).unwrap_err();
        assert!(matches!(err, Error::Validation { field: "category", .. }));
        assert!(store.active().is_empty());
        assert_eq!(store.last_used_category(), "");
    }

    #[test]
    fn test_create_rejects_out_of_range_level() {
        let mut store = TaskStore::new();
        let draft = TaskDraft { priority: 11, ..TaskDraft::new("a", "b") };
        assert!(matches!(store.create(draft), Err(Error::Validation { field: "priority", .. })));
        assert!(store.active().is_empty());
    }

    #[test]
    fn test_tag_color_must_be_hex() {
        let mut store = TaskStore::new();
        for bad in ["red", "#fff", "#12345g", "1dd1a1", "#1dd1a1ff"] {
            let draft = TaskDraft { tag_color: Some(bad.into()), ..TaskDraft::new("a", "b") };
            assert!(
                matches!(store.create(draft), Err(Error::Validation { field: "tag color", .. })),
                "{bad} accepted"
            );
        }
        assert!(store.active().is_empty());

        let draft = TaskDraft { tag_color: Some(" #1DD1A1 ".into()), ..TaskDraft::new("a", "b") };
        let task = store.create(draft).unwrap();
        assert_eq!(task.tag_color.as_deref(), Some("#1dd1a1"));

        let patch = TaskPatch { tag_color: Some(Some("blue".into())), ..TaskPatch::default() };
        assert!(matches!(store.update(&task.id, patch), Err(Error::Validation { field: "tag color", .. })));
        assert_eq!(store.active()[0].tag_color.as_deref(), Some("#1dd1a1"));

        let patch = TaskPatch { tag_color: Some(None), ..TaskPatch::default() };
        assert_eq!(store.update(&task.id, patch).unwrap().tag_color, None);
    }

    #[test]
    fn test_update_merges_and_preserves_identity() {
        let (mut store, ids) = store_with(&[("Draft", "Work")]);
        let patch = TaskPatch {
            title: Some("Final".into()),
            priority: Some(9),
            category: Some("Deep Work".into()),
            description: Some(Some("polish".into())),
            ..TaskPatch::default()
        };
        let task = store.update(&ids[0], patch).unwrap();
        assert_eq!(task.id, ids[0]);
        assert_eq!(task.created_at, 100);
        assert_eq!(task.title, "Final");
        assert_eq!(task.priority, 9);
        assert_eq!(task.bothered_level, 5);
        assert_eq!(task.description.as_deref(), Some("polish"));
        assert_eq!(store.last_used_category(), "Deep Work");

        let cleared = store
            .update(&ids[0], TaskPatch { description: Some(None), ..TaskPatch::default() })
            .unwrap();
        assert_eq!(cleared.description, None);
    }

    #[test]
    fn test_failed_update_changes_nothing() {
        let (mut store, ids) = store_with(&[("Keep", "Home")]);
        let before = store.active().to_vec();
        let patch = TaskPatch {
            priority: Some(1),
            title: Some(" ".into()),
            ..TaskPatch::default()
        };
        assert!(store.update(&ids[0], patch).is_err());
        assert_eq!(store.active(), &before[..]);
    }

    #[test]
    fn test_update_unknown_or_completed_is_not_found() {
        let (mut store, ids) = store_with(&[("a", "x")]);
        assert!(matches!(store.update("nope", TaskPatch::default()), Err(Error::NotFound { .. })));
        store.complete(&ids[0]).unwrap();
        assert!(matches!(
            store.update(&ids[0], TaskPatch::default()),
            Err(Error::NotFound { collection: Collection::Active, .. })
        ));
    }

    #[test]
    fn test_complete_restore_round_trip() {
        let (mut store, ids) = store_with(&[("a", "x"), ("b", "y")]);
        let original = store.find_active(&ids[0]).unwrap().clone();

        let done = store.complete_at(&ids[0], 999).unwrap();
        assert_eq!(done.completed_at, Some(999));
        assert!(store.find_active(&ids[0]).is_none());
        assert_eq!(store.completed().len(), 1);

        let back = store.restore(&ids[0]).unwrap();
        assert_eq!(back, original);
        assert!(store.completed().is_empty());
        assert_eq!(store.find_active(&ids[0]), Some(&original));
    }

    #[test]
    fn test_complete_and_restore_check_collection() {
        let (mut store, ids) = store_with(&[("a", "x")]);
        assert!(matches!(
            store.restore(&ids[0]),
            Err(Error::NotFound { collection: Collection::Completed, .. })
        ));
        store.complete(&ids[0]).unwrap();
        assert!(matches!(store.complete(&ids[0]), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_delete_from_either_collection() {
        let (mut store, ids) = store_with(&[("a", "x"), ("b", "x")]);
        store.complete(&ids[1]).unwrap();

        let (gone, from) = store.delete(&ids[0]).unwrap();
        assert_eq!(gone.title, "a");
        assert_eq!(from, Collection::Active);
        let (_, from) = store.delete(&ids[1]).unwrap();
        assert_eq!(from, Collection::Completed);

        assert!(!store.contains(&ids[0]));
        assert!(!store.contains(&ids[1]));
        assert!(matches!(store.update(&ids[0], TaskPatch::default()), Err(Error::NotFound { .. })));
        assert!(matches!(store.complete(&ids[0]), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_delete_unknown_is_silent() {
        let (mut store, _) = store_with(&[("a", "x")]);
        assert!(store.delete("missing").is_none());
        assert_eq!(store.active().len(), 1);
    }

    #[test]
    fn test_clear_history() {
        let (mut store, ids) = store_with(&[("a", "x"), ("b", "x"), ("c", "x")]);
        store.complete(&ids[0]).unwrap();
        store.complete(&ids[1]).unwrap();
        assert_eq!(store.clear_history(), 2);
        assert!(store.completed().is_empty());
        assert_eq!(store.active().len(), 1);
        assert_eq!(store.clear_history(), 0);
    }

    #[test]
    fn test_history_newest_completion_first() {
        let (mut store, ids) = store_with(&[("a", "x"), ("b", "x"), ("c", "x")]);
        store.complete_at(&ids[1], 50).unwrap();
        store.complete_at(&ids[0], 90).unwrap();
        store.complete_at(&ids[2], 10).unwrap();
        let order: Vec<_> = store.history().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
    }

    #[test]
    fn test_from_parts_repairs_invariants() {
        let (mut seed, ids) = store_with(&[("a", "x"), ("b", "x")]);
        seed.complete_at(&ids[1], 5).unwrap();
        let mut active = seed.active().to_vec();
        let mut completed = seed.completed().to_vec();
        active[0].completed_at = Some(77);
        completed[0].completed_at = None;
        // Same id in both collections.
        completed[0].id = active[0].id.clone();

        let store = TaskStore::from_parts(active, completed, "x".into());
        assert_eq!(store.active()[0].completed_at, None);
        assert_eq!(store.completed()[0].completed_at, Some(store.completed()[0].created_at));
        assert_ne!(store.active()[0].id, store.completed()[0].id);
        assert_eq!(store.last_used_category(), "x");
    }

    #[test]
    fn test_resolve_by_id_prefix_and_title() {
        let (store, ids) = store_with(&[("Water plants", "Home"), ("Taxes", "Admin")]);
        assert_eq!(store.resolve(&ids[0], Collection::Active).unwrap().title, "Water plants");
        assert_eq!(store.resolve(&ids[1][..8], Collection::Active).unwrap().title, "Taxes");
        assert_eq!(store.resolve("water PLANTS", Collection::Active).unwrap().id, ids[0]);
        assert!(matches!(
            store.resolve("Groceries", Collection::Active),
            Err(Error::NotFound { .. })
        ));
        assert!(store.resolve("Taxes", Collection::Completed).is_err());
    }

    #[test]
    fn test_resolve_ambiguous_title() {
        let (store, _) = store_with(&[("Email", "Work"), ("email", "Home")]);
        assert!(matches!(store.resolve("EMAIL", Collection::Active), Err(Error::Ambiguous { .. })));
    }
}
