//! Task data structure and the input shapes used to create and edit tasks.
//!
//! The persisted field names are camelCase so that data written by earlier
//! versions of the app loads without translation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::LEVEL_DEFAULT;

/// A single to-do item with its three ranking axes.
///
/// `completed_at` is set exactly when the task lives in the completed
/// collection of the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub priority: u8,
    pub bothered_level: u8,
    pub difficulty_level: u8,
    #[serde(default)]
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<DateTime<Utc>>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: i64,
    /// Milliseconds since the Unix epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

impl Task {
    /// Short human label used in listings and error messages.
    pub fn short_id(&self) -> &str {
        let end = self.id.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.id.len());
        &self.id[..end]
    }

    /// Description, treating an empty string as absent.
    pub fn description_text(&self) -> Option<&str> {
        self.description.as_deref().filter(|d| !d.trim().is_empty())
    }
}

/// Everything the user supplies when creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDraft {
    pub title: String,
    pub description: Option<String>,
    pub priority: u8,
    pub bothered_level: u8,
    pub difficulty_level: u8,
    pub category: String,
    pub tag_color: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
}

impl Default for TaskDraft {
    fn default() -> Self {
        TaskDraft {
            title: String::new(),
            description: None,
            priority: LEVEL_DEFAULT,
            bothered_level: LEVEL_DEFAULT,
            difficulty_level: LEVEL_DEFAULT,
            category: String::new(),
            tag_color: None,
            deadline: None,
        }
    }
}

impl TaskDraft {
    /// A draft with a title and category and default levels.
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        TaskDraft {
            title: title.into(),
            category: category.into(),
            ..TaskDraft::default()
        }
    }
}

/// A partial edit. `None` leaves a field untouched; for the clearable fields
/// `Some(None)` removes the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<u8>,
    pub bothered_level: Option<u8>,
    pub difficulty_level: Option<u8>,
    pub category: Option<String>,
    pub tag_color: Option<Option<String>>,
    pub deadline: Option<Option<DateTime<Utc>>>,
}

impl TaskPatch {
    /// Whether the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// A patch that overwrites every editable field with the draft's values.
    pub fn replace_with(draft: TaskDraft) -> Self {
        TaskPatch {
            title: Some(draft.title),
            description: Some(draft.description),
            priority: Some(draft.priority),
            bothered_level: Some(draft.bothered_level),
            difficulty_level: Some(draft.difficulty_level),
            category: Some(draft.category),
            tag_color: Some(draft.tag_color),
            deadline: Some(draft.deadline),
        }
    }
}
