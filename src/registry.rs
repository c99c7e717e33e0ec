//! Category and tag-color suggestions derived from the live task list.
//!
//! Nothing here is stored: every function recomputes its answer from the
//! tasks it is handed.

use std::collections::{BTreeMap, BTreeSet};

use crate::fields::LEVEL_DEFAULT;
use crate::store::TaskStore;
use crate::task::{Task, TaskDraft};

/// Color used when a task carries no tag color of its own.
pub const DEFAULT_TAG_COLOR: &str = "#ff90e8";

/// Palette offered when picking a tag color.
pub const DEFAULT_COLORS: [&str; 12] = [
    "#ff90e8", // pink
    "#ffc900", // yellow
    "#23a6d5", // blue
    "#90e0ef", // mint
    "#b185db", // purple
    "#ff6b6b", // red
    "#feca57", // orange
    "#48dbfb", // cyan
    "#ff9ff3", // rose
    "#54a0ff", // light blue
    "#5f27cd", // dark purple
    "#1dd1a1", // green
];

/// Distinct non-empty categories, sorted ascending.
pub fn categories(tasks: &[Task]) -> Vec<String> {
    tasks
        .iter()
        .filter(|t| !t.category.is_empty())
        .map(|t| t.category.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// The tag color a task shows, falling back to [`DEFAULT_TAG_COLOR`].
pub fn effective_color(task: &Task) -> &str {
    task.tag_color
        .as_deref()
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_TAG_COLOR)
}

/// Category → color of the last task (in collection order) that carries it.
pub fn category_colors(tasks: &[Task]) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for task in tasks.iter().filter(|t| !t.category.is_empty()) {
        map.insert(task.category.clone(), effective_color(task).to_string());
    }
    map
}

/// Color to pre-select for `category`.
///
/// A known category keeps its color. Otherwise the first palette color no
/// category uses yet is offered, and once the palette is exhausted colors are
/// handed out in turn.
pub fn suggest_color(category: &str, colors: &BTreeMap<String, String>) -> String {
    if let Some(color) = colors.get(category) {
        return color.clone();
    }
    DEFAULT_COLORS
        .iter()
        .find(|c| !colors.values().any(|used| used.eq_ignore_ascii_case(c)))
        .unwrap_or(&DEFAULT_COLORS[colors.len() % DEFAULT_COLORS.len()])
        .to_string()
}

/// Pre-filled values for a brand new task.
pub fn new_task_defaults(store: &TaskStore) -> TaskDraft {
    let category = store.last_used_category().to_string();
    let colors = category_colors(store.active());
    let tag_color = suggest_color(&category, &colors);
    TaskDraft {
        priority: LEVEL_DEFAULT,
        bothered_level: LEVEL_DEFAULT,
        difficulty_level: LEVEL_DEFAULT,
        tag_color: Some(tag_color),
        category,
        ..TaskDraft::default()
    }
}
