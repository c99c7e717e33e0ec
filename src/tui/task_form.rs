//! Task form handling for the terminal user interface.
//!
//! The form backs both the add and the edit screen. Text fields take typed
//! input; the color and the three levels are selectors changed with
//! Left/Right. The category field accepts typing and also cycles through the
//! known categories with Left/Right, picking up that category's color.

use std::collections::BTreeMap;

use chrono::Local;

use crate::display::parse_deadline_input;
use crate::error::{Error, Result};
use crate::fields::{LEVEL_MAX, LEVEL_MIN};
use crate::registry::{DEFAULT_COLORS, DEFAULT_TAG_COLOR};
use crate::task::{Task, TaskDraft};
use crate::tui::input::InputField;

/// Global order constants for form fields.
pub const TITLE_GLOBAL_ORDER: usize = 0;
pub const DESCRIPTION_GLOBAL_ORDER: usize = 1;
pub const CATEGORY_GLOBAL_ORDER: usize = 2;
pub const COLOR_GLOBAL_ORDER: usize = 3;
pub const DEADLINE_GLOBAL_ORDER: usize = 4;
pub const PRIORITY_GLOBAL_ORDER: usize = 5;
pub const BOTHERED_GLOBAL_ORDER: usize = 6;
pub const DIFFICULTY_GLOBAL_ORDER: usize = 7;

const FIELD_COUNT: usize = 8;

/// Task form for creating and editing tasks.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub title: InputField,
    pub description: InputField,
    pub category: InputField,
    pub deadline: InputField,
    pub tag_color: String,
    pub priority: u8,
    pub bothered_level: u8,
    pub difficulty_level: u8,
    pub current_field: usize,
    pub available_categories: Vec<String>,
    pub category_colors: BTreeMap<String, String>,
}

impl TaskForm {
    /// A form pre-filled from a draft (usually the new-task defaults).
    pub fn from_draft(draft: &TaskDraft, available_categories: Vec<String>, category_colors: BTreeMap<String, String>) -> Self {
        let mut form = TaskForm {
            title: InputField::with_value(&draft.title),
            description: InputField::with_value(draft.description.as_deref().unwrap_or_default()),
            category: InputField::with_value(&draft.category),
            deadline: InputField::with_value(&draft.deadline.map(format_deadline_input).unwrap_or_default()),
            tag_color: draft.tag_color.clone().unwrap_or_else(|| DEFAULT_TAG_COLOR.to_string()),
            priority: draft.priority,
            bothered_level: draft.bothered_level,
            difficulty_level: draft.difficulty_level,
            current_field: TITLE_GLOBAL_ORDER,
            available_categories,
            category_colors,
        };
        form.update_active_field();
        form
    }

    /// A form populated from an existing task.
    pub fn from_task(task: &Task, available_categories: Vec<String>, category_colors: BTreeMap<String, String>) -> Self {
        let draft = TaskDraft {
            title: task.title.clone(),
            description: task.description.clone(),
            priority: task.priority,
            bothered_level: task.bothered_level,
            difficulty_level: task.difficulty_level,
            category: task.category.clone(),
            tag_color: task.tag_color.clone(),
            deadline: task.deadline,
        };
        Self::from_draft(&draft, available_categories, category_colors)
    }

    /// Collect the form into a draft. Only the deadline is checked here; the
    /// store validates the rest.
    pub fn to_draft(&self) -> Result<TaskDraft> {
        let deadline = match self.deadline.non_empty() {
            Some(text) => Some(
                parse_deadline_input(&text)
                    .ok_or_else(|| Error::validation("deadline", format!("could not understand '{text}'")))?,
            ),
            None => None,
        };
        Ok(TaskDraft {
            title: self.title.value.trim().to_string(),
            description: self.description.non_empty(),
            priority: self.priority,
            bothered_level: self.bothered_level,
            difficulty_level: self.difficulty_level,
            category: self.category.value.trim().to_string(),
            tag_color: Some(self.tag_color.clone()),
            deadline,
        })
    }

    fn text_field_mut(&mut self) -> Option<&mut InputField> {
        match self.current_field {
            TITLE_GLOBAL_ORDER => Some(&mut self.title),
            DESCRIPTION_GLOBAL_ORDER => Some(&mut self.description),
            CATEGORY_GLOBAL_ORDER => Some(&mut self.category),
            DEADLINE_GLOBAL_ORDER => Some(&mut self.deadline),
            _ => None,
        }
    }

    /// Move to the next field in the form.
    pub fn next_field(&mut self) {
        self.current_field = (self.current_field + 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Move to the previous field in the form.
    pub fn prev_field(&mut self) {
        self.current_field = (self.current_field + FIELD_COUNT - 1) % FIELD_COUNT;
        self.update_active_field();
    }

    /// Mark only the current text field as active.
    pub fn update_active_field(&mut self) {
        for field in [&mut self.title, &mut self.description, &mut self.category, &mut self.deadline] {
            field.active = false;
        }
        if let Some(field) = self.text_field_mut() {
            field.active = true;
        }
    }

    /// Handle character input for the currently active field.
    pub fn handle_char(&mut self, c: char) {
        if let Some(field) = self.text_field_mut() {
            field.handle_char(c);
        }
        if self.current_field == CATEGORY_GLOBAL_ORDER {
            self.apply_category_color();
        }
    }

    /// Handle backspace input for the currently active field.
    pub fn handle_backspace(&mut self) {
        if let Some(field) = self.text_field_mut() {
            field.handle_backspace();
        }
        if self.current_field == CATEGORY_GLOBAL_ORDER {
            self.apply_category_color();
        }
    }

    /// Handle delete input for the currently active field.
    pub fn handle_delete(&mut self) {
        if let Some(field) = self.text_field_mut() {
            field.handle_delete();
        }
    }

    /// Handle left/right arrow keys for cursor movement or selector changes.
    pub fn handle_left_right(&mut self, right: bool) {
        match self.current_field {
            CATEGORY_GLOBAL_ORDER => self.cycle_category(right),
            COLOR_GLOBAL_ORDER => self.cycle_color(right),
            PRIORITY_GLOBAL_ORDER => self.priority = step_level(self.priority, right),
            BOTHERED_GLOBAL_ORDER => self.bothered_level = step_level(self.bothered_level, right),
            DIFFICULTY_GLOBAL_ORDER => self.difficulty_level = step_level(self.difficulty_level, right),
            _ => {
                if let Some(field) = self.text_field_mut() {
                    if right {
                        field.move_cursor_right();
                    } else {
                        field.move_cursor_left();
                    }
                }
            }
        }
    }

    /// Step to the next or previous known category and take its color.
    pub fn cycle_category(&mut self, forward: bool) {
        let n = self.available_categories.len();
        if n == 0 {
            return;
        }
        let current = self.category.value.trim();
        let next = match self.available_categories.iter().position(|c| c == current) {
            Some(i) if forward => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
            None if forward => 0,
            None => n - 1,
        };
        let picked = self.available_categories[next].clone();
        self.category.set(&picked);
        self.apply_category_color();
    }

    /// Step through the palette.
    pub fn cycle_color(&mut self, forward: bool) {
        let n = DEFAULT_COLORS.len();
        let next = match DEFAULT_COLORS.iter().position(|c| c.eq_ignore_ascii_case(&self.tag_color)) {
            Some(i) if forward => (i + 1) % n,
            Some(i) => (i + n - 1) % n,
            None => 0,
        };
        self.tag_color = DEFAULT_COLORS[next].to_string();
    }

    fn apply_category_color(&mut self) {
        if let Some(color) = self.category_colors.get(self.category.value.trim()) {
            self.tag_color = color.clone();
        }
    }

    /// Parsed deadline shown under the deadline field while typing.
    pub fn deadline_preview(&self) -> String {
        match self.deadline.non_empty() {
            None => "no deadline".into(),
            Some(text) => match parse_deadline_input(&text) {
                Some(dt) => dt.with_timezone(&Local).format("%a %Y-%m-%d %H:%M").to_string(),
                None => "not understood".into(),
            },
        }
    }
}

fn step_level(level: u8, up: bool) -> u8 {
    if up {
        level.saturating_add(1).min(LEVEL_MAX)
    } else {
        level.saturating_sub(1).max(LEVEL_MIN)
    }
}

fn format_deadline_input(deadline: chrono::DateTime<chrono::Utc>) -> String {
    deadline.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> TaskForm {
        let categories = vec!["Health".to_string(), "Work".to_string()];
        let colors = BTreeMap::from([
            ("Health".to_string(), "#1dd1a1".to_string()),
            ("Work".to_string(), "#54a0ff".to_string()),
        ]);
        TaskForm::from_draft(&TaskDraft::default(), categories, colors)
    }

    #[test]
    fn test_cycle_category_applies_color() {
        let mut form = form();
        form.current_field = CATEGORY_GLOBAL_ORDER;
        form.handle_left_right(true);
        assert_eq!(form.category.value, "Health");
        assert_eq!(form.tag_color, "#1dd1a1");
        form.handle_left_right(true);
        assert_eq!(form.category.value, "Work");
        assert_eq!(form.tag_color, "#54a0ff");
        form.handle_left_right(true);
        assert_eq!(form.category.value, "Health");
        form.handle_left_right(false);
        assert_eq!(form.category.value, "Work");
    }

    #[test]
    fn test_typing_known_category_picks_color() {
        let mut form = form();
        form.current_field = CATEGORY_GLOBAL_ORDER;
        for c in "Work".chars() {
            form.handle_char(c);
        }
        assert_eq!(form.tag_color, "#54a0ff");
        form.handle_char('s');
        assert_eq!(form.tag_color, "#54a0ff");
    }

    #[test]
    fn test_levels_clamp() {
        let mut form = form();
        form.current_field = PRIORITY_GLOBAL_ORDER;
        for _ in 0..20 {
            form.handle_left_right(true);
        }
        assert_eq!(form.priority, 10);
        form.current_field = DIFFICULTY_GLOBAL_ORDER;
        for _ in 0..20 {
            form.handle_left_right(false);
        }
        assert_eq!(form.difficulty_level, 0);
        assert_eq!(form.bothered_level, 5);
    }

    #[test]
    fn test_color_cycles_palette() {
        let mut form = form();
        form.current_field = COLOR_GLOBAL_ORDER;
        assert_eq!(form.tag_color, DEFAULT_TAG_COLOR);
        form.handle_left_right(true);
        assert_eq!(form.tag_color, DEFAULT_COLORS[1]);
        form.handle_left_right(false);
        form.handle_left_right(false);
        assert_eq!(form.tag_color, DEFAULT_COLORS[11]);
    }

    #[test]
    fn test_field_navigation_wraps() {
        let mut form = form();
        assert!(form.title.active);
        form.prev_field();
        assert_eq!(form.current_field, DIFFICULTY_GLOBAL_ORDER);
        assert!(!form.title.active);
        form.next_field();
        form.next_field();
        assert_eq!(form.current_field, DESCRIPTION_GLOBAL_ORDER);
        assert!(form.description.active);
    }

    #[test]
    fn test_to_draft() {
        let mut form = form();
        form.title.set("  Write report ");
        form.description.set("   ");
        form.category.set("Work");
        form.deadline.set("2030-03-01 09:30");
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.title, "Write report");
        assert_eq!(draft.description, None);
        assert_eq!(draft.category, "Work");
        let local = draft.deadline.unwrap().with_timezone(&Local);
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2030-03-01 09:30");

        form.deadline.set("someday");
        assert!(matches!(form.to_draft(), Err(Error::Validation { field: "deadline", .. })));
    }

    #[test]
    fn test_from_task_keeps_values() {
        let task = Task {
            id: "t1".into(),
            title: "Stretch".into(),
            description: Some("10 min".into()),
            priority: 3,
            bothered_level: 7,
            difficulty_level: 1,
            category: "Health".into(),
            tag_color: Some("#1dd1a1".into()),
            deadline: None,
            created_at: 0,
            completed_at: None,
        };
        let form = TaskForm::from_task(&task, vec![], BTreeMap::new());
        let draft = form.to_draft().unwrap();
        assert_eq!(draft.title, "Stretch");
        assert_eq!(draft.description.as_deref(), Some("10 min"));
        assert_eq!((draft.priority, draft.bothered_level, draft.difficulty_level), (3, 7, 1));
        assert_eq!(draft.tag_color.as_deref(), Some("#1dd1a1"));
        assert_eq!(form.deadline_preview(), "no deadline");
    }
}
