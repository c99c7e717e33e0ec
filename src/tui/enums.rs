//! Enumerations for TUI state management.

/// Which screen the terminal user interface is showing.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum AppState {
    /// Focus cards and the backup queue.
    Board,
    /// Completed tasks, most recent first.
    History,
    AddTask,
    EditTask,
    Help,
    Confirm,
}

/// A destructive action waiting for a yes/no answer.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ConfirmAction {
    /// Delete one task from whichever collection holds it.
    DeleteTask { id: String, title: String },
    /// Drop the whole history.
    ClearHistory { count: usize },
}

impl ConfirmAction {
    /// Question shown in the confirmation dialog.
    pub fn prompt(&self) -> String {
        match self {
            ConfirmAction::DeleteTask { title, .. } => format!("delete '{title}'"),
            ConfirmAction::ClearHistory { count } => format!("clear {count} completed task(s)"),
        }
    }
}
