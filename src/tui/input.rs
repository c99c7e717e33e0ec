//! Input field handling for the terminal user interface.

/// A single-line text input. `cursor` counts characters, not bytes.
#[derive(Clone, Debug, Default)]
pub struct InputField {
    pub value: String,
    pub cursor: usize,
    pub active: bool,
}

impl InputField {
    /// Create a new empty input field.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an input field with initial text value, cursor at the end.
    pub fn with_value(value: &str) -> Self {
        Self {
            value: value.to_string(),
            cursor: value.chars().count(),
            active: false,
        }
    }

    fn byte_index(&self, cursor: usize) -> usize {
        self.value
            .char_indices()
            .nth(cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.value.len())
    }

    fn len(&self) -> usize {
        self.value.chars().count()
    }

    /// Insert a character at the current cursor position.
    pub fn handle_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.value.insert(at, c);
        self.cursor += 1;
    }

    /// Delete the character before the cursor.
    pub fn handle_backspace(&mut self) {
        if self.cursor > 0 {
            let at = self.byte_index(self.cursor - 1);
            self.value.remove(at);
            self.cursor -= 1;
        }
    }

    /// Delete the character at the cursor position.
    pub fn handle_delete(&mut self) {
        if self.cursor < self.len() {
            let at = self.byte_index(self.cursor);
            self.value.remove(at);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.len() {
            self.cursor += 1;
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.len();
    }

    /// Replace the whole value, cursor at the end.
    pub fn set(&mut self, value: &str) {
        self.value = value.to_string();
        self.cursor = self.len();
    }

    /// Trimmed value, or `None` when blank.
    pub fn non_empty(&self) -> Option<String> {
        let trimmed = self.value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    }
}
