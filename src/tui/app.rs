//! Main application logic for the terminal user interface.
//!
//! This module contains the `App` struct which manages the TUI state,
//! handles user input, renders the interface, and coordinates between
//! the screens (focus board, history, task form, help, confirmations).

use std::io;
use std::time::Duration;

use chrono::{Local, Utc};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Clear, Paragraph, Row, Table, TableState, Wrap},
    Frame, Terminal,
};

use crate::display::{format_deadline_relative, format_millis, level_bar, truncate};
use crate::error::{Error, Result};
use crate::fields::CategoryFilter;
use crate::rank::{rank, FOCUS_SIZE};
use crate::registry::effective_color;
use crate::storage::Storage;
use crate::task::{Task, TaskPatch};
use crate::tui::{
    colors::{focus_tint, parse_hex, tag_color, text_on, DARK_RED, GOLD, INK},
    enums::{AppState, ConfirmAction},
    task_form::{
        TaskForm, BOTHERED_GLOBAL_ORDER, CATEGORY_GLOBAL_ORDER, COLOR_GLOBAL_ORDER, DEADLINE_GLOBAL_ORDER,
        DESCRIPTION_GLOBAL_ORDER, DIFFICULTY_GLOBAL_ORDER, PRIORITY_GLOBAL_ORDER, TITLE_GLOBAL_ORDER,
    },
    utils::centered_rect,
};
use crate::workspace::Workspace;

/// Main application state for the terminal user interface.
///
/// Borrows the workspace for the lifetime of the session; every change goes
/// through it and is persisted immediately.
pub struct App<'a, S: Storage> {
    ws: &'a mut Workspace<S>,
    state: AppState,
    previous_state: AppState,
    filter: CategoryFilter,
    /// Index into the ranked order; 0 and 1 are the focus cards.
    selected: usize,
    backup_state: TableState,
    history_state: TableState,
    task_form: TaskForm,
    editing_id: Option<String>,
    confirm_action: Option<ConfirmAction>,
    status_message: String,
}

impl<'a, S: Storage> App<'a, S> {
    pub fn new(ws: &'a mut Workspace<S>) -> Self {
        let task_form = TaskForm::from_draft(&ws.new_task_defaults(), ws.categories(), ws.category_colors());
        App {
            ws,
            state: AppState::Board,
            previous_state: AppState::Board,
            filter: CategoryFilter::All,
            selected: 0,
            backup_state: TableState::default(),
            history_state: TableState::default(),
            task_form,
            editing_id: None,
            confirm_action: None,
            status_message: String::new(),
        }
    }

    fn set_status_message(&mut self, msg: impl Into<String>) {
        self.status_message = msg.into();
    }

    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Report the outcome of a workspace call. Persistence failures still
    /// count as done, since the change is kept in memory.
    fn report<T>(&mut self, result: Result<T>, done: &str) -> Option<T> {
        match result {
            Ok(value) => {
                self.set_status_message(done);
                Some(value)
            }
            Err(Error::Persistence(e)) => {
                self.set_status_message(format!("{done}, but not saved: {e}"));
                None
            }
            Err(e) => {
                self.set_status_message(format!("Error: {e}"));
                None
            }
        }
    }

    fn ranked_len(&self) -> usize {
        self.ws.rank(&self.filter).len()
    }

    fn selected_task(&self) -> Option<&Task> {
        self.ws.rank(&self.filter).ordered().get(self.selected).copied()
    }

    fn selected_history_task(&self) -> Option<&Task> {
        let index = self.history_state.selected()?;
        self.ws.store().history().get(index).copied()
    }

    /// Keep the board and history selections in range after a change.
    fn clamp_selection(&mut self) {
        let len = self.ranked_len();
        self.selected = self.selected.min(len.saturating_sub(1));

        let history_len = self.ws.store().completed().len();
        match self.history_state.selected() {
            _ if history_len == 0 => self.history_state.select(None),
            Some(i) if i >= history_len => self.history_state.select(Some(history_len - 1)),
            None => self.history_state.select(Some(0)),
            _ => {}
        }
    }

    /// Drop a category filter whose category has no active tasks left.
    fn sync_filter(&mut self) {
        if let CategoryFilter::Only(category) = &self.filter {
            if !self.ws.categories().contains(category) {
                self.filter = CategoryFilter::All;
            }
        }
        self.clamp_selection();
    }

    fn select_task(&mut self, id: &str) {
        if let Some(i) = self.ws.rank(&self.filter).ordered().iter().position(|t| t.id == id) {
            self.selected = i;
        }
    }

    fn open_add_form(&mut self) {
        let defaults = self.ws.new_task_defaults();
        self.task_form = TaskForm::from_draft(&defaults, self.ws.categories(), self.ws.category_colors());
        self.editing_id = None;
        self.state = AppState::AddTask;
    }

    fn open_edit_form(&mut self) {
        let Some(task) = self.selected_task().cloned() else {
            self.set_status_message("No task selected");
            return;
        };
        self.task_form = TaskForm::from_task(&task, self.ws.categories(), self.ws.category_colors());
        self.editing_id = Some(task.id);
        self.state = AppState::EditTask;
    }

    /// Create or update from the form. Validation errors keep the form open.
    fn submit_form(&mut self) {
        let draft = match self.task_form.to_draft() {
            Ok(draft) => draft,
            Err(e) => {
                self.set_status_message(format!("Error: {e}"));
                return;
            }
        };
        let (result, done) = match self.editing_id.clone() {
            Some(id) => (self.ws.update(&id, TaskPatch::replace_with(draft)), "Task updated"),
            None => (self.ws.create(draft), "Task created"),
        };
        if matches!(result, Err(Error::Validation { .. }) | Err(Error::NotFound { .. })) {
            self.report(result, done);
            return;
        }
        let creating = self.editing_id.is_none();
        let task = self.report(result, done);
        self.state = AppState::Board;
        let outside_filter = match (&task, &self.filter) {
            (Some(task), CategoryFilter::Only(category)) => *category != task.category,
            _ => false,
        };
        if creating && outside_filter {
            self.filter = CategoryFilter::All;
        }
        self.sync_filter();
        if let Some(task) = task {
            self.select_task(&task.id);
        }
    }

    fn complete_selected(&mut self) {
        let Some(id) = self.selected_task().map(|t| t.id.clone()) else {
            return;
        };
        let result = self.ws.complete(&id);
        self.report(result, "Task completed");
        self.sync_filter();
    }

    fn restore_selected(&mut self) {
        let Some(id) = self.selected_history_task().map(|t| t.id.clone()) else {
            return;
        };
        let result = self.ws.restore(&id);
        self.report(result, "Task restored");
        self.sync_filter();
    }

    fn confirm(&mut self, action: ConfirmAction) {
        self.confirm_action = Some(action);
        self.previous_state = self.state;
        self.state = AppState::Confirm;
    }

    fn run_confirmed(&mut self, action: ConfirmAction) {
        match action {
            ConfirmAction::DeleteTask { id, .. } => {
                let result = self.ws.delete(&id);
                self.report(result, "Task deleted");
            }
            ConfirmAction::ClearHistory { .. } => {
                let result = self.ws.clear_history();
                self.report(result, "History cleared");
            }
        }
        self.sync_filter();
    }

    fn cycle_ranking(&mut self) {
        let next = self.ws.criterion().next();
        let result = self.ws.set_criterion(next);
        self.report(result, &format!("Ranking by {next}"));
        self.selected = 0;
    }

    fn cycle_filter(&mut self, forward: bool) {
        self.filter = self.filter.cycle(&self.ws.categories(), forward);
        self.selected = 0;
        self.set_status_message(format!("Category: {}", self.filter));
    }

    fn show_help(&mut self) {
        self.previous_state = self.state;
        self.state = AppState::Help;
    }

    /// Handle keyboard input on the focus board. Returns true to quit.
    fn handle_board_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Char('q') | KeyCode::Esc => return Ok(true),
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < self.ranked_len() {
                    self.selected += 1;
                }
            }
            KeyCode::Char('a') => self.open_add_form(),
            KeyCode::Char('e') | KeyCode::Enter => self.open_edit_form(),
            KeyCode::Char('c') | KeyCode::Char(' ') => self.complete_selected(),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(task) = self.selected_task() {
                    let action = ConfirmAction::DeleteTask {
                        id: task.id.clone(),
                        title: task.title.clone(),
                    };
                    self.confirm(action);
                }
            }
            KeyCode::Char('r') => self.cycle_ranking(),
            KeyCode::Tab | KeyCode::Right | KeyCode::Char('f') => self.cycle_filter(true),
            KeyCode::BackTab | KeyCode::Left => self.cycle_filter(false),
            KeyCode::Char('t') => {
                self.state = AppState::History;
                self.clamp_selection();
            }
            KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::F(1) => self.show_help(),
            _ => {}
        }
        Ok(false)
    }

    /// Handle keyboard input on the history screen.
    fn handle_history_input(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        let len = self.ws.store().completed().len();
        match key {
            KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            KeyCode::Esc | KeyCode::Char('t') | KeyCode::Char('q') => self.state = AppState::Board,
            KeyCode::Up | KeyCode::Char('k') => {
                if let Some(i) = self.history_state.selected() {
                    self.history_state.select(Some(i.saturating_sub(1)));
                }
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if let Some(i) = self.history_state.selected() {
                    if i + 1 < len {
                        self.history_state.select(Some(i + 1));
                    }
                }
            }
            KeyCode::Char('r') | KeyCode::Enter => self.restore_selected(),
            KeyCode::Char('d') | KeyCode::Delete => {
                if let Some(task) = self.selected_history_task() {
                    let action = ConfirmAction::DeleteTask {
                        id: task.id.clone(),
                        title: task.title.clone(),
                    };
                    self.confirm(action);
                }
            }
            KeyCode::Char('X') if len > 0 => self.confirm(ConfirmAction::ClearHistory { count: len }),
            KeyCode::Char('h') | KeyCode::Char('?') | KeyCode::F(1) => self.show_help(),
            _ => {}
        }
        Ok(false)
    }

    /// Handle keyboard input in the add/edit form.
    fn handle_form_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Esc => {
                self.state = AppState::Board;
                self.set_status_message("Cancelled");
            }
            KeyCode::Tab | KeyCode::Down => self.task_form.next_field(),
            KeyCode::BackTab | KeyCode::Up => self.task_form.prev_field(),
            KeyCode::Left => self.task_form.handle_left_right(false),
            KeyCode::Right => self.task_form.handle_left_right(true),
            KeyCode::Backspace => self.task_form.handle_backspace(),
            KeyCode::Delete => self.task_form.handle_delete(),
            KeyCode::Enter => self.submit_form(),
            KeyCode::Char(c) => self.task_form.handle_char(c),
            _ => {}
        }
        Ok(false)
    }

    fn handle_confirm_input(&mut self, key: KeyCode, _modifiers: KeyModifiers) -> io::Result<bool> {
        match key {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                if let Some(action) = self.confirm_action.take() {
                    self.run_confirmed(action);
                }
                self.state = self.previous_state;
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                self.confirm_action = None;
                self.state = self.previous_state;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_help_input(&mut self, _key: KeyCode, _modifiers: KeyModifiers) -> io::Result<bool> {
        self.state = self.previous_state;
        Ok(false)
    }

    /// Dispatch a key press to the current screen. Returns true to quit.
    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) -> io::Result<bool> {
        self.clear_status_message();
        match self.state {
            AppState::Board => self.handle_board_input(key, modifiers),
            AppState::History => self.handle_history_input(key, modifiers),
            AppState::AddTask | AppState::EditTask => self.handle_form_input(key, modifiers),
            AppState::Help => self.handle_help_input(key, modifiers),
            AppState::Confirm => self.handle_confirm_input(key, modifiers),
        }
    }

    /// Poll for and handle keyboard events.
    ///
    /// Returns true if the application should quit.
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    return self.handle_key(key.code, key.modifiers);
                }
            }
        }
        Ok(false)
    }

    fn render_header(&mut self, f: &mut Frame, area: Rect) {
        let header = Line::from(vec![
            Span::styled("FOCUSTWO", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                format!(
                    "Ranking: {}  Category: {}  Active: {}  Done: {}",
                    self.ws.criterion(),
                    self.filter,
                    self.ws.store().active().len(),
                    self.ws.store().completed().len()
                ),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ]);
        let block = Paragraph::new(header)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(block, area);
    }

    fn render_focus_card(f: &mut Frame, area: Rect, slot: usize, task: Option<&Task>, selected: bool) {
        let title = format!(" FOCUS #{} ", slot + 1);
        let Some(task) = task else {
            let empty = Paragraph::new("Nothing here. Press 'a' to add a task.")
                .block(Block::default().borders(Borders::ALL).title(title))
                .style(Style::default().fg(Color::DarkGray))
                .alignment(Alignment::Center);
            f.render_widget(empty, area);
            return;
        };

        let bg = focus_tint(task.priority);
        let fg = text_on(bg);
        let badge_bg = tag_color(effective_color(task));
        let overdue = task.deadline.is_some_and(|d| d < Utc::now());
        let today = Local::now().date_naive();

        let mut lines = vec![
            Line::from(vec![
                Span::styled(
                    format!(" {} ", task.category),
                    Style::default().bg(badge_bg).fg(text_on(badge_bg)).add_modifier(Modifier::BOLD),
                ),
                Span::raw(" "),
                Span::styled(task.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
            ]),
            Line::from(""),
        ];
        if let Some(desc) = task.description_text() {
            lines.push(Line::from(truncate(desc, area.width.saturating_sub(4) as usize)));
        }
        for (label, level) in [
            ("Priority  ", task.priority),
            ("Bothered  ", task.bothered_level),
            ("Difficulty", task.difficulty_level),
        ] {
            lines.push(Line::from(format!("{label} {level:>2} {}", level_bar(level))));
        }
        let deadline_style = if overdue {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        lines.push(Line::from(vec![
            Span::raw("Deadline   "),
            Span::styled(format_deadline_relative(task.deadline, today), deadline_style),
        ]));

        let mut block = Block::default().borders(Borders::ALL).title(title);
        if selected {
            block = block
                .border_type(BorderType::Thick)
                .title_style(Style::default().add_modifier(Modifier::BOLD | Modifier::REVERSED));
        }
        let card = Paragraph::new(lines)
            .block(block)
            .style(Style::default().bg(bg).fg(fg))
            .wrap(Wrap { trim: true });
        f.render_widget(card, area);
    }

    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let ranked = rank(self.ws.store().active(), &self.filter, self.ws.criterion());
        if ranked.is_empty() {
            let text = match &self.filter {
                CategoryFilter::All => "No tasks found! Press 'a' to add one.".to_string(),
                CategoryFilter::Only(c) => format!("No tasks in {c}. Press Tab to change category."),
            };
            let empty = Paragraph::new(text)
                .block(Block::default().borders(Borders::ALL))
                .alignment(Alignment::Center);
            f.render_widget(empty, area);
            return;
        }

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(10), Constraint::Min(0)])
            .split(area);
        let cards = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[0]);
        for slot in 0..FOCUS_SIZE {
            let task = ranked.focus().get(slot).copied();
            Self::render_focus_card(f, cards[slot], slot, task, self.selected == slot);
        }

        let today = Local::now().date_naive();
        let header = Row::new(["#", "Title", "Category", "Pri", "Both", "Diff", "Deadline"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(GOLD).fg(INK));
        let rows: Vec<Row> = ranked
            .backup()
            .iter()
            .enumerate()
            .map(|(i, t)| {
                let color = parse_hex(effective_color(t)).unwrap_or(Color::White);
                Row::new(vec![
                    Cell::from((FOCUS_SIZE + i + 1).to_string()),
                    Cell::from(t.title.clone()),
                    Cell::from(Span::styled(t.category.clone(), Style::default().fg(color))),
                    Cell::from(t.priority.to_string()),
                    Cell::from(t.bothered_level.to_string()),
                    Cell::from(t.difficulty_level.to_string()),
                    Cell::from(format_deadline_relative(t.deadline, today)),
                ])
            })
            .collect();
        let backup_len = ranked.backup().len();
        let widths = [
            Constraint::Length(4),
            Constraint::Min(20),
            Constraint::Length(14),
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Length(5),
            Constraint::Length(12),
        ];
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(format!("Up Next ({backup_len})")))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        self.backup_state
            .select(self.selected.checked_sub(FOCUS_SIZE).filter(|&i| i < backup_len));
        f.render_stateful_widget(table, chunks[1], &mut self.backup_state);
    }

    fn render_history(&mut self, f: &mut Frame, area: Rect) {
        let history = self.ws.store().history();
        let header = Row::new(["Completed", "Title", "Category", "Pri"].map(|h| {
            Cell::from(h).style(Style::default().add_modifier(Modifier::BOLD))
        }))
        .style(Style::default().bg(GOLD).fg(INK));
        let rows: Vec<Row> = history
            .iter()
            .map(|t| {
                let color = parse_hex(effective_color(t)).unwrap_or(Color::White);
                Row::new(vec![
                    Cell::from(t.completed_at.map(format_millis).unwrap_or_default()),
                    Cell::from(t.title.clone()),
                    Cell::from(Span::styled(t.category.clone(), Style::default().fg(color))),
                    Cell::from(t.priority.to_string()),
                ])
                .style(Style::default().fg(Color::Gray))
            })
            .collect();
        let widths = [
            Constraint::Length(17),
            Constraint::Min(20),
            Constraint::Length(14),
            Constraint::Length(4),
        ];
        let title = if history.is_empty() {
            "History (empty)".to_string()
        } else {
            format!("History ({}) - r restore, d delete, X clear all", history.len())
        };
        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title(title))
            .row_highlight_style(Style::default().bg(Color::Gray).fg(Color::Black))
            .highlight_symbol(">> ");
        f.render_stateful_widget(table, area, &mut self.history_state);
    }

    fn field_style(&self, order: usize) -> Style {
        if self.task_form.current_field == order {
            Style::default().fg(GOLD)
        } else {
            Style::default()
        }
    }

    fn render_task_form(&mut self, f: &mut Frame, area: Rect, is_edit: bool) {
        let outer = Block::default()
            .borders(Borders::ALL)
            .title(if is_edit { "Edit Task" } else { "New Task" });
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(inner);
        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title
                Constraint::Length(3), // Description
                Constraint::Length(3), // Category
                Constraint::Length(3), // Color
                Constraint::Length(4), // Deadline + preview
                Constraint::Min(0),
            ])
            .split(columns[0]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Priority
                Constraint::Length(3), // Bothered
                Constraint::Length(3), // Difficulty
                Constraint::Min(0),    // Instructions
            ])
            .split(columns[1]);

        let text_inputs = [
            (TITLE_GLOBAL_ORDER, "Title *", left[0]),
            (DESCRIPTION_GLOBAL_ORDER, "Description", left[1]),
            (CATEGORY_GLOBAL_ORDER, "Category * (</> known)", left[2]),
        ];
        for (order, label, rect) in text_inputs {
            let value = match order {
                TITLE_GLOBAL_ORDER => &self.task_form.title.value,
                DESCRIPTION_GLOBAL_ORDER => &self.task_form.description.value,
                _ => &self.task_form.category.value,
            };
            let input = Paragraph::new(value.as_str()).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(label)
                    .border_style(self.field_style(order)),
            );
            f.render_widget(input, rect);
        }

        let swatch = tag_color(&self.task_form.tag_color);
        let color_line = Line::from(vec![
            Span::raw("< "),
            Span::styled("      ", Style::default().bg(swatch)),
            Span::raw(format!(" {} >", self.task_form.tag_color)),
        ]);
        let color = Paragraph::new(color_line).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Tag Color")
                .border_style(self.field_style(COLOR_GLOBAL_ORDER)),
        );
        f.render_widget(color, left[3]);

        let deadline = Paragraph::new(vec![
            Line::from(self.task_form.deadline.value.as_str()),
            Line::from(Span::styled(
                self.task_form.deadline_preview(),
                Style::default().fg(Color::DarkGray),
            )),
        ])
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Deadline (today, fri, in 3d, YYYY-MM-DD [HH:MM])")
                .border_style(self.field_style(DEADLINE_GLOBAL_ORDER)),
        );
        f.render_widget(deadline, left[4]);

        let sliders = [
            (PRIORITY_GLOBAL_ORDER, "Priority", self.task_form.priority, right[0]),
            (BOTHERED_GLOBAL_ORDER, "Bothered", self.task_form.bothered_level, right[1]),
            (DIFFICULTY_GLOBAL_ORDER, "Difficulty", self.task_form.difficulty_level, right[2]),
        ];
        for (order, label, level, rect) in sliders {
            let slider = Paragraph::new(format!("< {level:>2} {} >", level_bar(level))).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(label)
                    .border_style(self.field_style(order)),
            );
            f.render_widget(slider, rect);
        }

        let help = Paragraph::new(vec![
            Line::from("Tab/Up/Down  move between fields"),
            Line::from("Left/Right   change selectors"),
            Line::from("Enter        save"),
            Line::from("Esc          cancel"),
        ])
        .block(Block::default().borders(Borders::ALL).title("Keys"))
        .wrap(Wrap { trim: true });
        f.render_widget(help, right[3]);

        let cursor_at = match self.task_form.current_field {
            TITLE_GLOBAL_ORDER => Some((left[0], self.task_form.title.cursor)),
            DESCRIPTION_GLOBAL_ORDER => Some((left[1], self.task_form.description.cursor)),
            CATEGORY_GLOBAL_ORDER => Some((left[2], self.task_form.category.cursor)),
            DEADLINE_GLOBAL_ORDER => Some((left[4], self.task_form.deadline.cursor)),
            _ => None,
        };
        if let Some((rect, cursor)) = cursor_at {
            let max_x = rect.width.saturating_sub(2);
            f.set_cursor_position((rect.x + 1 + (cursor as u16).min(max_x), rect.y + 1));
        }
    }

    fn render_help(&mut self, f: &mut Frame, area: Rect) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let help_text = vec![
            Line::from(Span::styled("FocusTwo Help", bold)),
            Line::from(""),
            Line::from(Span::styled("Board:", bold)),
            Line::from("  Up/k, Down/j    Select task"),
            Line::from("  a               Add task"),
            Line::from("  e/Enter         Edit selected task"),
            Line::from("  c/Space         Complete selected task"),
            Line::from("  d/Del           Delete selected task"),
            Line::from("  r               Cycle ranking (Priority, Bothered, Difficulty, Category)"),
            Line::from("  Tab/Right, Shift+Tab/Left   Cycle category filter"),
            Line::from("  t               Show history"),
            Line::from("  h/?/F1          Show this help"),
            Line::from("  q/Esc/Ctrl+C    Quit"),
            Line::from(""),
            Line::from(Span::styled("History:", bold)),
            Line::from("  r/Enter         Restore task"),
            Line::from("  d/Del           Delete task"),
            Line::from("  X               Clear history"),
            Line::from("  t/Esc           Back to board"),
            Line::from(""),
            Line::from(Span::styled("Form:", bold)),
            Line::from("  Tab/Up/Down     Move between fields"),
            Line::from("  Left/Right      Cycle category, color, levels"),
            Line::from("  Enter           Save"),
            Line::from("  Esc             Cancel"),
        ];
        let paragraph = Paragraph::new(help_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Help - Press any key to return"),
            )
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_confirm(&mut self, f: &mut Frame, area: Rect) {
        let block = Block::default()
            .title("Confirm Action")
            .borders(Borders::ALL)
            .style(Style::default().bg(DARK_RED));

        let area = centered_rect(50, 30, area);
        f.render_widget(Clear, area);

        let prompt = self.confirm_action.as_ref().map(ConfirmAction::prompt).unwrap_or_default();
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "Are you sure you want to:",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(prompt),
            Line::from(""),
            Line::from("This action cannot be undone."),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];
        let paragraph = Paragraph::new(text)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
        f.render_widget(paragraph, area);
    }

    fn render_status_bar(&mut self, f: &mut Frame, area: Rect) {
        let status_text = if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            match self.state {
                AppState::Board => "a add  e edit  c complete  d delete  r ranking  Tab category  t history  h help  q quit".into(),
                AppState::History => "r restore  d delete  X clear  t back".into(),
                AppState::AddTask => "Add New Task".into(),
                AppState::EditTask => "Edit Task".into(),
                AppState::Help => "Help".into(),
                AppState::Confirm => "Confirm Action".into(),
            }
        };
        let status = Paragraph::new(status_text)
            .style(Style::default().bg(GOLD).fg(INK))
            .alignment(Alignment::Left);
        f.render_widget(status, area);
    }

    /// Main render function that dispatches to the current screen.
    pub fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(0), Constraint::Length(1)])
            .split(f.area());

        self.render_header(f, chunks[0]);
        match self.state {
            AppState::Board => self.render_board(f, chunks[1]),
            AppState::History => self.render_history(f, chunks[1]),
            AppState::AddTask => self.render_task_form(f, chunks[1], false),
            AppState::EditTask => self.render_task_form(f, chunks[1], true),
            AppState::Help => self.render_help(f, chunks[1]),
            AppState::Confirm => {
                match self.previous_state {
                    AppState::History => self.render_history(f, chunks[1]),
                    _ => self.render_board(f, chunks[1]),
                }
                self.render_confirm(f, chunks[1]);
            }
        }
        self.render_status_bar(f, chunks[2]);
    }

    /// Main event loop for the TUI application.
    ///
    /// Handles rendering and input processing until the user exits.
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::RankingCriterion;
    use crate::storage::MemoryStorage;
    use crate::task::TaskDraft;
    use ratatui::backend::TestBackend;

    fn workspace_with(tasks: &[(&str, &str, u8)]) -> Workspace<MemoryStorage> {
        let mut ws = Workspace::open(MemoryStorage::new());
        for &(title, category, priority) in tasks {
            ws.create(TaskDraft { priority, ..TaskDraft::new(title, category) }).unwrap();
        }
        ws
    }

    fn press<S: Storage>(app: &mut App<'_, S>, key: KeyCode) -> bool {
        app.handle_key(key, KeyModifiers::NONE).unwrap()
    }

    fn type_text<S: Storage>(app: &mut App<'_, S>, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    fn screen<S: Storage>(app: &mut App<'_, S>) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 40)).unwrap();
        terminal.draw(|f| app.render(f)).unwrap();
        terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn test_add_task_through_form() {
        let mut ws = workspace_with(&[]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Char('a'));
        assert_eq!(app.state, AppState::AddTask);
        type_text(&mut app, "Write report");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "Work");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.state, AppState::Board);
        let active = app.ws.store().active();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].title, "Write report");
        assert_eq!(active[0].category, "Work");
        assert_eq!(app.ws.store().last_used_category(), "Work");
    }

    #[test]
    fn test_form_requires_category() {
        let mut ws = workspace_with(&[]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "No category");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::AddTask);
        assert!(app.status_message.contains("category"));
        assert!(app.ws.store().active().is_empty());
    }

    #[test]
    fn test_edit_selected_task() {
        let mut ws = workspace_with(&[("Old title", "Home", 5)]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::EditTask);
        type_text(&mut app, "!");
        for _ in 0..5 {
            press(&mut app, KeyCode::Down);
        }
        assert_eq!(app.task_form.current_field, PRIORITY_GLOBAL_ORDER);
        press(&mut app, KeyCode::Right);
        press(&mut app, KeyCode::Enter);
        let task = &app.ws.store().active()[0];
        assert_eq!(task.title, "Old title!");
        assert_eq!(task.priority, 6);
    }

    #[test]
    fn test_complete_second_focus_task() {
        let mut ws = workspace_with(&[("low", "x", 2), ("high", "x", 9), ("mid", "x", 5)]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Char('c'));
        let active: Vec<_> = app.ws.store().active().iter().map(|t| t.title.as_str()).collect();
        assert_eq!(active, ["low", "high"]);
        assert_eq!(app.ws.store().completed()[0].title, "mid");
    }

    #[test]
    fn test_delete_needs_confirmation() {
        let mut ws = workspace_with(&[("keep me", "x", 5)]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.state, AppState::Confirm);
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::Board);
        assert_eq!(app.ws.store().active().len(), 1);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        assert!(app.ws.store().active().is_empty());
    }

    #[test]
    fn test_cycle_ranking_persists() {
        let mut ws = workspace_with(&[]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.ws.criterion(), RankingCriterion::Bothered);
        drop(app);
        assert_eq!(ws.storage().get(crate::storage::Slot::Ranking), Some("\"BOTHERED\""));
    }

    #[test]
    fn test_category_filter_cycles_and_resets() {
        let mut ws = workspace_with(&[("a", "Work", 5), ("b", "Home", 5)]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.filter, CategoryFilter::Only("Home".into()));
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.filter, CategoryFilter::Only("Work".into()));
        press(&mut app, KeyCode::BackTab);
        assert_eq!(app.filter, CategoryFilter::Only("Home".into()));

        // Completing the only Home task drops the filter.
        press(&mut app, KeyCode::Char('c'));
        assert_eq!(app.filter, CategoryFilter::All);
    }

    #[test]
    fn test_adding_task_outside_filter_shows_all() {
        let mut ws = workspace_with(&[("a", "Work", 5), ("b", "Home", 5)]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Tab);
        assert_eq!(app.filter, CategoryFilter::Only("Home".into()));

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "New work item");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        for _ in 0..10 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Work");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.state, AppState::Board);
        assert_eq!(app.filter, CategoryFilter::All);
        assert_eq!(app.selected_task().map(|t| t.title.as_str()), Some("New work item"));
    }

    #[test]
    fn test_adding_task_inside_filter_keeps_it() {
        let mut ws = workspace_with(&[("a", "Work", 5), ("b", "Home", 5)]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Tab);

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Water plants");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        for _ in 0..10 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "Home");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.filter, CategoryFilter::Only("Home".into()));
        assert_eq!(app.selected_task().map(|t| t.title.as_str()), Some("Water plants"));
    }

    #[test]
    fn test_odd_deadline_text_renders_as_not_understood() {
        let mut ws = workspace_with(&[]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Char('a'));
        for _ in 0..4 {
            press(&mut app, KeyCode::Tab);
        }
        type_text(&mut app, "in é");
        assert!(screen(&mut app).contains("not understood"));
        for _ in 0..5 {
            press(&mut app, KeyCode::Backspace);
        }
        type_text(&mut app, "in 999999999999d");
        assert!(screen(&mut app).contains("not understood"));
    }

    #[test]
    fn test_history_restore_and_clear() {
        let mut ws = workspace_with(&[("one", "x", 5), ("two", "x", 5)]);
        let ids: Vec<String> = ws.store().active().iter().map(|t| t.id.clone()).collect();
        for id in &ids {
            ws.complete(id).unwrap();
        }
        let mut app = App::new(&mut ws);

        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.state, AppState::History);
        press(&mut app, KeyCode::Char('r'));
        assert_eq!(app.ws.store().active().len(), 1);
        assert_eq!(app.ws.store().completed().len(), 1);

        press(&mut app, KeyCode::Char('X'));
        assert_eq!(app.state, AppState::Confirm);
        press(&mut app, KeyCode::Char('y'));
        assert_eq!(app.state, AppState::History);
        assert!(app.ws.store().completed().is_empty());
        assert_eq!(app.history_state.selected(), None);
    }

    #[test]
    fn test_quit_keys() {
        let mut ws = workspace_with(&[]);
        let mut app = App::new(&mut ws);
        assert!(press(&mut app, KeyCode::Char('q')));
        assert!(app.handle_key(KeyCode::Char('c'), KeyModifiers::CONTROL).unwrap());
    }

    #[test]
    fn test_help_returns_to_previous_screen() {
        let mut ws = workspace_with(&[]);
        let mut app = App::new(&mut ws);
        press(&mut app, KeyCode::Char('t'));
        press(&mut app, KeyCode::Char('h'));
        assert_eq!(app.state, AppState::Help);
        press(&mut app, KeyCode::Char('z'));
        assert_eq!(app.state, AppState::History);
    }

    #[test]
    fn test_render_board_shows_focus_and_backup() {
        let mut ws = workspace_with(&[("Alpha", "x", 9), ("Bravo", "x", 7), ("Charlie", "x", 1)]);
        let mut app = App::new(&mut ws);
        let text = screen(&mut app);
        assert!(text.contains("FOCUS #1"));
        assert!(text.contains("FOCUS #2"));
        assert!(text.contains("Alpha"));
        assert!(text.contains("Up Next (1)"));
        assert!(text.contains("Charlie"));
    }

    #[test]
    fn test_render_every_screen() {
        let mut ws = workspace_with(&[("Alpha", "x", 9)]);
        let mut app = App::new(&mut ws);
        assert!(screen(&mut app).contains("Alpha"));
        press(&mut app, KeyCode::Char('a'));
        assert!(screen(&mut app).contains("New Task"));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('t'));
        assert!(screen(&mut app).contains("History (empty)"));
        press(&mut app, KeyCode::Char('h'));
        assert!(screen(&mut app).contains("FocusTwo Help"));
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Esc);
        press(&mut app, KeyCode::Char('d'));
        assert!(screen(&mut app).contains("Confirm Action"));
    }

    #[test]
    fn test_render_empty_board() {
        let mut ws = workspace_with(&[]);
        let mut app = App::new(&mut ws);
        assert!(screen(&mut app).contains("No tasks found!"));
    }
}
