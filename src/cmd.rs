//! Command implementations for the CLI interface.
//!
//! Each handler works on an open [`Workspace`] and returns the crate
//! [`Result`]; `main` reports the error and sets the exit status.

use std::io::{self, Write};

use chrono::Local;
use clap::Subcommand;
use clap_complete::{generate, Shell};

use crate::display::{
    format_deadline, format_deadline_relative, format_millis, level_bar, parse_deadline_input, print_board,
    truncate,
};
use crate::error::{Collection, Error, Result};
use crate::fields::{CategoryFilter, RankingCriterion, ALL_CATEGORIES};
use crate::registry::{self, effective_color};
use crate::storage::Storage;
use crate::store::TaskStore;
use crate::task::{Task, TaskDraft, TaskPatch};
use crate::tui::run::run_tui;
use crate::workspace::Workspace;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Launch the interactive UI.
    Ui,

    /// Add a new task.
    Add {
        /// Short title for the task.
        title: String,
        /// Category. Defaults to the last one used.
        #[arg(long, short)]
        category: Option<String>,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// How important it is (0-10, default 5).
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=10))]
        priority: Option<u8>,
        /// How much it bothers you (0-10, default 5).
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=10))]
        bothered: Option<u8>,
        /// How hard it is (0-10, default 5).
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=10))]
        difficulty: Option<u8>,
        /// Tag color as #rrggbb. Defaults to the category's color.
        #[arg(long)]
        color: Option<String>,
        /// Deadline: "today", "friday", "in 3d", YYYY-MM-DD, "YYYY-MM-DD HH:MM".
        #[arg(long)]
        deadline: Option<String>,
    },

    /// Show the two focus tasks and the backup queue.
    List {
        /// Only rank tasks in this category ("All" for every category).
        #[arg(long, short)]
        category: Option<String>,
        /// Rank by this criterion once, without changing the saved choice.
        #[arg(long, value_enum)]
        by: Option<RankingCriterion>,
    },

    /// View a single task by id, id prefix or title.
    View {
        id: String,
    },

    /// Change fields on an active task.
    Edit {
        /// Task id, id prefix or title.
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long, conflicts_with = "clear_desc")]
        desc: Option<String>,
        /// Remove the description.
        #[arg(long)]
        clear_desc: bool,
        #[arg(long, short)]
        category: Option<String>,
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=10))]
        priority: Option<u8>,
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=10))]
        bothered: Option<u8>,
        #[arg(long, short, value_parser = clap::value_parser!(u8).range(0..=10))]
        difficulty: Option<u8>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long, conflicts_with = "clear_deadline")]
        deadline: Option<String>,
        /// Remove the deadline.
        #[arg(long)]
        clear_deadline: bool,
    },

    /// Mark an active task as done.
    Done {
        id: String,
    },

    /// Move a completed task back to the active list.
    Restore {
        id: String,
    },

    /// Delete a task, active or completed.
    Delete {
        id: String,
    },

    /// List completed tasks, most recent first.
    History {
        /// Limit number of rows printed.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Permanently discard all completed tasks.
    ClearHistory {
        /// Do not ask for confirmation.
        #[arg(long, short)]
        yes: bool,
    },

    /// List categories with their colors and task counts.
    Categories,

    /// Show or set the saved ranking criterion.
    Rank {
        #[arg(value_enum)]
        criterion: Option<RankingCriterion>,
    },

    /// Generate shell completion scripts.
    Completions {
        /// Target shell.
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Run a parsed command against the workspace.
pub fn run<S: Storage>(ws: &mut Workspace<S>, command: Commands) -> Result<()> {
    match command {
        Commands::Ui => cmd_ui(ws),
        Commands::Add { title, category, desc, priority, bothered, difficulty, color, deadline } => {
            let draft = add_draft(ws, title, category, desc, priority, bothered, difficulty, color, deadline)?;
            cmd_add(ws, draft)
        }
        Commands::List { category, by } => cmd_list(ws, category, by),
        Commands::View { id } => cmd_view(ws, &id),
        Commands::Edit {
            id, title, desc, clear_desc, category, priority, bothered, difficulty, color, deadline,
            clear_deadline,
        } => {
            let deadline = match (deadline, clear_deadline) {
                (_, true) => Some(None),
                (Some(text), false) => Some(Some(parse_deadline(&text)?)),
                (None, false) => None,
            };
            let patch = TaskPatch {
                title,
                description: if clear_desc { Some(None) } else { desc.map(Some) },
                priority,
                bothered_level: bothered,
                difficulty_level: difficulty,
                category,
                tag_color: color.map(Some),
                deadline,
            };
            cmd_edit(ws, &id, patch)
        }
        Commands::Done { id } => cmd_done(ws, &id),
        Commands::Restore { id } => cmd_restore(ws, &id),
        Commands::Delete { id } => cmd_delete(ws, &id),
        Commands::History { limit } => cmd_history(ws, limit),
        Commands::ClearHistory { yes } => cmd_clear_history(ws, yes),
        Commands::Categories => cmd_categories(ws),
        Commands::Rank { criterion } => cmd_rank(ws, criterion),
        Commands::Completions { shell } => {
            cmd_completions(shell);
            Ok(())
        }
    }
}

/// Launch the terminal user interface.
pub fn cmd_ui<S: Storage>(ws: &mut Workspace<S>) -> Result<()> {
    run_tui(ws)?;
    Ok(())
}

/// Build a creation draft from CLI flags, filling gaps from the form defaults.
#[allow(clippy::too_many_arguments)]
pub fn add_draft<S: Storage>(
    ws: &Workspace<S>,
    title: String,
    category: Option<String>,
    desc: Option<String>,
    priority: Option<u8>,
    bothered: Option<u8>,
    difficulty: Option<u8>,
    color: Option<String>,
    deadline: Option<String>,
) -> Result<TaskDraft> {
    let defaults = ws.new_task_defaults();
    let category = category.unwrap_or(defaults.category);
    let tag_color = color.unwrap_or_else(|| registry::suggest_color(&category, &ws.category_colors()));
    let deadline = deadline.as_deref().map(parse_deadline).transpose()?;
    Ok(TaskDraft {
        title,
        description: desc,
        priority: priority.unwrap_or(defaults.priority),
        bothered_level: bothered.unwrap_or(defaults.bothered_level),
        difficulty_level: difficulty.unwrap_or(defaults.difficulty_level),
        category,
        tag_color: Some(tag_color),
        deadline,
    })
}

fn parse_deadline(text: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    parse_deadline_input(text)
        .ok_or_else(|| Error::validation("deadline", format!("could not understand '{text}'")))
}

/// Add a new task.
pub fn cmd_add<S: Storage>(ws: &mut Workspace<S>, draft: TaskDraft) -> Result<()> {
    let task = ws.create(draft)?;
    println!("Added task {} ({})", task.short_id(), task.title);
    Ok(())
}

/// Print the focus set and backup queue.
pub fn cmd_list<S: Storage>(
    ws: &Workspace<S>,
    category: Option<String>,
    by: Option<RankingCriterion>,
) -> Result<()> {
    let filter = category.as_deref().map(CategoryFilter::parse).unwrap_or_default();
    let criterion = by.unwrap_or(ws.criterion());
    let ranked = ws.rank_by(&filter, criterion);
    print_board(&ranked, criterion, &filter);
    Ok(())
}

/// Find a task in either collection, active first.
pub fn resolve_any<'a>(store: &'a TaskStore, query: &str) -> Result<(&'a Task, Collection)> {
    match store.resolve(query, Collection::Active) {
        Ok(task) => Ok((task, Collection::Active)),
        Err(Error::NotFound { .. }) => store
            .resolve(query, Collection::Completed)
            .map(|task| (task, Collection::Completed))
            .map_err(|e| match e {
                Error::NotFound { .. } => Error::NotFound {
                    id: query.to_string(),
                    collection: Collection::Active,
                },
                other => other,
            }),
        Err(e) => Err(e),
    }
}

/// Print every field of one task.
pub fn cmd_view<S: Storage>(ws: &Workspace<S>, query: &str) -> Result<()> {
    let (task, collection) = resolve_any(ws.store(), query)?;
    let today = Local::now().date_naive();
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Category:     {}", if task.category.is_empty() { "-" } else { task.category.as_str() });
    println!("Color:        {}", effective_color(task));
    println!("Priority:     {:>2} {}", task.priority, level_bar(task.priority));
    println!("Bothered:     {:>2} {}", task.bothered_level, level_bar(task.bothered_level));
    println!("Difficulty:   {:>2} {}", task.difficulty_level, level_bar(task.difficulty_level));
    println!(
        "Deadline:     {}",
        match task.deadline {
            Some(d) => format!("{} ({})", format_deadline(d), format_deadline_relative(Some(d), today)),
            None => "-".into(),
        }
    );
    println!("Created:      {}", format_millis(task.created_at));
    match (collection, task.completed_at) {
        (Collection::Completed, Some(at)) => println!("Completed:    {}", format_millis(at)),
        _ => println!("Status:       active"),
    }
    println!("Description:\n{}\n", task.description_text().unwrap_or("-"));
    Ok(())
}

/// Apply a partial edit to an active task.
pub fn cmd_edit<S: Storage>(ws: &mut Workspace<S>, query: &str, patch: TaskPatch) -> Result<()> {
    if patch.is_empty() {
        println!("Nothing to change.");
        return Ok(());
    }
    let id = ws.store().resolve(query, Collection::Active)?.id.clone();
    let task = ws.update(&id, patch)?;
    println!("Updated task {} ({})", task.short_id(), task.title);
    Ok(())
}

/// Mark an active task as completed.
pub fn cmd_done<S: Storage>(ws: &mut Workspace<S>, query: &str) -> Result<()> {
    let id = ws.store().resolve(query, Collection::Active)?.id.clone();
    let task = ws.complete(&id)?;
    println!("Completed {} ({})", task.short_id(), task.title);
    Ok(())
}

/// Move a completed task back to the active list.
pub fn cmd_restore<S: Storage>(ws: &mut Workspace<S>, query: &str) -> Result<()> {
    let id = ws.store().resolve(query, Collection::Completed)?.id.clone();
    let task = ws.restore(&id)?;
    println!("Restored {} ({})", task.short_id(), task.title);
    Ok(())
}

/// Delete a task from whichever collection holds it.
pub fn cmd_delete<S: Storage>(ws: &mut Workspace<S>, query: &str) -> Result<()> {
    let id = resolve_any(ws.store(), query)?.0.id.clone();
    if let Some(task) = ws.delete(&id)? {
        println!("Deleted {} ({})", task.short_id(), task.title);
    }
    Ok(())
}

/// List completed tasks, newest completion first.
pub fn cmd_history<S: Storage>(ws: &Workspace<S>, limit: Option<usize>) -> Result<()> {
    let history = ws.store().history();
    if history.is_empty() {
        println!("No completed tasks.");
        return Ok(());
    }
    println!("{:<9} {:<17} {:<14} {}", "ID", "Completed", "Category", "Title");
    for t in history.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{:<9} {:<17} {:<14} {}",
            t.short_id(),
            t.completed_at.map(format_millis).unwrap_or_else(|| "-".into()),
            truncate(&t.category, 14),
            t.title
        );
    }
    Ok(())
}

/// Discard the whole history, asking first unless `yes` is set.
pub fn cmd_clear_history<S: Storage>(ws: &mut Workspace<S>, yes: bool) -> Result<()> {
    let count = ws.store().completed().len();
    if count == 0 {
        println!("History is already empty.");
        return Ok(());
    }
    if !yes {
        print!("Permanently delete {count} completed task(s)? (y/N): ");
        io::stdout().flush()?;
        let mut response = String::new();
        io::stdin().read_line(&mut response)?;
        if !matches!(response.trim().to_lowercase().as_str(), "y" | "yes") {
            println!("Cancelled.");
            return Ok(());
        }
    }
    let dropped = ws.clear_history()?;
    println!("Cleared {dropped} completed task(s).");
    Ok(())
}

/// List categories of active tasks with color and count.
pub fn cmd_categories<S: Storage>(ws: &Workspace<S>) -> Result<()> {
    let categories = ws.categories();
    if categories.is_empty() {
        println!("No categories yet.");
        return Ok(());
    }
    let colors = ws.category_colors();
    println!("{:<16} {:<8} {}", "Category", "Color", "Count");
    for category in categories {
        let count = ws.store().active().iter().filter(|t| t.category == category).count();
        let color = colors.get(&category).map(String::as_str).unwrap_or("-");
        println!("{:<16} {:<8} {}", truncate(&category, 16), color, count);
    }
    Ok(())
}

/// Show the saved criterion, or save a new one.
pub fn cmd_rank<S: Storage>(ws: &mut Workspace<S>, criterion: Option<RankingCriterion>) -> Result<()> {
    match criterion {
        Some(criterion) => {
            ws.set_criterion(criterion)?;
            println!("Ranking by {criterion}");
        }
        None => {
            println!("Ranking by {}", ws.criterion());
            let choices: Vec<_> = RankingCriterion::SELECTABLE.iter().map(|c| c.label()).collect();
            println!("Available: {}", choices.join(", "));
            println!("Category filter on list: --category <name> or {ALL_CATEGORIES}");
        }
    }
    Ok(())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use crate::cli::Cli;
    use clap::CommandFactory;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut io::stdout());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn workspace() -> Workspace<MemoryStorage> {
        Workspace::open(MemoryStorage::new())
    }

    fn add(ws: &mut Workspace<MemoryStorage>, title: &str, category: Option<&str>) -> Task {
        let draft = add_draft(ws, title.into(), category.map(String::from), None, None, None, None, None, None)
            .unwrap();
        ws.create(draft).unwrap()
    }

    #[test]
    fn test_add_defaults_to_last_category_and_its_color() {
        let mut ws = workspace();
        let first = add(&mut ws, "Stretch", Some("Health"));
        assert_eq!(first.tag_color.as_deref(), Some(registry::DEFAULT_COLORS[0]));
        let second = add(&mut ws, "Drink water", None);
        assert_eq!(second.category, "Health");
        assert_eq!(second.tag_color, first.tag_color);
        assert_eq!((second.priority, second.bothered_level, second.difficulty_level), (5, 5, 5));
    }

    #[test]
    fn test_add_new_category_gets_unused_color() {
        let mut ws = workspace();
        add(&mut ws, "Stretch", Some("Health"));
        let other = add(&mut ws, "Invoice", Some("Work"));
        assert_eq!(other.tag_color.as_deref(), Some(registry::DEFAULT_COLORS[1]));
    }

    #[test]
    fn test_add_without_any_category_fails_validation() {
        let mut ws = workspace();
        let draft = add_draft(&ws, "Orphan".into(), None, None, None, None, None, None, None).unwrap();
        assert!(matches!(cmd_add(&mut ws, draft), Err(Error::Validation { field: "category", .. })));
    }

    #[test]
    fn test_bad_deadline_is_rejected() {
        let ws = workspace();
        let err = add_draft(&ws, "x".into(), Some("c".into()), None, None, None, None, None, Some("soonish".into()))
            .unwrap_err();
        assert!(matches!(err, Error::Validation { field: "deadline", .. }));
    }

    #[test]
    fn test_add_rejects_color_that_is_not_hex() {
        let mut ws = workspace();
        let command = Commands::Add {
            title: "Paint fence".into(),
            category: Some("Home".into()),
            desc: None,
            priority: None,
            bothered: None,
            difficulty: None,
            color: Some("green".into()),
            deadline: None,
        };
        assert!(matches!(run(&mut ws, command), Err(Error::Validation { field: "tag color", .. })));
        assert!(ws.store().active().is_empty());

        let draft = add_draft(&ws, "Paint fence".into(), Some("Home".into()), None, None, None, None, Some("#00AA00".into()), None)
            .unwrap();
        assert_eq!(ws.create(draft).unwrap().tag_color.as_deref(), Some("#00aa00"));
    }

    #[test]
    fn test_done_restore_delete_by_title() {
        let mut ws = workspace();
        let task = add(&mut ws, "Water plants", Some("Home"));
        cmd_done(&mut ws, "water plants").unwrap();
        assert_eq!(ws.store().completed()[0].id, task.id);
        assert!(matches!(cmd_done(&mut ws, "Water plants"), Err(Error::NotFound { .. })));

        cmd_restore(&mut ws, &task.id[..6]).unwrap();
        assert_eq!(ws.store().active()[0].id, task.id);

        cmd_delete(&mut ws, "Water plants").unwrap();
        assert!(ws.store().active().is_empty());
    }

    #[test]
    fn test_delete_reaches_history() {
        let mut ws = workspace();
        let task = add(&mut ws, "Old", Some("x"));
        ws.complete(&task.id).unwrap();
        cmd_delete(&mut ws, &task.id).unwrap();
        assert!(ws.store().completed().is_empty());
    }

    #[test]
    fn test_resolve_any_reports_unknown() {
        let ws = workspace();
        assert!(matches!(resolve_any(ws.store(), "nope"), Err(Error::NotFound { .. })));
    }

    #[test]
    fn test_edit_applies_patch_and_clears() {
        let mut ws = workspace();
        let task = add(&mut ws, "Plan trip", Some("Fun"));
        let command = Commands::Edit {
            id: task.id.clone(),
            title: Some("Plan summer trip".into()),
            desc: Some("Look at trains".into()),
            clear_desc: false,
            category: None,
            priority: Some(9),
            bothered: None,
            difficulty: None,
            color: None,
            deadline: Some("2030-01-01".into()),
            clear_deadline: false,
        };
        run(&mut ws, command).unwrap();
        let edited = ws.store().find_active(&task.id).unwrap().clone();
        assert_eq!(edited.title, "Plan summer trip");
        assert_eq!(edited.priority, 9);
        assert_eq!(edited.description.as_deref(), Some("Look at trains"));
        assert!(edited.deadline.is_some());

        let clear = Commands::Edit {
            id: task.id.clone(),
            title: None,
            desc: None,
            clear_desc: true,
            category: None,
            priority: None,
            bothered: None,
            difficulty: None,
            color: None,
            deadline: None,
            clear_deadline: true,
        };
        run(&mut ws, clear).unwrap();
        let cleared = ws.store().find_active(&task.id).unwrap();
        assert_eq!(cleared.description, None);
        assert_eq!(cleared.deadline, None);
    }

    #[test]
    fn test_rank_sets_criterion() {
        let mut ws = workspace();
        cmd_rank(&mut ws, Some(RankingCriterion::Difficulty)).unwrap();
        assert_eq!(ws.criterion(), RankingCriterion::Difficulty);
        cmd_rank(&mut ws, None).unwrap();
        assert_eq!(ws.criterion(), RankingCriterion::Difficulty);
    }

    #[test]
    fn test_clear_history_with_yes() {
        let mut ws = workspace();
        let task = add(&mut ws, "Done soon", Some("x"));
        ws.complete(&task.id).unwrap();
        cmd_clear_history(&mut ws, true).unwrap();
        assert!(ws.store().completed().is_empty());
    }

    #[test]
    fn test_listing_commands_succeed() {
        let mut ws = workspace();
        for title in ["a", "b", "c"] {
            add(&mut ws, title, Some("x"));
        }
        cmd_list(&ws, None, None).unwrap();
        cmd_list(&ws, Some("x".into()), Some(RankingCriterion::Category)).unwrap();
        cmd_view(&ws, "b").unwrap();
        cmd_history(&ws, Some(1)).unwrap();
        cmd_categories(&ws).unwrap();
    }
}
