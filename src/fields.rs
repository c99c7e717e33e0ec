//! Enumerations and field types for ranking and filtering.
//!
//! This module defines the ranking criteria a user can pick, the category
//! filter applied before ranking, and the bounds of the three leveling axes.

use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Lowest value of a leveling field (priority, bothered, difficulty).
pub const LEVEL_MIN: u8 = 0;
/// Highest value of a leveling field.
pub const LEVEL_MAX: u8 = 10;
/// Value used when a leveling field is missing.
pub const LEVEL_DEFAULT: u8 = 5;

/// Textual name of the pass-everything category filter.
pub const ALL_CATEGORIES: &str = "All";

/// The sort key used to pick the two focus tasks.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RankingCriterion {
    /// Most important first.
    #[default]
    Priority,
    /// What bothers you most first.
    Bothered,
    /// Hardest first.
    Difficulty,
    /// Grouped by category name.
    Category,
    /// Newest first. Any unrecognized persisted value decodes to this.
    #[serde(other)]
    #[value(skip)]
    Newest,
}

impl RankingCriterion {
    /// The four criteria offered to the user, in display order.
    pub const SELECTABLE: [RankingCriterion; 4] = [
        RankingCriterion::Priority,
        RankingCriterion::Bothered,
        RankingCriterion::Difficulty,
        RankingCriterion::Category,
    ];

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            RankingCriterion::Priority => "Priority",
            RankingCriterion::Bothered => "Bothered",
            RankingCriterion::Difficulty => "Difficulty",
            RankingCriterion::Category => "Category",
            RankingCriterion::Newest => "Newest",
        }
    }

    /// The next selectable criterion, wrapping around.
    pub fn next(self) -> Self {
        let pos = Self::SELECTABLE.iter().position(|&c| c == self);
        match pos {
            Some(i) => Self::SELECTABLE[(i + 1) % Self::SELECTABLE.len()],
            None => Self::SELECTABLE[0],
        }
    }

    /// Decode a persisted value. Unknown names fall back to `Newest`.
    pub fn from_stored(s: &str) -> Self {
        match s.trim() {
            "PRIORITY" => RankingCriterion::Priority,
            "BOTHERED" => RankingCriterion::Bothered,
            "DIFFICULTY" => RankingCriterion::Difficulty,
            "CATEGORY" => RankingCriterion::Category,
            _ => RankingCriterion::Newest,
        }
    }
}

impl fmt::Display for RankingCriterion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which categories take part in ranking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Only tasks whose category equals this exactly (case-sensitive).
    Only(String),
}

impl CategoryFilter {
    /// Parse a filter argument; `"All"` selects every category.
    pub fn parse(s: &str) -> Self {
        if s == ALL_CATEGORIES {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(s.to_string())
        }
    }

    /// Whether a task in `category` passes the filter.
    pub fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Only(c) => c == category,
        }
    }

    /// Step through `All` followed by each known category, wrapping around.
    pub fn cycle(&self, categories: &[String], forward: bool) -> Self {
        // Position 0 is "All", 1..=n are the categories.
        let len = categories.len() + 1;
        let current = match self {
            CategoryFilter::All => 0,
            CategoryFilter::Only(c) => categories
                .iter()
                .position(|x| x == c)
                .map(|i| i + 1)
                .unwrap_or(0),
        };
        let next = if forward {
            (current + 1) % len
        } else if current == 0 {
            len - 1
        } else {
            current - 1
        };
        if next == 0 {
            CategoryFilter::All
        } else {
            CategoryFilter::Only(categories[next - 1].clone())
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CategoryFilter::All => f.write_str(ALL_CATEGORIES),
            CategoryFilter::Only(c) => f.write_str(c),
        }
    }
}
