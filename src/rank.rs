//! The ranking engine: filter, sort and split active tasks into the two focus
//! items and the backup queue.
//!
//! Everything here is a pure function of its inputs. The tasks are borrowed,
//! never cloned or mutated, and the sort is stable, so the same input always
//! yields the same order.

use std::cmp::Ordering;

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::fields::{CategoryFilter, RankingCriterion};
use crate::task::Task;

/// How many tasks make up the focus set.
pub const FOCUS_SIZE: usize = 2;

/// Ranked view over a task slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ranked<'a> {
    ordered: Vec<&'a Task>,
}

impl<'a> Ranked<'a> {
    /// Every task that passed the filter, best first.
    pub fn ordered(&self) -> &[&'a Task] {
        &self.ordered
    }

    /// Focus #1 and Focus #2, in that order (fewer if there are fewer tasks).
    pub fn focus(&self) -> &[&'a Task] {
        &self.ordered[..self.split()]
    }

    /// Everything after the focus set, in ranked order.
    pub fn backup(&self) -> &[&'a Task] {
        &self.ordered[self.split()..]
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    fn split(&self) -> usize {
        self.ordered.len().min(FOCUS_SIZE)
    }
}

/// Rank the active tasks under `filter` and `criterion`.
pub fn rank<'a>(tasks: &'a [Task], filter: &CategoryFilter, criterion: RankingCriterion) -> Ranked<'a> {
    let mut ordered: Vec<&Task> = tasks.iter().filter(|t| filter.matches(&t.category)).collect();
    ordered.sort_by(|a, b| compare(a, b, criterion));
    Ranked { ordered }
}

/// Order two tasks under `criterion`; `Less` means `a` ranks higher.
pub fn compare(a: &Task, b: &Task, criterion: RankingCriterion) -> Ordering {
    match criterion {
        RankingCriterion::Priority => b.priority.cmp(&a.priority).then(b.created_at.cmp(&a.created_at)),
        RankingCriterion::Bothered => b
            .bothered_level
            .cmp(&a.bothered_level)
            .then(b.priority.cmp(&a.priority)),
        RankingCriterion::Difficulty => b
            .difficulty_level
            .cmp(&a.difficulty_level)
            .then(b.priority.cmp(&a.priority)),
        RankingCriterion::Category => collate(&a.category, &b.category).then(b.priority.cmp(&a.priority)),
        RankingCriterion::Newest => b.created_at.cmp(&a.created_at),
    }
}

/// Natural-language ordering for category names.
///
/// Letters compare by their base form first, ignoring accents and case, so
/// "École" sorts with the e's. Ties are broken by accents (unaccented first),
/// then case (lowercase first), then code point so the result is a total
/// order.
pub fn collate(a: &str, b: &str) -> Ordering {
    let base = |s: &str| {
        s.nfd()
            .filter(|c| !is_combining_mark(*c))
            .flat_map(char::to_lowercase)
            .collect::<Vec<_>>()
    };
    let accented = |s: &str| s.nfd().flat_map(char::to_lowercase).collect::<Vec<_>>();
    base(a)
        .cmp(&base(b))
        .then_with(|| accented(a).cmp(&accented(b)))
        .then_with(|| a.chars().map(char::is_uppercase).cmp(b.chars().map(char::is_uppercase)))
        .then_with(|| a.cmp(b))
}
