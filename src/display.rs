//! Parsing and formatting helpers shared by the CLI and the TUI.
//!
//! Deadlines are typed by humans ("friday", "in 3d", "2024-06-01 14:00") and
//! shown relative to today ("tomorrow", "2d late").

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::fields::{CategoryFilter, RankingCriterion, LEVEL_MAX};
use crate::rank::Ranked;
use crate::task::Task;

/// Time of day a deadline given as a bare date falls on.
pub const DEFAULT_DEADLINE_TIME: (u32, u32) = (23, 59);

/// Years a deadline may fall in; RFC 3339 only has four-digit years.
const DEADLINE_YEARS: std::ops::RangeInclusive<i32> = 1..=9999;

/// Parse a deadline typed by the user.
///
/// Accepts RFC 3339, `YYYY-MM-DD HH:MM` / `YYYY-MM-DDTHH:MM` in local time,
/// or any date [`parse_due_date`] understands (at 23:59 local time).
pub fn parse_deadline_input(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return local_to_utc(naive);
        }
    }
    let date = parse_due_date(s, Local::now().date_naive())?;
    if !DEADLINE_YEARS.contains(&date.year()) {
        return None;
    }
    let (h, m) = DEFAULT_DEADLINE_TIME;
    local_to_utc(date.and_time(NaiveTime::from_hms_opt(h, m, 0)?))
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse human-readable date input relative to `today`.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "next monday", "this friday", "fri", etc.
/// - "end of week"/"eow", "end of month"/"eom", "weekend"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD"
pub fn parse_due_date(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        "this weekend" | "weekend" => {
            // Coming Saturday
            let days_until_saturday = (6 - today.weekday().num_days_from_monday()) % 7;
            return Some(today + Duration::days(days_until_saturday as i64));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        let (split, _) = rest.char_indices().last()?;
        let (num, unit) = rest.split_at(split);
        let n = num.trim().parse::<i64>().ok()?;
        let offset = match unit {
            "d" => Duration::try_days(n)?,
            "w" => Duration::try_weeks(n)?,
            // Approximate: 30 days per month
            "m" => Duration::try_days(n.checked_mul(30)?)?,
            _ => return None,
        };
        return today.checked_add_signed(offset);
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (day_name, target) in weekdays {
        let days_ahead = (target + 7 - current) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Start and end of the ISO week (Monday to Sunday) containing `today`.
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format a deadline relative to `today` ("today 17:00", "tomorrow", "in 3d", "2d late").
pub fn format_deadline_relative(deadline: Option<DateTime<Utc>>, today: NaiveDate) -> String {
    let Some(deadline) = deadline else {
        return "-".into();
    };
    let local = deadline.with_timezone(&Local);
    let days = (local.date_naive() - today).num_days();
    match days {
        0 => format!("today {}", local.format("%H:%M")),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

/// Full local date and time of a deadline.
pub fn format_deadline(deadline: DateTime<Utc>) -> String {
    deadline.with_timezone(&Local).format("%a %Y-%m-%d %H:%M").to_string()
}

/// Local date and time for a millisecond timestamp.
pub fn format_millis(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M").to_string(),
        None => "unknown".into(),
    }
}

/// A ten-cell bar for a leveling value, e.g. `███████░░░`.
pub fn level_bar(level: u8) -> String {
    let filled = level.min(LEVEL_MAX) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(LEVEL_MAX as usize - filled))
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        let mut out = String::new();
        for (i, ch) in s.chars().enumerate() {
            if i + 1 >= width {
                out.push('…');
                break;
            }
            out.push(ch);
        }
        out
    }
}

/// Print tasks as a table, numbered from `first_rank`.
pub fn print_table(tasks: &[&Task], first_rank: usize) {
    println!(
        "{:<3} {:<9} {:<4} {:<4} {:<4} {:<12} {:<14} {}",
        "#", "ID", "Pri", "Both", "Diff", "Deadline", "Category", "Title"
    );
    let today = Local::now().date_naive();
    for (i, t) in tasks.iter().enumerate() {
        println!(
            "{:<3} {:<9} {:<4} {:<4} {:<4} {:<12} {:<14} {}",
            first_rank + i,
            t.short_id(),
            t.priority,
            t.bothered_level,
            t.difficulty_level,
            format_deadline_relative(t.deadline, today),
            truncate(&t.category, 14),
            t.title
        );
    }
}

/// Print the focus set and the backup queue.
pub fn print_board(ranked: &Ranked<'_>, criterion: RankingCriterion, filter: &CategoryFilter) {
    println!("Ranked by {criterion} · category: {filter}");
    if ranked.is_empty() {
        println!("\nNo tasks found!");
        return;
    }
    let today = Local::now().date_naive();
    for (i, t) in ranked.focus().iter().enumerate() {
        println!();
        println!("FOCUS #{}  {}  [{}]", i + 1, t.title, t.category);
        if let Some(desc) = t.description_text() {
            println!("  {desc}");
        }
        println!(
            "  priority {:>2}  bothered {:>2}  difficulty {:>2}  due {}  ({})",
            t.priority,
            t.bothered_level,
            t.difficulty_level,
            format_deadline_relative(t.deadline, today),
            t.short_id()
        );
    }
    if !ranked.backup().is_empty() {
        println!("\nUp Next ({})", ranked.backup().len());
        print_table(ranked.backup(), ranked.focus().len() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_due_date_keywords() {
        // 2024-05-15 is a Wednesday.
        let today = date(2024, 5, 15);
        assert_eq!(parse_due_date("today", today), Some(today));
        assert_eq!(parse_due_date("Tomorrow", today), Some(date(2024, 5, 16)));
        assert_eq!(parse_due_date("eow", today), Some(date(2024, 5, 19)));
        assert_eq!(parse_due_date("end of month", today), Some(date(2024, 5, 31)));
        assert_eq!(parse_due_date("weekend", today), Some(date(2024, 5, 18)));
        assert_eq!(parse_due_date("in 3d", today), Some(date(2024, 5, 18)));
        assert_eq!(parse_due_date("in 2w", today), Some(date(2024, 5, 29)));
        assert_eq!(parse_due_date("2024-07-01", today), Some(date(2024, 7, 1)));
        assert_eq!(parse_due_date("someday", today), None);
    }

    #[test]
    fn test_parse_due_date_weekdays() {
        let today = date(2024, 5, 15);
        assert_eq!(parse_due_date("friday", today), Some(date(2024, 5, 17)));
        assert_eq!(parse_due_date("wed", today), Some(today));
        assert_eq!(parse_due_date("next wednesday", today), Some(date(2024, 5, 22)));
        assert_eq!(parse_due_date("next mon", today), Some(date(2024, 5, 27)));
        assert_eq!(parse_due_date("this sunday", today), Some(date(2024, 5, 19)));
    }

    #[test]
    fn test_end_of_month_december() {
        assert_eq!(parse_due_date("eom", date(2024, 12, 3)), Some(date(2024, 12, 31)));
    }

    #[test]
    fn test_parse_due_date_offsets_reject_bad_units_and_overflow() {
        let today = date(2024, 5, 15);
        assert_eq!(parse_due_date("in 1m", today), Some(date(2024, 6, 14)));
        assert_eq!(parse_due_date("in 3é", today), None);
        assert_eq!(parse_due_date("in é", today), None);
        assert_eq!(parse_due_date("in 3", today), None);
        assert_eq!(parse_due_date("in 999999999999d", today), None);
        assert_eq!(parse_due_date("in 999999999999w", today), None);
        assert_eq!(parse_due_date("in 9223372036854775807m", today), None);
    }

    #[test]
    fn test_parse_deadline_input_never_panics_on_odd_text() {
        assert_eq!(parse_deadline_input("in é"), None);
        assert_eq!(parse_deadline_input("in 3€"), None);
        assert_eq!(parse_deadline_input("in 999999999999d"), None);
        // Representable as a date, but past the four-digit years RFC 3339 can store.
        assert!(parse_due_date("in 5000000d", date(2024, 5, 15)).is_some());
        assert_eq!(parse_deadline_input("in 5000000d"), None);
    }

    #[test]
    fn test_parse_deadline_rfc3339_and_local() {
        let dt = parse_deadline_input("2024-05-01T12:00:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2024-05-01T12:00:00+00:00");

        let local = parse_deadline_input("2024-05-01 14:30").unwrap().with_timezone(&Local);
        assert_eq!(local.format("%Y-%m-%d %H:%M").to_string(), "2024-05-01 14:30");

        let bare = parse_deadline_input("2024-05-01").unwrap().with_timezone(&Local);
        assert_eq!(bare.format("%H:%M").to_string(), "23:59");
        assert!(parse_deadline_input("whenever").is_none());
    }

    #[test]
    fn test_format_deadline_relative() {
        let today = Local::now().date_naive();
        let at = |d: NaiveDate| local_to_utc(d.and_hms_opt(12, 0, 0).unwrap());
        assert_eq!(format_deadline_relative(None, today), "-");
        assert_eq!(format_deadline_relative(at(today), today), "today 12:00");
        assert_eq!(format_deadline_relative(at(today + Duration::days(1)), today), "tomorrow");
        assert_eq!(format_deadline_relative(at(today + Duration::days(4)), today), "in 4d");
        assert_eq!(format_deadline_relative(at(today - Duration::days(2)), today), "2d late");
    }

    #[test]
    fn test_level_bar() {
        assert_eq!(level_bar(3), "███░░░░░░░");
        assert_eq!(level_bar(0).chars().count(), 10);
        assert_eq!(level_bar(10), "██████████");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }
}
