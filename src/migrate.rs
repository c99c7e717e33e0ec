//! Upgrades persisted task records of any earlier shape to the current `Task`.
//!
//! Older versions of the app stored priority as a "High"/"Medium"/"Low" label
//! and difficulty as an estimate in minutes. Records written by the current
//! version pass through unchanged, so running the migration on its own output
//! is a no-op.

use serde_json::{Map, Number, Value};
use uuid::Uuid;

use crate::error::MigrationError;
use crate::fields::{LEVEL_DEFAULT, LEVEL_MAX, LEVEL_MIN};
use crate::task::Task;

const LEGACY_DIFFICULTY_MINUTES: &str = "difficultyMinutes";

/// Priority for a labeled legacy level.
fn legacy_priority(label: &str) -> u8 {
    match label {
        "High" => 9,
        "Medium" => 5,
        _ => 2,
    }
}

/// Difficulty level for an estimate in minutes: five points per hour, capped.
pub fn difficulty_from_minutes(minutes: f64) -> u8 {
    ((minutes / 60.0) * 5.0)
        .ceil()
        .clamp(LEVEL_MIN as f64, LEVEL_MAX as f64) as u8
}

/// A leveling value from any JSON number, rounded and clamped to the level range.
fn level_from(value: &Value) -> Option<u8> {
    value
        .as_f64()
        .filter(|f| f.is_finite())
        .map(|f| f.round().clamp(LEVEL_MIN as f64, LEVEL_MAX as f64) as u8)
}

fn millis_from(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
}

fn keep_string(record: &mut Map<String, Value>, key: &str) {
    if record.get(key).is_some_and(|v| !v.is_string()) {
        record.remove(key);
    }
}

/// Normalize a raw record into the current shape, still as JSON.
///
/// Fields this module does not know about are left in place.
pub fn migrate_record(raw: Value) -> Result<Value, MigrationError> {
    let Value::Object(mut record) = raw else {
        return Err(MigrationError::NotAnObject);
    };

    let priority = match record.get("priority") {
        Some(Value::String(label)) => legacy_priority(label),
        Some(v) => level_from(v).unwrap_or(LEVEL_DEFAULT),
        None => LEVEL_DEFAULT,
    };

    let mut difficulty = record
        .get("difficultyLevel")
        .and_then(level_from)
        .unwrap_or(LEVEL_DEFAULT);
    if let Some(minutes) = record.remove(LEGACY_DIFFICULTY_MINUTES).as_ref().and_then(Value::as_f64) {
        difficulty = difficulty_from_minutes(minutes);
    }

    let bothered = record
        .get("botheredLevel")
        .and_then(level_from)
        .unwrap_or(LEVEL_DEFAULT);

    record.insert("priority".into(), Value::from(priority));
    record.insert("difficultyLevel".into(), Value::from(difficulty));
    record.insert("botheredLevel".into(), Value::from(bothered));

    let id = match record.get("id") {
        Some(Value::String(s)) if !s.is_empty() => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            let fresh = Uuid::new_v4().to_string();
            tracing::debug!(id = %fresh, "record had no id; assigned a fresh one");
            fresh
        }
    };
    record.insert("id".into(), Value::String(id));

    for key in ["createdAt", "completedAt"] {
        match record.get(key).map(millis_from) {
            Some(Some(ms)) => {
                record.insert(key.into(), Value::Number(Number::from(ms)));
            }
            Some(None) => {
                record.remove(key);
            }
            None => {}
        }
    }

    let unreadable_deadline = record.get("deadline").is_some_and(|d| {
        !d.as_str()
            .is_some_and(|s| chrono::DateTime::parse_from_rfc3339(s).is_ok())
    });
    if unreadable_deadline {
        if let Some(deadline) = record.remove("deadline") {
            tracing::warn!(%deadline, "dropping unreadable deadline");
        }
    }

    for key in ["title", "category", "description", "tagColor"] {
        keep_string(&mut record, key);
    }

    Ok(Value::Object(record))
}

/// Turn one raw record into a fully-conformant task.
pub fn migrate(raw: Value) -> Result<Task, MigrationError> {
    let record = migrate_record(raw)?;
    Ok(serde_json::from_value(record)?)
}

/// Migrate a whole persisted list, skipping records that cannot be used.
pub fn migrate_all(records: Vec<Value>) -> Vec<Task> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, raw)| match migrate(raw) {
            Ok(task) => Some(task),
            Err(e) => {
                tracing::warn!(index, error = %e, "skipping unreadable task record");
                None
            }
        })
        .collect()
}
