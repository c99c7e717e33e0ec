//! Error types for the focus engine.
//!
//! Validation and not-found errors are raised before any mutation, so a failed
//! store operation never leaves partial state behind. Persistence errors are
//! raised after the in-memory mutation has been applied and never undo it.

use std::fmt;
use std::path::PathBuf;

use crate::storage::Slot;

/// Which of the two task collections an operation looked in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Active,
    Completed,
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Collection::Active => f.write_str("active tasks"),
            Collection::Completed => f.write_str("history"),
        }
    }
}

/// Top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required field was empty or a value was out of range.
    #[error("invalid {field}: {reason}")]
    Validation {
        /// Name of the offending field.
        field: &'static str,
        /// What is wrong with it.
        reason: String,
    },

    /// No task with this id exists in the expected collection.
    #[error("task {id} not found in {collection}")]
    NotFound {
        /// The id that was looked up.
        id: String,
        /// Where it was looked up.
        collection: Collection,
    },

    /// A task query matched more than one task.
    #[error("'{query}' matches {} tasks: {}. Use a longer id instead", matches.len(), matches.join(", "))]
    Ambiguous {
        /// The identifier the user typed.
        query: String,
        /// Short descriptions of every match.
        matches: Vec<String>,
    },

    /// Durable storage failed; the in-memory state is still authoritative.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    /// Terminal or console I/O failed.
    #[error("terminal error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        Error::Validation {
            field,
            reason: reason.into(),
        }
    }

    pub(crate) fn not_found(id: &str, collection: Collection) -> Self {
        Error::NotFound {
            id: id.to_string(),
            collection,
        }
    }
}

/// Failures reading or writing a storage slot.
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    /// Filesystem error on a slot file.
    #[error("failed to {op} {}: {source}", path.display())]
    Io {
        /// "read" or "write".
        op: &'static str,
        /// The file involved.
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A slot could not be serialized.
    #[error("failed to encode {slot}: {source}")]
    Encode {
        slot: Slot,
        #[source]
        source: serde_json::Error,
    },

    /// Storage refused the write (used by in-memory storage).
    #[error("storage rejected write to {slot}")]
    Rejected { slot: Slot },
}

/// Why a single persisted record could not be turned into a task.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("record is not a JSON object")]
    NotAnObject,

    #[error("record does not fit the task shape: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, Error>;
