//! # FocusTwo
//!
//! A personal task tool that narrows a to-do list down to the two things you
//! should be working on right now.
//!
//! Every active task carries three levels from 0 to 10: **priority**, how much
//! it **bothers** you, and its **difficulty**. Pick one of those (or the
//! task's category) as the ranking criterion, optionally narrow to a single
//! category, and the top two tasks become your *focus*. Everything else waits
//! in the *backup* queue. Finished tasks move to a history from which they can
//! be restored.
//!
//! ## Quick Start
//!
//! ```bash
//! # Add a couple of tasks
//! ft add "Renew passport" --category Admin --priority 8 --deadline friday
//! ft add "Fix squeaky door" --category Home --bothered 9
//!
//! # See your two focus tasks and the backup queue
//! ft list
//!
//! # Rank by how much things bother you from now on
//! ft rank bothered
//!
//! # Or work in the terminal UI
//! ft ui
//! ```
//!
//! ## Layout
//!
//! - [`store`], [`rank`], [`registry`] and [`migrate`] are the engine: pure
//!   in-memory operations with no I/O.
//! - [`storage`] and [`workspace`] persist the engine state as four small JSON
//!   slots in the data directory (`~/.focustwo` by default).
//! - [`cli`], [`cmd`] and [`tui`] are the two front ends.
//!
//! Data is stored as plain JSON files; older files with text priorities or
//! difficulty in minutes are upgraded on load.

pub mod cli;
pub mod cmd;
pub mod config;
pub mod display;
pub mod error;
pub mod fields;
pub mod logging;
pub mod migrate;
pub mod rank;
pub mod registry;
pub mod storage;
pub mod store;
pub mod task;
pub mod workspace;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

pub use error::{Error, Result};
