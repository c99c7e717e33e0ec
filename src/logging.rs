//! Tracing subscriber setup.
//!
//! `RUST_LOG` wins when set. Otherwise the level comes from the number of
//! `-v` flags. The TUI owns the terminal, so it logs to a file instead of
//! stderr.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Filter directive used when `RUST_LOG` is not set.
pub fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "focustwo=warn",
        1 => "focustwo=info",
        _ => "focustwo=debug",
    }
}

/// Install the global subscriber. Logs go to `log_file` when given and
/// openable, otherwise to stderr.
pub fn init(verbosity: u8, log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    let file = log_file.and_then(|path| {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| eprintln!("Could not open log file {}: {e}", path.display()))
            .ok()
    });
    let result = match file {
        Some(file) => builder.with_ansi(false).with_writer(Mutex::new(file)).try_init(),
        None => builder.with_writer(std::io::stderr).try_init(),
    };
    if let Err(e) = result {
        eprintln!("Logging already initialised: {e}");
    }
}
