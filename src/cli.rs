use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// Rank your tasks and work on the top two.
/// State lives in ~/.focustwo or the directory passed via --data-dir.
#[derive(Parser, Debug)]
#[command(name = "ft", version, about = "Two-at-a-time task focus tool")]
pub struct Cli {
    /// Directory holding the task files.
    #[arg(long, global = true, env = "FOCUSTWO_DIR")]
    pub data_dir: Option<PathBuf>,

    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}
