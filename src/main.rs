//! `ft`: rank your tasks and work on the top two.
//!
//! See the library crate docs for an overview.

use clap::Parser;

use focustwo::cli::Cli;
use focustwo::cmd::{self, Commands};
use focustwo::config::Config;
use focustwo::logging;
use focustwo::storage::FileStorage;
use focustwo::workspace::Workspace;

fn main() {
    let cli = Cli::parse();

    // Completions need no data directory.
    if let Commands::Completions { shell } = cli.command {
        cmd::cmd_completions(shell);
        return;
    }

    let config = match Config::from_cli(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            std::process::exit(1);
        }
    };

    let log_file = matches!(cli.command, Commands::Ui).then(|| config.log_path());
    logging::init(config.verbosity, log_file.as_deref());

    let mut ws = Workspace::open(FileStorage::new(&config.data_dir));
    if let Err(e) = cmd::run(&mut ws, cli.command) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
