mod cli;

use anyhow::Result;
use clap::Parser;
use tristep::fs::WorkDir;
use tristep::logging::{self, LogOptions};

use cli::Cli;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_dir = std::env::current_dir()
        .ok()
        .and_then(WorkDir::discover)
        .map(|work_dir| work_dir.logs_dir());
    if let Err(e) = logging::init(LogOptions {
        verbose: cli.verbose,
        log_dir,
    }) {
        eprintln!("Warning: {e}");
    }

    cli::dispatch(cli.command)
}
