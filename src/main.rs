//! schemadep CLI entry point.
//!
//! Parses the command line, initializes logging, and runs the generator.
//! Fatal errors are printed with their cause chain and exit with status 1;
//! data-quality problems are reported by the run itself and do not affect
//! the exit status.

use clap::Parser;
use colored::Colorize;
use schemadep::cli::Cli;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    if let Err(err) = cli.execute() {
        eprintln!("{} {err:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
