//! Command-line interface for schemadep.
//!
//! A single-purpose command: point it at a working directory laid out in
//! category subdirectories and it writes a driver script that loads every
//! discovered object in dependency order.
//!
//! ```bash
//! # Oracle driver script for the current directory, written to main.sql
//! schemadep
//!
//! # Postgres style, explicit root and output
//! schemadep --directory db/schema --style postgres --output deploy.sql
//! ```
//!
//! The run always attempts to produce output: bad source data is reported in
//! the end-of-run diagnostics, not treated as failure. Only a missing
//! working directory, unreadable declaration files, or an unwritable output
//! file abort the run.

use std::fs::File;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use crate::catalog::Catalog;
use crate::core::SchemaDepError;
use crate::emit::{self, Style};
use crate::graph::DependencyGraph;
use crate::report::{self, Report};
use crate::rules::RuleTable;

/// Generate a dependency-ordered deployment script for a SQL schema tree.
#[derive(Parser, Debug)]
#[command(name = "schemadep", version, about)]
pub struct Cli {
    /// Working directory containing the category subdirectories.
    #[arg(short = 'd', long, default_value = ".")]
    directory: PathBuf,

    /// Output file path; a relative path lands in the working directory.
    #[arg(short = 'o', long, default_value = "main.sql")]
    output: PathBuf,

    /// Dialect of the emitted include directives.
    #[arg(short = 's', long, value_enum, default_value_t = Style::Oracle)]
    style: Style,

    /// Enable debug logging.
    #[arg(short = 'v', long)]
    verbose: bool,

    /// Only log errors.
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Default `tracing` filter derived from the verbosity flags.
    ///
    /// An explicit `RUST_LOG` in the environment takes precedence.
    pub fn log_filter(&self) -> &'static str {
        if self.quiet {
            "error"
        } else if self.verbose {
            "schemadep=debug"
        } else {
            "warn"
        }
    }

    /// Run the generator pipeline.
    ///
    /// Discover, parse rules, order, emit, report. Diagnostics never fail
    /// the run; see [`crate::core::SchemaDepError`] for what does.
    pub fn execute(&self) -> Result<()> {
        if !self.directory.is_dir() {
            return Err(SchemaDepError::WorkingDirNotFound {
                path: self.directory.display().to_string(),
            }
            .into());
        }

        let catalog = Catalog::new(&self.directory);
        let mut rules = RuleTable::new();
        let mut graph = DependencyGraph::new();
        let mut diagnostics = Report::new();
        catalog.read(&mut rules, &mut graph, &mut diagnostics)?;
        debug!(files = graph.len(), rules = rules.len(), "discovery complete");

        let order = graph.sort(&mut rules, &mut diagnostics);
        let paths: Vec<&str> = order.iter().map(|&id| graph.node(id).path.as_str()).collect();

        diagnostics.print(&rules);

        let boilerplate = emit::read_boilerplate(&self.directory)?;
        let output_path = if self.output.is_absolute() {
            self.output.clone()
        } else {
            self.directory.join(&self.output)
        };
        let as_output_error = |source| SchemaDepError::OutputWrite {
            path: output_path.display().to_string(),
            source,
        };
        let mut out = File::create(&output_path).map_err(as_output_error)?;

        report::section("FILES", paths.len());
        emit::write_script(self.style, &paths, boilerplate.as_deref(), &mut out)
            .map_err(as_output_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_surface() {
        let cli = Cli::try_parse_from(["schemadep"]).unwrap();
        assert_eq!(cli.directory, PathBuf::from("."));
        assert_eq!(cli.output, PathBuf::from("main.sql"));
        assert_eq!(cli.style, Style::Oracle);
        assert_eq!(cli.log_filter(), "warn");
    }

    #[test]
    fn short_and_long_options_parse() {
        let cli = Cli::try_parse_from([
            "schemadep", "-d", "db", "-o", "deploy.sql", "-s", "postgres",
        ])
        .unwrap();
        assert_eq!(cli.directory, PathBuf::from("db"));
        assert_eq!(cli.output, PathBuf::from("deploy.sql"));
        assert_eq!(cli.style, Style::Postgres);
    }

    #[test]
    fn unknown_style_is_rejected() {
        assert!(Cli::try_parse_from(["schemadep", "--style", "mysql"]).is_err());
    }

    #[test]
    fn verbosity_flags_conflict() {
        assert!(Cli::try_parse_from(["schemadep", "-v", "-q"]).is_err());
    }

    #[test]
    fn verbosity_controls_the_filter() {
        let cli = Cli::try_parse_from(["schemadep", "--verbose"]).unwrap();
        assert_eq!(cli.log_filter(), "schemadep=debug");
        let cli = Cli::try_parse_from(["schemadep", "--quiet"]).unwrap();
        assert_eq!(cli.log_filter(), "error");
    }

    #[test]
    fn missing_directory_is_fatal() {
        let cli =
            Cli::try_parse_from(["schemadep", "--directory", "/does/not/exist"]).unwrap();
        let err = cli.execute().unwrap_err();
        assert!(err.to_string().contains("working directory not found"));
    }
}
