//! Driver-script emission for the supported SQL dialects.
//!
//! The emitter turns the computed deployment order into one include
//! directive per file, in the dialect of the target client: `@path` for
//! Oracle SQL*Plus, `\i path` for psql. If the working root carries a
//! `start.sql` boilerplate file its verbatim contents are written before the
//! first directive. Each directive is echoed to the console with its
//! position so the operator sees the order as it is written.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use clap::ValueEnum;

use crate::core::SchemaDepError;

/// Boilerplate file prepended to the script when present in the working root.
pub const BOILERPLATE_FILE: &str = "start.sql";

/// Target dialect of the emitted driver script.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Style {
    /// Oracle SQL*Plus `@file` includes.
    #[default]
    Oracle,
    /// Postgres psql `\i file` includes.
    Postgres,
}

impl Style {
    /// The include directive for one file path.
    pub fn directive(&self, path: &str) -> String {
        match self {
            Style::Oracle => format!("@{path}"),
            Style::Postgres => format!("\\i {path}"),
        }
    }
}

/// Read the optional boilerplate file from the working root.
///
/// A missing file is not an error; an unreadable one is fatal.
pub fn read_boilerplate(root: &Path) -> Result<Option<String>, SchemaDepError> {
    let path = root.join(BOILERPLATE_FILE);
    if !path.is_file() {
        return Ok(None);
    }
    fs::read_to_string(&path).map(Some).map_err(|source| SchemaDepError::BoilerplateRead {
        path: path.display().to_string(),
        source,
    })
}

/// Write the driver script: boilerplate first, then one directive per path,
/// each on its own line. Every directive is echoed to stdout numbered from 1.
pub fn write_script<W: Write>(
    style: Style,
    paths: &[&str],
    boilerplate: Option<&str>,
    out: &mut W,
) -> io::Result<()> {
    if let Some(content) = boilerplate {
        out.write_all(content.as_bytes())?;
    }
    for (idx, path) in paths.iter().enumerate() {
        let directive = style.directive(path);
        println!("{} {directive}", idx + 1);
        out.write_all(b"\n")?;
        out.write_all(directive.as_bytes())?;
    }
    Ok(())
}
