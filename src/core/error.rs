//! Error types for schemadep.
//!
//! Only genuinely fatal conditions are errors: a missing working root, an
//! unreadable dependency declaration or boilerplate file, and output
//! create/write failures. Bad source data (unresolved references, circular
//! aliases, duplicate files, unmatched rules) is collected as diagnostics in
//! [`crate::report::Report`] and never aborts a run.

use std::io;

use thiserror::Error;

/// Fatal failure modes of a generator run.
#[derive(Debug, Error)]
pub enum SchemaDepError {
    /// The configured working root does not exist or is not a directory.
    #[error("working directory not found: {path}")]
    WorkingDirNotFound {
        /// The path as given on the command line.
        path: String,
    },

    /// A dependency declaration file exists but could not be read.
    #[error("failed to read dependency declarations from {path}")]
    RuleFileRead {
        /// Root-relative path of the declaration file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The boilerplate file exists but could not be read.
    #[error("failed to read boilerplate file {path}")]
    BoilerplateRead {
        /// Path of the boilerplate file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The output file could not be created or written.
    #[error("failed to write output file {path}")]
    OutputWrite {
        /// Path of the output file.
        path: String,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_carry_the_offending_path() {
        let err = SchemaDepError::RuleFileRead {
            path: "tables/tables.deps".into(),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("tables/tables.deps"));

        let err = SchemaDepError::WorkingDirNotFound {
            path: "/nowhere".into(),
        };
        assert!(err.to_string().contains("/nowhere"));
    }

    #[test]
    fn io_source_is_preserved() {
        use std::error::Error as _;
        let err = SchemaDepError::OutputWrite {
            path: "main.sql".into(),
            source: io::Error::other("disk full"),
        };
        assert!(err.source().is_some());
    }
}
