//! Core types shared across the crate.
//!
//! Currently this is the fatal error taxonomy; recoverable conditions live
//! in [`crate::report`] as diagnostics instead.

pub mod error;

pub use error::SchemaDepError;
