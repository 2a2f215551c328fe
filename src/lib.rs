//! schemadep - dependency-ordered deployment scripts for SQL schema trees.
//!
//! A schema tree keeps one subdirectory per object category (`tables`,
//! `views`, `packages`, …) with one definition file per object. Sidecar
//! `.deps` files declare how objects depend on one another, using a small
//! grammar with namespace search paths and `subject :: dependency-list`
//! rules. schemadep discovers the tree, resolves every declared dependency
//! (reconciling qualified, unqualified, and extensionless spellings of the
//! same object, and expanding purely virtual alias subjects), and writes a
//! driver script that loads the files in a valid order for Oracle SQL*Plus
//! or Postgres psql.
//!
//! The run degrades gracefully: unresolved references, circular alias
//! declarations, duplicate files, and rules that never matched anything are
//! collected and reported at the end, never turned into failures.
//!
//! # Modules
//!
//! - [`cli`] - command-line surface and the generator pipeline
//! - [`catalog`] - category walk, extension filter, override detection
//! - [`rules`] - `.deps` parsing, rule index, alias classification/expansion
//! - [`qualify`] - candidate-key generation for object references
//! - [`graph`] - file graph and the depth-first ordering engine
//! - [`emit`] - dialect-specific script emission and boilerplate handling
//! - [`report`] - diagnostics collection and the end-of-run report
//! - [`core`] - fatal error taxonomy

pub mod catalog;
pub mod cli;
pub mod core;
pub mod emit;
pub mod graph;
pub mod qualify;
pub mod report;
pub mod rules;

pub use crate::core::SchemaDepError;
