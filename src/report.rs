//! End-of-run diagnostics collection and reporting.
//!
//! The generator never aborts on bad source data: unresolved references,
//! circular alias declarations, discarded duplicate files, and rules that
//! never matched anything are collected here and printed as a report after
//! the driver script has been written. The report is informational only; it
//! does not gate success.
//!
//! Fatal conditions (unreadable declaration files, output write failures) go
//! through [`crate::core::SchemaDepError`] instead and never reach this
//! module.

use colored::Colorize;
use tracing::warn;

use crate::rules::RuleTable;

/// A discovered file discarded because an earlier file claimed its primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    /// Root-relative path of the discarded file.
    pub discarded: String,
    /// Root-relative path of the file that already holds the key.
    pub kept: String,
}

/// A dependency group none of whose candidate keys resolved to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnfoundReference {
    /// The candidate keys of the group, rendered `a | b | c`.
    pub reference: String,
    /// `path:line` of the rule that declared the dependency.
    pub location: String,
}

/// A circular alias reference detected during expansion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircularAlias {
    /// The key whose re-expansion closed the cycle.
    pub key: String,
    /// The expansion chain that was active when the cycle was detected.
    pub chain: String,
}

/// Collected diagnostics for one generator run.
#[derive(Debug, Default)]
pub struct Report {
    overrides: Vec<Override>,
    unfound: Vec<UnfoundReference>,
    circular: Vec<CircularAlias>,
}

impl Report {
    /// Create an empty report.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a discarded duplicate file.
    pub fn record_override(&mut self, discarded: impl Into<String>, kept: impl Into<String>) {
        let entry = Override {
            discarded: discarded.into(),
            kept: kept.into(),
        };
        warn!(discarded = %entry.discarded, kept = %entry.kept, "duplicate file discarded");
        self.overrides.push(entry);
    }

    /// Record a dependency group that resolved to no discovered file.
    pub fn record_unfound(&mut self, candidates: &[String], location: impl Into<String>) {
        let entry = UnfoundReference {
            reference: candidates.join(" | "),
            location: location.into(),
        };
        warn!(reference = %entry.reference, location = %entry.location, "unfound reference");
        self.unfound.push(entry);
    }

    /// Record a circular alias reference.
    ///
    /// `history` is the chain of alias keys expanded so far in the current
    /// top-level expansion; `key` is the one that was about to be expanded
    /// again.
    pub fn record_circular(&mut self, history: &[String], key: &str) {
        let entry = CircularAlias {
            key: key.to_string(),
            chain: history.join(" -> "),
        };
        warn!(key = %entry.key, chain = %entry.chain, "circular alias reference");
        self.circular.push(entry);
    }

    /// Discarded duplicate files, in discovery order.
    pub fn overrides(&self) -> &[Override] {
        &self.overrides
    }

    /// Unresolved dependency groups, in the order they were encountered.
    pub fn unfound(&self) -> &[UnfoundReference] {
        &self.unfound
    }

    /// Circular alias detections, in the order they were encountered.
    pub fn circular(&self) -> &[CircularAlias] {
        &self.circular
    }

    /// Print the full report to stdout.
    ///
    /// `rules` supplies the unused-rule listing: rules whose hit count is
    /// still zero after the sort were never matched to a file and never
    /// consumed through alias expansion.
    pub fn print(&self, rules: &RuleTable) {
        section("OVERRIDES", self.overrides.len());
        for o in &self.overrides {
            println!("\"{}\" overridden by \"{}\"", o.discarded, o.kept);
        }

        let unused: Vec<_> = rules.unused().collect();
        section("UNUSED RULES", unused.len());
        for rule in unused {
            println!("{} @{}", rule.subject, rule.location);
        }

        section("UNFOUND (rule) REFERENCES", self.unfound.len());
        for u in &self.unfound {
            println!("\"{}\" @{}", u.reference, u.location);
        }

        if !self.circular.is_empty() {
            section("CIRCULAR ALIAS REFERENCES", self.circular.len());
            for c in &self.circular {
                println!("\"{}\" via {}", c.key, c.chain);
            }
        }
    }
}

/// Print a report section header with its entry count.
pub fn section(title: &str, count: usize) {
    println!("\n{} ({count}):", title.bold());
    println!("{}", "_____________________________________________________".dimmed());
}
