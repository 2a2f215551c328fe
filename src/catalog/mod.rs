//! Discovery of schema object files and their dependency declarations.
//!
//! A working root contains one subdirectory per object category (`tables`,
//! `views`, …). Categories are processed in a fixed order; within a category
//! the walk is recursive with directories visited in sorted order, and the
//! files of one directory are ordered by extension priority first, then by
//! stem. The category name is the namespace of every file found under it, at
//! any depth.
//!
//! Discovery runs in two passes: all `.deps` declaration files feed the
//! [`RuleTable`], then the object files build graph nodes. A file whose
//! primary identity key (its extension-stripped qualified name) is already
//! claimed by an earlier file is discarded and reported as an override,
//! deliberately a different policy from the global index's silent
//! last-write-wins.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::SchemaDepError;
use crate::graph::DependencyGraph;
use crate::qualify;
use crate::report::Report;
use crate::rules::RuleTable;

/// Category subdirectories, in deployment-priority order.
pub const DEFAULT_CATEGORIES: [&str; 8] =
    ["class", "types", "tables", "procs", "packages", "views", "triggers", "data"];

/// Recognized object-file extensions, in priority order.
pub const OBJECT_EXTENSIONS: [&str; 3] = ["sql", "pks", "pkb"];

/// Extension of dependency declaration files.
pub const RULE_EXTENSION: &str = "deps";

/// A file found during the category walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Bare file name, e.g. `orders.sql`.
    pub name: String,
    /// Root-relative path, e.g. `tables/orders.sql`.
    pub path: String,
}

/// Walks the category directories of a working root.
#[derive(Debug)]
pub struct Catalog {
    root: PathBuf,
    categories: Vec<String>,
}

impl Catalog {
    /// Catalog over `root` with the default category list.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_categories(root, &DEFAULT_CATEGORIES)
    }

    /// Catalog over `root` with a custom ordered category list.
    pub fn with_categories(root: impl Into<PathBuf>, categories: &[&str]) -> Self {
        Self {
            root: root.into(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    /// The configured categories that exist under the root, in order.
    pub fn existing_categories(&self) -> Vec<String> {
        self.categories.iter().filter(|c| self.root.join(c).is_dir()).cloned().collect()
    }

    /// Run full discovery: parse declarations, build graph nodes, classify
    /// aliases.
    ///
    /// # Errors
    ///
    /// Fails only when a declaration file cannot be read; everything else is
    /// collected into `report`.
    pub fn read(
        &self,
        rules: &mut RuleTable,
        graph: &mut DependencyGraph,
        report: &mut Report,
    ) -> Result<(), SchemaDepError> {
        let categories = self.existing_categories();
        debug!(?categories, root = %self.root.display(), "discovery started");

        for category in &categories {
            for file in self.files(category, &[RULE_EXTENSION]) {
                rules.read_file(category, &self.root.join(&file.path), &file.path)?;
            }
        }

        for category in &categories {
            for file in self.files(category, &OBJECT_EXTENSIONS) {
                let rule = rules.find(category, &file.name);
                let keys = qualify::qualify_in(category, &file.name);
                if let Some(existing) = keys.last().and_then(|key| graph.lookup(key)) {
                    report.record_override(&file.path, existing.path.clone());
                    continue;
                }
                graph.add(keys, rule, file.path);
            }
        }

        rules.find_aliases();
        Ok(())
    }

    /// Files under one category carrying one of `extensions`.
    ///
    /// Ordered by directory (sorted walk), then extension priority (position
    /// in `extensions`), then stem. Extensionless files are skipped.
    fn files(&self, category: &str, extensions: &[&str]) -> Vec<DiscoveredFile> {
        struct Candidate {
            parent: String,
            rank: usize,
            stem: String,
            file: DiscoveredFile,
        }

        let dir = self.root.join(category);
        let mut found: Vec<Candidate> = Vec::new();
        for entry in WalkDir::new(&dir).sort_by_file_name() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!(category, %err, "skipping unreadable directory entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some((stem, ext)) = name.rsplit_once('.') else {
                continue;
            };
            let Some(rank) = extensions.iter().position(|e| *e == ext) else {
                continue;
            };
            let rel = rel_path(&self.root, entry.path());
            let parent = rel.rsplit_once('/').map(|(p, _)| p.to_string()).unwrap_or_default();
            found.push(Candidate {
                parent,
                rank,
                stem: stem.to_string(),
                file: DiscoveredFile { name: name.clone(), path: rel },
            });
        }
        found.sort_by(|a, b| {
            (&a.parent, a.rank, &a.stem, &a.file.name)
                .cmp(&(&b.parent, b.rank, &b.stem, &b.file.name))
        });
        found.into_iter().map(|c| c.file).collect()
    }
}

/// Root-relative path with forward slashes, as emitted into the script.
fn rel_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let s = rel.to_string_lossy();
    if std::path::MAIN_SEPARATOR == '/' {
        s.into_owned()
    } else {
        s.replace(std::path::MAIN_SEPARATOR, "/")
    }
}
