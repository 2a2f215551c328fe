//! Dependency rule tables parsed from `.deps` declaration files.
//!
//! Each category directory may carry `.deps` files declaring how the objects
//! in it depend on one another. The grammar is line oriented:
//!
//! ```text
//! # comment
//! path = . common shared          # namespace search order for this file
//! orders :: customers, products   # subject :: dependency list
//! big_view :: a b \
//!     c                           # trailing backslash joins lines
//! ```
//!
//! Every qualified form of a rule's subject indexes the rule, so one rule is
//! reachable under several synonymous keys. Dependency tokens are qualified
//! against the file's current `path` search order, producing one group of
//! alternative keys per token: a group is satisfied if ANY alternative
//! resolves, and a rule is satisfied only when ALL of its groups resolve.
//!
//! Subjects that never match a discovered file are classified as **aliases**
//! after discovery completes: purely virtual grouping names whose dependency
//! lists are substituted wherever the alias is referenced. Expansion is
//! guarded against cycles but intentionally not memoized; an alias is
//! re-expanded for every consumer that references it.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tracing::{debug, trace};

use crate::core::SchemaDepError;
use crate::qualify;
use crate::report::Report;

/// Stable handle to a rule inside a [`RuleTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RuleId(usize);

/// One group of alternative candidate keys (OR semantics).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DepGroup {
    /// Candidate keys in preference order; the first that resolves wins.
    pub keys: Vec<String>,
}

/// A parsed `subject :: dependencies` declaration.
#[derive(Debug, Clone)]
pub struct Rule {
    /// The subject exactly as written, trimmed.
    pub subject: String,
    /// One group per dependency token (AND across groups).
    pub deps: Vec<DepGroup>,
    /// `path:line` of the declaring logical line.
    pub location: String,
    /// Times this rule was resolved, directly or through alias expansion.
    pub hits: u32,
}

/// Table of all dependency rules across every declaration file.
///
/// Build order matters: parse every `.deps` file, let discovery attach rules
/// to files via [`RuleTable::find`], and only then call
/// [`RuleTable::find_aliases`] - alias classification depends on having
/// observed every direct lookup first.
#[derive(Debug, Default)]
pub struct RuleTable {
    rules: Vec<Rule>,
    index: HashMap<String, RuleId>,
    aliases: HashMap<String, RuleId>,
}

/// Splitter for option values and dependency lists: commas and/or whitespace.
fn value_splitter() -> &'static Regex {
    static SPLITTER: OnceLock<Regex> = OnceLock::new();
    SPLITTER.get_or_init(|| Regex::new(r"[,\s]+").expect("static regex"))
}

fn split_values(input: &str) -> impl Iterator<Item = &str> {
    value_splitter().split(input.trim()).filter(|t| !t.is_empty())
}

impl RuleTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and parse one declaration file.
    ///
    /// `ns` is the namespace the file belongs to (its category directory) and
    /// `display_path` the root-relative path used in diagnostics locations.
    ///
    /// # Errors
    ///
    /// Failing to read a configured declaration file is fatal.
    pub fn read_file(
        &mut self,
        ns: &str,
        path: &Path,
        display_path: &str,
    ) -> Result<(), SchemaDepError> {
        let text = fs::read_to_string(path).map_err(|source| SchemaDepError::RuleFileRead {
            path: display_path.to_string(),
            source,
        })?;
        debug!(ns, path = display_path, "reading dependency declarations");
        self.parse(ns, display_path, &text);
        Ok(())
    }

    /// Parse declaration text into the table.
    ///
    /// The namespace search scope starts as `[ns]` and is reset for every
    /// file; a `path = …` option only affects lines below it in the same
    /// file.
    pub fn parse(&mut self, ns: &str, display_path: &str, text: &str) {
        let mut scope = vec![ns.to_string()];
        for (line_no, line) in logical_lines(text) {
            if set_path_option(&mut scope, ns, &line) {
                trace!(path = display_path, line = line_no, ?scope, "search path set");
                continue;
            }
            let Some((subject, dep_list)) = line.split_once("::") else {
                continue;
            };
            let subject = subject.trim();
            // Continuation markers may survive inside the joined dependency list.
            let dep_list = dep_list.replace('\\', "");
            let deps: Vec<DepGroup> = split_values(&dep_list)
                .map(|token| DepGroup {
                    keys: qualify::qualify(&scope, token),
                })
                .collect();
            let id = RuleId(self.rules.len());
            let location = format!("{display_path}:{line_no}");
            trace!(subject, %location, groups = deps.len(), "rule parsed");
            self.rules.push(Rule {
                subject: subject.to_string(),
                deps,
                location,
                hits: 0,
            });
            for key in qualify::qualify_in(ns, subject) {
                self.index.insert(key, id);
            }
        }
    }

    /// Resolve `name` in `ns` to a rule, counting the hit.
    ///
    /// Candidates are tried in qualification order; the first index match
    /// wins and has its hit counter incremented.
    pub fn find(&mut self, ns: &str, name: &str) -> Option<RuleId> {
        for key in qualify::qualify_in(ns, name) {
            if let Some(&id) = self.index.get(&key) {
                self.rules[id.0].hits += 1;
                return Some(id);
            }
        }
        None
    }

    /// Classify zero-hit rules as aliases.
    ///
    /// Must run exactly once, after every declaration file has been parsed
    /// AND every discovered file has been looked up: a rule with no hits at
    /// that point was never matched by a real file and exists purely to be
    /// substituted into other rules' dependency lists.
    pub fn find_aliases(&mut self) {
        self.aliases = self
            .index
            .iter()
            .filter(|(_, id)| self.rules[id.0].hits == 0)
            .map(|(key, id)| (key.clone(), *id))
            .collect();
        debug!(aliases = self.aliases.len(), rules = self.rules.len(), "aliases classified");
    }

    /// The rule's dependency list with every alias reference expanded.
    ///
    /// Expansion shares one append-only history across the whole call: a key
    /// already expanded anywhere in this call is skipped and reported as a
    /// circular reference. Each consumed alias has its hit counter bumped.
    /// Results are recomputed on every call.
    pub fn expanded_deps(&mut self, id: RuleId, report: &mut Report) -> Vec<DepGroup> {
        let deps = self.rules[id.0].deps.clone();
        let mut history = Vec::new();
        let mut out = Vec::new();
        for group in &deps {
            self.expand_group(group, &mut history, &mut out, report);
        }
        out
    }

    /// Expand one group, appending the result to `out`.
    ///
    /// A group is either kept entirely literal or entirely replaced by the
    /// groups its aliases expand to, never a mix of both.
    fn expand_group(
        &mut self,
        group: &DepGroup,
        history: &mut Vec<String>,
        out: &mut Vec<DepGroup>,
        report: &mut Report,
    ) {
        let mut literal = Vec::new();
        let mut expanded = Vec::new();
        for key in &group.keys {
            if history.iter().any(|seen| seen == key) {
                report.record_circular(history, key);
                continue;
            }
            let Some(&alias) = self.aliases.get(key) else {
                literal.push(key.clone());
                continue;
            };
            history.push(key.clone());
            self.rules[alias.0].hits += 1;
            let alias_deps = self.rules[alias.0].deps.clone();
            for nested in &alias_deps {
                self.expand_group(nested, history, &mut expanded, report);
            }
        }
        if expanded.is_empty() {
            if !literal.is_empty() {
                out.push(DepGroup { keys: literal });
            }
        } else {
            out.append(&mut expanded);
        }
    }

    /// Access a rule by id.
    pub fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    /// Rules that were never resolved, directly or through expansion.
    pub fn unused(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter().filter(|r| r.hits == 0)
    }

    /// Number of parsed rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// `true` if no rules have been parsed.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Reduce physical lines to numbered logical lines.
///
/// Empty lines and lines starting with `#` are dropped. A logical line
/// ending in `\` is joined with the next physical line, marker stripped,
/// and carries the number of its last physical line.
fn logical_lines(text: &str) -> Vec<(usize, String)> {
    let mut lines: Vec<(usize, String)> = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line_no = idx + 1;
        if raw.is_empty() || raw.starts_with('#') {
            continue;
        }
        if let Some((_, prev)) = lines.last()
            && prev.ends_with('\\')
        {
            let joined = format!("{} {}", &prev[..prev.len() - 1], raw);
            lines.pop();
            lines.push((line_no, joined));
        } else {
            lines.push((line_no, raw.to_string()));
        }
    }
    lines
}

/// Apply a `path = …` option line to the scope, if the line is one.
///
/// Only the `path` key is meaningful; a `.` value expands to the file's own
/// namespace. Lines with any other `key =` shape fall through to rule
/// parsing (and, lacking `::`, are ignored).
fn set_path_option(scope: &mut Vec<String>, ns: &str, line: &str) -> bool {
    let Some((key, value)) = line.split_once('=') else {
        return false;
    };
    if key.trim() != "path" {
        return false;
    }
    *scope = split_values(value)
        .map(|v| if v == "." { ns.to_string() } else { v.to_string() })
        .collect();
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_with(ns: &str, text: &str) -> RuleTable {
        let mut table = RuleTable::new();
        table.parse(ns, &format!("{ns}/{ns}.deps"), text);
        table
    }

    #[test]
    fn rule_line_parses_subject_and_groups() {
        let mut table = table_with("tables", "orders.sql :: customers, products\n");
        let id = table.find("tables", "orders.sql").unwrap();
        let rule = table.rule(id);
        assert_eq!(rule.subject, "orders.sql");
        assert_eq!(rule.deps.len(), 2);
        assert_eq!(rule.deps[0].keys, vec!["tables/customers"]);
        assert_eq!(rule.deps[1].keys, vec!["tables/products"]);
    }

    #[test]
    fn lines_without_separator_are_ignored() {
        let table = table_with("tables", "just some text\nnotpath = a b\n");
        assert!(table.is_empty());
    }

    #[test]
    fn subject_indexed_under_all_qualified_forms() {
        let mut table = table_with("tables", "orders.sql :: customers\n");
        assert!(table.find("tables", "orders.sql").is_some());
        assert!(table.find("tables", "orders").is_some());
        assert!(table.find("tables", "orders.pkb").is_some());
        assert!(table.find("views", "orders").is_none());
    }

    #[test]
    fn find_counts_hits() {
        let mut table = table_with("tables", "orders :: customers\n");
        let id = table.find("tables", "orders.sql").unwrap();
        table.find("tables", "orders.sql");
        assert_eq!(table.rule(id).hits, 2);
    }

    #[test]
    fn search_path_option_orders_candidates() {
        let text = "path = types, tables\nx :: widget.sql\n";
        let mut table = table_with("tables", text);
        let id = table.find("tables", "x").unwrap();
        assert_eq!(
            table.rule(id).deps[0].keys,
            vec!["types/widget.sql", "types/widget", "tables/widget.sql", "tables/widget"]
        );
    }

    #[test]
    fn dot_in_search_path_means_own_namespace() {
        let text = "path = ., common\nx :: y\n";
        let mut table = table_with("tables", text);
        let id = table.find("tables", "x").unwrap();
        assert_eq!(table.rule(id).deps[0].keys, vec!["tables/y", "common/y"]);
    }

    #[test]
    fn scope_resets_per_file() {
        let mut table = RuleTable::new();
        table.parse("tables", "tables/tables.deps", "path = common\na :: y\n");
        table.parse("views", "views/views.deps", "b :: y\n");
        let id = table.find("views", "b").unwrap();
        assert_eq!(table.rule(id).deps[0].keys, vec!["views/y"]);
    }

    #[test]
    fn continuation_joins_and_keeps_last_line_number() {
        let text = "# header\nbig :: a, \\\n    b\n";
        let mut table = table_with("tables", text);
        let id = table.find("tables", "big").unwrap();
        let rule = table.rule(id);
        assert_eq!(rule.deps.len(), 2);
        assert_eq!(rule.deps[1].keys, vec!["tables/b"]);
        assert_eq!(rule.location, "tables/tables.deps:3");
    }

    #[test]
    fn comments_and_blanks_are_skipped() {
        let text = "# a comment\n\norders :: customers\n";
        let mut table = table_with("tables", text);
        let id = table.find("tables", "orders").unwrap();
        assert_eq!(table.rule(id).location, "tables/tables.deps:3");
    }

    #[test]
    fn later_subject_registration_wins() {
        let text = "orders :: a\norders :: b\n";
        let mut table = table_with("tables", text);
        let id = table.find("tables", "orders").unwrap();
        assert_eq!(table.rule(id).deps[0].keys, vec!["tables/b"]);
    }

    #[test]
    fn zero_hit_rules_become_aliases() {
        let mut table = table_with("tables", "orders :: base\nbase :: a, b\n");
        // Only "orders" is ever matched by a discovered file.
        let orders = table.find("tables", "orders.sql").unwrap();
        table.find_aliases();

        let mut report = Report::new();
        let deps = table.expanded_deps(orders, &mut report);
        // The alias group is replaced by base's own groups.
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].keys, vec!["tables/a"]);
        assert_eq!(deps[1].keys, vec!["tables/b"]);
        assert!(report.circular().is_empty());
    }

    #[test]
    fn expanded_alias_counts_as_used() {
        let mut table = table_with("tables", "orders :: base\nbase :: a\nlonely :: b\n");
        let orders = table.find("tables", "orders.sql").unwrap();
        table.find_aliases();

        let mut report = Report::new();
        table.expanded_deps(orders, &mut report);
        let unused: Vec<_> = table.unused().map(|r| r.subject.as_str()).collect();
        assert_eq!(unused, vec!["lonely"]);
    }

    #[test]
    fn expansion_discards_literals_when_alias_present() {
        // One group holding both a literal and an alias collapses to the
        // alias's expansion alone.
        let mut table = table_with("tables", "orders :: literal.sql base\nbase :: a\n");
        let orders = table.find("tables", "orders.sql").unwrap();
        table.find_aliases();

        let mut report = Report::new();
        let deps = table.expanded_deps(orders, &mut report);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].keys, vec!["tables/a"]);
    }

    #[test]
    fn circular_aliases_terminate_with_diagnostic() {
        let mut table = table_with("tables", "start :: a\na :: b\nb :: a\n");
        let start = table.find("tables", "start.sql").unwrap();
        table.find_aliases();

        let mut report = Report::new();
        let deps = table.expanded_deps(start, &mut report);
        // The back-edge is dropped; the fully-circular chain expands to nothing.
        assert!(deps.is_empty());
        assert_eq!(report.circular().len(), 1);
        assert_eq!(report.circular()[0].key, "tables/a");
        assert_eq!(report.circular()[0].chain, "tables/a -> tables/b");
    }

    #[test]
    fn nested_alias_chain_expands_transitively() {
        let text = "top :: mid\nmid :: inner\ninner :: x.sql, y.sql\n";
        let mut table = table_with("tables", text);
        let top = table.find("tables", "top.sql").unwrap();
        table.find_aliases();

        let mut report = Report::new();
        let deps = table.expanded_deps(top, &mut report);
        assert_eq!(deps.len(), 2);
        assert_eq!(deps[0].keys, vec!["tables/x.sql", "tables/x"]);
        assert_eq!(deps[1].keys, vec!["tables/y.sql", "tables/y"]);
    }

    #[test]
    fn expansion_is_recomputed_per_call() {
        let mut table = table_with("tables", "orders :: base\nbase :: a\n");
        let orders = table.find("tables", "orders.sql").unwrap();
        table.find_aliases();
        let base = *table.aliases.get("tables/base").unwrap();

        let mut report = Report::new();
        table.expanded_deps(orders, &mut report);
        table.expanded_deps(orders, &mut report);
        assert_eq!(table.rule(base).hits, 2);
    }

    #[test]
    fn logical_lines_skip_and_number() {
        let lines = logical_lines("# c\nfirst\n\nsecond \\\nthird\n");
        assert_eq!(
            lines,
            vec![(2, "first".to_string()), (5, "second  third".to_string())]
        );
    }
}
