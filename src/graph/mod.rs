//! Dependency graph and the deployment-ordering engine.
//!
//! One node per discovered file. Every identity key of every node feeds a
//! single global index used for dependency resolution; on a key collision the
//! later registration silently wins (the override policy in
//! [`crate::catalog`] is deliberately separate from this).
//!
//! The ordering algorithm is an iterative depth-first traversal with an
//! explicit frame stack, collecting nodes in reverse postorder: a node is
//! emitted only after every dependency reachable through it has been
//! emitted. Cycles in the file graph are never an error here - the pushed-set
//! guard treats a back-edge as already satisfied and the traversal carries
//! on. Alias cycles, by contrast, are diagnosed during expansion in
//! [`crate::rules`]; the asymmetry is intentional.

use std::collections::{HashMap, HashSet};

use tracing::{debug, trace};

use crate::report::Report;
use crate::rules::{DepGroup, RuleId, RuleTable};

/// A discovered file participating in the ordering.
#[derive(Debug, Clone)]
pub struct Node {
    /// Identity keys, most specific first.
    pub keys: Vec<String>,
    /// The dependency rule attached to this file, if any matched.
    pub rule: Option<RuleId>,
    /// Root-relative path, emitted into the driver script.
    pub path: String,
}

/// Graph over discovered files plus the global key index.
#[derive(Debug, Default)]
pub struct DependencyGraph {
    nodes: Vec<Node>,
    index: HashMap<String, usize>,
}

/// One in-flight traversal frame: a node and a cursor over its
/// alias-expanded dependency groups.
struct Frame {
    node: usize,
    groups: Vec<DepGroup>,
    cursor: usize,
}

impl DependencyGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node, registering all of its keys in the global index.
    ///
    /// Colliding keys are silently overwritten by the newcomer.
    pub fn add(&mut self, keys: Vec<String>, rule: Option<RuleId>, path: String) {
        let id = self.nodes.len();
        for key in &keys {
            self.index.insert(key.clone(), id);
        }
        trace!(%path, ?keys, "node added");
        self.nodes.push(Node { keys, rule, path });
    }

    /// Look up a single key in the global index.
    pub fn lookup(&self, key: &str) -> Option<&Node> {
        self.index.get(key).map(|&id| &self.nodes[id])
    }

    /// Resolve a dependency group to the first node any of its candidate
    /// keys maps to.
    fn resolve(&self, group: &DepGroup) -> Option<usize> {
        group.keys.iter().find_map(|key| self.index.get(key).copied())
    }

    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// `true` if no files were discovered.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Access a node by position in the order returned by [`Self::sort`].
    pub fn node(&self, id: usize) -> &Node {
        &self.nodes[id]
    }

    /// Compute the deployment order.
    ///
    /// Every node is taken as a traversal root in discovery order; the
    /// pushed set spans the whole run, so a node reached from an earlier
    /// root is never traversed again. Dependency groups that resolve push a
    /// new frame; groups that resolve to an already-pushed node are
    /// satisfied no-ops (including back-edges that close a cycle); groups
    /// that do not resolve at all are reported and skipped.
    ///
    /// Returns node ids such that, for every node and every resolving group
    /// in its expanded dependency list, the resolved node appears strictly
    /// earlier. Rerunning over the same inputs yields the same order.
    pub fn sort(&self, rules: &mut RuleTable, report: &mut Report) -> Vec<usize> {
        let mut pushed: HashSet<usize> = HashSet::new();
        let mut stack: Vec<Frame> = Vec::new();
        let mut order = Vec::with_capacity(self.nodes.len());

        for root in 0..self.nodes.len() {
            self.push_frame(root, &mut stack, &mut pushed, rules, report);
            loop {
                let Some(top) = stack.last_mut() else { break };
                if top.cursor >= top.groups.len() {
                    let node = top.node;
                    stack.pop();
                    order.push(node);
                    continue;
                }
                let referrer = top.node;
                let group = top.groups[top.cursor].clone();
                top.cursor += 1;

                match self.resolve(&group) {
                    Some(dep) => {
                        self.push_frame(dep, &mut stack, &mut pushed, rules, report);
                    }
                    None => {
                        report.record_unfound(&group.keys, self.rule_location(referrer, rules));
                    }
                }
            }
        }

        debug!(files = order.len(), "deployment order computed");
        order
    }

    /// Push a traversal frame for `node` unless it was already pushed.
    ///
    /// Expansion happens here, at push time, so alias hit counting follows
    /// the traversal exactly.
    fn push_frame(
        &self,
        node: usize,
        stack: &mut Vec<Frame>,
        pushed: &mut HashSet<usize>,
        rules: &mut RuleTable,
        report: &mut Report,
    ) {
        if !pushed.insert(node) {
            return;
        }
        let groups = match self.nodes[node].rule {
            Some(rule) => rules.expanded_deps(rule, report),
            None => Vec::new(),
        };
        stack.push(Frame {
            node,
            groups,
            cursor: 0,
        });
    }

    /// Diagnostic location for an unresolved reference: the referring rule's
    /// declaration site, falling back to the file path.
    fn rule_location(&self, node: usize, rules: &RuleTable) -> String {
        match self.nodes[node].rule {
            Some(rule) => rules.rule(rule).location.clone(),
            None => self.nodes[node].path.clone(),
        }
    }
}
