//! Ancestor/descendant computation over the named-group adjacency
//!
//! The inventory's `groups` section declares parent/child edges between named
//! groups. Traversal preserves declaration order and guards against cycles by
//! never revisiting a name; the input is not required to be acyclic.

use std::collections::HashSet;

/// Virtual groups every resolution implicitly belongs to
///
/// `development` is the environment scope, `all` and `all-projects` are the
/// catch-all roots. They need not appear in the adjacency.
pub const ROOT_GROUPS: [&str; 3] = ["development", "all", "all-projects"];

/// Parent/child relations between named groups, in document order
#[derive(Debug, Clone, Default)]
pub struct GroupGraph {
    /// (group name, declared children) pairs, preserving document order
    entries: Vec<(String, Vec<String>)>,
}

impl GroupGraph {
    /// Build a graph from (name, children) pairs in declaration order
    pub fn new(entries: Vec<(String, Vec<String>)>) -> Self {
        Self { entries }
    }

    fn children_of(&self, group: &str) -> &[String] {
        self.entries
            .iter()
            .find(|(name, _)| name == group)
            .map(|(_, children)| children.as_slice())
            .unwrap_or(&[])
    }

    /// Transitive children of `group`, depth-first in declaration order
    ///
    /// Each name appears once; the first occurrence is kept. A group absent
    /// from the adjacency has no descendants.
    pub fn descendants(&self, group: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.walk_children(group, &mut out, &mut seen);
        out
    }

    fn walk_children(&self, group: &str, out: &mut Vec<String>, seen: &mut HashSet<String>) {
        for child in self.children_of(group) {
            if seen.insert(child.clone()) {
                out.push(child.clone());
                self.walk_children(child, out, seen);
            }
        }
    }

    /// Transitive parents of `group`: every group whose `children` list
    /// contains it, applied upward, in document order
    pub fn ancestors(&self, group: &str) -> Vec<String> {
        let mut out = Vec::new();
        let mut seen = HashSet::new();
        self.walk_parents(group, &mut out, &mut seen);
        out
    }

    fn walk_parents(&self, group: &str, out: &mut Vec<String>, seen: &mut HashSet<String>) {
        // This level first, so parents appear in document order before their
        // own parents; recurse only into newly discovered names.
        let mut discovered = Vec::new();
        for (name, children) in &self.entries {
            if children.iter().any(|c| c == group) && seen.insert(name.clone()) {
                out.push(name.clone());
                discovered.push(name.clone());
            }
        }
        for parent in discovered {
            self.walk_parents(&parent, out, seen);
        }
    }

    /// Every group `group` effectively belongs to, for pattern matching
    ///
    /// Union of the explicit `parents` declared outside the graph, the group
    /// itself, the ancestors of each of those, and the fixed [`ROOT_GROUPS`],
    /// deduplicated in first-seen order. A group unknown to the adjacency
    /// still receives the fixed roots.
    pub fn effective_parents(&self, group: &str, explicit_parents: &[String]) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for parent in explicit_parents {
            push_unique(&mut out, parent);
        }
        push_unique(&mut out, group);

        // Ancestors of the explicit parents count too: a project adopted into
        // a meta-group inherits that meta-group's whole chain.
        for name in out.clone() {
            for ancestor in self.ancestors(&name) {
                push_unique(&mut out, &ancestor);
            }
        }
        for root in ROOT_GROUPS {
            push_unique(&mut out, root);
        }
        out
    }
}

fn push_unique(out: &mut Vec<String>, name: &str) {
    if !out.iter().any(|n| n == name) {
        out.push(name.to_string());
    }
}
