//! Tree structure validation
//!
//! Checks an in-memory tree for the invariants the section writer relies
//! on: owning links form a tree (no cycles, no sharing), depth never
//! exceeds the address width, alias targets resolve to nodes some owning
//! path reaches, and, once finalized, node numbers are contiguous.

use std::collections::HashSet;

use crate::node::{NodeId, PrefixTree, Record};

/// Validation result for tree structure checks
#[derive(Debug, Clone)]
pub struct TreeValidationResult {
    /// Critical problems that make the tree unusable for serialization
    pub errors: Vec<String>,
    /// Non-fatal observations
    pub warnings: Vec<String>,
    /// Statistics gathered during traversal
    pub stats: TreeStats,
}

/// Statistics gathered during tree validation
#[derive(Debug, Clone, Default)]
pub struct TreeStats {
    /// Nodes reachable through owning links
    pub nodes_visited: u32,
    /// Data records seen
    pub data_records: u32,
    /// Alias records seen
    pub alias_records: u32,
    /// Reserved records seen
    pub reserved_records: u32,
    /// Deepest record encountered, in bits
    pub max_depth: u32,
    /// Whether an owning-link cycle was found
    pub cycle_detected: bool,
}

impl TreeValidationResult {
    fn new() -> Self {
        Self {
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: TreeStats::default(),
        }
    }

    /// Check if validation passed (no errors)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a tree with a full owning-link traversal.
///
/// Validates:
/// - Owning links are acyclic and unshared (each node has one owner)
/// - Record depth stays within the tree's bit width
/// - Alias targets are live nodes reachable through an owning path
/// - Node numbering, when present, is contiguous
pub fn validate_tree(tree: &PrefixTree) -> TreeValidationResult {
    let mut result = TreeValidationResult::new();

    let mut visited = HashSet::new();
    let mut alias_targets = Vec::new();
    walk(
        tree,
        PrefixTree::ROOT,
        0,
        &mut visited,
        &mut alias_targets,
        &mut result,
    );
    result.stats.nodes_visited = visited.len() as u32;

    for target in alias_targets {
        if target.index() >= tree.arena_len() {
            result
                .errors
                .push(format!("alias target {} is not a live node", target.index()));
        } else if !visited.contains(&target) {
            result.errors.push(format!(
                "alias target {} is not reachable through an owning path",
                target.index()
            ));
        }
    }

    check_numbering(tree, &mut result);

    if result.stats.cycle_detected {
        result
            .errors
            .push("owning-link cycle detected; traversal aborted".to_string());
    }

    result
}

fn walk(
    tree: &PrefixTree,
    id: NodeId,
    depth: u32,
    visited: &mut HashSet<NodeId>,
    alias_targets: &mut Vec<NodeId>,
    result: &mut TreeValidationResult,
) {
    if result.stats.cycle_detected {
        return;
    }
    // Owning links must form a tree: seeing a node twice means either a
    // cycle or two owners, both fatal for serialization.
    if !visited.insert(id) {
        result.stats.cycle_detected = true;
        return;
    }
    if depth > tree.bit_width() {
        result.errors.push(format!(
            "node {} sits at depth {}, beyond the {}-bit address width",
            id.index(),
            depth,
            tree.bit_width()
        ));
        return;
    }
    result.stats.max_depth = result.stats.max_depth.max(depth);

    for record in tree.node(id).records() {
        match record {
            Record::Empty => {}
            Record::Data(_) => result.stats.data_records += 1,
            Record::Reserved => result.stats.reserved_records += 1,
            Record::Alias(target) => {
                result.stats.alias_records += 1;
                alias_targets.push(*target);
            }
            Record::Node(child) | Record::FixedNode(child) => {
                if child.index() >= tree.arena_len() {
                    result.errors.push(format!(
                        "node {} links to arena slot {} which does not exist",
                        id.index(),
                        child.index()
                    ));
                } else {
                    walk(tree, *child, depth + 1, visited, alias_targets, result);
                }
            }
        }
    }
}

// Numbering is optional (the tree may not be finalized yet), but once any
// reachable node carries a number they all must, and the numbers must be
// consecutive in iteration order.
fn check_numbering(tree: &PrefixTree, result: &mut TreeValidationResult) {
    let numbers: Vec<Option<u32>> = tree.iter().map(|node| node.node_num()).collect();
    let assigned = numbers.iter().flatten().count();

    if assigned == 0 {
        return;
    }
    if assigned < numbers.len() {
        result.errors.push(format!(
            "{} of {} reachable nodes have no node number",
            numbers.len() - assigned,
            numbers.len()
        ));
        return;
    }

    let base = numbers[0].unwrap_or(0);
    for (offset, number) in numbers.iter().enumerate() {
        if *number != Some(base + offset as u32) {
            result.errors.push(format!(
                "node numbering is not contiguous at position {} (expected {}, found {:?})",
                offset,
                base + offset as u32,
                number
            ));
            return;
        }
    }
}
