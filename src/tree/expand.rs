//! Folder expansion state.
//!
//! Folders are addressed by their full path (ancestor names plus own name).
//! A path that no longer resolves, e.g. because a refresh replaced the tree
//! between render and keypress, is a silent no-op.

use std::collections::HashMap;
use std::sync::Arc;

use crate::models::{JobList, JobNode};

/// Flip `expanded` on the folder at `target_path`.
///
/// Only the nodes along the path are rebuilt; every other subtree, including
/// the toggled folder's children, is shared with the input.
pub fn toggle_expansion(tree: &[Arc<JobNode>], target_path: &[String]) -> JobList {
    match toggle_level(tree, target_path) {
        Some(updated) => updated,
        None => {
            tracing::debug!(path = ?target_path, "folder path did not resolve, ignoring toggle");
            tree.to_vec()
        }
    }
}

fn toggle_level(tree: &[Arc<JobNode>], path: &[String]) -> Option<JobList> {
    let (head, rest) = path.split_first()?;

    for (idx, node) in tree.iter().enumerate() {
        if !node.is_folder || node.name != *head {
            continue;
        }

        let replacement = if rest.is_empty() {
            JobNode {
                expanded: !node.expanded,
                ..JobNode::clone(node)
            }
        } else {
            // A duplicate sibling may hold the rest of the path
            let Some(children) = toggle_level(&node.children, rest) else {
                continue;
            };
            JobNode {
                children,
                ..JobNode::clone(node)
            }
        };

        let mut updated = tree.to_vec();
        updated[idx] = Arc::new(replacement);
        return Some(updated);
    }

    None
}

/// Set `expanded` on every folder in the tree.
pub fn set_all_expanded(tree: &[Arc<JobNode>], expanded: bool) -> JobList {
    tree.iter()
        .map(|node| {
            if node.is_folder {
                Arc::new(JobNode {
                    expanded,
                    children: set_all_expanded(&node.children, expanded),
                    ..JobNode::clone(node)
                })
            } else {
                Arc::clone(node)
            }
        })
        .collect()
}

/// Expansion flags of every folder, keyed by full path.
pub fn expansion_state(tree: &[Arc<JobNode>]) -> HashMap<Vec<String>, bool> {
    let mut state = HashMap::new();
    collect_expansion(tree, &mut state);
    state
}

fn collect_expansion(tree: &[Arc<JobNode>], state: &mut HashMap<Vec<String>, bool>) {
    for node in tree.iter().filter(|node| node.is_folder) {
        state.insert(node.full_path(), node.expanded);
        collect_expansion(&node.children, state);
    }
}

/// Re-apply the expansion flags of `previous` onto a freshly loaded tree.
///
/// Folders that did not exist before keep the flag they were loaded with.
pub fn carry_expansion(previous: &[Arc<JobNode>], fresh: &[Arc<JobNode>]) -> JobList {
    let state = expansion_state(previous);
    if state.is_empty() {
        return fresh.to_vec();
    }
    apply_expansion(fresh, &state)
}

fn apply_expansion(tree: &[Arc<JobNode>], state: &HashMap<Vec<String>, bool>) -> JobList {
    tree.iter()
        .map(|node| {
            if !node.is_folder {
                return Arc::clone(node);
            }
            let expanded = state
                .get(&node.full_path())
                .copied()
                .unwrap_or(node.expanded);
            Arc::new(JobNode {
                expanded,
                children: apply_expansion(&node.children, state),
                ..JobNode::clone(node)
            })
        })
        .collect()
}
