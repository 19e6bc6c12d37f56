//! Search filter over the job tree.
//!
//! A node survives if its name contains the query (case-insensitive), or if it
//! is a folder with a surviving descendant. Surviving folders come back
//! expanded so that matches are visible without manual expansion.

use std::sync::Arc;

use crate::models::{JobList, JobNode};

/// Filter `tree` by `query`.
///
/// A blank query returns the tree unchanged, expansion state included.
/// Order is preserved; filtering never reorders siblings.
pub fn filter(tree: &[Arc<JobNode>], query: &str) -> JobList {
    let query = query.trim();
    if query.is_empty() {
        return tree.to_vec();
    }
    filter_level(tree, &query.to_lowercase())
}

/// Whether a node's own name contains the (already lowercased) needle.
pub fn name_matches(node: &JobNode, needle: &str) -> bool {
    node.name.to_lowercase().contains(needle)
}

fn filter_level(tree: &[Arc<JobNode>], needle: &str) -> JobList {
    let mut result = Vec::new();

    for node in tree {
        let matches = name_matches(node, needle);

        if node.is_folder {
            let children = filter_level(&node.children, needle);
            if matches || !children.is_empty() {
                result.push(Arc::new(JobNode {
                    name: node.name.clone(),
                    url: node.url.clone(),
                    status: node.status,
                    is_folder: true,
                    path: node.path.clone(),
                    expanded: true,
                    children,
                    last_build: node.last_build.clone(),
                }));
            }
        } else if matches {
            result.push(Arc::clone(node));
        }
    }

    result
}
