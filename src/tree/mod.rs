//! Operations over the canonical job tree.
//!
//! Every operation here is a pure function: it takes a tree by reference and
//! returns a new `JobList`, sharing untouched subtrees through `Arc`.
//!
//! - [`normalize`] - external records into `JobNode`s with paths and folder flags
//! - [`filter`] - case-insensitive name search that keeps matching ancestors
//! - [`sort`] - per-level ordering, folders first
//! - [`expand`] - folder expand/collapse addressed by path
//! - [`rows`] - flattening into display rows and status summaries

pub mod expand;
pub mod filter;
pub mod normalize;
pub mod rows;
pub mod sort;

pub use expand::{carry_expansion, set_all_expanded, toggle_expansion};
pub use filter::filter;
pub use normalize::{
    MalformedPolicy, MalformedReason, NormalizeOptions, NormalizeReport, SkippedRecord, normalize,
    normalize_with,
};
pub use rows::{StatusCounts, TreeRow, all_rows, visible_rows};
pub use sort::sort;

use std::sync::Arc;

use crate::models::JobNode;

/// Locate a node by its full path (ancestors plus own name).
///
/// With duplicate sibling names the first node that resolves the whole
/// path wins.
pub fn find<'a>(tree: &'a [Arc<JobNode>], path: &[String]) -> Option<&'a Arc<JobNode>> {
    let (head, rest) = path.split_first()?;
    tree.iter()
        .filter(|node| node.name == *head)
        .find_map(|node| {
            if rest.is_empty() {
                Some(node)
            } else {
                find(&node.children, rest)
            }
        })
}

/// Split a slash-separated folder path (`backend/microservices`) into segments.
pub fn parse_path(path: &str) -> Vec<String> {
    path.split('/')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}
