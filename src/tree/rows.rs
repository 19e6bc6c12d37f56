//! Flattening the tree into display rows.

use std::sync::Arc;

use serde::Serialize;

use crate::models::{JobNode, JobStatus};

/// One visible line of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    /// Indentation level (root nodes are at 0)
    pub depth: usize,
    pub node: Arc<JobNode>,
}

/// Depth-first rows, descending only into expanded folders.
pub fn visible_rows(tree: &[Arc<JobNode>]) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    push_rows(tree, 0, true, &mut rows);
    rows
}

/// Depth-first rows for every node, ignoring expansion state.
pub fn all_rows(tree: &[Arc<JobNode>]) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    push_rows(tree, 0, false, &mut rows);
    rows
}

fn push_rows(tree: &[Arc<JobNode>], depth: usize, respect_expanded: bool, rows: &mut Vec<TreeRow>) {
    for node in tree {
        rows.push(TreeRow {
            depth,
            node: Arc::clone(node),
        });
        if node.is_folder && (node.expanded || !respect_expanded) {
            push_rows(&node.children, depth + 1, respect_expanded, rows);
        }
    }
}

/// Status tallies over all jobs in a tree (folders counted separately).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusCounts {
    pub folders: usize,
    pub jobs: usize,
    pub success: usize,
    pub failure: usize,
    pub in_progress: usize,
    pub disabled: usize,
    pub unstable: usize,
    pub unknown: usize,
}

impl StatusCounts {
    pub fn of(tree: &[Arc<JobNode>]) -> Self {
        let mut counts = Self::default();
        counts.add_all(tree);
        counts
    }

    fn add_all(&mut self, tree: &[Arc<JobNode>]) {
        for node in tree {
            if node.is_folder {
                self.folders += 1;
                self.add_all(&node.children);
                continue;
            }
            self.jobs += 1;
            match node.status {
                JobStatus::Success => self.success += 1,
                JobStatus::Failure => self.failure += 1,
                JobStatus::InProgress => self.in_progress += 1,
                JobStatus::Disabled => self.disabled += 1,
                JobStatus::Unstable => self.unstable += 1,
                JobStatus::Unknown => self.unknown += 1,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::parse_path;
    use crate::tree::test_support::*;
    use crate::tree::toggle_expansion;

    fn row_names(rows: &[TreeRow]) -> Vec<(usize, &str)> {
        rows.iter().map(|r| (r.depth, r.node.name.as_str())).collect()
    }

    #[test]
    fn test_visible_rows_expanded() {
        let rows = visible_rows(&sample_tree());
        assert_eq!(
            row_names(&rows),
            vec![
                (0, "backend"),
                (1, "api-service"),
                (1, "database-service"),
                (1, "microservices"),
                (2, "auth-service"),
                (0, "nightly-build"),
            ]
        );
    }

    #[test]
    fn test_visible_rows_skip_collapsed_folder() {
        let tree = toggle_expansion(&sample_tree(), &parse_path("backend"));
        let rows = visible_rows(&tree);
        assert_eq!(row_names(&rows), vec![(0, "backend"), (0, "nightly-build")]);

        // all_rows ignores expansion
        assert_eq!(all_rows(&tree).len(), 6);
    }

    #[test]
    fn test_status_counts() {
        let tree = vec![
            folder(
                "f",
                &[],
                vec![
                    job_with("a", &["f"], JobStatus::Success, 0, None, 0),
                    job_with("b", &["f"], JobStatus::Failure, 0, None, 0),
                ],
                true,
            ),
            job("c", &[]),
        ];
        let counts = StatusCounts::of(&tree);
        assert_eq!(counts.folders, 1);
        assert_eq!(counts.jobs, 3);
        assert_eq!(counts.success, 1);
        assert_eq!(counts.failure, 1);
        assert_eq!(counts.unknown, 1);
    }
}
