//! Per-level sorting that keeps folders grouped first.
//!
//! At every level, folders are ordered by name ascending regardless of the
//! requested key or direction; jobs follow, ordered by the requested key.
//! Folder contents are sorted recursively with the same key and direction.

use std::cmp::Ordering;
use std::sync::Arc;

use crate::models::{JobList, JobNode, SortDirection, SortKey};

/// Sort `tree` by `key` and `direction`. Expansion state is untouched.
pub fn sort(tree: &[Arc<JobNode>], key: SortKey, direction: SortDirection) -> JobList {
    let (mut folders, mut jobs): (JobList, JobList) =
        tree.iter().cloned().partition(|node| node.is_folder);

    folders.sort_by(|a, b| a.name.cmp(&b.name));
    jobs.sort_by(|a, b| {
        let ordering = compare(a, b, key);
        match direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    });

    folders
        .into_iter()
        .map(|node| {
            let children = sort(&node.children, key, direction);
            Arc::new(JobNode {
                children,
                ..JobNode::clone(&node)
            })
        })
        .chain(jobs)
        .collect()
}

/// Ascending comparison of two nodes by `key`.
///
/// Timestamps and durations compare numerically with missing values as 0;
/// name, status and result compare as case-sensitive strings with missing
/// values as the empty string.
pub fn compare(a: &JobNode, b: &JobNode, key: SortKey) -> Ordering {
    match key {
        SortKey::Name => a.name.cmp(&b.name),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        SortKey::LastBuildTimestamp => timestamp(a).cmp(&timestamp(b)),
        SortKey::LastBuildDuration => duration(a).cmp(&duration(b)),
        SortKey::LastBuildResult => result(a).cmp(result(b)),
    }
}

fn timestamp(node: &JobNode) -> i64 {
    node.last_build.as_ref().map_or(0, |b| b.timestamp)
}

fn duration(node: &JobNode) -> u64 {
    node.last_build.as_ref().map_or(0, |b| b.duration)
}

fn result(node: &JobNode) -> &str {
    node.last_build
        .as_ref()
        .and_then(|b| b.result.as_deref())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::JobStatus;
    use crate::tree::test_support::*;

    #[test]
    fn test_folders_alphabetical_and_first() {
        let tree = vec![
            folder("b-folder", &[], vec![], true),
            job("z-job", &[]),
            folder("a-folder", &[], vec![], true),
        ];
        let sorted = sort(&tree, SortKey::Name, SortDirection::Ascending);
        assert_eq!(names(&sorted), vec!["a-folder", "b-folder", "z-job"]);
    }

    #[test]
    fn test_folder_order_ignores_direction() {
        let tree = vec![
            folder("b-folder", &[], vec![], true),
            job("a-job", &[]),
            job("z-job", &[]),
            folder("a-folder", &[], vec![], true),
        ];
        let sorted = sort(&tree, SortKey::Name, SortDirection::Descending);
        assert_eq!(names(&sorted), vec!["a-folder", "b-folder", "z-job", "a-job"]);
    }

    #[test]
    fn test_numeric_keys_treat_missing_as_zero() {
        let tree = vec![
            job_with("slow", &[], JobStatus::Success, 300, Some("SUCCESS"), 9_000),
            job("never-built", &[]),
            job_with("fast", &[], JobStatus::Success, 200, Some("SUCCESS"), 1_000),
        ];

        let by_duration = sort(&tree, SortKey::LastBuildDuration, SortDirection::Ascending);
        assert_eq!(names(&by_duration), vec!["never-built", "fast", "slow"]);

        let by_time = sort(&tree, SortKey::LastBuildTimestamp, SortDirection::Descending);
        assert_eq!(names(&by_time), vec!["slow", "fast", "never-built"]);
    }

    #[test]
    fn test_result_key_treats_running_as_empty() {
        let tree = vec![
            job_with("ok", &[], JobStatus::Success, 1, Some("SUCCESS"), 1),
            job_with("running", &[], JobStatus::InProgress, 1, None, 0),
            job_with("broken", &[], JobStatus::Failure, 1, Some("FAILURE"), 1),
        ];
        let sorted = sort(&tree, SortKey::LastBuildResult, SortDirection::Ascending);
        assert_eq!(names(&sorted), vec!["running", "broken", "ok"]);
    }

    #[test]
    fn test_status_key_uses_canonical_names() {
        let tree = vec![
            job_with("u", &[], JobStatus::Unknown, 0, None, 0),
            job_with("s", &[], JobStatus::Success, 0, None, 0),
            job_with("f", &[], JobStatus::Failure, 0, None, 0),
        ];
        let sorted = sort(&tree, SortKey::Status, SortDirection::Ascending);
        assert_eq!(names(&sorted), vec!["f", "s", "u"]);
    }

    #[test]
    fn test_name_compare_is_case_sensitive() {
        let tree = vec![job("beta", &[]), job("Alpha", &[]), job("alpha", &[])];
        let sorted = sort(&tree, SortKey::Name, SortDirection::Ascending);
        assert_eq!(names(&sorted), vec!["Alpha", "alpha", "beta"]);
    }

    #[test]
    fn test_recurses_into_folders() {
        let tree = vec![folder(
            "f",
            &[],
            vec![job("z", &["f"]), folder("inner", &["f"], vec![], false), job("a", &["f"])],
            false,
        )];
        let sorted = sort(&tree, SortKey::Name, SortDirection::Ascending);
        assert_eq!(names(&sorted[0].children), vec!["inner", "a", "z"]);
        // Expansion state untouched
        assert!(!sorted[0].expanded);
        assert!(!sorted[0].children[0].expanded);
    }

    #[test]
    fn test_ties_keep_original_order_in_both_directions() {
        let tree = vec![
            job_with("first", &[], JobStatus::Success, 5, None, 0),
            job_with("second", &[], JobStatus::Success, 5, None, 0),
        ];
        let asc = sort(&tree, SortKey::LastBuildTimestamp, SortDirection::Ascending);
        let desc = sort(&tree, SortKey::LastBuildTimestamp, SortDirection::Descending);
        assert_eq!(names(&asc), vec!["first", "second"]);
        assert_eq!(names(&desc), vec!["first", "second"]);
    }

    #[test]
    fn test_sort_is_idempotent() {
        let tree = sample_tree();
        for key in SortKey::ALL {
            for direction in [SortDirection::Ascending, SortDirection::Descending] {
                let once = sort(&tree, key, direction);
                let twice = sort(&once, key, direction);
                assert_eq!(once, twice, "key={key} direction={direction:?}");
            }
        }
    }
}
