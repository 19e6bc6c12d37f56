use chrono::{DateTime, Local, Utc};
use serde::Serialize;

use super::CommandResult;
use crate::Result;
use crate::models::{JobList, SortConfig};
use crate::refresh::{RefreshPhase, refresh_once};
use crate::source::{JobSource, SourceMode};
use crate::tree::{
    self, NormalizeOptions, SkippedRecord, StatusCounts, TreeRow, all_rows, visible_rows,
};

/// View operations applied after loading, in dashboard order:
/// collapse, search, folder toggles, then sort.
#[derive(Debug, Clone, Default)]
pub struct JobsOptions {
    pub query: Option<String>,
    pub sort: Option<SortConfig>,
    /// Slash-separated folder paths to toggle, applied in order
    pub toggles: Vec<String>,
    /// Collapse every folder before searching
    pub collapsed: bool,
    /// Ignore expansion when printing
    pub flat: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobsResult {
    pub source: String,
    pub phase: RefreshPhase,
    pub mode: SourceMode,
    pub test_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_updated: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortConfig>,
    /// Tallies over the whole loaded tree, before search
    pub counts: StatusCounts,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
    pub jobs: JobList,
    #[serde(skip)]
    flat: bool,
}

impl JobsResult {
    /// Rows as printed: visible rows, or every node with `--flat`.
    pub fn rows(&self) -> Vec<TreeRow> {
        if self.flat {
            all_rows(&self.jobs)
        } else {
            visible_rows(&self.jobs)
        }
    }
}

impl CommandResult for JobsResult {
    fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!(r#"{{"error": "{}"}}"#, e))
    }

    fn to_human(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Source: {} ({})", self.source, self.mode));
        let updated = self
            .last_updated
            .map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        let badge = if self.test_mode { "  [TEST MODE]" } else { "" };
        lines.push(format!(
            "Status: {}  Last updated: {}{}",
            self.phase, updated, badge
        ));
        if let Some(ref error) = self.error {
            lines.push(format!("Warning: {}", error));
        }

        let c = &self.counts;
        lines.push(format!(
            "{} jobs in {} folders: {} success, {} failure, {} in progress, {} unstable, {} disabled, {} unknown",
            c.jobs, c.folders, c.success, c.failure, c.in_progress, c.unstable, c.disabled, c.unknown
        ));
        if let Some(sort) = self.sort {
            lines.push(format!("Sorted by {} {}", sort.key, sort.direction.arrow()));
        }
        lines.push(String::new());

        let rows = self.rows();
        if rows.is_empty() {
            match self.query {
                Some(ref q) => lines.push(format!("No jobs match \"{}\".", q)),
                None => lines.push("No jobs.".to_string()),
            }
        }
        for row in &rows {
            lines.push(format_row(row));
        }

        if !self.skipped.is_empty() {
            lines.push(String::new());
            lines.push(format!(
                "Skipped {} malformed record(s):",
                self.skipped.len()
            ));
            for skipped in &self.skipped {
                lines.push(format!("  {}: {}", skipped.location(), skipped.reason));
            }
        }

        lines.join("\n")
    }
}

fn format_row(row: &TreeRow) -> String {
    let indent = "  ".repeat(row.depth);
    let node = &row.node;
    if node.is_folder {
        let marker = if node.expanded { "▼" } else { "▶" };
        return format!(
            "{}{} {}/ ({} items)",
            indent,
            marker,
            node.name,
            node.children.len()
        );
    }

    let build = match node.last_build {
        Some(ref b) => format!(
            "#{} {} {} {}",
            b.number,
            b.display_result(),
            b.display_duration(),
            b.display_timestamp()
        ),
        None => "no builds".to_string(),
    };
    format!(
        "{}• {} [{}] {}",
        indent,
        node.name,
        node.status.label(),
        build
    )
}

/// Run one refresh cycle against `source` and apply the view operations.
///
/// Source failures do not fail the command: the result carries the baseline
/// dataset, `phase: failed` and the error message, as the dashboard would.
pub async fn jobs<S: JobSource>(
    source: &S,
    mode: SourceMode,
    normalize: NormalizeOptions,
    view: &JobsOptions,
) -> Result<JobsResult> {
    let snapshot = refresh_once(source, mode, normalize).await;

    let mut tree = snapshot.jobs.clone();
    if view.collapsed {
        tree = tree::set_all_expanded(&tree, false);
    }

    let query = view
        .query
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());
    if let Some(q) = query {
        tree = tree::filter(&tree, q);
    }

    // Toggles apply to the search results
    for raw in &view.toggles {
        let path = tree::parse_path(raw);
        if path.is_empty() {
            return Err(crate::Error::InvalidInput(format!(
                "empty folder path: {:?}",
                raw
            )));
        }
        match tree::find(&tree, &path) {
            Some(node) if node.is_folder => tree = tree::toggle_expansion(&tree, &path),
            _ => tracing::warn!(path = %raw, "no folder at path, ignoring toggle"),
        }
    }

    if let Some(sort) = view.sort {
        tree = tree::sort(&tree, sort.key, sort.direction);
    }

    Ok(JobsResult {
        source: match snapshot.mode {
            SourceMode::Baseline => "baseline".to_string(),
            SourceMode::Live => source.describe(),
        },
        phase: snapshot.phase,
        mode: snapshot.mode,
        test_mode: snapshot.test_mode,
        error: snapshot.error.clone(),
        last_updated: snapshot.last_updated,
        query: query.map(str::to_string),
        sort: view.sort,
        counts: StatusCounts::of(&snapshot.jobs),
        skipped: snapshot.skipped.clone(),
        jobs: tree,
        flat: view.flat,
    })
}
