//! Job Tree View - the dashboard's main table
//!
//! One row per visible node, indented by depth, with status, last build
//! time, result and duration columns. The active sort column carries an
//! arrow in the header.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
};

use crate::models::{JobStatus, SortConfig, SortKey};
use crate::tree::TreeRow;

const STATUS_WIDTH: usize = 12;
const TIMESTAMP_WIDTH: usize = 19;
const RESULT_WIDTH: usize = 12;
const DURATION_WIDTH: usize = 10;
const BUILD_WIDTH: usize = 7;

/// State for the job tree view
pub struct JobTreeView {
    /// Rows currently displayed
    pub rows: Vec<TreeRow>,
    /// Selected row index
    pub selected: usize,
    /// List widget state
    pub list_state: ListState,
}

impl Default for JobTreeView {
    fn default() -> Self {
        Self::new()
    }
}

impl JobTreeView {
    pub fn new() -> Self {
        let mut list_state = ListState::default();
        list_state.select(Some(0));
        Self {
            rows: Vec::new(),
            selected: 0,
            list_state,
        }
    }

    /// Replace the rows, keeping the same node selected when it is still shown.
    pub fn update_rows(&mut self, rows: Vec<TreeRow>) {
        let selected_path = self.selected_row().map(|row| row.node.full_path());
        self.rows = rows;

        if let Some(path) = selected_path {
            if let Some(idx) = self.rows.iter().position(|r| r.node.full_path() == path) {
                self.selected = idx;
            }
        }
        // Keep selection valid
        if self.selected >= self.rows.len() {
            self.selected = self.rows.len().saturating_sub(1);
        }
        self.list_state.select(Some(self.selected));
    }

    /// Move selection down
    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.rows.len() - 1);
        self.list_state.select(Some(self.selected));
    }

    /// Move selection up
    pub fn select_previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = self.selected.saturating_sub(1);
        self.list_state.select(Some(self.selected));
    }

    /// Jump to top
    pub fn select_first(&mut self) {
        self.selected = 0;
        self.list_state.select(Some(0));
    }

    /// Jump to bottom
    pub fn select_last(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = self.rows.len() - 1;
        self.list_state.select(Some(self.selected));
    }

    pub fn selected_row(&self) -> Option<&TreeRow> {
        self.rows.get(self.selected)
    }

    /// Render the view
    pub fn render(&mut self, frame: &mut Frame, area: Rect, sort: Option<SortConfig>, empty_text: &str) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!(" Jobs ({}) ", self.rows.len()));

        if self.rows.is_empty() {
            let empty = Paragraph::new(empty_text.to_string())
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(empty, area);
            return;
        }

        let inner = block.inner(area);
        frame.render_widget(block, area);
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let fixed =
            3 + STATUS_WIDTH + TIMESTAMP_WIDTH + RESULT_WIDTH + DURATION_WIDTH + BUILD_WIDTH + 5;
        let name_width = (inner.width as usize).saturating_sub(fixed).max(10);

        frame.render_widget(Paragraph::new(header_line(sort, name_width)), chunks[0]);

        let items: Vec<ListItem> = self
            .rows
            .iter()
            .enumerate()
            .map(|(idx, row)| {
                let style = if idx == self.selected {
                    Style::default().bg(Color::DarkGray)
                } else {
                    Style::default()
                };
                ListItem::new(row_line(row, idx == self.selected, name_width)).style(style)
            })
            .collect();

        let list = List::new(items);
        frame.render_stateful_widget(list, chunks[1], &mut self.list_state);
    }
}

fn header_line(sort: Option<SortConfig>, name_width: usize) -> Line<'static> {
    let title = |key: SortKey, label: &str| -> String {
        match sort {
            Some(s) if s.key == key => format!("{} {}", label, s.direction.arrow()),
            _ => label.to_string(),
        }
    };
    let style = Style::default().add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::raw("   "),
        Span::styled(pad(&title(SortKey::Name, "1 Name"), name_width), style),
        Span::raw(" "),
        Span::styled(pad(&title(SortKey::Status, "2 Status"), STATUS_WIDTH), style),
        Span::raw(" "),
        Span::styled(
            pad(&title(SortKey::LastBuildTimestamp, "3 Last Build"), TIMESTAMP_WIDTH),
            style,
        ),
        Span::raw(" "),
        Span::styled(pad(&title(SortKey::LastBuildResult, "4 Result"), RESULT_WIDTH), style),
        Span::raw(" "),
        Span::styled(
            pad(&title(SortKey::LastBuildDuration, "5 Duration"), DURATION_WIDTH),
            style,
        ),
        Span::raw(" "),
        Span::styled(format!("{:>width$}", "Build", width = BUILD_WIDTH), style),
    ])
}

fn row_line(row: &TreeRow, selected: bool, name_width: usize) -> Line<'static> {
    let node = &row.node;
    let marker = if selected { ">" } else { " " };
    let indent = "  ".repeat(row.depth);

    if node.is_folder {
        let arrow = if node.expanded { "▼" } else { "▶" };
        let name = format!("{}{} {} ({})", indent, arrow, node.name, node.children.len());
        return Line::from(vec![
            Span::raw(format!(" {} ", marker)),
            Span::styled(
                pad(&name, name_width),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
        ]);
    }

    let name = format!("{}  {}", indent, node.name);
    let (timestamp, result, duration, number) = match node.last_build {
        Some(ref b) => (
            b.display_timestamp(),
            b.display_result().to_string(),
            b.display_duration(),
            format!("#{}", b.number),
        ),
        None => (
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
            String::new(),
        ),
    };

    Line::from(vec![
        Span::raw(format!(" {} ", marker)),
        Span::raw(pad(&name, name_width)),
        Span::raw(" "),
        Span::styled(
            pad(node.status.label(), STATUS_WIDTH),
            Style::default().fg(status_color(node.status)),
        ),
        Span::raw(" "),
        Span::raw(pad(&timestamp, TIMESTAMP_WIDTH)),
        Span::raw(" "),
        Span::raw(pad(&result, RESULT_WIDTH)),
        Span::raw(" "),
        Span::styled(
            pad(&duration, DURATION_WIDTH),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::raw(format!("{:>width$}", number, width = BUILD_WIDTH)),
    ])
}

/// Colour for a status badge.
pub fn status_color(status: JobStatus) -> Color {
    match status {
        JobStatus::Success => Color::Green,
        JobStatus::Failure => Color::Red,
        JobStatus::InProgress => Color::Blue,
        JobStatus::Unstable => Color::Yellow,
        JobStatus::Disabled | JobStatus::Unknown => Color::DarkGray,
    }
}

/// Left-align `text` in `width` columns, truncating with `...`.
fn pad(text: &str, width: usize) -> String {
    let len = text.chars().count();
    if len <= width {
        format!("{:<width$}", text, width = width)
    } else if width <= 3 {
        text.chars().take(width).collect()
    } else {
        let mut out: String = text.chars().take(width - 3).collect();
        out.push_str("...");
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::test_support::sample_tree;
    use crate::tree::visible_rows;

    #[test]
    fn test_pad_truncates_by_chars() {
        assert_eq!(pad("abc", 5), "abc  ");
        assert_eq!(pad("abcdefgh", 6), "abc...");
        assert_eq!(pad("▼ déjà-vu", 5), "▼ ...");
    }

    #[test]
    fn test_navigation_clamps() {
        let mut view = JobTreeView::new();
        view.select_next();
        assert_eq!(view.selected, 0);

        view.update_rows(visible_rows(&sample_tree()));
        view.select_last();
        let last = view.rows.len() - 1;
        assert_eq!(view.selected, last);
        view.select_next();
        assert_eq!(view.selected, last);
        view.select_first();
        view.select_previous();
        assert_eq!(view.selected, 0);
    }

    #[test]
    fn test_selection_follows_node_across_updates() {
        let tree = sample_tree();
        let mut view = JobTreeView::new();
        view.update_rows(visible_rows(&tree));
        view.select_last();
        let name = view.selected_row().unwrap().node.name.clone();

        // Same rows in reverse order: the selected node moves to the top
        let mut reversed = visible_rows(&tree);
        reversed.reverse();
        view.update_rows(reversed);
        assert_eq!(view.selected, 0);
        assert_eq!(view.selected_row().unwrap().node.name, name);
    }

    #[test]
    fn test_selection_clamped_when_rows_shrink() {
        let mut view = JobTreeView::new();
        view.update_rows(visible_rows(&sample_tree()));
        view.select_last();
        view.update_rows(Vec::new());
        assert_eq!(view.selected, 0);
        assert!(view.selected_row().is_none());
    }

    fn line_text(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_job_row_shows_build_number() {
        use crate::tree::test_support::{job, job_with};

        let built = TreeRow {
            depth: 0,
            node: job_with("deploy", &[], JobStatus::Success, 1000, Some("SUCCESS"), 65000),
        };
        let text = line_text(&row_line(&built, false, 20));
        assert!(text.ends_with("     #1"));
        assert!(text.contains("1m 5s"));

        let never_built = TreeRow {
            depth: 0,
            node: job("fresh", &[]),
        };
        assert!(!line_text(&row_line(&never_built, false, 20)).contains('#'));
    }

    #[test]
    fn test_header_marks_active_sort() {
        let sort = SortConfig {
            key: SortKey::Status,
            direction: crate::models::SortDirection::Descending,
        };
        let line = header_line(Some(sort), 20);
        let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
        assert!(text.contains("2 Status ↓"));
        assert!(!text.contains("1 Name ↑"));
    }
}
