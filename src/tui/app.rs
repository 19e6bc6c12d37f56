//! TUI Application - main event loop and terminal management
//!
//! The refresh task runs in the background and publishes snapshots; this
//! module owns the view state layered on top of them: folder expansion,
//! search query, sort order and selection. A new snapshot never resets that
//! state: expansion is carried over by folder path.

use std::io::{self, stdout};
use std::time::Duration;

use chrono::Local;
use crossterm::{
    ExecutableCommand,
    event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures::StreamExt;
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph},
};

use super::notifications::NotificationManager;
use super::views::JobTreeView;
use crate::models::{JobList, SortConfig, SortKey};
use crate::refresh::{self, DashboardSnapshot, RefreshHandle, RefreshPhase, RefreshSettings};
use crate::source::JobSource;
use crate::tree::{self, StatusCounts};

/// Redraw cadence while idle (toast expiry, clock).
const TICK: Duration = Duration::from_millis(250);

/// Something the app needs the refresh task to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppRequest {
    Refresh,
    ToggleMode,
}

/// An expansion change made while a search is active.
///
/// Search results show every matching folder open, so these are replayed on
/// top of the filtered tree rather than stored in the working tree.
#[derive(Debug, Clone, PartialEq, Eq)]
enum SearchEdit {
    Toggle(Vec<String>),
    SetAll(bool),
}

/// Keyboard input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputMode {
    Normal,
    Search,
}

/// TUI Application state
pub struct TuiApp {
    /// Source description for the title bar
    source: String,
    /// Latest snapshot from the refresh task
    snapshot: DashboardSnapshot,
    /// Working tree: snapshot jobs with the user's expansion applied
    jobs: JobList,
    query: String,
    /// Expansion edits for the current query, in order
    search_edits: Vec<SearchEdit>,
    sort: Option<SortConfig>,
    input_mode: InputMode,
    view: JobTreeView,
    notifications: NotificationManager,
    should_quit: bool,
    /// Last key pressed (for gg detection)
    last_key: Option<KeyCode>,
}

impl TuiApp {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            snapshot: DashboardSnapshot::default(),
            jobs: Vec::new(),
            query: String::new(),
            search_edits: Vec::new(),
            sort: None,
            input_mode: InputMode::Normal,
            view: JobTreeView::new(),
            notifications: NotificationManager::new(),
            should_quit: false,
            last_key: None,
        }
    }

    /// Take in a published snapshot.
    fn apply_snapshot(&mut self, snapshot: DashboardSnapshot) {
        let settled = snapshot.phase != RefreshPhase::Loading;
        let new_result = settled
            && (snapshot.generation != self.snapshot.generation
                || self.snapshot.phase == RefreshPhase::Loading);

        if new_result {
            self.jobs = if self.jobs.is_empty() {
                snapshot.jobs.clone()
            } else {
                tree::carry_expansion(&self.jobs, &snapshot.jobs)
            };

            match (snapshot.phase, &snapshot.error) {
                (RefreshPhase::Failed, Some(message)) => self.notifications.error(message.clone()),
                (_, Some(message)) => self.notifications.warning(message.clone()),
                _ => {}
            }
            if !snapshot.skipped.is_empty() {
                self.notifications.warning(format!(
                    "Skipped {} malformed job record(s)",
                    snapshot.skipped.len()
                ));
            }
        }

        self.snapshot = snapshot;
        if new_result {
            self.rebuild_rows();
        }
    }

    fn searching(&self) -> bool {
        !self.query.trim().is_empty()
    }

    /// Derive displayed rows: search, then sort, then flatten.
    fn rebuild_rows(&mut self) {
        let mut shown = if self.searching() {
            let mut filtered = tree::filter(&self.jobs, &self.query);
            for edit in &self.search_edits {
                filtered = match edit {
                    SearchEdit::Toggle(path) => tree::toggle_expansion(&filtered, path),
                    SearchEdit::SetAll(expanded) => tree::set_all_expanded(&filtered, *expanded),
                };
            }
            filtered
        } else {
            self.jobs.clone()
        };
        if let Some(sort) = self.sort {
            shown = tree::sort(&shown, sort.key, sort.direction);
        }
        self.view.update_rows(tree::visible_rows(&shown));
    }

    fn toggle_selected(&mut self) {
        let Some(row) = self.view.selected_row() else {
            return;
        };
        if !row.node.is_folder {
            return;
        }
        let path = row.node.full_path();
        if self.searching() {
            let edit = SearchEdit::Toggle(path);
            // A second toggle of the same folder cancels the first
            match self.search_edits.last() {
                Some(last) if *last == edit => {
                    self.search_edits.pop();
                }
                _ => self.search_edits.push(edit),
            }
        } else {
            self.jobs = tree::toggle_expansion(&self.jobs, &path);
        }
        self.rebuild_rows();
    }

    fn set_all_expanded(&mut self, expanded: bool) {
        if self.searching() {
            self.search_edits.clear();
            self.search_edits.push(SearchEdit::SetAll(expanded));
        } else {
            self.jobs = tree::set_all_expanded(&self.jobs, expanded);
        }
        self.rebuild_rows();
    }

    /// A new query starts from a fully opened result.
    fn query_changed(&mut self) {
        self.search_edits.clear();
        self.rebuild_rows();
    }

    /// Column header semantics: same key while ascending flips, anything else
    /// starts ascending.
    fn request_sort(&mut self, key: SortKey) {
        self.sort = Some(SortConfig::request(self.sort, key));
        self.rebuild_rows();
    }

    fn cycle_sort(&mut self) {
        let key = self.sort.map(|s| s.key.next()).unwrap_or_default();
        self.sort = Some(SortConfig {
            key,
            direction: self.sort.map(|s| s.direction).unwrap_or_default(),
        });
        self.rebuild_rows();
    }

    fn reverse_sort(&mut self) {
        let current = self.sort.unwrap_or(SortConfig {
            key: SortKey::default(),
            direction: Default::default(),
        });
        self.sort = Some(SortConfig {
            key: current.key,
            direction: current.direction.reversed(),
        });
        self.rebuild_rows();
    }

    /// Handle keyboard events
    fn handle_key(&mut self, key: KeyEvent) -> Option<AppRequest> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return None;
        }
        match self.input_mode {
            InputMode::Search => {
                self.handle_search_key(key.code);
                None
            }
            InputMode::Normal => self.handle_normal_key(key.code),
        }
    }

    fn handle_search_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Enter => self.input_mode = InputMode::Normal,
            KeyCode::Esc => {
                self.input_mode = InputMode::Normal;
                self.query.clear();
                self.query_changed();
            }
            KeyCode::Backspace => {
                self.query.pop();
                self.query_changed();
            }
            KeyCode::Char(c) => {
                self.query.push(c);
                self.query_changed();
            }
            _ => {}
        }
    }

    fn handle_normal_key(&mut self, code: KeyCode) -> Option<AppRequest> {
        let mut request = None;
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Esc => {
                if self.query.is_empty() {
                    self.should_quit = true;
                } else {
                    self.query.clear();
                    self.query_changed();
                }
            }
            // Navigation
            KeyCode::Char('j') | KeyCode::Down => self.view.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.view.select_previous(),
            KeyCode::Char('g') => {
                // Check for gg sequence
                if self.last_key == Some(KeyCode::Char('g')) {
                    self.view.select_first();
                    self.last_key = None;
                    return None;
                }
            }
            KeyCode::Char('G') | KeyCode::End => self.view.select_last(),
            KeyCode::Home => self.view.select_first(),
            // Tree
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_selected(),
            KeyCode::Char('e') => self.set_all_expanded(true),
            KeyCode::Char('c') => self.set_all_expanded(false),
            // Search and sort
            KeyCode::Char('/') => self.input_mode = InputMode::Search,
            KeyCode::Char('s') => self.cycle_sort(),
            KeyCode::Char('S') => self.reverse_sort(),
            KeyCode::Char(c @ '1'..='5') => {
                let idx = c as usize - '1' as usize;
                self.request_sort(SortKey::ALL[idx]);
            }
            // Data
            KeyCode::Char('r') => request = Some(AppRequest::Refresh),
            KeyCode::Char('t') => request = Some(AppRequest::ToggleMode),
            KeyCode::Char('x') => self.notifications.dismiss_all(),
            _ => {}
        }
        self.last_key = Some(code);
        request
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let area = frame.area();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Title bar
                Constraint::Length(1), // Summary / search
                Constraint::Min(5),    // Job tree
                Constraint::Length(3), // Status bar
            ])
            .split(area);

        self.render_title_bar(frame, chunks[0]);
        self.render_summary(frame, chunks[1]);

        let empty_text = match self.snapshot.phase {
            RefreshPhase::Idle | RefreshPhase::Loading if self.jobs.is_empty() => {
                " Loading jobs...".to_string()
            }
            _ if !self.query.trim().is_empty() => format!(" No jobs match \"{}\"", self.query),
            _ => " No jobs".to_string(),
        };
        self.view.render(frame, chunks[2], self.sort, &empty_text);

        self.render_status_bar(frame, chunks[3]);
        self.notifications.render(frame, chunks[2]);
    }

    /// Render the title bar with refresh status
    fn render_title_bar(&self, frame: &mut Frame, area: Rect) {
        let (indicator, color, text) = match self.snapshot.phase {
            RefreshPhase::Idle => ("○", Color::DarkGray, "Starting".to_string()),
            RefreshPhase::Loading => ("○", Color::Yellow, "Refreshing...".to_string()),
            RefreshPhase::Loaded => {
                let at = self
                    .snapshot
                    .last_updated
                    .map(|t| t.with_timezone(&Local).format("%H:%M:%S").to_string())
                    .unwrap_or_else(|| "-".to_string());
                ("●", Color::Green, format!("Updated {}", at))
            }
            RefreshPhase::Failed => ("✗", Color::Red, "Load failed".to_string()),
        };
        let status_display = format!("[{}] {}", indicator, text);

        let badge = if self.snapshot.test_mode { " TEST MODE " } else { "" };
        let title_text = format!(" cimon | {}", self.source);
        let padding = area.width.saturating_sub(
            (title_text.chars().count() + badge.len() + status_display.chars().count()) as u16 + 4,
        );

        let title = Paragraph::new(Line::from(vec![
            Span::styled(title_text, Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" ".repeat(padding as usize)),
            Span::styled(badge, Style::default().fg(Color::Black).bg(Color::Yellow)),
            Span::raw(" "),
            Span::styled(status_display, Style::default().fg(color)),
        ]))
        .block(Block::default().borders(Borders::ALL));

        frame.render_widget(title, area);
    }

    /// Render the one-line summary, or the search prompt while searching
    fn render_summary(&self, frame: &mut Frame, area: Rect) {
        let line = if self.input_mode == InputMode::Search || !self.query.is_empty() {
            let cursor = if self.input_mode == InputMode::Search { "_" } else { "" };
            Line::from(vec![
                Span::styled(" Search: ", Style::default().fg(Color::Cyan)),
                Span::raw(format!("{}{}", self.query, cursor)),
            ])
        } else {
            let c = StatusCounts::of(&self.jobs);
            Line::from(vec![
                Span::raw(format!(" {} jobs  ", c.jobs)),
                Span::styled(format!("✓ {}  ", c.success), Style::default().fg(Color::Green)),
                Span::styled(format!("✗ {}  ", c.failure), Style::default().fg(Color::Red)),
                Span::styled(format!("◐ {}  ", c.in_progress), Style::default().fg(Color::Blue)),
                Span::styled(format!("! {}  ", c.unstable), Style::default().fg(Color::Yellow)),
                Span::styled(
                    format!("- {}", c.disabled + c.unknown),
                    Style::default().fg(Color::DarkGray),
                ),
            ])
        };
        frame.render_widget(Paragraph::new(line), area);
    }

    /// Render the status bar with keybindings
    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let text = match self.input_mode {
            InputMode::Search => " Type to search  Enter:Done  Esc:Clear",
            InputMode::Normal => {
                " j/k:Navigate  Enter:Open/Close  e/c:Expand/Collapse all  /:Search  1-5/s/S:Sort  r:Refresh  t:Test mode  q:Quit"
            }
        };
        let status = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(status, area);
    }
}

/// Setup the terminal for TUI mode
fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Restore the terminal to normal mode
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Run the dashboard until the user quits.
pub async fn run_tui<S: JobSource>(source: S, settings: RefreshSettings) -> crate::Result<()> {
    let mut app = TuiApp::new(source.describe());
    let handle = refresh::spawn(source, settings);

    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, &mut app, &handle).await;
    restore_terminal()?;

    handle.shutdown().await;
    result
}

async fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut TuiApp,
    handle: &RefreshHandle,
) -> crate::Result<()> {
    let mut snapshots = handle.subscribe();
    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(TICK);

    app.apply_snapshot(snapshots.borrow_and_update().clone());

    loop {
        terminal.draw(|f| app.render(f))?;

        tokio::select! {
            event = events.next() => {
                match event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        match app.handle_key(key) {
                            Some(AppRequest::Refresh) => handle.refresh(),
                            Some(AppRequest::ToggleMode) => handle.toggle_mode(),
                            None => {}
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => return Err(e.into()),
                    None => break,
                }
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    tracing::warn!("refresh task stopped unexpectedly");
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                app.apply_snapshot(snapshot);
            }
            _ = ticker.tick() => {
                app.notifications.cleanup();
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::test_support::sample_tree;
    use chrono::Utc;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn loaded(jobs: JobList, generation: u64) -> DashboardSnapshot {
        DashboardSnapshot {
            phase: RefreshPhase::Loaded,
            jobs,
            last_updated: Some(Utc::now()),
            generation,
            ..DashboardSnapshot::default()
        }
    }

    fn app_with_sample() -> TuiApp {
        let mut app = TuiApp::new("test");
        app.apply_snapshot(loaded(sample_tree(), 1));
        app
    }

    fn row_names(app: &TuiApp) -> Vec<String> {
        app.view.rows.iter().map(|r| r.node.name.clone()).collect()
    }

    #[test]
    fn test_snapshot_populates_rows() {
        let app = app_with_sample();
        assert_eq!(
            row_names(&app),
            vec![
                "backend",
                "api-service",
                "database-service",
                "microservices",
                "auth-service",
                "nightly-build"
            ]
        );
    }

    #[test]
    fn test_enter_toggles_selected_folder() {
        let mut app = app_with_sample();
        // "backend" is selected
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(row_names(&app), vec!["backend", "nightly-build"]);
        app.handle_key(press(KeyCode::Char(' ')));
        assert_eq!(row_names(&app).len(), 6);
    }

    #[test]
    fn test_enter_on_job_does_nothing() {
        let mut app = app_with_sample();
        app.handle_key(press(KeyCode::Char('j')));
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(row_names(&app).len(), 6);
    }

    #[test]
    fn test_expansion_survives_refresh() {
        let mut app = app_with_sample();
        app.handle_key(press(KeyCode::Enter));
        app.apply_snapshot(loaded(sample_tree(), 2));
        assert_eq!(row_names(&app), vec!["backend", "nightly-build"]);
    }

    #[test]
    fn test_search_mode_filters_as_you_type() {
        let mut app = app_with_sample();
        app.handle_key(press(KeyCode::Char('/')));
        for c in "AUTH".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        assert_eq!(
            row_names(&app),
            vec!["backend", "microservices", "auth-service"]
        );

        // 'q' is text while searching
        app.handle_key(press(KeyCode::Char('q')));
        assert!(!app.should_quit);
        assert!(app.view.rows.is_empty());

        app.handle_key(press(KeyCode::Esc));
        assert!(app.query.is_empty());
        assert_eq!(row_names(&app).len(), 6);
    }

    #[test]
    fn test_sort_keys() {
        let mut app = app_with_sample();
        app.handle_key(press(KeyCode::Char('1')));
        assert_eq!(
            app.sort,
            Some(SortConfig {
                key: SortKey::Name,
                direction: crate::models::SortDirection::Ascending
            })
        );
        app.handle_key(press(KeyCode::Char('1')));
        assert_eq!(
            app.sort.unwrap().direction,
            crate::models::SortDirection::Descending
        );
        // Descending + same key starts ascending again
        app.handle_key(press(KeyCode::Char('1')));
        assert_eq!(
            app.sort.unwrap().direction,
            crate::models::SortDirection::Ascending
        );

        app.handle_key(press(KeyCode::Char('s')));
        assert_eq!(app.sort.unwrap().key, SortKey::Status);
        app.handle_key(press(KeyCode::Char('S')));
        assert_eq!(
            app.sort.unwrap().direction,
            crate::models::SortDirection::Descending
        );
    }

    #[test]
    fn test_requests_for_refresh_task() {
        let mut app = app_with_sample();
        assert_eq!(app.handle_key(press(KeyCode::Char('r'))), Some(AppRequest::Refresh));
        assert_eq!(
            app.handle_key(press(KeyCode::Char('t'))),
            Some(AppRequest::ToggleMode)
        );
        assert_eq!(app.handle_key(press(KeyCode::Char('j'))), None);
    }

    #[test]
    fn test_collapse_and_expand_all() {
        let mut app = app_with_sample();
        app.handle_key(press(KeyCode::Char('c')));
        assert_eq!(row_names(&app), vec!["backend", "nightly-build"]);
        app.handle_key(press(KeyCode::Char('e')));
        assert_eq!(row_names(&app).len(), 6);
    }

    fn search(app: &mut TuiApp, query: &str) {
        app.handle_key(press(KeyCode::Char('/')));
        for c in query.chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        app.handle_key(press(KeyCode::Enter));
    }

    #[test]
    fn test_toggle_folder_within_search_results() {
        let mut app = app_with_sample();
        search(&mut app, "auth");
        assert_eq!(
            row_names(&app),
            vec!["backend", "microservices", "auth-service"]
        );

        // "backend" is selected
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(row_names(&app), vec!["backend"]);
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(row_names(&app).len(), 3);

        // Collapse again, then clear: the working tree was never touched
        app.handle_key(press(KeyCode::Enter));
        app.handle_key(press(KeyCode::Esc));
        assert_eq!(row_names(&app).len(), 6);
    }

    #[test]
    fn test_search_toggle_survives_refresh_and_resets_on_new_query() {
        let mut app = app_with_sample();
        search(&mut app, "auth");
        app.handle_key(press(KeyCode::Char('j')));
        // "microservices" is selected
        app.handle_key(press(KeyCode::Enter));
        assert_eq!(row_names(&app), vec!["backend", "microservices"]);

        app.apply_snapshot(loaded(sample_tree(), 2));
        assert_eq!(row_names(&app), vec!["backend", "microservices"]);

        app.handle_key(press(KeyCode::Char('/')));
        app.handle_key(press(KeyCode::Backspace));
        assert_eq!(
            row_names(&app),
            vec!["backend", "microservices", "auth-service"]
        );
    }

    #[test]
    fn test_collapse_all_within_search_results() {
        let mut app = app_with_sample();
        search(&mut app, "service");
        app.handle_key(press(KeyCode::Char('c')));
        assert_eq!(row_names(&app), vec!["backend"]);
        app.handle_key(press(KeyCode::Char('e')));
        assert_eq!(row_names(&app).len(), 5);
    }

    #[test]
    fn test_failed_snapshot_raises_error_toast() {
        let mut app = TuiApp::new("test");
        app.apply_snapshot(DashboardSnapshot {
            phase: RefreshPhase::Failed,
            jobs: sample_tree(),
            test_mode: true,
            error: Some("Data load failed: boom. Showing baseline data.".to_string()),
            generation: 1,
            ..DashboardSnapshot::default()
        });
        let toast = app.notifications.visible_toasts().next().unwrap();
        assert!(toast.message.contains("boom"));
        assert_eq!(row_names(&app).len(), 6);
    }

    #[test]
    fn test_loading_snapshot_keeps_previous_rows() {
        let mut app = app_with_sample();
        app.apply_snapshot(DashboardSnapshot {
            phase: RefreshPhase::Loading,
            jobs: sample_tree(),
            generation: 2,
            ..DashboardSnapshot::default()
        });
        assert_eq!(row_names(&app).len(), 6);
        assert!(!app.notifications.has_toasts());
    }

    #[test]
    fn test_quit_keys() {
        let mut app = app_with_sample();
        app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL));
        assert!(app.should_quit);

        let mut app = app_with_sample();
        app.handle_key(press(KeyCode::Char('q')));
        assert!(app.should_quit);
    }
}
