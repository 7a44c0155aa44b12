//! Application state and event handling.
//!
//! The TUI never touches the coordinator directly: key presses become
//! [`DashboardCommand`]s and the dashboard answers with snapshots.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use flowcus_proto::quote::Quote;
use flowcus_proto::task::TaskId;
use flowcus_proto::track::Track;

use crate::dashboard::{DashboardCommand, DashboardEvent, DashboardSnapshot, RowState};

/// UI frames the completion highlight stays on.
const FADE_FRAMES: u8 = 20;

/// What the keyboard currently drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Navigating the task list.
    Browse,
    /// Typing the name of a new task.
    NewName,
    /// Typing its emoji (glyph or unified code).
    NewEmoji,
    /// Typing a song search.
    Search,
    /// Picking a song from the results.
    PickTrack,
}

/// Main application state.
pub struct App {
    /// Latest dashboard state.
    pub snapshot: DashboardSnapshot,
    /// Selected row in the task list.
    pub selected: usize,
    selected_id: Option<TaskId>,
    /// Keyboard mode.
    pub mode: Mode,
    /// Text being typed in the current form field.
    pub input: String,
    /// Name of the task being created.
    pub draft_name: String,
    /// Emoji of the task being created.
    pub draft_emoji: Option<String>,
    /// Last submitted search.
    pub search_query: String,
    /// Results for `search_query`.
    pub search_results: Vec<Track>,
    /// Selected search result.
    pub search_selected: usize,
    /// Offset of the current result page.
    pub search_offset: u32,
    /// Whether a search is in flight.
    pub searching: bool,
    /// Quote of the day.
    pub quote: Option<Quote>,
    /// Last form or search error.
    pub error: Option<String>,
    /// Frames left on the completion highlight.
    pub fade_frames: u8,
    /// Whether running against the built-in player.
    pub offline: bool,
    /// Whether the app should quit.
    pub should_quit: bool,
}

impl App {
    /// Creates an empty application.
    #[must_use]
    pub fn new(offline: bool) -> Self {
        Self {
            snapshot: DashboardSnapshot::default(),
            selected: 0,
            selected_id: None,
            mode: Mode::Browse,
            input: String::new(),
            draft_name: String::new(),
            draft_emoji: None,
            search_query: String::new(),
            search_results: Vec::new(),
            search_selected: 0,
            search_offset: 0,
            searching: false,
            quote: None,
            error: None,
            fade_frames: 0,
            offline,
            should_quit: false,
        }
    }

    /// Applies an event from the dashboard.
    pub fn apply_event(&mut self, event: DashboardEvent) {
        match event {
            DashboardEvent::Snapshot(snapshot) => self.apply_snapshot(snapshot),
            DashboardEvent::TaskRejected(reason) => self.error = Some(reason),
            DashboardEvent::SearchResults { query, tracks } => {
                if query == self.search_query {
                    self.searching = false;
                    self.search_selected = 0;
                    self.search_results = tracks;
                }
            }
            DashboardEvent::SearchFailed(reason) => {
                self.searching = false;
                self.error = Some(format!("Search failed: {reason}"));
            }
            DashboardEvent::Quote(quote) => self.quote = Some(quote),
        }
    }

    /// Advances frame-based effects. Called once per UI loop iteration.
    pub const fn on_frame(&mut self) {
        self.fade_frames = self.fade_frames.saturating_sub(1);
    }

    fn apply_snapshot(&mut self, snapshot: DashboardSnapshot) {
        if snapshot.fade_out {
            self.fade_frames = FADE_FRAMES;
        }
        // Keep the cursor on the same task when the order changes.
        if let Some(index) = self
            .selected_id
            .as_ref()
            .and_then(|id| snapshot.rows.iter().position(|r| &r.task.id == id))
        {
            self.selected = index;
        }
        self.selected = self.selected.min(snapshot.rows.len().saturating_sub(1));
        self.selected_id = snapshot.rows.get(self.selected).map(|r| r.task.id.clone());
        self.snapshot = snapshot;
    }

    /// Handles a key event, returning the command to send, if any.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> Option<DashboardCommand> {
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return None;
        }

        match self.mode {
            Mode::Browse => self.handle_browse_key(key),
            Mode::NewName | Mode::NewEmoji | Mode::Search => self.handle_form_key(key),
            Mode::PickTrack => self.handle_pick_key(key),
        }
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> Option<DashboardCommand> {
        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Up | KeyCode::Char('k') => self.select(self.selected.saturating_sub(1)),
            KeyCode::Down | KeyCode::Char('j') => self.select(self.selected + 1),
            KeyCode::Enter | KeyCode::Char(' ') => {
                let row = self.snapshot.rows.get(self.selected)?;
                if row.state == RowState::Completed {
                    return None;
                }
                return Some(DashboardCommand::Activate(row.task.id.clone()));
            }
            KeyCode::Char('n' | 'a') => self.begin_new_task(),
            KeyCode::Char('x') => return Some(DashboardCommand::DismissNotification),
            _ => {}
        }
        None
    }

    fn handle_form_key(&mut self, key: KeyEvent) -> Option<DashboardCommand> {
        match key.code {
            KeyCode::Esc => self.cancel_new_task(),
            KeyCode::Enter => return self.submit_field(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
        None
    }

    fn handle_pick_key(&mut self, key: KeyEvent) -> Option<DashboardCommand> {
        match key.code {
            KeyCode::Esc | KeyCode::Backspace => {
                self.input = self.search_query.clone();
                self.mode = Mode::Search;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.search_selected = self.search_selected.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                if self.search_selected + 1 < self.search_results.len() {
                    self.search_selected += 1;
                }
            }
            KeyCode::Right | KeyCode::PageDown => {
                if !self.search_results.is_empty() {
                    return Some(self.search_page(self.search_offset + 10));
                }
            }
            KeyCode::Left | KeyCode::PageUp => {
                if self.search_offset > 0 {
                    return Some(self.search_page(self.search_offset.saturating_sub(10)));
                }
            }
            KeyCode::Enter => {
                let track = self.search_results.get(self.search_selected)?.clone();
                let command = DashboardCommand::CreateTask {
                    name: std::mem::take(&mut self.draft_name),
                    emoji: self.draft_emoji.take(),
                    track,
                };
                self.cancel_new_task();
                return Some(command);
            }
            _ => {}
        }
        None
    }

    fn submit_field(&mut self) -> Option<DashboardCommand> {
        let value = std::mem::take(&mut self.input);
        match self.mode {
            Mode::NewName => {
                if value.trim().is_empty() {
                    self.error = Some("Task name cannot be empty".to_string());
                    return None;
                }
                self.error = None;
                self.draft_name = value.trim().to_string();
                self.mode = Mode::NewEmoji;
            }
            Mode::NewEmoji => {
                self.draft_emoji = Some(value).filter(|v| !v.trim().is_empty());
                self.mode = Mode::Search;
            }
            Mode::Search => {
                if value.trim().is_empty() {
                    return None;
                }
                self.search_query = value.trim().to_string();
                self.search_results.clear();
                self.mode = Mode::PickTrack;
                return Some(self.search_page(0));
            }
            Mode::Browse | Mode::PickTrack => {}
        }
        None
    }

    fn search_page(&mut self, offset: u32) -> DashboardCommand {
        self.search_offset = offset;
        self.searching = true;
        self.error = None;
        DashboardCommand::Search {
            query: self.search_query.clone(),
            offset,
        }
    }

    fn begin_new_task(&mut self) {
        self.mode = Mode::NewName;
        self.input.clear();
        self.error = None;
    }

    fn cancel_new_task(&mut self) {
        self.mode = Mode::Browse;
        self.input.clear();
        self.draft_name.clear();
        self.draft_emoji = None;
        self.search_results.clear();
        self.search_selected = 0;
        self.search_offset = 0;
        self.searching = false;
    }

    fn select(&mut self, index: usize) {
        if self.snapshot.rows.is_empty() {
            return;
        }
        self.selected = index.min(self.snapshot.rows.len() - 1);
        self.selected_id = Some(self.snapshot.rows[self.selected].task.id.clone());
    }
}
