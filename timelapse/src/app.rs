//! UI state for the timelapse viewer.
//!
//! Everything the renderer and key dispatcher share that is *not* session
//! data: mode, focus, scroll offsets, panel geometry, the open-file prompt and
//! the highlighted-line cache. Session data lives in `timelapse_core::Timelapse`
//! and is passed alongside.

use std::collections::HashMap;
use std::path::Path;
use std::time::{Duration, Instant};

use ratatui::layout::Rect;
use ratatui::text::Line;
use ratatui::widgets::ListState;
use timelapse_core::Timelapse;

/// How long a status-bar message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(6);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    HelpOverlay,
    /// Typing a path into the open-file prompt.
    OpenFile,
}

/// Which panel receives scroll keys.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PanelFocus {
    Revisions,
    #[default]
    Code,
    Details,
}

impl PanelFocus {
    pub fn prev(self) -> Self {
        match self {
            PanelFocus::Revisions => PanelFocus::Details,
            PanelFocus::Code => PanelFocus::Revisions,
            PanelFocus::Details => PanelFocus::Code,
        }
    }

    pub fn next(self) -> Self {
        match self {
            PanelFocus::Revisions => PanelFocus::Code,
            PanelFocus::Code => PanelFocus::Details,
            PanelFocus::Details => PanelFocus::Revisions,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub is_error: bool,
    pub shown_at: Instant,
}

pub struct AppState {
    pub mode: Mode,
    pub focus: PanelFocus,

    /// Selection mirrors the session's revision cursor every frame.
    pub revision_list_state: ListState,

    /// First visible annotation line; clamped by the renderer.
    pub code_scroll: usize,
    pub details_scroll: u16,
    pub help_scroll: u16,

    /// Inner panel heights from the last frame, for page-wise scrolling.
    pub code_viewport_height: u16,
    pub details_viewport_height: u16,
    pub revisions_viewport_height: u16,

    pub left_pct: u16,
    pub center_pct: u16,
    pub right_pct: u16,
    /// Outer rects of the three panels from the last frame, for mouse hits.
    pub panel_rects: [Rect; 3],

    pub open_input: String,
    pub status: Option<StatusMessage>,
    pub revision_limit: usize,

    /// Rendered annotation lines per revision id. Only filled once a
    /// revision's details are in, so entries never go stale within a session.
    pub highlight_cache: HashMap<i64, Vec<Line<'static>>>,
}

impl AppState {
    pub fn new(revision_limit: usize) -> Self {
        Self {
            mode: Mode::default(),
            focus: PanelFocus::default(),
            revision_list_state: ListState::default(),
            code_scroll: 0,
            details_scroll: 0,
            help_scroll: 0,
            code_viewport_height: 0,
            details_viewport_height: 0,
            revisions_viewport_height: 0,
            left_pct: 25,
            center_pct: 50,
            right_pct: 25,
            panel_rects: [Rect::default(); 3],
            open_input: String::new(),
            status: None,
            revision_limit,
            highlight_cache: HashMap::new(),
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage { text: text.into(), is_error: false, shown_at: Instant::now() });
    }

    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage { text: text.into(), is_error: true, shown_at: Instant::now() });
    }

    /// Drops the status message once it has been shown long enough.
    pub fn expire_status(&mut self, now: Instant) {
        if self
            .status
            .as_ref()
            .is_some_and(|s| now.duration_since(s.shown_at) >= STATUS_TTL)
        {
            self.status = None;
        }
    }

    /// Binds `timelapse` to `path` and starts fetching.
    ///
    /// On failure the current session keeps running and the error is shown
    /// in the status bar.
    pub fn open_file(&mut self, timelapse: &mut Timelapse, path: &Path) {
        match timelapse.setup(path) {
            Ok(()) => {
                timelapse.fetch_revisions(self.revision_limit);
                self.highlight_cache.clear();
                self.code_scroll = 0;
                self.details_scroll = 0;
                self.revision_list_state = ListState::default();
                self.set_status(format!("Opened {}", path.display()));
            }
            Err(e) => {
                tracing::warn!(error = %e, "open failed");
                self.set_error(e.to_string());
            }
        }
    }

    pub fn begin_open(&mut self) {
        self.open_input.clear();
        self.mode = Mode::OpenFile;
    }

    /// Scrolls the code or details panel down. The revision panel is driven
    /// through the session cursor instead.
    pub fn scroll_down(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Code => self.code_scroll = self.code_scroll.saturating_add(lines as usize),
            PanelFocus::Details => self.details_scroll = self.details_scroll.saturating_add(lines),
            PanelFocus::Revisions => {}
        }
    }

    pub fn scroll_up(&mut self, lines: u16) {
        match self.focus {
            PanelFocus::Code => self.code_scroll = self.code_scroll.saturating_sub(lines as usize),
            PanelFocus::Details => self.details_scroll = self.details_scroll.saturating_sub(lines),
            PanelFocus::Revisions => {}
        }
    }

    pub fn scroll_top(&mut self) {
        match self.focus {
            PanelFocus::Code => self.code_scroll = 0,
            PanelFocus::Details => self.details_scroll = 0,
            PanelFocus::Revisions => {}
        }
    }

    /// Past-the-end offsets are pulled back by the renderer.
    pub fn scroll_bottom(&mut self) {
        match self.focus {
            PanelFocus::Code => self.code_scroll = usize::MAX,
            PanelFocus::Details => self.details_scroll = u16::MAX,
            PanelFocus::Revisions => {}
        }
    }

    /// Viewport height of the focused panel, at least 1.
    pub fn page_height(&self) -> u16 {
        let height = match self.focus {
            PanelFocus::Revisions => self.revisions_viewport_height,
            PanelFocus::Code => self.code_viewport_height,
            PanelFocus::Details => self.details_viewport_height,
        };
        height.max(1)
    }

    /// Moves 5% from the code panel to the side panels. Code keeps at least 30%.
    pub fn shrink_code_panel(&mut self) {
        const MIN_CENTER: u16 = 30;
        const STEP: u16 = 5;
        if self.center_pct <= MIN_CENTER {
            return;
        }
        let transfer = STEP.min(self.center_pct - MIN_CENTER);
        self.center_pct -= transfer;
        let left_gain = transfer / 2;
        self.left_pct += left_gain;
        self.right_pct += transfer - left_gain;
    }

    /// Takes up to 5% from the side panels. Code is capped at 80%, sides
    /// keep at least 5% each.
    pub fn grow_code_panel(&mut self) {
        const MAX_CENTER: u16 = 80;
        const MIN_SIDE: u16 = 5;
        const STEP: u16 = 5;
        if self.center_pct >= MAX_CENTER {
            return;
        }
        let transfer = STEP.min(MAX_CENTER - self.center_pct);
        let left_give = (transfer / 2).min(self.left_pct.saturating_sub(MIN_SIDE));
        let right_give = (transfer - transfer / 2).min(self.right_pct.saturating_sub(MIN_SIDE));
        self.left_pct -= left_give;
        self.right_pct -= right_give;
        self.center_pct += left_give + right_give;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panel_resizing_keeps_total_and_bounds() {
        let mut state = AppState::new(50);
        for _ in 0..20 {
            state.grow_code_panel();
            assert_eq!(state.left_pct + state.center_pct + state.right_pct, 100);
        }
        assert_eq!(state.center_pct, 80);
        for _ in 0..20 {
            state.shrink_code_panel();
            assert_eq!(state.left_pct + state.center_pct + state.right_pct, 100);
        }
        assert_eq!(state.center_pct, 30);
    }

    #[test]
    fn scrolling_saturates() {
        let mut state = AppState::new(50);
        state.scroll_up(3);
        assert_eq!(state.code_scroll, 0);
        state.scroll_down(4);
        assert_eq!(state.code_scroll, 4);
        state.focus = PanelFocus::Details;
        state.scroll_bottom();
        state.scroll_down(1);
        assert_eq!(state.details_scroll, u16::MAX);
        state.scroll_top();
        assert_eq!(state.details_scroll, 0);
    }

    #[test]
    fn focus_cycles_both_ways() {
        let f = PanelFocus::Revisions;
        assert_eq!(f.next().next().next(), f);
        assert_eq!(f.prev(), PanelFocus::Details);
        assert_eq!(f.next().prev(), f);
    }

    #[test]
    fn status_messages_expire() {
        let mut state = AppState::new(50);
        state.set_error("boom");
        let shown = state.status.as_ref().unwrap().shown_at;
        state.expire_status(shown + Duration::from_secs(1));
        assert!(state.status.is_some());
        state.expire_status(shown + STATUS_TTL);
        assert!(state.status.is_none());
    }

    #[test]
    fn opening_a_missing_file_reports_an_error() {
        let mut state = AppState::new(50);
        let mut timelapse = Timelapse::with_hg("hg");
        state.open_file(&mut timelapse, Path::new("/nonexistent/timelapse/file.rs"));
        assert!(!timelapse.is_valid());
        assert!(state.status.as_ref().is_some_and(|s| s.is_error));
    }
}
