//! Frame layout plus the header, revision slider and status bar.
//!
//! Pure layout arithmetic and small one-row widgets; recomputed every frame
//! from the live terminal size.
//!
//! ```text
//! Revision: /repo/src/main.c - abc123
//! ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━────────── r3  2/2
//! ┌Revisions──┬Annotations──────────┬Details──┐
//! │           │                     │         │
//! └───────────┴─────────────────────┴─────────┘
//!  NORMAL  Annotating r2 (1/2)        ━━━━───
//! ```
//!
//! At `>= 120` columns all three panels are shown using the state's width
//! percentages; narrower terminals collapse the side panels.

use ratatui::{
    layout::{Constraint, Layout, Margin, Rect, Spacing},
    style::{Modifier, Style},
    symbols::merge::MergeStrategy,
    text::{Line, Span},
    widgets::{Block, BorderType, LineGauge, Paragraph},
    Frame,
};
use timelapse_core::{FetchState, Timelapse};

use crate::app::{AppState, Mode};
use crate::theme::Theme;

pub const NOTHING_TO_SHOW: &str =
    "Nothing to timelapse. Press o to open a file, or pass its path as the first argument.";

/// Rects for one frame. Never keep them across frames.
pub struct FrameLayout {
    pub header: Rect,
    pub slider: Rect,
    /// Revisions, annotations, details.
    pub panels: [Rect; 3],
    pub status_bar: Rect,
}

pub fn compute_layout(frame: &Frame, state: &AppState) -> FrameLayout {
    let [header, slider, main_area, status_bar] = frame.area().layout(&Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(1),
        Constraint::Fill(1),
        Constraint::Length(1),
    ]));

    let horizontal = (if frame.area().width >= 120 {
        Layout::horizontal([
            Constraint::Percentage(state.left_pct),
            Constraint::Percentage(state.center_pct),
            Constraint::Percentage(state.right_pct),
        ])
    } else {
        Layout::horizontal([Constraint::Length(0), Constraint::Fill(1), Constraint::Length(0)])
    })
    .spacing(Spacing::Overlap(1));

    let [left, center, right] = main_area.layout(&horizontal);
    FrameLayout { header, slider, panels: [left, center, right], status_bar }
}

/// Panel area inside its 1-cell border.
pub fn inner_rect(area: Rect) -> Rect {
    area.inner(Margin { vertical: 1, horizontal: 1 })
}

/// Bordered panel block; thick border when focused. `Fuzzy` merging keeps
/// junctions right where thick and plain borders meet.
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, theme: &Theme) -> Block<'a> {
    let (color, border_type) = if is_focused {
        (theme.border_active, BorderType::Thick)
    } else {
        (theme.border_inactive, BorderType::Plain)
    };
    Block::bordered()
        .title(title)
        .border_type(border_type)
        .border_style(Style::default().fg(color))
        .merge_borders(MergeStrategy::Fuzzy)
}

/// `Revision: <path> - <rev>`, or the empty-state hint.
pub fn render_header(frame: &mut Frame, area: Rect, timelapse: &Timelapse, theme: &Theme) {
    let text = match (timelapse.file_path(), timelapse.rev_node()) {
        (Some(path), Some(rev)) => format!("Revision: {} - {}", path.display(), rev),
        (Some(path), None) => format!("Revision: {}", path.display()),
        (None, _) => NOTHING_TO_SHOW.to_owned(),
    };
    frame.render_widget(
        Paragraph::new(text).style(Style::default().fg(theme.header_fg).add_modifier(Modifier::BOLD)),
        area,
    );
}

/// Cursor position within the revision list, drawn as a line gauge.
pub fn render_slider(frame: &mut Frame, area: Rect, timelapse: &Timelapse, theme: &Theme) {
    let total = timelapse.revisions().len();
    let (Some(cursor), Some(current)) = (timelapse.revision_cursor(), timelapse.current_revision())
    else {
        return;
    };
    let ratio = if total <= 1 { 1.0 } else { cursor as f64 / (total - 1) as f64 };
    let gauge = LineGauge::default()
        .filled_style(Style::default().fg(theme.slider_filled))
        .unfilled_style(Style::default().fg(theme.slider_unfilled))
        .label(format!("r{}  {}/{}", current.id, cursor + 1, total))
        .ratio(ratio);
    frame.render_widget(gauge, area);
}

/// One-line summary of background fetching.
pub fn fetch_status_text(timelapse: &Timelapse) -> String {
    let progress = timelapse.progress();
    match timelapse.fetch_state() {
        None => "No file".to_owned(),
        Some(FetchState::Idle) => "Idle".to_owned(),
        Some(FetchState::FetchingRevisionList) => "Listing revisions...".to_owned(),
        Some(FetchState::FetchingAnnotations) => match timelapse.is_fetching_annotations() {
            Some(id) => format!("Annotating r{id} ({}/{})", progress.completed, progress.total),
            None => format!("Annotating ({}/{})", progress.completed, progress.total),
        },
        Some(FetchState::Settled) if progress.total == 0 => "No revisions".to_owned(),
        Some(FetchState::Settled) => format!("{} revisions", progress.total),
    }
}

/// Mode indicator, status message (or fetch status) and a progress gauge
/// while details are still being fetched.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    timelapse: &Timelapse,
    theme: &Theme,
) {
    let [text_area, gauge_area] =
        area.layout(&Layout::horizontal([Constraint::Fill(1), Constraint::Length(24)]));

    let (mode_text, mode_fg) = match state.mode {
        Mode::OpenFile => (" OPEN ", theme.status_mode_open),
        Mode::Normal | Mode::HelpOverlay => (" NORMAL ", theme.status_mode_normal),
    };
    let mut spans = vec![
        Span::styled(mode_text, Style::default().fg(mode_fg).add_modifier(Modifier::BOLD)),
        Span::raw(" "),
    ];
    match (&state.mode, &state.status) {
        (Mode::OpenFile, _) => {
            spans.push(Span::raw(format!("Open: {}", state.open_input)));
            spans.push(Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)));
        }
        (_, Some(msg)) if msg.is_error => {
            spans.push(Span::styled(msg.text.clone(), Style::default().fg(theme.status_error)));
        }
        (_, Some(msg)) => spans.push(Span::raw(msg.text.clone())),
        (_, None) => spans.push(Span::raw(fetch_status_text(timelapse))),
    }

    let bar_style = Style::default().bg(theme.status_bar_bg).fg(theme.status_bar_fg);
    frame.render_widget(Paragraph::new(Line::from(spans)).style(bar_style), text_area);

    let progress = timelapse.progress();
    if timelapse.fetch_state() == Some(FetchState::FetchingAnnotations) && progress.total > 0 {
        let gauge = LineGauge::default()
            .style(bar_style)
            .filled_style(Style::default().fg(theme.revision_fetched))
            .unfilled_style(Style::default().fg(theme.revision_pending))
            .ratio(progress.ratio());
        frame.render_widget(gauge, gauge_area);
    } else {
        frame.render_widget(Paragraph::new("").style(bar_style), gauge_area);
    }
}
