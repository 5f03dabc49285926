//! Revision list panel (left).
//!
//! One row per revision, oldest first, with a marker for its details state:
//! `●` fetched, `◐` in flight, `○` pending. The selection follows the session
//! cursor.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};
use timelapse_core::{Revision, Timelapse};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_revision_list(
    frame: &mut Frame,
    area: Rect,
    state: &mut AppState,
    timelapse: &Timelapse,
    theme: &Theme,
) {
    let is_focused = state.focus == PanelFocus::Revisions;
    let revisions = timelapse.revisions();
    let title = if revisions.is_empty() {
        "Revisions".to_owned()
    } else {
        format!("Revisions ({})", revisions.len())
    };
    let block = panel_block(title, is_focused, theme);

    let items: Vec<ListItem> = if revisions.is_empty() {
        let msg = if timelapse.is_fetching_revisions() { "Loading..." } else { "No revisions" };
        vec![ListItem::new(Line::styled(msg, Style::default().fg(theme.muted)))]
    } else {
        let in_flight = timelapse.is_fetching_annotations();
        revisions.iter().map(|r| revision_item(r, in_flight == Some(r.id), theme)).collect()
    };

    state.revision_list_state.select(timelapse.revision_cursor());
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().fg(theme.border_active).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut state.revision_list_state);
}

/// `● r42 abc123 alice 2024-01-01 fix bug`
fn revision_item(r: &Revision, in_flight: bool, theme: &Theme) -> ListItem<'static> {
    let (marker, color) = if r.extra_fetched {
        ("● ", theme.revision_fetched)
    } else if in_flight {
        ("◐ ", theme.revision_in_flight)
    } else {
        ("○ ", theme.revision_pending)
    };
    ListItem::new(Line::from(vec![
        Span::styled(marker, Style::default().fg(color)),
        Span::raw(format!("r{} ", r.id)),
        Span::styled(format!("{} ", r.revision_ref), Style::default().fg(theme.annotation_prefix)),
        Span::raw(format!("{} {} ", r.author, r.date)),
        Span::styled(r.description.clone(), Style::default().fg(theme.muted)),
    ]))
}
