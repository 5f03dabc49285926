//! Details panel (right): metadata of the current revision followed by its
//! patch, shown as plain text.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Paragraph, Wrap},
    Frame,
};
use timelapse_core::{Revision, Timelapse};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::panel_block;

pub fn render_details(
    frame: &mut Frame,
    area: Rect,
    state: &mut AppState,
    timelapse: &Timelapse,
    theme: &Theme,
) {
    let is_focused = state.focus == PanelFocus::Details;
    let block = panel_block("Details", is_focused, theme);

    let text = match timelapse.current_revision() {
        Some(r) => details_text(r, theme),
        None => Text::styled("No revision selected", Style::default().fg(theme.muted)),
    };
    // Logical lines only; wrapped rows past the end are still reachable.
    let max_scroll = text.lines.len().saturating_sub(1).min(u16::MAX as usize) as u16;
    state.details_scroll = state.details_scroll.min(max_scroll);

    frame.render_widget(
        Paragraph::new(text)
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((state.details_scroll, 0)),
        area,
    );
}

fn details_text(r: &Revision, theme: &Theme) -> Text<'static> {
    let label = Style::default().fg(theme.muted);
    let field = |name: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{name:<8}"), label),
            Span::raw(value),
        ])
    };

    let mut lines = vec![
        Line::styled(
            format!("r{}  {}", r.id, r.revision_ref),
            Style::default().fg(theme.header_fg).add_modifier(Modifier::BOLD),
        ),
        field("Author", r.author.clone()),
    ];
    lines.push(if r.date_relative.is_empty() {
        field("Date", r.date.clone())
    } else {
        field("Date", format!("{} ({})", r.date, r.date_relative))
    });
    if !r.branch.is_empty() {
        lines.push(field("Branch", r.branch.clone()));
    }
    lines.push(field("Files", r.modification_count.to_string()));
    if let Some(merged) = &r.merged_date {
        lines.push(field("Merged", merged.clone()));
    }
    if let Some(summary) = &r.base_pr_summary {
        lines.push(field("Via", summary.clone()));
    }
    lines.push(Line::default());
    lines.push(Line::raw(r.description.clone()));
    lines.push(Line::default());
    lines.push(Line::styled("Patch", Style::default().add_modifier(Modifier::BOLD)));

    match (&r.patch, r.extra_fetched) {
        (Some(patch), _) => lines.extend(patch.lines().map(|l| Line::raw(l.to_owned()))),
        (None, true) => lines.push(Line::styled("(no patch)", label)),
        (None, false) => lines.push(Line::styled("(fetching...)", label)),
    }
    Text::from(lines)
}
