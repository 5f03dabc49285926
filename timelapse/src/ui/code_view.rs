//! Annotation panel: the tracked file as of the current revision, one blame
//! line per row.
//!
//! Rows read `0042: author rev: code`. Rows last changed by the revision being
//! viewed are drawn entirely in `theme.annotation_highlight`; other rows get a
//! dim prefix and syntect-colored code. Rendered lines are cached per revision
//! id in `AppState::highlight_cache`, and only the visible window is handed to
//! the `List` each frame.

use std::sync::LazyLock;

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{List, ListItem},
    Frame,
};
use syntect::easy::HighlightLines;
use syntect::highlighting::{FontStyle, ThemeSet};
use syntect::parsing::SyntaxSet;
use timelapse_core::{Revision, Timelapse};

use crate::app::{AppState, PanelFocus};
use crate::theme::Theme;
use crate::ui::layout::{inner_rect, panel_block};

static PS: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);
static TS: LazyLock<ThemeSet> = LazyLock::new(ThemeSet::load_defaults);

pub fn render_code(
    frame: &mut Frame,
    area: Rect,
    state: &mut AppState,
    timelapse: &Timelapse,
    theme: &Theme,
) {
    let is_focused = state.focus == PanelFocus::Code;
    let title = match timelapse.current_revision() {
        Some(r) => format!("Annotations · r{} {}", r.id, r.revision_ref),
        None => "Annotations".to_owned(),
    };
    frame.render_widget(panel_block(title, is_focused, theme), area);
    let inner = inner_rect(area);

    let Some(revision) = timelapse.current_revision() else {
        let msg = if timelapse.is_fetching_revisions() {
            "Fetching revisions..."
        } else if timelapse.is_valid() {
            "No revisions found for this file."
        } else {
            "No file loaded. Press o to open one."
        };
        render_placeholder(frame, inner, msg, theme);
        return;
    };

    if !revision.extra_fetched {
        let msg = if timelapse.is_fetching_annotations() == Some(revision.id) {
            "Fetching annotations..."
        } else {
            "Waiting for annotations..."
        };
        render_placeholder(frame, inner, msg, theme);
        return;
    }
    if revision.annotations.is_empty() {
        render_placeholder(frame, inner, "No annotation data for this revision.", theme);
        return;
    }

    let ext = timelapse
        .file_path()
        .and_then(|p| p.extension())
        .and_then(|e| e.to_str())
        .unwrap_or("txt");
    let lines = state
        .highlight_cache
        .entry(revision.id)
        .or_insert_with(|| build_annotation_lines(revision, ext, theme));

    let viewport_height = inner.height as usize;
    let total = lines.len();
    let visible_start = state.code_scroll.min(total.saturating_sub(viewport_height));
    let visible_end = (visible_start + viewport_height).min(total);
    state.code_scroll = visible_start;

    let items: Vec<ListItem> =
        lines[visible_start..visible_end].iter().map(|l| ListItem::new(l.clone())).collect();
    frame.render_widget(List::new(items), inner);
}

fn render_placeholder(frame: &mut Frame, area: Rect, msg: &str, theme: &Theme) {
    let item = ListItem::new(Line::styled(msg.to_owned(), Style::default().fg(theme.muted)));
    frame.render_widget(List::new(vec![item]), area);
}

/// Renders every annotation line of `revision`. `ext` picks the syntax.
pub fn build_annotation_lines(revision: &Revision, ext: &str, theme: &Theme) -> Vec<Line<'static>> {
    let syntax = PS.find_syntax_by_extension(ext).unwrap_or_else(|| PS.find_syntax_plain_text());
    let mut highlighter = TS
        .themes
        .get(theme.syntax_theme)
        .or_else(|| TS.themes.values().next())
        .map(|t| HighlightLines::new(syntax, t));

    revision
        .annotation_lines()
        .enumerate()
        .map(|(i, line)| {
            let gutter = Span::styled(format!("{i:04}: "), Style::default().fg(theme.line_number));
            // Every line goes through the highlighter so multi-line constructs
            // keep their parse state.
            let code_spans = match highlighter.as_mut() {
                Some(h) => highlight_code(line.code, h),
                None => vec![Span::raw(line.code.to_owned())],
            };
            let mut spans = vec![gutter];
            match (line.author, line.revision) {
                (Some(author), Some(rev)) if line.highlighted => {
                    spans.push(Span::styled(
                        format!("{author} {rev}: {}", line.code),
                        Style::default()
                            .fg(theme.annotation_highlight)
                            .add_modifier(Modifier::BOLD),
                    ));
                }
                (Some(author), Some(rev)) => {
                    spans.push(Span::styled(
                        format!("{author} {rev}: "),
                        Style::default().fg(theme.annotation_prefix),
                    ));
                    spans.extend(code_spans);
                }
                _ => spans.push(Span::styled(line.code.to_owned(), Style::default().fg(theme.muted))),
            }
            Line::from(spans)
        })
        .collect()
}

/// syntect spans for one line of code, as owned ratatui spans.
///
/// Only foreground and font style are carried over so the terminal
/// background shows through.
fn highlight_code(code: &str, h: &mut HighlightLines) -> Vec<Span<'static>> {
    let ranges = match h.highlight_line(code, &PS) {
        Ok(ranges) => ranges,
        Err(_) => return vec![Span::raw(code.to_owned())],
    };
    ranges
        .into_iter()
        .map(|(style, text)| {
            let mut out = Style::default();
            if style.foreground.a > 0 {
                let c = style.foreground;
                out = out.fg(ratatui::style::Color::Rgb(c.r, c.g, c.b));
            }
            if style.font_style.contains(FontStyle::BOLD) {
                out = out.add_modifier(Modifier::BOLD);
            }
            if style.font_style.contains(FontStyle::ITALIC) {
                out = out.add_modifier(Modifier::ITALIC);
            }
            if style.font_style.contains(FontStyle::UNDERLINE) {
                out = out.add_modifier(Modifier::UNDERLINED);
            }
            Span::styled(text.to_owned(), out)
        })
        .collect()
}
