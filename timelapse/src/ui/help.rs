//! Help overlay: a centred modal listing the key bindings.

use ratatui::{
    layout::Constraint,
    style::Style,
    text::{Line, Text},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};

use crate::theme::Theme;

/// Draws the overlay over whatever the panels rendered, scrolled by
/// `help_scroll` rows. Skipped on terminals narrower than 60 columns.
pub fn render_help_overlay(frame: &mut Frame, theme: &Theme, help_scroll: u16) {
    if frame.area().width < 60 {
        return;
    }
    let overlay_area = frame.area().centered(Constraint::Percentage(70), Constraint::Percentage(80));
    frame.render_widget(Clear, overlay_area);

    let block = Block::bordered()
        .title(" Help · j/k scroll, ? or Esc to close ")
        .border_style(Style::default().fg(theme.border_active));

    frame.render_widget(
        Paragraph::new(help_text())
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((help_scroll, 0)),
        overlay_area,
    );
}

fn help_text() -> Text<'static> {
    Text::from(vec![
        Line::from("Revisions"),
        Line::from("  h / l, Left / Right   Previous / next revision"),
        Line::from("  [ / ]                 Oldest / newest revision"),
        Line::from("  j / k                 Previous / next (Revisions panel focused)"),
        Line::from(""),
        Line::from("Scrolling"),
        Line::from("  j / k                 Scroll down / up one line"),
        Line::from("  g / G                 Top / bottom"),
        Line::from("  Ctrl-d / u            Half page down / up"),
        Line::from("  Ctrl-f / b            Full page down / up"),
        Line::from(""),
        Line::from("Panels"),
        Line::from("  H / L                 Focus previous / next panel"),
        Line::from("  < / >                 Shrink / grow the annotation panel"),
        Line::from(""),
        Line::from("General"),
        Line::from("  o                     Open a file (Enter to confirm, Esc to cancel)"),
        Line::from("  ?                     Toggle this help"),
        Line::from("  q / Esc               Quit"),
        Line::from(""),
        Line::from("Highlighted lines were last changed by the revision on screen."),
    ])
}
