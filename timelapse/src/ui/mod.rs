//! Rendering for the timelapse viewer.
//!
//! `render()` is the only entry point and runs inside `terminal.draw()`.
//! Layout arithmetic lives in `layout.rs`; each panel has its own module.

mod layout;
pub mod code_view;
pub mod details;
pub mod help;
pub mod keybindings;
pub mod revision_list;

use ratatui::Frame;
use timelapse_core::Timelapse;

use crate::app::{AppState, Mode};
use crate::theme::Theme;
use layout::{compute_layout, inner_rect, render_header, render_slider, render_status_bar};

/// Draws one frame. Viewport heights and panel rects are cached in `state`
/// so the next key or mouse event can compute page sizes and hit-test.
pub fn render(frame: &mut Frame, state: &mut AppState, timelapse: &Timelapse, theme: &Theme) {
    let frame_layout = compute_layout(frame, state);
    let [left, center, right] = frame_layout.panels;

    state.revisions_viewport_height = inner_rect(left).height;
    state.code_viewport_height = inner_rect(center).height;
    state.details_viewport_height = inner_rect(right).height;
    state.panel_rects = frame_layout.panels;

    render_header(frame, frame_layout.header, timelapse, theme);
    render_slider(frame, frame_layout.slider, timelapse, theme);

    if left.width > 0 {
        revision_list::render_revision_list(frame, left, state, timelapse, theme);
    }
    code_view::render_code(frame, center, state, timelapse, theme);
    if right.width > 0 {
        details::render_details(frame, right, state, timelapse, theme);
    }

    render_status_bar(frame, frame_layout.status_bar, state, timelapse, theme);

    if state.mode == Mode::HelpOverlay {
        help::render_help_overlay(frame, theme, state.help_scroll);
    }
}
