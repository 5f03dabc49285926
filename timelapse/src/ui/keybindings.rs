//! Key and mouse dispatch.
//!
//! Branches on `state.mode` first so each mode has its own handler. Revision
//! navigation goes straight to the session facade, which clamps the cursor.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Position;
use timelapse_core::Timelapse;

use crate::app::{AppState, Mode, PanelFocus};

/// Returned after every key so the event loop knows whether to keep going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Continue,
    Quit,
}

pub fn handle_key(key: KeyEvent, state: &mut AppState, timelapse: &mut Timelapse) -> KeyAction {
    match state.mode {
        Mode::HelpOverlay => handle_help(key, state),
        Mode::OpenFile => handle_open_file(key, state, timelapse),
        Mode::Normal => handle_normal(key, state, timelapse),
    }
}

// ---------------------------------------------------------------------------
// Normal mode
// ---------------------------------------------------------------------------

fn handle_normal(key: KeyEvent, state: &mut AppState, timelapse: &mut Timelapse) -> KeyAction {
    if state.focus == PanelFocus::Revisions {
        if let Some(action) = handle_revision_list_key(key, state, timelapse) {
            return action;
        }
    } else if let Some(action) = handle_scroll_key(key, state) {
        return action;
    }

    match key.code {
        KeyCode::Char('h') | KeyCode::Left => step(state, timelapse, -1),
        KeyCode::Char('l') | KeyCode::Right => step(state, timelapse, 1),
        KeyCode::Char('[') => jump(state, timelapse, 0),
        KeyCode::Char(']') => jump(state, timelapse, isize::MAX),

        KeyCode::Char('H') => {
            state.focus = state.focus.prev();
            KeyAction::Continue
        }
        KeyCode::Char('L') => {
            state.focus = state.focus.next();
            KeyAction::Continue
        }

        KeyCode::Char('<') => { state.shrink_code_panel(); KeyAction::Continue }
        KeyCode::Char('>') => { state.grow_code_panel(); KeyAction::Continue }

        KeyCode::Char('o') => {
            state.begin_open();
            KeyAction::Continue
        }
        KeyCode::Char('?') => {
            state.help_scroll = 0;
            state.mode = Mode::HelpOverlay;
            KeyAction::Continue
        }
        KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,

        _ => KeyAction::Continue,
    }
}

/// With the revision list focused, the scroll keys move the revision cursor.
fn handle_revision_list_key(
    key: KeyEvent,
    state: &mut AppState,
    timelapse: &mut Timelapse,
) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let page = state.page_height() as isize;

    let action = match key.code {
        KeyCode::Char('j') | KeyCode::Down => step(state, timelapse, 1),
        KeyCode::Char('k') | KeyCode::Up => step(state, timelapse, -1),
        KeyCode::Char('g') => jump(state, timelapse, 0),
        KeyCode::Char('G') => jump(state, timelapse, isize::MAX),
        KeyCode::Char('d') if ctrl => step(state, timelapse, page / 2),
        KeyCode::Char('u') if ctrl => step(state, timelapse, -(page / 2)),
        KeyCode::Char('f') if ctrl => step(state, timelapse, page),
        KeyCode::Char('b') if ctrl => step(state, timelapse, -page),
        _ => return None,
    };
    Some(action)
}

/// j / k / g / G and the Ctrl page keys for the code and details panels.
fn handle_scroll_key(key: KeyEvent, state: &mut AppState) -> Option<KeyAction> {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    let page = state.page_height();

    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => state.scroll_up(1),
        KeyCode::Char('g') => state.scroll_top(),
        KeyCode::Char('G') => state.scroll_bottom(),
        KeyCode::Char('d') if ctrl => state.scroll_down((page / 2).max(1)),
        KeyCode::Char('u') if ctrl => state.scroll_up((page / 2).max(1)),
        KeyCode::Char('f') if ctrl => state.scroll_down(page),
        KeyCode::Char('b') if ctrl => state.scroll_up(page),
        _ => return None,
    }
    Some(KeyAction::Continue)
}

fn step(state: &mut AppState, timelapse: &mut Timelapse, delta: isize) -> KeyAction {
    let before = timelapse.revision_cursor();
    if timelapse.step_revision(delta) != before {
        state.details_scroll = 0;
    }
    KeyAction::Continue
}

fn jump(state: &mut AppState, timelapse: &mut Timelapse, index: isize) -> KeyAction {
    let before = timelapse.revision_cursor();
    if timelapse.set_revision_cursor(index) != before {
        state.details_scroll = 0;
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// OpenFile mode
// ---------------------------------------------------------------------------

fn handle_open_file(key: KeyEvent, state: &mut AppState, timelapse: &mut Timelapse) -> KeyAction {
    match key.code {
        KeyCode::Esc => state.mode = Mode::Normal,
        KeyCode::Enter => {
            state.mode = Mode::Normal;
            let input = state.open_input.trim().to_owned();
            if !input.is_empty() {
                state.open_file(timelapse, &PathBuf::from(input));
            }
        }
        KeyCode::Backspace => {
            state.open_input.pop();
        }
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            state.open_input.push(c);
        }
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// HelpOverlay mode
// ---------------------------------------------------------------------------

fn handle_help(key: KeyEvent, state: &mut AppState) -> KeyAction {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => state.help_scroll = state.help_scroll.saturating_add(1),
        KeyCode::Char('k') | KeyCode::Up => state.help_scroll = state.help_scroll.saturating_sub(1),
        KeyCode::Char('g') => state.help_scroll = 0,
        KeyCode::Char('?') | KeyCode::Esc | KeyCode::Char('q') => state.mode = Mode::Normal,
        _ => {}
    }
    KeyAction::Continue
}

// ---------------------------------------------------------------------------
// Mouse events
// ---------------------------------------------------------------------------

/// Left click focuses the panel under the pointer; the wheel scrolls the
/// focused panel (or the help overlay) by 3 rows.
pub fn handle_mouse(mouse: MouseEvent, state: &mut AppState, timelapse: &mut Timelapse) -> KeyAction {
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left) => {
            focus_at(mouse.column, mouse.row, state);
            KeyAction::Continue
        }
        MouseEventKind::ScrollUp => scroll_wheel(state, timelapse, -3),
        MouseEventKind::ScrollDown => scroll_wheel(state, timelapse, 3),
        _ => KeyAction::Continue,
    }
}

/// Collapsed panels (zero width) never take focus.
fn focus_at(col: u16, row: u16, state: &mut AppState) {
    let pos = Position { x: col, y: row };
    let [left, center, right] = state.panel_rects;

    if left.width > 0 && left.contains(pos) {
        state.focus = PanelFocus::Revisions;
    } else if center.contains(pos) {
        state.focus = PanelFocus::Code;
    } else if right.width > 0 && right.contains(pos) {
        state.focus = PanelFocus::Details;
    }
}

fn scroll_wheel(state: &mut AppState, timelapse: &mut Timelapse, delta: i16) -> KeyAction {
    let amount = delta.unsigned_abs();
    match (state.mode, state.focus) {
        (Mode::HelpOverlay, _) if delta < 0 => state.help_scroll = state.help_scroll.saturating_sub(amount),
        (Mode::HelpOverlay, _) => state.help_scroll = state.help_scroll.saturating_add(amount),
        (_, PanelFocus::Revisions) => return step(state, timelapse, delta.signum() as isize),
        _ if delta < 0 => state.scroll_up(amount),
        _ => state.scroll_down(amount),
    }
    KeyAction::Continue
}
