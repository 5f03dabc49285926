//! Color themes for the timelapse viewer.
//!
//! Two built-in themes:
//!
//! - `dark`: ANSI 16 colors only, safe on any terminal.
//! - `catppuccin_mocha`: Catppuccin Mocha in RGB; needs truecolor.
//!
//! Each theme also names the syntect theme used to color source code in the
//! annotation view.

use ratatui::style::Color;

#[derive(Debug, Clone)]
pub struct Theme {
    // Panel borders
    pub border_active: Color,
    pub border_inactive: Color,

    // Header and revision slider
    pub header_fg: Color,
    pub slider_filled: Color,
    pub slider_unfilled: Color,

    // Annotation view
    /// `0042:` line-number gutter.
    pub line_number: Color,
    /// `author rev:` prefix on lines owned by other revisions.
    pub annotation_prefix: Color,
    /// Whole-line color for lines changed by the revision being viewed.
    pub annotation_highlight: Color,
    /// Placeholder and unattributed text.
    pub muted: Color,

    // Revision list markers
    pub revision_fetched: Color,
    pub revision_pending: Color,
    pub revision_in_flight: Color,

    // Status bar
    pub status_bar_bg: Color,
    pub status_bar_fg: Color,
    pub status_mode_normal: Color,
    pub status_mode_open: Color,
    pub status_error: Color,

    /// Name of the syntect theme (from `ThemeSet::load_defaults`).
    pub syntax_theme: &'static str,
}

impl Theme {
    /// Built-in dark theme using ANSI 16 colors. Default fallback.
    pub fn dark() -> Self {
        Self {
            border_active: Color::Cyan,
            border_inactive: Color::DarkGray,

            header_fg: Color::White,
            slider_filled: Color::Cyan,
            slider_unfilled: Color::DarkGray,

            line_number: Color::DarkGray,
            annotation_prefix: Color::Blue,
            annotation_highlight: Color::LightGreen,
            muted: Color::DarkGray,

            revision_fetched: Color::Green,
            revision_pending: Color::DarkGray,
            revision_in_flight: Color::Yellow,

            status_bar_bg: Color::DarkGray,
            status_bar_fg: Color::White,
            status_mode_normal: Color::Cyan,
            status_mode_open: Color::Green,
            status_error: Color::LightRed,

            syntax_theme: "base16-ocean.dark",
        }
    }

    /// Catppuccin Mocha palette in RGB truecolor.
    ///
    /// Palette source: <https://github.com/catppuccin/catppuccin> Mocha variant.
    pub fn catppuccin_mocha() -> Self {
        let green = Color::Rgb(166, 227, 161); // #a6e3a1
        let red = Color::Rgb(243, 139, 168); // #f38ba8
        let yellow = Color::Rgb(249, 226, 175); // #f9e2af
        let blue = Color::Rgb(137, 180, 250); // #89b4fa
        let lavender = Color::Rgb(180, 190, 254); // #b4befe
        let overlay0 = Color::Rgb(108, 112, 134); // #6c7086
        let overlay1 = Color::Rgb(127, 132, 156); // #7f849c
        let surface1 = Color::Rgb(69, 71, 90); // #45475a
        let text = Color::Rgb(205, 214, 244); // #cdd6f4

        Self {
            border_active: lavender,
            border_inactive: overlay1,

            header_fg: text,
            slider_filled: lavender,
            slider_unfilled: surface1,

            line_number: overlay0,
            annotation_prefix: blue,
            annotation_highlight: green,
            muted: overlay1,

            revision_fetched: green,
            revision_pending: overlay0,
            revision_in_flight: yellow,

            status_bar_bg: surface1,
            status_bar_fg: text,
            status_mode_normal: lavender,
            status_mode_open: green,
            status_error: red,

            syntax_theme: "base16-mocha.dark",
        }
    }

    /// Resolves a configured theme name. Unknown names fall back to `dark()`
    /// with a warning in the log.
    pub fn from_name(name: &str) -> Self {
        match name {
            "catppuccin-mocha" | "catppuccin_mocha" => Self::catppuccin_mocha(),
            "dark" => Self::dark(),
            other => {
                tracing::warn!(theme = other, "unknown theme, falling back to 'dark'");
                Self::dark()
            }
        }
    }
}
