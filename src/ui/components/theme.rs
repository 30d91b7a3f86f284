//! Theme definitions.
//!
//! Two palettes, dark (Tokyo Night derived) and light, toggled at runtime.
//! Accent colors are used sparingly: the query input, the selected result,
//! and `<mark>` highlights.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThemePalette {
    pub accent: Color,
    pub bg: Color,
    pub fg: Color,
    /// Elevated surface - the overlay panel.
    pub surface: Color,
    pub hint: Color,
    pub border: Color,
    pub border_focus: Color,
    /// Background for `<mark>` highlighted excerpt spans.
    pub mark: Color,
}

impl ThemePalette {
    pub fn dark() -> Self {
        Self {
            accent: Color::Rgb(122, 162, 247), // #7aa2f7
            bg: Color::Rgb(26, 27, 38),        // #1a1b26
            fg: Color::Rgb(192, 202, 245),     // #c0caf5
            surface: Color::Rgb(36, 40, 59),   // #24283b
            hint: Color::Rgb(105, 114, 158),   // #696e9e
            border: Color::Rgb(59, 66, 97),    // #3b4261
            border_focus: Color::Rgb(125, 145, 200), // #7d91c8
            mark: Color::Rgb(61, 89, 161),     // #3d59a1
        }
    }

    pub fn light() -> Self {
        Self {
            accent: Color::Rgb(47, 107, 231), // rich blue
            bg: Color::Rgb(250, 250, 252),    // off-white
            fg: Color::Rgb(36, 41, 46),       // near-black
            surface: Color::Rgb(240, 241, 245),
            hint: Color::Rgb(125, 134, 144),
            border: Color::Rgb(216, 222, 228),
            border_focus: Color::Rgb(47, 107, 231),
            mark: Color::Rgb(255, 236, 153), // pale amber
        }
    }

    /// Title style - accent colored with bold modifier.
    pub fn title(self) -> Style {
        Style::default()
            .fg(self.accent)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text(self) -> Style {
        Style::default().fg(self.fg)
    }

    pub fn hint_style(self) -> Style {
        Style::default().fg(self.hint)
    }

    pub fn marked(self) -> Style {
        Style::default()
            .fg(self.fg)
            .bg(self.mark)
            .add_modifier(Modifier::BOLD)
    }
}
