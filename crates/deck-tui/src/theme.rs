//! Named color palettes plus style helpers.
//!
//! The active theme lives in `AppState`; components never hold their own
//! colors, they go through the style helpers here so a theme switch
//! repaints everything at once.

use ratatui::style::{Color, Modifier, Style};

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub name: &'static str,
    pub bg: Color,
    pub primary: Color,
    pub secondary: Color,
    pub accent: Color,
    pub playing: Color,
    pub error: Color,
    pub muted: Color,
    pub selection_bg: Color,
    pub border: Color,
    pub border_focused: Color,
}

const LUXURY: Theme = Theme {
    name: "luxury",
    bg: Color::Rgb(16, 16, 20),
    primary: Color::Rgb(220, 214, 200),
    secondary: Color::Rgb(140, 132, 120),
    accent: Color::Rgb(212, 175, 55),
    playing: Color::Rgb(120, 200, 140),
    error: Color::Rgb(235, 90, 90),
    muted: Color::Rgb(80, 76, 70),
    selection_bg: Color::Rgb(34, 32, 28),
    border: Color::Rgb(48, 44, 38),
    border_focused: Color::Rgb(212, 175, 55),
};

const COFFEE: Theme = Theme {
    name: "coffee",
    bg: Color::Rgb(24, 18, 14),
    primary: Color::Rgb(226, 210, 190),
    secondary: Color::Rgb(150, 128, 110),
    accent: Color::Rgb(200, 140, 90),
    playing: Color::Rgb(150, 190, 120),
    error: Color::Rgb(225, 95, 85),
    muted: Color::Rgb(92, 76, 64),
    selection_bg: Color::Rgb(42, 32, 26),
    border: Color::Rgb(58, 44, 36),
    border_focused: Color::Rgb(200, 140, 90),
};

const FOREST: Theme = Theme {
    name: "forest",
    bg: Color::Rgb(14, 20, 16),
    primary: Color::Rgb(204, 218, 200),
    secondary: Color::Rgb(120, 140, 122),
    accent: Color::Rgb(110, 190, 130),
    playing: Color::Rgb(110, 190, 130),
    error: Color::Rgb(220, 100, 90),
    muted: Color::Rgb(66, 82, 70),
    selection_bg: Color::Rgb(26, 36, 30),
    border: Color::Rgb(36, 50, 40),
    border_focused: Color::Rgb(110, 190, 130),
};

const NIGHT: Theme = Theme {
    name: "night",
    bg: Color::Rgb(13, 15, 24),
    primary: Color::Rgb(205, 210, 228),
    secondary: Color::Rgb(112, 118, 142),
    accent: Color::Rgb(100, 140, 230),
    playing: Color::Rgb(95, 200, 150),
    error: Color::Rgb(235, 92, 100),
    muted: Color::Rgb(64, 68, 88),
    selection_bg: Color::Rgb(26, 30, 46),
    border: Color::Rgb(36, 40, 58),
    border_focused: Color::Rgb(100, 140, 230),
};

const SYNTHWAVE: Theme = Theme {
    name: "synthwave",
    bg: Color::Rgb(20, 12, 28),
    primary: Color::Rgb(230, 210, 240),
    secondary: Color::Rgb(150, 120, 170),
    accent: Color::Rgb(255, 105, 180),
    playing: Color::Rgb(100, 230, 200),
    error: Color::Rgb(255, 85, 110),
    muted: Color::Rgb(90, 68, 110),
    selection_bg: Color::Rgb(38, 24, 52),
    border: Color::Rgb(54, 34, 72),
    border_focused: Color::Rgb(255, 105, 180),
};

const BLACK: Theme = Theme {
    name: "black",
    bg: Color::Rgb(8, 8, 8),
    primary: Color::Rgb(200, 200, 200),
    secondary: Color::Rgb(110, 110, 110),
    accent: Color::Rgb(235, 235, 235),
    playing: Color::Rgb(120, 200, 120),
    error: Color::Rgb(230, 80, 80),
    muted: Color::Rgb(60, 60, 60),
    selection_bg: Color::Rgb(26, 26, 26),
    border: Color::Rgb(40, 40, 40),
    border_focused: Color::Rgb(235, 235, 235),
};

pub const ALL: [&Theme; 6] = [&LUXURY, &COFFEE, &FOREST, &NIGHT, &SYNTHWAVE, &BLACK];

impl Theme {
    /// Lookup by saved name; unknown names fall back to the default theme.
    pub fn by_name(name: &str) -> Theme {
        ALL.iter()
            .find(|t| t.name == name)
            .map(|t| (*t).clone())
            .unwrap_or(LUXURY)
    }

    // ── style helpers ─────────────────────────────────────────────────────────

    pub fn style_default(&self) -> Style {
        Style::default().fg(self.primary)
    }

    pub fn style_secondary(&self) -> Style {
        Style::default().fg(self.secondary)
    }

    pub fn style_accent(&self) -> Style {
        Style::default().fg(self.accent)
    }

    pub fn style_playing(&self) -> Style {
        Style::default().fg(self.playing)
    }

    pub fn style_error(&self) -> Style {
        Style::default().fg(self.error)
    }

    pub fn style_muted(&self) -> Style {
        Style::default().fg(self.muted)
    }

    pub fn style_selected(&self) -> Style {
        Style::default().bg(self.selection_bg).fg(self.primary)
    }

    pub fn style_selected_focused(&self) -> Style {
        Style::default()
            .bg(self.selection_bg)
            .fg(self.primary)
            .add_modifier(Modifier::BOLD)
    }

    pub fn style_border(&self, focused: bool) -> Style {
        if focused {
            Style::default().fg(self.border_focused)
        } else {
            Style::default().fg(self.border)
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        LUXURY
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_by_name_finds_every_theme() {
        for theme in ALL {
            assert_eq!(&Theme::by_name(theme.name), theme);
        }
    }

    #[test]
    fn test_unknown_name_falls_back() {
        assert_eq!(Theme::by_name("no-such-theme").name, "luxury");
    }
}
