//! HelpOverlay component — centered popup with keyboard shortcut reference.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app::AppState,
    component::Component,
};

pub struct HelpOverlay {
    pub visible: bool,
}

impl HelpOverlay {
    pub fn new() -> Self {
        Self { visible: false }
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
    }
}

impl Component for HelpOverlay {
    fn id(&self) -> ComponentId {
        ComponentId::HelpOverlay
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if !self.visible {
            return vec![];
        }
        match key.code {
            KeyCode::Char('?') | KeyCode::Char('q') | KeyCode::Esc => {
                self.visible = false;
            }
            _ => {}
        }
        // Consume all keys while overlay is open
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, _focused: bool, state: &AppState) {
        if !self.visible {
            return;
        }
        let theme = &state.theme;
        let popup = centered_rect(64, 26, area);

        let section = |label: &'static str| {
            Line::from(Span::styled(
                format!(" {}", label),
                theme.style_muted().add_modifier(Modifier::BOLD),
            ))
        };
        let row = |k: &'static str, d: &'static str| {
            Line::from(vec![
                Span::raw(" "),
                Span::styled(
                    format!("{:<16}", k),
                    theme.style_default().add_modifier(Modifier::BOLD),
                ),
                Span::styled(d, theme.style_secondary()),
            ])
        };

        let help_lines: Vec<Line> = vec![
            Line::from(Span::styled(
                " keyboard shortcuts",
                theme.style_default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            section("playback"),
            row("space", "play / pause"),
            row("m", "mute / unmute"),
            row("- / +", "volume down / up"),
            row("S", "shuffle within current category"),
            row("enter", "play selected station"),
            Line::from(""),
            section("panes"),
            row("tab / shift-tab", "focus next / previous pane"),
            row("1-7", "focus pane directly"),
            Line::from(""),
            section("lists"),
            row("↑ / ↓  or  j / k", "move selection"),
            row("a", "add task / note line"),
            row("d / D", "delete item / sweep done tasks"),
            row("h / l", "ambient level down / up"),
            Line::from(""),
            row("?", "toggle this help overlay"),
            row("q / Ctrl+C", "quit"),
            Line::from(""),
            Line::from(Span::styled(" press ? or esc to close", theme.style_muted())),
        ];

        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(help_lines)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(theme.style_border(false)),
                )
                .wrap(Wrap { trim: false }),
            popup,
        );
    }
}

fn centered_rect(percent_x: u16, height: u16, r: Rect) -> Rect {
    let vert = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vert[1])[1]
}
