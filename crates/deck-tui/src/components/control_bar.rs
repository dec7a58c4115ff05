//! ControlBar component — now-playing line, transport state and volume.

use std::time::Instant;

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::{Alignment, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::{
    action::{Action, ComponentId},
    app::AppState,
    component::Component,
};

const SPINNER: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

pub struct ControlBar {
    started: Instant,
}

impl ControlBar {
    pub fn new() -> Self {
        Self {
            started: Instant::now(),
        }
    }

    fn spinner_frame(&self) -> &'static str {
        let idx = (self.started.elapsed().as_millis() / 100) as usize % SPINNER.len();
        SPINNER[idx]
    }
}

impl Component for ControlBar {
    fn id(&self) -> ComponentId {
        ComponentId::ControlBar
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Enter => vec![Action::TogglePlay],
            KeyCode::Char('s') => vec![Action::ShuffleCurrent],
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let theme = &state.theme;
        let intent = &state.intent;

        let channel = state.catalog.channel_by_id(&intent.channel_id);
        let title = channel.map(|c| c.title.as_str()).unwrap_or("—");
        let author = channel.map(|c| c.author.as_str()).unwrap_or("");

        let (icon, icon_style) = if intent.is_loading {
            (self.spinner_frame(), theme.style_accent())
        } else if intent.playback_blocked {
            ("⚠", theme.style_error())
        } else if intent.desired_playing {
            ("▶", theme.style_playing())
        } else {
            ("⏸", theme.style_secondary())
        };

        let vol_cells = (intent.volume as usize + 9) / 10;
        let vol_bar: String = "▮".repeat(vol_cells) + &"▯".repeat(10 - vol_cells);
        let vol_span = if intent.desired_muted {
            Span::styled(format!(" muted {}", vol_bar), theme.style_muted())
        } else {
            Span::styled(
                format!(" vol {:>3} {}", intent.volume, vol_bar),
                theme.style_secondary(),
            )
        };

        let mut spans = vec![
            Span::raw(" "),
            Span::styled(icon, icon_style),
            Span::raw(" "),
            Span::styled(truncate(title, area.width.saturating_sub(30) as usize), theme.style_default()),
        ];
        if !author.is_empty() {
            spans.push(Span::styled(format!("  {}", author), theme.style_secondary()));
        }

        let status_line = if intent.playback_blocked {
            Line::from(Span::styled(
                " playback blocked — press space to resume",
                theme.style_error(),
            ))
        } else if let Some(code) = intent.last_error {
            Line::from(Span::styled(
                format!(" stream error ({}) — pick another station", code),
                theme.style_error(),
            ))
        } else {
            Line::from(vol_span)
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.style_border(focused))
            .title(" now playing ");
        frame.render_widget(
            Paragraph::new(vec![Line::from(spans), status_line]).block(block),
            area,
        );

        // Clock in the top-right corner of the bar.
        let clock_area = Rect::new(
            area.x + 1,
            area.y + 1,
            area.width.saturating_sub(3),
            1,
        );
        frame.render_widget(
            Paragraph::new(Line::from(Span::styled(
                clock_string(&chrono::Local::now().naive_local()),
                theme.style_secondary(),
            )))
            .alignment(Alignment::Right),
            clock_area,
        );
    }
}

/// Header clock: local date and time.
fn clock_string(now: &chrono::NaiveDateTime) -> String {
    now.format("%a %d/%m %H:%M").to_string()
}

fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    let mut out = String::new();
    let mut w = 0;
    for ch in s.chars() {
        let cw = UnicodeWidthStr::width(ch.to_string().as_str());
        if w + cw + 1 > max {
            break;
        }
        w += cw;
        out.push(ch);
    }
    out.push('…');
    out
}
