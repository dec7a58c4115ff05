//! Pomodoro component — work/break countdown with session tracking.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use deck_core::config::PomodoroConfig;

use crate::{
    action::{Action, ComponentId},
    app::AppState,
    component::Component,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Work,
    ShortBreak,
    LongBreak,
}

impl Phase {
    fn label(&self) -> &'static str {
        match self {
            Phase::Work => "focus",
            Phase::ShortBreak => "short break",
            Phase::LongBreak => "long break",
        }
    }
}

pub struct Pomodoro {
    cfg: PomodoroConfig,
    phase: Phase,
    remaining_secs: u32,
    running: bool,
    /// Completed work sessions this cycle run.
    completed: u16,
}

impl Pomodoro {
    pub fn new(cfg: PomodoroConfig) -> Self {
        let remaining = cfg.work_minutes as u32 * 60;
        Self {
            cfg,
            phase: Phase::Work,
            remaining_secs: remaining,
            running: false,
            completed: 0,
        }
    }

    fn phase_secs(&self, phase: Phase) -> u32 {
        let minutes = match phase {
            Phase::Work => self.cfg.work_minutes,
            Phase::ShortBreak => self.cfg.short_break_minutes,
            Phase::LongBreak => self.cfg.long_break_minutes,
        };
        minutes as u32 * 60
    }

    /// Advance to the next phase. The timer stops so the user acknowledges
    /// each transition before the next countdown starts.
    fn advance(&mut self) {
        let next = match self.phase {
            Phase::Work => {
                self.completed += 1;
                if self.completed % self.cfg.sessions_per_cycle == 0 {
                    Phase::LongBreak
                } else {
                    Phase::ShortBreak
                }
            }
            Phase::ShortBreak | Phase::LongBreak => Phase::Work,
        };
        self.phase = next;
        self.remaining_secs = self.phase_secs(next);
        self.running = false;
    }

    fn reset_phase(&mut self) {
        self.remaining_secs = self.phase_secs(self.phase);
        self.running = false;
    }
}

impl Component for Pomodoro {
    fn id(&self) -> ComponentId {
        ComponentId::Pomodoro
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Enter => self.running = !self.running,
            KeyCode::Char('r') => self.reset_phase(),
            KeyCode::Char('n') => self.advance(),
            _ => {}
        }
        vec![]
    }

    fn second_tick(&mut self, _state: &AppState) -> Vec<Action> {
        if self.running {
            self.remaining_secs = self.remaining_secs.saturating_sub(1);
            if self.remaining_secs == 0 {
                self.advance();
            }
        }
        vec![]
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let theme = &state.theme;
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.style_border(focused))
            .title(" pomodoro ");
        let inner = block.inner(area);
        frame.render_widget(block, area);
        if inner.height < 2 {
            return;
        }

        let mins = self.remaining_secs / 60;
        let secs = self.remaining_secs % 60;
        let status = if self.running { "" } else { " ⏸" };
        let header = Line::from(vec![
            Span::styled(
                format!(" {} {:02}:{:02}{}", self.phase.label(), mins, secs, status),
                if self.phase == Phase::Work {
                    theme.style_accent()
                } else {
                    theme.style_playing()
                },
            ),
            Span::styled(
                format!("   sessions {}", self.completed),
                theme.style_secondary(),
            ),
        ]);
        frame.render_widget(
            Paragraph::new(header),
            Rect::new(inner.x, inner.y, inner.width, 1),
        );

        let total = self.phase_secs(self.phase).max(1);
        let ratio = 1.0 - self.remaining_secs as f64 / total as f64;
        frame.render_widget(
            Gauge::default()
                .gauge_style(theme.style_accent())
                .ratio(ratio.clamp(0.0, 1.0))
                .label(""),
            Rect::new(inner.x + 1, inner.y + 1, inner.width.saturating_sub(2), 1),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::AppState;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn pomodoro() -> Pomodoro {
        Pomodoro::new(PomodoroConfig::default())
    }

    fn run_out(p: &mut Pomodoro, state: &AppState) {
        p.running = true;
        while p.running {
            p.second_tick(state);
        }
    }

    #[test]
    fn test_work_session_counts_down_and_advances() {
        let state = AppState::test_default();
        let mut p = pomodoro();
        assert_eq!(p.remaining_secs, 25 * 60);
        p.handle_key(key(KeyCode::Enter), &state);
        assert!(p.running);
        p.second_tick(&state);
        assert_eq!(p.remaining_secs, 25 * 60 - 1);

        run_out(&mut p, &state);
        assert_eq!(p.phase, Phase::ShortBreak);
        assert_eq!(p.completed, 1);
        assert_eq!(p.remaining_secs, 5 * 60);
        assert!(!p.running, "timer waits for the user between phases");
    }

    #[test]
    fn test_long_break_every_fourth_session() {
        let state = AppState::test_default();
        let mut p = pomodoro();
        for session in 1..=4 {
            assert_eq!(p.phase, Phase::Work);
            run_out(&mut p, &state);
            if session < 4 {
                assert_eq!(p.phase, Phase::ShortBreak, "session {}", session);
                run_out(&mut p, &state);
            }
        }
        assert_eq!(p.phase, Phase::LongBreak);
        assert_eq!(p.remaining_secs, 15 * 60);
        run_out(&mut p, &state);
        assert_eq!(p.phase, Phase::Work);
    }

    #[test]
    fn test_reset_restores_phase_length() {
        let state = AppState::test_default();
        let mut p = pomodoro();
        p.running = true;
        for _ in 0..100 {
            p.second_tick(&state);
        }
        p.handle_key(key(KeyCode::Char('r')), &state);
        assert_eq!(p.remaining_secs, 25 * 60);
        assert!(!p.running);
    }

    #[test]
    fn test_skip_counts_work_session() {
        let state = AppState::test_default();
        let mut p = pomodoro();
        p.handle_key(key(KeyCode::Char('n')), &state);
        assert_eq!(p.phase, Phase::ShortBreak);
        assert_eq!(p.completed, 1);
    }
}
