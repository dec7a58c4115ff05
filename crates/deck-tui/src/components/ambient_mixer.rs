//! AmbientMixer component — per-sound level sliders layered under the music.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    ambient::SOUNDS,
    app::AppState,
    component::Component,
};

const LEVEL_STEP: u8 = 10;

pub struct AmbientMixer {
    selected: usize,
}

impl AmbientMixer {
    pub fn new() -> Self {
        Self { selected: 0 }
    }

    fn adjust(&self, state: &AppState, delta: i16) -> Vec<Action> {
        let sound = SOUNDS[self.selected];
        let current = state.ambient_levels.get(sound).copied().unwrap_or(0);
        let next = step_level(current, delta);
        if next == current {
            return vec![];
        }
        vec![Action::SetAmbientLevel(sound.to_string(), next)]
    }
}

/// Move a level by `delta`, clamped to 0..=100.
fn step_level(current: u8, delta: i16) -> u8 {
    (current as i16 + delta).clamp(0, 100) as u8
}

impl Component for AmbientMixer {
    fn id(&self) -> ComponentId {
        ComponentId::AmbientMixer
    }

    fn handle_key(&mut self, key: KeyEvent, state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < SOUNDS.len() {
                    self.selected += 1;
                }
                vec![]
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                vec![]
            }
            KeyCode::Right | KeyCode::Char('l') => self.adjust(state, LEVEL_STEP as i16),
            KeyCode::Left | KeyCode::Char('h') => self.adjust(state, -(LEVEL_STEP as i16)),
            KeyCode::Char('0') => {
                let sound = SOUNDS[self.selected];
                if state.ambient_levels.get(sound).copied().unwrap_or(0) == 0 {
                    vec![]
                } else {
                    vec![Action::SetAmbientLevel(sound.to_string(), 0)]
                }
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let theme = &state.theme;
        let items: Vec<ListItem> = SOUNDS
            .iter()
            .map(|sound| {
                let level = state.ambient_levels.get(*sound).copied().unwrap_or(0);
                let cells = level as usize / LEVEL_STEP as usize;
                let bar: String = "▮".repeat(cells) + &"▯".repeat(10 - cells);
                let style = if level > 0 {
                    theme.style_default()
                } else {
                    theme.style_muted()
                };
                ListItem::new(Line::from(vec![
                    Span::styled(format!(" {:<8}", sound), style),
                    Span::styled(bar, theme.style_accent()),
                    Span::styled(format!(" {:>3}", level), theme.style_secondary()),
                ]))
            })
            .collect();

        let mut list_state = ListState::default();
        list_state.select(Some(self.selected));
        frame.render_stateful_widget(
            List::new(items)
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(theme.style_border(focused))
                        .title(" ambience "),
                )
                .highlight_style(if focused {
                    theme.style_selected_focused()
                } else {
                    theme.style_selected()
                }),
            area,
            &mut list_state,
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

    #[test]
    fn test_step_level_clamps() {
        assert_eq!(step_level(0, -10), 0);
        assert_eq!(step_level(0, 10), 10);
        assert_eq!(step_level(100, 10), 100);
        assert_eq!(step_level(95, 10), 100);
    }

    #[test]
    fn test_raise_emits_level_action() {
        let state = AppState::test_default();
        let mut m = AmbientMixer::new();
        let actions = m.handle_key(key(KeyCode::Char('l')), &state);
        match &actions[..] {
            [Action::SetAmbientLevel(sound, level)] => {
                assert_eq!(sound, "rain");
                assert_eq!(*level, 10);
            }
            other => panic!("unexpected actions: {:?}", other),
        }
    }

    #[test]
    fn test_lower_at_zero_is_noop() {
        let state = AppState::test_default();
        let mut m = AmbientMixer::new();
        assert!(m.handle_key(key(KeyCode::Char('h')), &state).is_empty());
        assert!(m.handle_key(key(KeyCode::Char('0')), &state).is_empty());
    }
}
