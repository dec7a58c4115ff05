//! ThemePicker component — switch the active palette.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use crate::{
    action::{Action, ComponentId},
    app::AppState,
    component::Component,
    theme,
};

pub struct ThemePicker {
    selected: usize,
}

impl ThemePicker {
    pub fn new(current: &str) -> Self {
        let selected = theme::ALL
            .iter()
            .position(|t| t.name == current)
            .unwrap_or(0);
        Self { selected }
    }
}

impl Component for ThemePicker {
    fn id(&self) -> ComponentId {
        ComponentId::ThemePicker
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < theme::ALL.len() {
                    self.selected += 1;
                }
                vec![]
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.selected = self.selected.saturating_sub(1);
                vec![]
            }
            KeyCode::Enter => {
                vec![Action::SelectTheme(theme::ALL[self.selected].name.to_string())]
            }
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let active = &state.theme;
        let items: Vec<ListItem> = theme::ALL
            .iter()
            .map(|t| {
                let marker = if t.name == active.name { "● " } else { "  " };
                ListItem::new(Line::from(vec![
                    Span::styled(marker, active.style_playing()),
                    // swatch in the theme's own accent so the list previews it
                    Span::styled("▉ ", ratatui::style::Style::default().fg(t.accent)),
                    Span::styled(t.name, active.style_default()),
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
                        .border_style(active.style_border(focused))
                        .title(" theme "),
                )
                .highlight_style(if focused {
                    active.style_selected_focused()
                } else {
                    active.style_selected()
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
    fn test_starts_on_current_theme() {
        let picker = ThemePicker::new("synthwave");
        assert_eq!(theme::ALL[picker.selected].name, "synthwave");
    }

    #[test]
    fn test_enter_selects_highlighted_theme() {
        let state = AppState::test_default();
        let mut picker = ThemePicker::new("luxury");
        picker.handle_key(key(KeyCode::Char('j')), &state);
        let actions = picker.handle_key(key(KeyCode::Enter), &state);
        match &actions[..] {
            [Action::SelectTheme(name)] => assert_eq!(name, "coffee"),
            other => panic!("unexpected actions: {:?}", other),
        }
    }
}
