//! StationSelector component — categories and channels, pick with Enter.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
    Frame,
};

use deck_core::catalog::Catalog;

use crate::{
    action::{Action, ComponentId},
    app::AppState,
    component::Component,
};

/// Flattened list row: either a category header or a selectable channel.
#[derive(Debug, Clone, PartialEq)]
enum Row {
    Category { name: String },
    Channel {
        category_id: String,
        channel_id: String,
        title: String,
    },
}

pub struct StationSelector {
    rows: Vec<Row>,
    selected: usize,
}

impl StationSelector {
    pub fn new(catalog: &Catalog) -> Self {
        let mut rows = Vec::new();
        for cat in &catalog.categories {
            rows.push(Row::Category {
                name: cat.name.clone(),
            });
            for ch in &cat.channels {
                rows.push(Row::Channel {
                    category_id: cat.id.clone(),
                    channel_id: ch.id.clone(),
                    title: ch.title.clone(),
                });
            }
        }
        let mut s = Self { rows, selected: 0 };
        s.selected = s.next_selectable(0, 1).unwrap_or(0);
        s
    }

    /// Nearest channel row from `from` in `dir` (1 = down, -1 = up),
    /// skipping category headers.
    fn next_selectable(&self, from: usize, dir: isize) -> Option<usize> {
        let mut i = from as isize;
        loop {
            if i < 0 || i as usize >= self.rows.len() {
                return None;
            }
            if matches!(self.rows[i as usize], Row::Channel { .. }) {
                return Some(i as usize);
            }
            i += dir;
        }
    }

    fn move_selection(&mut self, dir: isize) {
        let start = self.selected as isize + dir;
        if start < 0 {
            return;
        }
        if let Some(idx) = self.next_selectable(start as usize, dir) {
            self.selected = idx;
        }
    }

    fn selected_channel(&self) -> Option<(&str, &str)> {
        match self.rows.get(self.selected)? {
            Row::Channel {
                category_id,
                channel_id,
                ..
            } => Some((category_id.as_str(), channel_id.as_str())),
            Row::Category { .. } => None,
        }
    }
}

impl Component for StationSelector {
    fn id(&self) -> ComponentId {
        ComponentId::StationSelector
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match key.code {
            KeyCode::Down | KeyCode::Char('j') => {
                self.move_selection(1);
                vec![]
            }
            KeyCode::Up | KeyCode::Char('k') => {
                self.move_selection(-1);
                vec![]
            }
            KeyCode::Char('g') => {
                self.selected = self.next_selectable(0, 1).unwrap_or(0);
                vec![]
            }
            KeyCode::Char('G') => {
                self.selected = self
                    .next_selectable(self.rows.len().saturating_sub(1), -1)
                    .unwrap_or(self.selected);
                vec![]
            }
            KeyCode::Enter => match self.selected_channel() {
                Some((cat, ch)) => vec![Action::PlayChannel {
                    category: cat.to_string(),
                    channel: ch.to_string(),
                }],
                None => vec![],
            },
            KeyCode::Char('s') => match self.selected_channel() {
                Some((cat, _)) => vec![Action::ShuffleCategory(cat.to_string())],
                None => vec![],
            },
            _ => vec![],
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let theme = &state.theme;
        let items: Vec<ListItem> = self
            .rows
            .iter()
            .map(|row| match row {
                Row::Category { name, .. } => ListItem::new(Line::from(Span::styled(
                    format!("▾ {}", name),
                    theme.style_accent(),
                ))),
                Row::Channel {
                    channel_id, title, ..
                } => {
                    let playing = *channel_id == state.intent.channel_id;
                    let marker = if playing { "● " } else { "  " };
                    let style = if playing {
                        theme.style_playing()
                    } else {
                        theme.style_default()
                    };
                    ListItem::new(Line::from(Span::styled(
                        format!("{}{}", marker, title),
                        style,
                    )))
                }
            })
            .collect();

        let mut list_state = ListState::default();
        list_state.select(Some(self.selected));

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(theme.style_border(focused))
                    .title(" stations "),
            )
            .highlight_style(if focused {
                theme.style_selected_focused()
            } else {
                theme.style_selected()
            });
        frame.render_stateful_widget(list, area, &mut list_state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn selector() -> StationSelector {
        StationSelector::new(&Catalog::builtin())
    }

    #[test]
    fn test_initial_selection_is_first_channel() {
        let s = selector();
        assert_eq!(s.selected_channel().map(|(c, _)| c.to_string()), Some("lofi".to_string()));
    }

    #[test]
    fn test_navigation_skips_category_headers() {
        let mut s = selector();
        let state = crate::app::AppState::test_default();
        // walk down the whole list; selection must always be a channel
        for _ in 0..s.rows.len() {
            s.handle_key(key(KeyCode::Down), &state);
            assert!(s.selected_channel().is_some());
        }
        // and back up
        for _ in 0..s.rows.len() {
            s.handle_key(key(KeyCode::Up), &state);
            assert!(s.selected_channel().is_some());
        }
        assert_eq!(s.selected_channel().unwrap().1, "jfKfPfyJRdk");
    }

    #[test]
    fn test_enter_emits_play_for_selected_pair() {
        let mut s = selector();
        let state = crate::app::AppState::test_default();
        s.handle_key(key(KeyCode::Down), &state);
        let actions = s.handle_key(key(KeyCode::Enter), &state);
        match &actions[..] {
            [Action::PlayChannel { category, channel }] => {
                assert_eq!(category, "lofi");
                assert_eq!(channel, "h_a3tqywv3I");
            }
            other => panic!("unexpected actions: {:?}", other),
        }
    }

    #[test]
    fn test_shuffle_uses_selected_category() {
        let mut s = selector();
        let state = crate::app::AppState::test_default();
        s.handle_key(key(KeyCode::Char('G')), &state);
        let actions = s.handle_key(key(KeyCode::Char('s')), &state);
        match &actions[..] {
            [Action::ShuffleCategory(cat)] => assert_eq!(cat, "cyberpunk"),
            other => panic!("unexpected actions: {:?}", other),
        }
    }
}
