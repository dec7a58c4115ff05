//! Tasks component — a small per-session todo list, persisted between runs.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use serde::{Deserialize, Serialize};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::{
    action::{Action, ComponentId},
    app::AppState,
    component::Component,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskItem {
    pub text: String,
    pub done: bool,
}

enum Mode {
    Normal,
    Insert(Input),
}

pub struct Tasks {
    items: Vec<TaskItem>,
    selected: usize,
    mode: Mode,
}

impl Tasks {
    pub fn new(items: Vec<TaskItem>) -> Self {
        Self {
            items,
            selected: 0,
            mode: Mode::Normal,
        }
    }

    fn persist(&self) -> Action {
        Action::PersistTasks(self.items.clone())
    }

    fn clamp_selection(&mut self) {
        if self.selected >= self.items.len() {
            self.selected = self.items.len().saturating_sub(1);
        }
    }
}

impl Component for Tasks {
    fn id(&self) -> ComponentId {
        ComponentId::Tasks
    }

    fn wants_text_input(&self) -> bool {
        matches!(self.mode, Mode::Insert(_))
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match &mut self.mode {
            Mode::Insert(input) => match key.code {
                KeyCode::Enter => {
                    let text = input.value().trim().to_string();
                    self.mode = Mode::Normal;
                    if text.is_empty() {
                        return vec![];
                    }
                    self.items.push(TaskItem { text, done: false });
                    self.selected = self.items.len() - 1;
                    vec![self.persist()]
                }
                KeyCode::Esc => {
                    self.mode = Mode::Normal;
                    vec![]
                }
                _ => {
                    input.handle_event(&Event::Key(key));
                    vec![]
                }
            },
            Mode::Normal => match key.code {
                KeyCode::Char('a') => {
                    self.mode = Mode::Insert(Input::default());
                    vec![]
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if self.selected + 1 < self.items.len() {
                        self.selected += 1;
                    }
                    vec![]
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.selected = self.selected.saturating_sub(1);
                    vec![]
                }
                KeyCode::Char('x') | KeyCode::Enter => {
                    if let Some(item) = self.items.get_mut(self.selected) {
                        item.done = !item.done;
                        return vec![self.persist()];
                    }
                    vec![]
                }
                KeyCode::Char('d') => {
                    if self.selected < self.items.len() {
                        self.items.remove(self.selected);
                        self.clamp_selection();
                        return vec![self.persist()];
                    }
                    vec![]
                }
                // done items pile up; one key sweeps them out
                KeyCode::Char('D') => {
                    let before = self.items.len();
                    self.items.retain(|t| !t.done);
                    self.clamp_selection();
                    if self.items.len() != before {
                        return vec![self.persist()];
                    }
                    vec![]
                }
                _ => vec![],
            },
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let theme = &state.theme;
        let done_count = self.items.iter().filter(|t| t.done).count();
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.style_border(focused))
            .title(format!(" tasks {}/{} ", done_count, self.items.len()));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let list_area = match &self.mode {
            Mode::Insert(_) => Rect::new(
                inner.x,
                inner.y,
                inner.width,
                inner.height.saturating_sub(1),
            ),
            Mode::Normal => inner,
        };

        let items: Vec<ListItem> = self
            .items
            .iter()
            .map(|t| {
                let (mark, style) = if t.done {
                    ("[x] ", theme.style_muted())
                } else {
                    ("[ ] ", theme.style_default())
                };
                ListItem::new(Line::from(vec![
                    Span::styled(mark, theme.style_secondary()),
                    Span::styled(t.text.clone(), style),
                ]))
            })
            .collect();
        let mut list_state = ListState::default();
        if !self.items.is_empty() {
            list_state.select(Some(self.selected));
        }
        frame.render_stateful_widget(
            List::new(items).highlight_style(if focused {
                theme.style_selected_focused()
            } else {
                theme.style_selected()
            }),
            list_area,
            &mut list_state,
        );

        if let Mode::Insert(input) = &self.mode {
            let prompt_area = Rect::new(
                inner.x,
                inner.y + inner.height.saturating_sub(1),
                inner.width,
                1,
            );
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled("+ ", theme.style_accent()),
                    Span::styled(input.value(), theme.style_default()),
                ])),
                prompt_area,
            );
            frame.set_cursor_position((
                prompt_area.x + 2 + input.visual_cursor() as u16,
                prompt_area.y,
            ));
        }
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

    fn type_text(t: &mut Tasks, state: &AppState, text: &str) -> Vec<Action> {
        t.handle_key(key(KeyCode::Char('a')), state);
        for ch in text.chars() {
            t.handle_key(key(KeyCode::Char(ch)), state);
        }
        t.handle_key(key(KeyCode::Enter), state)
    }

    #[test]
    fn test_add_task_persists() {
        let state = AppState::test_default();
        let mut t = Tasks::new(Vec::new());
        let actions = type_text(&mut t, &state, "ship the release");
        match &actions[..] {
            [Action::PersistTasks(items)] => {
                assert_eq!(items.len(), 1);
                assert_eq!(items[0].text, "ship the release");
                assert!(!items[0].done);
            }
            other => panic!("unexpected actions: {:?}", other),
        }
    }

    #[test]
    fn test_global_shortcuts_suppressed_while_typing() {
        let state = AppState::test_default();
        let mut t = Tasks::new(Vec::new());
        t.handle_key(key(KeyCode::Char('a')), &state);
        assert!(t.wants_text_input());
        t.handle_key(key(KeyCode::Esc), &state);
        assert!(!t.wants_text_input());
    }

    #[test]
    fn test_toggle_and_sweep_done() {
        let state = AppState::test_default();
        let mut t = Tasks::new(vec![
            TaskItem { text: "one".into(), done: false },
            TaskItem { text: "two".into(), done: false },
        ]);
        t.handle_key(key(KeyCode::Char('x')), &state);
        assert!(t.items[0].done);
        let actions = t.handle_key(key(KeyCode::Char('D')), &state);
        assert_eq!(t.items.len(), 1);
        assert_eq!(t.items[0].text, "two");
        assert!(matches!(&actions[..], [Action::PersistTasks(_)]));
    }

    #[test]
    fn test_delete_keeps_selection_in_range() {
        let state = AppState::test_default();
        let mut t = Tasks::new(vec![
            TaskItem { text: "one".into(), done: false },
            TaskItem { text: "two".into(), done: false },
        ]);
        t.handle_key(key(KeyCode::Char('j')), &state);
        t.handle_key(key(KeyCode::Char('d')), &state);
        assert_eq!(t.selected, 0);
        t.handle_key(key(KeyCode::Char('d')), &state);
        assert!(t.items.is_empty());
        // deleting from an empty list is a no-op
        let actions = t.handle_key(key(KeyCode::Char('d')), &state);
        assert!(actions.is_empty());
    }

    #[test]
    fn test_blank_input_is_discarded() {
        let state = AppState::test_default();
        let mut t = Tasks::new(Vec::new());
        let actions = type_text(&mut t, &state, "   ");
        assert!(actions.is_empty());
        assert!(t.items.is_empty());
    }
}
