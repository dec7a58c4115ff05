//! Notes component — a persistent line-oriented scratchpad.

use ratatui::crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::{
    action::{Action, ComponentId},
    app::AppState,
    component::Component,
};

enum Mode {
    Normal,
    /// Editing a line: `Some(idx)` replaces that line, `None` appends.
    Insert { input: Input, editing: Option<usize> },
}

pub struct Notes {
    lines: Vec<String>,
    selected: usize,
    mode: Mode,
}

impl Notes {
    pub fn new(lines: Vec<String>) -> Self {
        Self {
            lines,
            selected: 0,
            mode: Mode::Normal,
        }
    }

    fn persist(&self) -> Action {
        Action::PersistNotes(self.lines.clone())
    }
}

impl Component for Notes {
    fn id(&self) -> ComponentId {
        ComponentId::Notes
    }

    fn wants_text_input(&self) -> bool {
        matches!(self.mode, Mode::Insert { .. })
    }

    fn handle_key(&mut self, key: KeyEvent, _state: &AppState) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        match &mut self.mode {
            Mode::Insert { input, editing } => match key.code {
                KeyCode::Enter => {
                    let text = input.value().to_string();
                    let editing = *editing;
                    self.mode = Mode::Normal;
                    match editing {
                        Some(idx) if idx < self.lines.len() => {
                            if text.is_empty() {
                                // an emptied line is invisible and
                                // unselectable, so drop it instead
                                self.lines.remove(idx);
                                self.selected =
                                    self.selected.min(self.lines.len().saturating_sub(1));
                            } else {
                                self.lines[idx] = text;
                            }
                        }
                        _ => {
                            if text.is_empty() {
                                return vec![];
                            }
                            self.lines.push(text);
                            self.selected = self.lines.len() - 1;
                        }
                    }
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
                KeyCode::Char('a') | KeyCode::Char('o') => {
                    self.mode = Mode::Insert {
                        input: Input::default(),
                        editing: None,
                    };
                    vec![]
                }
                KeyCode::Char('e') | KeyCode::Enter => {
                    if let Some(line) = self.lines.get(self.selected) {
                        self.mode = Mode::Insert {
                            input: Input::new(line.clone()),
                            editing: Some(self.selected),
                        };
                    }
                    vec![]
                }
                KeyCode::Char('d') => {
                    if self.selected < self.lines.len() {
                        self.lines.remove(self.selected);
                        if self.selected >= self.lines.len() {
                            self.selected = self.lines.len().saturating_sub(1);
                        }
                        return vec![self.persist()];
                    }
                    vec![]
                }
                KeyCode::Down | KeyCode::Char('j') => {
                    if self.selected + 1 < self.lines.len() {
                        self.selected += 1;
                    }
                    vec![]
                }
                KeyCode::Up | KeyCode::Char('k') => {
                    self.selected = self.selected.saturating_sub(1);
                    vec![]
                }
                _ => vec![],
            },
        }
    }

    fn draw(&mut self, frame: &mut Frame, area: Rect, focused: bool, state: &AppState) {
        let theme = &state.theme;
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(theme.style_border(focused))
            .title(" notes ");
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let list_area = match &self.mode {
            Mode::Insert { .. } => Rect::new(
                inner.x,
                inner.y,
                inner.width,
                inner.height.saturating_sub(1),
            ),
            Mode::Normal => inner,
        };

        let items: Vec<ListItem> = self
            .lines
            .iter()
            .map(|l| ListItem::new(Line::from(Span::styled(l.clone(), theme.style_default()))))
            .collect();
        let mut list_state = ListState::default();
        if !self.lines.is_empty() {
            list_state.select(Some(self.selected));
        }
        frame.render_stateful_widget(
            List::new(items).highlight_style(if focused {
                theme.style_selected()
            } else {
                Default::default()
            }),
            list_area,
            &mut list_state,
        );

        if let Mode::Insert { input, .. } = &self.mode {
            let prompt_area = Rect::new(
                inner.x,
                inner.y + inner.height.saturating_sub(1),
                inner.width,
                1,
            );
            frame.render_widget(
                Paragraph::new(Line::from(vec![
                    Span::styled("> ", theme.style_accent()),
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
