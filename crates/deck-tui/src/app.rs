//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns the intent store, the reconciler, all components and
//!   `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background
//!   tasks (terminal input, widget events).
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.
//! - After every batch of store mutations the reconciler syncs, so widget
//!   commands always reflect the latest intent.

use std::collections::HashMap;
use std::io;
use std::time::Duration;

use ratatui::crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{info, warn};

use deck_core::catalog::Catalog;
use deck_core::config::Config;
use deck_core::intent::{IntentStore, PlaybackIntent};
use deck_core::reconciler::PlaybackReconciler;
use deck_core::storage::KvStore;
use deck_core::widget::{VideoWidgetPort, WidgetEvent};

use crate::{
    action::{Action, ComponentId},
    ambient::{AmbientPlayer, SOUNDS},
    component::Component,
    components::{
        ambient_mixer::AmbientMixer, control_bar::ControlBar, help_overlay::HelpOverlay,
        notes::Notes, pomodoro::Pomodoro, station_selector::StationSelector, tasks::Tasks,
        theme_picker::ThemePicker,
    },
    mpv_widget::MpvWidget,
    theme::Theme,
};

/// Last played channel, persisted for session restore.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SavedChannel {
    pub category: String,
    pub channel: String,
}

// ── Internal event bus ────────────────────────────────────────────────────────

enum AppMessage {
    Input(Event),
    Widget(WidgetEvent),
}

/// The shared state of the application.
/// Components read this; only the App event-loop writes to it.
pub struct AppState {
    pub intent: PlaybackIntent,
    pub catalog: Catalog,
    pub theme: Theme,
    pub ambient_levels: HashMap<String, u8>,
}

impl AppState {
    #[cfg(test)]
    pub fn test_default() -> Self {
        let catalog = Catalog::builtin();
        let store = IntentStore::new(catalog.clone(), 50).unwrap();
        Self {
            intent: store.snapshot(),
            catalog,
            theme: Theme::default(),
            ambient_levels: HashMap::new(),
        }
    }
}

const FOCUS_ORDER: [ComponentId; 7] = [
    ComponentId::StationSelector,
    ComponentId::ControlBar,
    ComponentId::Pomodoro,
    ComponentId::Tasks,
    ComponentId::Notes,
    ComponentId::AmbientMixer,
    ComponentId::ThemePicker,
];

// ── App ───────────────────────────────────────────────────────────────────────

pub struct App {
    store: IntentStore,
    reconciler: PlaybackReconciler<MpvWidget>,
    widget_handle: MpvWidget,
    kv: KvStore,
    ambient: AmbientPlayer,

    pub state: AppState,

    station_selector: StationSelector,
    control_bar: ControlBar,
    pomodoro: Pomodoro,
    tasks: Tasks,
    notes: Notes,
    ambient_mixer: AmbientMixer,
    theme_picker: ThemePicker,
    help_overlay: HelpOverlay,

    focused: ComponentId,
    should_quit: bool,
}

impl App {
    pub fn new(
        config: &Config,
        store: IntentStore,
        reconciler: PlaybackReconciler<MpvWidget>,
        widget_handle: MpvWidget,
        kv: KvStore,
        mut ambient: AmbientPlayer,
    ) -> Self {
        let theme_name: String = kv.get("theme").unwrap_or_default();
        let theme = Theme::by_name(&theme_name);
        let tasks: Vec<crate::components::tasks::TaskItem> = kv.get("tasks").unwrap_or_default();
        let notes: Vec<String> = kv.get("notes").unwrap_or_default();

        // Restart saved ambient beds. Unknown sound names in old state files
        // are dropped.
        let saved_levels: HashMap<String, u8> = kv.get("ambient").unwrap_or_default();
        for (sound, level) in &saved_levels {
            if SOUNDS.contains(&sound.as_str()) {
                ambient.set_level(sound, *level);
            }
        }

        let catalog = store.catalog().clone();
        let state = AppState {
            intent: store.snapshot(),
            catalog: catalog.clone(),
            theme: theme.clone(),
            ambient_levels: ambient.levels().clone(),
        };

        Self {
            store,
            reconciler,
            widget_handle,
            kv,
            ambient,
            station_selector: StationSelector::new(&catalog),
            control_bar: ControlBar::new(),
            pomodoro: Pomodoro::new(config.pomodoro.clone()),
            tasks: Tasks::new(tasks),
            notes: Notes::new(notes),
            ambient_mixer: AmbientMixer::new(),
            theme_picker: ThemePicker::new(theme.name),
            help_overlay: HelpOverlay::new(),
            state,
            focused: ComponentId::StationSelector,
            should_quit: false,
        }
    }

    // ── Main run loop ─────────────────────────────────────────────────────────

    pub async fn run(mut self, mut widget_rx: mpsc::Receiver<WidgetEvent>) -> anyhow::Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let (tx, mut rx) = mpsc::channel::<AppMessage>(256);

        // ── Background task: keyboard events ──────────────────────────────────
        let input_tx = tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if input_tx.blocking_send(AppMessage::Input(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Background task: widget events ────────────────────────────────────
        let widget_tx = tx.clone();
        tokio::spawn(async move {
            while let Some(ev) = widget_rx.recv().await {
                if widget_tx.send(AppMessage::Widget(ev)).await.is_err() {
                    break;
                }
            }
        });

        // ── Periodic timers ───────────────────────────────────────────────────
        let mut second_tick = tokio::time::interval(Duration::from_secs(1));
        second_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Spinner animation while a stream is loading.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(200));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    self.handle_message(msg);
                    // Drain whatever queued up behind it before redrawing.
                    while let Ok(next) = rx.try_recv() {
                        self.handle_message(next);
                    }
                    needs_redraw = true;
                }

                _ = second_tick.tick() => {
                    let actions = {
                        let s = &self.state;
                        let mut all = Vec::new();
                        all.extend(self.pomodoro.second_tick(s));
                        all.extend(self.tasks.second_tick(s));
                        all.extend(self.notes.second_tick(s));
                        all
                    };
                    for action in actions {
                        self.dispatch(action);
                    }
                    self.after_mutations();
                    needs_redraw = true;
                }

                _ = ui_tick.tick() => {
                    if self.state.intent.is_loading {
                        needs_redraw = true;
                    }
                }
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        let _ = self.widget_handle.destroy();
        self.ambient.stop_all();
        disable_raw_mode()?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
        terminal.show_cursor()?;

        Ok(())
    }

    fn handle_message(&mut self, msg: AppMessage) {
        match msg {
            AppMessage::Input(Event::Key(key)) => self.handle_key(key),
            AppMessage::Input(_) => {}
            AppMessage::Widget(ev) => {
                if let Err(e) = self.reconciler.fold_event(&mut self.store, ev) {
                    warn!("widget command failed: {}", e);
                }
                self.after_mutations();
            }
        }
    }

    // ── Key routing ───────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) {
        if key.kind == KeyEventKind::Release {
            return;
        }

        // Ctrl+C always quits, even mid-text-entry.
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        if self.help_overlay.visible {
            self.help_overlay.handle_key(key, &self.state);
            return;
        }

        // While a component is consuming text, it gets every key.
        if self.focused_component().wants_text_input() {
            let actions = self.focused_handle_key(key);
            for action in actions {
                self.dispatch(action);
            }
            self.after_mutations();
            return;
        }

        let global = match key.code {
            KeyCode::Char('q') => Some(Action::Quit),
            KeyCode::Char('?') => Some(Action::ToggleHelp),
            KeyCode::Char(' ') => Some(Action::TogglePlay),
            KeyCode::Char('m') => Some(Action::ToggleMute),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::Volume(5)),
            KeyCode::Char('-') => Some(Action::Volume(-5)),
            KeyCode::Char('S') => Some(Action::ShuffleCurrent),
            KeyCode::Tab => Some(Action::FocusNext),
            KeyCode::BackTab => Some(Action::FocusPrev),
            KeyCode::Char(c @ '1'..='7') => {
                let idx = c as usize - '1' as usize;
                Some(Action::FocusPane(FOCUS_ORDER[idx]))
            }
            _ => None,
        };

        if let Some(action) = global {
            self.dispatch(action);
        } else {
            let actions = self.focused_handle_key(key);
            for action in actions {
                self.dispatch(action);
            }
        }
        self.after_mutations();
    }

    /// Matched per-field so the component borrow stays disjoint from
    /// `self.state`.
    fn focused_handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        let s = &self.state;
        match self.focused {
            ComponentId::StationSelector => self.station_selector.handle_key(key, s),
            ComponentId::ControlBar => self.control_bar.handle_key(key, s),
            ComponentId::Pomodoro => self.pomodoro.handle_key(key, s),
            ComponentId::Tasks => self.tasks.handle_key(key, s),
            ComponentId::Notes => self.notes.handle_key(key, s),
            ComponentId::AmbientMixer => self.ambient_mixer.handle_key(key, s),
            ComponentId::ThemePicker => self.theme_picker.handle_key(key, s),
            ComponentId::HelpOverlay => self.help_overlay.handle_key(key, s),
        }
    }

    fn focused_component(&self) -> &dyn Component {
        match self.focused {
            ComponentId::StationSelector => &self.station_selector,
            ComponentId::ControlBar => &self.control_bar,
            ComponentId::Pomodoro => &self.pomodoro,
            ComponentId::Tasks => &self.tasks,
            ComponentId::Notes => &self.notes,
            ComponentId::AmbientMixer => &self.ambient_mixer,
            ComponentId::ThemePicker => &self.theme_picker,
            ComponentId::HelpOverlay => &self.help_overlay,
        }
    }

    // ── Action dispatch ───────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::PlayChannel { category, channel } => {
                self.store.set_channel(&category, &channel);
                self.persist("channel", &SavedChannel { category, channel });
            }
            Action::ShuffleCategory(category) => {
                self.store.set_random_channel(&category);
                self.persist_current_channel();
            }
            Action::ShuffleCurrent => {
                let current = self.store.snapshot().channel_id;
                if let Some(cat) = self.store.catalog().category_of(&current) {
                    let cat_id = cat.id.clone();
                    self.store.set_random_channel(&cat_id);
                    self.persist_current_channel();
                }
            }
            Action::TogglePlay => self.store.toggle_playing(),
            Action::ToggleMute => {
                self.store.toggle_mute();
                self.persist("muted", &self.store.snapshot().desired_muted);
            }
            Action::Volume(delta) => {
                let volume = self.store.snapshot().volume as i32 + delta;
                self.store.set_volume(volume);
                self.persist("volume", &self.store.snapshot().volume);
            }
            Action::FocusNext => self.move_focus(1),
            Action::FocusPrev => self.move_focus(-1),
            Action::FocusPane(id) => self.focused = id,
            Action::SetAmbientLevel(sound, level) => {
                self.ambient.set_level(&sound, level);
                self.state.ambient_levels = self.ambient.levels().clone();
                let levels = self.state.ambient_levels.clone();
                self.persist("ambient", &levels);
            }
            Action::SelectTheme(name) => {
                info!("theme → {}", name);
                self.state.theme = Theme::by_name(&name);
                self.persist("theme", &name);
            }
            Action::PersistTasks(items) => self.persist("tasks", &items),
            Action::PersistNotes(lines) => self.persist("notes", &lines),
            Action::ToggleHelp => self.help_overlay.toggle(),
            Action::Quit => self.should_quit = true,
        }
    }

    fn persist<T: serde::Serialize>(&mut self, key: &str, value: &T) {
        if let Err(e) = self.kv.set(key, value) {
            warn!("failed to persist '{}': {}", key, e);
        }
    }

    fn persist_current_channel(&mut self) {
        let channel = self.store.snapshot().channel_id;
        if let Some(cat) = self.store.catalog().category_of(&channel) {
            let saved = SavedChannel {
                category: cat.id.clone(),
                channel,
            };
            self.persist("channel", &saved);
        }
    }

    fn move_focus(&mut self, dir: isize) {
        let idx = FOCUS_ORDER
            .iter()
            .position(|id| *id == self.focused)
            .unwrap_or(0) as isize;
        let len = FOCUS_ORDER.len() as isize;
        self.focused = FOCUS_ORDER[((idx + dir + len) % len) as usize];
    }

    /// Push intent changes to the widget and refresh the shared snapshot.
    fn after_mutations(&mut self) {
        if let Err(e) = self.reconciler.sync(&mut self.store) {
            warn!("widget sync failed: {}", e);
        }
        self.state.intent = self.store.snapshot();
    }

    // ── Rendering ─────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        let area = frame.area();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(8)])
            .split(area);

        let focused = self.focused;
        self.control_bar.draw(
            frame,
            rows[0],
            focused == ComponentId::ControlBar,
            &self.state,
        );

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Percentage(36),
                Constraint::Percentage(34),
                Constraint::Percentage(30),
            ])
            .split(rows[1]);

        self.station_selector.draw(
            frame,
            columns[0],
            focused == ComponentId::StationSelector,
            &self.state,
        );

        let middle = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(4)])
            .split(columns[1]);
        self.pomodoro
            .draw(frame, middle[0], focused == ComponentId::Pomodoro, &self.state);
        self.tasks
            .draw(frame, middle[1], focused == ComponentId::Tasks, &self.state);

        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(4),
                Constraint::Length(SOUNDS.len() as u16 + 2),
                Constraint::Length(crate::theme::ALL.len() as u16 + 2),
            ])
            .split(columns[2]);
        self.notes
            .draw(frame, right[0], focused == ComponentId::Notes, &self.state);
        self.ambient_mixer.draw(
            frame,
            right[1],
            focused == ComponentId::AmbientMixer,
            &self.state,
        );
        self.theme_picker.draw(
            frame,
            right[2],
            focused == ComponentId::ThemePicker,
            &self.state,
        );

        self.help_overlay.draw(frame, area, false, &self.state);
    }
}
