//! Action enum — all user-initiated intents and internal events.

/// Unique identifier for a focusable component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentId {
    StationSelector,
    ControlBar,
    Pomodoro,
    Tasks,
    Notes,
    AmbientMixer,
    ThemePicker,
    HelpOverlay,
}

/// All actions that can flow through the system.
/// Components produce Actions; the App dispatches them.
#[derive(Debug, Clone)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    PlayChannel { category: String, channel: String },
    ShuffleCategory(String),
    /// Shuffle within the currently playing channel's category.
    ShuffleCurrent,
    TogglePlay,
    ToggleMute,
    Volume(i32), // relative delta

    // ── Navigation ───────────────────────────────────────────────────────────
    FocusNext,
    FocusPrev,
    FocusPane(ComponentId),

    // ── Ambience / theme ─────────────────────────────────────────────────────
    SetAmbientLevel(String, u8),
    SelectTheme(String),

    // ── Persistence (component → App → KvStore) ──────────────────────────────
    PersistTasks(Vec<crate::components::tasks::TaskItem>),
    PersistNotes(Vec<String>),

    // ── UI toggles ───────────────────────────────────────────────────────────
    ToggleHelp,
    Quit,
}
