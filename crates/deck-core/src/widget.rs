//! The boundary with the external video widget.
//!
//! The widget is a black box: it accepts load/play/pause/volume/mute
//! commands and emits lifecycle events. Its internal transitions are not
//! fully controllable — it can unilaterally pause, buffer, or error — so
//! the reconciler treats events from here as ground truth for *actual*
//! playback.
//!
//! Every load command carries a generation number; adapters echo the
//! generation of the most recent load in each subsequent event. That lets
//! the reconciler discard completions of loads that were superseded while
//! still in flight.

use thiserror::Error;

/// Widget playback state codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCode {
    Unstarted,
    Playing,
    Paused,
    Buffering,
    /// Loaded without autoplay; ready to play on command.
    Cued,
}

#[derive(Debug, Clone, PartialEq)]
pub enum WidgetEventKind {
    /// The widget finished constructing. `initial` is its reported state.
    Ready { initial: StateCode },
    StateChanged(StateCode),
    /// Terminal failure for the current load. The code is opaque.
    Error(u32),
}

/// A transient event from the widget; consumed once, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetEvent {
    /// Generation of the most recent load the widget has seen.
    pub generation: u64,
    pub kind: WidgetEventKind,
}

impl WidgetEvent {
    pub fn new(generation: u64, kind: WidgetEventKind) -> Self {
        Self { generation, kind }
    }
}

/// Commands a widget adapter can receive. Mirrors [`VideoWidgetPort`];
/// adapters that marshal commands over a channel (and test fakes that
/// record them) share this type.
#[derive(Debug, Clone, PartialEq)]
pub enum WidgetCommand {
    LoadAndPlay { channel_id: String, generation: u64 },
    Cue { channel_id: String, generation: u64 },
    Play,
    Pause,
    SetVolume(u8),
    SetMuted(bool),
    Destroy,
}

#[derive(Debug, Error)]
pub enum WidgetPortError {
    #[error("widget is gone (command channel closed)")]
    Disconnected,
    #[error("widget rejected command: {0}")]
    Rejected(String),
}

/// Injected capability interface for the external video widget. The
/// reconciler is the only caller; everything here is fire-and-forget from
/// its point of view, with results folded back in as [`WidgetEvent`]s.
pub trait VideoWidgetPort {
    fn load_and_play(&mut self, channel_id: &str, generation: u64) -> Result<(), WidgetPortError>;
    fn cue(&mut self, channel_id: &str, generation: u64) -> Result<(), WidgetPortError>;
    fn play(&mut self) -> Result<(), WidgetPortError>;
    fn pause(&mut self) -> Result<(), WidgetPortError>;
    fn set_volume(&mut self, volume: u8) -> Result<(), WidgetPortError>;
    fn set_muted(&mut self, muted: bool) -> Result<(), WidgetPortError>;
    fn destroy(&mut self) -> Result<(), WidgetPortError>;
}
