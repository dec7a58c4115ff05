//! PlaybackReconciler — converges the external widget with user intent.
//!
//! The reconciler is the only component permitted to talk to the widget.
//! It works in two directions:
//!
//! - `sync` diffs the intent store against the last snapshot it acted on
//!   and issues widget commands for whatever changed.
//! - `fold_event` folds asynchronous widget lifecycle events back into the
//!   store (loading flag, forced-resume, error surface).
//!
//! Feedback loops are avoided by bookkeeping rather than flags: every
//! mutation the reconciler itself makes is reflected into `last_seen`
//! before `sync` runs again, so it never reacts to its own writes.

use tracing::{debug, info, warn};

use crate::intent::{IntentStore, PlaybackIntent};
use crate::widget::{StateCode, VideoWidgetPort, WidgetEvent, WidgetEventKind, WidgetPortError};

/// Consecutive auto-resume attempts before declaring playback blocked.
/// The widget pausing itself once or twice is normal (state restoration,
/// stream hiccups); a widget that refuses this many resumes in a row is
/// enforcing an autoplay policy and needs a user gesture.
pub const MAX_AUTO_RESUME: u32 = 4;

pub struct PlaybackReconciler<W: VideoWidgetPort> {
    widget: W,
    /// Set once the widget reports construction complete; no command other
    /// than those bundled into construction is sent before that.
    widget_ready: bool,
    /// Channel last commanded into the widget, to avoid redundant reloads.
    last_loaded: Option<String>,
    /// Monotonic load generation; bumped on every load/cue command.
    generation: u64,
    /// Consecutive auto-resume attempts since the last confirmed play.
    resume_attempts: u32,
    /// The intent snapshot `sync` last acted on.
    last_seen: PlaybackIntent,
}

impl<W: VideoWidgetPort> PlaybackReconciler<W> {
    /// `widget` must have been constructed with the store's current channel
    /// cued and its volume/mute settings applied (the construct command
    /// carries them), so generation 0 refers to that initial load.
    pub fn new(widget: W, store: &IntentStore) -> Self {
        let snapshot = store.snapshot();
        Self {
            widget,
            widget_ready: false,
            last_loaded: Some(snapshot.channel_id.clone()),
            generation: 0,
            resume_attempts: 0,
            last_seen: snapshot,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.widget_ready
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Diff the store against the last synced snapshot and issue commands.
    /// Call after any batch of store mutations; calling it when nothing
    /// changed is a no-op.
    pub fn sync(&mut self, store: &mut IntentStore) -> Result<(), WidgetPortError> {
        if !self.widget_ready {
            // Leave last_seen untouched: pending diffs are flushed by the
            // first sync after Ready.
            return Ok(());
        }
        let intent = store.snapshot();

        if self.last_loaded.as_deref() != Some(intent.channel_id.as_str()) {
            // Channel switch. A load supersedes any pending play/pause.
            self.generation += 1;
            self.resume_attempts = 0;
            if intent.desired_playing {
                info!(channel = %intent.channel_id, gen = self.generation, "load and play");
                self.widget.load_and_play(&intent.channel_id, self.generation)?;
            } else {
                info!(channel = %intent.channel_id, gen = self.generation, "cue");
                self.widget.cue(&intent.channel_id, self.generation)?;
            }
            self.last_loaded = Some(intent.channel_id.clone());
            store.set_loading(true);
        } else if intent.desired_playing != self.last_seen.desired_playing && !intent.is_loading {
            // Manual play/pause, but never while a load is pending — the
            // load's own resolution decides what happens then.
            if intent.desired_playing {
                self.resume_attempts = 0;
                self.widget.play()?;
            } else {
                self.widget.pause()?;
            }
        } else if self.last_seen.playback_blocked
            && !intent.playback_blocked
            && intent.desired_playing
            && !intent.is_loading
        {
            // User gesture cleared the blocked flag; re-arm and retry.
            info!("playback unblocked by user, retrying play");
            self.resume_attempts = 0;
            self.widget.play()?;
        }

        if intent.volume != self.last_seen.volume {
            self.widget.set_volume(intent.volume)?;
        }
        if intent.desired_muted != self.last_seen.desired_muted {
            self.widget.set_muted(intent.desired_muted)?;
        }

        self.last_seen = store.snapshot();
        Ok(())
    }

    /// Fold one widget event into the store. Callers should `sync`
    /// afterwards so any drift the fold exposed is acted on.
    pub fn fold_event(
        &mut self,
        store: &mut IntentStore,
        event: WidgetEvent,
    ) -> Result<(), WidgetPortError> {
        match event.kind {
            WidgetEventKind::Ready { initial } => {
                info!(?initial, "widget ready");
                self.widget_ready = true;
                let intent = store.snapshot();
                self.widget.set_volume(intent.volume)?;
                self.widget.set_muted(intent.desired_muted)?;
                // Cued/Paused/Unstarted count as "loaded", not "buffering".
                if !matches!(initial, StateCode::Playing | StateCode::Buffering) {
                    store.set_loading(false);
                }
                // Seed last_seen with what the widget is actually doing, so
                // the next sync converges play/pause state the user changed
                // while the widget was still constructing.
                self.last_seen = store.snapshot();
                self.last_seen.desired_playing =
                    matches!(initial, StateCode::Playing | StateCode::Buffering);
                return Ok(());
            }
            _ if event.generation != self.generation => {
                // Completion of a load that was superseded in flight.
                debug!(
                    got = event.generation,
                    want = self.generation,
                    "discarding stale widget event"
                );
                return Ok(());
            }
            WidgetEventKind::StateChanged(StateCode::Playing) => {
                store.set_loading(false);
                self.resume_attempts = 0;
                if !store.snapshot().desired_playing {
                    // The widget is audibly playing: actual state wins and
                    // intent is corrected so the controls stay truthful.
                    info!("widget playing while intent was paused; adopting");
                    store.set_playing(true);
                }
            }
            WidgetEventKind::StateChanged(StateCode::Buffering) => {
                store.set_loading(true);
            }
            WidgetEventKind::StateChanged(StateCode::Paused)
            | WidgetEventKind::StateChanged(StateCode::Cued) => {
                store.set_loading(false);
                if store.snapshot().desired_playing {
                    if self.resume_attempts < MAX_AUTO_RESUME {
                        // The widget pausing itself against intent: self-heal.
                        self.resume_attempts += 1;
                        info!(attempt = self.resume_attempts, "auto-resuming playback");
                        self.widget.play()?;
                    } else {
                        warn!(
                            attempts = self.resume_attempts,
                            "widget keeps refusing playback; marking blocked"
                        );
                        store.set_playback_blocked(true);
                    }
                }
            }
            WidgetEventKind::StateChanged(StateCode::Unstarted) => {}
            WidgetEventKind::Error(code) => {
                // Terminal for this load attempt; the user picks another
                // channel. No retry.
                warn!(code, "widget error");
                store.set_loading(false);
                store.set_last_error(Some(code));
            }
        }
        self.last_seen = store.snapshot();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::widget::WidgetCommand;
    use std::sync::{Arc, Mutex};

    /// Records every command; the event side is driven by the tests.
    #[derive(Clone, Default)]
    struct FakeWidget {
        commands: Arc<Mutex<Vec<WidgetCommand>>>,
    }

    impl FakeWidget {
        fn taken(&self) -> Vec<WidgetCommand> {
            std::mem::take(&mut self.commands.lock().unwrap())
        }
    }

    impl VideoWidgetPort for FakeWidget {
        fn load_and_play(&mut self, channel_id: &str, generation: u64) -> Result<(), WidgetPortError> {
            self.commands.lock().unwrap().push(WidgetCommand::LoadAndPlay {
                channel_id: channel_id.to_string(),
                generation,
            });
            Ok(())
        }
        fn cue(&mut self, channel_id: &str, generation: u64) -> Result<(), WidgetPortError> {
            self.commands.lock().unwrap().push(WidgetCommand::Cue {
                channel_id: channel_id.to_string(),
                generation,
            });
            Ok(())
        }
        fn play(&mut self) -> Result<(), WidgetPortError> {
            self.commands.lock().unwrap().push(WidgetCommand::Play);
            Ok(())
        }
        fn pause(&mut self) -> Result<(), WidgetPortError> {
            self.commands.lock().unwrap().push(WidgetCommand::Pause);
            Ok(())
        }
        fn set_volume(&mut self, volume: u8) -> Result<(), WidgetPortError> {
            self.commands.lock().unwrap().push(WidgetCommand::SetVolume(volume));
            Ok(())
        }
        fn set_muted(&mut self, muted: bool) -> Result<(), WidgetPortError> {
            self.commands.lock().unwrap().push(WidgetCommand::SetMuted(muted));
            Ok(())
        }
        fn destroy(&mut self) -> Result<(), WidgetPortError> {
            self.commands.lock().unwrap().push(WidgetCommand::Destroy);
            Ok(())
        }
    }

    fn ready_rig() -> (PlaybackReconciler<FakeWidget>, IntentStore, FakeWidget) {
        let mut store = IntentStore::new(Catalog::builtin(), 50).unwrap();
        let widget = FakeWidget::default();
        let mut rec = PlaybackReconciler::new(widget.clone(), &store);
        rec.fold_event(
            &mut store,
            WidgetEvent::new(0, WidgetEventKind::Ready { initial: StateCode::Cued }),
        )
        .unwrap();
        rec.sync(&mut store).unwrap();
        widget.taken(); // drop the ready-time volume/mute push
        (rec, store, widget)
    }

    fn playing(gen: u64) -> WidgetEvent {
        WidgetEvent::new(gen, WidgetEventKind::StateChanged(StateCode::Playing))
    }

    fn paused(gen: u64) -> WidgetEvent {
        WidgetEvent::new(gen, WidgetEventKind::StateChanged(StateCode::Paused))
    }

    #[test]
    fn test_ready_clears_loading_for_cued() {
        let mut store = IntentStore::new(Catalog::builtin(), 50).unwrap();
        let widget = FakeWidget::default();
        let mut rec = PlaybackReconciler::new(widget.clone(), &store);
        assert!(store.snapshot().is_loading);

        rec.fold_event(
            &mut store,
            WidgetEvent::new(0, WidgetEventKind::Ready { initial: StateCode::Cued }),
        )
        .unwrap();

        assert!(rec.is_ready());
        assert!(!store.snapshot().is_loading);
        // construction settings re-asserted
        assert_eq!(
            widget.taken(),
            vec![WidgetCommand::SetVolume(50), WidgetCommand::SetMuted(false)]
        );
    }

    #[test]
    fn test_no_commands_before_ready() {
        let mut store = IntentStore::new(Catalog::builtin(), 50).unwrap();
        let widget = FakeWidget::default();
        let mut rec = PlaybackReconciler::new(widget.clone(), &store);

        store.set_playing(true);
        store.set_volume(80);
        rec.sync(&mut store).unwrap();
        assert!(widget.taken().is_empty());

        // Everything pending flushes on the first sync after Ready.
        rec.fold_event(
            &mut store,
            WidgetEvent::new(0, WidgetEventKind::Ready { initial: StateCode::Cued }),
        )
        .unwrap();
        let at_ready = widget.taken();
        assert!(at_ready.contains(&WidgetCommand::SetVolume(80)));
        rec.sync(&mut store).unwrap();
        assert_eq!(widget.taken(), vec![WidgetCommand::Play]);
    }

    #[test]
    fn test_channel_switch_issues_load_and_play() {
        let (mut rec, mut store, widget) = ready_rig();

        store.set_channel("jazz", "A8jDx9TLMQc");
        rec.sync(&mut store).unwrap();

        assert_eq!(
            widget.taken(),
            vec![WidgetCommand::LoadAndPlay {
                channel_id: "A8jDx9TLMQc".to_string(),
                generation: 1,
            }]
        );
        assert!(store.snapshot().is_loading);

        // Load resolves: loading clears, intent still playing.
        rec.fold_event(&mut store, playing(1)).unwrap();
        let intent = store.snapshot();
        assert!(!intent.is_loading);
        assert!(intent.desired_playing);
    }

    #[test]
    fn test_cue_when_not_playing() {
        let (mut rec, mut store, widget) = ready_rig();

        store.set_channel("jazz", "A8jDx9TLMQc");
        store.set_playing(false);
        rec.sync(&mut store).unwrap();

        assert_eq!(
            widget.taken(),
            vec![WidgetCommand::Cue {
                channel_id: "A8jDx9TLMQc".to_string(),
                generation: 1,
            }]
        );
    }

    #[test]
    fn test_same_channel_is_not_reloaded() {
        let (mut rec, mut store, widget) = ready_rig();
        let current = store.snapshot().channel_id.clone();
        let cat = store.catalog().category_of(&current).unwrap().id.clone();

        store.set_channel(&cat, &current);
        rec.sync(&mut store).unwrap();
        // selecting the already-loaded channel only re-asserts play intent
        assert_eq!(widget.taken(), vec![WidgetCommand::Play]);
    }

    #[test]
    fn test_play_pause_deferred_while_loading() {
        let (mut rec, mut store, widget) = ready_rig();

        store.set_channel("jazz", "A8jDx9TLMQc");
        rec.sync(&mut store).unwrap();
        widget.taken();

        // Pause while the load is in flight: superseded, no command.
        store.set_playing(false);
        rec.sync(&mut store).unwrap();
        assert!(widget.taken().is_empty());

        // When the stale-intent load resolves to Playing, actual wins.
        rec.fold_event(&mut store, playing(1)).unwrap();
        assert!(store.snapshot().desired_playing);
    }

    #[test]
    fn test_manual_pause_when_idle() {
        let (mut rec, mut store, widget) = ready_rig();
        store.set_playing(true);
        rec.sync(&mut store).unwrap();
        assert_eq!(widget.taken(), vec![WidgetCommand::Play]);

        rec.fold_event(&mut store, playing(0)).unwrap();
        store.set_playing(false);
        rec.sync(&mut store).unwrap();
        assert_eq!(widget.taken(), vec![WidgetCommand::Pause]);
    }

    #[test]
    fn test_auto_resume_on_unexpected_pause() {
        let (mut rec, mut store, widget) = ready_rig();
        store.set_playing(true);
        rec.sync(&mut store).unwrap();
        rec.fold_event(&mut store, playing(0)).unwrap();
        widget.taken();

        // Widget silently pauses itself: exactly one play re-issued,
        // desired_playing untouched.
        rec.fold_event(&mut store, paused(0)).unwrap();
        assert_eq!(widget.taken(), vec![WidgetCommand::Play]);
        assert!(store.snapshot().desired_playing);
        rec.sync(&mut store).unwrap();
        assert!(widget.taken().is_empty());
    }

    #[test]
    fn test_resume_retry_cap_marks_blocked() {
        let (mut rec, mut store, widget) = ready_rig();
        store.set_playing(true);
        rec.sync(&mut store).unwrap();
        widget.taken();

        for i in 0..MAX_AUTO_RESUME {
            rec.fold_event(&mut store, paused(0)).unwrap();
            assert_eq!(widget.taken(), vec![WidgetCommand::Play], "attempt {}", i);
            assert!(!store.snapshot().playback_blocked);
        }

        // One more refusal exhausts the budget.
        rec.fold_event(&mut store, paused(0)).unwrap();
        assert!(widget.taken().is_empty());
        assert!(store.snapshot().playback_blocked);
        assert!(store.snapshot().desired_playing);

        // An explicit user play re-arms the retry budget.
        store.set_playing(true);
        rec.sync(&mut store).unwrap();
        assert_eq!(widget.taken(), vec![WidgetCommand::Play]);
        rec.fold_event(&mut store, paused(0)).unwrap();
        assert_eq!(widget.taken(), vec![WidgetCommand::Play]);
    }

    #[test]
    fn test_playing_event_corrects_paused_intent() {
        let (mut rec, mut store, _widget) = ready_rig();
        assert!(!store.snapshot().desired_playing);

        rec.fold_event(&mut store, playing(0)).unwrap();
        let intent = store.snapshot();
        assert!(intent.desired_playing, "actual playback wins over intent");
        assert!(!intent.is_loading);
    }

    #[test]
    fn test_buffering_sets_loading() {
        let (mut rec, mut store, _widget) = ready_rig();
        rec.fold_event(
            &mut store,
            WidgetEvent::new(0, WidgetEventKind::StateChanged(StateCode::Buffering)),
        )
        .unwrap();
        assert!(store.snapshot().is_loading);
    }

    #[test]
    fn test_stale_generation_events_are_discarded() {
        let (mut rec, mut store, widget) = ready_rig();

        store.set_channel("jazz", "A8jDx9TLMQc");
        rec.sync(&mut store).unwrap();
        store.set_channel("cyberpunk", "4xDzrJKXOOY");
        rec.sync(&mut store).unwrap();
        widget.taken();
        assert_eq!(rec.generation(), 2);

        // The first (superseded) load resolving must not clear loading.
        rec.fold_event(&mut store, playing(1)).unwrap();
        assert!(store.snapshot().is_loading);

        rec.fold_event(&mut store, playing(2)).unwrap();
        assert!(!store.snapshot().is_loading);
    }

    #[test]
    fn test_error_clears_loading_without_retry() {
        let (mut rec, mut store, widget) = ready_rig();
        store.set_channel("jazz", "A8jDx9TLMQc");
        rec.sync(&mut store).unwrap();
        widget.taken();

        rec.fold_event(&mut store, WidgetEvent::new(1, WidgetEventKind::Error(150))).unwrap();
        let intent = store.snapshot();
        assert!(!intent.is_loading);
        assert_eq!(intent.last_error, Some(150));
        assert!(widget.taken().is_empty(), "errors are terminal, no retry");
    }

    #[test]
    fn test_volume_and_mute_forwarded() {
        let (mut rec, mut store, widget) = ready_rig();

        store.set_volume(30);
        rec.sync(&mut store).unwrap();
        assert_eq!(widget.taken(), vec![WidgetCommand::SetVolume(30)]);

        // unchanged volume is not re-sent
        store.set_volume(30);
        rec.sync(&mut store).unwrap();
        assert!(widget.taken().is_empty());

        store.toggle_mute();
        rec.sync(&mut store).unwrap();
        store.toggle_mute();
        rec.sync(&mut store).unwrap();
        assert_eq!(
            widget.taken(),
            vec![WidgetCommand::SetMuted(true), WidgetCommand::SetMuted(false)]
        );
    }
}
