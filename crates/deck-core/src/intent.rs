//! PlaybackIntent — the single authoritative record of what the user wants.
//!
//! The store holds the intent and broadcasts every change to subscribers
//! synchronously. It never talks to the widget; that is the reconciler's
//! job. The only fields a user action cannot set directly are `is_loading`,
//! `playback_blocked` and `last_error`, which the reconciler derives from
//! observed widget behaviour.

use rand::Rng;
use tracing::debug;

use crate::catalog::Catalog;

/// Snapshot of the user's desired playback configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackIntent {
    /// Currently chosen channel; always present in the catalog.
    pub channel_id: String,
    /// User's play/pause intent.
    pub desired_playing: bool,
    /// User's mute intent.
    pub desired_muted: bool,
    /// Always within 0..=100; writers clamp rather than reject.
    pub volume: u8,
    /// Derived: true from the moment a load is issued until the widget
    /// reports playing or a terminal non-playing state for it.
    pub is_loading: bool,
    /// Set by the reconciler when auto-resume gives up (autoplay refused).
    /// Cleared by an explicit `set_playing(true)`.
    pub playback_blocked: bool,
    /// Last opaque widget error code, for diagnostics only.
    pub last_error: Option<u32>,
}

pub type SubscriptionId = u64;

type Subscriber = Box<dyn FnMut(&PlaybackIntent) + Send>;

/// Owns the [`PlaybackIntent`] and validates mutations against the catalog.
pub struct IntentStore {
    intent: PlaybackIntent,
    catalog: Catalog,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
    next_sub_id: SubscriptionId,
}

impl IntentStore {
    /// Create the store with the catalog's default channel selected,
    /// paused, unmuted, and loading (the widget has not confirmed anything
    /// yet). Fails only when the catalog has no channels at all.
    pub fn new(catalog: Catalog, default_volume: u8) -> anyhow::Result<Self> {
        let first = catalog
            .first()
            .ok_or_else(|| anyhow::anyhow!("catalog has no channels"))?;
        let intent = PlaybackIntent {
            channel_id: first.id.clone(),
            desired_playing: false,
            desired_muted: false,
            volume: default_volume.min(100),
            is_loading: true,
            playback_blocked: false,
            last_error: None,
        };
        Ok(Self {
            intent,
            catalog,
            subscribers: Vec::new(),
            next_sub_id: 1,
        })
    }

    pub fn snapshot(&self) -> PlaybackIntent {
        self.intent.clone()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    // ── user-facing operations ───────────────────────────────────────────────

    /// Select a channel. Invalid (category, channel) pairs are a silent
    /// no-op: the selection stays put and subscribers are not notified.
    /// A valid switch is atomic — id, loading flag and play intent are all
    /// updated before the single notification goes out.
    pub fn set_channel(&mut self, category_id: &str, channel_id: &str) {
        if !self.catalog.contains(category_id, channel_id) {
            debug!(
                "ignoring unknown channel {}/{}",
                category_id, channel_id
            );
            return;
        }
        // Re-selecting the loaded channel is a play request, not a reload;
        // only an actual switch re-enters the loading state.
        if self.intent.channel_id != channel_id {
            self.intent.channel_id = channel_id.to_string();
            self.intent.is_loading = true;
        }
        self.intent.desired_playing = true;
        self.intent.playback_blocked = false;
        self.intent.last_error = None;
        self.notify();
    }

    /// Pick a channel from `category_id` uniformly at random, excluding the
    /// current one when the category has more than one member so a shuffle
    /// always lands somewhere new.
    pub fn set_random_channel(&mut self, category_id: &str) {
        let Some(category) = self.catalog.category(category_id) else {
            debug!("ignoring shuffle on unknown category {}", category_id);
            return;
        };
        let pool: Vec<&str> = if category.channels.len() > 1 {
            category
                .channels
                .iter()
                .filter(|c| c.id != self.intent.channel_id)
                .map(|c| c.id.as_str())
                .collect()
        } else {
            category.channels.iter().map(|c| c.id.as_str()).collect()
        };
        if pool.is_empty() {
            return;
        }
        let pick = pool[rand::thread_rng().gen_range(0..pool.len())].to_string();
        self.set_channel(category_id, &pick);
    }

    /// Clamps to 0..=100 and writes unconditionally.
    pub fn set_volume(&mut self, volume: i32) {
        self.intent.volume = volume.clamp(0, 100) as u8;
        self.notify();
    }

    pub fn toggle_mute(&mut self) {
        self.intent.desired_muted = !self.intent.desired_muted;
        self.notify();
    }

    /// Direct play/pause intent. Asking to play always clears a blocked
    /// state — the user gesture is exactly what un-blocks autoplay.
    pub fn set_playing(&mut self, playing: bool) {
        self.intent.desired_playing = playing;
        if playing {
            self.intent.playback_blocked = false;
        }
        self.notify();
    }

    /// Flip play/pause. While playback is blocked, intent already reads
    /// "playing", so a plain toggle would pause; the gesture the blocked
    /// banner asks for must always resolve to play.
    pub fn toggle_playing(&mut self) {
        if self.intent.playback_blocked {
            self.set_playing(true);
        } else {
            let playing = self.intent.desired_playing;
            self.set_playing(!playing);
        }
    }

    // ── reconciler-facing setters ────────────────────────────────────────────

    pub fn set_loading(&mut self, loading: bool) {
        self.intent.is_loading = loading;
        self.notify();
    }

    pub fn set_playback_blocked(&mut self, blocked: bool) {
        self.intent.playback_blocked = blocked;
        self.notify();
    }

    pub fn set_last_error(&mut self, code: Option<u32>) {
        self.intent.last_error = code;
        self.notify();
    }

    // ── subscriptions ────────────────────────────────────────────────────────

    /// Register a listener invoked after every mutation with the new
    /// snapshot. Returns an id for [`IntentStore::unsubscribe`].
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&PlaybackIntent) + Send + 'static,
    {
        let id = self.next_sub_id;
        self.next_sub_id += 1;
        self.subscribers.push((id, Box::new(callback)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sub_id, _)| *sub_id != id);
    }

    fn notify(&mut self) {
        let snapshot = self.intent.clone();
        for (_, callback) in self.subscribers.iter_mut() {
            callback(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn store() -> IntentStore {
        IntentStore::new(Catalog::builtin(), 50).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let s = store();
        let intent = s.snapshot();
        assert_eq!(intent.channel_id, "jfKfPfyJRdk");
        assert!(!intent.desired_playing);
        assert!(!intent.desired_muted);
        assert_eq!(intent.volume, 50);
        assert!(intent.is_loading);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut s = store();
        for (input, expected) in [(150, 100), (-3, 0), (0, 0), (100, 100), (42, 42)] {
            s.set_volume(input);
            assert_eq!(s.snapshot().volume, expected, "set_volume({})", input);
        }
    }

    #[test]
    fn test_invalid_channel_is_silent_noop() {
        let mut s = store();
        let notified = Arc::new(AtomicUsize::new(0));
        let n = notified.clone();
        s.subscribe(move |_| {
            n.fetch_add(1, Ordering::SeqCst);
        });

        let before = s.snapshot();
        s.set_channel("lofi", "nope");
        s.set_channel("nope", "jfKfPfyJRdk");
        // valid channel in the wrong category is also invalid
        s.set_channel("jazz", "jfKfPfyJRdk");
        assert_eq!(s.snapshot(), before);
        assert_eq!(notified.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_channel_switch_is_atomic() {
        let mut s = store();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        s.subscribe(move |intent| {
            sink.lock().unwrap().push(intent.clone());
        });

        s.set_channel("jazz", "A8jDx9TLMQc");
        let seen = seen.lock().unwrap();
        // one notification, with id + loading + play intent all updated
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].channel_id, "A8jDx9TLMQc");
        assert!(seen[0].is_loading);
        assert!(seen[0].desired_playing);
    }

    #[test]
    fn test_random_channel_excludes_current() {
        let mut s = store();
        // jazz has exactly two channels, so shuffle is deterministic
        s.set_channel("jazz", "A8jDx9TLMQc");
        for _ in 0..20 {
            let before = s.snapshot().channel_id.clone();
            s.set_random_channel("jazz");
            assert_ne!(s.snapshot().channel_id, before);
        }
    }

    #[test]
    fn test_random_channel_single_member_category() {
        let mut s = store();
        s.set_channel("hip-hop", "Oblb4xGO6k4");
        s.set_random_channel("hip-hop");
        // the only member stays selected rather than being excluded away
        assert_eq!(s.snapshot().channel_id, "Oblb4xGO6k4");
    }

    #[test]
    fn test_toggle_mute_round_trip() {
        let mut s = store();
        assert!(!s.snapshot().desired_muted);
        s.toggle_mute();
        assert!(s.snapshot().desired_muted);
        s.toggle_mute();
        assert!(!s.snapshot().desired_muted);
    }

    #[test]
    fn test_set_playing_clears_blocked() {
        let mut s = store();
        s.set_playback_blocked(true);
        s.set_playing(true);
        let intent = s.snapshot();
        assert!(intent.desired_playing);
        assert!(!intent.playback_blocked);
    }

    #[test]
    fn test_toggle_playing_round_trip() {
        let mut s = store();
        s.toggle_playing();
        assert!(s.snapshot().desired_playing);
        s.toggle_playing();
        assert!(!s.snapshot().desired_playing);
    }

    #[test]
    fn test_toggle_playing_while_blocked_resumes() {
        // Blocked leaves desired_playing true; the next toggle must not
        // flip it to paused but clear the flag and keep asking to play.
        let mut s = store();
        s.set_playing(true);
        s.set_playback_blocked(true);

        s.toggle_playing();
        let intent = s.snapshot();
        assert!(intent.desired_playing);
        assert!(!intent.playback_blocked);
    }

    #[test]
    fn test_unsubscribe_stops_notifications() {
        let mut s = store();
        let count = Arc::new(AtomicUsize::new(0));
        let c = count.clone();
        let id = s.subscribe(move |_| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        s.set_volume(10);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        s.unsubscribe(id);
        s.set_volume(20);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
