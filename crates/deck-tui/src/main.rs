mod action;
mod ambient;
mod app;
mod component;
mod components;
mod mpv_widget;
mod theme;

use tokio::sync::mpsc;

use deck_core::catalog::Catalog;
use deck_core::config::Config;
use deck_core::intent::IntentStore;
use deck_core::platform;
use deck_core::reconciler::PlaybackReconciler;
use deck_core::storage::KvStore;
use deck_core::widget::WidgetEvent;

use app::SavedChannel;
use mpv_widget::{InitialLoad, MpvWidget};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let data_dir = platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;

    let log_path = data_dir.join("tui.log");
    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let log_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| "debug".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    // Print log path to stderr so the operator can tail it immediately.
    eprintln!("lofideck log: {}", log_path.display());
    eprintln!("mpv stderr:   {}", mpv_widget::stderr_log_path().display());

    tracing::info!("lofideck starting…");

    // ── Load config + catalog + saved state ──────────────────────────────────
    let config = Config::load().unwrap_or_default();
    let catalog = Catalog::load_or_builtin(&config.catalog.path);
    let kv = KvStore::open(&Config::state_path());

    // ── Intent store, seeded from the previous session ───────────────────────
    let volume: u8 = kv.get("volume").unwrap_or(config.player.default_volume);
    let mut store = IntentStore::new(catalog.clone(), volume)?;
    if kv.get::<bool>("muted").unwrap_or(false) {
        store.toggle_mute();
    }
    if let Some(saved) = kv.get::<SavedChannel>("channel") {
        store.set_channel(&saved.category, &saved.channel);
        // restored sessions start paused, the saved channel is only cued
        store.set_playing(false);
    }

    // ── Widget + reconciler ──────────────────────────────────────────────────
    let snapshot = store.snapshot();
    let (event_tx, event_rx) = mpsc::channel::<WidgetEvent>(256);
    let widget = MpvWidget::spawn(
        config.player.mpv_binary.clone(),
        catalog,
        InitialLoad {
            channel_id: snapshot.channel_id,
            volume: snapshot.volume,
            muted: snapshot.desired_muted,
        },
        event_tx,
    );
    let reconciler = PlaybackReconciler::new(widget.clone(), &store);

    let ambient = ambient::AmbientPlayer::new(
        config.player.mpv_binary.clone(),
        config.ambient.sounds_dir.clone(),
    );

    // ── Run TUI ──────────────────────────────────────────────────────────────
    let app = app::App::new(&config, store, reconciler, widget, kv, ambient);
    app.run(event_rx).await?;

    Ok(())
}
