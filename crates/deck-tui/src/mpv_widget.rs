//! mpv-backed implementation of the video widget port.
//!
//! Architecture:
//!
//! ```text
//!   MpvWidget (sync port, held by the reconciler)
//!        │ WidgetCommand via unbounded mpsc
//!        ▼
//!   driver task ── spawns `mpv --no-video --idle=yes`, owns the IPC socket
//!        ├── writes JSON command lines (fire-and-forget)
//!        └── reads JSON event lines, derives StateCode from observed
//!            `pause` / `core-idle` properties → WidgetEvent out
//! ```
//!
//! The port methods only enqueue; all IPC happens on the driver task. Events
//! carry the generation of the most recent load command the driver executed,
//! which is how superseded loads get filtered upstream.

use std::path::PathBuf;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use deck_core::catalog::Catalog;
use deck_core::platform;
use deck_core::widget::{
    StateCode, VideoWidgetPort, WidgetCommand, WidgetEvent, WidgetEventKind, WidgetPortError,
};

/// Fixed observe_property IDs. We match on these in property-change events.
const OBS_CORE_IDLE: u64 = 1;
const OBS_PAUSE: u64 = 2;

/// Settings applied during widget construction, before Ready fires.
pub struct InitialLoad {
    pub channel_id: String,
    pub volume: u8,
    pub muted: bool,
}

#[derive(Clone)]
pub struct MpvWidget {
    cmd_tx: mpsc::UnboundedSender<WidgetCommand>,
}

impl MpvWidget {
    /// Spawn the mpv process and its driver task. Events start flowing into
    /// `event_tx` once the IPC socket is up; the first is always Ready.
    pub fn spawn(
        binary: String,
        catalog: Catalog,
        initial: InitialLoad,
        event_tx: mpsc::Sender<WidgetEvent>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        tokio::spawn(async move {
            let events = event_tx.clone();
            if let Err(e) = driver(binary, catalog, initial, cmd_rx, event_tx).await {
                warn!("mpv driver exited: {}", e);
                // Surface construction/IPC failure instead of leaving the UI
                // in a permanent loading state.
                let _ = events.send(WidgetEvent::new(0, WidgetEventKind::Error(0))).await;
            }
        });
        Self { cmd_tx }
    }

    fn send(&self, cmd: WidgetCommand) -> Result<(), WidgetPortError> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| WidgetPortError::Disconnected)
    }
}

impl VideoWidgetPort for MpvWidget {
    fn load_and_play(&mut self, channel_id: &str, generation: u64) -> Result<(), WidgetPortError> {
        self.send(WidgetCommand::LoadAndPlay {
            channel_id: channel_id.to_string(),
            generation,
        })
    }
    fn cue(&mut self, channel_id: &str, generation: u64) -> Result<(), WidgetPortError> {
        self.send(WidgetCommand::Cue {
            channel_id: channel_id.to_string(),
            generation,
        })
    }
    fn play(&mut self) -> Result<(), WidgetPortError> {
        self.send(WidgetCommand::Play)
    }
    fn pause(&mut self) -> Result<(), WidgetPortError> {
        self.send(WidgetCommand::Pause)
    }
    fn set_volume(&mut self, volume: u8) -> Result<(), WidgetPortError> {
        self.send(WidgetCommand::SetVolume(volume))
    }
    fn set_muted(&mut self, muted: bool) -> Result<(), WidgetPortError> {
        self.send(WidgetCommand::SetMuted(muted))
    }
    fn destroy(&mut self) -> Result<(), WidgetPortError> {
        self.send(WidgetCommand::Destroy)
    }
}

// ── driver ────────────────────────────────────────────────────────────────────

struct DriverState {
    generation: u64,
    pause: bool,
    core_idle: bool,
    /// True after a cue until the next play/load; makes a paused deck report
    /// Cued instead of Paused.
    cued: bool,
    last_code: Option<StateCode>,
}

impl DriverState {
    fn derive(&self) -> StateCode {
        if self.pause {
            if self.cued {
                StateCode::Cued
            } else {
                StateCode::Paused
            }
        } else if self.core_idle {
            StateCode::Buffering
        } else {
            StateCode::Playing
        }
    }
}

async fn driver(
    binary: String,
    catalog: Catalog,
    initial: InitialLoad,
    mut cmd_rx: mpsc::UnboundedReceiver<WidgetCommand>,
    event_tx: mpsc::Sender<WidgetEvent>,
) -> anyhow::Result<()> {
    let socket_path = platform::data_dir().join(format!("mpv-{}.sock", std::process::id()));
    let _ = tokio::fs::remove_file(&socket_path).await;
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // mpv stderr goes to a log file for post-mortem on crashes.
    let stderr_path = platform::data_dir().join("mpv-stderr.log");
    let stderr_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&stderr_path)?;

    info!("mpv: spawning {}", binary);
    let mut child = tokio::process::Command::new(&binary)
        .arg("--no-video")
        .arg("--idle=yes")
        .arg(format!("--input-ipc-server={}", socket_path.display()))
        .arg("--quiet")
        .arg(format!("--volume={}", initial.volume))
        .arg(format!("--mute={}", if initial.muted { "yes" } else { "no" }))
        .stdout(std::process::Stdio::null())
        .stderr(stderr_file)
        .kill_on_drop(true)
        .spawn()?;
    info!("mpv: spawned pid {:?}", child.id());

    // Wait for the IPC socket to appear.
    for _ in 0..50 {
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;
        if socket_path.exists() {
            break;
        }
    }
    if !socket_path.exists() {
        anyhow::bail!("mpv IPC socket did not appear");
    }

    let stream = UnixStream::connect(&socket_path).await?;
    info!("mpv: connected to IPC socket");
    let (read_half, mut writer) = stream.into_split();
    // next_line is cancellation safe, which the select loop below relies on
    let mut lines = BufReader::new(read_half).lines();

    for (id, name) in [(OBS_CORE_IDLE, "core-idle"), (OBS_PAUSE, "pause")] {
        write_cmd(&mut writer, json!(["observe_property", id, name])).await?;
    }

    // Cue the initial channel paused; construction carries the volume and
    // mute settings via process arguments above.
    let mut state = DriverState {
        generation: 0,
        pause: true,
        core_idle: true,
        cued: true,
        last_code: None,
    };
    if let Some(ch) = catalog.channel_by_id(&initial.channel_id) {
        write_cmd(&mut writer, json!(["loadfile", ch.url])).await?;
        write_cmd(&mut writer, json!(["set_property", "pause", true])).await?;
    } else {
        warn!("mpv: initial channel {} not in catalog", initial.channel_id);
    }
    let _ = event_tx
        .send(WidgetEvent::new(
            0,
            WidgetEventKind::Ready {
                initial: StateCode::Cued,
            },
        ))
        .await;

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else { break };
                match cmd {
                    WidgetCommand::LoadAndPlay { channel_id, generation } => {
                        state.generation = generation;
                        state.cued = false;
                        state.last_code = None;
                        let Some(ch) = catalog.channel_by_id(&channel_id) else {
                            warn!("mpv: unknown channel {}", channel_id);
                            continue;
                        };
                        debug!(gen = generation, "mpv: loadfile {}", ch.url);
                        write_cmd(&mut writer, json!(["loadfile", ch.url])).await?;
                        write_cmd(&mut writer, json!(["set_property", "pause", false])).await?;
                    }
                    WidgetCommand::Cue { channel_id, generation } => {
                        state.generation = generation;
                        state.cued = true;
                        state.last_code = None;
                        let Some(ch) = catalog.channel_by_id(&channel_id) else {
                            warn!("mpv: unknown channel {}", channel_id);
                            continue;
                        };
                        debug!(gen = generation, "mpv: cue {}", ch.url);
                        write_cmd(&mut writer, json!(["loadfile", ch.url])).await?;
                        write_cmd(&mut writer, json!(["set_property", "pause", true])).await?;
                    }
                    WidgetCommand::Play => {
                        state.cued = false;
                        write_cmd(&mut writer, json!(["set_property", "pause", false])).await?;
                    }
                    WidgetCommand::Pause => {
                        write_cmd(&mut writer, json!(["set_property", "pause", true])).await?;
                    }
                    WidgetCommand::SetVolume(v) => {
                        write_cmd(&mut writer, json!(["set_property", "volume", v])).await?;
                    }
                    WidgetCommand::SetMuted(m) => {
                        write_cmd(&mut writer, json!(["set_property", "mute", m])).await?;
                    }
                    WidgetCommand::Destroy => {
                        let _ = write_cmd(&mut writer, json!(["quit"])).await;
                        break;
                    }
                }
            }

            read = lines.next_line() => {
                match read {
                    Ok(Some(line)) => {
                        let trimmed = line.trim();
                        if !trimmed.is_empty() {
                            if let Ok(val) = serde_json::from_str::<Value>(trimmed) {
                                handle_mpv_line(&val, &mut state, &event_tx).await;
                            } else {
                                debug!("mpv: unparseable line {}", trimmed);
                            }
                        }
                    }
                    Ok(None) => {
                        warn!("mpv: IPC connection closed");
                        break;
                    }
                    Err(e) => {
                        warn!("mpv: read error: {}", e);
                        break;
                    }
                }
            }
        }
    }

    let _ = child.kill().await;
    let _ = tokio::fs::remove_file(&socket_path).await;
    Ok(())
}

async fn handle_mpv_line(val: &Value, state: &mut DriverState, event_tx: &mpsc::Sender<WidgetEvent>) {
    // Command responses carry request_id; we write fire-and-forget, so only
    // log failures.
    if val.get("request_id").is_some() {
        if val["error"].as_str() != Some("success") {
            warn!("mpv: command failed: {}", val);
        }
        return;
    }

    match val.get("event").and_then(|e| e.as_str()) {
        Some("property-change") => {
            let id = val.get("id").and_then(|v| v.as_u64());
            let data = val.get("data");
            match id {
                Some(OBS_PAUSE) => {
                    if let Some(p) = data.and_then(|d| d.as_bool()) {
                        state.pause = p;
                        if !p {
                            state.cued = false;
                        }
                    }
                }
                Some(OBS_CORE_IDLE) => {
                    if let Some(idle) = data.and_then(|d| d.as_bool()) {
                        state.core_idle = idle;
                    }
                }
                _ => return,
            }
            let code = state.derive();
            if state.last_code != Some(code) {
                state.last_code = Some(code);
                let _ = event_tx
                    .send(WidgetEvent::new(
                        state.generation,
                        WidgetEventKind::StateChanged(code),
                    ))
                    .await;
            }
        }
        Some("end-file") => {
            let reason = val.get("reason").and_then(|r| r.as_str()).unwrap_or("");
            if reason == "error" {
                warn!("mpv: end-file error: {}", val);
                let _ = event_tx
                    .send(WidgetEvent::new(state.generation, WidgetEventKind::Error(1)))
                    .await;
            }
        }
        _ => {}
    }
}

async fn write_cmd(
    writer: &mut tokio::net::unix::OwnedWriteHalf,
    command: Value,
) -> anyhow::Result<()> {
    let mut raw = serde_json::to_string(&json!({ "command": command, "request_id": 0 }))?;
    raw.push('\n');
    writer.write_all(raw.as_bytes()).await?;
    Ok(())
}

/// Path helper kept public for the uninstall/debug story.
pub fn stderr_log_path() -> PathBuf {
    platform::data_dir().join("mpv-stderr.log")
}
