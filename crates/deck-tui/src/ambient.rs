//! Ambient sound layer — one looping mpv process per active sound.
//!
//! Levels are 0..=100 in steps of 10. mpv has no per-instance volume IPC
//! here (the processes are headless and socket-less), so a level change
//! restarts the process with the new `--volume`; loops are seamless enough
//! for rain and fireplace beds that the restart is inaudible in practice.

use std::collections::HashMap;
use std::path::PathBuf;

use tokio::process::Child;
use tracing::{debug, warn};

/// Sound names with their file stems under the configured sounds dir.
pub const SOUNDS: [&str; 6] = ["rain", "thunder", "waves", "fire", "wind", "birds"];

pub struct AmbientPlayer {
    binary: String,
    sounds_dir: PathBuf,
    procs: HashMap<String, Child>,
    levels: HashMap<String, u8>,
}

impl AmbientPlayer {
    pub fn new(binary: String, sounds_dir: PathBuf) -> Self {
        Self {
            binary,
            sounds_dir,
            procs: HashMap::new(),
            levels: HashMap::new(),
        }
    }

    pub fn level(&self, sound: &str) -> u8 {
        self.levels.get(sound).copied().unwrap_or(0)
    }

    pub fn levels(&self) -> &HashMap<String, u8> {
        &self.levels
    }

    /// Set a sound's level, starting/stopping/restarting its process.
    pub fn set_level(&mut self, sound: &str, level: u8) {
        let level = level.min(100);
        if self.level(sound) == level {
            return;
        }

        if let Some(mut old) = self.procs.remove(sound) {
            // kill_on_drop is set, but reap explicitly when we can
            let _ = old.start_kill();
        }

        if level == 0 {
            self.levels.remove(sound);
            return;
        }
        self.levels.insert(sound.to_string(), level);

        let path = self.sound_file(sound);
        let Some(path) = path else {
            warn!("ambient: no file for '{}' in {}", sound, self.sounds_dir.display());
            return;
        };
        debug!("ambient: {} at {}%", sound, level);
        match tokio::process::Command::new(&self.binary)
            .arg("--no-video")
            .arg("--loop-file=inf")
            .arg("--quiet")
            .arg(format!("--volume={}", level))
            .arg(&path)
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => {
                self.procs.insert(sound.to_string(), child);
            }
            Err(e) => warn!("ambient: failed to start {}: {}", sound, e),
        }
    }

    pub fn stop_all(&mut self) {
        for (_, mut child) in self.procs.drain() {
            let _ = child.start_kill();
        }
        self.levels.clear();
    }

    /// First existing file named `<sound>.<ext>` for the known extensions.
    fn sound_file(&self, sound: &str) -> Option<PathBuf> {
        for ext in ["ogg", "mp3", "flac", "wav"] {
            let candidate = self.sounds_dir.join(format!("{}.{}", sound, ext));
            if candidate.exists() {
                return Some(candidate);
            }
        }
        None
    }
}
