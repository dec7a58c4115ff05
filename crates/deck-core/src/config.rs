use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::platform;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub pomodoro: PomodoroConfig,
    #[serde(default)]
    pub ambient: AmbientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    /// Volume used on first run, before any saved state exists.
    #[serde(default = "default_volume")]
    pub default_volume: u8,
    /// Path to the mpv binary used for the audio widget.
    #[serde(default = "default_mpv_binary")]
    pub mpv_binary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// User catalog file; the compiled-in catalog is used when absent.
    #[serde(default = "default_catalog_path")]
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PomodoroConfig {
    #[serde(default = "default_work_minutes")]
    pub work_minutes: u16,
    #[serde(default = "default_short_break_minutes")]
    pub short_break_minutes: u16,
    #[serde(default = "default_long_break_minutes")]
    pub long_break_minutes: u16,
    /// Work sessions before a long break.
    #[serde(default = "default_sessions_per_cycle")]
    pub sessions_per_cycle: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmbientConfig {
    /// Directory holding loopable ambient sound files (rain.ogg etc.).
    #[serde(default = "default_sounds_dir")]
    pub sounds_dir: PathBuf,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_volume: default_volume(),
            mpv_binary: default_mpv_binary(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: default_catalog_path(),
        }
    }
}

impl Default for PomodoroConfig {
    fn default() -> Self {
        Self {
            work_minutes: default_work_minutes(),
            short_break_minutes: default_short_break_minutes(),
            long_break_minutes: default_long_break_minutes(),
            sessions_per_cycle: default_sessions_per_cycle(),
        }
    }
}

impl Default for AmbientConfig {
    fn default() -> Self {
        Self {
            sounds_dir: default_sounds_dir(),
        }
    }
}

fn default_volume() -> u8 {
    50
}

fn default_mpv_binary() -> String {
    "mpv".to_string()
}

fn default_catalog_path() -> PathBuf {
    platform::config_dir().join("catalog.toml")
}

fn default_work_minutes() -> u16 {
    25
}

fn default_short_break_minutes() -> u16 {
    5
}

fn default_long_break_minutes() -> u16 {
    15
}

fn default_sessions_per_cycle() -> u16 {
    4
}

fn default_sounds_dir() -> PathBuf {
    platform::data_dir().join("sounds")
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self) -> anyhow::Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        platform::config_dir().join("config.toml")
    }

    pub fn state_path() -> PathBuf {
        platform::data_dir().join("state.json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.player.default_volume, 50);
        assert_eq!(config.player.mpv_binary, "mpv");
        assert_eq!(config.pomodoro.work_minutes, 25);
        assert_eq!(config.pomodoro.sessions_per_cycle, 4);
        assert!(config.catalog.path.ends_with("lofideck/catalog.toml"));
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [player]
            default_volume = 80
            "#,
        )
        .unwrap();
        assert_eq!(config.player.default_volume, 80);
        assert_eq!(config.player.mpv_binary, "mpv");
        assert_eq!(config.pomodoro.short_break_minutes, 5);
    }
}
