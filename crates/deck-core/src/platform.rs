//! Platform paths. Everything lofideck writes lives under these two dirs.

use std::path::PathBuf;

/// Configuration directory (`config.toml`, `catalog.toml`).
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lofideck")
}

/// Data directory (log file, key/value store, ambient sounds).
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("lofideck")
}
