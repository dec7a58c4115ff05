//! Static station catalog: categories of individually selectable channels.
//!
//! The catalog is immutable configuration data. It is loaded once at startup
//! from a user TOML file when present, falling back to the compiled-in copy.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// One selectable media stream plus display metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Channel {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub author: String,
    /// Playable source — resolved by the widget adapter, never by the core.
    pub url: String,
}

/// A named group of channels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StationCategory {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub channels: Vec<Channel>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    pub categories: Vec<StationCategory>,
}

/// Intermediate struct matching the TOML `[[category]]` table layout.
/// Kept separate so the file schema can diverge from the in-memory type.
#[derive(Debug, Deserialize)]
struct TomlCatalogFile {
    category: Vec<StationCategory>,
}

impl Catalog {
    /// Parse a catalog from TOML text.
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let file: TomlCatalogFile = toml::from_str(content)?;
        Ok(Self {
            categories: file.category,
        })
    }

    /// Load from a user file, falling back to the compiled-in catalog.
    pub fn load_or_builtin(path: &Path) -> Self {
        if path.exists() {
            match std::fs::read_to_string(path).map_err(anyhow::Error::from).and_then(|s| Self::from_toml_str(&s)) {
                Ok(catalog) => {
                    info!("loaded catalog from {}", path.display());
                    return catalog;
                }
                Err(e) => {
                    tracing::warn!("failed to load catalog {}: {}; using builtin", path.display(), e);
                }
            }
        }
        Self::builtin()
    }

    /// The compiled-in default catalog.
    pub fn builtin() -> Self {
        Self::from_toml_str(include_str!("../builtin_catalog.toml"))
            .expect("builtin catalog must parse")
    }

    pub fn category(&self, category_id: &str) -> Option<&StationCategory> {
        self.categories.iter().find(|c| c.id == category_id)
    }

    pub fn channel(&self, category_id: &str, channel_id: &str) -> Option<&Channel> {
        self.category(category_id)?
            .channels
            .iter()
            .find(|c| c.id == channel_id)
    }

    /// True when the (category, channel) pair exists.
    pub fn contains(&self, category_id: &str, channel_id: &str) -> bool {
        self.channel(category_id, channel_id).is_some()
    }

    /// Default selection: the first channel of the first category.
    pub fn first(&self) -> Option<&Channel> {
        self.categories.first()?.channels.first()
    }

    /// The first category that lists `channel_id` (channels may appear in
    /// more than one category; the first match wins).
    pub fn category_of(&self, channel_id: &str) -> Option<&StationCategory> {
        self.categories
            .iter()
            .find(|cat| cat.channels.iter().any(|c| c.id == channel_id))
    }

    /// Channel lookup across all categories.
    pub fn channel_by_id(&self, channel_id: &str) -> Option<&Channel> {
        self.categories
            .iter()
            .flat_map(|cat| cat.channels.iter())
            .find(|c| c.id == channel_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_parses() {
        let catalog = Catalog::builtin();
        assert!(catalog.categories.len() >= 4);
        assert!(catalog.first().is_some());
        assert!(catalog.contains("lofi", "jfKfPfyJRdk"));
        assert!(!catalog.contains("lofi", "does-not-exist"));
        assert!(!catalog.contains("no-such-category", "jfKfPfyJRdk"));
    }

    #[test]
    fn test_parse_catalog_toml() {
        let toml = r#"
            [[category]]
            id = "test"
            name = "Test"
            description = "desc"

            [[category.channels]]
            id = "abc"
            title = "A Channel"
            author = "Someone"
            url = "https://example.com/stream"
        "#;
        let catalog = Catalog::from_toml_str(toml).unwrap();
        assert_eq!(catalog.categories.len(), 1);
        let ch = catalog.channel("test", "abc").unwrap();
        assert_eq!(ch.title, "A Channel");
        assert_eq!(catalog.category_of("abc").unwrap().id, "test");
    }

    #[test]
    fn test_category_of_prefers_first_listing() {
        // h_a3tqywv3I appears in both lofi and jazz in the builtin catalog.
        let catalog = Catalog::builtin();
        assert_eq!(catalog.category_of("h_a3tqywv3I").unwrap().id, "lofi");
    }
}
