use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_URL: &str = "https://api.adsabs.harvard.edu/v1";
pub const DEFAULT_GATEWAY_URL: &str = "https://ui.adsabs.harvard.edu";

/// Application configuration, loaded from `~/.config/adsbib/config.toml`.
///
/// This file is also where the ADS API key lives between runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ads: AdsConfig,
    pub library: LibraryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdsConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub api_url: String,
    pub gateway_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub path: PathBuf,
}

impl Default for AdsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_url: DEFAULT_API_URL.to_string(),
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
        }
    }
}

impl Default for LibraryConfig {
    fn default() -> Self {
        let path = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("~/.local/share"))
            .join("adsbib")
            .join("library.json");
        Self { path }
    }
}

impl Config {
    /// Standard config file path, overridable with `ADSBIB_CONFIG`.
    pub fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("ADSBIB_CONFIG") {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("adsbib")
            .join("config.toml")
    }

    /// Load config from a specific path, falling back to defaults if the file doesn't exist.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Self = toml::from_str(&contents)
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Save config to a specific path.
    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_str)
            .with_context(|| format!("failed to write config {}", path.display()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_point_at_ads() {
        let cfg = Config::default();
        assert_eq!(cfg.ads.api_url, DEFAULT_API_URL);
        assert_eq!(cfg.ads.gateway_url, DEFAULT_GATEWAY_URL);
        assert!(cfg.ads.api_key.is_none());
        assert!(cfg.library.path.ends_with("adsbib/library.json"));
    }

    #[test]
    fn load_nonexistent_returns_default() {
        let dir = TempDir::new().unwrap();
        let cfg = Config::load_from(&dir.path().join("missing.toml")).unwrap();
        assert_eq!(cfg.ads.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn toml_roundtrip_keeps_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.ads.api_key = Some("secret".into());
        cfg.library.path = dir.path().join("lib.json");
        cfg.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.ads.api_key.as_deref(), Some("secret"));
        assert_eq!(loaded.library.path, cfg.library.path);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ads]\napi_key = \"k\"\n").unwrap();

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.ads.api_key.as_deref(), Some("k"));
        assert_eq!(cfg.ads.gateway_url, DEFAULT_GATEWAY_URL);
    }
}
