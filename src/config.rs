//! Application configuration.
//!
//! Loaded from `<config dir>/worry-tree/config.json` when present, then
//! overridden by environment variables:
//! - `WORRY_TREE_ORIGIN` - where the front-end is served; share links point here
//! - `WORRY_TREE_BLOB_URL` - blob store endpoint (`off` disables short links)
//! - `WORRY_TREE_FALL_MS` - how long a comforted worry takes to fall
//! - `WORRY_TREE_RATE_LIMIT` - writes per minute per client for `serve`
//! - `GEMINI_API_KEY` (or `API_KEY`) - key for generated comfort messages

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::share::{QrOptions, Strategy, DEFAULT_BLOB_URL};

const APP_NAME: &str = "worry-tree";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Origin of the web front-end, e.g. `https://worry-tree.example`.
    pub share_origin: String,
    /// Blob store endpoint for short links. `None` disables the remote strategy.
    pub blob_store_url: Option<String>,
    /// Encode order for share links.
    pub share_strategies: Vec<Strategy>,
    pub fall_duration_ms: u64,
    pub request_timeout_secs: u64,
    pub qr: QrOptions,
    /// Writes per minute per client accepted by `serve`. `None` means unlimited.
    pub rate_limit: Option<u32>,
    /// Never written back to disk.
    #[serde(skip_serializing)]
    pub gemini_api_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            share_origin: "http://localhost:5173".to_string(),
            blob_store_url: Some(DEFAULT_BLOB_URL.to_string()),
            share_strategies: Strategy::default_order(),
            fall_duration_ms: 2000,
            request_timeout_secs: 10,
            qr: QrOptions::default(),
            rate_limit: None,
            gemini_api_key: None,
        }
    }
}

impl AppConfig {
    /// Load the config file and apply environment overrides.
    /// Falls back to defaults if the file doesn't exist or fails to parse.
    pub fn load() -> Self {
        let mut config = match Self::try_load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("Failed to load config, using defaults: {:#}", e);
                Self::default()
            }
        };
        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    fn try_load() -> Result<Self> {
        let config_path = get_config_path()?;
        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;
        let config = serde_json::from_str(&content).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(origin) = lookup("WORRY_TREE_ORIGIN") {
            self.share_origin = origin;
        }

        if let Some(url) = lookup("WORRY_TREE_BLOB_URL") {
            let url = url.trim();
            self.blob_store_url = if url.is_empty() || url.eq_ignore_ascii_case("off") {
                None
            } else {
                Some(url.to_string())
            };
        }

        if let Some(ms) = lookup("WORRY_TREE_FALL_MS").and_then(|s| s.parse().ok()) {
            self.fall_duration_ms = ms;
        }

        if let Some(limit) = lookup("WORRY_TREE_RATE_LIMIT").and_then(|s| s.parse().ok()) {
            self.rate_limit = Some(limit);
        }

        if let Some(key) = lookup("GEMINI_API_KEY").or_else(|| lookup("API_KEY")) {
            if !key.trim().is_empty() {
                self.gemini_api_key = Some(key);
            }
        }
    }

    pub fn fall_duration(&self) -> Duration {
        Duration::from_millis(self.fall_duration_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

fn get_config_path() -> Result<PathBuf> {
    let mut path =
        config_dir().ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;
    path.push(APP_NAME);
    path.push(CONFIG_FILE);
    Ok(path)
}
