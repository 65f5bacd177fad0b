use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::data::model::ChannelPair;
use crate::selection::SelectionTool;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV: &str = "PARTITION_VIEWER_CONFIG";

/// Picked up from the working directory when the variable is unset.
pub const DEFAULT_CONFIG_FILE: &str = "partition-viewer.json";

/// Viewer settings. Every field is optional in the JSON file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub window_size: [f32; 2],
    /// Sample selected after an upload, when the upload contains it.
    pub default_sample: Option<String>,
    pub default_pair: ChannelPair,
    pub point_radius: f32,
    /// Number of discrete steps in the scatter colour scale.
    pub color_bins: usize,
    pub selection_tool: SelectionTool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            window_size: [1280.0, 900.0],
            default_sample: Some("A1".to_string()),
            default_pair: ChannelPair::default(),
            point_radius: 2.5,
            color_bins: 24,
            selection_tool: SelectionTool::Box,
        }
    }
}

impl ViewerConfig {
    /// Resolve the config from `PARTITION_VIEWER_CONFIG`, then
    /// `./partition-viewer.json`, then built-in defaults.
    pub fn load() -> Result<Self> {
        let path = match std::env::var_os(CONFIG_ENV) {
            Some(p) => PathBuf::from(p),
            None => {
                let p = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !p.exists() {
                    log::debug!("No {DEFAULT_CONFIG_FILE}, using defaults");
                    return Ok(Self::default());
                }
                p
            }
        };
        Self::from_path(&path)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_json(&text)
            .with_context(|| format!("in config {}", path.display()))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text).context("parsing viewer config")?;
        Ok(config)
    }
}
