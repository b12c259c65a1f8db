//! Overlay configuration
//!
//! Every field has a default, so a config file only needs the values it
//! overrides. Files are plain JSON.

use crate::constants;
use crate::error::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Styling applied to the UI context when the overlay is initialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub window_rounding: f32,
    pub frame_rounding: f32,
    /// Alpha of the window background fill, 0.0 - 1.0
    pub window_bg_alpha: f32,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            window_rounding: 5.0,
            frame_rounding: 3.0,
            window_bg_alpha: 0.95,
        }
    }
}

/// Runtime configuration for [`crate::lifecycle::UiLifecycleManager`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub style: StyleConfig,
    /// Frame time used when the host reports none
    pub default_frame_time: f32,
    /// Seconds of frame time between layout saves; 0 disables autosave
    pub autosave_interval: f32,
    /// File name of the layout file inside the settings directory
    pub layout_file_name: String,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            style: StyleConfig::default(),
            default_frame_time: constants::frame::DEFAULT_FRAME_TIME,
            autosave_interval: constants::settings::AUTOSAVE_INTERVAL_SECS,
            layout_file_name: constants::settings::LAYOUT_FILE_NAME.to_string(),
        }
    }
}

impl OverlayConfig {
    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SettingsError::io(path, e))?;
        serde_json::from_str(&text).map_err(|e| SettingsError::parse(path, e))
    }

    /// Platform settings directory used when the host never supplies one
    pub fn default_settings_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(constants::settings::APP_DIR_NAME))
    }
}
