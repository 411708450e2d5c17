//! User settings stored as settings.json in the app data directory

use crate::constants::{BACKEND_ENV_VAR, DEFAULT_BACKEND_URL, DEFAULT_QUALITY, MAX_QUALITY, RECONNECT_DELAY};
use crate::types::{SearchType, Source};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Backend
    pub backend_url: String,
    pub reconnect_delay_secs: u64,

    // Download + search defaults
    pub quality: u8,
    pub search_type: SearchType,
    pub source: Source,

    // Window geometry
    pub window_x: Option<f32>,
    pub window_y: Option<f32>,
    pub window_w: Option<f32>,
    pub window_h: Option<f32>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            reconnect_delay_secs: RECONNECT_DELAY.as_secs(),
            quality: DEFAULT_QUALITY,
            search_type: SearchType::default(),
            source: Source::default(),
            window_x: None,
            window_y: None,
            window_w: None,
            window_h: None,
        }
    }
}

impl Settings {
    pub fn load(data_dir: &Path) -> Self {
        let path = data_dir.join(SETTINGS_FILE);
        let mut settings = match std::fs::read_to_string(&path) {
            Ok(s) => match serde_json::from_str::<Settings>(&s) {
                Ok(settings) => {
                    debug!(path = %path.display(), "Settings loaded");
                    settings
                }
                Err(e) => {
                    warn!(error = %e, "Failed to parse settings, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                debug!("No settings file found, using defaults");
                Self::default()
            }
        };
        settings.quality = settings.quality.min(MAX_QUALITY);
        settings
    }

    pub fn save(&self, data_dir: &Path) {
        let path = data_dir.join(SETTINGS_FILE);
        match serde_json::to_string_pretty(self) {
            Ok(json) => {
                if let Err(e) = std::fs::write(&path, json) {
                    warn!(error = %e, "Failed to save settings");
                }
            }
            Err(e) => warn!(error = %e, "Failed to serialize settings"),
        }
    }

    /// Apply `RIP_PANEL_BACKEND` if set
    pub fn apply_env(&mut self) {
        self.apply_backend_override(std::env::var(BACKEND_ENV_VAR).ok());
    }

    fn apply_backend_override(&mut self, value: Option<String>) {
        if let Some(url) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
            info!(backend = %url, "Backend url overridden from environment");
            self.backend_url = url;
        }
    }

    pub fn reconnect_delay(&self) -> Duration {
        if self.reconnect_delay_secs == 0 {
            return RECONNECT_DELAY;
        }
        Duration::from_secs(self.reconnect_delay_secs)
    }
}
