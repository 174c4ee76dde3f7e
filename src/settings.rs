//! Startup settings
//!
//! Values the scene starts from. Nothing is persisted; a run always begins
//! from these and resets only on restart.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::round_tenths;

/// Scene startup settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// RNG seed (host picks one from the clock/OS when absent)
    pub seed: Option<u64>,

    // === Clouds ===
    /// Number of clouds stored (upper bound for the overlay cloud count)
    pub max_clouds: usize,
    /// Fraction of stored clouds shown while the overlay is hidden (0.0 - 1.0)
    pub density: f32,

    // === Trees ===
    /// Initial tree count
    pub tree_count: usize,
    /// Shadow intensity (0.2 - 2.0)
    pub shadow_intensity: f32,

    // === HUD ===
    /// Start with the environment overlay open
    pub overlay_visible: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,

            max_clouds: MAX_CLOUDS,
            density: DEFAULT_DENSITY,

            tree_count: DEFAULT_TREES,
            shadow_intensity: 1.0,

            overlay_visible: false,
        }
    }
}

/// Settings parse failure
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("invalid settings JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl Settings {
    /// Parse settings overrides from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(json)?;
        Ok(settings.validated())
    }

    /// Clamp every value into its documented range
    pub fn validated(mut self) -> Self {
        self.max_clouds = self.max_clouds.min(MAX_CLOUDS);
        self.density = round_tenths(self.density.clamp(0.0, 1.0));
        self.tree_count = self.tree_count.clamp(MIN_TREES, MAX_TREES);
        self.shadow_intensity = round_tenths(
            self.shadow_intensity
                .clamp(MIN_SHADOW_INTENSITY, MAX_SHADOW_INTENSITY),
        );
        self
    }

    /// One-line JSON summary for the startup log
    pub fn to_log_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| format!("<unserializable: {e}>"))
    }
}
