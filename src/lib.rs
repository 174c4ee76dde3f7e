//! Cloudscape - a sunlit outdoor scene with a draggable sun
//!
//! Core modules:
//! - `sim`: Deterministic scene simulation (entities, lighting, shadow cache, input)
//! - `renderer`: Frame composition and the WebGPU presentation pipeline
//! - `settings`: Startup configuration

pub mod renderer;
pub mod settings;
pub mod sim;

pub use settings::Settings;

use glam::Vec2;

/// Scene configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz; cloud velocities are per tick)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 4;

    /// Logical screen size in pixels (y grows downward)
    pub const SCREEN_WIDTH: f32 = 800.0;
    pub const SCREEN_HEIGHT: f32 = 600.0;
    pub const WINDOW_TITLE: &str = "Cloud Generation";

    /// Ground band
    pub const GROUND_HEIGHT: f32 = 150.0;
    /// Offset of the visible ground line below the nominal ground top
    pub const GROUND_OFFSET: f32 = 20.0;
    /// How far below the ground line cloud shadows are projected
    pub const CLOUD_SHADOW_DEPTH: f32 = 35.0;

    /// Sun glyph radius, also the hit radius for dragging it
    pub const SUN_RADIUS: f32 = 40.0;
    /// Gap kept between the lowest sun position and the ground top
    pub const SUN_GROUND_GAP: f32 = 10.0;

    /// Stored clouds
    pub const MAX_CLOUDS: usize = 100;
    /// Clouds wrap once they pass this far beyond the right edge
    pub const CLOUD_WRAP_MARGIN: f32 = 100.0;
    /// Overlay cloud-count step
    pub const CLOUD_COUNT_STEP: usize = 10;

    /// Foliage count bounds
    pub const MIN_TREES: usize = 1;
    pub const MAX_TREES: usize = 20;
    pub const DEFAULT_TREES: usize = 5;

    /// Shadow intensity bounds and step
    pub const MIN_SHADOW_INTENSITY: f32 = 0.2;
    pub const MAX_SHADOW_INTENSITY: f32 = 2.0;
    pub const SHADOW_INTENSITY_STEP: f32 = 0.1;

    /// Density step (overlay hidden)
    pub const DENSITY_STEP: f32 = 0.1;
    pub const DEFAULT_DENSITY: f32 = 0.2;
}

/// Y coordinate of the visible ground line (top of the foliage band)
#[inline]
pub fn ground_line() -> f32 {
    consts::SCREEN_HEIGHT - consts::GROUND_HEIGHT + consts::GROUND_OFFSET
}

/// Length of the screen diagonal, the largest possible light-to-target distance
#[inline]
pub fn screen_diagonal() -> f32 {
    Vec2::new(consts::SCREEN_WIDTH, consts::SCREEN_HEIGHT).length()
}

/// Round to the nearest tenth (keeps stepped parameters on exact grid values)
#[inline]
pub fn round_tenths(value: f32) -> f32 {
    (value * 10.0).round() / 10.0
}
