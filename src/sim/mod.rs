//! Deterministic scene simulation
//!
//! Everything that changes the scene lives here. This module must stay
//! pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (storage order)
//! - No rendering or platform dependencies

pub mod animation;
pub mod input;
pub mod light;
pub mod shadow;
pub mod state;
pub mod tick;

pub use input::{DragSession, DragTarget, InputSnapshot, InputTracker, Intent, Interpreter, Key};
pub use shadow::{ShadowArtifact, ShadowCache, ShadowDab, ShadowStamp, ShadowStroke};
pub use state::{ActiveCloudPolicy, Cloud, Param, Scene, SceneParams, Sun, Tree, TreeShape};
pub use tick::{TickOutcome, TickStats, tick};
