//! Projected shadows
//!
//! Tree shadows are expensive (one dab per pixel of shadow length) and only
//! change when the sun, the tree, or the shadow intensity changes, so each
//! tree owns a `ShadowCache` keyed by a `ShadowStamp` of those inputs.
//! Cloud shadows move every tick and are derived fresh per frame.

use glam::Vec2;

use super::light;
use super::state::Cloud;
use crate::consts::*;
use crate::ground_line;

/// Spacing between consecutive dabs along the shadow bearing (pixels)
const DAB_SPACING: f32 = 0.8;
/// Alpha of the dab at the shadow base (out of 255)
const DAB_BASE_ALPHA: f32 = 50.0;
/// Shadow is lifted slightly so it starts under the trunk
const DAB_LIFT: f32 = 2.0;

/// One filled circle of a pre-rendered shadow, relative to the tree base
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowDab {
    pub offset: Vec2,
    pub radius: f32,
    /// 0-1
    pub alpha: f32,
}

/// Pre-rendered shadow shape for one tree
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowArtifact {
    /// Shadow length the dabs were laid out for
    pub length: f32,
    /// Bearing the shadow extends along (radians)
    pub bearing: f32,
    /// Dabs ordered from the base outward
    pub dabs: Vec<ShadowDab>,
}

/// Inputs a cached shadow was computed against.
///
/// Any difference in any field means the artifact is stale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStamp {
    pub light: Vec2,
    pub intensity: f32,
    /// Tree base position
    pub anchor: Vec2,
    pub size: f32,
}

/// Cached shadow plus the stamp it is valid for
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowCache {
    stamp: Option<ShadowStamp>,
    artifact: ShadowArtifact,
    /// Number of times the artifact has been rebuilt
    rasterizations: u64,
}

impl ShadowCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the cached artifact matches `stamp` exactly
    pub fn is_valid_for(&self, stamp: &ShadowStamp) -> bool {
        self.stamp.as_ref() == Some(stamp)
    }

    /// True if the cache holds an artifact at all
    pub fn is_valid(&self) -> bool {
        self.stamp.is_some()
    }

    /// Drop the stamp so the next `ensure_valid` rebuilds
    pub fn invalidate(&mut self) {
        self.stamp = None;
    }

    /// Rebuild the artifact if `stamp` differs from the stored one.
    ///
    /// Returns true when a rebuild happened. Afterwards the artifact is
    /// consistent with `stamp`.
    pub fn ensure_valid(&mut self, stamp: ShadowStamp) -> bool {
        if self.is_valid_for(&stamp) {
            return false;
        }
        self.artifact = rasterize_tree_shadow(&stamp);
        self.stamp = Some(stamp);
        self.rasterizations += 1;
        true
    }

    pub fn artifact(&self) -> &ShadowArtifact {
        &self.artifact
    }

    pub fn rasterizations(&self) -> u64 {
        self.rasterizations
    }
}

/// Lay out the tapering dab sequence for a tree shadow
pub fn rasterize_tree_shadow(stamp: &ShadowStamp) -> ShadowArtifact {
    let base_length = stamp.size * 2.0;
    let length = light::shadow_length(stamp.light, stamp.anchor, base_length, stamp.intensity);
    let bearing = light::angle(stamp.light, stamp.anchor);
    let dir = Vec2::new(bearing.cos(), bearing.sin());
    let trunk_width = stamp.size * 0.2;

    let steps = if length > 0.0 { length.ceil() as usize } else { 0 };
    let dabs = (0..steps)
        .map(|i| {
            let i = i as f32;
            let progress = i / length;
            ShadowDab {
                offset: dir * i * DAB_SPACING - Vec2::new(0.0, DAB_LIFT),
                // Keep some minimum width at the tip
                radius: trunk_width * 0.6 * (1.0 - progress * 0.8),
                alpha: DAB_BASE_ALPHA * (1.0 - progress) / 255.0,
            }
        })
        .collect();

    ShadowArtifact {
        length,
        bearing,
        dabs,
    }
}

/// One horizontal stroke of a cloud's ground shadow
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShadowStroke {
    pub from: Vec2,
    pub to: Vec2,
    /// 0-1
    pub alpha: f32,
}

/// Strokes per puff in a cloud shadow
const CLOUD_SHADOW_STEPS: usize = 10;
/// Shadows fade in over this many pixels below the ground line
const HORIZON_FADE: f32 = 20.0;

/// Ground shadow of a cloud, projected away from the sun.
///
/// Clouds above the sun cast nothing.
pub fn cloud_shadow_strokes(cloud: &Cloud, sun: Vec2) -> Vec<ShadowStroke> {
    if cloud.pos.y < sun.y {
        return Vec::new();
    }

    let horizon = ground_line();
    let offset = (cloud.pos - sun) * Vec2::new(0.2, 0.3);
    let base_y = horizon + CLOUD_SHADOW_DEPTH;

    // Higher clouds (smaller y) cast wider, flatter shadows
    let height_factor = cloud.pos.y / SCREEN_HEIGHT;
    let stretch = Vec2::new(1.5 + height_factor, 0.3 + height_factor * 0.2);
    let angle_adjust = light::angle(sun, cloud.pos).sin() * 15.0;
    let extent = cloud.size * 0.4 * stretch;

    let mut strokes = Vec::with_capacity(Cloud::PUFFS * CLOUD_SHADOW_STEPS);
    for puff in cloud.puff_offsets() {
        let center = Vec2::new(
            cloud.pos.x + offset.x + puff.x,
            base_y + offset.y * 0.3 + puff.y + angle_adjust,
        );

        for i in 0..CLOUD_SHADOW_STEPS {
            let progress = i as f32 / CLOUD_SHADOW_STEPS as f32;
            let half_width = extent.x * (1.0 - progress * 0.5);
            let y = center.y + progress * extent.y;
            if y < horizon {
                continue;
            }
            let fade = ((y - horizon) / HORIZON_FADE).min(1.0);
            strokes.push(ShadowStroke {
                from: Vec2::new(center.x - half_width, y),
                to: Vec2::new(center.x + half_width, y),
                alpha: cloud.opacity * 40.0 * (1.0 - progress) * fade / 255.0,
            });
        }
    }
    strokes
}
