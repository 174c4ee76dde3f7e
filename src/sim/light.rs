//! Light model
//!
//! Pure functions deriving lighting and shadow factors from the sun position.
//! Nothing here holds state: identical inputs always produce identical
//! outputs, which is what lets the shadow cache compare input stamps.

use glam::Vec2;

use crate::consts::SCREEN_HEIGHT;
use crate::screen_diagonal;

/// Lower bound of the brightness multiplier applied to lit surfaces
pub const ILLUMINATION_MIN: f32 = 0.4;
/// Upper bound of the brightness multiplier applied to lit surfaces
pub const ILLUMINATION_MAX: f32 = 1.5;

/// Euclidean distance from the light to a target
#[inline]
pub fn distance(light: Vec2, target: Vec2) -> f32 {
    light.distance(target)
}

/// Bearing from the light to a target (radians, screen space with y down)
#[inline]
pub fn angle(light: Vec2, target: Vec2) -> f32 {
    let d = target - light;
    d.y.atan2(d.x)
}

/// 1 when coincident, falling linearly to 0 at the screen diagonal
#[inline]
pub fn proximity_factor(light: Vec2, target: Vec2) -> f32 {
    (1.0 - distance(light, target) / screen_diagonal()).max(0.0)
}

/// Base surface light for a grounded object: brighter near the sun,
/// darker when the sun sinks toward the horizon. Range [0.4, 1.0].
pub fn surface_light(light: Vec2, target: Vec2) -> f32 {
    let sun_height_factor = (light.y / SCREEN_HEIGHT).clamp(0.0, 1.0);
    0.4 + 0.6 * proximity_factor(light, target) * (1.0 - sun_height_factor)
}

/// Directional term for a feature offset from its owner's origin:
/// features facing along the light bearing get up to 30% extra.
pub fn directional_term(local_offset: Vec2, bearing: f32) -> f32 {
    let relative = local_offset.y.atan2(local_offset.x) - bearing;
    0.7 + 0.3 * relative.cos()
}

/// Brightness multiplier for a feature `local_offset` from an object at
/// `target`: the directional term, boosted by up to 50% as the object
/// nears the light. Far from the light this is the bare directional term.
pub fn illumination(light: Vec2, target: Vec2, local_offset: Vec2) -> f32 {
    let bearing = angle(light, target);
    let boost = 1.0 + 0.5 * proximity_factor(light, target);
    (directional_term(local_offset, bearing) * boost).clamp(ILLUMINATION_MIN, ILLUMINATION_MAX)
}

/// Projected shadow length for an object at `target`.
///
/// Longer when the sun is low and close, shorter when the bearing is
/// near-horizontal (sun level with the object), scaled by `intensity`.
pub fn shadow_length(light: Vec2, target: Vec2, base_length: f32, intensity: f32) -> f32 {
    // Shadows get longer when the sun is closer
    let distance_factor = proximity_factor(light, target).max(0.5) * 2.0;

    // Lower sun stretches shadows; floor avoids blowing up at the horizon
    let sun_height = SCREEN_HEIGHT - light.y;
    let height_factor = (sun_height / SCREEN_HEIGHT).max(0.2);

    let mut length = base_length * (1.0 / height_factor) * distance_factor;

    let vertical = angle(light, target).sin().abs();
    length *= 0.3 + 0.7 * vertical;

    length * intensity
}

/// Scale a color channel triple by a light factor, keeping the result in
/// the visible band regardless of the shadow intensity.
pub fn shade_rgb(base: [u8; 3], light_factor: f32, intensity: f32) -> [u8; 3] {
    let adjusted = (light_factor * intensity).clamp(ILLUMINATION_MIN, ILLUMINATION_MAX);
    base.map(|c| (c as f32 * adjusted).min(255.0) as u8)
}
