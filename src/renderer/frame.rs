//! Frame composition
//!
//! Issues every primitive for one frame, back to front:
//! sky, sun, ground, cloud shadows, tree shadows, trees, clouds, overlay.
//! The scene must have been revalidated by `tick` before composing; tree
//! shadows are read straight from their caches.

use glam::Vec2;
use std::f32::consts::TAU;

use super::canvas::{Canvas, Rgba, colors};
use crate::consts::*;
use crate::ground_line;
use crate::sim::input::{DragSession, DragTarget};
use crate::sim::light;
use crate::sim::shadow::cloud_shadow_strokes;
use crate::sim::state::{Cloud, Scene, SceneParams, Sun, Tree, TreeShape};

const SUN_RAYS: usize = 12;
/// Isometric ground tile edge (pixels)
const GRID_CELL: f32 = 40.0;
/// Crown tiers per tree
const CROWN_TIERS: usize = 3;

const OVERLAY_ORIGIN: Vec2 = Vec2::new(10.0, 10.0);
const OVERLAY_SIZE: Vec2 = Vec2::new(240.0, 180.0);
const OVERLAY_TEXT_X: f32 = 15.0;
const OVERLAY_TEXT_TOP: f32 = 20.0;
const OVERLAY_LINE_HEIGHT: f32 = 20.0;
const HINT_ORIGIN: Vec2 = Vec2::new(4.0, 4.0);
const HINT_LINE_HEIGHT: f32 = 16.0;

/// Compose one frame onto `canvas`.
///
/// `drag` is the interpreter's current session; the sun gets a halo while
/// it is being dragged.
pub fn compose_frame<C: Canvas + ?Sized>(
    scene: &Scene,
    drag: Option<&DragSession>,
    canvas: &mut C,
) {
    let sun_dragged = matches!(drag, Some(d) if d.target == DragTarget::Sun);
    let clouds = scene.active_clouds();
    let order = scene.trees_back_to_front();

    draw_sky(canvas);
    draw_sun(canvas, &scene.sun, sun_dragged);
    draw_ground(canvas);
    draw_cloud_shadows(canvas, clouds, scene.sun.pos);
    draw_tree_shadows(canvas, &scene.trees, &order);
    for &i in &order {
        draw_tree(canvas, &scene.trees[i], scene.sun.pos, scene.params.shadow_intensity);
    }
    for cloud in clouds {
        draw_cloud(canvas, cloud, scene.sun.pos);
    }
    draw_overlay(canvas, &scene.params);
}

fn draw_sky<C: Canvas + ?Sized>(canvas: &mut C) {
    canvas.fill_rect(
        Vec2::ZERO,
        Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT),
        colors::SKY,
    );
}

fn draw_sun<C: Canvas + ?Sized>(canvas: &mut C, sun: &Sun, dragged: bool) {
    canvas.fill_circle(sun.pos, SUN_RADIUS, colors::SUN);

    let inner = SUN_RADIUS * 0.5;
    let outer = SUN_RADIUS * 0.75;
    for i in 0..SUN_RAYS {
        let theta = i as f32 * TAU / SUN_RAYS as f32;
        let dir = Vec2::new(theta.cos(), theta.sin());
        canvas.line(sun.pos + dir * inner, sun.pos + dir * outer, colors::SUN);
    }

    if dragged {
        canvas.fill_circle(sun.pos, SUN_RADIUS + 2.0, colors::SUN_HALO);
    }
}

fn draw_ground<C: Canvas + ?Sized>(canvas: &mut C) {
    let top = ground_line();
    canvas.fill_rect(
        Vec2::new(0.0, top),
        Vec2::new(SCREEN_WIDTH, SCREEN_HEIGHT - top),
        colors::GROUND,
    );

    let rows = (GROUND_HEIGHT / GRID_CELL) as i32 + 1;
    let cols = (SCREEN_WIDTH / GRID_CELL) as i32 + 2;
    for row in 0..rows {
        for col in -1..cols {
            let x = col as f32 * GRID_CELL - row as f32 * GRID_CELL * 0.5;
            let y = top + row as f32 * GRID_CELL * 0.5;
            let corner = Vec2::new(x + GRID_CELL, y + GRID_CELL * 0.5);
            canvas.line(Vec2::new(x, y), corner, colors::GRID_DARK);
            canvas.line(corner, Vec2::new(x + GRID_CELL * 2.0, y), colors::GRID_LIGHT);
        }
    }
}

fn draw_cloud_shadows<C: Canvas + ?Sized>(canvas: &mut C, clouds: &[Cloud], sun: Vec2) {
    for cloud in clouds {
        for stroke in cloud_shadow_strokes(cloud, sun) {
            canvas.line(stroke.from, stroke.to, Rgba::shadow(stroke.alpha));
        }
    }
}

fn draw_tree_shadows<C: Canvas + ?Sized>(canvas: &mut C, trees: &[Tree], order: &[usize]) {
    for &i in order {
        let tree = &trees[i];
        for dab in &tree.shadow.artifact().dabs {
            canvas.fill_circle(tree.pos + dab.offset, dab.radius, Rgba::shadow(dab.alpha));
        }
    }
}

fn draw_tree<C: Canvas + ?Sized>(canvas: &mut C, tree: &Tree, sun: Vec2, intensity: f32) {
    let lit = light::surface_light(sun, tree.pos);
    let shade = |rgb: [u8; 3]| Rgba::from_rgb_array(light::shade_rgb(rgb, lit, intensity));

    // Trunk with a darker right edge
    let trunk_w = tree.trunk_width();
    let trunk_h = tree.trunk_height();
    let trunk_top = tree.pos.y - trunk_h;
    canvas.fill_rect(
        Vec2::new(tree.pos.x - trunk_w / 2.0, trunk_top),
        Vec2::new(trunk_w, trunk_h),
        shade(colors::TRUNK),
    );
    canvas.fill_rect(
        Vec2::new(tree.pos.x + trunk_w / 2.0 - 2.0, trunk_top),
        Vec2::new(4.0, trunk_h),
        shade(colors::TRUNK_DARK),
    );

    let green = (tree.shade * 255.0) as u8;
    let leaves = shade([0, green, 0]);
    let leaves_dark = shade([0, (green as f32 * 0.7) as u8, 0]);
    let crown_base = Vec2::new(tree.pos.x, trunk_top);

    let size = tree.size;
    match tree.shape {
        TreeShape::Pointed => draw_pointed_crown(canvas, crown_base, size, leaves, leaves_dark),
        TreeShape::Rounded => draw_rounded_crown(canvas, crown_base, size, leaves, leaves_dark),
        TreeShape::Spherical => {
            draw_spherical_crown(canvas, crown_base, size, leaves, leaves_dark)
        }
    }
}

/// Tapering triangles, filled one scanline at a time
fn draw_pointed_crown<C: Canvas + ?Sized>(
    canvas: &mut C,
    base: Vec2,
    size: f32,
    leaves: Rgba,
    dark: Rgba,
) {
    let tier_height = size * 0.4;
    for tier in 0..CROWN_TIERS {
        let t = tier as f32;
        let tier_width = size * (1.0 - t * 0.2);
        let bottom = base.y - tier_height * t;
        let top = base.y - tier_height * (t + 1.0);

        let mut y = bottom;
        while y > top {
            let progress = (bottom - y) / (bottom - top);
            let half = tier_width * (1.0 - progress) / 2.0;
            canvas.line(Vec2::new(base.x - half, y), Vec2::new(base.x + half, y), leaves);
            canvas.line(
                Vec2::new(base.x + half, y),
                Vec2::new(base.x + half + 5.0, y + 2.0),
                dark,
            );
            y -= 1.0;
        }
    }
}

fn draw_rounded_crown<C: Canvas + ?Sized>(
    canvas: &mut C,
    base: Vec2,
    size: f32,
    leaves: Rgba,
    highlight: Rgba,
) {
    let height = size * 0.4;
    for tier in 0..CROWN_TIERS {
        let t = tier as f32;
        let center = Vec2::new(base.x, base.y - height * t);
        let width = size * 0.7 * (1.0 - t * 0.2);
        canvas.fill_circle(center, width / 2.0, leaves);
        canvas.fill_circle(
            center + Vec2::new(width * 0.2, -height * 0.1),
            width * 0.15,
            highlight,
        );
    }
}

fn draw_spherical_crown<C: Canvas + ?Sized>(
    canvas: &mut C,
    base: Vec2,
    size: f32,
    leaves: Rgba,
    highlight: Rgba,
) {
    for tier in 0..CROWN_TIERS {
        let t = tier as f32;
        let center = Vec2::new(base.x, base.y - size * 0.4 * t);
        let radius = size * 0.35 * (1.0 - t * 0.2);
        canvas.fill_circle(center, radius, leaves);
        canvas.fill_circle(
            center + Vec2::new(radius * 0.5, -radius * 0.3),
            radius * 0.3,
            highlight,
        );
    }
}

/// Cloud puff color: white lit by `light::illumination`, then tinted
/// yellow near the sun
pub fn puff_color(cloud: &Cloud, puff_offset: Vec2, sun: Vec2) -> Rgba {
    let tint = (25.0 * light::proximity_factor(sun, cloud.pos)) as u8;
    let lit = light::illumination(sun, cloud.pos, puff_offset);
    let white = (255.0 * lit).min(255.0) as u8;
    Rgba::new(
        white,
        white,
        white.saturating_sub(tint),
        (cloud.opacity.clamp(0.0, 1.0) * 255.0) as u8,
    )
}

fn draw_cloud<C: Canvas + ?Sized>(canvas: &mut C, cloud: &Cloud, sun: Vec2) {
    let radius = cloud.puff_radius();
    for offset in cloud.puff_offsets() {
        canvas.fill_circle(cloud.pos + offset, radius, puff_color(cloud, offset, sun));
    }
}

/// Text shown in the overlay panel, one entry per line
pub fn overlay_lines(params: &SceneParams) -> Vec<String> {
    vec![
        "=== Environment Controls ===".to_owned(),
        format!("Tree Count: {} (Up/Down)", params.tree_count),
        format!("Cloud Count: {} (Left/Right)", params.cloud_count),
        format!("Shadow Intensity: {:.1} (S/D)", params.shadow_intensity),
        "Controls:".to_owned(),
        "- M: Toggle Menu".to_owned(),
        "- LMB: Drag Sun/Trees".to_owned(),
        "- ESC: Exit".to_owned(),
    ]
}

/// Controls reminder shown while the overlay is hidden
pub const HINT_LINES: [&str; 3] = [
    "Press M for environment controls",
    "LMB to drag sun/trees",
    "Press ESC to exit",
];

fn draw_overlay<C: Canvas + ?Sized>(canvas: &mut C, params: &SceneParams) {
    if params.overlay_visible {
        canvas.fill_rect(OVERLAY_ORIGIN, OVERLAY_SIZE, colors::OVERLAY_PANEL);
        for (i, line) in overlay_lines(params).iter().enumerate() {
            let y = OVERLAY_TEXT_TOP + i as f32 * OVERLAY_LINE_HEIGHT;
            canvas.text(Vec2::new(OVERLAY_TEXT_X, y), line, colors::TEXT);
        }
    } else {
        for (i, line) in HINT_LINES.iter().enumerate() {
            let origin = HINT_ORIGIN + Vec2::new(0.0, i as f32 * HINT_LINE_HEIGHT);
            canvas.text(origin, line, colors::TEXT);
        }
    }
}
