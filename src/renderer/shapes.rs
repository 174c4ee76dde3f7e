//! Tessellation of recorded primitives into triangles

use glam::Vec2;
use std::f32::consts::TAU;

use super::canvas::{DrawCommand, DrawList, Rgba};
use super::vertex::Vertex;

/// Width of a stroked line in pixels
pub const LINE_WIDTH: f32 = 1.0;

const MIN_SEGMENTS: u32 = 8;
const MAX_SEGMENTS: u32 = 48;

/// Text placed over the triangle layer by the host
#[derive(Debug, Clone, PartialEq)]
pub struct TextLabel {
    pub origin: Vec2,
    pub text: String,
    pub color: Rgba,
}

/// One frame ready for upload
#[derive(Debug, Clone, Default)]
pub struct Tessellation {
    /// Triangle list in draw order, pixel coordinates
    pub vertices: Vec<Vertex>,
    pub labels: Vec<TextLabel>,
}

/// Circle segment count; small shadow dabs stay cheap
pub fn segments_for(radius: f32) -> u32 {
    ((radius * 0.75) as u32).clamp(MIN_SEGMENTS, MAX_SEGMENTS)
}

/// Triangle fan of a filled circle, appended to `out`
pub fn circle(out: &mut Vec<Vertex>, center: Vec2, radius: f32, color: Rgba, segments: u32) {
    out.reserve((segments * 3) as usize);
    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * TAU;
        let theta2 = ((i + 1) as f32 / segments as f32) * TAU;

        out.push(Vertex::at(center, color));
        out.push(Vertex::at(
            center + radius * Vec2::new(theta1.cos(), theta1.sin()),
            color,
        ));
        out.push(Vertex::at(
            center + radius * Vec2::new(theta2.cos(), theta2.sin()),
            color,
        ));
    }
}

/// Two triangles covering an axis-aligned rectangle
pub fn rect(out: &mut Vec<Vertex>, origin: Vec2, size: Vec2, color: Rgba) {
    let a = origin;
    let b = origin + Vec2::new(size.x, 0.0);
    let c = origin + size;
    let d = origin + Vec2::new(0.0, size.y);
    quad(out, [a, b, c, d], color);
}

/// Segment stroked as a quad `width` pixels wide
pub fn line(out: &mut Vec<Vertex>, from: Vec2, to: Vec2, width: f32, color: Rgba) {
    let dir = (to - from).normalize_or_zero();
    let perp = Vec2::new(-dir.y, dir.x) * (width * 0.5);
    quad(out, [from + perp, to + perp, to - perp, from - perp], color);
}

fn quad(out: &mut Vec<Vertex>, [a, b, c, d]: [Vec2; 4], color: Rgba) {
    out.extend([a, b, c, c, d, a].map(|p| Vertex::at(p, color)));
}

/// Convert a recorded frame into triangles plus text labels
pub fn tessellate(list: &DrawList) -> Tessellation {
    let mut out = Tessellation::default();
    for cmd in list.commands() {
        match cmd {
            DrawCommand::Circle {
                center,
                radius,
                color,
            } => circle(
                &mut out.vertices,
                *center,
                *radius,
                *color,
                segments_for(*radius),
            ),
            DrawCommand::Rect {
                origin,
                size,
                color,
            } => rect(&mut out.vertices, *origin, *size, *color),
            DrawCommand::Line { from, to, color } => {
                line(&mut out.vertices, *from, *to, LINE_WIDTH, *color)
            }
            DrawCommand::Text {
                origin,
                text,
                color,
            } => out.labels.push(TextLabel {
                origin: *origin,
                text: text.clone(),
                color: *color,
            }),
        }
    }
    out
}
