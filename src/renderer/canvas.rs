//! Primitive drawing surface
//!
//! The frame composer only ever talks to a `Canvas`. `DrawList` records the
//! calls so they can be tessellated for the GPU or inspected in tests.

use glam::Vec2;

/// 8-bit straight-alpha color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub const fn from_rgb_array(rgb: [u8; 3]) -> Self {
        Self::rgb(rgb[0], rgb[1], rgb[2])
    }

    /// Black with a 0-1 alpha (truncated to 8 bits)
    pub fn shadow(alpha: f32) -> Self {
        Self::new(0, 0, 0, (alpha.clamp(0.0, 1.0) * 255.0) as u8)
    }

    /// Normalized components for vertex upload
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

/// Scene palette
pub mod colors {
    use super::Rgba;

    pub const SKY: Rgba = Rgba::rgb(135, 206, 235);
    pub const SUN: Rgba = Rgba::rgb(255, 220, 0);
    pub const SUN_HALO: Rgba = Rgba::new(255, 255, 255, 100);
    pub const GROUND: Rgba = Rgba::rgb(34, 139, 34);
    pub const GRID_DARK: Rgba = Rgba::new(24, 120, 24, 100);
    pub const GRID_LIGHT: Rgba = Rgba::new(44, 160, 44, 100);
    pub const TRUNK: [u8; 3] = [139, 69, 19];
    pub const TRUNK_DARK: [u8; 3] = [110, 50, 15];
    pub const OVERLAY_PANEL: Rgba = Rgba::new(0, 0, 0, 180);
    pub const TEXT: Rgba = Rgba::rgb(255, 255, 255);
}

/// Something primitives can be drawn onto, in screen pixels (y down)
pub trait Canvas {
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    /// Axis-aligned rectangle from its top-left corner
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba);

    /// One pixel wide segment
    fn line(&mut self, from: Vec2, to: Vec2, color: Rgba);

    /// Single line of text with its top-left corner at `origin`
    fn text(&mut self, origin: Vec2, text: &str, color: Rgba);
}

/// One recorded primitive
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Circle {
        center: Vec2,
        radius: f32,
        color: Rgba,
    },
    Rect {
        origin: Vec2,
        size: Vec2,
        color: Rgba,
    },
    Line {
        from: Vec2,
        to: Vec2,
        color: Rgba,
    },
    Text {
        origin: Vec2,
        text: String,
        color: Rgba,
    },
}

/// Recording canvas; reused across frames
#[derive(Debug, Clone, Default)]
pub struct DrawList {
    commands: Vec<DrawCommand>,
}

impl DrawList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop recorded commands, keeping the allocation
    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Recorded text lines in draw order
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|c| match c {
            DrawCommand::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl Canvas for DrawList {
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::Rect {
            origin,
            size,
            color,
        });
    }

    fn line(&mut self, from: Vec2, to: Vec2, color: Rgba) {
        self.commands.push(DrawCommand::Line { from, to, color });
    }

    fn text(&mut self, origin: Vec2, text: &str, color: Rgba) {
        self.commands.push(DrawCommand::Text {
            origin,
            text: text.to_owned(),
            color,
        });
    }
}
