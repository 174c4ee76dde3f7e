//! Frame composition and WebGPU presentation
//!
//! `compose_frame` draws the scene onto any `Canvas`. The browser host
//! records into a `DrawList`, tessellates it into colored triangles and
//! hands them to `RenderState`; text labels go to the DOM.

pub mod canvas;
pub mod frame;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use canvas::{Canvas, DrawCommand, DrawList, Rgba};
pub use frame::compose_frame;
pub use pipeline::{RenderError, RenderState};
pub use shapes::{Tessellation, TextLabel, tessellate};
pub use vertex::Vertex;
