//! GPU rendering subsystem.
//!
//! Renderers own their GPU resources (pipelines, buffers, textures) and record
//! into a `RenderTarget` supplied by the frame loop.
//!
//! Convention:
//! - world space is right-handed, +Y up
//! - matrices are column-major `glam::Mat4`, uploaded as-is

mod ctx;
pub mod instancing;
pub mod material;
pub mod mesh;
pub mod shader;

pub use ctx::{RenderCtx, RenderTarget};
