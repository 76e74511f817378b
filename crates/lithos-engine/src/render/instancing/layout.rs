//! Per-instance vertex stream layout.
//!
//! A 4x4 matrix exceeds the four-component limit of a single vertex attribute,
//! so each instance's model matrix occupies four consecutive attribute slots,
//! one per column, all advancing once per instance.

use glam::Mat4;

/// Vertex buffer slot the transform stream is bound to (slot 0 is the mesh).
pub const INSTANCE_BUFFER_SLOT: u32 = 1;

/// Shader location of the first matrix column; columns use 3, 4, 5, 6.
pub const FIRST_INSTANCE_LOCATION: u32 = 3;

/// Bytes per instance in the transform buffer.
pub const TRANSFORM_STRIDE: u64 = std::mem::size_of::<Mat4>() as u64;

const COLUMN_BYTES: u64 = TRANSFORM_STRIDE / 4;

const TRANSFORM_ATTRIBUTES: [wgpu::VertexAttribute; 4] = [
    column(0),
    column(1),
    column(2),
    column(3),
];

const fn column(i: u32) -> wgpu::VertexAttribute {
    wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x4,
        offset: i as u64 * COLUMN_BYTES,
        shader_location: FIRST_INSTANCE_LOCATION + i,
    }
}

/// Layout of the per-instance transform stream.
pub fn transform_buffer_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: TRANSFORM_STRIDE,
        step_mode: wgpu::VertexStepMode::Instance,
        attributes: &TRANSFORM_ATTRIBUTES,
    }
}
