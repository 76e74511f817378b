//! GPU-resident indexed meshes.
//!
//! Meshes are shared collaborators: an `InstancedField` holds an `Arc<GpuMesh>`
//! and never owns the vertex/index buffers exclusively.

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;

use super::instancing::{InstancingError, MeshSource};

/// Interleaved vertex: position, normal, texture coordinate.
#[repr(C)]
#[derive(Debug, Copy, Clone, Default, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
}

impl MeshVertex {
    const ATTRS: [wgpu::VertexAttribute; 3] = wgpu::vertex_attr_array![
        0 => Float32x3, // position
        1 => Float32x3, // normal
        2 => Float32x2  // uv
    ];

    pub fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<MeshVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

/// CPU-side mesh data (triangle list, `u32` indices).
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Index count as a draw range bound.
    pub fn index_count(&self) -> Result<u32, InstancingError> {
        checked_index_count(self.indices.len())
    }

    /// Returns the first index that points past the vertex array, if any.
    pub fn first_out_of_range_index(&self) -> Option<u32> {
        // Past u32::MAX vertices every u32 index is addressable.
        let n = u32::try_from(self.vertices.len()).unwrap_or(u32::MAX);
        self.indices.iter().copied().find(|&i| i >= n)
    }
}

/// Vertex + index buffers for one drawable shape.
pub struct GpuMesh {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl GpuMesh {
    /// Uploads `data` into immutable vertex/index buffers.
    ///
    /// Empty data still yields valid (4-byte) buffers with `index_count == 0`;
    /// consumers decide whether an empty mesh is acceptable. A mesh whose index
    /// count does not fit a `u32` is rejected before any buffer is created.
    pub fn upload(device: &wgpu::Device, label: &str, data: &MeshData) -> Result<Self, InstancingError> {
        let index_count = data.index_count()?;

        if let Some(bad) = data.first_out_of_range_index() {
            log::warn!(
                "mesh `{label}`: index {bad} exceeds vertex count {}",
                data.vertices.len()
            );
        }

        let vertices = buffer_or_placeholder(
            device,
            &format!("{label} vbo"),
            bytemuck::cast_slice(&data.vertices),
            wgpu::BufferUsages::VERTEX,
        );
        let indices = buffer_or_placeholder(
            device,
            &format!("{label} ibo"),
            bytemuck::cast_slice(&data.indices),
            wgpu::BufferUsages::INDEX,
        );

        Ok(Self {
            vertices,
            indices,
            index_count,
        })
    }

    pub fn vertex_buffer(&self) -> &wgpu::Buffer {
        &self.vertices
    }

    pub fn index_buffer(&self) -> &wgpu::Buffer {
        &self.indices
    }
}

impl MeshSource for GpuMesh {
    fn index_count(&self) -> u32 {
        self.index_count
    }
}

fn checked_index_count(len: usize) -> Result<u32, InstancingError> {
    u32::try_from(len).map_err(|_| InstancingError::MeshTooLarge { indices: len })
}

fn buffer_or_placeholder(
    device: &wgpu::Device,
    label: &str,
    contents: &[u8],
    usage: wgpu::BufferUsages,
) -> wgpu::Buffer {
    if contents.is_empty() {
        return device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size: wgpu::COPY_BUFFER_ALIGNMENT,
            usage,
            mapped_at_creation: false,
        });
    }

    device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some(label),
        contents,
        usage,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<MeshVertex>(), 32);
        assert_eq!(MeshVertex::layout().array_stride, 32);
    }

    #[test]
    fn out_of_range_index_detected() {
        let data = MeshData {
            vertices: vec![MeshVertex::default(); 3],
            indices: vec![0, 1, 3],
        };
        assert_eq!(data.first_out_of_range_index(), Some(3));
        assert_eq!(data.index_count(), Ok(3));
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn index_count_past_u32_is_rejected() {
        let too_many = u32::MAX as usize + 1;
        assert_eq!(
            checked_index_count(too_many),
            Err(InstancingError::MeshTooLarge { indices: too_many })
        );
        assert_eq!(checked_index_count(u32::MAX as usize), Ok(u32::MAX));
    }
}
