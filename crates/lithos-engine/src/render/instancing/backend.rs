//! Graphics API seam for the instancing subsystem.
//!
//! `InstancedField` only talks to the GPU through `InstanceBackend`. The wgpu
//! implementation maps the operations onto buffers, a render pipeline carrying
//! the per-instance vertex layout, and a render pass.

use crate::render::mesh::{GpuMesh, MeshVertex};
use crate::render::shader::{InstancedShader, ShaderUniforms};
use crate::render::RenderCtx;

use super::layout::INSTANCE_BUFFER_SLOT;

/// Read access to an externally owned mesh.
pub trait MeshSource {
    /// Number of indices one instance draws.
    fn index_count(&self) -> u32;
}

/// Operations the instancing subsystem needs from a graphics API.
pub trait InstanceBackend {
    /// Device buffer holding the per-instance transforms.
    type Buffer;
    type Mesh: MeshSource;
    /// Shader/material collaborator.
    type Shader: ShaderUniforms;
    /// Fixed binding of mesh + per-instance stream (wgpu: a render pipeline).
    type Binding;
    /// Recording context draws are issued into (wgpu: a render pass).
    type Pass<'p>;

    /// Largest buffer the device can allocate, in bytes.
    fn max_buffer_size(&self) -> u64;

    fn create_instance_buffer(&self, label: &str, size: u64) -> Self::Buffer;

    /// Configures the per-instance attribute stream for `mesh`. Called once per field.
    fn bind_instance_attributes(
        &self,
        shader: &Self::Shader,
        mesh: &Self::Mesh,
        layout: &wgpu::VertexBufferLayout<'static>,
    ) -> Self::Binding;

    /// Overwrites `buffer` from offset 0 with `bytes`.
    fn write_buffer(&self, buffer: &Self::Buffer, bytes: &[u8]);

    /// Issues one indexed draw of `mesh` covering `instance_count` instances.
    fn draw_instanced(
        &self,
        pass: &mut Self::Pass<'_>,
        binding: &Self::Binding,
        shader: &mut Self::Shader,
        mesh: &Self::Mesh,
        instances: &Self::Buffer,
        instance_count: u32,
    );
}

/// wgpu implementation over shared device and queue handles.
///
/// wgpu handles are reference counted, so the backend can outlive the frame
/// it was created in and be stored next to the fields it serves.
#[derive(Clone)]
pub struct WgpuInstanceBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
}

impl WgpuInstanceBackend {
    pub fn new(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        Self {
            device: device.clone(),
            queue: queue.clone(),
        }
    }

    pub fn from_ctx(ctx: &RenderCtx<'_>) -> Self {
        Self::new(ctx.device, ctx.queue)
    }
}

impl InstanceBackend for WgpuInstanceBackend {
    type Buffer = wgpu::Buffer;
    type Mesh = GpuMesh;
    type Shader = InstancedShader;
    type Binding = wgpu::RenderPipeline;
    type Pass<'p> = wgpu::RenderPass<'p>;

    fn max_buffer_size(&self) -> u64 {
        self.device.limits().max_buffer_size
    }

    fn create_instance_buffer(&self, label: &str, size: u64) -> wgpu::Buffer {
        // Rewritten every frame; COPY_DST is the streaming-write usage.
        self.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some(label),
            size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn bind_instance_attributes(
        &self,
        shader: &InstancedShader,
        _mesh: &GpuMesh,
        layout: &wgpu::VertexBufferLayout<'static>,
    ) -> wgpu::RenderPipeline {
        shader.create_pipeline(
            &self.device,
            "lithos instanced pipeline",
            &[MeshVertex::layout(), layout.clone()],
        )
    }

    fn write_buffer(&self, buffer: &wgpu::Buffer, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        self.queue.write_buffer(buffer, 0, bytes);
    }

    fn draw_instanced(
        &self,
        pass: &mut wgpu::RenderPass<'_>,
        binding: &wgpu::RenderPipeline,
        shader: &mut InstancedShader,
        mesh: &GpuMesh,
        instances: &wgpu::Buffer,
        instance_count: u32,
    ) {
        shader.flush(&self.queue);

        pass.set_pipeline(binding);
        pass.set_bind_group(0, shader.bind_group(), &[]);
        pass.set_vertex_buffer(0, mesh.vertex_buffer().slice(..));
        pass.set_vertex_buffer(INSTANCE_BUFFER_SLOT, instances.slice(..));
        pass.set_index_buffer(mesh.index_buffer().slice(..), wgpu::IndexFormat::Uint32);
        pass.draw_indexed(0..mesh.index_count(), 0, 0..instance_count);
    }
}
