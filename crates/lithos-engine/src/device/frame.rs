/// A single acquired swapchain frame.
///
/// Short-lived: holding the surface texture blocks acquisition of the next frame.
/// The depth view (if any) borrows nothing; it is a cheap handle to the `Gpu`'s
/// depth texture of matching size.
pub struct GpuFrame {
    pub surface_texture: wgpu::SurfaceTexture,
    pub view: wgpu::TextureView,
    pub depth_view: Option<wgpu::TextureView>,
    pub encoder: wgpu::CommandEncoder,
}
