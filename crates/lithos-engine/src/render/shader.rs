//! Shader collaborator for instanced meshes.
//!
//! `ShaderUniforms` is the name-based surface the instancing subsystem writes
//! material parameters through. `InstancedShader` is the wgpu program behind it:
//! fixed names map onto fields of one uniform block, flushed once per draw.

use std::collections::HashSet;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

use super::material::uniform;

/// Named uniform setters.
pub trait ShaderUniforms {
    fn set_int(&mut self, name: &str, value: i32);
    fn set_float(&mut self, name: &str, value: f32);
    fn set_vec3(&mut self, name: &str, value: Vec3);
}

/// Side length of each texture unit layer, in texels.
pub const TEXTURE_SIZE: u32 = 64;

/// Number of texture units (array layers) the program exposes.
pub const TEXTURE_UNITS: u32 = 2;

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
struct SceneUniform {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    camera_position: [f32; 4],
    light_dir: [f32; 4],
    specular_vec: [f32; 3],
    specular_pow: f32,
    tex_diffuse: i32,
    tex_normal: i32,
    _pad: [i32; 2],
}

impl Default for SceneUniform {
    fn default() -> Self {
        Self {
            view: Mat4::IDENTITY.to_cols_array_2d(),
            projection: Mat4::IDENTITY.to_cols_array_2d(),
            camera_position: [0.0, 0.0, 0.0, 1.0],
            light_dir: [-0.4, -1.0, -0.3, 0.0],
            specular_vec: [0.5; 3],
            specular_pow: 32.0,
            tex_diffuse: 0,
            tex_normal: 1,
            _pad: [0; 2],
        }
    }
}

/// wgpu program for instanced meshes: shader module, bind group (scene uniform
/// + texture units + sampler) and the pipeline layout built from them.
pub struct InstancedShader {
    module: wgpu::ShaderModule,
    pipeline_layout: wgpu::PipelineLayout,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    textures: wgpu::Texture,

    color_format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,

    uniforms: SceneUniform,
    dirty: bool,
    warned_names: HashSet<String>,
}

impl InstancedShader {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        color_format: wgpu::TextureFormat,
        depth_format: Option<wgpu::TextureFormat>,
    ) -> Self {
        let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("lithos instanced shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/instanced.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("lithos instanced bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: wgpu::BufferSize::new(
                            std::mem::size_of::<SceneUniform>() as u64,
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2Array,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("lithos instanced pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        let uniforms = SceneUniform::default();
        let uniform_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("lithos instanced scene ubo"),
            size: std::mem::size_of::<SceneUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let textures = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("lithos instanced texture units"),
            size: wgpu::Extent3d {
                width: TEXTURE_SIZE,
                height: TEXTURE_SIZE,
                depth_or_array_layers: TEXTURE_UNITS,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        let view = textures.create_view(&wgpu::TextureViewDescriptor {
            label: Some("lithos instanced texture units view"),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("lithos instanced sampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("lithos instanced bind group"),
            layout: &bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let shader = Self {
            module,
            pipeline_layout,
            bind_group,
            uniform_buffer,
            textures,
            color_format,
            depth_format,
            uniforms,
            dirty: true,
            warned_names: HashSet::new(),
        };

        // Neutral defaults: white albedo, flat tangent-space normal.
        shader.write_unit(queue, 0, &solid_layer([255, 255, 255, 255]));
        shader.write_unit(queue, 1, &solid_layer([128, 128, 255, 255]));
        shader
    }

    /// Replaces one texture unit with `TEXTURE_SIZE`² RGBA8 texels.
    ///
    /// Wrong-sized data or an out-of-range unit is ignored with a warning.
    pub fn write_unit(&self, queue: &wgpu::Queue, unit: u32, rgba: &[u8]) {
        let expected = (TEXTURE_SIZE * TEXTURE_SIZE * 4) as usize;
        if unit >= TEXTURE_UNITS || rgba.len() != expected {
            log::warn!(
                "texture unit {unit}: expected {expected} bytes for a unit < {TEXTURE_UNITS}, got {}",
                rgba.len()
            );
            return;
        }

        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &self.textures,
                mip_level: 0,
                origin: wgpu::Origin3d { x: 0, y: 0, z: unit },
                aspect: wgpu::TextureAspect::All,
            },
            rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(TEXTURE_SIZE * 4),
                rows_per_image: Some(TEXTURE_SIZE),
            },
            wgpu::Extent3d {
                width: TEXTURE_SIZE,
                height: TEXTURE_SIZE,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Sets the camera matrices used by every draw with this program.
    pub fn set_camera(&mut self, view: Mat4, projection: Mat4, position: Vec3) {
        self.uniforms.view = view.to_cols_array_2d();
        self.uniforms.projection = projection.to_cols_array_2d();
        self.uniforms.camera_position = position.extend(1.0).to_array();
        self.dirty = true;
    }

    /// Sets the direction light travels in (world space).
    pub fn set_light_dir(&mut self, dir: Vec3) {
        self.uniforms.light_dir = dir.normalize_or_zero().extend(0.0).to_array();
        self.dirty = true;
    }

    /// Uploads the uniform block if a setter changed it since the last flush.
    pub fn flush(&mut self, queue: &wgpu::Queue) {
        if !self.dirty {
            return;
        }
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&self.uniforms));
        self.dirty = false;
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }

    /// Builds a render pipeline for this program reading the given vertex streams.
    pub fn create_pipeline(
        &self,
        device: &wgpu::Device,
        label: &str,
        buffers: &[wgpu::VertexBufferLayout<'_>],
    ) -> wgpu::RenderPipeline {
        device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some(label),
            layout: Some(&self.pipeline_layout),

            vertex: wgpu::VertexState {
                module: &self.module,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &self.module,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.color_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: Some(wgpu::Face::Back),
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: self.depth_format.map(|format| wgpu::DepthStencilState {
                format,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),

            multiview_mask: None,
            cache: None,
        })
    }

    fn warn_unknown(&mut self, name: &str) {
        if self.warned_names.insert(name.to_string()) {
            log::debug!("InstancedShader: no uniform named `{name}`; ignored");
        }
    }
}

impl ShaderUniforms for InstancedShader {
    fn set_int(&mut self, name: &str, value: i32) {
        match name {
            uniform::TEX_DIFFUSE => self.uniforms.tex_diffuse = value,
            uniform::TEX_NORMAL => self.uniforms.tex_normal = value,
            _ => return self.warn_unknown(name),
        }
        self.dirty = true;
    }

    fn set_float(&mut self, name: &str, value: f32) {
        match name {
            uniform::SPECULAR_POW => self.uniforms.specular_pow = value,
            _ => return self.warn_unknown(name),
        }
        self.dirty = true;
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        match name {
            uniform::SPECULAR_VEC => self.uniforms.specular_vec = value.to_array(),
            _ => return self.warn_unknown(name),
        }
        self.dirty = true;
    }
}

fn solid_layer(rgba: [u8; 4]) -> Vec<u8> {
    rgba.repeat((TEXTURE_SIZE * TEXTURE_SIZE) as usize)
}
