//! In-memory `InstanceBackend` that records every call, for GPU-free tests.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use glam::Vec3;

use crate::render::shader::ShaderUniforms;

use super::backend::{InstanceBackend, MeshSource};

pub struct RecordingBackend {
    max_buffer_size: u64,
    live: Rc<Cell<usize>>,
    created: Cell<usize>,
    writes: Cell<usize>,
    bindings: RefCell<Vec<RecordedBinding>>,
}

impl Default for RecordingBackend {
    fn default() -> Self {
        Self::with_max_buffer_size(256 << 20)
    }
}

impl RecordingBackend {
    pub fn with_max_buffer_size(max_buffer_size: u64) -> Self {
        Self {
            max_buffer_size,
            live: Rc::new(Cell::new(0)),
            created: Cell::new(0),
            writes: Cell::new(0),
            bindings: RefCell::new(Vec::new()),
        }
    }

    /// Buffers created and not yet dropped.
    pub fn live_buffers(&self) -> usize {
        self.live.get()
    }

    pub fn buffers_created(&self) -> usize {
        self.created.get()
    }

    pub fn writes(&self) -> usize {
        self.writes.get()
    }

    pub fn bindings(&self) -> Vec<RecordedBinding> {
        self.bindings.borrow().clone()
    }

    pub fn read_back(&self, buffer: &RecordedBuffer) -> Vec<u8> {
        buffer.data.borrow().clone()
    }
}

pub struct RecordedBuffer {
    data: RefCell<Vec<u8>>,
    live: Rc<Cell<usize>>,
}

impl Drop for RecordedBuffer {
    fn drop(&mut self) {
        self.live.set(self.live.get() - 1);
    }
}

pub struct RecordingMesh {
    index_count: u32,
}

impl RecordingMesh {
    pub fn new(index_count: u32) -> Self {
        Self { index_count }
    }
}

impl MeshSource for RecordingMesh {
    fn index_count(&self) -> u32 {
        self.index_count
    }
}

/// The per-instance layout a field asked to bind.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedBinding {
    pub locations: Vec<u32>,
    pub stride: u64,
    pub step_mode: wgpu::VertexStepMode,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawCall {
    pub index_count: u32,
    pub instance_count: u32,
    /// Buffer writes issued before this draw.
    pub writes_before: usize,
}

#[derive(Debug, Default)]
pub struct RecordedPass {
    pub draws: Vec<DrawCall>,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec3(Vec3),
}

#[derive(Debug, Default)]
pub struct RecordingShader {
    values: HashMap<String, UniformValue>,
}

impl RecordingShader {
    pub fn get(&self, name: &str) -> Option<UniformValue> {
        self.values.get(name).copied()
    }
}

impl ShaderUniforms for RecordingShader {
    fn set_int(&mut self, name: &str, value: i32) {
        self.values.insert(name.to_owned(), UniformValue::Int(value));
    }

    fn set_float(&mut self, name: &str, value: f32) {
        self.values.insert(name.to_owned(), UniformValue::Float(value));
    }

    fn set_vec3(&mut self, name: &str, value: Vec3) {
        self.values.insert(name.to_owned(), UniformValue::Vec3(value));
    }
}

impl InstanceBackend for RecordingBackend {
    type Buffer = RecordedBuffer;
    type Mesh = RecordingMesh;
    type Shader = RecordingShader;
    type Binding = RecordedBinding;
    type Pass<'p> = RecordedPass;

    fn max_buffer_size(&self) -> u64 {
        self.max_buffer_size
    }

    fn create_instance_buffer(&self, _label: &str, size: u64) -> RecordedBuffer {
        self.created.set(self.created.get() + 1);
        self.live.set(self.live.get() + 1);
        RecordedBuffer {
            data: RefCell::new(vec![0; size as usize]),
            live: Rc::clone(&self.live),
        }
    }

    fn bind_instance_attributes(
        &self,
        _shader: &RecordingShader,
        _mesh: &RecordingMesh,
        layout: &wgpu::VertexBufferLayout<'static>,
    ) -> RecordedBinding {
        let binding = RecordedBinding {
            locations: layout.attributes.iter().map(|a| a.shader_location).collect(),
            stride: layout.array_stride,
            step_mode: layout.step_mode,
        };
        self.bindings.borrow_mut().push(binding.clone());
        binding
    }

    fn write_buffer(&self, buffer: &RecordedBuffer, bytes: &[u8]) {
        self.writes.set(self.writes.get() + 1);
        buffer.data.borrow_mut()[..bytes.len()].copy_from_slice(bytes);
    }

    fn draw_instanced(
        &self,
        pass: &mut RecordedPass,
        _binding: &RecordedBinding,
        _shader: &mut RecordingShader,
        mesh: &RecordingMesh,
        _instances: &RecordedBuffer,
        instance_count: u32,
    ) {
        pass.draws.push(DrawCall {
            index_count: mesh.index_count,
            instance_count,
            writes_before: self.writes.get(),
        });
    }
}
