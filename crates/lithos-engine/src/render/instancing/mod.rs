//! Instanced rendering of one mesh at many positions.
//!
//! An [`InstancedField`] owns a fixed population of model matrices and a
//! matching device buffer. Each frame it recomputes the matrices on the CPU,
//! uploads the whole array and draws every instance with a single indexed
//! call. The mesh is shared and never modified; the shader only sees the
//! material through [`ShaderUniforms`](crate::render::shader::ShaderUniforms).
//!
//! All GPU work goes through [`InstanceBackend`]; [`WgpuInstanceBackend`] is
//! the production implementation.

mod backend;
mod buffer;
mod config;
mod error;
mod field;
mod layout;
mod placement;
mod transforms;

#[cfg(test)]
pub(crate) mod recording;

pub use backend::{InstanceBackend, MeshSource, WgpuInstanceBackend};
pub use buffer::InstanceBuffer;
pub use config::{InstancingConfig, SeedPolicy};
pub use error::InstancingError;
pub use field::InstancedField;
pub use layout::{
    transform_buffer_layout, FIRST_INSTANCE_LOCATION, INSTANCE_BUFFER_SLOT, TRANSFORM_STRIDE,
};
pub use placement::{generate, scatter_axis, Placement, PlacementParams, RotationScatter, ScaleScatter};
pub use transforms::TransformArray;
