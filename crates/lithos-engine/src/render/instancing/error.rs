use thiserror::Error;

/// Failures of the instancing subsystem.
///
/// Construction errors are fatal for the component: nothing is retried and any
/// resource acquired before the failure is released on return.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum InstancingError {
    /// The transform buffer exceeds what the device can allocate.
    #[error("instance buffer of {requested} bytes exceeds device limit of {limit} bytes")]
    BufferAllocation { requested: u64, limit: u64 },

    /// The source mesh has no indices to draw.
    #[error("mesh has no indices; refusing to build an instanced field from it")]
    EmptyMesh,

    /// The mesh has more indices than a `u32` draw range can address.
    #[error("mesh has {indices} indices; at most {} can be drawn", u32::MAX)]
    MeshTooLarge { indices: usize },

    /// Configuration values that cannot produce a placement.
    #[error("invalid instancing config: {0}")]
    InvalidConfig(String),

    /// An instance index past the end of the population.
    #[error("instance index {index} out of range for population of {count}")]
    InstanceOutOfRange { index: usize, count: usize },
}
