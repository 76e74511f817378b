use super::backend::InstanceBackend;
use super::error::InstancingError;
use super::layout::TRANSFORM_STRIDE;

/// Device buffer sized for a fixed number of instance transforms.
///
/// Owns the backend buffer; dropping the wrapper releases it. Uploads always
/// cover the whole population; there is no partial-write entry point.
pub struct InstanceBuffer<B> {
    raw: B,
    instances: usize,
    size: u64,
}

impl<B> InstanceBuffer<B> {
    /// Allocates room for `instances` transforms.
    ///
    /// Zero instances still allocate one stride so the buffer can be bound.
    pub fn allocate<A>(backend: &A, label: &str, instances: usize) -> Result<Self, InstancingError>
    where
        A: InstanceBackend<Buffer = B>,
    {
        let limit = backend.max_buffer_size();
        let requested = (instances.max(1) as u64)
            .checked_mul(TRANSFORM_STRIDE)
            .unwrap_or(u64::MAX);

        if requested > limit {
            log::error!("{label}: {requested} bytes requested, device allows {limit}");
            return Err(InstancingError::BufferAllocation { requested, limit });
        }

        let raw = backend.create_instance_buffer(label, requested);
        log::debug!("{label}: allocated {requested} bytes for {instances} instances");

        Ok(Self { raw, instances, size: requested })
    }

    /// Writes the transforms of every instance (`instances * 64` bytes).
    pub fn upload<A>(&self, backend: &A, bytes: &[u8])
    where
        A: InstanceBackend<Buffer = B>,
    {
        debug_assert_eq!(
            bytes.len() as u64,
            self.instances as u64 * TRANSFORM_STRIDE,
            "instance upload must cover the whole population"
        );
        backend.write_buffer(&self.raw, bytes);
    }

    pub fn raw(&self) -> &B {
        &self.raw
    }

    pub fn instances(&self) -> usize {
        self.instances
    }

    /// Allocated size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}
