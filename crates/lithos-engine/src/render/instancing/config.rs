use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;

use super::error::InstancingError;
use super::placement::PlacementParams;

/// How a field seeds the generator its placement is drawn from.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SeedPolicy {
    /// Reproducible scenes: the same seed yields the same placement.
    Fixed(u64),
    /// A fresh OS-seeded generator per field.
    Entropy,
}

impl Default for SeedPolicy {
    fn default() -> Self {
        SeedPolicy::Fixed(0x11_7805)
    }
}

impl SeedPolicy {
    pub fn rng(self) -> StdRng {
        match self {
            SeedPolicy::Fixed(seed) => StdRng::seed_from_u64(seed),
            SeedPolicy::Entropy => StdRng::from_os_rng(),
        }
    }
}

/// Everything needed to build an `InstancedField` besides the GPU collaborators.
#[derive(Debug, Clone, PartialEq)]
pub struct InstancingConfig {
    pub placement: PlacementParams,
    pub seed: SeedPolicy,
    /// Shared point every instance offset is relative to.
    pub center: Vec3,
    /// Velocity of the center, in units per second.
    pub drift: Vec3,
}

impl Default for InstancingConfig {
    fn default() -> Self {
        Self {
            placement: PlacementParams::default(),
            seed: SeedPolicy::default(),
            center: Vec3::ZERO,
            drift: Vec3::ZERO,
        }
    }
}

impl InstancingConfig {
    pub fn with_count(mut self, count: usize) -> Self {
        self.placement.count = count;
        self
    }

    pub fn with_seed(mut self, seed: SeedPolicy) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), InstancingError> {
        self.placement.validate()?;
        if !self.center.is_finite() || !self.drift.is_finite() {
            return Err(InstancingError::InvalidConfig(
                "center and drift must be finite".into(),
            ));
        }
        Ok(())
    }
}
