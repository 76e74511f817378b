//! Demo configuration with environment overrides.

use anyhow::{Context, Result};
use glam::Vec3;
use lithos_engine::render::instancing::{
    InstancingConfig, PlacementParams, RotationScatter, ScaleScatter, SeedPolicy,
};

use crate::rock::RockParams;

pub const INSTANCES_VAR: &str = "LITHOS_INSTANCES";
/// A decimal `u64`, or `entropy` for an OS-seeded scene.
pub const SEED_VAR: &str = "LITHOS_SEED";

#[derive(Debug, Clone)]
pub struct DemoConfig {
    pub field: InstancingConfig,
    pub rock: RockParams,
    /// Seeds the rock mesh and its textures.
    pub asset_seed: u64,
}

impl Default for DemoConfig {
    fn default() -> Self {
        let placement = PlacementParams {
            count: 1000,
            extent_x: 10.0,
            extent_y: 2.0,
            density: 1000,
            scale: Some(ScaleScatter { min: 0.03, max: 0.09 }),
            rotation: Some(RotationScatter {
                axis: Vec3::new(0.4, 0.6, 0.8),
                max_angle: std::f32::consts::TAU,
            }),
        };

        Self {
            field: InstancingConfig {
                // Center the [0, extent) scatter on the origin.
                center: Vec3::new(-placement.extent_x / 2.0, -placement.extent_y / 2.0, 0.0),
                placement,
                ..Default::default()
            },
            rock: RockParams::default(),
            asset_seed: 7,
        }
    }
}

impl DemoConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_vars(
            std::env::var(INSTANCES_VAR).ok().as_deref(),
            std::env::var(SEED_VAR).ok().as_deref(),
        )
    }

    pub fn from_vars(instances: Option<&str>, seed: Option<&str>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(raw) = instances {
            let count: usize = raw
                .trim()
                .parse()
                .with_context(|| format!("{INSTANCES_VAR}={raw:?} is not an instance count"))?;
            config.field.placement.count = count;
        }

        if let Some(raw) = seed {
            config.field.seed = parse_seed(raw)
                .with_context(|| format!("{SEED_VAR}={raw:?} is neither a u64 nor `entropy`"))?;
        }

        config.field.validate()?;
        Ok(config)
    }
}

fn parse_seed(raw: &str) -> Result<SeedPolicy> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("entropy") {
        return Ok(SeedPolicy::Entropy);
    }
    Ok(SeedPolicy::Fixed(raw.parse()?))
}
