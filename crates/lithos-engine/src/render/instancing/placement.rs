//! One-time pseudo-random scatter of instance offsets.
//!
//! Each scattered scalar is `r * extent / density` with `r` drawn uniformly
//! from `[0, density)`, so values land on a grid of `density` steps inside
//! `[0, extent)`. The random source is always passed in by the caller.

use glam::Vec3;
use rand::Rng;

use super::error::InstancingError;

/// Per-instance uniform scale drawn from `[min, max)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ScaleScatter {
    pub min: f32,
    pub max: f32,
}

/// Per-instance rotation about `axis` by an angle drawn from `[0, max_angle)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RotationScatter {
    pub axis: Vec3,
    pub max_angle: f32,
}

/// Shape of the scatter region and population.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementParams {
    /// Population size. Zero is legal.
    pub count: usize,
    /// Scatter extent along X (offsets lie in `[0, extent_x)`).
    pub extent_x: f32,
    /// Scatter extent along Y (offsets lie in `[0, extent_y)`).
    pub extent_y: f32,
    /// Number of quantization steps per axis; must be non-zero.
    pub density: u32,
    pub scale: Option<ScaleScatter>,
    pub rotation: Option<RotationScatter>,
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            count: 100,
            extent_x: 10.0,
            extent_y: 2.0,
            density: 1000,
            scale: None,
            rotation: None,
        }
    }
}

impl PlacementParams {
    pub fn validate(&self) -> Result<(), InstancingError> {
        let invalid = |msg: String| Err(InstancingError::InvalidConfig(msg));

        if self.density == 0 {
            return invalid("density must be non-zero".into());
        }
        for (name, extent) in [("extent_x", self.extent_x), ("extent_y", self.extent_y)] {
            if !extent.is_finite() || extent < 0.0 {
                return invalid(format!("{name} must be finite and >= 0, got {extent}"));
            }
        }
        if let Some(s) = self.scale {
            if !(s.min.is_finite() && s.max.is_finite()) || s.min <= 0.0 || s.min > s.max {
                return invalid(format!("scale range [{}, {}) is not a positive interval", s.min, s.max));
            }
        }
        if let Some(r) = self.rotation {
            if !r.max_angle.is_finite() || r.max_angle < 0.0 {
                return invalid(format!("max_angle must be finite and >= 0, got {}", r.max_angle));
            }
            if r.axis.length_squared() <= f32::EPSILON || !r.axis.is_finite() {
                return invalid("rotation axis must be a finite non-zero vector".into());
            }
        }
        Ok(())
    }
}

/// Generated per-instance base state, index-aligned across all arrays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Placement {
    pub offsets_x: Vec<f32>,
    pub offsets_y: Vec<f32>,
    /// Present only when the params request scale scatter.
    pub scales: Option<Vec<f32>>,
    /// Rotation angles (radians); present only with rotation scatter.
    pub angles: Option<Vec<f32>>,
}

impl Placement {
    pub fn len(&self) -> usize {
        self.offsets_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets_x.is_empty()
    }

    /// Base offset of instance `i` in the XY plane.
    pub fn offset(&self, i: usize) -> Vec3 {
        Vec3::new(self.offsets_x[i], self.offsets_y[i], 0.0)
    }
}

/// Draws `count` values on the `density`-step grid of `[0, extent)`.
///
/// The grid position is computed in `f64`; a value that rounds up to `extent`
/// when narrowed is pulled back to the largest `f32` below it.
pub fn scatter_axis<R: Rng + ?Sized>(rng: &mut R, count: usize, extent: f32, density: u32) -> Vec<f32> {
    let step = f64::from(extent) / f64::from(density);
    (0..count)
        .map(|_| below((f64::from(rng.random_range(0..density)) * step) as f32, extent))
        .collect()
}

/// Keeps `v` strictly under a positive `bound`.
fn below(v: f32, bound: f32) -> f32 {
    if bound > 0.0 && v >= bound {
        f32::from_bits(bound.to_bits() - 1)
    } else {
        v
    }
}

/// Generates a placement for `params` from `rng`.
pub fn generate<R: Rng + ?Sized>(params: &PlacementParams, rng: &mut R) -> Result<Placement, InstancingError> {
    params.validate()?;

    let PlacementParams { count, extent_x, extent_y, density, .. } = *params;

    let offsets_x = scatter_axis(rng, count, extent_x, density);
    let offsets_y = scatter_axis(rng, count, extent_y, density);

    let scales = params.scale.map(|s| {
        scatter_axis(rng, count, s.max - s.min, density)
            .into_iter()
            .map(|v| if s.max > s.min { below(s.min + v, s.max) } else { s.min })
            .collect()
    });

    let angles = params
        .rotation
        .map(|r| scatter_axis(rng, count, r.max_angle, density));

    log::trace!("scattered {count} instances over {extent_x}x{extent_y} (density {density})");

    Ok(Placement { offsets_x, offsets_y, scales, angles })
}
