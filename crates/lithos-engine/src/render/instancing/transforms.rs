//! CPU-side per-instance model matrices.

use glam::{Mat4, Quat, Vec3};

use super::error::InstancingError;
use super::placement::{Placement, RotationScatter};

/// Model matrices for a fixed population, index-aligned with its base state.
///
/// `matrices.len()` equals the population size for the lifetime of the value.
#[derive(Debug, Clone)]
pub struct TransformArray {
    center: Vec3,
    offsets: Vec<Vec3>,
    scales: Vec<f32>,
    rotations: Vec<Quat>,
    matrices: Vec<Mat4>,
}

impl TransformArray {
    /// Builds the base state from a placement; every matrix starts as identity.
    pub fn new(placement: &Placement, rotation: Option<RotationScatter>, center: Vec3) -> Self {
        let n = placement.len();
        let offsets = (0..n).map(|i| placement.offset(i)).collect();

        let scales = placement.scales.clone().unwrap_or_else(|| vec![1.0; n]);

        let rotations = match (&placement.angles, rotation) {
            (Some(angles), Some(r)) => {
                let axis = r.axis.normalize();
                angles.iter().map(|&a| Quat::from_axis_angle(axis, a)).collect()
            }
            _ => vec![Quat::IDENTITY; n],
        };

        Self {
            center,
            offsets,
            scales,
            rotations,
            matrices: vec![Mat4::IDENTITY; n],
        }
    }

    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    /// Moves the shared center all instances are placed around.
    pub fn set_center(&mut self, center: Vec3) {
        self.center = center;
    }

    /// Fixed base offset of instance `i`.
    pub fn offset(&self, i: usize) -> Option<Vec3> {
        self.offsets.get(i).copied()
    }

    /// Recomputes instance `i`'s matrix from its own base state and the center.
    ///
    /// `_dt` is accepted so per-instance animation can hook in without changing
    /// callers; the current model is a pure function of base state and center.
    pub fn compute_transform(&mut self, i: usize, _dt: f32) -> Result<(), InstancingError> {
        let count = self.len();
        let offset = *self
            .offsets
            .get(i)
            .ok_or(InstancingError::InstanceOutOfRange { index: i, count })?;

        self.matrices[i] = model_matrix(self.center, offset, self.scales[i], self.rotations[i]);
        Ok(())
    }

    /// Recomputes every matrix.
    pub fn compute_all(&mut self, _dt: f32) {
        let center = self.center;
        let base = self.offsets.iter().zip(&self.scales).zip(&self.rotations);
        for (m, ((&offset, &scale), &rotation)) in self.matrices.iter_mut().zip(base) {
            *m = model_matrix(center, offset, scale, rotation);
        }
    }

    /// Translation of instance `i` as currently encoded in its matrix.
    pub fn position(&self, i: usize) -> Option<Vec3> {
        self.matrices.get(i).map(|m| {
            let (_, _, translation) = m.to_scale_rotation_translation();
            translation
        })
    }

    pub fn matrices(&self) -> &[Mat4] {
        &self.matrices
    }

    /// Column-major `f32` bytes of all matrices, 64 bytes per instance.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.matrices)
    }
}

fn model_matrix(center: Vec3, offset: Vec3, scale: f32, rotation: Quat) -> Mat4 {
    Mat4::from_scale_rotation_translation(Vec3::splat(scale), rotation, center + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placement(xs: &[f32], ys: &[f32]) -> Placement {
        Placement {
            offsets_x: xs.to_vec(),
            offsets_y: ys.to_vec(),
            scales: None,
            angles: None,
        }
    }

    #[test]
    fn matrices_start_as_identity() {
        let t = TransformArray::new(&placement(&[1.0, 2.0], &[0.0, 0.5]), None, Vec3::ZERO);
        assert_eq!(t.len(), 2);
        assert!(t.matrices().iter().all(|m| *m == Mat4::IDENTITY));
    }

    #[test]
    fn translation_is_center_plus_offset() {
        let mut t = TransformArray::new(&placement(&[1.0], &[0.5]), None, Vec3::new(0.0, 0.0, -3.0));
        t.compute_transform(0, 0.0).unwrap();
        assert_eq!(t.matrices()[0], Mat4::from_translation(Vec3::new(1.0, 0.5, -3.0)));
        assert_eq!(t.position(0), Some(Vec3::new(1.0, 0.5, -3.0)));
    }

    #[test]
    fn instances_differ_only_by_offset() {
        let mut t = TransformArray::new(&placement(&[1.0, 4.0, 7.5], &[0.0, 1.0, 1.5]), None, Vec3::new(2.0, 2.0, 2.0));
        t.compute_all(0.0);

        for i in 0..t.len() {
            let delta = t.offset(i).unwrap() - t.offset(0).unwrap();
            assert_eq!(t.matrices()[i], Mat4::from_translation(delta) * t.matrices()[0]);
        }
    }

    #[test]
    fn recomputing_one_instance_leaves_others() {
        let mut t = TransformArray::new(&placement(&[1.0, 2.0], &[0.0, 0.0]), None, Vec3::ZERO);
        t.compute_all(0.0);
        let before = t.matrices()[1];

        t.set_center(Vec3::X * 10.0);
        t.compute_transform(0, 0.0).unwrap();

        assert_eq!(t.matrices()[1], before);
        assert_eq!(t.position(0), Some(Vec3::new(11.0, 0.0, 0.0)));
    }

    #[test]
    fn compute_all_matches_each_single_recompute() {
        let p = Placement {
            offsets_x: vec![1.0, 3.0, 5.5],
            offsets_y: vec![0.0, 0.5, 1.5],
            scales: Some(vec![0.5, 1.0, 2.0]),
            angles: Some(vec![0.0, 1.0, 2.5]),
        };
        let rot = RotationScatter { axis: Vec3::new(1.0, 1.0, 0.0), max_angle: std::f32::consts::PI };
        let center = Vec3::new(-2.0, 4.0, 1.0);

        let mut all = TransformArray::new(&p, Some(rot), center);
        all.compute_all(0.016);

        let mut single = TransformArray::new(&p, Some(rot), center);
        for i in 0..single.len() {
            single.compute_transform(i, 0.016).unwrap();
        }

        assert_eq!(all.matrices(), single.matrices());
        assert!(all.matrices().iter().all(|m| *m != Mat4::IDENTITY));
    }

    #[test]
    fn out_of_range_index_reported() {
        let mut t = TransformArray::new(&placement(&[1.0], &[1.0]), None, Vec3::ZERO);
        assert_eq!(
            t.compute_transform(3, 0.0),
            Err(InstancingError::InstanceOutOfRange { index: 3, count: 1 })
        );
    }

    #[test]
    fn scale_and_rotation_compose_with_translation() {
        let p = Placement {
            offsets_x: vec![1.0],
            offsets_y: vec![0.0],
            scales: Some(vec![2.0]),
            angles: Some(vec![std::f32::consts::FRAC_PI_2]),
        };
        let rot = RotationScatter { axis: Vec3::Z, max_angle: std::f32::consts::PI };
        let mut t = TransformArray::new(&p, Some(rot), Vec3::ZERO);
        t.compute_transform(0, 0.0).unwrap();

        // Unit X, scaled by 2 then rotated 90° about Z, then moved by (1, 0, 0).
        let p = t.matrices()[0].transform_point3(Vec3::X);
        assert!((p - Vec3::new(1.0, 2.0, 0.0)).length() < 1e-5);
    }

    #[test]
    fn byte_view_is_sixty_four_per_instance() {
        let t = TransformArray::new(&placement(&[0.0; 5], &[0.0; 5]), None, Vec3::ZERO);
        assert_eq!(t.as_bytes().len(), 5 * 64);
    }
}
