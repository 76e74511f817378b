//! The instancing component: one shared mesh, one material, N transforms.

use std::sync::Arc;

use glam::{Mat4, Vec3};
use rand::Rng;

use crate::render::material::Material;

use super::backend::{InstanceBackend, MeshSource};
use super::buffer::InstanceBuffer;
use super::config::InstancingConfig;
use super::error::InstancingError;
use super::layout::transform_buffer_layout;
use super::placement;
use super::transforms::TransformArray;

/// A population of copies of one mesh drawn with a single instanced call.
///
/// A value of this type only exists fully initialized: placement generated,
/// transform buffer allocated, per-instance attributes bound. The population
/// size never changes; build a new field for a different count.
///
/// Frame order is fixed by [`update`](Self::update): recompute transforms,
/// upload the whole array, draw once.
pub struct InstancedField<A: InstanceBackend> {
    mesh: Arc<A::Mesh>,
    material: Material,
    transforms: TransformArray,
    buffer: InstanceBuffer<A::Buffer>,
    binding: A::Binding,
    drift: Vec3,
}

impl<A: InstanceBackend> InstancedField<A> {
    /// Builds a field, seeding its generator from `config.seed`.
    pub fn new(
        backend: &A,
        shader: &A::Shader,
        mesh: Arc<A::Mesh>,
        material: Material,
        config: &InstancingConfig,
    ) -> Result<Self, InstancingError> {
        let mut rng = config.seed.rng();
        Self::with_rng(backend, shader, mesh, material, config, &mut rng)
    }

    /// Builds a field drawing its placement from a caller-supplied generator.
    ///
    /// `config.seed` is ignored.
    pub fn with_rng<R: Rng + ?Sized>(
        backend: &A,
        shader: &A::Shader,
        mesh: Arc<A::Mesh>,
        material: Material,
        config: &InstancingConfig,
        rng: &mut R,
    ) -> Result<Self, InstancingError> {
        config.validate()?;

        let count = config.placement.count;
        if u32::try_from(count).is_err() {
            return Err(InstancingError::InvalidConfig(format!(
                "{count} instances exceed the draw call's u32 instance range"
            )));
        }

        if mesh.index_count() == 0 {
            log::error!("instanced field: source mesh has no indices");
            return Err(InstancingError::EmptyMesh);
        }

        let placement = placement::generate(&config.placement, rng)?;
        let transforms = TransformArray::new(&placement, config.placement.rotation, config.center);

        let buffer = InstanceBuffer::allocate(backend, "lithos instance transforms", transforms.len())?;
        let binding = backend.bind_instance_attributes(shader, &mesh, &transform_buffer_layout());

        log::info!(
            "instanced field ready: {} instances x {} indices",
            transforms.len(),
            mesh.index_count()
        );

        Ok(Self {
            mesh,
            material,
            transforms,
            buffer,
            binding,
            drift: config.drift,
        })
    }

    /// Per-frame entry point: animate, recompute, upload, bind material, draw.
    pub fn update(
        &mut self,
        backend: &A,
        dt: f32,
        shader: &mut A::Shader,
        pass: &mut A::Pass<'_>,
    ) {
        if self.drift != Vec3::ZERO {
            let center = self.transforms.center() + self.drift * dt;
            self.transforms.set_center(center);
        }

        self.transforms.compute_all(dt);
        self.upload(backend);

        self.material.apply(shader);
        backend.draw_instanced(
            pass,
            &self.binding,
            shader,
            &self.mesh,
            self.buffer.raw(),
            self.instance_count(),
        );
    }

    /// Recomputes a single instance's matrix. Not visible to the GPU until [`upload`](Self::upload).
    pub fn compute_transform(&mut self, index: usize, dt: f32) -> Result<(), InstancingError> {
        self.transforms.compute_transform(index, dt)
    }

    /// Copies every matrix into the transform buffer.
    pub fn upload(&self, backend: &A) {
        self.buffer.upload(backend, self.transforms.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    fn instance_count(&self) -> u32 {
        // Bounded by the check in `with_rng`.
        self.transforms.len() as u32
    }

    pub fn matrices(&self) -> &[Mat4] {
        self.transforms.matrices()
    }

    /// World position of instance `index` as of its last computed transform.
    pub fn position(&self, index: usize) -> Option<Vec3> {
        self.transforms.position(index)
    }

    pub fn center(&self) -> Vec3 {
        self.transforms.center()
    }

    pub fn set_center(&mut self, center: Vec3) {
        self.transforms.set_center(center);
    }

    pub fn drift(&self) -> Vec3 {
        self.drift
    }

    pub fn set_drift(&mut self, drift: Vec3) {
        self.drift = drift;
    }

    pub fn material(&self) -> &Material {
        &self.material
    }

    pub fn set_material(&mut self, material: Material) {
        self.material = material;
    }

    pub fn mesh(&self) -> &Arc<A::Mesh> {
        &self.mesh
    }

    pub fn buffer(&self) -> &InstanceBuffer<A::Buffer> {
        &self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::material::uniform;
    use crate::render::instancing::recording::{
        RecordedPass, RecordingBackend, RecordingMesh, RecordingShader, UniformValue,
    };
    use crate::render::instancing::{PlacementParams, SeedPolicy};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn config(count: usize) -> InstancingConfig {
        InstancingConfig::default().with_count(count)
    }

    fn build(
        backend: &RecordingBackend,
        count: usize,
    ) -> InstancedField<RecordingBackend> {
        InstancedField::new(
            backend,
            &RecordingShader::default(),
            Arc::new(RecordingMesh::new(36)),
            Material::default(),
            &config(count),
        )
        .unwrap()
    }

    // ── construction ──────────────────────────────────────────────────────

    #[test]
    fn transform_array_length_matches_population() {
        for n in [0, 1, 7, 100, 1000] {
            let backend = RecordingBackend::default();
            let field = build(&backend, n);
            assert_eq!(field.len(), n);
            assert_eq!(field.matrices().len(), n);
        }
    }

    #[test]
    fn binding_configured_once_with_four_instance_slots() {
        let backend = RecordingBackend::default();
        let mut field = build(&backend, 10);
        let mut shader = RecordingShader::default();
        let mut pass = RecordedPass::default();

        for _ in 0..3 {
            field.update(&backend, 0.016, &mut shader, &mut pass);
        }

        let bindings = backend.bindings();
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].locations, vec![3, 4, 5, 6]);
        assert_eq!(bindings[0].stride, 64);
        assert_eq!(bindings[0].step_mode, wgpu::VertexStepMode::Instance);
    }

    #[test]
    fn empty_mesh_is_rejected() {
        let backend = RecordingBackend::default();
        let result = InstancedField::new(
            &backend,
            &RecordingShader::default(),
            Arc::new(RecordingMesh::new(0)),
            Material::default(),
            &config(10),
        );
        assert_eq!(result.err(), Some(InstancingError::EmptyMesh));
        assert_eq!(backend.buffers_created(), 0);
    }

    #[test]
    fn oversized_buffer_is_fatal() {
        let backend = RecordingBackend::with_max_buffer_size(64 * 10);
        let result = InstancedField::new(
            &backend,
            &RecordingShader::default(),
            Arc::new(RecordingMesh::new(3)),
            Material::default(),
            &config(11),
        );
        assert_eq!(
            result.err(),
            Some(InstancingError::BufferAllocation { requested: 704, limit: 640 })
        );
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn invalid_placement_is_rejected() {
        let backend = RecordingBackend::default();
        let cfg = InstancingConfig {
            placement: PlacementParams { density: 0, ..Default::default() },
            ..Default::default()
        };
        let result = InstancedField::new(
            &backend,
            &RecordingShader::default(),
            Arc::new(RecordingMesh::new(3)),
            Material::default(),
            &cfg,
        );
        assert!(matches!(result, Err(InstancingError::InvalidConfig(_))));
    }

    #[test]
    fn buffer_released_with_field() {
        let backend = RecordingBackend::default();
        let field = build(&backend, 5);
        assert_eq!(backend.live_buffers(), 1);
        drop(field);
        assert_eq!(backend.live_buffers(), 0);
    }

    #[test]
    fn fixed_seed_reproduces_scene() {
        let backend = RecordingBackend::default();
        let cfg = config(50).with_seed(SeedPolicy::Fixed(123));
        let shader = RecordingShader::default();
        let mesh = Arc::new(RecordingMesh::new(3));

        let mut a = InstancedField::new(&backend, &shader, mesh.clone(), Material::default(), &cfg).unwrap();
        let mut b = InstancedField::new(&backend, &shader, mesh, Material::default(), &cfg).unwrap();
        let (mut sa, mut pa) = (RecordingShader::default(), RecordedPass::default());
        a.update(&backend, 0.0, &mut sa, &mut pa);
        b.update(&backend, 0.0, &mut sa, &mut pa);

        assert_eq!(a.matrices(), b.matrices());
    }

    #[test]
    fn injected_rng_drives_placement() {
        let backend = RecordingBackend::default();
        let shader = RecordingShader::default();
        let mesh = Arc::new(RecordingMesh::new(3));
        let cfg = config(20);

        let mut a = InstancedField::with_rng(&backend, &shader, mesh.clone(), Material::default(), &cfg, &mut StdRng::seed_from_u64(5)).unwrap();
        let mut b = InstancedField::with_rng(&backend, &shader, mesh, Material::default(), &cfg, &mut StdRng::seed_from_u64(5)).unwrap();
        for i in 0..20 {
            a.compute_transform(i, 0.0).unwrap();
            b.compute_transform(i, 0.0).unwrap();
        }
        assert_eq!(a.matrices(), b.matrices());
    }

    // ── per-frame behavior ────────────────────────────────────────────────

    #[test]
    fn zero_instances_draw_nothing_without_error() {
        let backend = RecordingBackend::default();
        let mut field = build(&backend, 0);
        let mut shader = RecordingShader::default();
        let mut pass = RecordedPass::default();

        field.update(&backend, 0.016, &mut shader, &mut pass);

        assert_eq!(pass.draws.len(), 1);
        assert_eq!(pass.draws[0].instance_count, 0);
    }

    #[test]
    fn hundred_instances_one_draw_call() {
        let backend = RecordingBackend::default();
        let mut field = build(&backend, 100);
        let mut shader = RecordingShader::default();
        let mut pass = RecordedPass::default();

        field.update(&backend, 0.016, &mut shader, &mut pass);

        assert_eq!(pass.draws.len(), 1);
        assert_eq!(pass.draws[0].instance_count, 100);
        assert_eq!(pass.draws[0].index_count, 36);
    }

    #[test]
    fn upload_precedes_draw_each_frame() {
        let backend = RecordingBackend::default();
        let mut field = build(&backend, 4);
        let mut shader = RecordingShader::default();
        let mut pass = RecordedPass::default();

        field.update(&backend, 0.016, &mut shader, &mut pass);
        field.update(&backend, 0.016, &mut shader, &mut pass);

        assert_eq!(backend.writes(), 2);
        assert_eq!(pass.draws.len(), 2);
        assert_eq!(pass.draws[0].writes_before, 1);
        assert_eq!(pass.draws[1].writes_before, 2);
    }

    #[test]
    fn zero_time_transforms_differ_only_by_offset() {
        let backend = RecordingBackend::default();
        let mut field = build(&backend, 16);
        for i in 0..field.len() {
            field.compute_transform(i, 0.0).unwrap();
        }

        let m = field.matrices();
        let base = field.position(0).unwrap();
        for (i, mi) in m.iter().enumerate() {
            let delta = field.position(i).unwrap() - base;
            let expected = Mat4::from_translation(delta) * m[0];
            assert!(mi.abs_diff_eq(expected, 1e-5), "instance {i} coupled to others");
        }
    }

    #[test]
    fn drift_moves_center_by_velocity_times_dt() {
        let backend = RecordingBackend::default();
        let mut field = build(&backend, 3);
        field.set_drift(Vec3::new(2.0, 0.0, 0.0));
        let (mut shader, mut pass) = (RecordingShader::default(), RecordedPass::default());

        field.update(&backend, 0.5, &mut shader, &mut pass);

        assert_eq!(field.center(), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn material_written_under_fixed_names() {
        let backend = RecordingBackend::default();
        let mut field = build(&backend, 2);
        field.set_material(Material {
            specular_pow: 8.0,
            specular_vec: Vec3::ONE,
            ..Default::default()
        });
        let (mut shader, mut pass) = (RecordingShader::default(), RecordedPass::default());

        field.update(&backend, 0.0, &mut shader, &mut pass);

        assert_eq!(shader.get(uniform::TEX_DIFFUSE), Some(UniformValue::Int(0)));
        assert_eq!(shader.get(uniform::TEX_NORMAL), Some(UniformValue::Int(1)));
        assert_eq!(shader.get(uniform::SPECULAR_POW), Some(UniformValue::Float(8.0)));
        assert_eq!(shader.get(uniform::SPECULAR_VEC), Some(UniformValue::Vec3(Vec3::ONE)));
    }

    // ── upload ────────────────────────────────────────────────────────────

    #[test]
    fn readback_matches_cpu_matrices_bit_for_bit() {
        let backend = RecordingBackend::default();
        let mut field = build(&backend, 100);
        for i in 0..field.len() {
            field.compute_transform(i, 0.0).unwrap();
        }
        field.upload(&backend);

        let gpu = backend.read_back(field.buffer().raw());
        let cpu: &[u8] = bytemuck::cast_slice(field.matrices());
        assert_eq!(cpu.len(), 100 * 64);
        assert_eq!(&gpu[..cpu.len()], cpu);
    }

    #[test]
    fn double_upload_is_idempotent() {
        let backend = RecordingBackend::default();
        let mut field = build(&backend, 32);
        for i in 0..field.len() {
            field.compute_transform(i, 0.0).unwrap();
        }

        field.upload(&backend);
        let first = backend.read_back(field.buffer().raw());
        field.upload(&backend);
        let second = backend.read_back(field.buffer().raw());

        assert_eq!(first, second);
    }
}
