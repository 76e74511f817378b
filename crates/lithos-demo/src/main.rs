//! Asteroid field demo: one procedural rock drawn a thousand times with a
//! single instanced call.

mod camera;
mod config;
mod rock;
mod textures;

use std::sync::Arc;

use anyhow::{Context, Result};
use glam::Vec3;
use rand::SeedableRng;
use rand::rngs::StdRng;
use winit::dpi::LogicalSize;

use lithos_engine::core::{App, AppControl, FrameCtx};
use lithos_engine::device::GpuInit;
use lithos_engine::input::{Key, MouseButton};
use lithos_engine::logging::{init_logging, LoggingConfig};
use lithos_engine::render::instancing::{InstancedField, WgpuInstanceBackend};
use lithos_engine::render::material::Material;
use lithos_engine::render::mesh::GpuMesh;
use lithos_engine::render::shader::InstancedShader;
use lithos_engine::render::{RenderCtx, RenderTarget};
use lithos_engine::window::{Runtime, RuntimeConfig};

use camera::OrbitCamera;
use config::DemoConfig;

const CLEAR: wgpu::Color = wgpu::Color {
    r: 0.823_529_4,
    g: 0.631_372_5,
    b: 0.815_686_3,
    a: 1.0,
};

/// GPU state created on the first frame, once a device exists.
struct Scene {
    backend: WgpuInstanceBackend,
    shader: InstancedShader,
    field: InstancedField<WgpuInstanceBackend>,
}

impl Scene {
    fn new(ctx: &RenderCtx<'_>, config: &DemoConfig) -> Result<Self> {
        let mut assets = StdRng::seed_from_u64(config.asset_seed);

        let mut shader =
            InstancedShader::new(ctx.device, ctx.queue, ctx.surface_format, ctx.depth_format);
        shader.write_unit(ctx.queue, 0, &textures::rock_albedo(&mut assets));
        shader.write_unit(ctx.queue, 1, &textures::rock_detail(&mut assets, 0.35));
        shader.set_light_dir(Vec3::new(-0.5, -0.8, -0.3));

        let rock = rock::generate(&config.rock, &mut assets);
        log::debug!(
            "rock mesh: {} vertices, {} indices",
            rock.vertices.len(),
            rock.indices.len()
        );
        let mesh = Arc::new(GpuMesh::upload(ctx.device, "lithos rock", &rock).context("uploading rock mesh")?);

        let backend = WgpuInstanceBackend::from_ctx(ctx);
        let material = Material {
            specular_pow: 16.0,
            specular_vec: Vec3::splat(0.25),
            ..Default::default()
        };

        let field = InstancedField::new(&backend, &shader, mesh, material, &config.field)
            .context("failed to build asteroid field")?;

        Ok(Self { backend, shader, field })
    }

    fn draw(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>, camera: &OrbitCamera, dt: f32) {
        self.shader
            .set_camera(camera.view(), camera.projection(ctx.aspect()), camera.eye());

        let mut pass = target.begin_scene_pass("lithos asteroids");
        self.field.update(&self.backend, dt, &mut self.shader, &mut pass);
    }
}

/// Frame-rate readout refreshed into the window title.
#[derive(Debug, Default)]
struct FpsCounter {
    frames: u32,
    window: f32,
    total_frames: u64,
    elapsed: f32,
}

impl FpsCounter {
    /// Returns the average rate once per elapsed second.
    fn tick(&mut self, dt: f32) -> Option<f32> {
        self.frames += 1;
        self.total_frames += 1;
        self.window += dt;
        self.elapsed += dt;
        if self.window < 1.0 {
            return None;
        }
        let fps = self.frames as f32 / self.window;
        self.frames = 0;
        self.window = 0.0;
        Some(fps)
    }
}

struct AsteroidDemo {
    config: DemoConfig,
    camera: OrbitCamera,
    scene: Option<Scene>,
    fps: FpsCounter,
}

impl AsteroidDemo {
    fn new(config: DemoConfig) -> Self {
        Self {
            config,
            camera: OrbitCamera::default(),
            scene: None,
            fps: FpsCounter::default(),
        }
    }
}

impl App for AsteroidDemo {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.input_frame.keys_pressed.contains(&Key::Escape) {
            log::info!("escape pressed, exiting");
            return AppControl::Exit;
        }

        if ctx.input_frame.keys_pressed.contains(&Key::R) {
            self.camera = OrbitCamera::default();
        }

        if ctx.input_frame.buttons_pressed.contains(&MouseButton::Right) {
            ctx.window.set_cursor_captured(true);
        }
        if ctx.input_frame.buttons_released.contains(&MouseButton::Right) {
            ctx.window.set_cursor_captured(false);
        }

        let dt = ctx.time.dt;
        self.camera.update(ctx.input, ctx.input_frame, dt);

        let (config, camera, scene) = (&self.config, &self.camera, &mut self.scene);
        let mut setup_error = None;

        let control = ctx.render(CLEAR, |rctx, target| {
            if scene.is_none() {
                match Scene::new(rctx, config) {
                    Ok(s) => *scene = Some(s),
                    Err(e) => {
                        setup_error = Some(e);
                        return;
                    }
                }
            }

            if let Some(scene) = scene.as_mut() {
                scene.draw(rctx, target, camera, dt);
            }
        });

        if let Some(e) = setup_error {
            log::error!("{e:#}");
            return AppControl::Exit;
        }

        if let Some(fps) = self.fps.tick(dt) {
            let count = self.scene.as_ref().map_or(0, |s| s.field.len());
            ctx.runtime
                .set_title(format!("lithos asteroids | {count} instances | {fps:.0} fps"));
        }

        control
    }

    fn on_exit(&mut self) {
        log::info!(
            "exiting after {} frames ({:.1}s)",
            self.fps.total_frames,
            self.fps.elapsed
        );
    }
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = DemoConfig::from_env()?;
    log::info!(
        "asteroid field: {} instances, seed {:?}",
        config.field.placement.count,
        config.field.seed
    );

    Runtime::run(
        RuntimeConfig {
            title: "lithos asteroids".to_string(),
            initial_size: LogicalSize::new(1024.0, 768.0),
            ..Default::default()
        },
        GpuInit::default(),
        AsteroidDemo::new(config),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fps_reported_once_per_second() {
        let mut fps = FpsCounter::default();
        let reports: Vec<f32> = (0..10).filter_map(|_| fps.tick(0.25)).collect();

        assert_eq!(reports, vec![4.0, 4.0]);
        assert_eq!(fps.total_frames, 10);
        assert_eq!(fps.elapsed, 2.5);
    }
}
