//! Orbit camera driven by the engine's input state.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat4, Vec3};
use lithos_engine::input::{InputFrame, InputState, Key, MouseButton};

/// Camera circling `target` at `distance`, angles in radians.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct OrbitCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub distance: f32,

    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
}

const MIN_DISTANCE: f32 = 1.0;
const MAX_DISTANCE: f32 = 90.0;
const PITCH_LIMIT: f32 = FRAC_PI_2 - 0.01;

/// Radians per logical pixel of right-button drag.
const DRAG_SENSITIVITY: f32 = 0.005;
/// Radians per second for held rotation keys.
const KEY_TURN_RATE: f32 = 1.2;
/// Fraction of the current distance covered per second when dollying.
const DOLLY_RATE: f32 = 0.8;
/// Fraction of the current distance per wheel line.
const WHEEL_STEP: f32 = 0.1;

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            distance: 30.0,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 100.0,
        }
    }
}

impl OrbitCamera {
    pub fn eye(&self) -> Vec3 {
        let (sy, cy) = self.yaw.sin_cos();
        let (sp, cp) = self.pitch.sin_cos();
        self.target + Vec3::new(sy * cp, sp, cy * cp) * self.distance
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye(), self.target, Vec3::Y)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far)
    }

    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        self.yaw = (self.yaw + d_yaw).rem_euclid(std::f32::consts::TAU);
        self.pitch = (self.pitch + d_pitch).clamp(-PITCH_LIMIT, PITCH_LIMIT);
    }

    /// Scales the distance by `factor`, clamped to the orbit range.
    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Applies one frame of input: right-drag and A/D/arrows orbit,
    /// W/S and the wheel dolly.
    pub fn update(&mut self, input: &InputState, frame: &InputFrame, dt: f32) {
        if input.button_down(MouseButton::Right) {
            let (dx, dy) = frame.pointer_delta;
            self.rotate(-dx * DRAG_SENSITIVITY, dy * DRAG_SENSITIVITY);
        }

        let axis = |neg: &[Key], pos: &[Key]| -> f32 {
            let held = |keys: &[Key]| keys.iter().any(|k| input.key_down(*k));
            held(pos) as i32 as f32 - held(neg) as i32 as f32
        };

        let turn = axis(&[Key::D, Key::ArrowRight], &[Key::A, Key::ArrowLeft]);
        let tilt = axis(&[Key::ArrowDown, Key::Q], &[Key::ArrowUp, Key::E]);
        self.rotate(turn * KEY_TURN_RATE * dt, tilt * KEY_TURN_RATE * dt);

        let dolly = axis(&[Key::W], &[Key::S]);
        if dolly != 0.0 {
            self.zoom(1.0 + dolly * DOLLY_RATE * dt);
        }

        if frame.wheel_lines != 0.0 {
            self.zoom((1.0 - WHEEL_STEP).powf(frame.wheel_lines));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lithos_engine::input::{InputEvent, KeyState, Modifiers, MouseWheelDelta};

    fn press(state: &mut InputState, frame: &mut InputFrame, key: Key) {
        state.apply_event(
            frame,
            InputEvent::Key { key, state: KeyState::Pressed, modifiers: Modifiers::default(), repeat: false },
        );
    }

    #[test]
    fn default_eye_sits_on_positive_z() {
        let cam = OrbitCamera::default();
        assert!(cam.eye().abs_diff_eq(Vec3::new(0.0, 0.0, 30.0), 1e-5));
    }

    #[test]
    fn eye_keeps_distance_from_target() {
        let mut cam = OrbitCamera { target: Vec3::new(1.0, 2.0, 3.0), ..Default::default() };
        cam.rotate(1.3, -0.4);
        assert!((cam.eye().distance(cam.target) - cam.distance).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped_short_of_the_pole() {
        let mut cam = OrbitCamera::default();
        cam.rotate(0.0, 10.0);
        assert_eq!(cam.pitch, PITCH_LIMIT);
        cam.rotate(0.0, -20.0);
        assert_eq!(cam.pitch, -PITCH_LIMIT);
    }

    #[test]
    fn zoom_respects_range() {
        let mut cam = OrbitCamera::default();
        cam.zoom(100.0);
        assert_eq!(cam.distance, MAX_DISTANCE);
        cam.zoom(0.0);
        assert_eq!(cam.distance, MIN_DISTANCE);
    }

    #[test]
    fn held_w_moves_closer() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        press(&mut state, &mut frame, Key::W);

        let mut cam = OrbitCamera::default();
        cam.update(&state, &frame, 0.5);
        assert!(cam.distance < 30.0);
    }

    #[test]
    fn wheel_up_zooms_in() {
        let mut state = InputState::default();
        let mut frame = InputFrame::default();
        state.apply_event(
            &mut frame,
            InputEvent::MouseWheel {
                delta: MouseWheelDelta::Line { x: 0.0, y: 2.0 },
                modifiers: Modifiers::default(),
            },
        );

        let mut cam = OrbitCamera::default();
        cam.update(&state, &frame, 0.016);
        assert!((cam.distance - 30.0 * 0.81).abs() < 1e-3);
    }

    #[test]
    fn drag_without_right_button_is_ignored() {
        let state = InputState::default();
        let frame = InputFrame { pointer_delta: (50.0, 20.0), ..Default::default() };

        let mut cam = OrbitCamera::default();
        cam.update(&state, &frame, 0.016);
        assert_eq!(cam, OrbitCamera::default());
    }
}
