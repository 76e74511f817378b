//! Procedural texture layers for the rock material.

use lithos_engine::render::shader::TEXTURE_SIZE;
use rand::Rng;

const TEXELS: usize = (TEXTURE_SIZE * TEXTURE_SIZE) as usize;

/// Speckled grey-brown albedo, RGBA8.
pub fn rock_albedo<R: Rng + ?Sized>(rng: &mut R) -> Vec<u8> {
    const BASE: [f32; 3] = [0.46, 0.40, 0.35];

    let mut out = Vec::with_capacity(TEXELS * 4);
    for _ in 0..TEXELS {
        let shade: f32 = rng.random_range(0.6..1.2);
        for c in BASE {
            out.push(((c * shade).clamp(0.0, 1.0) * 255.0) as u8);
        }
        out.push(255);
    }
    out
}

/// Tangent-space detail normals tilted at most `max_tilt` off +Z, RGBA8.
pub fn rock_detail<R: Rng + ?Sized>(rng: &mut R, max_tilt: f32) -> Vec<u8> {
    let max_tilt = max_tilt.clamp(0.0, 0.7);
    let encode = |v: f32| ((v * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0).round() as u8;

    let mut out = Vec::with_capacity(TEXELS * 4);
    for _ in 0..TEXELS {
        let (x, y) = if max_tilt > 0.0 {
            (rng.random_range(-max_tilt..max_tilt), rng.random_range(-max_tilt..max_tilt))
        } else {
            (0.0, 0.0)
        };
        let z = (1.0 - x * x - y * y).max(0.0).sqrt();
        out.extend([encode(x), encode(y), encode(z), 255]);
    }
    out
}
