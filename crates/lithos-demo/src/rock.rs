//! Procedural asteroid mesh: a subdivided icosahedron with jittered radii.

use std::collections::HashMap;
use std::f32::consts::PI;

use glam::Vec3;
use lithos_engine::render::mesh::{MeshData, MeshVertex};
use rand::Rng;

#[derive(Debug, Copy, Clone)]
pub struct RockParams {
    /// Midpoint subdivision passes over the base icosahedron.
    pub subdivisions: u32,
    pub radius: f32,
    /// Radial jitter as a fraction of `radius`, in `[0, 1)`.
    pub roughness: f32,
}

impl Default for RockParams {
    fn default() -> Self {
        Self {
            subdivisions: 2,
            radius: 1.0,
            roughness: 0.25,
        }
    }
}

const BASE_FACES: [[u32; 3]; 20] = [
    [0, 11, 5], [0, 5, 1], [0, 1, 7], [0, 7, 10], [0, 10, 11],
    [1, 5, 9], [5, 11, 4], [11, 10, 2], [10, 7, 6], [7, 1, 8],
    [3, 9, 4], [3, 4, 2], [3, 2, 6], [3, 6, 8], [3, 8, 9],
    [4, 9, 5], [2, 4, 11], [6, 2, 10], [8, 6, 7], [9, 8, 1],
];

fn base_vertices() -> Vec<Vec3> {
    let t = (1.0 + 5f32.sqrt()) / 2.0;
    [
        (-1.0, t, 0.0), (1.0, t, 0.0), (-1.0, -t, 0.0), (1.0, -t, 0.0),
        (0.0, -1.0, t), (0.0, 1.0, t), (0.0, -1.0, -t), (0.0, 1.0, -t),
        (t, 0.0, -1.0), (t, 0.0, 1.0), (-t, 0.0, -1.0), (-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect()
}

/// Builds a closed, outward-wound rock mesh.
///
/// Subdivision shares midpoints between neighboring triangles, so jitter is
/// applied per shared vertex and the surface stays watertight.
pub fn generate<R: Rng + ?Sized>(params: &RockParams, rng: &mut R) -> MeshData {
    let mut dirs = base_vertices();
    let mut faces = BASE_FACES.to_vec();

    for _ in 0..params.subdivisions {
        faces = subdivide(&mut dirs, &faces);
    }

    let roughness = params.roughness.clamp(0.0, 0.99);
    let positions: Vec<Vec3> = dirs
        .iter()
        .map(|d| {
            let jitter = if roughness > 0.0 {
                rng.random_range(-roughness..roughness)
            } else {
                0.0
            };
            *d * params.radius * (1.0 + jitter)
        })
        .collect();

    let mut normals = vec![Vec3::ZERO; positions.len()];
    for &[a, b, c] in &faces {
        let (pa, pb, pc) = (positions[a as usize], positions[b as usize], positions[c as usize]);
        // Area-weighted: the cross product's length is twice the triangle area.
        let n = (pb - pa).cross(pc - pa);
        for i in [a, b, c] {
            normals[i as usize] += n;
        }
    }

    let vertices = positions
        .iter()
        .zip(&normals)
        .zip(&dirs)
        .map(|((p, n), d)| MeshVertex {
            position: p.to_array(),
            normal: n.try_normalize().unwrap_or(*d).to_array(),
            uv: spherical_uv(*d),
        })
        .collect();

    MeshData {
        vertices,
        indices: faces.into_iter().flatten().collect(),
    }
}

fn subdivide(dirs: &mut Vec<Vec3>, faces: &[[u32; 3]]) -> Vec<[u32; 3]> {
    let mut midpoints: HashMap<(u32, u32), u32> = HashMap::new();
    let mut midpoint = |a: u32, b: u32, dirs: &mut Vec<Vec3>| -> u32 {
        let key = (a.min(b), a.max(b));
        *midpoints.entry(key).or_insert_with(|| {
            let m = (dirs[a as usize] + dirs[b as usize]).normalize();
            dirs.push(m);
            (dirs.len() - 1) as u32
        })
    };

    let mut out = Vec::with_capacity(faces.len() * 4);
    for &[a, b, c] in faces {
        let ab = midpoint(a, b, dirs);
        let bc = midpoint(b, c, dirs);
        let ca = midpoint(c, a, dirs);
        out.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
    }
    out
}

fn spherical_uv(d: Vec3) -> [f32; 2] {
    [
        0.5 + d.z.atan2(d.x) / (2.0 * PI),
        0.5 - d.y.clamp(-1.0, 1.0).asin() / PI,
    ]
}
