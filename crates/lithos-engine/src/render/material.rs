use glam::Vec3;

use super::shader::ShaderUniforms;

/// Uniform names every instanced material writes.
pub mod uniform {
    pub const TEX_DIFFUSE: &str = "TexDiffuse";
    pub const TEX_NORMAL: &str = "TexNormal";
    pub const SPECULAR_POW: &str = "specular_pow";
    pub const SPECULAR_VEC: &str = "specular_vec";
}

/// Surface parameters shared by every instance of a field.
///
/// Texture units name slots of the shader's texture array; the textures
/// themselves belong to the shader collaborator.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Material {
    pub diffuse_unit: i32,
    pub normal_unit: i32,
    pub specular_pow: f32,
    pub specular_vec: Vec3,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse_unit: 0,
            normal_unit: 1,
            specular_pow: 32.0,
            specular_vec: Vec3::splat(0.5),
        }
    }
}

impl Material {
    /// Writes this material into `shader` under the fixed uniform names.
    pub fn apply<S: ShaderUniforms + ?Sized>(&self, shader: &mut S) {
        shader.set_int(uniform::TEX_DIFFUSE, self.diffuse_unit);
        shader.set_int(uniform::TEX_NORMAL, self.normal_unit);
        shader.set_float(uniform::SPECULAR_POW, self.specular_pow);
        shader.set_vec3(uniform::SPECULAR_VEC, self.specular_vec);
    }
}
