/// Scene lights. A light only passes uniforms to the shader; all shading math
/// lives in the shader itself.
use crate::geometry::Vector3;
use crate::gpu::UniformSink;

pub const LIGHT_DIRECTION_UNIFORM: &str = "lightDirection";
pub const LIGHT_COLOR_UNIFORM: &str = "lightColor";

pub trait Light {
    fn apply(&self, uniforms: &mut dyn UniformSink);
}

/// Infinitely distant light shining along `direction`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vector3,
    pub color: Vector3,
}

impl DirectionalLight {
    pub fn new(direction: Vector3, color: Vector3) -> Self {
        Self { direction, color }
    }

    /// White light shining along `direction`
    pub fn white(direction: Vector3) -> Self {
        Self::new(direction, Vector3::new(1.0, 1.0, 1.0))
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::white(Vector3::new(0.0, 0.0, -1.0))
    }
}

impl Light for DirectionalLight {
    fn apply(&self, uniforms: &mut dyn UniformSink) {
        let direction = self
            .direction
            .try_normalize(f64::EPSILON)
            .unwrap_or_else(Vector3::zeros);
        uniforms.uniform_vec3(LIGHT_DIRECTION_UNIFORM, to_f32(&direction));
        uniforms.uniform_vec3(LIGHT_COLOR_UNIFORM, to_f32(&self.color));
    }
}

fn to_f32(v: &Vector3) -> [f32; 3] {
    [v.x as f32, v.y as f32, v.z as f32]
}
