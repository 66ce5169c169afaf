/// Per-frame orchestration: clear, bind shader, push uniforms, draw meshes.
use tracing::trace;

use crate::camera::Camera;
use crate::error::Result;
use crate::gpu::{GpuContext, Shader};
use crate::light::Light;
use crate::mesh::Mesh;

/// Renders meshes through a [`GpuContext`] with one current shader.
pub struct Renderer<C: GpuContext> {
    context: C,
    shader: Option<C::Program>,
}

impl<C: GpuContext> Renderer<C> {
    pub fn new(context: C) -> Self {
        Self {
            context,
            shader: None,
        }
    }

    pub fn with_clear_color(mut self, red: u8, green: u8, blue: u8) -> Self {
        self.set_clear_color(red, green, blue);
        self
    }

    /// Set the clear color from 8-bit components.
    pub fn set_clear_color(&mut self, red: u8, green: u8, blue: u8) {
        let to_unit = |c: u8| f32::from(c) / 255.0;
        self.context
            .set_clear_color([to_unit(red), to_unit(green), to_unit(blue), 1.0]);
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    /// Replace the current shader, returning the previous one.
    pub fn set_shader(&mut self, shader: C::Program) -> Option<C::Program> {
        self.shader.replace(shader)
    }

    pub fn clear_shader(&mut self) -> Option<C::Program> {
        self.shader.take()
    }

    pub fn shader(&self) -> Option<&C::Program> {
        self.shader.as_ref()
    }

    /// Render one frame.
    ///
    /// The frame is always cleared. Without a shader nothing else happens.
    /// Meshes are drawn in the given order; there is no sorting or culling.
    ///
    /// # Errors
    ///
    /// Fails if the camera's view matrix can't be derived. Meshes are not
    /// drawn in that case.
    pub fn render<L>(&mut self, camera: &Camera, light: &L, meshes: &[Mesh<C::Buffer>]) -> Result<()>
    where
        L: Light + ?Sized,
    {
        self.context.clear();

        let Some(shader) = self.shader.as_mut() else {
            trace!("No shader bound, skipping draw");
            return Ok(());
        };

        shader.activate();
        light.apply(shader);
        camera.apply(shader)?;

        for mesh in meshes {
            mesh.draw(&mut self.context, shader);
        }
        Ok(())
    }
}
