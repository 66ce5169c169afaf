/// Contracts for the graphics backend.
///
/// The core never talks to a graphics API directly. A backend (WebGL, a
/// software rasterizer, a test recorder) implements these traits and the
/// camera, meshes and renderer drive it.
use crate::error::GpuError;

/// Uniform name the camera writes its projection matrix to.
pub const PROJECTION_UNIFORM: &str = "projection";
/// Uniform name the camera writes its view matrix to.
pub const VIEW_UNIFORM: &str = "view";
/// Uniform name a mesh writes its object-to-world transform to.
pub const MODEL_UNIFORM: &str = "model";

/// Vertex attribute names a mesh binds its buffers to.
pub const POSITION_ATTRIBUTE: &str = "position";
pub const NORMAL_ATTRIBUTE: &str = "normal";
pub const UV_ATTRIBUTE: &str = "uv";

/// Named uniform writes on a linked shader program.
pub trait UniformSink {
    /// Write a column-major 4x4 matrix. When `transpose` is set the backend
    /// transposes before upload.
    fn uniform_matrix4(&mut self, name: &str, fields: &[f32; 16], transpose: bool);

    fn uniform_vec3(&mut self, name: &str, value: [f32; 3]);
}

/// A compiled and linked shader program.
pub trait Shader: UniformSink {
    /// Make this program current for subsequent draws.
    fn activate(&mut self);

    /// Location of a vertex attribute, or `None` if the program doesn't use it.
    fn attribute(&self, name: &str) -> Option<u32>;
}

/// Buffer and draw operations of a graphics context.
pub trait GpuContext {
    /// Handle to one GPU buffer. Ownership is tracked by
    /// [`VertexBuffer`](crate::buffer::VertexBuffer).
    type Buffer;
    type Program: Shader;

    /// Upload `data` into a new static buffer.
    fn create_buffer(&mut self, data: &[f32]) -> Result<Self::Buffer, GpuError>;

    fn delete_buffer(&mut self, buffer: Self::Buffer);

    /// Feed attribute `location` from `buffer`, `element_size` floats per vertex.
    fn bind_attribute(&mut self, buffer: &Self::Buffer, location: u32, element_size: usize);

    /// Draw `vertex_count` vertices from the bound attributes as a triangle list.
    fn draw_triangles(&mut self, program: &Self::Program, vertex_count: usize);

    /// Clear color and depth.
    fn clear(&mut self);

    /// RGBA, each component in `0.0..=1.0`.
    fn set_clear_color(&mut self, rgba: [f32; 4]);
}
