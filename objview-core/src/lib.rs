/// objview core library - mesh ingestion, transformation algebra and camera math
///
/// This library provides the backend-independent half of the renderer: OBJ
/// parsing into a triangle mesh, 4x4 transformations, camera projections, and
/// the traits a graphics backend implements to receive uploads and draws.

pub mod buffer;
pub mod camera;
pub mod error;
pub mod geometry;
pub mod gpu;
pub mod light;
pub mod mesh;
pub mod obj;
pub mod renderer;
pub mod transform;

// Re-export commonly used types
pub use buffer::VertexBuffer;
pub use camera::Camera;
pub use error::{CameraError, Error, GpuError, ObjError, Result};
pub use geometry::{Face, Geometry, Vector2, Vector3, Vertex};
pub use gpu::{GpuContext, Shader, UniformSink};
pub use light::{DirectionalLight, Light};
pub use mesh::Mesh;
pub use renderer::Renderer;
pub use transform::Transformation;
