/// Drawable meshes: a [`Geometry`] uploaded to GPU buffers.
use tracing::trace;

use crate::buffer::VertexBuffer;
use crate::error::GpuError;
use crate::geometry::Geometry;
use crate::gpu::{GpuContext, Shader, MODEL_UNIFORM, NORMAL_ATTRIBUTE, POSITION_ATTRIBUTE, UV_ATTRIBUTE};
use crate::transform::Transformation;

/// Position, normal and uv buffers for one geometry, plus its object-to-world
/// transform.
pub struct Mesh<B> {
    positions: VertexBuffer<B>,
    normals: VertexBuffer<B>,
    uvs: VertexBuffer<B>,
    vertex_count: usize,
    pub transform: Transformation,
}

impl<B> Mesh<B> {
    /// Upload the flattened attribute arrays of `geometry`.
    ///
    /// If one of the uploads fails, buffers created so far are released
    /// before the error is returned.
    pub fn upload<C>(context: &mut C, geometry: &Geometry) -> Result<Self, GpuError>
    where
        C: GpuContext<Buffer = B>,
    {
        let positions = VertexBuffer::upload(context, &geometry.positions(), 3)?;
        let normals = match VertexBuffer::upload(context, &geometry.normals(), 3) {
            Ok(normals) => normals,
            Err(e) => {
                positions.release(context);
                return Err(e);
            }
        };
        let uvs = match VertexBuffer::upload(context, &geometry.uvs(), 2) {
            Ok(uvs) => uvs,
            Err(e) => {
                positions.release(context);
                normals.release(context);
                return Err(e);
            }
        };

        Ok(Self {
            positions,
            normals,
            uvs,
            vertex_count: geometry.vertex_count(),
            transform: Transformation::identity(),
        })
    }

    pub fn with_transform(mut self, transform: Transformation) -> Self {
        self.transform = transform;
        self
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Upload the model matrix, bind every attribute the shader uses, and draw.
    pub fn draw<C>(&self, context: &mut C, shader: &mut C::Program)
    where
        C: GpuContext<Buffer = B>,
    {
        self.transform.send_to_gpu(shader, MODEL_UNIFORM, false);

        let attributes = [
            (POSITION_ATTRIBUTE, &self.positions),
            (NORMAL_ATTRIBUTE, &self.normals),
            (UV_ATTRIBUTE, &self.uvs),
        ];
        for (name, buffer) in attributes {
            match shader.attribute(name) {
                Some(location) => buffer.bind(context, location),
                None => trace!("Shader has no `{}` attribute", name),
            }
        }

        context.draw_triangles(shader, self.vertex_count);
    }

    /// Free all three GPU buffers.
    pub fn release<C>(self, context: &mut C)
    where
        C: GpuContext<Buffer = B>,
    {
        self.positions.release(context);
        self.normals.release(context);
        self.uvs.release(context);
    }
}
