/// GPU vertex buffer ownership.
///
/// A [`VertexBuffer`] owns exactly one backend buffer. It is move-only and can
/// only be released by value, so a buffer can't be freed twice or drawn after
/// release. Dropping it without calling [`VertexBuffer::release`] leaks the
/// GPU memory and logs a warning.
use tracing::{debug, warn};

use crate::error::GpuError;
use crate::gpu::GpuContext;

pub struct VertexBuffer<B> {
    /// `Some` until released.
    handle: Option<B>,
    /// Floats per vertex.
    element_size: usize,
    vertex_count: usize,
}

impl<B> VertexBuffer<B> {
    /// Upload `data` as `element_size`-float vertices.
    ///
    /// # Errors
    ///
    /// Fails when `data` is empty, when `element_size` is zero, when `data` is
    /// not a whole number of vertices, or when the backend can't allocate the
    /// buffer.
    pub fn upload<C>(context: &mut C, data: &[f32], element_size: usize) -> Result<Self, GpuError>
    where
        C: GpuContext<Buffer = B>,
    {
        if element_size == 0 {
            return Err(GpuError::BufferCreation(
                "element size must be greater than 0".to_string(),
            ));
        }
        if data.is_empty() {
            return Err(GpuError::BufferCreation("vertex data is empty".to_string()));
        }
        if data.len() % element_size != 0 {
            return Err(GpuError::BufferCreation(format!(
                "{} floats is not a multiple of element size {}",
                data.len(),
                element_size
            )));
        }

        let handle = context.create_buffer(data)?;
        let vertex_count = data.len() / element_size;
        debug!("Created vertex buffer: {} vertices x {} floats", vertex_count, element_size);

        Ok(Self {
            handle: Some(handle),
            element_size,
            vertex_count,
        })
    }

    pub fn element_size(&self) -> usize {
        self.element_size
    }

    pub fn vertex_count(&self) -> usize {
        self.vertex_count
    }

    /// Bind this buffer to a shader attribute location.
    pub fn bind<C>(&self, context: &mut C, location: u32)
    where
        C: GpuContext<Buffer = B>,
    {
        if let Some(handle) = &self.handle {
            context.bind_attribute(handle, location, self.element_size);
        }
    }

    /// Free the GPU buffer.
    pub fn release<C>(mut self, context: &mut C)
    where
        C: GpuContext<Buffer = B>,
    {
        if let Some(handle) = self.handle.take() {
            context.delete_buffer(handle);
            debug!("Released vertex buffer: {} vertices", self.vertex_count);
        }
    }
}

impl<B> Drop for VertexBuffer<B> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            warn!(
                "Vertex buffer with {} vertices dropped without release; GPU memory leaked",
                self.vertex_count
            );
        }
    }
}
