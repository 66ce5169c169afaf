/// WebGL2 implementation of the core graphics contracts.
use std::collections::HashMap;

use objview_core::{GpuContext, GpuError, Shader, UniformSink};
use tracing::warn;
use web_sys::{WebGl2RenderingContext as Gl, WebGlBuffer, WebGlProgram, WebGlUniformLocation};

/// A WebGL2 rendering context with depth testing enabled.
pub struct WebGlContext {
    gl: Gl,
}

impl WebGlContext {
    pub fn new(gl: Gl) -> Self {
        gl.enable(Gl::DEPTH_TEST);
        Self { gl }
    }

    pub fn gl(&self) -> &Gl {
        &self.gl
    }

    pub fn set_viewport(&self, width: i32, height: i32) {
        self.gl.viewport(0, 0, width, height);
    }
}

impl GpuContext for WebGlContext {
    type Buffer = WebGlBuffer;
    type Program = WebGlShader;

    fn create_buffer(&mut self, data: &[f32]) -> Result<WebGlBuffer, GpuError> {
        let buffer = self
            .gl
            .create_buffer()
            .ok_or_else(|| GpuError::BufferCreation("createBuffer returned null".to_string()))?;

        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(&buffer));
        self.gl.buffer_data_with_u8_array(
            Gl::ARRAY_BUFFER,
            bytemuck::cast_slice(data),
            Gl::STATIC_DRAW,
        );
        Ok(buffer)
    }

    fn delete_buffer(&mut self, buffer: WebGlBuffer) {
        self.gl.delete_buffer(Some(&buffer));
    }

    fn bind_attribute(&mut self, buffer: &WebGlBuffer, location: u32, element_size: usize) {
        self.gl.bind_buffer(Gl::ARRAY_BUFFER, Some(buffer));
        self.gl.enable_vertex_attrib_array(location);
        self.gl
            .vertex_attrib_pointer_with_i32(location, element_size as i32, Gl::FLOAT, false, 0, 0);
    }

    fn draw_triangles(&mut self, _program: &WebGlShader, vertex_count: usize) {
        self.gl.draw_arrays(Gl::TRIANGLES, 0, vertex_count as i32);
    }

    fn clear(&mut self) {
        self.gl.clear(Gl::COLOR_BUFFER_BIT | Gl::DEPTH_BUFFER_BIT);
    }

    fn set_clear_color(&mut self, [red, green, blue, alpha]: [f32; 4]) {
        self.gl.clear_color(red, green, blue, alpha);
    }
}

/// A linked program plus a cache of its uniform locations.
///
/// Compiling and linking happen on the page; this only drives an existing
/// program.
pub struct WebGlShader {
    gl: Gl,
    program: WebGlProgram,
    uniforms: HashMap<String, Option<WebGlUniformLocation>>,
}

impl WebGlShader {
    pub fn new(gl: Gl, program: WebGlProgram) -> Self {
        Self {
            gl,
            program,
            uniforms: HashMap::new(),
        }
    }

    fn location(&mut self, name: &str) -> Option<&WebGlUniformLocation> {
        if !self.uniforms.contains_key(name) {
            let location = self.gl.get_uniform_location(&self.program, name);
            if location.is_none() {
                warn!(uniform = name, "Uniform not found in program");
            }
            self.uniforms.insert(name.to_string(), location);
        }
        self.uniforms.get(name).and_then(Option::as_ref)
    }
}

impl UniformSink for WebGlShader {
    fn uniform_matrix4(&mut self, name: &str, fields: &[f32; 16], transpose: bool) {
        let gl = self.gl.clone();
        gl.uniform_matrix4fv_with_f32_array(self.location(name), transpose, fields);
    }

    fn uniform_vec3(&mut self, name: &str, value: [f32; 3]) {
        let gl = self.gl.clone();
        gl.uniform3fv_with_f32_array(self.location(name), &value);
    }
}

impl Shader for WebGlShader {
    fn activate(&mut self) {
        self.gl.use_program(Some(&self.program));
    }

    fn attribute(&self, name: &str) -> Option<u32> {
        attribute_location(self.gl.get_attrib_location(&self.program, name))
    }
}

/// `getAttribLocation` reports a missing attribute as -1.
fn attribute_location(raw: i32) -> Option<u32> {
    u32::try_from(raw).ok()
}
