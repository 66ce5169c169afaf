/// objview web - WebGL2 front-end compiled to WASM
///
/// The page links the shader program and fetches the OBJ text; this crate
/// uploads meshes and draws them every frame through the core renderer.
use std::fmt::Display;

use nalgebra::{Point3, Vector3};
use objview_core::{obj, Camera, DirectionalLight, Mesh, Renderer, Transformation};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, WebGl2RenderingContext, WebGlBuffer, WebGlProgram};

pub mod gl;

pub use gl::{WebGlContext, WebGlShader};

const CAMERA_DISTANCE: f64 = 3.0;

fn to_js(err: impl Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
pub struct WebRenderer {
    renderer: Renderer<WebGlContext>,
    camera: Camera,
    light: DirectionalLight,
    meshes: Vec<Mesh<WebGlBuffer>>,
    aspect: f64,
    rotation: (f64, f64, f64),
}

#[wasm_bindgen]
impl WebRenderer {
    /// Attach to the `<canvas>` with id `canvas_id`.
    #[wasm_bindgen(constructor)]
    pub fn new(canvas_id: &str) -> Result<WebRenderer, JsValue> {
        let document = web_sys::window()
            .and_then(|window| window.document())
            .ok_or_else(|| JsValue::from_str("No document available"))?;
        let canvas = document
            .get_element_by_id(canvas_id)
            .ok_or_else(|| JsValue::from_str(&format!("No element with id `{canvas_id}`")))?
            .dyn_into::<HtmlCanvasElement>()?;
        let gl = canvas
            .get_context("webgl2")?
            .ok_or_else(|| JsValue::from_str("WebGL2 is not supported"))?
            .dyn_into::<WebGl2RenderingContext>()
            .map_err(JsValue::from)?;

        let width = canvas.width().max(1);
        let height = canvas.height().max(1);
        let context = WebGlContext::new(gl);
        context.set_viewport(width as i32, height as i32);

        let mut camera = Camera::new();
        camera
            .look_at(
                Point3::new(0.0, 0.0, CAMERA_DISTANCE),
                Point3::origin(),
                Vector3::y(),
            )
            .map_err(to_js)?;

        let mut renderer = Self {
            renderer: Renderer::new(context).with_clear_color(0, 0, 0),
            camera,
            light: DirectionalLight::default(),
            meshes: Vec::new(),
            aspect: f64::from(width) / f64::from(height),
            rotation: (0.0, 0.0, 0.0),
        };
        renderer.set_perspective(45.0, 0.1, 100.0)?;
        Ok(renderer)
    }

    /// Use an already linked program for every following frame.
    pub fn set_shader(&mut self, program: WebGlProgram) {
        let gl = self.renderer.context().gl().clone();
        self.renderer.set_shader(WebGlShader::new(gl, program));
    }

    pub fn set_clear_color(&mut self, red: u8, green: u8, blue: u8) {
        self.renderer.set_clear_color(red, green, blue);
    }

    pub fn set_perspective(&mut self, fov: f64, near: f64, far: f64) -> Result<(), JsValue> {
        self.camera
            .set_perspective(fov, self.aspect, near, far)
            .map_err(to_js)
    }

    /// Orthographic view `height` units tall, matching the canvas aspect.
    pub fn set_orthographic(&mut self, height: f64, depth: f64) -> Result<(), JsValue> {
        self.camera
            .set_orthographic(height * self.aspect, height, depth)
            .map_err(to_js)
    }

    /// Parse OBJ text and upload it. Returns the number of meshes now loaded.
    pub fn load_obj(&mut self, src: &str) -> Result<usize, JsValue> {
        let geometry = obj::parse(src).map_err(to_js)?;
        let mesh = Mesh::upload(self.renderer.context_mut(), &geometry).map_err(to_js)?;
        debug!(triangles = geometry.triangle_count(), "Uploaded mesh");
        self.meshes.push(mesh);
        Ok(self.meshes.len())
    }

    /// Free every uploaded mesh.
    pub fn clear_meshes(&mut self) {
        let context = self.renderer.context_mut();
        for mesh in self.meshes.drain(..) {
            mesh.release(context);
        }
    }

    /// Update rotation state
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.rotation.0 += dx;
        self.rotation.1 += dy;
        self.rotation.2 += dz;
    }

    /// Render a frame
    pub fn render(&mut self) -> Result<(), JsValue> {
        let (x, y, z) = self.rotation;
        let model = Transformation::identity().rotate_z(z).rotate_y(y).rotate_x(x);
        for mesh in &mut self.meshes {
            mesh.transform = model;
        }
        self.renderer
            .render(&self.camera, &self.light, &self.meshes)
            .map_err(to_js)
    }
}

impl Drop for WebRenderer {
    fn drop(&mut self) {
        self.clear_meshes();
    }
}
