/// Software graphics backend rasterizing into a character grid
use std::collections::HashMap;
use std::io::Write;

use crossterm::{
    style::{Color, Print, ResetColor, SetForegroundColor},
    QueueableCommand,
};
use nalgebra::{Matrix3, Matrix4, Point3, Vector3, Vector4};
use objview_core::gpu::{
    GpuContext, Shader, UniformSink, MODEL_UNIFORM, NORMAL_ATTRIBUTE, POSITION_ATTRIBUTE, PROJECTION_UNIFORM,
    UV_ATTRIBUTE, VIEW_UNIFORM,
};
use objview_core::light::LIGHT_DIRECTION_UNIFORM;
use objview_core::GpuError;
use tracing::{trace, warn};

/// Character luminosity ramp for depth/shading (darkest to lightest)
const LUMINOSITY_RAMP: &[char] = &[' ', '.', ':', '-', '=', '+', '*', '#', '%', '@'];

/// Minimum clip-space `w` accepted before the perspective divide
const W_EPSILON: f32 = 1e-6;

/// Attribute locations exposed by [`AsciiShader`]
const POSITION_LOCATION: u32 = 0;
const NORMAL_LOCATION: u32 = 1;
const UV_LOCATION: u32 = 2;

/// Handle to a buffer owned by [`AsciiRenderer`]. Not `Clone`.
#[derive(Debug, PartialEq, Eq)]
pub struct BufferId(usize);

/// Fixed-function "shader": transforms by `projection * view * model` and
/// shades each face by its normal against `lightDirection`.
#[derive(Debug, Clone)]
pub struct AsciiShader {
    projection: Matrix4<f32>,
    view: Matrix4<f32>,
    model: Matrix4<f32>,
    light_direction: Vector3<f32>,
}

impl AsciiShader {
    pub fn new() -> Self {
        Self {
            projection: Matrix4::identity(),
            view: Matrix4::identity(),
            model: Matrix4::identity(),
            light_direction: Vector3::new(0.0, 0.0, -1.0),
        }
    }

    fn mvp(&self) -> Matrix4<f32> {
        self.projection * self.view * self.model
    }

    /// Inverse-transpose of the model's upper 3x3, for transforming normals
    fn normal_matrix(&self) -> Matrix3<f32> {
        let linear: Matrix3<f32> = self.model.fixed_view::<3, 3>(0, 0).into_owned();
        linear
            .try_inverse()
            .map(|inverse| inverse.transpose())
            .unwrap_or_else(Matrix3::identity)
    }
}

impl Default for AsciiShader {
    fn default() -> Self {
        Self::new()
    }
}

impl UniformSink for AsciiShader {
    fn uniform_matrix4(&mut self, name: &str, fields: &[f32; 16], transpose: bool) {
        let mut matrix = Matrix4::from_column_slice(fields);
        if transpose {
            matrix.transpose_mut();
        }
        match name {
            PROJECTION_UNIFORM => self.projection = matrix,
            VIEW_UNIFORM => self.view = matrix,
            MODEL_UNIFORM => self.model = matrix,
            _ => trace!("Ignoring matrix uniform `{}`", name),
        }
    }

    fn uniform_vec3(&mut self, name: &str, value: [f32; 3]) {
        match name {
            LIGHT_DIRECTION_UNIFORM => self.light_direction = Vector3::from(value),
            _ => trace!("Ignoring vec3 uniform `{}`", name),
        }
    }
}

impl Shader for AsciiShader {
    fn activate(&mut self) {}

    fn attribute(&self, name: &str) -> Option<u32> {
        match name {
            POSITION_ATTRIBUTE => Some(POSITION_LOCATION),
            NORMAL_ATTRIBUTE => Some(NORMAL_LOCATION),
            UV_ATTRIBUTE => Some(UV_LOCATION),
            _ => None,
        }
    }
}

/// A screen-space vertex: pixel x, pixel y, NDC depth
type ScreenVertex = (f32, f32, f32);

/// ASCII renderer that converts 3D meshes to terminal characters
pub struct AsciiRenderer {
    width: usize,
    height: usize,
    depth_buffer: Vec<f32>,
    char_buffer: Vec<char>,
    background: char,
    buffers: Vec<Option<Vec<f32>>>,
    /// Attribute location -> (buffer index, floats per vertex)
    bindings: HashMap<u32, (usize, usize)>,
}

impl AsciiRenderer {
    pub fn new(width: usize, height: usize) -> Self {
        let size = width * height;
        Self {
            width,
            height,
            depth_buffer: vec![f32::INFINITY; size],
            char_buffer: vec![' '; size],
            background: ' ',
            buffers: Vec::new(),
            bindings: HashMap::new(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        let size = width * height;
        self.width = width;
        self.height = height;
        self.depth_buffer = vec![f32::INFINITY; size];
        self.char_buffer = vec![self.background; size];
    }

    /// Number of buffers currently allocated
    pub fn live_buffers(&self) -> usize {
        self.buffers.iter().filter(|buffer| buffer.is_some()).count()
    }

    pub fn char_at(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.char_buffer[y * self.width + x])
    }

    /// The frame as text, one line per row
    pub fn frame_to_string(&self) -> String {
        let mut frame = String::with_capacity((self.width + 1) * self.height);
        for row in self.char_buffer.chunks(self.width.max(1)) {
            frame.extend(row);
            frame.push('\n');
        }
        frame
    }

    fn attribute(&self, location: u32) -> Option<(&[f32], usize)> {
        let &(index, size) = self.bindings.get(&location)?;
        let data = self.buffers.get(index)?.as_deref()?;
        Some((data, size))
    }

    fn read3(data: &[f32], size: usize, vertex: usize) -> Option<Vector3<f32>> {
        let start = vertex * size;
        let v = data.get(start..start + size.min(3))?;
        Some(Vector3::new(
            v.first().copied().unwrap_or(0.0),
            v.get(1).copied().unwrap_or(0.0),
            v.get(2).copied().unwrap_or(0.0),
        ))
    }

    fn project(&self, mvp: &Matrix4<f32>, position: &Vector3<f32>) -> Option<ScreenVertex> {
        let clip = mvp * Vector4::new(position.x, position.y, position.z, 1.0);

        // Behind or on the eye plane: the divide is meaningless
        if clip.w < W_EPSILON {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if !(-1.0..=1.0).contains(&ndc.z) {
            return None;
        }

        let screen_x = (ndc.x + 1.0) * 0.5 * self.width as f32;
        let screen_y = (1.0 - ndc.y) * 0.5 * self.height as f32;
        Some((screen_x, screen_y, ndc.z))
    }

    fn shade(shader: &AsciiShader, normal: Option<Vector3<f32>>) -> char {
        let brightness = normal
            .and_then(|n| n.try_normalize(f32::EPSILON))
            .map(|n| n.dot(&-shader.light_direction).max(0.0))
            .unwrap_or(0.0);

        let char_index = (brightness * (LUMINOSITY_RAMP.len() - 1) as f32) as usize;
        LUMINOSITY_RAMP[char_index.min(LUMINOSITY_RAMP.len() - 1)]
    }

    fn rasterize_triangle(&mut self, coords: &[ScreenVertex; 3], character: char) {
        let (v0, v1, v2) = (coords[0], coords[1], coords[2]);

        // Bounding box
        let min_x = v0.0.min(v1.0).min(v2.0).floor() as i32;
        let max_x = v0.0.max(v1.0).max(v2.0).ceil() as i32;
        let min_y = v0.1.min(v1.1).min(v2.1).floor() as i32;
        let max_y = v0.1.max(v1.1).max(v2.1).ceil() as i32;

        // Clip to screen bounds
        let min_x = min_x.max(0);
        let max_x = max_x.min(self.width as i32 - 1);
        let min_y = min_y.max(0);
        let max_y = max_y.min(self.height as i32 - 1);

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let px = x as f32 + 0.5;
                let py = y as f32 + 0.5;

                if let Some((w0, w1, w2)) = barycentric((v0.0, v0.1), (v1.0, v1.1), (v2.0, v2.1), (px, py)) {
                    if w0 >= 0.0 && w1 >= 0.0 && w2 >= 0.0 {
                        let depth = w0 * v0.2 + w1 * v1.2 + w2 * v2.2;

                        let idx = y as usize * self.width + x as usize;
                        if depth < self.depth_buffer[idx] {
                            self.depth_buffer[idx] = depth;
                            self.char_buffer[idx] = character;
                        }
                    }
                }
            }
        }
    }

    pub fn draw<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = y * self.width + x;
                let c = self.char_buffer[idx];

                // Color based on character intensity
                let color = match c {
                    ' ' | '.' | ':' => Color::DarkGrey,
                    '-' | '=' => Color::Grey,
                    '+' | '*' => Color::White,
                    '#' | '%' | '@' => Color::Cyan,
                    _ => Color::White,
                };

                writer.queue(SetForegroundColor(color))?;
                writer.queue(Print(c))?;
            }
            if y + 1 < self.height {
                writer.queue(Print("\r\n"))?;
            }
        }
        writer.queue(ResetColor)?;
        Ok(())
    }
}

impl GpuContext for AsciiRenderer {
    type Buffer = BufferId;
    type Program = AsciiShader;

    fn create_buffer(&mut self, data: &[f32]) -> Result<BufferId, GpuError> {
        // Reuse a freed slot when there is one
        let data = Some(data.to_vec());
        match self.buffers.iter().position(Option::is_none) {
            Some(index) => {
                self.buffers[index] = data;
                Ok(BufferId(index))
            }
            None => {
                self.buffers.push(data);
                Ok(BufferId(self.buffers.len() - 1))
            }
        }
    }

    fn delete_buffer(&mut self, buffer: BufferId) {
        if let Some(slot) = self.buffers.get_mut(buffer.0) {
            *slot = None;
        }
        self.bindings.retain(|_, (index, _)| *index != buffer.0);
    }

    fn bind_attribute(&mut self, buffer: &BufferId, location: u32, element_size: usize) {
        self.bindings.insert(location, (buffer.0, element_size));
    }

    fn draw_triangles(&mut self, program: &AsciiShader, vertex_count: usize) {
        let Some((positions, position_size)) = self.attribute(POSITION_LOCATION) else {
            warn!("draw_triangles without a position attribute bound");
            return;
        };
        // Copy out so rasterization can borrow the frame mutably
        let positions = positions.to_vec();
        let normals = self
            .attribute(NORMAL_LOCATION)
            .map(|(data, size)| (data.to_vec(), size));

        let mvp = program.mvp();
        let normal_matrix = program.normal_matrix();
        let model = program.model;

        for triangle in 0..vertex_count / 3 {
            let corners = [triangle * 3, triangle * 3 + 1, triangle * 3 + 2];

            let mut object = [Vector3::zeros(); 3];
            for (slot, &vertex) in object.iter_mut().zip(&corners) {
                match Self::read3(&positions, position_size, vertex) {
                    Some(position) => *slot = position,
                    None => return,
                }
            }

            let mut screen = [(0.0, 0.0, 0.0); 3];
            let mut visible = true;
            for (slot, position) in screen.iter_mut().zip(&object) {
                match self.project(&mvp, position) {
                    Some(projected) => *slot = projected,
                    None => visible = false,
                }
            }
            if !visible {
                continue;
            }

            // Prefer the supplied vertex normals, fall back to the geometric one
            let supplied = normals.as_ref().and_then(|(data, size)| {
                let sum = corners
                    .iter()
                    .filter_map(|&vertex| Self::read3(data, *size, vertex))
                    .fold(Vector3::zeros(), |acc, n| acc + n);
                (sum.norm() > f32::EPSILON).then(|| normal_matrix * sum)
            });
            let normal = supplied.or_else(|| {
                let world = object.map(|p| model.transform_point(&Point3::from(p)));
                let n = (world[1] - world[0]).cross(&(world[2] - world[0]));
                (n.norm() > f32::EPSILON).then_some(n)
            });

            let character = Self::shade(program, normal);
            self.rasterize_triangle(&screen, character);
        }
    }

    fn clear(&mut self) {
        self.depth_buffer.fill(f32::INFINITY);
        self.char_buffer.fill(self.background);
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        let luminance = 0.2126 * rgba[0] + 0.7152 * rgba[1] + 0.0722 * rgba[2];
        let index = (luminance.clamp(0.0, 1.0) * (LUMINOSITY_RAMP.len() - 1) as f32).round() as usize;
        self.background = LUMINOSITY_RAMP[index];
    }
}

/// Calculate barycentric coordinates for a point in a triangle
fn barycentric(v0: (f32, f32), v1: (f32, f32), v2: (f32, f32), p: (f32, f32)) -> Option<(f32, f32, f32)> {
    let denom = (v1.1 - v2.1) * (v0.0 - v2.0) + (v2.0 - v1.0) * (v0.1 - v2.1);

    if denom.abs() < 1e-6 {
        return None;
    }

    let w0 = ((v1.1 - v2.1) * (p.0 - v2.0) + (v2.0 - v1.0) * (p.1 - v2.1)) / denom;
    let w1 = ((v2.1 - v0.1) * (p.0 - v2.0) + (v0.0 - v2.0) * (p.1 - v2.1)) / denom;
    let w2 = 1.0 - w0 - w1;

    Some((w0, w1, w2))
}
