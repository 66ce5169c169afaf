/// Terminal front-end: renders OBJ meshes with a software rasterizer
use std::io::{stdout, Write};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal,
};
use nalgebra::{Point3, Vector3};
use objview_core::{obj, Camera, DirectionalLight, Geometry, Mesh, Renderer, Transformation};
use tracing::{info, warn};

pub mod config;
pub mod logging;
pub mod renderer;

pub use config::{Args, ProjectionMode};
pub use renderer::{AsciiRenderer, AsciiShader, BufferId};

/// Mesh shown when no OBJ file is given
pub const CUBE_OBJ: &str = include_str!("../assets/cube.obj");

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f64 = 0.5;

/// Height of the orthographic view volume, in fitted model units
const ORTHO_HEIGHT: f64 = 2.5;

/// Rotation state around three axes (in radians)
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RotationState {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl RotationState {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Rotate by delta amounts (in radians)
    pub fn rotate(&mut self, dx: f64, dy: f64, dz: f64) {
        self.x += dx;
        self.y += dy;
        self.z += dz;
    }

    /// Apply rotations in order: X, then Y, then Z
    pub fn to_transformation(&self) -> Transformation {
        Transformation::identity()
            .rotate_z(self.z)
            .rotate_y(self.y)
            .rotate_x(self.x)
    }
}

/// Scale and centre a mesh so its bounding box fits in `[-1, 1]^3`
pub fn fit_transform(geometry: &Geometry) -> Transformation {
    let Some((min, max)) = geometry.bounds() else {
        return Transformation::identity();
    };
    let centre = nalgebra::center(&min, &max);
    let extent = (max - min).amax() / 2.0;
    let scale = if extent > f64::EPSILON { 1.0 / extent } else { 1.0 };

    Transformation::identity()
        .scale(scale, scale, scale)
        .translate(-centre.x, -centre.y, -centre.z)
}

/// Set the projection from `args` for a `width x height` character grid and
/// place the camera on the +Z axis looking at the origin
fn configure_camera(camera: &mut Camera, args: &Args, width: usize, height: usize) -> Result<()> {
    let aspect = width.max(1) as f64 * CELL_ASPECT / height.max(1) as f64;

    match args.projection {
        ProjectionMode::Perspective => camera
            .set_perspective(args.fov, aspect, args.near, args.far)
            .context("Invalid perspective projection")?,
        ProjectionMode::Orthographic => camera
            .set_orthographic(ORTHO_HEIGHT * aspect, ORTHO_HEIGHT, 2.0 * args.far)
            .context("Invalid orthographic projection")?,
    }

    camera
        .look_at(Point3::new(0.0, 0.0, args.distance), Point3::origin(), Vector3::y())
        .context("Invalid camera placement")?;
    Ok(())
}

/// One uploaded mesh with its camera and light, rendered into an [`AsciiRenderer`]
pub struct Viewer {
    renderer: Renderer<AsciiRenderer>,
    camera: Camera,
    light: DirectionalLight,
    meshes: Vec<Mesh<BufferId>>,
    fit: Transformation,
    pub rotation: RotationState,
    args: Args,
}

impl Viewer {
    pub fn new(geometry: &Geometry, args: Args, width: usize, height: usize) -> Result<Self> {
        let mut camera = Camera::new();
        configure_camera(&mut camera, &args, width, height)?;

        let mut renderer = Renderer::new(AsciiRenderer::new(width, height));
        renderer.set_shader(AsciiShader::new());

        let mesh = Mesh::upload(renderer.context_mut(), geometry).context("Failed to upload mesh")?;
        info!(
            "Uploaded mesh: {} triangles, {} vertices",
            geometry.triangle_count(),
            mesh.vertex_count()
        );

        Ok(Self {
            renderer,
            camera,
            light: DirectionalLight::white(Vector3::new(-0.4, -0.5, -1.0)),
            meshes: vec![mesh],
            fit: fit_transform(geometry),
            rotation: RotationState::new(0.5, 0.6, 0.0),
            args,
        })
    }

    pub fn resize(&mut self, width: usize, height: usize) -> Result<()> {
        configure_camera(&mut self.camera, &self.args, width, height)?;
        self.renderer.context_mut().resize(width, height);
        Ok(())
    }

    pub fn render(&mut self) -> Result<()> {
        let model = self.rotation.to_transformation().mult(&self.fit);
        for mesh in &mut self.meshes {
            mesh.transform = model;
        }
        self.renderer.render(&self.camera, &self.light, &self.meshes)?;
        Ok(())
    }

    pub fn frame(&self) -> &AsciiRenderer {
        self.renderer.context()
    }

    /// Free the GPU buffers of every mesh.
    pub fn release(mut self) {
        let context = self.renderer.context_mut();
        for mesh in self.meshes.drain(..) {
            mesh.release(context);
        }
    }
}

/// Parse `src` and render a single frame as text
pub fn render_frame(src: &str, args: &Args) -> Result<String> {
    let geometry = obj::parse(src).context("Failed to parse OBJ")?;
    let (width, height) = args.size;
    let mut viewer = Viewer::new(&geometry, args.clone(), width as usize, height as usize)?;

    let frame = viewer.render().map(|()| viewer.frame().frame_to_string());
    viewer.release();
    frame
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    viewer: Viewer,
    fps_target: u32,
    running: bool,
    last_frame: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    pub fn new(geometry: &Geometry, args: Args) -> Result<Self> {
        let (width, height) = terminal::size().context("Failed to query terminal size")?;
        let fps_target = args.fps.max(1);

        Ok(Self {
            viewer: Viewer::new(geometry, args, width as usize, height as usize)?,
            fps_target,
            running: true,
            last_frame: Instant::now(),
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn run(mut self) -> Result<()> {
        let result = ScreenGuard::enter().and_then(|_screen| self.main_loop());
        self.viewer.release();
        result
    }

    fn main_loop(&mut self) -> Result<()> {
        let target_frame_time = Duration::from_millis(1000 / u64::from(self.fps_target));

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            if event::poll(Duration::from_millis(0))? {
                self.handle_input()?;
            }

            // Update
            self.update();

            // Render
            self.render()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < target_frame_time {
                std::thread::sleep(target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_frame).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_frame).as_secs_f32();
                self.frame_count = 0;
                self.last_frame = now;
            }
        }

        Ok(())
    }

    fn handle_input(&mut self) -> Result<()> {
        match event::read()? {
            Event::Key(KeyEvent { code, .. }) => {
                let rotation = &mut self.viewer.rotation;
                match code {
                    KeyCode::Char('q') | KeyCode::Esc => self.running = false,
                    KeyCode::Char('w') | KeyCode::Up => rotation.rotate(0.1, 0.0, 0.0),
                    KeyCode::Char('s') | KeyCode::Down => rotation.rotate(-0.1, 0.0, 0.0),
                    KeyCode::Char('a') | KeyCode::Left => rotation.rotate(0.0, -0.1, 0.0),
                    KeyCode::Char('d') | KeyCode::Right => rotation.rotate(0.0, 0.1, 0.0),
                    KeyCode::Char('e') => rotation.rotate(0.0, 0.0, 0.1),
                    KeyCode::Char('r') => rotation.rotate(0.0, 0.0, -0.1),
                    _ => {}
                }
            }
            Event::Resize(width, height) => {
                self.viewer.resize(width as usize, height as usize)?;
            }
            _ => {}
        }
        Ok(())
    }

    fn update(&mut self) {
        // Continuous slow rotation for demo effect
        self.viewer.rotation.rotate(0.01, 0.015, 0.0);
    }

    fn render(&mut self) -> Result<()> {
        self.viewer.render()?;

        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;
        self.viewer.frame().draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "objview | FPS: {:.1} | Controls: WASD/Arrows=Rotate E/R=Roll Q=Quit",
                self.fps
            )),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// Raw mode plus the alternate screen, restored on drop
struct ScreenGuard;

impl ScreenGuard {
    fn enter() -> Result<Self> {
        terminal::enable_raw_mode().context("Failed to enable raw mode")?;
        // Raw mode is on from here, so any later failure must still undo it
        let guard = Self;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        if let Err(e) = execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show) {
            warn!("Failed to leave alternate screen: {}", e);
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("Failed to disable raw mode: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use nalgebra::Vector4;

    fn args(extra: &[&str]) -> Args {
        let mut argv = vec!["objview-terminal"];
        argv.extend_from_slice(extra);
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_rotation_state() {
        let mut state = RotationState::default();
        assert_eq!(state, RotationState::new(0.0, 0.0, 0.0));

        state.rotate(0.1, 0.2, 0.3);
        assert!((state.x - 0.1).abs() < 1e-12);
        assert!((state.y - 0.2).abs() < 1e-12);
        assert!((state.z - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_identity_rotation() {
        let matrix = RotationState::default().to_transformation();
        assert!((matrix.matrix() - Transformation::identity().matrix()).norm() < 1e-12);
    }

    #[test]
    fn test_fit_transform() {
        let geometry = obj::parse("v 2 2 2\nv 6 2 2\nv 2 4 3\nf 1 2 3\n").unwrap();
        let fit = fit_transform(&geometry);

        let low = fit.apply(Vector4::new(2.0, 2.0, 2.0, 1.0));
        let high = fit.apply(Vector4::new(6.0, 4.0, 3.0, 1.0));
        assert!((low - Vector4::new(-1.0, -0.5, -0.25, 1.0)).norm() < 1e-12);
        assert!((high - Vector4::new(1.0, 0.5, 0.25, 1.0)).norm() < 1e-12);
    }

    #[test]
    fn test_render_cube_frame() {
        for projection in ["perspective", "orthographic"] {
            let argv = ["--projection", projection, "--size", "40x20", "--distance", "6"];
            let frame = render_frame(CUBE_OBJ, &args(&argv)).unwrap();
            let rows: Vec<&str> = frame.lines().collect();
            assert_eq!(rows.len(), 20);
            assert!(rows.iter().all(|row| row.chars().count() == 40));

            // The cube crosses the middle row but does not fill the frame
            assert!(!rows[10].trim().is_empty());
            assert!(frame.contains(' '));
        }
    }

    #[test]
    fn test_resize_reallocates_frame() {
        let geometry = obj::parse(CUBE_OBJ).unwrap();
        let mut viewer = Viewer::new(&geometry, args(&[]), 40, 20).unwrap();
        assert_eq!((viewer.frame().width(), viewer.frame().height()), (40, 20));

        viewer.resize(60, 30).unwrap();
        assert_eq!((viewer.frame().width(), viewer.frame().height()), (60, 30));

        viewer.render().unwrap();
        assert_eq!(viewer.frame().frame_to_string().lines().count(), 30);
        viewer.release();
    }

    #[test]
    fn test_screen_guard_restores_raw_mode() {
        // Entering fails without a TTY; either way raw mode is off afterwards
        drop(ScreenGuard::enter());
        assert!(!terminal::is_raw_mode_enabled().unwrap());
    }

    #[test]
    fn test_empty_obj_is_rejected() {
        let err = render_frame("# nothing here\n", &args(&[])).unwrap_err();
        assert!(format!("{err:#}").contains("vertex data is empty"));
    }

    #[test]
    fn test_render_frame_reports_parse_errors() {
        let err = render_frame("v 0 0 0\nf 1 2 3\n", &args(&[])).unwrap_err();
        assert!(format!("{err:#}").contains("out of range"));
    }

    #[test]
    fn test_invalid_projection_arguments() {
        let geometry = obj::parse(CUBE_OBJ).unwrap();
        let result = Viewer::new(&geometry, args(&["--near", "5", "--far", "1"]), 10, 10);
        assert!(result.is_err());
    }
}
