/// Integration tests driving the renderer against a recording backend.
use std::cell::RefCell;
use std::rc::Rc;

use objview_core::gpu::{MODEL_UNIFORM, PROJECTION_UNIFORM, VIEW_UNIFORM};
use objview_core::light::{LIGHT_COLOR_UNIFORM, LIGHT_DIRECTION_UNIFORM};
use objview_core::{
    obj, Camera, DirectionalLight, Error, Geometry, GpuContext, GpuError, Mesh, Renderer, Shader,
    Transformation, UniformSink,
};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    Clear,
    ClearColor([f32; 4]),
    Create { id: u32, floats: usize },
    Delete(u32),
    Activate,
    Matrix(String),
    Vec3(String),
    Bind { id: u32, location: u32, size: usize },
    Draw(usize),
}

type Log = Rc<RefCell<Vec<Event>>>;

struct RecordingProgram {
    log: Log,
    attributes: Vec<&'static str>,
}

impl UniformSink for RecordingProgram {
    fn uniform_matrix4(&mut self, name: &str, _fields: &[f32; 16], _transpose: bool) {
        self.log.borrow_mut().push(Event::Matrix(name.to_string()));
    }

    fn uniform_vec3(&mut self, name: &str, _value: [f32; 3]) {
        self.log.borrow_mut().push(Event::Vec3(name.to_string()));
    }
}

impl Shader for RecordingProgram {
    fn activate(&mut self) {
        self.log.borrow_mut().push(Event::Activate);
    }

    fn attribute(&self, name: &str) -> Option<u32> {
        self.attributes
            .iter()
            .position(|attribute| *attribute == name)
            .map(|index| index as u32)
    }
}

struct RecordingContext {
    log: Log,
    next_id: u32,
    fail_after: Option<u32>,
}

impl GpuContext for RecordingContext {
    type Buffer = u32;
    type Program = RecordingProgram;

    fn create_buffer(&mut self, data: &[f32]) -> Result<u32, GpuError> {
        if self.fail_after == Some(self.next_id) {
            return Err(GpuError::BufferCreation("out of memory".to_string()));
        }
        self.next_id += 1;
        self.log.borrow_mut().push(Event::Create {
            id: self.next_id,
            floats: data.len(),
        });
        Ok(self.next_id)
    }

    fn delete_buffer(&mut self, buffer: u32) {
        self.log.borrow_mut().push(Event::Delete(buffer));
    }

    fn bind_attribute(&mut self, buffer: &u32, location: u32, element_size: usize) {
        self.log.borrow_mut().push(Event::Bind {
            id: *buffer,
            location,
            size: element_size,
        });
    }

    fn draw_triangles(&mut self, _program: &RecordingProgram, vertex_count: usize) {
        self.log.borrow_mut().push(Event::Draw(vertex_count));
    }

    fn clear(&mut self) {
        self.log.borrow_mut().push(Event::Clear);
    }

    fn set_clear_color(&mut self, rgba: [f32; 4]) {
        self.log.borrow_mut().push(Event::ClearColor(rgba));
    }
}

const TRIANGLE: &str = "v 0 0 0\nv 1 0 0\nv 0 1 0\nvt 0 0\nvn 0 0 1\nf 1/1/1 2/1/1 3/1/1\n";
const QUAD: &str = "v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nf 1 2 3 4\n";

fn setup() -> (Log, Renderer<RecordingContext>) {
    let log: Log = Rc::default();
    let context = RecordingContext {
        log: log.clone(),
        next_id: 0,
        fail_after: None,
    };
    (log, Renderer::new(context))
}

fn program(log: &Log, attributes: &[&'static str]) -> RecordingProgram {
    RecordingProgram {
        log: log.clone(),
        attributes: attributes.to_vec(),
    }
}

fn ortho_camera() -> Camera {
    let mut camera = Camera::new();
    camera.set_orthographic(4.0, 4.0, 4.0).unwrap();
    camera
}

#[test]
fn test_render_without_shader_only_clears() {
    let (log, mut renderer) = setup();
    let geometry = obj::parse(TRIANGLE).unwrap();
    let mesh = Mesh::upload(renderer.context_mut(), &geometry).unwrap();
    log.borrow_mut().clear();

    renderer
        .render(&ortho_camera(), &DirectionalLight::default(), std::slice::from_ref(&mesh))
        .unwrap();
    assert_eq!(*log.borrow(), vec![Event::Clear]);

    mesh.release(renderer.context_mut());
}

#[test]
fn test_render_order() {
    let (log, mut renderer) = setup();
    renderer.set_shader(program(&log, &["position", "normal", "uv"]));

    let triangle = Mesh::upload(renderer.context_mut(), &obj::parse(TRIANGLE).unwrap()).unwrap();
    let quad = Mesh::upload(renderer.context_mut(), &obj::parse(QUAD).unwrap()).unwrap();
    let meshes = vec![quad, triangle];
    log.borrow_mut().clear();

    renderer
        .render(&ortho_camera(), &DirectionalLight::default(), &meshes)
        .unwrap();

    let bind = |id, location, size| Event::Bind { id, location, size };
    let expected = vec![
        Event::Clear,
        Event::Activate,
        Event::Vec3(LIGHT_DIRECTION_UNIFORM.to_string()),
        Event::Vec3(LIGHT_COLOR_UNIFORM.to_string()),
        Event::Matrix(PROJECTION_UNIFORM.to_string()),
        Event::Matrix(VIEW_UNIFORM.to_string()),
        // quad: buffers 4, 5, 6
        Event::Matrix(MODEL_UNIFORM.to_string()),
        bind(4, 0, 3),
        bind(5, 1, 3),
        bind(6, 2, 2),
        Event::Draw(6),
        // triangle: buffers 1, 2, 3
        Event::Matrix(MODEL_UNIFORM.to_string()),
        bind(1, 0, 3),
        bind(2, 1, 3),
        bind(3, 2, 2),
        Event::Draw(3),
    ];
    assert_eq!(*log.borrow(), expected);

    for mesh in meshes {
        mesh.release(renderer.context_mut());
    }
}

#[test]
fn test_unused_attributes_are_not_bound() {
    let (log, mut renderer) = setup();
    renderer.set_shader(program(&log, &["position"]));
    let mesh = Mesh::upload(renderer.context_mut(), &obj::parse(TRIANGLE).unwrap()).unwrap();
    log.borrow_mut().clear();

    renderer
        .render(&ortho_camera(), &DirectionalLight::default(), std::slice::from_ref(&mesh))
        .unwrap();

    let binds: Vec<_> = log
        .borrow()
        .iter()
        .filter(|event| matches!(event, Event::Bind { .. }))
        .cloned()
        .collect();
    assert_eq!(binds, vec![Event::Bind { id: 1, location: 0, size: 3 }]);
    assert_eq!(log.borrow().last(), Some(&Event::Draw(3)));

    mesh.release(renderer.context_mut());
}

#[test]
fn test_non_rigid_camera_fails_before_drawing() {
    let (log, mut renderer) = setup();
    renderer.set_shader(program(&log, &["position"]));
    let mesh = Mesh::upload(renderer.context_mut(), &obj::parse(TRIANGLE).unwrap()).unwrap();

    let mut camera = ortho_camera();
    camera.set_position(Transformation::identity().scale(2.0, 2.0, 2.0));

    let result = renderer.render(&camera, &DirectionalLight::default(), std::slice::from_ref(&mesh));
    assert!(matches!(result, Err(Error::Camera(_))));
    assert!(!log.borrow().iter().any(|event| matches!(event, Event::Draw(_))));

    mesh.release(renderer.context_mut());
}

#[test]
fn test_upload_and_release_balance() {
    let (log, mut renderer) = setup();
    let geometry = obj::parse(QUAD).unwrap();
    let mesh = Mesh::upload(renderer.context_mut(), &geometry).unwrap();
    assert_eq!(mesh.vertex_count(), 6);

    mesh.release(renderer.context_mut());

    let log = log.borrow();
    let created: Vec<_> = log
        .iter()
        .filter_map(|event| match event {
            Event::Create { id, .. } => Some(*id),
            _ => None,
        })
        .collect();
    let deleted: Vec<_> = log
        .iter()
        .filter_map(|event| match event {
            Event::Delete(id) => Some(*id),
            _ => None,
        })
        .collect();
    assert_eq!(created, vec![1, 2, 3]);
    assert_eq!(deleted, created);
    assert_eq!(
        log[..3],
        [
            Event::Create { id: 1, floats: 18 },
            Event::Create { id: 2, floats: 18 },
            Event::Create { id: 3, floats: 12 },
        ]
    );
}

#[test]
fn test_failed_upload_releases_partial_buffers() {
    let log: Log = Rc::default();
    let mut context = RecordingContext {
        log: log.clone(),
        next_id: 0,
        fail_after: Some(2),
    };

    let result = Mesh::upload(&mut context, &obj::parse(TRIANGLE).unwrap());
    assert!(result.is_err());
    assert!(log.borrow().contains(&Event::Delete(1)));
    assert!(log.borrow().contains(&Event::Delete(2)));
}

#[test]
fn test_empty_geometry_is_not_uploaded() {
    let (log, mut renderer) = setup();
    let result = Mesh::upload(renderer.context_mut(), &Geometry::default());
    assert!(matches!(result, Err(GpuError::BufferCreation(_))));
    assert!(log.borrow().is_empty());
}

#[test]
fn test_clear_color_and_shader_swap() {
    let (log, mut renderer) = setup();
    renderer.set_clear_color(255, 0, 51);
    assert_eq!(*log.borrow(), vec![Event::ClearColor([1.0, 0.0, 0.2, 1.0])]);

    assert!(renderer.set_shader(program(&log, &[])).is_none());
    assert!(renderer.set_shader(program(&log, &["position"])).is_some());
    assert_eq!(renderer.shader().and_then(|s| s.attribute("position")), Some(0));
    assert!(renderer.clear_shader().is_some());
    assert!(renderer.shader().is_none());
}
