/// Camera and projection utilities
use nalgebra::{Isometry3, Point3, Vector3};

use crate::error::CameraError;
use crate::gpu::{UniformSink, PROJECTION_UNIFORM, VIEW_UNIFORM};
use crate::transform::Transformation;

/// Tolerance used when checking that the camera position is rigid
const RIGID_TOLERANCE: f64 = 1e-6;

/// Camera with its own world transform and a projection
///
/// `position` is object-to-world, not the view matrix. The view matrix is
/// derived from it on every call to [`Camera::get_inverse_position`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Camera {
    pub position: Transformation,
    pub projection: Transformation,
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_position(&mut self, position: Transformation) {
        self.position = position;
    }

    /// Place the camera at `eye` looking at `target` (right-handed, looking down -Z)
    pub fn look_at(
        &mut self,
        eye: Point3<f64>,
        target: Point3<f64>,
        up: Vector3<f64>,
    ) -> Result<(), CameraError> {
        let forward = target - eye;
        if forward.norm() <= f64::EPSILON {
            return Err(CameraError::DegenerateOrientation {
                reason: "eye and target coincide".to_string(),
            });
        }
        if forward.cross(&up).norm() <= f64::EPSILON {
            return Err(CameraError::DegenerateOrientation {
                reason: "up is parallel to the view direction".to_string(),
            });
        }

        let view = Isometry3::look_at_rh(&eye, &target, &up);
        self.position = Transformation::from_matrix(view.inverse().to_homogeneous());
        Ok(())
    }

    /// Map a `width x height x depth` box centred at the origin into NDC
    pub fn set_orthographic(&mut self, width: f64, height: f64, depth: f64) -> Result<(), CameraError> {
        for (name, value) in [("width", width), ("height", height), ("depth", depth)] {
            if !(value.is_finite() && value > 0.0) {
                return Err(CameraError::DegenerateProjection {
                    reason: format!("orthographic {name} must be positive, got {value}"),
                });
            }
        }

        let mut fields = Transformation::identity().fields();
        fields[0] = 2.0 / width;
        fields[5] = 2.0 / height;
        fields[10] = -2.0 / depth;
        self.projection = Transformation::from_fields(fields);
        Ok(())
    }

    /// Symmetric-frustum perspective projection with a vertical field of view in degrees
    pub fn set_perspective(
        &mut self,
        vertical_fov: f64,
        aspect_ratio: f64,
        near: f64,
        far: f64,
    ) -> Result<(), CameraError> {
        let degenerate = |reason: String| Err(CameraError::DegenerateProjection { reason });

        if !(vertical_fov.is_finite() && vertical_fov > 0.0 && vertical_fov < 180.0) {
            return degenerate(format!("field of view must be in (0, 180) degrees, got {vertical_fov}"));
        }
        if !(aspect_ratio.is_finite() && aspect_ratio > 0.0) {
            return degenerate(format!("aspect ratio must be positive, got {aspect_ratio}"));
        }
        if !(near.is_finite() && far.is_finite() && near > 0.0 && far > near) {
            return degenerate(format!("require far > near > 0, got near {near} far {far}"));
        }

        let height_div_2n = (vertical_fov.to_radians() / 2.0).tan();
        let width_div_2n = aspect_ratio * height_div_2n;

        let mut fields = Transformation::identity().fields();
        fields[0] = 1.0 / width_div_2n;
        fields[5] = 1.0 / height_div_2n;
        fields[10] = (far + near) / (near - far);
        fields[11] = -1.0;
        fields[14] = (2.0 * far * near) / (near - far);
        fields[15] = 0.0;
        self.projection = Transformation::from_fields(fields);
        Ok(())
    }

    /// Inverse of the camera's rigid world transform: `R^T` then translate by `-t`
    ///
    /// # Errors
    ///
    /// [`CameraError::NonRigidCameraInverse`] if `position` contains scale or
    /// shear. Use [`Transformation::try_inverse`] for such transforms.
    pub fn get_inverse_position(&self) -> Result<Transformation, CameraError> {
        if !self.position.is_rigid(RIGID_TOLERANCE) {
            return Err(CameraError::NonRigidCameraInverse);
        }

        let orig = self.position.fields();
        let mut dest = Transformation::identity().fields();
        // Transpose the rotation block
        for i in 0..3 {
            for j in 0..3 {
                dest[i * 4 + j] = orig[i + j * 4];
            }
        }

        let t = self.position.translation();
        Ok(Transformation::from_fields(dest).translate(-t.x, -t.y, -t.z))
    }

    /// The view matrix. Same as [`Camera::get_inverse_position`].
    pub fn view_matrix(&self) -> Result<Transformation, CameraError> {
        self.get_inverse_position()
    }

    /// Upload projection and view matrices to the shader
    pub fn apply<S: UniformSink + ?Sized>(&self, shader: &mut S) -> Result<(), CameraError> {
        let view = self.get_inverse_position()?;
        self.projection.send_to_gpu(shader, PROJECTION_UNIFORM, false);
        view.send_to_gpu(shader, VIEW_UNIFORM, false);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector4;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_camera_creation() {
        let camera = Camera::new();
        assert_eq!(camera.position, Transformation::identity());
        assert_eq!(camera.projection, Transformation::identity());
        assert_eq!(camera.get_inverse_position().unwrap(), Transformation::identity());
    }

    #[test]
    fn test_orthographic_projects_corner() {
        let mut camera = Camera::new();
        camera.set_orthographic(2.0, 2.0, 2.0).unwrap();

        let p = camera.projection.apply(Vector4::new(1.0, 1.0, 1.0, 1.0));
        assert!((p - Vector4::new(1.0, 1.0, -1.0, 1.0)).norm() < EPS);
    }

    #[test]
    fn test_orthographic_scale_factors() {
        let mut camera = Camera::new();
        camera.set_orthographic(4.0, 8.0, 10.0).unwrap();
        let f = camera.projection.fields();
        assert_eq!((f[0], f[5], f[10]), (0.5, 0.25, -0.2));
        assert_eq!((f[12], f[13], f[14], f[15]), (0.0, 0.0, 0.0, 1.0));
    }

    #[test]
    fn test_orthographic_rejects_degenerate_box() {
        let mut camera = Camera::new();
        for (w, h, d) in [(0.0, 1.0, 1.0), (1.0, -1.0, 1.0), (1.0, 1.0, f64::NAN)] {
            assert!(matches!(
                camera.set_orthographic(w, h, d),
                Err(CameraError::DegenerateProjection { .. })
            ));
        }
        assert_eq!(camera.projection, Transformation::identity());
    }

    #[test]
    fn test_perspective_depth_range() {
        let (near, far) = (0.5, 50.0);
        let mut camera = Camera::new();
        camera.set_perspective(60.0, 1.5, near, far).unwrap();

        let ndc_z = |z: f64| {
            let clip = camera.projection.apply(Vector4::new(0.0, 0.0, z, 1.0));
            clip.z / clip.w
        };
        assert!((ndc_z(-near) + 1.0).abs() < EPS);
        assert!((ndc_z(-far) - 1.0).abs() < EPS);
    }

    #[test]
    fn test_perspective_frustum_edges() {
        let mut camera = Camera::new();
        camera.set_perspective(90.0, 2.0, 1.0, 10.0).unwrap();

        // tan(45deg) = 1, so at distance 1 the frustum spans y in [-1, 1], x in [-2, 2]
        let clip = camera.projection.apply(Vector4::new(2.0, 1.0, -1.0, 1.0));
        assert!((clip.x / clip.w - 1.0).abs() < EPS);
        assert!((clip.y / clip.w - 1.0).abs() < EPS);
        assert!((clip.w - 1.0).abs() < EPS);
    }

    #[test]
    fn test_perspective_rejects_bad_planes() {
        let mut camera = Camera::new();
        let cases = [
            (60.0, 1.0, 0.0, 10.0),
            (60.0, 1.0, -1.0, 10.0),
            (60.0, 1.0, 10.0, 10.0),
            (60.0, 1.0, 10.0, 1.0),
            (0.0, 1.0, 0.1, 10.0),
            (180.0, 1.0, 0.1, 10.0),
            (60.0, 0.0, 0.1, 10.0),
        ];
        for (fov, aspect, near, far) in cases {
            assert!(
                matches!(
                    camera.set_perspective(fov, aspect, near, far),
                    Err(CameraError::DegenerateProjection { .. })
                ),
                "accepted fov {fov} aspect {aspect} near {near} far {far}"
            );
        }
    }

    #[test]
    fn test_inverse_position_of_rigid_transform() {
        let mut camera = Camera::new();
        camera.set_position(
            Transformation::identity()
                .translate(3.0, -2.0, 7.0)
                .rotate_y(0.8)
                .rotate_x(-0.3)
                .rotate_z(1.9),
        );

        let view = camera.get_inverse_position().unwrap();
        let product = camera.position.mult(&view);
        assert!((product.matrix() - Transformation::identity().matrix()).norm() < EPS);
    }

    #[test]
    fn test_inverse_position_rejects_scale() {
        let mut camera = Camera::new();
        camera.set_position(Transformation::identity().rotate_x(0.2).scale(2.0, 1.0, 1.0));
        assert_eq!(
            camera.get_inverse_position(),
            Err(CameraError::NonRigidCameraInverse)
        );
    }

    #[test]
    fn test_look_at() {
        let mut camera = Camera::new();
        camera
            .look_at(Point3::new(0.0, 0.0, 5.0), Point3::origin(), Vector3::y())
            .unwrap();

        let view = camera.view_matrix().unwrap();
        let origin = view.apply(Vector4::new(0.0, 0.0, 0.0, 1.0));
        assert!((origin - Vector4::new(0.0, 0.0, -5.0, 1.0)).norm() < EPS);

        assert!(camera
            .look_at(Point3::origin(), Point3::origin(), Vector3::y())
            .is_err());
        assert!(camera
            .look_at(Point3::new(0.0, 5.0, 0.0), Point3::origin(), Vector3::y())
            .is_err());
    }

    #[derive(Default)]
    struct Recorder {
        matrices: Vec<(String, [f32; 16])>,
    }

    impl UniformSink for Recorder {
        fn uniform_matrix4(&mut self, name: &str, fields: &[f32; 16], _transpose: bool) {
            self.matrices.push((name.to_string(), *fields));
        }

        fn uniform_vec3(&mut self, _name: &str, _value: [f32; 3]) {}
    }

    #[test]
    fn test_apply_uploads_projection_and_view() {
        let mut camera = Camera::new();
        camera.set_orthographic(2.0, 4.0, 8.0).unwrap();
        camera.set_position(Transformation::identity().translate(1.0, 2.0, 3.0));

        let mut sink = Recorder::default();
        camera.apply(&mut sink).unwrap();

        assert_eq!(sink.matrices.len(), 2);
        assert_eq!(sink.matrices[0].0, PROJECTION_UNIFORM);
        assert_eq!(sink.matrices[0].1, camera.projection.to_f32());
        assert_eq!(sink.matrices[1].0, VIEW_UNIFORM);
        assert_eq!(&sink.matrices[1].1[12..15], &[-1.0, -2.0, -3.0]);
    }

    #[test]
    fn test_apply_uploads_nothing_when_not_rigid() {
        let mut camera = Camera::new();
        camera.set_position(Transformation::identity().scale(3.0, 3.0, 3.0));

        let mut sink = Recorder::default();
        assert!(camera.apply(&mut sink).is_err());
        assert!(sink.matrices.is_empty());
    }
}
