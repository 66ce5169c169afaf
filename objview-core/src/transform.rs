/// 4x4 homogeneous transformations
///
/// Every operation returns a new [`Transformation`]; the receiver is never
/// modified. Storage is column-major, `fields[col * 4 + row]`, which is also
/// nalgebra's native layout.
use nalgebra::{Matrix3, Matrix4, Vector3, Vector4};

use crate::gpu::UniformSink;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transformation {
    matrix: Matrix4<f64>,
}

impl Transformation {
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Build from 16 column-major fields
    pub fn from_fields(fields: [f64; 16]) -> Self {
        Self {
            matrix: Matrix4::from_column_slice(&fields),
        }
    }

    pub fn from_matrix(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }

    /// The 16 column-major fields
    pub fn fields(&self) -> [f64; 16] {
        let mut fields = [0.0; 16];
        fields.copy_from_slice(self.matrix.as_slice());
        fields
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    /// `self * other`: `other` is applied first, then `self`
    pub fn mult(&self, other: &Transformation) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Multiply by translation matrix
    pub fn translate(&self, x: f64, y: f64, z: f64) -> Self {
        self.compose(Matrix4::new_translation(&Vector3::new(x, y, z)))
    }

    /// Multiply by scaling matrix
    pub fn scale(&self, x: f64, y: f64, z: f64) -> Self {
        self.compose(Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z)))
    }

    /// Multiply by rotation around the X axis (radians, right-handed)
    pub fn rotate_x(&self, angle: f64) -> Self {
        self.compose(Matrix4::new_rotation(Vector3::new(angle, 0.0, 0.0)))
    }

    /// Multiply by rotation around the Y axis (radians, right-handed)
    pub fn rotate_y(&self, angle: f64) -> Self {
        self.compose(Matrix4::new_rotation(Vector3::new(0.0, angle, 0.0)))
    }

    /// Multiply by rotation around the Z axis (radians, right-handed)
    pub fn rotate_z(&self, angle: f64) -> Self {
        self.compose(Matrix4::new_rotation(Vector3::new(0.0, 0.0, angle)))
    }

    fn compose(&self, elementary: Matrix4<f64>) -> Self {
        self.mult(&Self::from_matrix(elementary))
    }

    pub fn transpose(&self) -> Self {
        Self {
            matrix: self.matrix.transpose(),
        }
    }

    /// General inverse; `None` when the matrix is singular
    pub fn try_inverse(&self) -> Option<Self> {
        self.matrix.try_inverse().map(Self::from_matrix)
    }

    /// Upper-left 3x3 block
    pub fn rotation(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn translation(&self) -> Vector3<f64> {
        Vector3::new(self.matrix[12], self.matrix[13], self.matrix[14])
    }

    /// True when this is an orthonormal rotation plus a translation
    pub fn is_rigid(&self, tolerance: f64) -> bool {
        let rotation = self.rotation();
        let orthonormal = (rotation.transpose() * rotation - Matrix3::identity()).amax() <= tolerance;
        let proper = (rotation.determinant() - 1.0).abs() <= tolerance;
        let m = &self.matrix;
        let bottom = [m[3], m[7], m[11], m[15] - 1.0];

        orthonormal && proper && bottom.iter().all(|v| v.abs() <= tolerance)
    }

    /// Transform a homogeneous point/vector
    pub fn apply(&self, v: Vector4<f64>) -> Vector4<f64> {
        self.matrix * v
    }

    /// Column-major single precision fields, as uploaded to the GPU
    pub fn to_f32(&self) -> [f32; 16] {
        self.fields().map(|field| field as f32)
    }

    /// Upload to a named matrix uniform; `transpose` is passed through to the sink
    pub fn send_to_gpu<S: UniformSink + ?Sized>(&self, sink: &mut S, uniform: &str, transpose: bool) {
        sink.uniform_matrix4(uniform, &self.to_f32(), transpose);
    }
}

impl Default for Transformation {
    fn default() -> Self {
        Self::identity()
    }
}
