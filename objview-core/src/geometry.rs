/// Mesh entity model: vertices, triangle faces and the geometry that owns them
use nalgebra::{Point3, Vector2 as NVector2, Vector3 as NVector3};

pub type Vector3 = NVector3<f64>;
pub type Vector2 = NVector2<f64>;

/// One corner of a face with its position, normal and texture coordinate
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vector3,
    pub normal: Vector3,
    pub uv: Vector2,
}

impl Vertex {
    pub fn new(position: Vector3, normal: Vector3, uv: Vector2) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }

    /// Vertex with only a position; normal and uv are zero
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self {
            position: Vector3::new(x, y, z),
            ..Self::default()
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone, PartialEq)]
pub struct Face {
    pub vertices: [Vertex; 3],
}

impl Face {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    /// Calculate the face normal from the triangle's vertex positions.
    ///
    /// Returns `None` for a degenerate (zero-area) triangle.
    pub fn normal(&self) -> Option<Vector3> {
        let v0 = self.vertices[0].position;
        let v1 = self.vertices[1].position;
        let v2 = self.vertices[2].position;

        let edge1 = v1 - v0;
        let edge2 = v2 - v0;

        edge1.cross(&edge2).try_normalize(f64::EPSILON)
    }
}

/// A 3D mesh composed of triangle faces, immutable once built
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Geometry {
    faces: Vec<Face>,
}

impl Geometry {
    pub fn new(faces: Vec<Face>) -> Self {
        Self { faces }
    }

    pub fn faces(&self) -> &[Face] {
        &self.faces
    }

    pub fn triangle_count(&self) -> usize {
        self.faces.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.faces.len() * 3
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        self.faces.iter().flat_map(|face| face.vertices.iter())
    }

    /// Flattened `x, y, z` positions in triangle order
    pub fn positions(&self) -> Vec<f32> {
        let mut answer = Vec::with_capacity(self.vertex_count() * 3);
        for vertex in self.vertices() {
            let v = vertex.position;
            answer.extend_from_slice(&[v.x as f32, v.y as f32, v.z as f32]);
        }
        answer
    }

    /// Flattened `x, y, z` normals in triangle order
    pub fn normals(&self) -> Vec<f32> {
        let mut answer = Vec::with_capacity(self.vertex_count() * 3);
        for vertex in self.vertices() {
            let v = vertex.normal;
            answer.extend_from_slice(&[v.x as f32, v.y as f32, v.z as f32]);
        }
        answer
    }

    /// Flattened `u, v` texture coordinates in triangle order
    pub fn uvs(&self) -> Vec<f32> {
        let mut answer = Vec::with_capacity(self.vertex_count() * 2);
        for vertex in self.vertices() {
            let v = vertex.uv;
            answer.extend_from_slice(&[v.x as f32, v.y as f32]);
        }
        answer
    }

    /// Axis-aligned bounding box as `(min, max)`, or `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut vertices = self.vertices();
        let first = vertices.next()?.position;
        let (min, max) = vertices.fold((first, first), |(min, max), vertex| {
            (min.inf(&vertex.position), max.sup(&vertex.position))
        });
        Some((Point3::from(min), Point3::from(max)))
    }
}
