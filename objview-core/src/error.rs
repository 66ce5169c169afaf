/// Error types for mesh ingestion, camera setup and buffer upload.
use std::fmt;

use thiserror::Error;

/// Vertex attribute a face corner index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeKind {
    Position,
    Uv,
    Normal,
}

impl fmt::Display for AttributeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AttributeKind::Position => "position",
            AttributeKind::Uv => "uv",
            AttributeKind::Normal => "normal",
        };
        f.write_str(name)
    }
}

/// OBJ record kind, used in diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Position,
    Normal,
    Uv,
    Face,
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RecordKind::Position => "v",
            RecordKind::Normal => "vn",
            RecordKind::Uv => "vt",
            RecordKind::Face => "f",
        };
        f.write_str(name)
    }
}

/// Error raised while parsing OBJ text. Line numbers are 1-based.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ObjError {
    /// A face corner references an attribute slot that does not exist.
    #[error("line {line}: {kind} index {index} is out of range ({available} defined)")]
    MalformedRecord {
        line: usize,
        kind: AttributeKind,
        index: i64,
        available: usize,
    },

    /// A face line has fewer than three corners.
    #[error("line {line}: face has {corners} corner(s), at least 3 are required")]
    IncompleteFace { line: usize, corners: usize },

    /// A face corner token is not of the form `v`, `v/vt`, `v//vn` or `v/vt/vn`.
    #[error("line {line}: invalid face corner `{token}`")]
    InvalidCorner { line: usize, token: String },

    /// A numeric field overflowed to infinity or is otherwise not finite.
    #[error("line {line}: non-finite value in `{record}` record")]
    NonFiniteValue { line: usize, record: RecordKind },
}

/// Error raised by camera configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("degenerate projection: {reason}")]
    DegenerateProjection { reason: String },

    /// `look_at` with coincident eye and target, or `up` parallel to the view direction.
    #[error("degenerate camera orientation: {reason}")]
    DegenerateOrientation { reason: String },

    /// The camera position has scale or shear, so the rigid inverse does not apply.
    #[error("camera position is not a rigid transform")]
    NonRigidCameraInverse,
}

/// Error raised by a GPU context.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GpuError {
    #[error("buffer creation failed: {0}")]
    BufferCreation(String),
}

/// Main error type for the pipeline.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error(transparent)]
    Obj(#[from] ObjError),

    #[error(transparent)]
    Camera(#[from] CameraError),

    #[error(transparent)]
    Gpu(#[from] GpuError),
}

/// Result type alias using the pipeline's Error type.
pub type Result<T> = std::result::Result<T, Error>;
