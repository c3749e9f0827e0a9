//! Error types for meshprobe.

use thiserror::Error;

use crate::mesh::MeshId;

/// The main error type for meshprobe operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    /// The mesh has no triangle index buffer. Only indexed meshes are supported.
    #[error("mesh without index is not supported")]
    MissingIndex,

    /// A required vertex attribute is absent.
    #[error("expected '{0}' vertex attribute")]
    MissingAttribute(&'static str),

    /// No surface is registered under the given id.
    #[error("mesh {0} not found")]
    MeshNotFound(MeshId),

    /// No point collection or curve exists under the given key.
    #[error("collection '{0}' not found")]
    CollectionNotFound(String),

    /// A project file was written by an incompatible version.
    #[error("unsupported project version: expected {expected}, got {found}")]
    UnsupportedProjectVersion { expected: u32, found: u32 },

    /// Data size mismatch.
    #[error("data size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// A triangle references a vertex the mesh does not have.
    #[error("vertex {vertex} out of range for {vertex_count} vertices")]
    VertexOutOfRange { vertex: u32, vertex_count: usize },

    /// I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// A specialized Result type for meshprobe operations.
pub type Result<T> = std::result::Result<T, ProbeError>;
