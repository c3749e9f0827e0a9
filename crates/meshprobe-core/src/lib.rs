//! Geometry core of meshprobe.
//!
//! This crate holds the mesh adjacency and spatial query machinery:
//! - [`PointBuffer`] for growable fixed-stride point storage
//! - [`FaceGraph`] and [`AdjacencyGraph`] for vertex-to-face incidence and vertex neighbours
//! - [`ClipQuery`] (plane cross-sections) and [`SphereVolumeQuery`] (sphere selections), both
//!   driven through the [`Bvh`] / [`ShapecastVisitor`] boundary
//! - [`Auxiliaries`], the per-mesh cache of graphs and queries

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Vertex ids are u32 by format, buffer positions are usize
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

pub mod adjacency;
pub mod clip_query;
pub mod error;
pub mod export;
pub mod face_graph;
pub mod mesh;
pub mod options;
pub mod pick;
pub mod plane;
pub mod points;
pub mod registry;
pub mod restricted;
pub mod rounding;
pub mod shapecast;
pub mod sphere_query;
pub mod triangles;

pub use adjacency::AdjacencyGraph;
pub use clip_query::ClipQuery;
pub use error::{ProbeError, Result};
pub use export::pcd_from_triangles;
pub use face_graph::{AdjacentIndices, FaceGraph, IndexedFace};
pub use mesh::{Attribute, Face, MeshId, TriangleMesh};
pub use options::Options;
pub use pick::{average_normal, closest_vertex_in_face, cursor_frame, CursorFrame};
pub use plane::Plane;
pub use points::PointBuffer;
pub use registry::Auxiliaries;
pub use restricted::{
    NoRestrictedPoints, RestrictedPoints, RestrictedPointsFuture, RestrictedPointsProvider,
};
pub use shapecast::{
    Aabb, Bvh, ClosestPoint, LinearBvh, ShapecastIntersection, ShapecastVisitor, Sphere,
};
pub use sphere_query::{SphereVolumeQuery, SphereVolumeResults};
pub use triangles::{IndexedTriangleSequence, Triangle, TriangleSequence};

// Re-export glam types for convenience
pub use glam::{Quat, Vec3};
