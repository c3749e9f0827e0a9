//! meshprobe: inspection and annotation of scanned triangle meshes.
//!
//! A [`Session`] owns the registered surfaces and runs the tools on them: plane cross-sections,
//! sphere selections, and surface picking. Point collections and the curves fitted through them
//! are kept per project tree node and can be saved as a JSON [`Project`].
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use meshprobe::*;
//!
//! fn main() -> Result<()> {
//!     init_logging();
//!
//!     let mesh = TriangleMesh::new(
//!         vec![Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0), Vec3::new(0.0, 2.0, 0.0)],
//!         &[Face::new(0, 1, 2)],
//!     )
//!     .with_computed_normals();
//!     let bvh = LinearBvh::new(&mesh)?;
//!
//!     let mut session = Session::default();
//!     let id = session.register_surface(mesh);
//!     session.set_bvh(id, Arc::new(bvh))?;
//!
//!     if let Some(cut) = session.cross_section(id, Plane::new(Vec3::X, Vec3::X)) {
//!         for [a, b] in cut.segment_pairs() {
//!             println!("{a} -> {b}");
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Tools
//!
//! - [`Session::cross_section`] - segments where a plane cuts the surface
//! - [`Session::select_sphere`] - vertices and triangles inside a sphere
//! - [`Session::pick`] - nearest vertex and averaged normal under a point

// Documentation lints - internal functions don't need exhaustive panic/error docs
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_errors_doc)]
// Builder patterns return Self which doesn't need must_use
#![allow(clippy::must_use_candidate)]
// Point keys are u32, point counts are usize
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]

pub mod curves;
pub mod points;
pub mod project;
pub mod session;

// Re-export core types
pub use meshprobe_core::{
    Aabb, AdjacencyGraph, Attribute, Auxiliaries, Bvh, ClipQuery, ClosestPoint, CursorFrame, Face,
    FaceGraph, IndexedTriangleSequence, LinearBvh, MeshId, NoRestrictedPoints, Options, Plane,
    PointBuffer, ProbeError, Quat, RestrictedPointsFuture, RestrictedPointsProvider, Result,
    ShapecastIntersection, ShapecastVisitor, Sphere, SphereVolumeQuery, SphereVolumeResults,
    TriangleMesh, TriangleSequence, Vec3,
};

pub use curves::{CurveEntry, CurveFitter, Curves, FittedCurve, NurbsData, PolylineFitter};
pub use points::{NodeKey, PointCollection, PointCollections, PointKey};
pub use project::{Project, ProjectPoints, PROJECT_VERSION};
pub use session::{Session, SphereSelection};

/// Installs the `env_logger` backend for the `log` macros, configured through `RUST_LOG`.
///
/// Calling it more than once, or after another logger was installed, does nothing.
pub fn init_logging() {
    if env_logger::try_init().is_ok() {
        log::info!(
            "meshprobe {} logging initialized",
            env!("CARGO_PKG_VERSION")
        );
    }
}
