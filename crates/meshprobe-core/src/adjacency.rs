//! Vertex adjacency over one mesh.

use std::sync::Arc;
use std::time::Instant;

use crate::error::Result;
use crate::face_graph::{AdjacentIndices, FaceGraph};
use crate::mesh::{MeshId, TriangleMesh};
use crate::triangles::TriangleSequence;

/// Vertex adjacency graph of a mesh.
///
/// The graph is only valid for the index buffer it was built from; after a topology change
/// [`AdjacencyGraph::is_built_from`] turns false and the graph must be rebuilt.
#[derive(Debug, Clone)]
pub struct AdjacencyGraph {
    mesh_id: MeshId,
    face_graph: FaceGraph,
}

impl AdjacencyGraph {
    /// Builds the graph. Fails with [`crate::ProbeError::MissingIndex`] for unindexed meshes.
    pub fn new(mesh: &TriangleMesh) -> Result<Self> {
        let start = Instant::now();
        let face_graph = Self::build_face_graph(mesh)?;
        log::debug!(
            "adjacency graph for mesh {} built in {:?} ({} vertices)",
            mesh.id(),
            start.elapsed(),
            face_graph.vertex_count()
        );
        Ok(Self {
            mesh_id: mesh.id(),
            face_graph,
        })
    }

    /// Rebuilds from `mesh`. On failure the previous graph is kept untouched.
    pub fn rebuild(&mut self, mesh: &TriangleMesh) -> Result<()> {
        *self = Self::new(mesh)?;
        Ok(())
    }

    fn build_face_graph(mesh: &TriangleMesh) -> Result<FaceGraph> {
        let index = Arc::clone(mesh.index()?);
        let triangles = TriangleSequence::new(mesh)?;
        Ok(FaceGraph::build(
            triangles.iter().map(|t| t.face),
            mesh.vertex_count(),
            index,
        ))
    }

    /// Returns the id of the mesh the graph was built for.
    pub fn mesh_id(&self) -> MeshId {
        self.mesh_id
    }

    /// Returns whether the graph still matches the current index buffer of `mesh`.
    pub fn is_built_from(&self, mesh: &TriangleMesh) -> bool {
        mesh.id() == self.mesh_id
            && mesh
                .index()
                .is_ok_and(|index| Arc::ptr_eq(index, self.face_graph.index()))
    }

    /// Returns the distinct neighbours of `vertex`.
    pub fn adjacent_indices(&self, vertex: u32) -> AdjacentIndices<'_> {
        self.face_graph.adjacent_indices(vertex)
    }

    /// Returns the underlying incidence index.
    pub fn face_graph(&self) -> &FaceGraph {
        &self.face_graph
    }
}
