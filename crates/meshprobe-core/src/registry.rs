//! Per-mesh cache of adjacency graphs and queries.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::adjacency::AdjacencyGraph;
use crate::clip_query::ClipQuery;
use crate::error::Result;
use crate::mesh::{MeshId, TriangleMesh};
use crate::options::Options;
use crate::restricted::{NoRestrictedPoints, RestrictedPointsProvider};
use crate::sphere_query::SphereVolumeQuery;

#[derive(Debug, Default)]
struct MeshAuxiliaries {
    adjacency_graph: Option<Arc<AdjacencyGraph>>,
    sphere_volume_query: Option<SphereVolumeQuery>,
    clip_query: Option<ClipQuery>,
}

/// Lazily built helpers for each mesh, keyed by [`MeshId`].
///
/// Entries are created on first use and rebuilt when the mesh topology changed since. Call
/// [`Auxiliaries::remove`] when a mesh goes away.
pub struct Auxiliaries {
    entries: HashMap<MeshId, MeshAuxiliaries>,
    provider: Arc<dyn RestrictedPointsProvider>,
}

impl Default for Auxiliaries {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Auxiliaries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auxiliaries")
            .field("entries", &self.entries)
            .finish_non_exhaustive()
    }
}

impl Auxiliaries {
    /// Creates an empty cache whose sphere queries have no restricted points.
    pub fn new() -> Self {
        Self::with_provider(Arc::new(NoRestrictedPoints))
    }

    /// Creates an empty cache whose sphere queries load restricted points from `provider`.
    pub fn with_provider(provider: Arc<dyn RestrictedPointsProvider>) -> Self {
        Self {
            entries: HashMap::new(),
            provider,
        }
    }

    /// Replaces the restricted points provider. Existing sphere queries are dropped so the next
    /// one loads from the new provider.
    pub fn set_restricted_points_provider(&mut self, provider: Arc<dyn RestrictedPointsProvider>) {
        self.provider = provider;
        for entry in self.entries.values_mut() {
            entry.sphere_volume_query = None;
        }
    }

    /// Returns the adjacency graph of `mesh`, building it if absent or stale.
    pub fn adjacency_graph(&mut self, mesh: &TriangleMesh) -> Result<Arc<AdjacencyGraph>> {
        let entry = self.entries.entry(mesh.id()).or_default();
        if let Some(graph) = &entry.adjacency_graph {
            if graph.is_built_from(mesh) {
                return Ok(Arc::clone(graph));
            }
            log::debug!("adjacency graph of mesh {} is stale", mesh.id());
        }

        let graph = Arc::new(AdjacencyGraph::new(mesh)?);
        entry.adjacency_graph = Some(Arc::clone(&graph));
        Ok(graph)
    }

    /// Returns the sphere query of `mesh`, creating it if absent or bound to a stale graph.
    pub fn sphere_volume_query(&mut self, mesh: &TriangleMesh) -> Result<&mut SphereVolumeQuery> {
        let graph = self.adjacency_graph(mesh)?;
        let provider = Arc::clone(&self.provider);
        let entry = self.entries.entry(mesh.id()).or_default();

        let query = match entry.sphere_volume_query.take() {
            Some(query) if Arc::ptr_eq(query.adjacency_graph(), &graph) => query,
            _ => SphereVolumeQuery::with_mesh(mesh, graph, provider.as_ref())?,
        };
        Ok(entry.sphere_volume_query.insert(query))
    }

    /// Returns the cross-section query of mesh `id`, creating it with `options` if absent.
    pub fn clip_query(&mut self, id: MeshId, options: &Options) -> &mut ClipQuery {
        self.entries
            .entry(id)
            .or_default()
            .clip_query
            .get_or_insert_with(|| ClipQuery::new(options))
    }

    /// Returns whether anything is cached for mesh `id`.
    pub fn contains(&self, id: MeshId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Drops everything cached for mesh `id`. Returns false if nothing was cached.
    pub fn remove(&mut self, id: MeshId) -> bool {
        self.entries.remove(&id).is_some()
    }

    /// Drops every cached entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Returns the number of meshes with cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is cached.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
