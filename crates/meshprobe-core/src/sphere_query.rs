//! Sphere containment query.
//!
//! [`SphereVolumeQuery`] selects the vertices and triangles of a mesh that fall inside a sphere.
//! A selection is usually refined in three steps:
//!
//! 1. [`SphereVolumeQuery::run`] collects everything inside the sphere,
//! 2. [`SphereVolumeQuery::filter_restricted_points`] drops protected vertices,
//! 3. [`SphereVolumeQuery::filter_unconnected_points`] keeps only the part reachable from a seed
//!    vertex, so a sphere poking through a thin wall does not grab the far side.
//!
//! [`SphereVolumeQuery::accumulate_results`] then merges the selection into the accumulators,
//! which survive until [`SphereVolumeQuery::clear_accumulated`].

use std::collections::HashSet;
use std::sync::Arc;

use glam::Vec3;

use crate::adjacency::AdjacencyGraph;
use crate::error::Result;
use crate::mesh::{Attribute, Face, MeshId, TriangleMesh};
use crate::restricted::{RestrictedPoints, RestrictedPointsProvider};
use crate::shapecast::{Aabb, Bvh, ShapecastIntersection, ShapecastVisitor, Sphere};

/// Result sets of a [`SphereVolumeQuery`].
#[derive(Debug, Clone, Default)]
pub struct SphereVolumeResults {
    /// Vertices inside the sphere.
    pub indices: HashSet<u32>,
    /// Vertices just outside the selection, when boundary tracking is on.
    pub boundary_indices: HashSet<u32>,
    /// Triangles with all corners inside.
    pub fully_contained_triangles: HashSet<usize>,
    /// Triangles the sphere touches without containing them.
    pub partially_contained_triangles: HashSet<usize>,
    pub accumulated_indices: HashSet<u32>,
    pub accumulated_triangles: HashSet<usize>,
    /// Hierarchy nodes visited by every traversal since the last accumulator reset.
    pub accumulated_traversed_node_indices: HashSet<usize>,
}

impl SphereVolumeResults {
    /// Iterates over fully then partially contained triangles.
    pub fn triangles(&self) -> impl Iterator<Item = usize> + '_ {
        self.fully_contained_triangles
            .iter()
            .chain(&self.partially_contained_triangles)
            .copied()
    }

    /// Returns the number of selected triangles.
    pub fn triangle_count(&self) -> usize {
        self.fully_contained_triangles.len() + self.partially_contained_triangles.len()
    }
}

/// Sphere containment query bound to one mesh.
#[derive(Debug)]
pub struct SphereVolumeQuery {
    mesh_id: MeshId,
    index: Arc<[u32]>,
    positions: Arc<[Vec3]>,
    normals: Arc<[Vec3]>,
    graph: Arc<AdjacencyGraph>,
    restricted: RestrictedPoints,
    kicked_off: bool,
    sphere: Sphere,
    find_boundary: bool,
    results: SphereVolumeResults,
}

impl SphereVolumeQuery {
    /// Binds a new query to `mesh`.
    ///
    /// Fails with [`crate::ProbeError::MissingIndex`] for unindexed meshes and with
    /// [`crate::ProbeError::MissingAttribute`] when the mesh has no normals. The restricted
    /// points are requested from `provider` but not polled until the first query.
    pub fn with_mesh(
        mesh: &TriangleMesh,
        graph: Arc<AdjacencyGraph>,
        provider: &dyn RestrictedPointsProvider,
    ) -> Result<Self> {
        let index = Arc::clone(mesh.index()?);
        let positions = Arc::clone(mesh.attribute(Attribute::Position)?);
        let normals = Arc::clone(mesh.attribute(Attribute::Normal)?);
        if !graph.is_built_from(mesh) {
            log::warn!("adjacency graph does not match mesh {}", mesh.id());
        }

        Ok(Self {
            mesh_id: mesh.id(),
            index,
            positions,
            normals,
            graph,
            restricted: RestrictedPoints::pending(provider.load(mesh)),
            kicked_off: false,
            sphere: Sphere::default(),
            find_boundary: false,
            results: SphereVolumeResults::default(),
        })
    }

    /// Rebinds the query to `mesh`, dropping all results. On failure the query is unchanged.
    pub fn init_with_mesh(
        &mut self,
        mesh: &TriangleMesh,
        graph: Arc<AdjacencyGraph>,
        provider: &dyn RestrictedPointsProvider,
    ) -> Result<()> {
        *self = Self::with_mesh(mesh, graph, provider)?;
        Ok(())
    }

    /// Sets the sphere for the next traversal and clears the per-query results.
    pub fn set_query_params(&mut self, center: Vec3, radius: f32, find_boundary: bool) {
        self.sphere = Sphere::new(center, radius);
        self.find_boundary = find_boundary;

        if !self.kicked_off {
            self.kicked_off = true;
            self.restricted.poll_ready();
        }

        self.clear();
    }

    /// Selects everything inside the sphere.
    pub fn run(
        &mut self,
        bvh: &dyn Bvh,
        center: Vec3,
        radius: f32,
        find_boundary: bool,
    ) -> &SphereVolumeResults {
        self.set_query_params(center, radius, find_boundary);
        bvh.shapecast(self);
        log::debug!(
            "sphere query on mesh {}: {} vertices, {} triangles",
            self.mesh_id,
            self.results.indices.len(),
            self.results.triangle_count()
        );
        &self.results
    }

    /// Removes restricted vertices and every triangle that references a removed vertex.
    ///
    /// Restricted vertices are dropped from the boundary as well. Blocks until the restricted
    /// points are loaded.
    pub fn filter_restricted_points(&mut self) {
        let restricted = self.restricted.wait();
        self.results
            .boundary_indices
            .retain(|v| !restricted.contains(v));
        let removed: HashSet<u32> = self
            .results
            .indices
            .iter()
            .copied()
            .filter(|v| restricted.contains(v))
            .collect();

        if removed.is_empty() {
            return;
        }
        self.results.indices.retain(|v| !removed.contains(v));
        self.filter_triangles(Some(&removed));
    }

    /// Keeps only the selected vertices reachable from `seed` through selected vertices.
    ///
    /// Neighbours outside the selection become boundary vertices when boundary tracking is on.
    /// The neighbours of `seed` are explored even when `seed` itself is not selected.
    pub fn filter_unconnected_points(&mut self, seed: u32) {
        let graph = Arc::clone(&self.graph);
        let results = &mut self.results;

        let mut connected: Vec<u32> = Vec::new();
        let mut visited: HashSet<u32> = HashSet::new();
        if results.indices.contains(&seed) {
            connected.push(seed);
            visited.insert(seed);
        }

        let mut cursor = connected.len();
        let mut pick = seed;
        loop {
            for neighbour in graph.adjacent_indices(pick) {
                if visited.contains(&neighbour) {
                    continue;
                }
                if results.indices.contains(&neighbour) {
                    visited.insert(neighbour);
                    connected.push(neighbour);
                } else if self.find_boundary {
                    results.boundary_indices.insert(neighbour);
                }
            }

            let Some(&next) = connected.get(cursor) else {
                break;
            };
            pick = next;
            cursor += 1;
        }

        if connected.len() < results.indices.len() {
            log::debug!(
                "dropping {} unconnected vertices",
                results.indices.len() - connected.len()
            );
            results.indices = visited;
            self.filter_triangles(None);
        }
    }

    /// Removes triangles from the current selection.
    ///
    /// With `removed`, a triangle goes when any corner was removed. Without, a triangle goes when
    /// none of its corners is selected anymore.
    fn filter_triangles(&mut self, removed: Option<&HashSet<u32>>) {
        let index = &self.index;
        let results = &mut self.results;
        let keep = |triangle: &usize| {
            let corners = Face::from_index(index, *triangle).vertices();
            match removed {
                Some(removed) => !corners.iter().any(|v| removed.contains(v)),
                None => corners.iter().any(|v| results.indices.contains(v)),
            }
        };

        let fully: HashSet<usize> = results
            .fully_contained_triangles
            .iter()
            .copied()
            .filter(|t| keep(t))
            .collect();
        let partially: HashSet<usize> = results
            .partially_contained_triangles
            .iter()
            .copied()
            .filter(|t| keep(t))
            .collect();
        results.fully_contained_triangles = fully;
        results.partially_contained_triangles = partially;
    }

    /// Merges the current selection into the accumulators.
    pub fn accumulate_results(&mut self) {
        let results = &mut self.results;
        results.accumulated_indices.extend(&results.indices);
        results
            .accumulated_triangles
            .extend(&results.fully_contained_triangles);
        results
            .accumulated_triangles
            .extend(&results.partially_contained_triangles);
    }

    /// Clears the per-query results.
    pub fn clear(&mut self) {
        self.results.indices.clear();
        self.results.boundary_indices.clear();
        self.results.fully_contained_triangles.clear();
        self.results.partially_contained_triangles.clear();
    }

    /// Clears the accumulators.
    pub fn clear_accumulated(&mut self) {
        self.results.accumulated_indices.clear();
        self.results.accumulated_triangles.clear();
        self.results.accumulated_traversed_node_indices.clear();
    }

    /// Returns whether `vertex` is restricted. False until the restricted points are loaded.
    pub fn is_point_restricted(&self, vertex: u32) -> bool {
        self.restricted.contains(vertex)
    }

    /// Returns whether the restricted points have been loaded.
    pub fn is_restricted_loaded(&self) -> bool {
        self.restricted.is_ready()
    }

    pub fn adjacency_graph(&self) -> &Arc<AdjacencyGraph> {
        &self.graph
    }

    pub fn results(&self) -> &SphereVolumeResults {
        &self.results
    }

    /// Returns the vertex positions of the bound mesh.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Returns the vertex normals of the bound mesh.
    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }
}

impl ShapecastVisitor for SphereVolumeQuery {
    fn intersects_bounds(
        &mut self,
        bounds: &Aabb,
        _is_leaf: bool,
        _depth: usize,
        node_index: usize,
    ) -> ShapecastIntersection {
        self.results
            .accumulated_traversed_node_indices
            .insert(node_index);

        if !self.sphere.intersects_box(bounds) {
            return ShapecastIntersection::NotIntersected;
        }
        if bounds
            .corners()
            .iter()
            .all(|&corner| self.sphere.contains_point(corner))
        {
            ShapecastIntersection::Contained
        } else {
            ShapecastIntersection::Intersected
        }
    }

    fn intersects_triangle(
        &mut self,
        triangle: &[Vec3; 3],
        triangle_index: usize,
        contained: bool,
    ) -> bool {
        let vertices = Face::from_index(&self.index, triangle_index).vertices();
        let results = &mut self.results;

        let fully_contained = if contained {
            results.indices.extend(vertices);
            true
        } else {
            let inside = triangle.map(|corner| self.sphere.contains_point(corner));
            // the bounds may reach the sphere while the triangle itself does not
            if !inside.contains(&true) && !self.sphere.intersects_triangle(triangle) {
                return false;
            }
            let fully = inside.iter().all(|&i| i);
            for (vertex, is_inside) in vertices.into_iter().zip(inside) {
                if is_inside {
                    results.indices.insert(vertex);
                } else if self.find_boundary && !fully {
                    results.boundary_indices.insert(vertex);
                }
            }
            fully
        };

        if fully_contained {
            results.fully_contained_triangles.insert(triangle_index);
        } else {
            results.partially_contained_triangles.insert(triangle_index);
        }

        false
    }
}
