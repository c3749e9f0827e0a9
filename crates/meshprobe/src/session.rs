//! Inspection session: registered surfaces and the tools working on them.
//!
//! Tools degrade softly. When the surface is not registered or has no hierarchy attached yet, the
//! tool logs a warning and returns `None` instead of failing. Real errors, such as a mesh without
//! normals handed to the sphere selection, are returned as [`ProbeError`].

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use meshprobe_core::{
    cursor_frame, pcd_from_triangles, Auxiliaries, Bvh, ClipQuery, CursorFrame,
    IndexedTriangleSequence, MeshId, Options, Plane, ProbeError, RestrictedPointsProvider, Result,
    SphereVolumeResults, TriangleMesh, Vec3,
};

use crate::curves::{CurveEntry, CurveFitter, Curves};
use crate::points::PointCollections;
use crate::project::Project;

/// Parameters of a sphere selection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereSelection {
    pub center: Vec3,
    pub radius: f32,
    /// Keep only the part of the selection connected to this vertex.
    pub seed: Option<u32>,
    /// Merge the selection into the accumulated one.
    pub accumulate: bool,
}

impl SphereSelection {
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self {
            center,
            radius,
            seed: None,
            accumulate: false,
        }
    }

    #[must_use]
    pub fn seeded(mut self, vertex: u32) -> Self {
        self.seed = Some(vertex);
        self
    }

    #[must_use]
    pub fn accumulating(mut self) -> Self {
        self.accumulate = true;
        self
    }
}

struct Surface {
    mesh: TriangleMesh,
    bvh: Option<Arc<dyn Bvh>>,
}

/// Looks up a surface that is ready for `tool`, logging why when it is not.
fn tool_target<'a>(
    surfaces: &'a BTreeMap<MeshId, Surface>,
    id: MeshId,
    tool: &str,
) -> Option<(&'a TriangleMesh, Arc<dyn Bvh>)> {
    let Some(surface) = surfaces.get(&id) else {
        log::warn!("{tool}: no surface {id} registered");
        return None;
    };
    let Some(bvh) = &surface.bvh else {
        log::warn!("{tool}: surface {id} has no bounding volume hierarchy yet");
        return None;
    };
    Some((&surface.mesh, Arc::clone(bvh)))
}

/// Owns the surfaces, their cached helpers, and the project data.
pub struct Session {
    options: Options,
    surfaces: BTreeMap<MeshId, Surface>,
    auxiliaries: Auxiliaries,
    points: PointCollections,
    curves: Curves,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Options::default())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("options", &self.options)
            .field("surfaces", &self.surfaces.keys().collect::<Vec<_>>())
            .field("points", &self.points.len())
            .field("curves", &self.curves.len())
            .finish_non_exhaustive()
    }
}

impl Session {
    pub fn new(options: Options) -> Self {
        Self {
            points: PointCollections::new(options.point_collection_reserve),
            curves: Curves::new(options.curve_degree),
            auxiliaries: Auxiliaries::new(),
            surfaces: BTreeMap::new(),
            options,
        }
    }

    /// Sets where sphere selections load their restricted points from.
    #[must_use]
    pub fn with_restricted_points_provider(
        mut self,
        provider: Arc<dyn RestrictedPointsProvider>,
    ) -> Self {
        self.auxiliaries.set_restricted_points_provider(provider);
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Registers a surface. Registering the same mesh again replaces it and drops its caches.
    pub fn register_surface(&mut self, mesh: TriangleMesh) -> MeshId {
        let id = mesh.id();
        if self.surfaces.contains_key(&id) {
            self.auxiliaries.remove(id);
        }
        log::info!(
            "registered surface {id} ({} vertices, {} triangles)",
            mesh.vertex_count(),
            mesh.triangle_count()
        );
        self.surfaces.insert(id, Surface { mesh, bvh: None });
        id
    }

    /// Attaches the hierarchy the tools traverse on surface `id`.
    pub fn set_bvh(&mut self, id: MeshId, bvh: Arc<dyn Bvh>) -> Result<()> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or(ProbeError::MeshNotFound(id))?;
        surface.bvh = Some(bvh);
        Ok(())
    }

    /// Replaces the triangles of surface `id`. Cached helpers rebuild on next use; the attached
    /// hierarchy is dropped since it indexes the old triangles.
    ///
    /// An index referencing missing vertices is rejected and leaves the surface untouched.
    pub fn set_surface_index(&mut self, id: MeshId, index: Vec<u32>) -> Result<()> {
        let surface = self
            .surfaces
            .get_mut(&id)
            .ok_or(ProbeError::MeshNotFound(id))?;
        surface.mesh.set_index(index)?;
        surface.bvh = None;
        Ok(())
    }

    /// Removes surface `id` and everything cached for it.
    pub fn unregister_surface(&mut self, id: MeshId) -> Option<TriangleMesh> {
        let surface = self.surfaces.remove(&id)?;
        self.auxiliaries.remove(id);
        log::info!("unregistered surface {id}");
        Some(surface.mesh)
    }

    pub fn surface(&self, id: MeshId) -> Option<&TriangleMesh> {
        self.surfaces.get(&id).map(|s| &s.mesh)
    }

    /// Returns the earliest registered surface still present.
    pub fn first_surface(&self) -> Option<MeshId> {
        self.surfaces.keys().next().copied()
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    pub fn auxiliaries(&self) -> &Auxiliaries {
        &self.auxiliaries
    }

    /// Cuts surface `id` with `plane`.
    pub fn cross_section(&mut self, id: MeshId, plane: Plane) -> Option<&ClipQuery> {
        let (_, bvh) = tool_target(&self.surfaces, id, "cross-section")?;
        let query = self.auxiliaries.clip_query(id, &self.options);
        query.run(bvh.as_ref(), plane);
        Some(&*query)
    }

    /// Cuts surface `id` with the plane defined by the point collection `node`.
    ///
    /// Two points give the plane through the first point with the normal pointing to the second.
    /// Three or more give the plane through the first three.
    pub fn cross_section_through_points(&mut self, id: MeshId, node: &str) -> Option<&ClipQuery> {
        let Some(collection) = self.points.get(node) else {
            log::warn!("cross-section: no point collection '{node}'");
            return None;
        };
        let positions = collection.positions();
        let plane = match positions.as_slice() {
            [] | [_] => {
                log::warn!("cross-section: '{node}' needs at least 2 points");
                return None;
            }
            [origin, towards] => (*towards - *origin)
                .try_normalize()
                .map(|normal| Plane::new(*origin, normal)),
            [a, b, c, ..] => Plane::from_points(*a, *b, *c),
        };
        let Some(plane) = plane else {
            log::warn!("cross-section: the points of '{node}' do not define a plane");
            return None;
        };
        self.cross_section(id, plane)
    }

    /// Selects the part of surface `id` inside a sphere.
    ///
    /// Restricted points are always filtered out. With a seed, only the part connected to the
    /// seed is kept.
    pub fn select_sphere(
        &mut self,
        id: MeshId,
        selection: SphereSelection,
    ) -> Result<Option<&SphereVolumeResults>> {
        let Some((mesh, bvh)) = tool_target(&self.surfaces, id, "sphere selection") else {
            return Ok(None);
        };
        let query = self.auxiliaries.sphere_volume_query(mesh)?;

        query.run(
            bvh.as_ref(),
            selection.center,
            selection.radius,
            self.options.find_boundary,
        );
        query.filter_restricted_points();
        if let Some(seed) = selection.seed {
            query.filter_unconnected_points(seed);
        }
        if selection.accumulate {
            query.accumulate_results();
        }
        Ok(Some(query.results()))
    }

    /// Averaged vertex normal of the current sphere selection on surface `id`.
    pub fn selection_normal(&mut self, id: MeshId) -> Result<Option<Vec3>> {
        let mesh = &self
            .surfaces
            .get(&id)
            .ok_or(ProbeError::MeshNotFound(id))?
            .mesh;
        let query = self.auxiliaries.sphere_volume_query(mesh)?;
        let indices = &query.results().indices;
        if indices.is_empty() {
            return Ok(None);
        }
        Ok(Some(meshprobe_core::average_normal(
            indices.iter().copied(),
            query.normals(),
        )))
    }

    /// Drops the accumulated sphere selection of surface `id`.
    pub fn clear_accumulated_selection(&mut self, id: MeshId) -> Result<()> {
        let mesh = &self
            .surfaces
            .get(&id)
            .ok_or(ProbeError::MeshNotFound(id))?
            .mesh;
        self.auxiliaries
            .sphere_volume_query(mesh)?
            .clear_accumulated();
        Ok(())
    }

    /// Exports the vertices of the accumulated selection on surface `id` as PCD text.
    pub fn export_selection_pcd(&mut self, id: MeshId) -> Result<String> {
        let mesh = &self
            .surfaces
            .get(&id)
            .ok_or(ProbeError::MeshNotFound(id))?
            .mesh;
        let query = self.auxiliaries.sphere_volume_query(mesh)?;

        let mut triangles: Vec<usize> = query
            .results()
            .accumulated_triangles
            .iter()
            .copied()
            .collect();
        triangles.sort_unstable();
        let sequence = IndexedTriangleSequence::from_mesh(mesh)?.with_subset(triangles);
        pcd_from_triangles(mesh, &sequence, self.options.export_precision)
    }

    /// Snaps `point` to the nearest vertex of surface `id` and returns the cursor frame there.
    pub fn pick(&mut self, id: MeshId, point: Vec3) -> Result<Option<CursorFrame>> {
        let Some((mesh, bvh)) = tool_target(&self.surfaces, id, "pick") else {
            return Ok(None);
        };
        let Some(hit) = bvh.closest_point_to_point(point) else {
            return Ok(None);
        };
        let graph = self.auxiliaries.adjacency_graph(mesh)?;
        cursor_frame(mesh, &graph, point, hit.face_index).map(Some)
    }

    pub fn points(&self) -> &PointCollections {
        &self.points
    }

    pub fn points_mut(&mut self) -> &mut PointCollections {
        &mut self.points
    }

    pub fn curves(&self) -> &Curves {
        &self.curves
    }

    /// Fits the curve `curve_node` through the point collection `points_node`.
    pub fn fit_curve(
        &mut self,
        curve_node: &str,
        points_node: &str,
        fitter: &dyn CurveFitter,
    ) -> Option<&CurveEntry> {
        let Some(points) = self.points.get(points_node) else {
            log::warn!("curve: no point collection '{points_node}'");
            return None;
        };
        self.curves
            .update_curve_from_points(curve_node, points_node, points, fitter)
    }

    /// Removes the point collection and the curve stored under `node`.
    pub fn remove_node(&mut self, node: &str) {
        self.points.remove(node);
        self.curves.remove(node);
    }

    /// Serializes the point collections.
    pub fn save_project(&self) -> Result<String> {
        Project::from_collections(&self.points).to_json()
    }

    /// Replaces the point collections with those of a saved project.
    pub fn load_project(&mut self, json: &str) -> Result<()> {
        Project::from_json(json)?.apply_to(&mut self.points);
        Ok(())
    }

    pub fn save_project_to(&self, path: impl AsRef<Path>) -> Result<()> {
        Project::from_collections(&self.points).save(path)
    }

    pub fn load_project_from(&mut self, path: impl AsRef<Path>) -> Result<()> {
        Project::load(path)?.apply_to(&mut self.points);
        Ok(())
    }
}
