//! Surface picking helpers.

use std::collections::HashSet;

use glam::{Quat, Vec3};

use crate::adjacency::AdjacencyGraph;
use crate::error::Result;
use crate::mesh::{Attribute, Face, TriangleMesh};

/// Position and orientation of a cursor snapped to a mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CursorFrame {
    /// Vertex the cursor snapped to.
    pub vertex: u32,
    /// Face the pick landed on.
    pub face_index: usize,
    pub position: Vec3,
    /// Averaged normal around `vertex`, unit length or zero.
    pub normal: Vec3,
}

impl CursorFrame {
    /// Rotation taking +Z onto the normal.
    pub fn rotation(&self) -> Quat {
        if self.normal == Vec3::ZERO {
            Quat::IDENTITY
        } else {
            Quat::from_rotation_arc(Vec3::Z, self.normal)
        }
    }
}

/// Returns the corner of `face_index` closest to `point`. Ties go to the earlier corner.
pub fn closest_vertex_in_face(mesh: &TriangleMesh, point: Vec3, face_index: usize) -> Result<u32> {
    let face = Face::from_index(mesh.index()?, face_index);
    let positions = mesh.positions();

    let mut best = face.a;
    let mut best_distance = f32::INFINITY;
    for vertex in face.vertices() {
        let d = positions[vertex as usize].distance_squared(point);
        if d < best_distance {
            best = vertex;
            best_distance = d;
        }
    }
    Ok(best)
}

/// Normalized sum of the normals of `indices`. Zero when they cancel out or `indices` is empty.
pub fn average_normal(indices: impl IntoIterator<Item = u32>, normals: &[Vec3]) -> Vec3 {
    indices
        .into_iter()
        .map(|i| normals[i as usize])
        .sum::<Vec3>()
        .normalize_or_zero()
}

/// Snaps a surface pick to the nearest corner of the picked face and orients it along the
/// averaged normal of every vertex sharing a face with that corner.
pub fn cursor_frame(
    mesh: &TriangleMesh,
    graph: &AdjacencyGraph,
    point: Vec3,
    face_index: usize,
) -> Result<CursorFrame> {
    let vertex = closest_vertex_in_face(mesh, point, face_index)?;
    let normals = mesh.attribute(Attribute::Normal)?;

    let neighbourhood: HashSet<u32> = graph
        .face_graph()
        .adjacent_faces(vertex)
        .flat_map(|f| f.face().vertices())
        .collect();

    Ok(CursorFrame {
        vertex,
        face_index,
        position: mesh.positions()[vertex as usize],
        normal: average_normal(neighbourhood, normals),
    })
}
