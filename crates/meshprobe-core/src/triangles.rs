//! Lazy triangle producers over an indexed mesh.
//!
//! Both sequences are restartable: every call to `iter()` starts a fresh traversal. Without a
//! subset they visit triangles `0..triangle_count` in order; with a subset they visit exactly
//! the listed triangle ids, in the given order and including duplicates.

use std::sync::Arc;

use glam::Vec3;

use crate::error::Result;
use crate::mesh::{Attribute, Face, TriangleMesh};

/// One triangle produced by a [`TriangleSequence`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Vertex ids in winding order.
    pub face: Face,
    /// Position of the triangle in the index buffer.
    pub face_index: usize,
    /// Corner positions, when requested.
    pub corners: Option<[Vec3; 3]>,
    /// Unit face normal, when requested. Degenerate triangles get `Vec3::ZERO`.
    pub normal: Option<Vec3>,
}

/// Triangle sequence that can also materialize per-triangle geometry.
///
/// Geometry is skipped unless asked for, so index-only consumers such as graph building pay
/// nothing for vector math.
#[derive(Debug, Clone)]
pub struct TriangleSequence {
    index: Arc<[u32]>,
    positions: Arc<[Vec3]>,
    subset: Option<Vec<usize>>,
    fill_corners: bool,
    compute_normals: bool,
}

impl TriangleSequence {
    /// Creates an index-only sequence over all triangles of `mesh`.
    pub fn new(mesh: &TriangleMesh) -> Result<Self> {
        Ok(Self {
            index: Arc::clone(mesh.index()?),
            positions: Arc::clone(mesh.attribute(Attribute::Position)?),
            subset: None,
            fill_corners: false,
            compute_normals: false,
        })
    }

    /// Restricts traversal to the given triangle ids.
    #[must_use]
    pub fn with_subset(mut self, triangles: impl IntoIterator<Item = usize>) -> Self {
        self.subset = Some(triangles.into_iter().collect());
        self
    }

    /// Fills [`Triangle::corners`].
    #[must_use]
    pub fn with_corners(mut self, enabled: bool) -> Self {
        self.fill_corners = enabled;
        self
    }

    /// Fills [`Triangle::normal`]. Implies corner lookup.
    #[must_use]
    pub fn with_normals(mut self, enabled: bool) -> Self {
        self.compute_normals = enabled;
        self
    }

    /// Returns the number of triangles a traversal yields.
    pub fn count(&self) -> usize {
        self.subset.as_ref().map_or(self.index.len() / 3, Vec::len)
    }

    /// Starts a new traversal.
    pub fn iter(&self) -> TriangleIter<'_> {
        TriangleIter {
            sequence: self,
            ids: FaceIds::new(self.subset.as_deref(), self.index.len() / 3),
        }
    }

    fn triangle(&self, face_index: usize) -> Triangle {
        let face = Face::from_index(&self.index, face_index);
        let mut triangle = Triangle {
            face,
            face_index,
            corners: None,
            normal: None,
        };
        if self.fill_corners || self.compute_normals {
            let corners = face.vertices().map(|v| self.positions[v as usize]);
            if self.compute_normals {
                let [a, b, c] = corners;
                triangle.normal = Some((b - a).cross(c - a).normalize_or_zero());
            }
            triangle.corners = Some(corners);
        }
        triangle
    }
}

impl<'a> IntoIterator for &'a TriangleSequence {
    type Item = Triangle;
    type IntoIter = TriangleIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator returned by [`TriangleSequence::iter`].
pub struct TriangleIter<'a> {
    sequence: &'a TriangleSequence,
    ids: FaceIds<'a>,
}

impl Iterator for TriangleIter<'_> {
    type Item = Triangle;

    fn next(&mut self) -> Option<Triangle> {
        let face_index = self.ids.next()?;
        Some(self.sequence.triangle(face_index))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.ids.size_hint()
    }
}

/// Index-only triangle sequence over a raw index buffer.
#[derive(Debug, Clone)]
pub struct IndexedTriangleSequence {
    index: Arc<[u32]>,
    subset: Option<Vec<usize>>,
}

impl IndexedTriangleSequence {
    /// Creates a sequence over every triangle of `index`.
    pub fn new(index: Arc<[u32]>) -> Self {
        Self {
            index,
            subset: None,
        }
    }

    /// Creates a sequence over the index buffer of `mesh`.
    pub fn from_mesh(mesh: &TriangleMesh) -> Result<Self> {
        Ok(Self::new(Arc::clone(mesh.index()?)))
    }

    /// Restricts traversal to the given triangle ids.
    #[must_use]
    pub fn with_subset(mut self, triangles: impl IntoIterator<Item = usize>) -> Self {
        self.subset = Some(triangles.into_iter().collect());
        self
    }

    /// Returns the number of triangles a traversal yields.
    pub fn count(&self) -> usize {
        self.subset.as_ref().map_or(self.index.len() / 3, Vec::len)
    }

    /// Starts a new traversal.
    pub fn iter(&self) -> impl Iterator<Item = Face> + '_ {
        FaceIds::new(self.subset.as_deref(), self.index.len() / 3)
            .map(|f| Face::from_index(&self.index, f))
    }
}

enum FaceIds<'a> {
    All(std::ops::Range<usize>),
    Subset(std::iter::Copied<std::slice::Iter<'a, usize>>),
}

impl<'a> FaceIds<'a> {
    fn new(subset: Option<&'a [usize]>, triangle_count: usize) -> Self {
        match subset {
            Some(ids) => Self::Subset(ids.iter().copied()),
            None => Self::All(0..triangle_count),
        }
    }
}

impl Iterator for FaceIds<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            Self::All(range) => range.next(),
            Self::Subset(ids) => ids.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self {
            Self::All(range) => range.size_hint(),
            Self::Subset(ids) => ids.size_hint(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> TriangleMesh {
        TriangleMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            &[Face::new(0, 1, 2), Face::new(0, 2, 3)],
        )
    }

    #[test]
    fn test_full_traversal_in_order() {
        let seq = TriangleSequence::new(&quad()).unwrap();
        let faces: Vec<usize> = seq.iter().map(|t| t.face_index).collect();
        assert_eq!(faces, vec![0, 1]);
        assert_eq!(seq.count(), 2);
        assert!(seq
            .iter()
            .all(|t| t.corners.is_none() && t.normal.is_none()));
    }

    #[test]
    fn test_restartable() {
        let seq = TriangleSequence::new(&quad()).unwrap();
        assert_eq!(seq.iter().count(), 2);
        assert_eq!(seq.iter().count(), 2);
    }

    #[test]
    fn test_subset_keeps_order_and_duplicates() {
        let seq = TriangleSequence::new(&quad())
            .unwrap()
            .with_subset([1, 0, 1]);
        let faces: Vec<Face> = seq.iter().map(|t| t.face).collect();
        assert_eq!(
            faces,
            vec![Face::new(0, 2, 3), Face::new(0, 1, 2), Face::new(0, 2, 3)]
        );
        assert_eq!(seq.count(), 3);
    }

    #[test]
    fn test_geometry_on_request() {
        let seq = TriangleSequence::new(&quad()).unwrap().with_normals(true);
        let first = seq.iter().next().unwrap();
        let corners = [Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0)];
        assert_eq!(first.corners, Some(corners));
        assert_eq!(first.normal, Some(Vec3::Z));

        let seq = TriangleSequence::new(&quad()).unwrap().with_corners(true);
        let first = seq.iter().next().unwrap();
        assert_eq!(first.corners, Some(corners));
        assert_eq!(first.normal, None);
    }

    #[test]
    fn test_unindexed_mesh_rejected() {
        let mesh = TriangleMesh::from_buffers(vec![Vec3::ZERO; 3], None, None).unwrap();
        assert!(TriangleSequence::new(&mesh).is_err());
        assert!(IndexedTriangleSequence::from_mesh(&mesh).is_err());
    }

    #[test]
    fn test_indexed_sequence() {
        let seq = IndexedTriangleSequence::from_mesh(&quad()).unwrap();
        assert_eq!(seq.count(), 2);
        let faces: Vec<Face> = seq.iter().collect();
        assert_eq!(faces, vec![Face::new(0, 1, 2), Face::new(0, 2, 3)]);

        let subset = seq.with_subset([1]);
        assert_eq!(subset.count(), 1);
        assert_eq!(subset.iter().next(), Some(Face::new(0, 2, 3)));
    }
}
