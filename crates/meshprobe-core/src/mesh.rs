//! Indexed triangle mesh handle consumed by the graphs and queries.
//!
//! Buffers are shared through `Arc` so that caches can hold on to the exact index buffer they
//! were built from. Replacing a buffer allocates a new `Arc`, which is how stale caches are
//! detected.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use glam::Vec3;

use crate::error::{ProbeError, Result};

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);

/// Identity key of a mesh, stable for the lifetime of the mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    fn next() -> Self {
        Self(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Returns the raw id value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MeshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Named per-vertex attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// Vertex positions.
    Position,
    /// Vertex normals.
    Normal,
}

impl Attribute {
    /// Returns the attribute name used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Self::Position => "position",
            Self::Normal => "normal",
        }
    }
}

/// Three vertex ids of one triangle, in winding order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Face {
    pub a: u32,
    pub b: u32,
    pub c: u32,
}

impl Face {
    /// Creates a face from three vertex ids.
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { a, b, c }
    }

    /// Reads triangle `face_index` from a flat index buffer.
    ///
    /// # Panics
    ///
    /// Panics if the triangle lies outside the buffer.
    #[inline]
    pub fn from_index(index: &[u32], face_index: usize) -> Self {
        let i3 = face_index * 3;
        Self {
            a: index[i3],
            b: index[i3 + 1],
            c: index[i3 + 2],
        }
    }

    /// Returns the corners as an array.
    #[inline]
    pub fn vertices(self) -> [u32; 3] {
        [self.a, self.b, self.c]
    }

    /// Returns whether `vertex` is one of the corners.
    #[inline]
    pub fn contains(self, vertex: u32) -> bool {
        self.a == vertex || self.b == vertex || self.c == vertex
    }
}

impl From<[u32; 3]> for Face {
    fn from([a, b, c]: [u32; 3]) -> Self {
        Self { a, b, c }
    }
}

/// An indexed triangle mesh.
///
/// Cloning is cheap: all buffers are reference counted and the clone keeps the same [`MeshId`].
#[derive(Debug, Clone)]
pub struct TriangleMesh {
    id: MeshId,
    positions: Arc<[Vec3]>,
    normals: Option<Arc<[Vec3]>>,
    index: Option<Arc<[u32]>>,
}

impl TriangleMesh {
    /// Creates an indexed mesh from positions and triangles.
    ///
    /// Faces are trusted to reference existing vertices. Use [`TriangleMesh::from_buffers`] for
    /// unchecked input.
    pub fn new(positions: Vec<Vec3>, faces: &[Face]) -> Self {
        let index: Vec<u32> = faces.iter().flat_map(|f| f.vertices()).collect();
        Self {
            id: MeshId::next(),
            positions: positions.into(),
            normals: None,
            index: Some(index.into()),
        }
    }

    /// Creates a mesh from raw buffers. `index` may be `None` for triangle soups, which most
    /// operations reject.
    ///
    /// Fails with [`ProbeError::SizeMismatch`] when there is not one normal per position or the
    /// index length is not a multiple of 3, and with [`ProbeError::VertexOutOfRange`] when the
    /// index references a missing vertex.
    pub fn from_buffers(
        positions: Vec<Vec3>,
        normals: Option<Vec<Vec3>>,
        index: Option<Vec<u32>>,
    ) -> Result<Self> {
        if let Some(normals) = &normals {
            if normals.len() != positions.len() {
                return Err(ProbeError::SizeMismatch {
                    expected: positions.len(),
                    actual: normals.len(),
                });
            }
        }
        if let Some(index) = &index {
            check_index(index, positions.len())?;
        }
        Ok(Self {
            id: MeshId::next(),
            positions: positions.into(),
            normals: normals.map(Into::into),
            index: index.map(Into::into),
        })
    }

    /// Attaches vertex normals.
    #[must_use]
    pub fn with_normals(mut self, normals: Vec<Vec3>) -> Self {
        self.normals = Some(normals.into());
        self
    }

    /// Computes area-weighted vertex normals from the triangles and attaches them.
    ///
    /// Unindexed meshes are returned unchanged.
    #[must_use]
    pub fn with_computed_normals(mut self) -> Self {
        let Some(index) = &self.index else {
            return self;
        };
        let mut normals = vec![Vec3::ZERO; self.positions.len()];
        for tri in index.chunks_exact(3) {
            let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
            let (pa, pb, pc) = (self.positions[a], self.positions[b], self.positions[c]);
            // cross product length is twice the area, which is the weighting we want
            let n = (pb - pa).cross(pc - pa);
            normals[a] += n;
            normals[b] += n;
            normals[c] += n;
        }
        for n in &mut normals {
            *n = n.normalize_or_zero();
        }
        self.normals = Some(normals.into());
        self
    }

    /// Replaces the triangle index buffer. Caches built from the previous buffer become stale.
    ///
    /// An invalid index leaves the mesh unchanged.
    pub fn set_index(&mut self, index: Vec<u32>) -> Result<()> {
        check_index(&index, self.positions.len())?;
        self.index = Some(index.into());
        Ok(())
    }

    /// Returns the identity key.
    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Returns the triangle index buffer.
    pub fn index(&self) -> Result<&Arc<[u32]>> {
        self.index.as_ref().ok_or(ProbeError::MissingIndex)
    }

    /// Returns a vertex attribute by name.
    pub fn attribute(&self, attribute: Attribute) -> Result<&Arc<[Vec3]>> {
        match attribute {
            Attribute::Position => Ok(&self.positions),
            Attribute::Normal => self
                .normals
                .as_ref()
                .ok_or(ProbeError::MissingAttribute(attribute.name())),
        }
    }

    /// Returns the vertex positions.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Returns the number of vertices.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Returns the number of triangles, zero for unindexed meshes.
    pub fn triangle_count(&self) -> usize {
        self.index.as_ref().map_or(0, |i| i.len() / 3)
    }
}

fn check_index(index: &[u32], vertex_count: usize) -> Result<()> {
    if index.len() % 3 != 0 {
        return Err(ProbeError::SizeMismatch {
            expected: index.len() / 3 * 3,
            actual: index.len(),
        });
    }
    match index.iter().find(|&&v| v as usize >= vertex_count) {
        Some(&vertex) => Err(ProbeError::VertexOutOfRange {
            vertex,
            vertex_count,
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_triangle() -> TriangleMesh {
        TriangleMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], &[Face::new(0, 1, 2)])
    }

    #[test]
    fn test_unique_ids() {
        let a = single_triangle();
        let b = single_triangle();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.clone().id(), a.id());
    }

    #[test]
    fn test_missing_index() {
        let mesh =
            TriangleMesh::from_buffers(vec![Vec3::ZERO, Vec3::X, Vec3::Y], None, None).unwrap();
        assert!(matches!(mesh.index(), Err(ProbeError::MissingIndex)));
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn test_buffer_sizes_checked() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        assert!(matches!(
            TriangleMesh::from_buffers(positions.clone(), Some(vec![Vec3::Z]), None),
            Err(ProbeError::SizeMismatch {
                expected: 3,
                actual: 1
            })
        ));
        assert!(matches!(
            TriangleMesh::from_buffers(positions.clone(), None, Some(vec![0, 1, 2, 0])),
            Err(ProbeError::SizeMismatch {
                expected: 3,
                actual: 4
            })
        ));
        let normals = Some(vec![Vec3::Z; 3]);
        let mesh = TriangleMesh::from_buffers(positions, normals, Some(vec![0, 1, 2]));
        assert!(mesh.is_ok());
    }

    #[test]
    fn test_missing_normal_attribute() {
        let mesh = single_triangle();
        assert!(mesh.attribute(Attribute::Position).is_ok());
        assert!(matches!(
            mesh.attribute(Attribute::Normal),
            Err(ProbeError::MissingAttribute("normal"))
        ));
    }

    #[test]
    fn test_computed_normals() {
        let mesh = single_triangle().with_computed_normals();
        let normals = mesh.attribute(Attribute::Normal).unwrap();
        for n in normals.iter() {
            assert!((*n - Vec3::Z).length() < 1e-6);
        }
    }

    #[test]
    fn test_set_index_replaces_buffer() {
        let mut mesh = single_triangle();
        let before = Arc::clone(mesh.index().unwrap());
        mesh.set_index(vec![0, 2, 1]).unwrap();
        assert!(!Arc::ptr_eq(&before, mesh.index().unwrap()));
    }

    #[test]
    fn test_out_of_range_index_rejected() {
        let positions = vec![Vec3::ZERO, Vec3::X, Vec3::Y];
        assert!(matches!(
            TriangleMesh::from_buffers(positions, None, Some(vec![0, 1, 3])),
            Err(ProbeError::VertexOutOfRange {
                vertex: 3,
                vertex_count: 3
            })
        ));

        let mut mesh = single_triangle();
        let before = Arc::clone(mesh.index().unwrap());
        assert!(matches!(
            mesh.set_index(vec![0, 1, 7]),
            Err(ProbeError::VertexOutOfRange { vertex: 7, .. })
        ));
        assert!(Arc::ptr_eq(&before, mesh.index().unwrap()));
    }
}
