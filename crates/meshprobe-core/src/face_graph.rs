//! Vertex to face incidence.
//!
//! [`FaceGraph`] records, for every vertex, the triangles that reference it. Neighbour queries
//! walk those triangles through the shared index buffer instead of storing an edge list.

use std::sync::Arc;

use crate::mesh::Face;

/// An incident face yielded by [`FaceGraph::adjacent_faces`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexedFace {
    pub a: u32,
    pub b: u32,
    pub c: u32,
    pub face_index: usize,
}

impl IndexedFace {
    /// Returns the vertex ids.
    pub fn face(&self) -> Face {
        Face::new(self.a, self.b, self.c)
    }
}

/// Vertex to incident-triangle index.
#[derive(Debug, Clone)]
pub struct FaceGraph {
    vertex_to_faces: Vec<Vec<usize>>,
    index: Arc<[u32]>,
}

impl FaceGraph {
    /// Builds the index in a single pass over `faces`.
    ///
    /// The n-th face yielded gets face id `n`, so `faces` must traverse the triangles of
    /// `index` in order. Faces referencing vertices at or beyond `vertex_count` grow the table.
    pub fn build(
        faces: impl IntoIterator<Item = Face>,
        vertex_count: usize,
        index: Arc<[u32]>,
    ) -> Self {
        let mut vertex_to_faces: Vec<Vec<usize>> = vec![Vec::new(); vertex_count];

        for (face_index, face) in faces.into_iter().enumerate() {
            for v in face.vertices() {
                let v = v as usize;
                if v >= vertex_to_faces.len() {
                    vertex_to_faces.resize_with(v + 1, Vec::new);
                }
                vertex_to_faces[v].push(face_index);
            }
        }

        Self {
            vertex_to_faces,
            index,
        }
    }

    /// Returns the number of vertex slots.
    pub fn vertex_count(&self) -> usize {
        self.vertex_to_faces.len()
    }

    /// Returns the index buffer the graph walks.
    pub fn index(&self) -> &Arc<[u32]> {
        &self.index
    }

    /// Returns the ids of the faces incident to `vertex`, in recording order.
    pub fn faces_of(&self, vertex: u32) -> &[usize] {
        self.vertex_to_faces
            .get(vertex as usize)
            .map_or(&[][..], Vec::as_slice)
    }

    /// Returns the distinct vertices sharing a triangle with `vertex`.
    ///
    /// Order is face-list order, then winding order within each face. The iterator is consumed
    /// by traversal; call again for a second pass.
    pub fn adjacent_indices(&self, vertex: u32) -> AdjacentIndices<'_> {
        AdjacentIndices {
            index: &self.index[..],
            faces: self.faces_of(vertex),
            from: vertex,
            face: 0,
            corner: 0,
            // valence is small on scanned surfaces
            seen: Vec::with_capacity(8),
        }
    }

    /// Returns the faces incident to `vertex`, in face-list order.
    pub fn adjacent_faces(&self, vertex: u32) -> impl Iterator<Item = IndexedFace> + '_ {
        self.faces_of(vertex).iter().map(move |&face_index| {
            let Face { a, b, c } = Face::from_index(&self.index, face_index);
            IndexedFace {
                a,
                b,
                c,
                face_index,
            }
        })
    }

    /// Returns the first recorded face incident to `vertex`.
    pub fn first_face_with_vertex(&self, vertex: u32) -> Option<usize> {
        self.faces_of(vertex).first().copied()
    }
}

/// Iterator returned by [`FaceGraph::adjacent_indices`].
pub struct AdjacentIndices<'a> {
    index: &'a [u32],
    faces: &'a [usize],
    from: u32,
    face: usize,
    corner: usize,
    seen: Vec<u32>,
}

impl Iterator for AdjacentIndices<'_> {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        while self.face < self.faces.len() {
            let vertex = self.index[self.faces[self.face] * 3 + self.corner];
            self.corner += 1;
            if self.corner == 3 {
                self.corner = 0;
                self.face += 1;
            }

            if vertex != self.from && !self.seen.contains(&vertex) {
                self.seen.push(vertex);
                return Some(vertex);
            }
        }
        None
    }
}
