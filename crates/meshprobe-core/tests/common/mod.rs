//! Shared fixtures for the integration tests.

use meshprobe_core::{Face, TriangleMesh, Vec3};

/// Unit cube with outward winding. Vertex `i` sits at `(i & 1, i >> 1 & 1, i >> 2 & 1)`.
///
/// The face diagonals avoid vertex 0, so its neighbours are exactly the three cube edges.
pub fn unit_cube() -> TriangleMesh {
    let positions = (0..8u32)
        .map(|i| Vec3::new((i & 1) as f32, (i >> 1 & 1) as f32, (i >> 2 & 1) as f32))
        .collect();
    let faces = [
        [0, 2, 1],
        [1, 2, 3],
        [0, 1, 4],
        [1, 5, 4],
        [0, 4, 2],
        [2, 4, 6],
        [4, 5, 7],
        [4, 7, 6],
        [2, 6, 7],
        [2, 7, 3],
        [1, 3, 7],
        [1, 7, 5],
    ]
    .map(Face::from);
    TriangleMesh::new(positions, &faces).with_computed_normals()
}
