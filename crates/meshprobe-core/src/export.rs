//! Point cloud export.

use std::collections::HashSet;
use std::fmt::Write;

use crate::error::Result;
use crate::mesh::{Attribute, TriangleMesh};
use crate::rounding::to_fixed;
use crate::triangles::IndexedTriangleSequence;

/// Writes the vertices referenced by `triangles` as an ASCII PCD v0.7 point cloud.
///
/// Every vertex appears once, in the order it is first referenced. Coordinates are written with
/// `precision` decimal places.
pub fn pcd_from_triangles(
    mesh: &TriangleMesh,
    triangles: &IndexedTriangleSequence,
    precision: u32,
) -> Result<String> {
    let positions = mesh.attribute(Attribute::Position)?;

    let mut seen = HashSet::new();
    let vertices: Vec<u32> = triangles
        .iter()
        .flat_map(|face| face.vertices())
        .filter(|v| seen.insert(*v))
        .collect();

    let count = vertices.len();
    let mut out = format!(
        "VERSION .7\n\
         FIELDS x y z\n\
         SIZE 4 4 4\n\
         TYPE F F F\n\
         COUNT 1 1 1\n\
         WIDTH {count}\n\
         HEIGHT 1\n\
         VIEWPOINT 0 0 0 1 0 0 0\n\
         POINTS {count}\n\
         DATA ascii\n"
    );

    for v in vertices {
        let p = positions[v as usize];
        // writing into a String cannot fail
        let _ = writeln!(
            out,
            "{} {} {}",
            to_fixed(f64::from(p.x), precision),
            to_fixed(f64::from(p.y), precision),
            to_fixed(f64::from(p.z), precision)
        );
    }

    log::debug!("exported {count} points from mesh {}", mesh.id());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::mesh::Face;

    #[test]
    fn test_pcd_unique_vertices_in_first_seen_order() {
        let mesh = TriangleMesh::new(
            vec![
                Vec3::ZERO,
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.5, 0.0),
                Vec3::new(1.0, 1.0, -0.25),
            ],
            &[Face::new(0, 1, 2), Face::new(2, 1, 3)],
        );
        let triangles = IndexedTriangleSequence::from_mesh(&mesh)
            .unwrap()
            .with_subset([1, 0]);
        let pcd = pcd_from_triangles(&mesh, &triangles, 2).unwrap();

        let lines: Vec<&str> = pcd.lines().collect();
        assert_eq!(lines[0], "VERSION .7");
        assert_eq!(lines[5], "WIDTH 4");
        assert_eq!(lines[8], "POINTS 4");
        assert_eq!(lines[9], "DATA ascii");
        assert_eq!(
            &lines[10..],
            &[
                "0.00 1.50 0.00",
                "1.00 0.00 0.00",
                "1.00 1.00 -0.25",
                "0.00 0.00 0.00"
            ]
        );
    }

    #[test]
    fn test_pcd_empty_selection() {
        let mesh = TriangleMesh::new(vec![Vec3::ZERO, Vec3::X, Vec3::Y], &[Face::new(0, 1, 2)]);
        let triangles = IndexedTriangleSequence::from_mesh(&mesh)
            .unwrap()
            .with_subset(Vec::new());
        let pcd = pcd_from_triangles(&mesh, &triangles, 3).unwrap();
        assert!(pcd.ends_with("POINTS 0\nDATA ascii\n"));
        assert_eq!(pcd.lines().count(), 10);
    }
}
