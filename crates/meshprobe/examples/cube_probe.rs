//! Probes a unit cube with every session tool.
//!
//! Run with `RUST_LOG=debug cargo run --example cube_probe` to see the query logs.

use std::sync::Arc;

use meshprobe::*;

fn unit_cube() -> TriangleMesh {
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

fn main() -> Result<()> {
    init_logging();

    let mesh = unit_cube();
    let bvh = LinearBvh::new(&mesh)?;

    let mut session = Session::default();
    let id = session.register_surface(mesh);
    session.set_bvh(id, Arc::new(bvh))?;

    // Horizontal cut through the middle of the cube
    if let Some(cut) = session.cross_section(id, Plane::new(Vec3::splat(0.5), Vec3::Z)) {
        let perimeter: f32 = cut.segment_pairs().map(|[a, b]| a.distance(b)).sum();
        println!(
            "cross-section: {} segments, perimeter {perimeter:.3}",
            cut.segment_count()
        );
    }

    // Select around two corners and accumulate both selections
    for corner in [Vec3::ZERO, Vec3::ONE] {
        let selection = SphereSelection::new(corner, 0.5).accumulating();
        if let Some(results) = session.select_sphere(id, selection)? {
            println!(
                "sphere at {corner}: {} vertices, {} triangles",
                results.indices.len(),
                results.triangle_count()
            );
        }
    }
    print!("{}", session.export_selection_pcd(id)?);

    if let Some(frame) = session.pick(id, Vec3::new(0.9, 0.8, 1.2))? {
        println!(
            "picked vertex {} at {}, normal {}",
            frame.vertex, frame.position, frame.normal
        );
    }

    // Annotate the top face and fit a curve through the points
    session.points_mut().create_for("top");
    for p in [
        Vec3::new(0.2, 0.2, 1.0),
        Vec3::new(0.8, 0.2, 1.0),
        Vec3::new(0.8, 0.8, 1.0),
    ] {
        session.points_mut().add_point("top", p)?;
    }
    if let Some(curve) = session.fit_curve("top curve", "top", &PolylineFitter) {
        println!(
            "curve: degree {}, {} control points",
            curve.degree,
            curve.control_points.len()
        );
    }

    println!("{}", session.save_project()?);
    Ok(())
}
