//! Boundary between the queries and a bounding volume hierarchy.
//!
//! The queries never build a hierarchy. They implement [`ShapecastVisitor`] and are driven by
//! whatever [`Bvh`] the caller attaches to a surface. [`LinearBvh`] is a two-level reference
//! implementation (one root node, one leaf per triangle) for tests and small meshes.

use std::sync::Arc;

use glam::Vec3;

use crate::error::Result;
use crate::mesh::{Attribute, Face, TriangleMesh};

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Vec3,
    /// Maximum corner.
    pub max: Vec3,
}

impl Aabb {
    /// Creates an AABB from min/max points.
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Creates an empty (inverted) AABB.
    pub fn empty() -> Self {
        Self {
            min: Vec3::splat(f32::MAX),
            max: Vec3::splat(f32::MIN),
        }
    }

    /// Creates an AABB from a triangle.
    pub fn from_triangle([a, b, c]: &[Vec3; 3]) -> Self {
        Self {
            min: a.min(*b).min(*c),
            max: a.max(*b).max(*c),
        }
    }

    /// Returns true if the box contains no point.
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Computes the union of two AABBs.
    #[must_use]
    pub fn union(&self, other: &Aabb) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Returns the center point.
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Returns half the size along each axis.
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Returns the point of the box closest to `point`.
    pub fn clamp_point(&self, point: Vec3) -> Vec3 {
        point.clamp(self.min, self.max)
    }

    /// Returns the eight corners.
    pub fn corners(&self) -> [Vec3; 8] {
        let (min, max) = (self.min, self.max);
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { min.x } else { max.x },
                if i & 2 == 0 { min.y } else { max.y },
                if i & 4 == 0 { min.z } else { max.z },
            )
        })
    }
}

/// A solid sphere.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sphere {
    pub center: Vec3,
    pub radius: f32,
}

impl Sphere {
    /// Creates a sphere.
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Returns whether `point` lies inside or on the sphere.
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Returns whether the sphere and the box share at least one point.
    pub fn intersects_box(&self, bounds: &Aabb) -> bool {
        self.contains_point(bounds.clamp_point(self.center))
    }

    /// Returns whether the sphere and the triangle share at least one point.
    pub fn intersects_triangle(&self, [a, b, c]: &[Vec3; 3]) -> bool {
        self.contains_point(closest_point_on_triangle(self.center, *a, *b, *c))
    }
}

/// Outcome of a box test during traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapecastIntersection {
    /// Skip the node and everything below it.
    NotIntersected,
    /// Descend into the node.
    Intersected,
    /// Accept every triangle below the node without further box tests.
    Contained,
}

/// Callbacks invoked by [`Bvh::shapecast`].
///
/// Callbacks must not start another traversal.
pub trait ShapecastVisitor {
    /// Tests one node's bounds.
    fn intersects_bounds(
        &mut self,
        bounds: &Aabb,
        is_leaf: bool,
        depth: usize,
        node_index: usize,
    ) -> ShapecastIntersection;

    /// Visits one triangle. `contained` is true when an enclosing node reported
    /// [`ShapecastIntersection::Contained`]. Returning true stops the traversal.
    fn intersects_triangle(
        &mut self,
        triangle: &[Vec3; 3],
        triangle_index: usize,
        contained: bool,
    ) -> bool;
}

/// Closest surface point reported by [`Bvh::closest_point_to_point`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPoint {
    pub point: Vec3,
    pub face_index: usize,
    pub distance: f32,
}

/// A bounding volume hierarchy over the triangles of one mesh.
pub trait Bvh: Send + Sync {
    /// Walks the hierarchy, calling back into `visitor`. Returns true if the visitor stopped the
    /// traversal early.
    fn shapecast(&self, visitor: &mut dyn ShapecastVisitor) -> bool;

    /// Returns the surface point nearest to `point`, or `None` for an empty mesh.
    fn closest_point_to_point(&self, point: Vec3) -> Option<ClosestPoint>;
}

/// Reference hierarchy: one root node over the whole mesh with one leaf per triangle.
///
/// Node 0 is the root, node `t + 1` is the leaf of triangle `t`.
#[derive(Debug, Clone)]
pub struct LinearBvh {
    positions: Arc<[Vec3]>,
    index: Arc<[u32]>,
    root: Aabb,
    leaves: Vec<Aabb>,
}

impl LinearBvh {
    /// Builds the hierarchy. Fails for unindexed meshes.
    pub fn new(mesh: &TriangleMesh) -> Result<Self> {
        let index = Arc::clone(mesh.index()?);
        let positions = Arc::clone(mesh.attribute(Attribute::Position)?);
        let leaves: Vec<Aabb> = (0..index.len() / 3)
            .map(|t| Aabb::from_triangle(&corners(&positions, &index, t)))
            .collect();
        let root = leaves.iter().fold(Aabb::empty(), |acc, b| acc.union(b));
        Ok(Self {
            positions,
            index,
            root,
            leaves,
        })
    }

    /// Returns the bounds of the root node.
    pub fn bounds(&self) -> Aabb {
        self.root
    }

    fn visit_all(&self, visitor: &mut dyn ShapecastVisitor, contained: bool) -> bool {
        for t in 0..self.leaves.len() {
            let tri = corners(&self.positions, &self.index, t);
            if visitor.intersects_triangle(&tri, t, contained) {
                return true;
            }
        }
        false
    }
}

impl Bvh for LinearBvh {
    fn shapecast(&self, visitor: &mut dyn ShapecastVisitor) -> bool {
        if self.leaves.is_empty() {
            return false;
        }

        match visitor.intersects_bounds(&self.root, false, 0, 0) {
            ShapecastIntersection::NotIntersected => false,
            ShapecastIntersection::Contained => self.visit_all(visitor, true),
            ShapecastIntersection::Intersected => {
                for (t, leaf) in self.leaves.iter().enumerate() {
                    let contained = match visitor.intersects_bounds(leaf, true, 1, t + 1) {
                        ShapecastIntersection::NotIntersected => continue,
                        ShapecastIntersection::Intersected => false,
                        ShapecastIntersection::Contained => true,
                    };
                    let tri = corners(&self.positions, &self.index, t);
                    if visitor.intersects_triangle(&tri, t, contained) {
                        return true;
                    }
                }
                false
            }
        }
    }

    fn closest_point_to_point(&self, point: Vec3) -> Option<ClosestPoint> {
        (0..self.leaves.len())
            .map(|t| {
                let [a, b, c] = corners(&self.positions, &self.index, t);
                let closest = closest_point_on_triangle(point, a, b, c);
                ClosestPoint {
                    point: closest,
                    face_index: t,
                    distance: closest.distance(point),
                }
            })
            .min_by(|x, y| x.distance.total_cmp(&y.distance))
    }
}

fn corners(positions: &[Vec3], index: &[u32], face_index: usize) -> [Vec3; 3] {
    Face::from_index(index, face_index)
        .vertices()
        .map(|v| positions[v as usize])
}

/// Computes the point of triangle `abc` closest to `p` (Voronoi region walk).
pub fn closest_point_on_triangle(p: Vec3, a: Vec3, b: Vec3, c: Vec3) -> Vec3 {
    let ab = b - a;
    let ac = c - a;
    let ap = p - a;

    let d1 = ab.dot(ap);
    let d2 = ac.dot(ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return a;
    }

    let bp = p - b;
    let d3 = ab.dot(bp);
    let d4 = ac.dot(bp);
    if d3 >= 0.0 && d4 <= d3 {
        return b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        return a + ab * (d1 / (d1 - d3));
    }

    let cp = p - c;
    let d5 = ab.dot(cp);
    let d6 = ac.dot(cp);
    if d6 >= 0.0 && d5 <= d6 {
        return c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        return a + ac * (d2 / (d2 - d6));
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let denom = 1.0 / (va + vb + vc);
    a + ab * (vb * denom) + ac * (vc * denom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_corners() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::ONE);
        let corners = bounds.corners();
        assert_eq!(corners[0], Vec3::ZERO);
        assert_eq!(corners[7], Vec3::ONE);
        assert_eq!(corners[1], Vec3::X);
        assert!(!bounds.is_empty());
        assert!(Aabb::empty().is_empty());
    }

    #[test]
    fn test_sphere_box() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(Sphere::new(Vec3::new(2.0, 0.5, 0.5), 1.0).intersects_box(&bounds));
        assert!(!Sphere::new(Vec3::new(2.5, 0.5, 0.5), 1.0).intersects_box(&bounds));
        assert!(Sphere::new(Vec3::splat(0.5), 0.1).intersects_box(&bounds));
    }

    #[test]
    fn test_sphere_triangle() {
        let triangle = [Vec3::X, Vec3::Y, Vec3::new(1.0, 1.0, 0.0)];
        // the bounds of the triangle contain the center, the triangle does not come close
        assert!(Sphere::new(Vec3::ZERO, 0.5).intersects_box(&Aabb::from_triangle(&triangle)));
        assert!(!Sphere::new(Vec3::ZERO, 0.5).intersects_triangle(&triangle));
        assert!(Sphere::new(Vec3::ZERO, 0.75).intersects_triangle(&triangle));
    }

    #[test]
    fn test_closest_point_on_triangle() {
        let (a, b, c) = (Vec3::ZERO, Vec3::X, Vec3::Y);
        assert_eq!(
            closest_point_on_triangle(Vec3::new(-1.0, -1.0, 0.0), a, b, c),
            a
        );
        assert_eq!(
            closest_point_on_triangle(Vec3::new(0.25, 0.25, 3.0), a, b, c),
            Vec3::new(0.25, 0.25, 0.0)
        );
        let edge = closest_point_on_triangle(Vec3::new(0.5, -2.0, 0.0), a, b, c);
        assert!((edge - Vec3::new(0.5, 0.0, 0.0)).length() < 1e-6);
    }

    struct CountingVisitor {
        boxes: usize,
        triangles: Vec<(usize, bool)>,
        answer: ShapecastIntersection,
    }

    impl ShapecastVisitor for CountingVisitor {
        fn intersects_bounds(
            &mut self,
            _: &Aabb,
            _: bool,
            _: usize,
            _: usize,
        ) -> ShapecastIntersection {
            self.boxes += 1;
            self.answer
        }

        fn intersects_triangle(&mut self, _: &[Vec3; 3], index: usize, contained: bool) -> bool {
            self.triangles.push((index, contained));
            false
        }
    }

    fn two_triangles() -> TriangleMesh {
        TriangleMesh::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::new(5.0, 5.0, 0.0)],
            &[Face::new(0, 1, 2), Face::new(1, 3, 2)],
        )
    }

    #[test]
    fn test_linear_bvh_contained_root() {
        let bvh = LinearBvh::new(&two_triangles()).unwrap();
        let mut visitor = CountingVisitor {
            boxes: 0,
            triangles: Vec::new(),
            answer: ShapecastIntersection::Contained,
        };
        assert!(!bvh.shapecast(&mut visitor));
        assert_eq!(visitor.boxes, 1);
        assert_eq!(visitor.triangles, vec![(0, true), (1, true)]);
    }

    #[test]
    fn test_linear_bvh_descends_into_leaves() {
        let bvh = LinearBvh::new(&two_triangles()).unwrap();
        let mut visitor = CountingVisitor {
            boxes: 0,
            triangles: Vec::new(),
            answer: ShapecastIntersection::Intersected,
        };
        bvh.shapecast(&mut visitor);
        assert_eq!(visitor.boxes, 3);
        assert_eq!(visitor.triangles, vec![(0, false), (1, false)]);
    }

    #[test]
    fn test_linear_bvh_closest_point() {
        let bvh = LinearBvh::new(&two_triangles()).unwrap();
        let hit = bvh
            .closest_point_to_point(Vec3::new(0.1, 0.1, 1.0))
            .unwrap();
        assert_eq!(hit.face_index, 0);
        assert!((hit.point - Vec3::new(0.1, 0.1, 0.0)).length() < 1e-6);
        assert!((hit.distance - 1.0).abs() < 1e-6);
    }
}
