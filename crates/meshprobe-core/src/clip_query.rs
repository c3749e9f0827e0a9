//! Plane cross-section query.
//!
//! [`ClipQuery`] collects the segments where a plane cuts the triangles of a mesh. Each
//! consecutive pair of points in [`ClipQuery::segments`] is one segment. The segments are not
//! ordered or stitched into loops.

use glam::Vec3;

use crate::options::Options;
use crate::plane::Plane;
use crate::points::PointBuffer;
use crate::shapecast::{Aabb, Bvh, ShapecastIntersection, ShapecastVisitor};

/// Cross-section query driven by a [`Bvh`] traversal.
#[derive(Debug, Clone)]
pub struct ClipQuery {
    plane: Plane,
    segments: PointBuffer,
    duplicate_tolerance: f32,
}

impl ClipQuery {
    /// Creates a query with the segment capacity and tolerance from `options`.
    pub fn new(options: &Options) -> Self {
        Self {
            plane: Plane::default(),
            segments: PointBuffer::new(3, options.clip_reserve_points),
            duplicate_tolerance: options.duplicate_tolerance,
        }
    }

    /// Sets the cutting plane and clears previous segments.
    pub fn set_query_params(&mut self, plane: Plane) {
        self.plane = plane;
        self.segments.set_used_count(0);
    }

    /// Cuts every triangle the hierarchy reports against `plane`.
    pub fn run(&mut self, bvh: &dyn Bvh, plane: Plane) -> &PointBuffer {
        self.set_query_params(plane);
        bvh.shapecast(self);
        log::debug!("cross-section produced {} segments", self.segment_count());
        &self.segments
    }

    /// Returns the current plane.
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// Returns the segment endpoints.
    pub fn segments(&self) -> &PointBuffer {
        &self.segments
    }

    /// Returns the number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len() / 2
    }

    /// Iterates over the segments as endpoint pairs.
    pub fn segment_pairs(&self) -> impl Iterator<Item = [Vec3; 2]> + '_ {
        self.segments
            .view()
            .chunks_exact(6)
            .map(|s| [Vec3::from_slice(&s[..3]), Vec3::from_slice(&s[3..])])
    }

    fn same_point(&self, a: Vec3, b: Vec3) -> bool {
        a.distance(b) <= self.duplicate_tolerance
    }

    /// Reduces three hits to two, assuming they start at `start`.
    fn collapse_triple(&mut self, start: usize) {
        let p1 = self.segments.vec3_at(start);
        let p2 = self.segments.vec3_at(start + 1);
        let p3 = self.segments.vec3_at(start + 2);

        if self.same_point(p3, p1) || self.same_point(p3, p2) {
            // last point repeats one of the others
        } else if self.same_point(p1, p2) {
            self.segments.set_point_at(start + 1, &p3.to_array());
        } else {
            log::trace!("no duplicate among three plane hits, merging the first two");
            let merged = (p1 + p2) * 0.5;
            self.segments.set_point_at(start, &merged.to_array());
            self.segments.set_point_at(start + 1, &p3.to_array());
        }
        self.segments.set_used_count(start + 2);
    }
}

impl Default for ClipQuery {
    fn default() -> Self {
        Self::new(&Options::default())
    }
}

impl ShapecastVisitor for ClipQuery {
    fn intersects_bounds(
        &mut self,
        bounds: &Aabb,
        _is_leaf: bool,
        _depth: usize,
        _node_index: usize,
    ) -> ShapecastIntersection {
        if self.plane.intersects_box(bounds) {
            ShapecastIntersection::Intersected
        } else {
            ShapecastIntersection::NotIntersected
        }
    }

    fn intersects_triangle(
        &mut self,
        triangle: &[Vec3; 3],
        _triangle_index: usize,
        _contained: bool,
    ) -> bool {
        let start = self.segments.len();
        let [a, b, c] = *triangle;
        let mut count = 0;

        for (from, to) in [(a, b), (b, c), (c, a)] {
            if let Some(hit) = self.plane.intersect_segment(from, to) {
                self.segments.add_point(&hit.to_array());
                count += 1;
            }
        }

        // a plane through one vertex and the opposite edge hits three times
        if count == 3 {
            self.collapse_triple(start);
            count = 2;
        }

        if count != 2 {
            self.segments.set_used_count(start);
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{Face, TriangleMesh};
    use crate::shapecast::LinearBvh;

    fn cut(triangle: [Vec3; 3], plane: Plane) -> ClipQuery {
        let mut query = ClipQuery::default();
        query.set_query_params(plane);
        query.intersects_triangle(&triangle, 0, false);
        query
    }

    #[test]
    fn test_generic_cut() {
        let query = cut(
            [
                Vec3::ZERO,
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            Plane::new(Vec3::X, Vec3::X),
        );
        let segments: Vec<[Vec3; 2]> = query.segment_pairs().collect();
        assert_eq!(
            segments,
            vec![[Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0)]]
        );
    }

    #[test]
    fn test_miss_adds_nothing() {
        let query = cut(
            [Vec3::ZERO, Vec3::X, Vec3::Y],
            Plane::new(Vec3::new(5.0, 0.0, 0.0), Vec3::X),
        );
        assert!(query.segments().is_empty());
    }

    #[test]
    fn test_miss_keeps_previous_segments() {
        let mut query = cut(
            [
                Vec3::ZERO,
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            Plane::new(Vec3::X, Vec3::X),
        );
        query.intersects_triangle(
            &[
                Vec3::new(3.0, 0.0, 0.0),
                Vec3::new(4.0, 0.0, 0.0),
                Vec3::new(3.0, 1.0, 0.0),
            ],
            1,
            false,
        );
        assert_eq!(query.segments().len(), 2);
    }

    #[test]
    fn test_vertex_touch_stays_paired() {
        // plane x = 1 only touches corner b
        let query = cut([Vec3::ZERO, Vec3::X, Vec3::Y], Plane::new(Vec3::X, Vec3::X));
        assert_eq!(query.segments().len() % 2, 0);
        for [p, q] in query.segment_pairs() {
            assert_eq!(p, Vec3::X);
            assert_eq!(q, Vec3::X);
        }
    }

    #[test]
    fn test_vertex_and_opposite_edge() {
        // plane x = 0 passes through vertex a and crosses edge bc
        let query = cut(
            [
                Vec3::ZERO,
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(-1.0, 1.0, 0.0),
            ],
            Plane::new(Vec3::ZERO, Vec3::X),
        );
        let segments: Vec<[Vec3; 2]> = query.segment_pairs().collect();
        assert_eq!(segments.len(), 1);
        let [p, q] = segments[0];
        assert!(p.distance(Vec3::ZERO) < 1e-6);
        assert!(q.distance(Vec3::new(0.0, 1.0, 0.0)) < 1e-6);
    }

    #[test]
    fn test_edge_in_plane() {
        let query = cut(
            [Vec3::ZERO, Vec3::Y, Vec3::X],
            Plane::new(Vec3::ZERO, Vec3::X),
        );
        let segments: Vec<[Vec3; 2]> = query.segment_pairs().collect();
        assert_eq!(segments, vec![[Vec3::ZERO, Vec3::Y]]);
    }

    #[test]
    fn test_run_resets_between_queries() {
        let mesh = TriangleMesh::new(
            vec![
                Vec3::ZERO,
                Vec3::new(2.0, 0.0, 0.0),
                Vec3::new(0.0, 2.0, 0.0),
            ],
            &[Face::new(0, 1, 2)],
        );
        let bvh = LinearBvh::new(&mesh).unwrap();
        let mut query = ClipQuery::default();

        assert_eq!(query.run(&bvh, Plane::new(Vec3::X, Vec3::X)).len(), 2);
        assert_eq!(query.run(&bvh, Plane::new(Vec3::X, Vec3::X)).len(), 2);
        assert_eq!(
            query.run(&bvh, Plane::new(Vec3::splat(5.0), Vec3::X)).len(),
            0
        );
    }
}
