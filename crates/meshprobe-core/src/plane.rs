//! Cutting planes for cross-section queries.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::shapecast::Aabb;

/// An oriented plane defined by a point (origin) and a unit normal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Plane {
    /// A point on the plane.
    origin: Vec3,
    /// Unit normal direction.
    normal: Vec3,
}

impl Plane {
    /// Creates a plane through `origin` with the given normal. The normal is normalized.
    pub fn new(origin: Vec3, normal: Vec3) -> Self {
        Self {
            origin,
            normal: normal.normalize(),
        }
    }

    /// Creates the plane through three points, oriented by their winding.
    ///
    /// Returns `None` when the points are collinear.
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Option<Self> {
        let normal = (b - a).cross(c - a).try_normalize()?;
        Some(Self { origin: a, normal })
    }

    /// Returns the origin point of the plane.
    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Returns the normal direction of the plane.
    pub fn normal(&self) -> Vec3 {
        self.normal
    }

    /// Returns the signed distance from a point to the plane.
    ///
    /// Positive values are on the normal side.
    pub fn signed_distance(&self, point: Vec3) -> f32 {
        (point - self.origin).dot(self.normal)
    }

    /// Returns whether the plane passes through the box.
    pub fn intersects_box(&self, bounds: &Aabb) -> bool {
        let center = bounds.center();
        let half = bounds.half_extents();
        let radius = half.dot(self.normal.abs());
        self.signed_distance(center).abs() <= radius
    }

    /// Intersects the segment `start..=end` with the plane.
    ///
    /// A segment lying in the plane reports its start point.
    pub fn intersect_segment(&self, start: Vec3, end: Vec3) -> Option<Vec3> {
        let direction = end - start;
        let denominator = self.normal.dot(direction);
        let start_distance = self.signed_distance(start);

        if denominator == 0.0 {
            return (start_distance == 0.0).then_some(start);
        }

        let t = -start_distance / denominator;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some(start + direction * t)
    }
}

impl Default for Plane {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plane_creation() {
        let plane = Plane::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(plane.origin(), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(plane.normal(), Vec3::X);
    }

    #[test]
    fn test_from_points() {
        let plane = Plane::from_points(Vec3::ZERO, Vec3::X, Vec3::Y).unwrap();
        assert_eq!(plane.normal(), Vec3::Z);
        assert!(Plane::from_points(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());
    }

    #[test]
    fn test_signed_distance() {
        let plane = Plane::new(Vec3::ZERO, Vec3::Y);

        // Point above the plane (positive Y)
        assert!(plane.signed_distance(Vec3::new(0.0, 1.0, 0.0)) > 0.0);

        // Point below the plane (negative Y)
        assert!(plane.signed_distance(Vec3::new(0.0, -1.0, 0.0)) < 0.0);

        // Point on the plane
        assert!((plane.signed_distance(Vec3::new(1.0, 0.0, 1.0))).abs() < 1e-6);
    }

    #[test]
    fn test_intersects_box() {
        let bounds = Aabb::new(Vec3::ZERO, Vec3::ONE);
        assert!(Plane::new(Vec3::splat(0.5), Vec3::X).intersects_box(&bounds));
        assert!(Plane::new(Vec3::ONE, Vec3::ONE).intersects_box(&bounds));
        assert!(!Plane::new(Vec3::new(2.0, 0.0, 0.0), Vec3::X).intersects_box(&bounds));
    }

    #[test]
    fn test_intersect_segment() {
        let plane = Plane::new(Vec3::new(1.0, 0.0, 0.0), Vec3::X);
        let hit = plane.intersect_segment(Vec3::ZERO, Vec3::new(2.0, 2.0, 0.0));
        assert_eq!(hit, Some(Vec3::new(1.0, 1.0, 0.0)));

        assert_eq!(plane.intersect_segment(Vec3::ZERO, Vec3::Y), None);
        assert_eq!(
            plane.intersect_segment(Vec3::new(1.0, 0.0, 0.0), Vec3::new(1.0, 1.0, 0.0)),
            Some(Vec3::new(1.0, 0.0, 0.0))
        );
    }
}
