//! Curves fitted through point collections.
//!
//! The fitting itself is delegated to a [`CurveFitter`]. This module only keeps the resulting
//! NURBS data per curve node and the control polygon as a [`PointBuffer`].

use std::collections::BTreeMap;

use meshprobe_core::{PointBuffer, Vec3};

use crate::points::{NodeKey, PointCollection};

/// A NURBS curve produced by a [`CurveFitter`].
pub trait FittedCurve: Send + Sync {
    fn degree(&self) -> usize;

    /// Non-decreasing knot vector.
    fn knots(&self) -> Vec<f32>;

    fn control_points(&self) -> Vec<Vec3>;

    fn weights(&self) -> Vec<f32>;
}

/// Curve fitting service.
pub trait CurveFitter {
    /// Fits a curve of `degree` through `points`. Returns `None` when no curve can be fitted.
    fn fit(&self, points: &[Vec3], degree: usize) -> Option<Box<dyn FittedCurve>>;
}

/// Plain NURBS data, usable as a [`FittedCurve`].
#[derive(Debug, Clone, PartialEq)]
pub struct NurbsData {
    pub degree: usize,
    pub knots: Vec<f32>,
    pub control_points: Vec<Vec3>,
    pub weights: Vec<f32>,
}

impl FittedCurve for NurbsData {
    fn degree(&self) -> usize {
        self.degree
    }

    fn knots(&self) -> Vec<f32> {
        self.knots.clone()
    }

    fn control_points(&self) -> Vec<Vec3> {
        self.control_points.clone()
    }

    fn weights(&self) -> Vec<f32> {
        self.weights.clone()
    }
}

/// Fitter that returns the polyline through the points as a degree 1 curve, whatever degree is
/// asked for.
#[derive(Debug, Clone, Copy, Default)]
pub struct PolylineFitter;

impl CurveFitter for PolylineFitter {
    #[allow(clippy::cast_precision_loss)]
    fn fit(&self, points: &[Vec3], _degree: usize) -> Option<Box<dyn FittedCurve>> {
        if points.len() < 2 {
            return None;
        }
        let spans = (points.len() - 1) as f32;
        let mut knots = vec![0.0];
        knots.extend((0..points.len()).map(|i| i as f32 / spans));
        knots.push(1.0);

        Some(Box::new(NurbsData {
            degree: 1,
            knots,
            control_points: points.to_vec(),
            weights: vec![1.0; points.len()],
        }))
    }
}

/// A curve node.
#[derive(Debug, Clone)]
pub struct CurveEntry {
    /// Node of the point collection the curve was fitted through.
    pub points_node: NodeKey,
    pub degree: usize,
    pub knots: Vec<f32>,
    pub weights: Vec<f32>,
    /// Control polygon.
    pub control_points: PointBuffer,
}

/// All curves of a project, keyed by curve node.
#[derive(Debug, Clone)]
pub struct Curves {
    curves: BTreeMap<NodeKey, CurveEntry>,
    degree: usize,
}

impl Default for Curves {
    fn default() -> Self {
        Self::new(3)
    }
}

impl Curves {
    /// Creates an empty set fitting curves of `degree`.
    pub fn new(degree: usize) -> Self {
        Self {
            curves: BTreeMap::new(),
            degree,
        }
    }

    /// Fits the curve `curve_node` through `points` and stores it.
    ///
    /// The control polygon buffer of an existing curve is reused. Returns `None`, leaving any
    /// existing curve untouched, when there are fewer than 2 points or the fitter gives up.
    pub fn update_curve_from_points(
        &mut self,
        curve_node: &str,
        points_node: &str,
        points: &PointCollection,
        fitter: &dyn CurveFitter,
    ) -> Option<&CurveEntry> {
        if points.len() < 2 {
            log::warn!(
                "curve '{curve_node}' needs at least 2 points, got {}",
                points.len()
            );
            return None;
        }
        let Some(curve) = fitter.fit(&points.positions(), self.degree) else {
            log::warn!("no curve could be fitted through '{points_node}'");
            return None;
        };

        let control_points = curve.control_points();
        let entry = self
            .curves
            .entry(curve_node.to_string())
            .or_insert_with(|| CurveEntry {
                points_node: points_node.to_string(),
                degree: 0,
                knots: Vec::new(),
                weights: Vec::new(),
                control_points: PointBuffer::new(3, control_points.len()),
            });

        entry.points_node = points_node.to_string();
        entry.degree = curve.degree();
        entry.knots = curve.knots();
        entry.weights = curve.weights();
        entry.control_points.set_used_count(0);
        entry.control_points.reserve(control_points.len());
        for p in &control_points {
            entry.control_points.add_point(&p.to_array());
        }

        log::debug!(
            "curve '{curve_node}' fitted with {} control points",
            control_points.len()
        );
        Some(entry)
    }

    /// Returns the key of the curve fitted through `points_node`.
    pub fn curve_for_points(&self, points_node: &str) -> Option<&str> {
        self.curves
            .iter()
            .find(|(_, c)| c.points_node == points_node)
            .map(|(k, _)| k.as_str())
    }

    pub fn get(&self, curve_node: &str) -> Option<&CurveEntry> {
        self.curves.get(curve_node)
    }

    pub fn remove(&mut self, curve_node: &str) -> Option<CurveEntry> {
        self.curves.remove(curve_node)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CurveEntry)> {
        self.curves.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.curves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.curves.is_empty()
    }

    pub fn clear(&mut self) {
        self.curves.clear();
    }
}
