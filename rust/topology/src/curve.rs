// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curve geometry carried by edges.
//!
//! An edge is bounded by two vertices; the curve describes the path between
//! them. Lines carry no extra data because the vertices define them
//! completely. Everything else can be sampled into a polyline for area and
//! intersection queries.

use std::f64::consts::FRAC_PI_2;

use nalgebra::{Point3, Vector3};

/// Closed classification of edge geometry.
///
/// Wire repair only ever asks whether an edge is straight; the other variants
/// exist so that reports and callers can tell curves apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CurveKind {
    Linear,
    Circular,
    Elliptical,
    Spline,
}

impl CurveKind {
    /// Returns `true` for straight edges, the only kind whose end points may
    /// be moved without changing the curve definition.
    #[inline]
    pub fn is_linear(self) -> bool {
        matches!(self, CurveKind::Linear)
    }

    /// Returns the kind name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CurveKind::Linear => "Linear",
            CurveKind::Circular => "Circular",
            CurveKind::Elliptical => "Elliptical",
            CurveKind::Spline => "Spline",
        }
    }
}

impl std::fmt::Display for CurveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A bounded arc on a circle or an ellipse.
///
/// The arc runs from `start_angle` over the signed `sweep`; a negative sweep
/// traverses the conic clockwise with respect to `x_axis × y_axis`.
#[derive(Debug, Clone, PartialEq)]
pub struct ConicArc {
    pub center: Point3<f64>,
    /// Unit direction of the first semi axis.
    pub x_axis: Vector3<f64>,
    /// Unit direction of the second semi axis.
    pub y_axis: Vector3<f64>,
    pub semi_axis1: f64,
    pub semi_axis2: f64,
    pub start_angle: f64,
    pub sweep: f64,
}

impl ConicArc {
    /// Creates a circular arc.
    pub fn circle(
        center: Point3<f64>,
        x_axis: Vector3<f64>,
        y_axis: Vector3<f64>,
        radius: f64,
        start_angle: f64,
        sweep: f64,
    ) -> Self {
        Self {
            center,
            x_axis,
            y_axis,
            semi_axis1: radius,
            semi_axis2: radius,
            start_angle,
            sweep,
        }
    }

    /// Evaluates the conic at the given angle.
    pub fn point_at(&self, angle: f64) -> Point3<f64> {
        self.center
            + self.x_axis * (self.semi_axis1 * angle.cos())
            + self.y_axis * (self.semi_axis2 * angle.sin())
    }

    pub fn start_point(&self) -> Point3<f64> {
        self.point_at(self.start_angle)
    }

    pub fn end_point(&self) -> Point3<f64> {
        self.point_at(self.start_angle + self.sweep)
    }

    /// Returns the same arc traversed in the opposite direction.
    pub fn reversed(&self) -> Self {
        Self {
            start_angle: self.start_angle + self.sweep,
            sweep: -self.sweep,
            ..self.clone()
        }
    }

    /// Approximate arc length from a fine sampling.
    pub fn length(&self) -> f64 {
        let points = self.sample();
        points.windows(2).map(|w| (w[1] - w[0]).norm()).sum()
    }

    /// Samples the arc with ~8 segments per quarter turn, minimum 2.
    pub fn sample(&self) -> Vec<Point3<f64>> {
        let segments = ((self.sweep.abs() / FRAC_PI_2 * 8.0).ceil() as usize).max(2);
        (0..=segments)
            .map(|i| {
                let t = i as f64 / segments as f64;
                self.point_at(self.start_angle + t * self.sweep)
            })
            .collect()
    }
}

/// Geometry of an edge between its two vertices.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeCurve {
    /// Straight segment between the edge vertices.
    Line,
    Circle(ConicArc),
    Ellipse(ConicArc),
    /// Bézier curve given by its control polygon (at least two points).
    Spline(Vec<Point3<f64>>),
}

impl EdgeCurve {
    pub fn kind(&self) -> CurveKind {
        match self {
            EdgeCurve::Line => CurveKind::Linear,
            EdgeCurve::Circle(_) => CurveKind::Circular,
            EdgeCurve::Ellipse(_) => CurveKind::Elliptical,
            EdgeCurve::Spline(_) => CurveKind::Spline,
        }
    }

    /// Natural start and end points of the curve, or `None` for lines whose
    /// geometry comes entirely from the vertices.
    pub fn endpoints(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        match self {
            EdgeCurve::Line => None,
            EdgeCurve::Circle(arc) | EdgeCurve::Ellipse(arc) => {
                Some((arc.start_point(), arc.end_point()))
            }
            EdgeCurve::Spline(points) => {
                Some((*points.first()?, *points.last()?))
            }
        }
    }

    /// Returns the same curve traversed in the opposite direction.
    pub fn reversed(&self) -> EdgeCurve {
        match self {
            EdgeCurve::Line => EdgeCurve::Line,
            EdgeCurve::Circle(arc) => EdgeCurve::Circle(arc.reversed()),
            EdgeCurve::Ellipse(arc) => EdgeCurve::Ellipse(arc.reversed()),
            EdgeCurve::Spline(points) => EdgeCurve::Spline(points.iter().rev().copied().collect()),
        }
    }

    /// Samples the curve as a polyline running from `start` to `end`.
    ///
    /// The first and last sample are replaced by the vertex positions so that
    /// a chain of sampled edges stays connected even when a vertex sits within
    /// tolerance of, rather than exactly on, its curve.
    pub fn sample(&self, start: Point3<f64>, end: Point3<f64>) -> Vec<Point3<f64>> {
        let mut points = match self {
            EdgeCurve::Line => return vec![start, end],
            EdgeCurve::Circle(arc) | EdgeCurve::Ellipse(arc) => arc.sample(),
            EdgeCurve::Spline(control) => {
                let segments = 16 * control.len().saturating_sub(1).max(1);
                (0..=segments)
                    .map(|i| bezier_point(control, i as f64 / segments as f64))
                    .collect()
            }
        };
        if points.len() < 2 {
            return vec![start, end];
        }
        points[0] = start;
        let last = points.len() - 1;
        points[last] = end;
        points
    }
}

/// Evaluates a Bézier curve with de Casteljau's algorithm.
pub fn bezier_point(control: &[Point3<f64>], t: f64) -> Point3<f64> {
    let mut work: Vec<Vector3<f64>> = control.iter().map(|p| p.coords).collect();
    let n = work.len();
    for level in 1..n {
        for i in 0..n - level {
            work[i] = work[i] * (1.0 - t) + work[i + 1] * t;
        }
    }
    work.first()
        .map(|v| Point3::from(*v))
        .unwrap_or_else(Point3::origin)
}
