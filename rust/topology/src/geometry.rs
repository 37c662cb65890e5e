// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometric queries on topology entities.
//!
//! Computes lengths, polyline approximations, normals and enclosed areas using
//! standard computational geometry algorithms (no external kernel required).

use nalgebra::{Point3, Vector3};

use crate::arena::TopologyArena;
use crate::keys::*;

impl TopologyArena {
    /// Returns the 3D position of a vertex as a nalgebra Point3.
    pub fn vertex_point(&self, key: VertexKey) -> Option<Point3<f64>> {
        self.vertices.get(key).map(|v| v.point)
    }

    /// Returns the start and end positions of an edge.
    pub fn edge_endpoints(&self, key: EdgeKey) -> Option<(Point3<f64>, Point3<f64>)> {
        let edge = self.edges.get(key)?;
        Some((self.vertex_point(edge.start)?, self.vertex_point(edge.end)?))
    }

    /// Approximates an edge by a polyline from its start to its end vertex.
    pub fn edge_samples(&self, key: EdgeKey) -> Option<Vec<Point3<f64>>> {
        let edge = self.edges.get(key)?;
        let (start, end) = self.edge_endpoints(key)?;
        Some(edge.curve.sample(start, end))
    }

    /// Computes the length of an edge (exact for lines, sampled otherwise).
    pub fn edge_length(&self, key: EdgeKey) -> Option<f64> {
        let samples = self.edge_samples(key)?;
        Some(samples.windows(2).map(|w| (w[1] - w[0]).norm()).sum())
    }

    /// Approximates an edge chain by one polyline.
    ///
    /// Shared joints appear once. For a closed chain the repeated start point
    /// at the end is dropped, so the result is a polygon ring.
    pub fn chain_points(&self, edges: &[EdgeKey]) -> Option<Vec<Point3<f64>>> {
        let mut points: Vec<Point3<f64>> = Vec::new();
        for &ek in edges {
            let samples = self.edge_samples(ek)?;
            let skip = usize::from(!points.is_empty());
            points.extend(samples.into_iter().skip(skip));
        }
        if points.len() > 1 && self.edges_are_closed(edges, 0.0) {
            points.pop();
        }
        Some(points)
    }

    /// Computes the area enclosed by a closed edge chain.
    pub fn chain_area(&self, edges: &[EdgeKey]) -> Option<f64> {
        Some(polygon_area(&self.chain_points(edges)?))
    }
}

/// Computes the polygon normal using Newell's method, unnormalized.
///
/// The magnitude is twice the enclosed area. Works for any planar polygon
/// (convex or concave); the direction follows the right-hand rule relative to
/// the vertex winding order.
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let mut normal = Vector3::new(0.0, 0.0, 0.0);
    let n = points.len();

    for i in 0..n {
        let curr = points[i];
        let next = points[(i + 1) % n];

        normal.x += (curr.y - next.y) * (curr.z + next.z);
        normal.y += (curr.z - next.z) * (curr.x + next.x);
        normal.z += (curr.x - next.x) * (curr.y + next.y);
    }

    normal
}

/// Area enclosed by a planar polygon ring.
pub fn polygon_area(points: &[Point3<f64>]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    newell_normal(points).norm() / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::{ConicArc, EdgeCurve};
    use approx::assert_relative_eq;
    use std::f64::consts::{PI, TAU};

    #[test]
    fn edge_length_unit() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(3.0, 4.0, 0.0);
        let edge = arena.add_line(v0, v1).unwrap();

        assert_relative_eq!(arena.edge_length(edge).unwrap(), 5.0);
    }

    #[test]
    fn half_circle_length() {
        let mut arena = TopologyArena::new();
        let arc = ConicArc::circle(Point3::origin(), Vector3::x(), Vector3::y(), 1.0, 0.0, PI);
        let edge = arena.add_curve_edge(EdgeCurve::Circle(arc), 1e-6).unwrap();

        assert_relative_eq!(arena.edge_length(edge).unwrap(), PI, epsilon = 1e-2);
    }

    #[test]
    fn polygon_area_unit_square() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        assert_relative_eq!(polygon_area(&square), 1.0);
        assert_relative_eq!(newell_normal(&square).normalize(), Vector3::z());
    }

    #[test]
    fn polygon_area_in_xz_plane() {
        let triangle = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(4.0, 0.0, 0.0),
            Point3::new(0.0, 0.0, 3.0),
        ];
        assert_relative_eq!(polygon_area(&triangle), 6.0);
    }

    #[test]
    fn degenerate_polygon_has_no_area() {
        let line = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        assert_eq!(polygon_area(&line), 0.0);
    }

    #[test]
    fn chain_points_drop_shared_joints() {
        let mut arena = TopologyArena::new();
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 3.0, 0.0),
        ];
        let edges = arena.add_polygon(&points, true, 1e-6).unwrap();

        let ring = arena.chain_points(&edges).unwrap();
        assert_eq!(ring, points.to_vec());
        assert_relative_eq!(arena.chain_area(&edges).unwrap(), 3.0);
    }

    #[test]
    fn full_circle_area() {
        let mut arena = TopologyArena::new();
        let arc = ConicArc::circle(Point3::origin(), Vector3::x(), Vector3::y(), 1.0, 0.0, TAU);
        let edge = arena.add_curve_edge(EdgeCurve::Circle(arc), 1e-6).unwrap();

        assert_relative_eq!(arena.chain_area(&[edge]).unwrap(), PI, epsilon = 1e-1);
    }
}
