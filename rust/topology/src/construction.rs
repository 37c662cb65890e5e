// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Construction methods for topology entities.
//!
//! Each topology entity is created through the arena, which ensures referential
//! integrity (all referenced sub-entities must exist) and maintains the
//! vertex → edge adjacency index. Replacement operations never touch the
//! original entity; they return the key of a freshly built one.

use nalgebra::Point3;

use crate::arena::*;
use crate::curve::EdgeCurve;
use crate::error::{Error, Result};
use crate::keys::*;

impl TopologyArena {
    /// Creates an edge with the given curve between two existing vertices.
    ///
    /// Returns an error if either vertex does not exist in the arena.
    pub fn add_edge(
        &mut self,
        start: VertexKey,
        end: VertexKey,
        curve: EdgeCurve,
    ) -> Result<EdgeKey> {
        if !self.vertices.contains_key(start) {
            return Err(Error::VertexNotFound(start));
        }
        if !self.vertices.contains_key(end) {
            return Err(Error::VertexNotFound(end));
        }

        let key = self.edges.insert(EdgeData { start, end, curve });
        self.link_vertex_edge(start, key);
        self.link_vertex_edge(end, key);
        Ok(key)
    }

    /// Creates a straight edge between two existing vertices.
    pub fn add_line(&mut self, start: VertexKey, end: VertexKey) -> Result<EdgeKey> {
        self.add_edge(start, end, EdgeCurve::Line)
    }

    /// Creates two vertices and the straight edge between them.
    pub fn add_line_between(
        &mut self,
        start: Point3<f64>,
        end: Point3<f64>,
        tolerance: f64,
    ) -> Result<EdgeKey> {
        let v0 = self.add_vertex_with_tolerance(start, tolerance);
        let v1 = self.add_vertex_with_tolerance(end, tolerance);
        self.add_line(v0, v1)
    }

    /// Creates an edge for a bounded curve, placing its vertices at the curve
    /// end points. A curve that ends where it starts (a full circle) gets a
    /// single vertex used as both start and end.
    pub fn add_curve_edge(&mut self, curve: EdgeCurve, tolerance: f64) -> Result<EdgeKey> {
        let (start, end) = curve
            .endpoints()
            .ok_or_else(|| Error::InvalidCurve("line edges need explicit end points".into()))?;

        let v0 = self.add_vertex_with_tolerance(start, tolerance);
        let v1 = if (end - start).norm() <= tolerance {
            v0
        } else {
            self.add_vertex_with_tolerance(end, tolerance)
        };
        self.add_edge(v0, v1, curve)
    }

    /// Creates a chain of straight edges through the given points.
    ///
    /// A closed polygon gets an extra edge from the last point back to the
    /// first vertex. Open polygons need 2 points, closed ones 3.
    pub fn add_polygon(
        &mut self,
        points: &[Point3<f64>],
        closed: bool,
        tolerance: f64,
    ) -> Result<Vec<EdgeKey>> {
        let required = if closed { 3 } else { 2 };
        if points.len() < required {
            return Err(Error::DegeneratePolygon {
                required,
                actual: points.len(),
            });
        }

        let vertices: Vec<VertexKey> = points
            .iter()
            .map(|p| self.add_vertex_with_tolerance(*p, tolerance))
            .collect();

        let mut edges = Vec::with_capacity(vertices.len());
        for pair in vertices.windows(2) {
            edges.push(self.add_line(pair[0], pair[1])?);
        }
        if closed {
            edges.push(self.add_line(vertices[vertices.len() - 1], vertices[0])?);
        }
        Ok(edges)
    }

    /// Creates the reverse of an edge: same vertices swapped, curve reversed.
    pub fn add_reversed_edge(&mut self, key: EdgeKey) -> Result<EdgeKey> {
        let edge = self.edges.get(key).ok_or(Error::EdgeNotFound(key))?;
        let (start, end, curve) = (edge.end, edge.start, edge.curve.reversed());
        self.add_edge(start, end, curve)
    }

    /// Replaces an edge by a straight edge from its start vertex to `end`.
    pub fn rebuild_line_to(&mut self, key: EdgeKey, end: VertexKey) -> Result<EdgeKey> {
        let start = self.edges.get(key).ok_or(Error::EdgeNotFound(key))?.start;
        self.add_line(start, end)
    }

    /// Replaces an edge by a straight edge from `start` to its end vertex.
    pub fn rebuild_line_from(&mut self, key: EdgeKey, start: VertexKey) -> Result<EdgeKey> {
        let end = self.edges.get(key).ok_or(Error::EdgeNotFound(key))?.end;
        self.add_line(start, end)
    }

    /// Rebinds an edge's curve to other end vertices, e.g. vertices within
    /// tolerance of the curve ends that a neighbouring edge already uses.
    pub fn rebuild_edge_between(
        &mut self,
        key: EdgeKey,
        start: VertexKey,
        end: VertexKey,
    ) -> Result<EdgeKey> {
        let curve = self.edges.get(key).ok_or(Error::EdgeNotFound(key))?.curve.clone();
        self.add_edge(start, end, curve)
    }

    /// Creates a wire from an ordered list of edges.
    ///
    /// Each edge must start where the previous one ends, within vertex
    /// tolerance. The wire is marked closed when the last edge ends where the
    /// first one starts.
    ///
    /// Returns an error if the edge list is empty or edges are not connected.
    pub fn add_wire(&mut self, edge_keys: &[EdgeKey]) -> Result<WireKey> {
        if edge_keys.is_empty() {
            return Err(Error::EmptyWire);
        }

        for &ek in edge_keys {
            if !self.edges.contains_key(ek) {
                return Err(Error::EdgeNotFound(ek));
            }
        }

        for i in 1..edge_keys.len() {
            let prev_end = self.edges[edge_keys[i - 1]].end;
            let curr_start = self.edges[edge_keys[i]].start;
            if !self.vertices_coincide(prev_end, curr_start) {
                return Err(Error::DisconnectedWire(i - 1, i));
            }
        }

        let first_start = self.edges[edge_keys[0]].start;
        let last_end = self.edges[edge_keys[edge_keys.len() - 1]].end;
        let closed = self.vertices_coincide(first_start, last_end);

        Ok(self.wires.insert(WireData {
            edges: edge_keys.to_vec(),
            closed,
        }))
    }
}

/// Problems detected by [`WireBuilder`] while appending edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireError {
    /// The edge does not start where the wire currently ends; it was rejected.
    DisconnectedWire,
    /// The edge returns to a vertex already bounding two wire edges; it was
    /// appended, but the wire no longer describes a simple path.
    NonManifoldWire,
}

/// Incremental wire construction with connectivity checking.
///
/// Edges are appended in order. After each call to [`WireBuilder::add`] the
/// builder exposes the last problem it saw, mirroring how a kernel wire
/// builder reports its status after every addition.
#[derive(Debug, Default, Clone)]
pub struct WireBuilder {
    edges: Vec<EdgeKey>,
    error: Option<WireError>,
    tolerance: f64,
}

impl WireBuilder {
    /// Creates a builder that relies on vertex tolerances alone.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder that joins vertices closer than `tolerance` even
    /// when their own tolerances are smaller.
    pub fn with_tolerance(tolerance: f64) -> Self {
        Self {
            tolerance: tolerance.max(0.0),
            ..Self::default()
        }
    }

    /// Appends edges in order, recording the first problem encountered.
    ///
    /// A disconnected edge stops the addition; the remaining edges of the
    /// batch would be disconnected as well.
    pub fn add(&mut self, arena: &TopologyArena, edges: &[EdgeKey]) -> Option<WireError> {
        self.error = None;
        for &ek in edges {
            match self.push(arena, ek) {
                Ok(()) => {}
                Err(WireError::DisconnectedWire) => {
                    self.error = Some(WireError::DisconnectedWire);
                    break;
                }
                Err(err) => {
                    self.error.get_or_insert(err);
                }
            }
        }
        self.error
    }

    fn push(&mut self, arena: &TopologyArena, key: EdgeKey) -> std::result::Result<(), WireError> {
        let edge = arena.edge(key).ok_or(WireError::DisconnectedWire)?;

        let Some(&last) = self.edges.last() else {
            self.edges.push(key);
            return Ok(());
        };

        let prev_end = arena.edges[last].end;
        if !arena.vertices_within(prev_end, edge.start, self.tolerance) {
            return Err(WireError::DisconnectedWire);
        }

        let already_closed = self.is_closed(arena);
        // Interior vertices already bound two edges; the first vertex may be
        // revisited once to close the wire.
        let revisits_interior = self.edges[1..]
            .iter()
            .any(|&ek| arena.vertices_within(arena.edges[ek].start, edge.end, self.tolerance));

        self.edges.push(key);

        if already_closed || revisits_interior {
            return Err(WireError::NonManifoldWire);
        }
        Ok(())
    }

    /// Status of the most recent [`WireBuilder::add`] call.
    pub fn error(&self) -> Option<WireError> {
        self.error
    }

    /// Edges accepted so far, in order.
    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Returns `true` if the accepted edges end where they start.
    pub fn is_closed(&self, arena: &TopologyArena) -> bool {
        arena.edges_are_closed(&self.edges, self.tolerance)
    }

    /// Consumes the builder, returning the accepted edges.
    pub fn into_edges(self) -> Vec<EdgeKey> {
        self.edges
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::ConicArc;
    use nalgebra::Vector3;
    use std::f64::consts::{PI, TAU};

    fn square(arena: &mut TopologyArena) -> Vec<EdgeKey> {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        arena.add_polygon(&points, true, 1e-6).unwrap()
    }

    // --- Edge tests ---

    #[test]
    fn add_line_valid() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(1.0, 0.0, 0.0);
        let edge = arena.add_line(v0, v1).unwrap();

        let data = arena.edge(edge).unwrap();
        assert_eq!(data.start, v0);
        assert_eq!(data.end, v1);
        assert_eq!(data.curve, EdgeCurve::Line);
        assert_eq!(arena.edge_count(), 1);
    }

    #[test]
    fn add_edge_invalid_vertex() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);

        // Create a stale key by inserting and removing a vertex from the
        // same arena. The generation counter ensures the key is invalid.
        let v_temp = arena.add_vertex(99.0, 99.0, 99.0);
        arena.vertices.remove(v_temp);

        assert!(arena.add_line(v0, v_temp).is_err());
    }

    #[test]
    fn add_edge_registers_upward_adjacency() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(1.0, 0.0, 0.0);
        let v2 = arena.add_vertex(0.0, 1.0, 0.0);

        let e0 = arena.add_line(v0, v1).unwrap();
        let e1 = arena.add_line(v0, v2).unwrap();

        let v0_edges = &arena.vertex_to_edges[&v0];
        assert!(v0_edges.contains(&e0));
        assert!(v0_edges.contains(&e1));
        assert_eq!(v0_edges.len(), 2);
    }

    #[test]
    fn full_circle_shares_one_vertex() {
        let mut arena = TopologyArena::new();
        let arc = ConicArc::circle(Point3::origin(), Vector3::x(), Vector3::y(), 2.0, 0.0, TAU);
        let edge = arena.add_curve_edge(EdgeCurve::Circle(arc), 1e-6).unwrap();

        let data = arena.edge(edge).unwrap();
        assert_eq!(data.start, data.end);
        assert_eq!(arena.vertex_count(), 1);
    }

    #[test]
    fn line_curve_edge_is_rejected() {
        let mut arena = TopologyArena::new();
        assert!(matches!(
            arena.add_curve_edge(EdgeCurve::Line, 1e-6),
            Err(Error::InvalidCurve(_))
        ));
    }

    #[test]
    fn reversed_edge_swaps_vertices_and_curve() {
        let mut arena = TopologyArena::new();
        let arc = ConicArc::circle(Point3::origin(), Vector3::x(), Vector3::y(), 1.0, 0.0, PI);
        let edge = arena.add_curve_edge(EdgeCurve::Circle(arc.clone()), 1e-6).unwrap();
        let rev = arena.add_reversed_edge(edge).unwrap();

        let (fwd, bwd) = (arena.edge(edge).unwrap(), arena.edge(rev).unwrap());
        assert_eq!(fwd.start, bwd.end);
        assert_eq!(fwd.end, bwd.start);
        assert_eq!(bwd.curve, EdgeCurve::Circle(arc.reversed()));
    }

    #[test]
    fn rebuild_keeps_original_edge() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(1.0, 0.0, 0.0);
        let v2 = arena.add_vertex(1.0, 0.1, 0.0);
        let edge = arena.add_line(v0, v1).unwrap();

        let moved = arena.rebuild_line_to(edge, v2).unwrap();
        assert_ne!(moved, edge);
        assert_eq!(arena.edge(moved).unwrap().start, v0);
        assert_eq!(arena.edge(moved).unwrap().end, v2);
        assert_eq!(arena.edge(edge).unwrap().end, v1);

        let moved_start = arena.rebuild_line_from(edge, v2).unwrap();
        assert_eq!(arena.edge(moved_start).unwrap().start, v2);
        assert_eq!(arena.edge(moved_start).unwrap().end, v1);
    }

    #[test]
    fn rebound_arc_keeps_its_curve() {
        let mut arena = TopologyArena::new();
        let arc = ConicArc::circle(Point3::origin(), Vector3::x(), Vector3::y(), 1.0, 0.0, PI);
        let edge = arena.add_curve_edge(EdgeCurve::Circle(arc.clone()), 1e-6).unwrap();
        let a = arena.add_vertex_with_tolerance(Point3::new(1.0, 1e-7, 0.0), 1e-5);
        let b = arena.add_vertex_with_tolerance(Point3::new(-1.0, 1e-7, 0.0), 1e-5);

        let rebound = arena.rebuild_edge_between(edge, a, b).unwrap();
        let data = arena.edge(rebound).unwrap();
        assert_eq!((data.start, data.end), (a, b));
        assert_eq!(data.curve, EdgeCurve::Circle(arc));
        assert!(arena.rebuild_edge_between(rebound, a, VertexKey::default()).is_err());
    }

    // --- Polygon tests ---

    #[test]
    fn closed_polygon_returns_to_first_vertex() {
        let mut arena = TopologyArena::new();
        let edges = square(&mut arena);
        assert_eq!(edges.len(), 4);
        assert_eq!(arena.vertex_count(), 4);

        let first = arena.edge(edges[0]).unwrap().start;
        let last = arena.edge(edges[3]).unwrap().end;
        assert_eq!(first, last);
    }

    #[test]
    fn degenerate_polygon_fails() {
        let mut arena = TopologyArena::new();
        let points = [Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)];
        assert!(arena.add_polygon(&points, false, 0.0).is_ok());
        assert!(matches!(
            arena.add_polygon(&points, true, 0.0),
            Err(Error::DegeneratePolygon { required: 3, actual: 2 })
        ));
    }

    // --- Wire tests ---

    #[test]
    fn add_wire_square_is_closed() {
        let mut arena = TopologyArena::new();
        let edges = square(&mut arena);
        let wire = arena.add_wire(&edges).unwrap();
        assert!(arena.wire_is_closed(wire));
    }

    #[test]
    fn add_wire_within_tolerance() {
        let mut arena = TopologyArena::new();
        let e0 = arena
            .add_line_between(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), 1e-3)
            .unwrap();
        let e1 = arena
            .add_line_between(Point3::new(1.0, 5e-4, 0.0), Point3::new(2.0, 0.0, 0.0), 1e-3)
            .unwrap();

        let wire = arena.add_wire(&[e0, e1]).unwrap();
        assert!(!arena.wire_is_closed(wire));
    }

    #[test]
    fn add_wire_empty_fails() {
        let mut arena = TopologyArena::new();
        assert!(matches!(arena.add_wire(&[]), Err(Error::EmptyWire)));
    }

    #[test]
    fn add_wire_disconnected_fails() {
        let mut arena = TopologyArena::new();
        let e0 = arena
            .add_line_between(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), 1e-6)
            .unwrap();
        let e1 = arena
            .add_line_between(Point3::new(5.0, 5.0, 0.0), Point3::new(6.0, 0.0, 0.0), 1e-6)
            .unwrap();

        assert!(matches!(
            arena.add_wire(&[e0, e1]),
            Err(Error::DisconnectedWire(0, 1))
        ));
    }

    // --- WireBuilder tests ---

    #[test]
    fn builder_accepts_connected_edges() {
        let mut arena = TopologyArena::new();
        let edges = square(&mut arena);

        let mut builder = WireBuilder::new();
        assert_eq!(builder.add(&arena, &edges[..2]), None);
        assert!(!builder.is_closed(&arena));
        assert_eq!(builder.add(&arena, &edges[2..]), None);
        assert!(builder.is_closed(&arena));

        let wire = arena.add_wire(builder.edges()).unwrap();
        assert!(arena.wire_is_closed(wire));
    }

    #[test]
    fn builder_rejects_disconnected_edge() {
        let mut arena = TopologyArena::new();
        let e0 = arena
            .add_line_between(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), 1e-6)
            .unwrap();
        let e1 = arena
            .add_line_between(Point3::new(3.0, 0.0, 0.0), Point3::new(4.0, 0.0, 0.0), 1e-6)
            .unwrap();

        let mut builder = WireBuilder::new();
        builder.add(&arena, &[e0]);
        assert_eq!(builder.add(&arena, &[e1]), Some(WireError::DisconnectedWire));
        assert_eq!(builder.edges(), &[e0]);
    }

    #[test]
    fn builder_tolerance_bridges_exact_vertices() {
        let mut arena = TopologyArena::new();
        let e0 = arena
            .add_line_between(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0), 0.0)
            .unwrap();
        let e1 = arena
            .add_line_between(Point3::new(1.0, 1e-4, 0.0), Point3::new(2.0, 0.0, 0.0), 0.0)
            .unwrap();

        let mut strict = WireBuilder::new();
        strict.add(&arena, &[e0]);
        assert_eq!(strict.add(&arena, &[e1]), Some(WireError::DisconnectedWire));

        let mut tolerant = WireBuilder::with_tolerance(1e-3);
        tolerant.add(&arena, &[e0]);
        assert_eq!(tolerant.add(&arena, &[e1]), None);
    }

    #[test]
    fn builder_flags_edge_after_closure() {
        let mut arena = TopologyArena::new();
        let edges = square(&mut arena);
        let origin = arena.edge(edges[0]).unwrap().start;
        let extra = arena.rebuild_line_from(edges[0], origin).unwrap();

        let mut builder = WireBuilder::new();
        builder.add(&arena, &edges);
        assert_eq!(builder.add(&arena, &[extra]), Some(WireError::NonManifoldWire));
        assert_eq!(builder.edges().len(), 5);
    }

    #[test]
    fn builder_flags_revisited_interior_vertex() {
        let mut arena = TopologyArena::new();
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
        ];
        let edges = arena.add_polygon(&points, false, 1e-6).unwrap();

        let mut builder = WireBuilder::new();
        assert_eq!(builder.add(&arena, &edges), Some(WireError::NonManifoldWire));
    }
}
