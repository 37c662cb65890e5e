// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Traversal methods for navigating the topology hierarchy.
//!
//! Edge classification, junction incidence through the vertex → edge index,
//! and closedness checks for wires and loose edge chains.

use smallvec::SmallVec;

use crate::arena::TopologyArena;
use crate::curve::CurveKind;
use crate::keys::*;

impl TopologyArena {
    /// Returns the curve classification of an edge.
    pub fn edge_kind(&self, key: EdgeKey) -> Option<CurveKind> {
        self.edges.get(key).map(|e| e.curve.kind())
    }

    /// Returns the edges out of `among` that use the given vertex, in the
    /// order they appear in `among`.
    pub fn incident_edges(&self, vertex: VertexKey, among: &[EdgeKey]) -> SmallVec<[EdgeKey; 2]> {
        let Some(users) = self.vertex_to_edges.get(&vertex) else {
            return SmallVec::new();
        };
        let mut found: SmallVec<[EdgeKey; 2]> = SmallVec::new();
        for ek in among {
            if users.contains(ek) && !found.contains(ek) {
                found.push(*ek);
            }
        }
        found
    }

    /// Checks if a wire is closed (last edge connects back to first edge).
    pub fn wire_is_closed(&self, key: WireKey) -> bool {
        self.wires.get(key).map(|w| w.closed).unwrap_or(false)
    }

    /// Checks if an edge chain ends where it starts, within vertex tolerance
    /// or `tolerance`, whichever is larger.
    pub fn edges_are_closed(&self, edges: &[EdgeKey], tolerance: f64) -> bool {
        let (Some(&first), Some(&last)) = (edges.first(), edges.last()) else {
            return false;
        };
        match (self.edges.get(first), self.edges.get(last)) {
            (Some(f), Some(l)) => self.vertices_within(f.start, l.end, tolerance),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn make_triangle(arena: &mut TopologyArena) -> (WireKey, Vec<EdgeKey>) {
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let edges = arena.add_polygon(&points, true, 1e-6).unwrap();
        let wire = arena.add_wire(&edges).unwrap();
        (wire, edges)
    }

    #[test]
    fn edge_kind_of_line() {
        let mut arena = TopologyArena::new();
        let v0 = arena.add_vertex(0.0, 0.0, 0.0);
        let v1 = arena.add_vertex(1.0, 0.0, 0.0);
        let edge = arena.add_line(v0, v1).unwrap();

        assert_eq!(arena.edge_kind(edge), Some(CurveKind::Linear));
    }

    #[test]
    fn incident_edges_restricted_to_subset() {
        let mut arena = TopologyArena::new();
        let (_, edges) = make_triangle(&mut arena);

        let v0 = arena.edge(edges[0]).unwrap().start;
        assert_eq!(arena.incident_edges(v0, &edges[..2]).as_slice(), &[edges[0]]);
        assert_eq!(arena.incident_edges(v0, &edges).len(), 2);
    }

    #[test]
    fn closed_wire_triangle() {
        let mut arena = TopologyArena::new();
        let (wire, edges) = make_triangle(&mut arena);
        assert!(arena.wire_is_closed(wire));
        assert!(arena.edges_are_closed(&edges, 0.0));
        assert!(!arena.edges_are_closed(&edges[..2], 0.0));
        assert!(arena.edges_are_closed(&edges[..2], 1.5));
    }

    #[test]
    fn open_wire_two_edges() {
        let mut arena = TopologyArena::new();
        let points = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ];
        let edges = arena.add_polygon(&points, false, 1e-6).unwrap();
        let wire = arena.add_wire(&edges).unwrap();
        assert!(!arena.wire_is_closed(wire));
    }
}
