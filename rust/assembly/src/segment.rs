// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Segments and loops: the units the assembler works with.
//!
//! A [`Segment`] is the output of converting one curve: an ordered chain of
//! arena edges with its end points and end curve kinds cached. A [`Loop`] is
//! the final, joined chain. Neither is ever edited; adjusting an end point
//! builds new arena edges and returns a new segment.

use ifc_wire_topology::{
    CurveKind, EdgeKey, Error as TopologyError, TopologyArena, VertexKey, WireKey,
};
use nalgebra::Point3;
use smallvec::SmallVec;

use crate::config::WireConfig;
use crate::curves::CurveDescription;
use crate::error::Result;
use crate::report::ReportSink;

#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    edges: SmallVec<[EdgeKey; 4]>,
    start_vertex: VertexKey,
    end_vertex: VertexKey,
    start: Point3<f64>,
    end: Point3<f64>,
    first_kind: CurveKind,
    last_kind: CurveKind,
}

impl Segment {
    /// Creates a segment from a non-empty chain of existing edges.
    pub fn new(arena: &TopologyArena, edges: &[EdgeKey]) -> Result<Self> {
        let (Some(&first), Some(&last)) = (edges.first(), edges.last()) else {
            return Err(TopologyError::EmptyWire.into());
        };
        if let Some(&missing) = edges.iter().find(|&&ek| arena.edge(ek).is_none()) {
            return Err(TopologyError::EdgeNotFound(missing).into());
        }

        let first_edge = arena.edge(first).ok_or(TopologyError::EdgeNotFound(first))?;
        let last_edge = arena.edge(last).ok_or(TopologyError::EdgeNotFound(last))?;
        let (start_vertex, end_vertex) = (first_edge.start, last_edge.end);

        Ok(Self {
            edges: edges.iter().copied().collect(),
            start_vertex,
            end_vertex,
            start: arena
                .vertex_point(start_vertex)
                .ok_or(TopologyError::VertexNotFound(start_vertex))?,
            end: arena
                .vertex_point(end_vertex)
                .ok_or(TopologyError::VertexNotFound(end_vertex))?,
            first_kind: first_edge.curve.kind(),
            last_kind: last_edge.curve.kind(),
        })
    }

    pub fn edges(&self) -> &[EdgeKey] {
        &self.edges
    }

    pub fn first_edge(&self) -> EdgeKey {
        self.edges[0]
    }

    pub fn last_edge(&self) -> EdgeKey {
        self.edges[self.edges.len() - 1]
    }

    pub fn start(&self) -> Point3<f64> {
        self.start
    }

    pub fn end(&self) -> Point3<f64> {
        self.end
    }

    pub fn start_vertex(&self) -> VertexKey {
        self.start_vertex
    }

    pub fn end_vertex(&self) -> VertexKey {
        self.end_vertex
    }

    /// Curve kind of the leading edge.
    pub fn first_kind(&self) -> CurveKind {
        self.first_kind
    }

    /// Curve kind of the trailing edge.
    pub fn last_kind(&self) -> CurveKind {
        self.last_kind
    }

    /// Distance from this segment's end to the start of `next`.
    pub fn gap_to(&self, next: &Segment) -> f64 {
        (next.start - self.end).norm()
    }

    /// Returns `true` if the segment ends where it starts.
    pub fn is_closed(&self, arena: &TopologyArena, tolerance: f64) -> bool {
        arena.vertices_within(self.start_vertex, self.end_vertex, tolerance)
    }

    /// The same chain traversed backwards, built from new reversed edges.
    pub fn reversed(&self, arena: &mut TopologyArena) -> Result<Segment> {
        let mut edges: SmallVec<[EdgeKey; 4]> = SmallVec::with_capacity(self.edges.len());
        for &ek in self.edges.iter().rev() {
            edges.push(arena.add_reversed_edge(ek)?);
        }
        Segment::new(arena, &edges)
    }

    /// Copy whose trailing edge is rebuilt as a straight edge ending at `end`.
    pub fn with_end_at(&self, arena: &mut TopologyArena, end: VertexKey) -> Result<Segment> {
        let rebuilt = arena.rebuild_line_to(self.last_edge(), end)?;
        let mut edges = self.edges.clone();
        let last = edges.len() - 1;
        edges[last] = rebuilt;
        Segment::new(arena, &edges)
    }

    /// Copy whose leading edge is rebuilt as a straight edge starting at `start`.
    pub fn with_start_at(&self, arena: &mut TopologyArena, start: VertexKey) -> Result<Segment> {
        let rebuilt = arena.rebuild_line_from(self.first_edge(), start)?;
        let mut edges = self.edges.clone();
        edges[0] = rebuilt;
        Segment::new(arena, &edges)
    }
}

/// A joined chain of edges, the result of assembly.
#[derive(Debug, Clone, PartialEq)]
pub struct Loop {
    pub edges: Vec<EdgeKey>,
    /// `true` if the last edge ends within tolerance of the first edge's start.
    pub closed: bool,
}

impl Loop {
    /// Wraps an edge chain, deriving `closed` from its end vertices.
    pub fn from_edges(arena: &TopologyArena, edges: Vec<EdgeKey>, tolerance: f64) -> Self {
        let closed = arena.edges_are_closed(&edges, tolerance);
        Self { edges, closed }
    }

    pub fn from_segment(arena: &TopologyArena, segment: &Segment, tolerance: f64) -> Self {
        Self::from_edges(arena, segment.edges().to_vec(), tolerance)
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Converts the loop back into a single segment, e.g. to nest it.
    pub fn to_segment(&self, arena: &TopologyArena) -> Result<Segment> {
        Segment::new(arena, &self.edges)
    }

    /// Area enclosed by the loop, from a polyline approximation.
    pub fn area(&self, arena: &TopologyArena) -> Option<f64> {
        arena.chain_area(&self.edges)
    }

    /// Stores the loop as a wire in the arena.
    pub fn register(&self, arena: &mut TopologyArena) -> Result<WireKey> {
        Ok(arena.add_wire(&self.edges)?)
    }
}

/// Converts one curve description into a segment of arena edges.
///
/// Implementations create vertices with the configured precision as their
/// tolerance so that later joins agree with the assembler's thresholds.
pub trait SegmentConverter {
    fn convert(
        &self,
        arena: &mut TopologyArena,
        curve: &CurveDescription,
        config: &WireConfig,
        sink: &mut dyn ReportSink,
    ) -> Result<Segment>;
}
