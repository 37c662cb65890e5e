// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Arena-based storage for wire topology.
//!
//! The [`TopologyArena`] is the central owner of all topology data. Vertices,
//! edges and wires live inside slot maps with stable, generational keys. An
//! upward vertex → edge index answers "which edges meet here" questions used
//! when validating junctions between wire segments.
//!
//! ## Append-only repair
//!
//! Wire repair never edits an entity in place. Moving an end point creates a
//! new vertex and a new edge; the old entries stay untouched, so every
//! segment or loop that still refers to them keeps seeing the original
//! geometry. A whole arena can be cloned to run speculative conversions and
//! the loser simply dropped.

use nalgebra::Point3;
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::SlotMap;

use crate::curve::EdgeCurve;
use crate::keys::*;

/// Data stored for a vertex: a point in 3D space and its tolerance.
#[derive(Debug, Clone)]
pub struct VertexData {
    pub point: Point3<f64>,
    /// Radius within which another vertex is considered the same location.
    pub tolerance: f64,
}

/// Data stored for an edge: a curve between two vertices.
#[derive(Debug, Clone)]
pub struct EdgeData {
    pub start: VertexKey,
    pub end: VertexKey,
    pub curve: EdgeCurve,
}

/// Data stored for a wire: an ordered chain of connected edges.
#[derive(Debug, Clone)]
pub struct WireData {
    /// Edges in traversal order; each edge's end vertex coincides with the
    /// next edge's start vertex.
    pub edges: Vec<EdgeKey>,
    /// `true` if the last edge ends where the first edge starts.
    pub closed: bool,
}

/// The central arena that owns all topology entities and their adjacency index.
///
/// # Example
///
/// ```
/// use ifc_wire_topology::TopologyArena;
///
/// let mut arena = TopologyArena::new();
/// let v0 = arena.add_vertex(0.0, 0.0, 0.0);
/// let v1 = arena.add_vertex(1.0, 0.0, 0.0);
/// let edge = arena.add_line(v0, v1).unwrap();
///
/// assert_eq!(arena.vertex_count(), 2);
/// assert_eq!(arena.edge_length(edge), Some(1.0));
/// ```
#[derive(Debug, Clone)]
pub struct TopologyArena {
    pub(crate) vertices: SlotMap<VertexKey, VertexData>,
    pub(crate) edges: SlotMap<EdgeKey, EdgeData>,
    pub(crate) wires: SlotMap<WireKey, WireData>,

    // Upward adjacency: vertex → edges using it
    pub(crate) vertex_to_edges: FxHashMap<VertexKey, FxHashSet<EdgeKey>>,
}

impl TopologyArena {
    /// Creates a new, empty topology arena.
    pub fn new() -> Self {
        Self {
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            wires: SlotMap::with_key(),
            vertex_to_edges: FxHashMap::default(),
        }
    }

    // --- Vertex operations ---

    /// Adds a vertex with zero tolerance at the given 3D coordinates.
    pub fn add_vertex(&mut self, x: f64, y: f64, z: f64) -> VertexKey {
        self.add_vertex_with_tolerance(Point3::new(x, y, z), 0.0)
    }

    /// Adds a vertex with the given tolerance.
    pub fn add_vertex_with_tolerance(&mut self, point: Point3<f64>, tolerance: f64) -> VertexKey {
        self.vertices.insert(VertexData {
            point,
            tolerance: tolerance.max(0.0),
        })
    }

    /// Returns the vertex data for the given key, or `None` if not found.
    pub fn vertex(&self, key: VertexKey) -> Option<&VertexData> {
        self.vertices.get(key)
    }

    /// Returns the number of vertices in the arena.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if both vertices denote the same location: the same key,
    /// or a distance no larger than the bigger of their tolerances.
    pub fn vertices_coincide(&self, a: VertexKey, b: VertexKey) -> bool {
        self.vertices_within(a, b, 0.0)
    }

    /// Like [`TopologyArena::vertices_coincide`], with `tolerance` as a lower
    /// bound for the vertex tolerances.
    pub fn vertices_within(&self, a: VertexKey, b: VertexKey, tolerance: f64) -> bool {
        if a == b {
            return true;
        }
        match (self.vertices.get(a), self.vertices.get(b)) {
            (Some(va), Some(vb)) => {
                let limit = va.tolerance.max(vb.tolerance).max(tolerance);
                (va.point - vb.point).norm() <= limit
            }
            _ => false,
        }
    }

    // --- Edge operations ---

    /// Returns the edge data for the given key, or `None` if not found.
    pub fn edge(&self, key: EdgeKey) -> Option<&EdgeData> {
        self.edges.get(key)
    }

    /// Returns the number of edges in the arena.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // --- Adjacency index helpers ---

    /// Register that an edge uses a vertex (upward adjacency).
    pub(crate) fn link_vertex_edge(&mut self, vertex: VertexKey, edge: EdgeKey) {
        self.vertex_to_edges
            .entry(vertex)
            .or_default()
            .insert(edge);
    }
}

impl Default for TopologyArena {
    fn default() -> Self {
        Self::new()
    }
}
