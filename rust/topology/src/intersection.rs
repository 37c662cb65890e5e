// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Self-intersection detection and decomposition for planar polygon rings.
//!
//! The ring is projected onto the coordinate plane that best preserves its
//! shape and proper crossings between non-adjacent edges are located. The
//! ring is then walked once; arriving at a crossing point seen earlier on the
//! walk cuts off the loop in between as a cycle. A figure-eight decomposes
//! into its two lobes. Interleaved crossings, as in a pentagram, are not all
//! cut: the five points of a star come out as two cycles rather than six, so
//! the cycle count can be lower than the crossing count plus one. Each cycle
//! is free of crossings. Touching vertices and collinear overlaps are not
//! treated as crossings.

use nalgebra::{Point2, Point3, Vector2, Vector3};
use rustc_hash::FxHashMap;

use crate::arena::TopologyArena;
use crate::geometry::polygon_area;
use crate::keys::EdgeKey;

/// Crossing parameters closer than this to an edge end are ignored.
const PARAM_EPS: f64 = 1e-9;

/// Result of splitting a self-intersecting ring.
#[derive(Debug, Clone)]
pub struct SelfIntersections {
    /// Number of crossing points found.
    pub crossings: usize,
    /// Disjoint simple cycles, in the order they are first reached when
    /// walking the ring from its first point.
    pub cycles: Vec<Vec<Point3<f64>>>,
}

impl SelfIntersections {
    /// Index of the cycle enclosing the largest area; ties keep the earliest.
    pub fn largest_cycle(&self) -> Option<usize> {
        let mut best: Option<(usize, f64)> = None;
        for (i, cycle) in self.cycles.iter().enumerate() {
            let area = polygon_area(cycle);
            match best {
                Some((_, best_area)) if area <= best_area => {}
                _ => best = Some((i, area)),
            }
        }
        best.map(|(i, _)| i)
    }
}

#[derive(Debug, Clone, Copy)]
struct Node {
    point: Point3<f64>,
    crossing: Option<usize>,
}

/// Splits a closed polygon ring at the self-crossings its walk returns to.
///
/// Returns `None` when the ring does not cross itself.
pub fn decompose_ring(ring: &[Point3<f64>]) -> Option<SelfIntersections> {
    let n = ring.len();
    if n < 4 {
        return None;
    }

    let projected = project_to_plane(ring);
    let mut splits: Vec<Vec<(f64, usize)>> = vec![Vec::new(); n];
    let mut crossing_points: Vec<Point3<f64>> = Vec::new();

    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue; // adjacent through the closing edge
            }
            let (a, b) = (projected[i], projected[(i + 1) % n]);
            let (c, d) = (projected[j], projected[(j + 1) % n]);
            if let Some((t, u)) = segment_crossing(a, b, c, d) {
                let id = crossing_points.len();
                let start = ring[i];
                let end = ring[(i + 1) % n];
                crossing_points.push(start + (end - start) * t);
                splits[i].push((t, id));
                splits[j].push((u, id));
            }
        }
    }

    if crossing_points.is_empty() {
        return None;
    }

    let mut nodes = Vec::with_capacity(n + 2 * crossing_points.len());
    for (i, edge_splits) in splits.iter_mut().enumerate() {
        nodes.push(Node {
            point: ring[i],
            crossing: None,
        });
        edge_splits.sort_by(|x, y| x.0.total_cmp(&y.0));
        for &(_, id) in edge_splits.iter() {
            nodes.push(Node {
                point: crossing_points[id],
                crossing: Some(id),
            });
        }
    }

    // Walk the ring; returning to a crossing already on the stack closes the
    // cycle between both visits.
    let mut stack: Vec<(usize, Node)> = Vec::with_capacity(nodes.len());
    let mut on_stack: FxHashMap<usize, usize> = FxHashMap::default();
    let mut cycles: Vec<(usize, Vec<Point3<f64>>)> = Vec::new();

    for (seq, node) in nodes.into_iter().enumerate() {
        if let Some(id) = node.crossing {
            if let Some(&at) = on_stack.get(&id) {
                let closed: Vec<(usize, Node)> = stack.drain(at..).collect();
                for (_, visited) in &closed {
                    if let Some(cid) = visited.crossing {
                        on_stack.remove(&cid);
                    }
                }
                let first_seq = closed.first().map(|(s, _)| *s).unwrap_or(seq);
                cycles.push((first_seq, closed.into_iter().map(|(_, c)| c.point).collect()));
            }
            on_stack.insert(id, stack.len());
        }
        stack.push((seq, node));
    }
    cycles.push((0, stack.into_iter().map(|(_, c)| c.point).collect()));

    cycles.retain(|(_, points)| points.len() >= 3);
    cycles.sort_by_key(|(seq, _)| *seq);

    Some(SelfIntersections {
        crossings: crossing_points.len(),
        cycles: cycles.into_iter().map(|(_, points)| points).collect(),
    })
}

impl TopologyArena {
    /// Tests a closed edge chain for self-intersections and decomposes it.
    ///
    /// Returns `None` if the chain does not cross itself or an edge is missing.
    pub fn chain_self_intersections(&self, edges: &[EdgeKey]) -> Option<SelfIntersections> {
        decompose_ring(&self.chain_points(edges)?)
    }
}

/// Drops the coordinate axis along which the ring's plane normal is largest.
fn project_to_plane(ring: &[Point3<f64>]) -> Vec<Point2<f64>> {
    // Fan cross products, each flipped to agree with the running sum, stay
    // non-zero for figure-eights whose lobes cancel in Newell's sum.
    let origin = ring[0];
    let mut normal = Vector3::new(0.0, 0.0, 0.0);
    for w in ring[1..].windows(2) {
        let c = (w[0] - origin).cross(&(w[1] - origin));
        if normal.dot(&c) < 0.0 {
            normal -= c;
        } else {
            normal += c;
        }
    }

    let abs = normal.abs();
    let (u, v) = if abs.z >= abs.x && abs.z >= abs.y {
        (0, 1)
    } else if abs.y >= abs.x {
        (2, 0)
    } else {
        (1, 2)
    };
    ring.iter().map(|p| Point2::new(p[u], p[v])).collect()
}

/// Parameters `(t, u)` of a proper crossing between segments `ab` and `cd`.
fn segment_crossing(
    a: Point2<f64>,
    b: Point2<f64>,
    c: Point2<f64>,
    d: Point2<f64>,
) -> Option<(f64, f64)> {
    let r = b - a;
    let s = d - c;
    let denom = cross(r, s);
    if denom.abs() <= f64::EPSILON * r.norm() * s.norm() {
        return None;
    }
    let qp = c - a;
    let t = cross(qp, s) / denom;
    let u = cross(qp, r) / denom;
    let inside = |x: f64| x > PARAM_EPS && x < 1.0 - PARAM_EPS;
    (inside(t) && inside(u)).then_some((t, u))
}

#[inline]
fn cross(a: Vector2<f64>, b: Vector2<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}
