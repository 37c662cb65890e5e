// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Topological edges: curves bounded by explicit vertex points.
//!
//! An edge curve on bounded geometry is converted as a curve first, then its
//! outer ends are rebound to the edge's own vertices, which only need to lie
//! within the precision of the curve ends. Edge loops chain oriented edges
//! into one wire without any gap repair; edges that fail to convert or to
//! join are reported and left out.

use std::f64::consts::TAU;

use ifc_wire_topology::{
    ConicArc, EdgeCurve, EdgeKey, Error as TopologyError, TopologyArena, VertexKey, WireBuilder,
    WireError,
};
use nalgebra::Point3;

use crate::config::WireConfig;
use crate::curves::{conic_through, BasisCurve, CurveDescription};
use crate::error::{Error, Result};
use crate::report::{EntityRef, Report, ReportKind, ReportSink};
use crate::segment::{Loop, Segment, SegmentConverter};

/// Geometry underlying an edge curve.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeGeometry {
    /// A bounded curve, converted on its own before the ends are rebound.
    Bounded(Box<CurveDescription>),
    /// An unbounded basis curve, cut between the edge vertices.
    Unbounded(BasisCurve),
}

/// Vertex pair for an edge, collapsed to one vertex when the points coincide.
fn edge_vertices(
    arena: &mut TopologyArena,
    start: Point3<f64>,
    end: Point3<f64>,
    tolerance: f64,
) -> (VertexKey, VertexKey) {
    let v1 = arena.add_vertex_with_tolerance(start, tolerance);
    let v2 = if (end - start).norm() <= tolerance {
        v1
    } else {
        arena.add_vertex_with_tolerance(end, tolerance)
    };
    (v1, v2)
}

/// Converts an edge curve running from `start` to `end`.
///
/// With `same_sense == false` a bounded curve is reversed before its first
/// edge is rebound to start at `start` and its last edge to end at `end`.
/// A single edge gets both vertices; inner edges are kept as converted.
#[allow(clippy::too_many_arguments)]
pub fn convert_edge_curve<C: SegmentConverter + ?Sized>(
    converter: &C,
    arena: &mut TopologyArena,
    entity: EntityRef,
    start: Point3<f64>,
    end: Point3<f64>,
    geometry: &EdgeGeometry,
    same_sense: bool,
    config: &WireConfig,
    sink: &mut dyn ReportSink,
) -> Result<Segment> {
    let tolerance = config.precision;
    match geometry {
        EdgeGeometry::Unbounded(basis) => {
            let curve = conic_through(basis, start, end)
                .map_err(|reason| Error::Conversion { entity, reason })?;
            let edge = match curve {
                Some(curve) => {
                    let (v1, v2) = edge_vertices(arena, start, end, tolerance);
                    arena.add_edge(v1, v2, curve)?
                }
                None => arena.add_line_between(start, end, tolerance)?,
            };
            Segment::new(arena, &[edge])
        }
        EdgeGeometry::Bounded(curve) => {
            let segment = converter.convert(arena, curve, config, sink)?;
            let segment = if same_sense {
                segment
            } else {
                segment.reversed(arena)?
            };

            let (v1, v2) = edge_vertices(arena, start, end, tolerance);
            let mut edges = segment.edges().to_vec();
            let last = edges.len() - 1;
            if last == 0 {
                edges[0] = arena.rebuild_edge_between(edges[0], v1, v2)?;
            } else {
                let inner_end = segment_vertex(arena, edges[0], false)?;
                let inner_start = segment_vertex(arena, edges[last], true)?;
                edges[0] = arena.rebuild_edge_between(edges[0], v1, inner_end)?;
                edges[last] = arena.rebuild_edge_between(edges[last], inner_start, v2)?;
            }
            tracing::trace!(entity = %entity, edges = edges.len(), "edge curve rebound");
            Segment::new(arena, &edges)
        }
    }
}

fn segment_vertex(arena: &TopologyArena, edge: EdgeKey, start: bool) -> Result<VertexKey> {
    let data = arena.edge(edge).ok_or(TopologyError::EdgeNotFound(edge))?;
    Ok(if start { data.start } else { data.end })
}

/// Converts the edge of an oriented edge, reversed when `orientation` is
/// `false`.
pub fn convert_oriented_edge<C: SegmentConverter + ?Sized>(
    converter: &C,
    arena: &mut TopologyArena,
    edge: &CurveDescription,
    orientation: bool,
    config: &WireConfig,
    sink: &mut dyn ReportSink,
) -> Result<Segment> {
    let segment = converter.convert(arena, edge, config, sink)?;
    if orientation {
        Ok(segment)
    } else {
        segment.reversed(arena)
    }
}

/// Converts a subedge: the first curve of its parent between the subedge's
/// own vertices.
pub fn convert_subedge<C: SegmentConverter + ?Sized>(
    converter: &C,
    arena: &mut TopologyArena,
    start: Point3<f64>,
    end: Point3<f64>,
    parent: &CurveDescription,
    config: &WireConfig,
    sink: &mut dyn ReportSink,
) -> Result<Segment> {
    let segment = converter.convert(arena, parent, config, sink)?;
    let first = segment.first_edge();
    let curve = match &arena.edge(first).ok_or(TopologyError::EdgeNotFound(first))?.curve {
        EdgeCurve::Circle(arc) => EdgeCurve::Circle(arc_between(arc, start, end)),
        EdgeCurve::Ellipse(arc) => EdgeCurve::Ellipse(arc_between(arc, start, end)),
        other => other.clone(),
    };
    let (v1, v2) = edge_vertices(arena, start, end, config.precision);
    let edge = arena.add_edge(v1, v2, curve)?;
    Segment::new(arena, &[edge])
}

/// Part of a conic arc between two points on it, keeping its direction.
fn arc_between(arc: &ConicArc, start: Point3<f64>, end: Point3<f64>) -> ConicArc {
    let angle_of = |p: Point3<f64>| {
        let d = p - arc.center;
        (d.dot(&arc.y_axis) / arc.semi_axis2).atan2(d.dot(&arc.x_axis) / arc.semi_axis1)
    };
    let (a1, a2) = (angle_of(start), angle_of(end));
    let forward = if arc.sweep < 0.0 { a1 - a2 } else { a2 - a1 };
    let mut sweep = forward.rem_euclid(TAU);
    if sweep < 1e-9 {
        sweep = TAU;
    }
    ConicArc {
        start_angle: a1,
        sweep: sweep.copysign(arc.sweep),
        ..arc.clone()
    }
}

/// Chains the oriented edges of an edge loop into one wire.
///
/// Each edge must start within the precision of where the previous one
/// ended; no gap is bridged. Failing edges are reported and skipped, and the
/// loop fails only when nothing remains.
pub fn convert_edge_loop<C: SegmentConverter + ?Sized>(
    converter: &C,
    arena: &mut TopologyArena,
    entity: EntityRef,
    edges: &[CurveDescription],
    config: &WireConfig,
    sink: &mut dyn ReportSink,
) -> Result<Loop> {
    let tolerance = config.join_threshold();
    let mut builder = WireBuilder::with_tolerance(tolerance);

    for edge in edges {
        let segment = match converter.convert(arena, edge, config, sink) {
            Ok(segment) => segment,
            Err(err) => {
                tracing::warn!(entity = %entity, edge = %edge.entity, %err, "skipping loop edge");
                sink.report(Report::new(
                    ReportKind::SegmentConversionFailed {
                        reason: err.to_string(),
                    },
                    edge.entity,
                ));
                continue;
            }
        };
        let kind = match builder.add(arena, segment.edges()) {
            None => continue,
            Some(WireError::NonManifoldWire) => ReportKind::NonManifoldSegments,
            Some(WireError::DisconnectedWire) => ReportKind::DisconnectedSegments,
        };
        sink.report(Report::new(kind, edge.entity));
    }

    if builder.is_empty() {
        return Err(Error::EmptyWire(entity));
    }
    let closed = builder.is_closed(arena);
    Ok(Loop {
        edges: builder.into_edges(),
        closed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::{CurveConverter, CurveGeometry, Placement, Trim, TrimmedCurve};
    use approx::assert_relative_eq;
    use ifc_wire_topology::{CurveKind, EdgeCurve};
    use std::f64::consts::{FRAC_PI_2, PI};

    const P: f64 = 1e-5;

    fn pt(x: f64, y: f64) -> Point3<f64> {
        Point3::new(x, y, 0.0)
    }

    fn edge(id: u32, start: Point3<f64>, end: Point3<f64>) -> CurveDescription {
        CurveDescription::new(EntityRef(id), CurveGeometry::Edge { start, end })
    }

    fn oriented(id: u32, inner: CurveDescription, orientation: bool) -> CurveDescription {
        CurveDescription::new(
            EntityRef(id),
            CurveGeometry::OrientedEdge {
                edge: Box::new(inner),
                orientation,
            },
        )
    }

    fn convert(
        curve: &CurveDescription,
        sink: &mut Vec<Report>,
    ) -> (TopologyArena, Result<Segment>) {
        let mut arena = TopologyArena::new();
        let result = CurveConverter.convert(&mut arena, curve, &WireConfig::new(P), sink);
        (arena, result)
    }

    /// Upper half of the unit circle, counter-clockwise from (1, 0).
    fn half_circle(id: u32) -> CurveDescription {
        CurveDescription::new(
            EntityRef(id),
            CurveGeometry::Trimmed(TrimmedCurve {
                basis: BasisCurve::Circle {
                    position: Placement::xy(Point3::origin()),
                    radius: 1.0,
                },
                trim1: Trim::point(pt(1.0, 0.0)),
                trim2: Trim::point(pt(-1.0, 0.0)),
                sense_agreement: true,
                prefer_cartesian: true,
            }),
        )
    }

    #[test]
    fn bounded_edge_curve_takes_its_vertices() {
        // Vertices off the arc ends by less than the precision
        let start = pt(1.0, 4e-6);
        let end = pt(-1.0, -3e-6);
        let curve = CurveDescription::new(
            EntityRef(1),
            CurveGeometry::EdgeCurve {
                start,
                end,
                geometry: EdgeGeometry::Bounded(Box::new(half_circle(2))),
                same_sense: true,
            },
        );
        let (arena, result) = convert(&curve, &mut Vec::new());
        let segment = result.unwrap();
        assert_eq!(segment.edges().len(), 1);
        assert_eq!(segment.start(), start);
        assert_eq!(segment.end(), end);
        assert_eq!(segment.first_kind(), CurveKind::Circular);
        assert_relative_eq!(arena.edge_length(segment.first_edge()).unwrap(), PI, epsilon = 1e-2);
    }

    #[test]
    fn reversed_edge_curve_runs_back_along_its_geometry() {
        let curve = CurveDescription::new(
            EntityRef(1),
            CurveGeometry::EdgeCurve {
                start: pt(-1.0, 0.0),
                end: pt(1.0, 0.0),
                geometry: EdgeGeometry::Bounded(Box::new(half_circle(2))),
                same_sense: false,
            },
        );
        let (arena, result) = convert(&curve, &mut Vec::new());
        let segment = result.unwrap();
        assert_eq!(segment.start(), pt(-1.0, 0.0));
        let EdgeCurve::Circle(arc) = &arena.edge(segment.first_edge()).unwrap().curve else {
            panic!("expected a circular edge");
        };
        assert_relative_eq!(arc.start_angle, PI, epsilon = 1e-12);
        assert_relative_eq!(arc.sweep, -PI, epsilon = 1e-12);
    }

    #[test]
    fn multi_edge_curve_rebinds_only_outer_ends() {
        let polyline = CurveDescription::new(
            EntityRef(2),
            CurveGeometry::Polyline(vec![pt(0.0, 0.0), pt(1.0, 0.0), pt(1.0, 1.0)]),
        );
        let curve = CurveDescription::new(
            EntityRef(1),
            CurveGeometry::EdgeCurve {
                start: pt(0.0, 5e-6),
                end: pt(1.0 + 5e-6, 1.0),
                geometry: EdgeGeometry::Bounded(Box::new(polyline)),
                same_sense: true,
            },
        );
        let (arena, result) = convert(&curve, &mut Vec::new());
        let segment = result.unwrap();
        assert_eq!(segment.edges().len(), 2);
        assert_eq!(segment.start(), pt(0.0, 5e-6));
        assert_eq!(segment.end(), pt(1.0 + 5e-6, 1.0));

        // The corner stays shared between both edges
        let first = arena.edge(segment.edges()[0]).unwrap();
        let second = arena.edge(segment.edges()[1]).unwrap();
        assert_eq!(first.end, second.start);
        assert_eq!(arena.vertex_point(first.end), Some(pt(1.0, 0.0)));
    }

    #[test]
    fn unbounded_circle_is_cut_between_vertices() {
        let curve = CurveDescription::new(
            EntityRef(1),
            CurveGeometry::EdgeCurve {
                start: pt(0.0, 1.0),
                end: pt(-1.0, 0.0),
                geometry: EdgeGeometry::Unbounded(BasisCurve::Circle {
                    position: Placement::xy(Point3::origin()),
                    radius: 1.0,
                }),
                same_sense: true,
            },
        );
        let (arena, result) = convert(&curve, &mut Vec::new());
        let segment = result.unwrap();
        assert_eq!(segment.first_kind(), CurveKind::Circular);
        assert_relative_eq!(
            arena.edge_length(segment.first_edge()).unwrap(),
            FRAC_PI_2,
            epsilon = 1e-2
        );
    }

    #[test]
    fn false_orientation_reverses_edge() {
        let curve = oriented(1, edge(2, pt(0.0, 0.0), pt(2.0, 0.0)), false);
        let (_, result) = convert(&curve, &mut Vec::new());
        let segment = result.unwrap();
        assert_eq!(segment.start(), pt(2.0, 0.0));
        assert_eq!(segment.end(), pt(0.0, 0.0));
    }

    #[test]
    fn subedge_keeps_parent_curve_between_own_vertices() {
        let parent = CurveDescription::new(
            EntityRef(2),
            CurveGeometry::EdgeCurve {
                start: pt(1.0, 0.0),
                end: pt(-1.0, 0.0),
                geometry: EdgeGeometry::Bounded(Box::new(half_circle(3))),
                same_sense: true,
            },
        );
        let curve = CurveDescription::new(
            EntityRef(1),
            CurveGeometry::Subedge {
                start: pt(0.0, 1.0),
                end: pt(-1.0, 0.0),
                parent: Box::new(parent),
            },
        );
        let (arena, result) = convert(&curve, &mut Vec::new());
        let segment = result.unwrap();
        assert_eq!(segment.start(), pt(0.0, 1.0));
        assert_eq!(segment.first_kind(), CurveKind::Circular);
        // Only the quarter from the top to (-1, 0) remains
        assert_relative_eq!(
            arena.edge_length(segment.first_edge()).unwrap(),
            FRAC_PI_2,
            epsilon = 1e-2
        );
    }

    #[test]
    fn edge_loop_chains_oriented_edges() {
        // Second edge is stored backwards and flipped by its orientation
        let edges = vec![
            oriented(11, edge(21, pt(0.0, 0.0), pt(1.0, 0.0)), true),
            oriented(12, edge(22, pt(1.0, 1.0), pt(1.0, 0.0)), false),
            oriented(13, edge(23, pt(1.0, 1.0), pt(0.0, 0.0)), true),
        ];
        let mut arena = TopologyArena::new();
        let mut reports: Vec<Report> = Vec::new();
        let wire = convert_edge_loop(
            &CurveConverter,
            &mut arena,
            EntityRef(1),
            &edges,
            &WireConfig::new(P),
            &mut reports,
        )
        .unwrap();
        assert_eq!(wire.len(), 3);
        assert!(wire.closed);
        assert!(reports.is_empty());
    }

    #[test]
    fn edge_loop_skips_edges_that_fail() {
        let broken = CurveDescription::new(EntityRef(30), CurveGeometry::Spline(vec![]));
        let edges = vec![
            oriented(11, edge(21, pt(0.0, 0.0), pt(1.0, 0.0)), true),
            oriented(12, broken, true),
            oriented(13, edge(23, pt(1.0, 0.0), pt(1.0, 1.0)), true),
        ];
        let mut arena = TopologyArena::new();
        let mut reports: Vec<Report> = Vec::new();
        let wire = convert_edge_loop(
            &CurveConverter,
            &mut arena,
            EntityRef(1),
            &edges,
            &WireConfig::new(P),
            &mut reports,
        )
        .unwrap();
        assert_eq!(wire.len(), 2);
        assert!(!wire.closed);
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].entity, EntityRef(12));
        assert!(matches!(reports[0].kind, ReportKind::SegmentConversionFailed { .. }));
    }

    #[test]
    fn edge_loop_reports_disconnected_edge() {
        let edges = vec![
            edge(21, pt(0.0, 0.0), pt(1.0, 0.0)),
            edge(22, pt(5.0, 0.0), pt(6.0, 0.0)),
        ];
        let mut arena = TopologyArena::new();
        let mut reports: Vec<Report> = Vec::new();
        let wire = convert_edge_loop(
            &CurveConverter,
            &mut arena,
            EntityRef(1),
            &edges,
            &WireConfig::new(P),
            &mut reports,
        )
        .unwrap();
        assert_eq!(wire.len(), 1);
        assert_eq!(reports[0].kind, ReportKind::DisconnectedSegments);
        assert_eq!(reports[0].entity, EntityRef(22));
    }

    #[test]
    fn empty_edge_loop_fails() {
        let mut arena = TopologyArena::new();
        let result = convert_edge_loop(
            &CurveConverter,
            &mut arena,
            EntityRef(1),
            &[],
            &WireConfig::new(P),
            &mut Vec::new(),
        );
        assert!(matches!(result, Err(Error::EmptyWire(EntityRef(1)))));
    }
}
