// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Curve descriptions and their conversion to segments.
//!
//! The descriptions mirror the IFC curve entities the assembler consumes,
//! already resolved from the entity graph: coordinates are in resolved
//! length units, parameters are raw model values.

use std::f64::consts::{FRAC_PI_2, TAU};

use ifc_wire_topology::{ConicArc, EdgeCurve, TopologyArena, VertexKey};
use nalgebra::{Point3, Vector3};

use crate::assembler::assemble_composite;
use crate::config::WireConfig;
use crate::edges::{
    convert_edge_curve, convert_edge_loop, convert_oriented_edge, convert_subedge, EdgeGeometry,
};
use crate::error::{Error, Result};
use crate::polygon::convert_polyline;
use crate::report::{EntityRef, Report, ReportKind, ReportSink};
use crate::segment::{Segment, SegmentConverter};

/// Parameter differences closer than this to a multiple of 2π denote a full conic.
const FULL_TURN_EPS: f64 = 1e-9;

/// A curve entity and its geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct CurveDescription {
    pub entity: EntityRef,
    pub geometry: CurveGeometry,
}

impl CurveDescription {
    pub fn new(entity: EntityRef, geometry: CurveGeometry) -> Self {
        Self { entity, geometry }
    }

    /// Returns `true` if converting the curve depends on the plane angle unit.
    pub fn uses_angle_parameters(&self) -> bool {
        match &self.geometry {
            CurveGeometry::Trimmed(trimmed) => trimmed.basis.is_conic(),
            CurveGeometry::Composite(composite) => composite
                .segments
                .iter()
                .any(|part| part.parent.uses_angle_parameters()),
            CurveGeometry::EdgeCurve {
                geometry: EdgeGeometry::Bounded(curve),
                ..
            } => curve.uses_angle_parameters(),
            CurveGeometry::OrientedEdge { edge, .. } => edge.uses_angle_parameters(),
            CurveGeometry::EdgeLoop(edges) => edges.iter().any(|e| e.uses_angle_parameters()),
            CurveGeometry::Subedge { parent, .. } => parent.uses_angle_parameters(),
            CurveGeometry::OpenProfile(curve) => curve.uses_angle_parameters(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CurveGeometry {
    /// Straight edge between two points.
    Line { start: Point3<f64>, end: Point3<f64> },
    Polyline(Vec<Point3<f64>>),
    /// Closed face boundary given by its corner points.
    PolyLoop(Vec<Point3<f64>>),
    Trimmed(TrimmedCurve),
    /// Bézier curve given by its control points.
    Spline(Vec<Point3<f64>>),
    IndexedPolyCurve {
        points: Vec<Point3<f64>>,
        segments: Option<Vec<IndexSegment>>,
    },
    Composite(CompositeCurve),
    /// Straight edge between two vertex points.
    Edge { start: Point3<f64>, end: Point3<f64> },
    /// Edge whose geometry is a curve, bounded by two vertex points.
    EdgeCurve {
        start: Point3<f64>,
        end: Point3<f64>,
        geometry: EdgeGeometry,
        /// `false` when the edge runs against its geometry.
        same_sense: bool,
    },
    OrientedEdge {
        edge: Box<CurveDescription>,
        orientation: bool,
    },
    /// Closed chain of oriented edges.
    EdgeLoop(Vec<CurveDescription>),
    /// Part of a parent edge between two vertex points.
    Subedge {
        start: Point3<f64>,
        end: Point3<f64>,
        parent: Box<CurveDescription>,
    },
    /// Open profile, converted as the curve it wraps.
    OpenProfile(Box<CurveDescription>),
}

impl CurveGeometry {
    pub fn type_name(&self) -> &'static str {
        match self {
            CurveGeometry::Line { .. } => "Line",
            CurveGeometry::Polyline(_) => "Polyline",
            CurveGeometry::PolyLoop(_) => "PolyLoop",
            CurveGeometry::Trimmed(_) => "TrimmedCurve",
            CurveGeometry::Spline(_) => "BSplineCurve",
            CurveGeometry::IndexedPolyCurve { .. } => "IndexedPolyCurve",
            CurveGeometry::Composite(_) => "CompositeCurve",
            CurveGeometry::Edge { .. } => "Edge",
            CurveGeometry::EdgeCurve { .. } => "EdgeCurve",
            CurveGeometry::OrientedEdge { .. } => "OrientedEdge",
            CurveGeometry::EdgeLoop(_) => "EdgeLoop",
            CurveGeometry::Subedge { .. } => "Subedge",
            CurveGeometry::OpenProfile(_) => "ArbitraryOpenProfileDef",
        }
    }
}

/// Position and orientation of a conic.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub location: Point3<f64>,
    /// Normal of the conic plane.
    pub axis: Vector3<f64>,
    /// Direction of parameter 0.
    pub ref_direction: Vector3<f64>,
}

impl Placement {
    /// Placement in the XY plane.
    pub fn xy(location: Point3<f64>) -> Self {
        Self {
            location,
            axis: Vector3::z(),
            ref_direction: Vector3::x(),
        }
    }

    /// Orthonormal in-plane axes.
    fn frame(&self) -> Result<(Vector3<f64>, Vector3<f64>)> {
        let z = self
            .axis
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| invalid("placement axis has zero length"))?;
        let x = (self.ref_direction - z * self.ref_direction.dot(&z))
            .try_normalize(f64::EPSILON)
            .ok_or_else(|| invalid("placement reference direction is parallel to its axis"))?;
        Ok((x, z.cross(&x)))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BasisCurve {
    Line {
        origin: Point3<f64>,
        /// Parameters are measured in multiples of this vector's length.
        direction: Vector3<f64>,
    },
    Circle {
        position: Placement,
        radius: f64,
    },
    Ellipse {
        position: Placement,
        semi_axis1: f64,
        semi_axis2: f64,
    },
}

impl BasisCurve {
    pub fn is_conic(&self) -> bool {
        !matches!(self, BasisCurve::Line { .. })
    }
}

/// One end of a trimmed curve: a point, a parameter, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Trim {
    pub point: Option<Point3<f64>>,
    pub parameter: Option<f64>,
}

impl Trim {
    pub fn parameter(value: f64) -> Self {
        Self {
            point: None,
            parameter: Some(value),
        }
    }

    pub fn point(point: Point3<f64>) -> Self {
        Self {
            point: Some(point),
            parameter: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrimmedCurve {
    pub basis: BasisCurve,
    pub trim1: Trim,
    pub trim2: Trim,
    /// `false` when the curve runs against the basis direction.
    pub sense_agreement: bool,
    /// Use trim points rather than parameters when both are available.
    pub prefer_cartesian: bool,
}

/// A 1-based index segment of an indexed poly curve.
#[derive(Debug, Clone, PartialEq)]
pub enum IndexSegment {
    /// Straight edges through the listed points.
    Line(Vec<usize>),
    /// Circular arc from the first to the third point through the second.
    Arc([usize; 3]),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeSegment {
    pub same_sense: bool,
    pub parent: CurveDescription,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeCurve {
    pub segments: Vec<CompositeSegment>,
    /// The curve bounds a profile and must be closed.
    pub bounds_profile: bool,
}

/// Default converter for all [`CurveGeometry`] variants.
#[derive(Debug, Default, Clone, Copy)]
pub struct CurveConverter;

impl SegmentConverter for CurveConverter {
    fn convert(
        &self,
        arena: &mut TopologyArena,
        curve: &CurveDescription,
        config: &WireConfig,
        sink: &mut dyn ReportSink,
    ) -> Result<Segment> {
        let entity = curve.entity;
        let tolerance = config.precision;
        match &curve.geometry {
            CurveGeometry::Line { start, end } => {
                let edge = arena.add_line_between(*start, *end, tolerance)?;
                Segment::new(arena, &[edge])
            }
            CurveGeometry::Polyline(points) => {
                convert_polyline(arena, entity, points, config, sink)
            }
            CurveGeometry::PolyLoop(points) => {
                let edges = arena.add_polygon(points, true, tolerance)?;
                Segment::new(arena, &edges)
            }
            CurveGeometry::Trimmed(trimmed) => {
                self.convert_trimmed(arena, entity, trimmed, config, sink)
            }
            CurveGeometry::Spline(control) => {
                if control.len() < 2 {
                    return Err(Error::conversion(entity, "spline needs at least 2 control points"));
                }
                let edge = arena.add_curve_edge(EdgeCurve::Spline(control.clone()), tolerance)?;
                Segment::new(arena, &[edge])
            }
            CurveGeometry::IndexedPolyCurve { points, segments } => {
                convert_indexed(arena, entity, points, segments.as_deref(), tolerance)
            }
            CurveGeometry::Composite(composite) => {
                let nested = assemble_composite(self, arena, entity, composite, config, sink)?;
                nested.to_segment(arena)
            }
            CurveGeometry::Edge { start, end } => {
                let edge = arena.add_line_between(*start, *end, tolerance)?;
                Segment::new(arena, &[edge])
            }
            CurveGeometry::EdgeCurve {
                start,
                end,
                geometry,
                same_sense,
            } => convert_edge_curve(
                self,
                arena,
                entity,
                *start,
                *end,
                geometry,
                *same_sense,
                config,
                sink,
            ),
            CurveGeometry::OrientedEdge { edge, orientation } => {
                convert_oriented_edge(self, arena, edge, *orientation, config, sink)
            }
            CurveGeometry::EdgeLoop(edges) => {
                convert_edge_loop(self, arena, entity, edges, config, sink)?.to_segment(arena)
            }
            CurveGeometry::Subedge { start, end, parent } => {
                convert_subedge(self, arena, *start, *end, parent, config, sink)
            }
            CurveGeometry::OpenProfile(curve) => self.convert(arena, curve, config, sink),
        }
    }
}

impl CurveConverter {
    fn convert_trimmed(
        &self,
        arena: &mut TopologyArena,
        entity: EntityRef,
        trimmed: &TrimmedCurve,
        config: &WireConfig,
        sink: &mut dyn ReportSink,
    ) -> Result<Segment> {
        // Against the basis direction: trim the other way round, reverse after
        let (trim1, trim2) = if trimmed.sense_agreement {
            (&trimmed.trim1, &trimmed.trim2)
        } else {
            (&trimmed.trim2, &trimmed.trim1)
        };
        let tolerance = config.precision;
        let min_length = config.min_trim_length();

        let points = (trim1.point, trim2.point);
        let parameters = (trim1.parameter, trim2.parameter);
        let edge = match (trimmed.prefer_cartesian, points, parameters) {
            (true, (Some(p1), Some(p2)), _) => {
                check_chord(entity, p1, p2, min_length, sink)?;
                let v1 = arena.add_vertex_with_tolerance(p1, tolerance);
                let v2 = arena.add_vertex_with_tolerance(p2, tolerance);
                match conic_through(&trimmed.basis, p1, p2).map_err(|e| at(entity, e))? {
                    Some(curve) => arena.add_edge(v1, v2, curve)?,
                    None => arena.add_line(v1, v2)?,
                }
            }
            (_, _, (Some(t1), Some(t2))) => {
                let factor = if trimmed.basis.is_conic() {
                    config
                        .plane_angle_unit
                        .ok_or(Error::MissingAngleUnit(entity))?
                } else {
                    config.length_unit
                };
                let curve = trim_by_parameters(&trimmed.basis, t1 * factor, t2 * factor)
                    .map_err(|e| at(entity, e))?;
                let length = match &curve {
                    TrimmedEdge::Line(a, b) => (b - a).norm(),
                    TrimmedEdge::Conic(curve) => curve_length(curve),
                };
                if length < min_length {
                    sink.report(Report::new(ReportKind::ShortTrimSkipped { length }, entity));
                    return Err(Error::conversion(
                        entity,
                        "trimmed curve is shorter than the precision",
                    ));
                }
                match curve {
                    TrimmedEdge::Line(a, b) => arena.add_line_between(a, b, tolerance)?,
                    TrimmedEdge::Conic(curve) => arena.add_curve_edge(curve, tolerance)?,
                }
            }
            // Parameters preferred but only points given: straight chord
            (false, (Some(p1), Some(p2)), _) => {
                check_chord(entity, p1, p2, min_length, sink)?;
                tracing::debug!(entity = %entity, "trimmed curve falls back to its chord");
                arena.add_line_between(p1, p2, tolerance)?
            }
            _ => return Err(Error::conversion(entity, "trimmed curve lacks usable trims")),
        };

        let segment = Segment::new(arena, &[edge])?;
        if trimmed.sense_agreement {
            Ok(segment)
        } else {
            segment.reversed(arena)
        }
    }
}

/// Skips trim points closer together than `min_length`.
fn check_chord(
    entity: EntityRef,
    p1: Point3<f64>,
    p2: Point3<f64>,
    min_length: f64,
    sink: &mut dyn ReportSink,
) -> Result<()> {
    let length = (p2 - p1).norm();
    if length < min_length {
        sink.report(Report::new(ReportKind::ShortTrimSkipped { length }, entity));
        return Err(Error::conversion(entity, "trim points coincide"));
    }
    Ok(())
}

enum TrimmedEdge {
    Line(Point3<f64>, Point3<f64>),
    Conic(EdgeCurve),
}

/// Builds the trimmed edge between two scaled parameter values.
fn trim_by_parameters(
    basis: &BasisCurve,
    t1: f64,
    t2: f64,
) -> std::result::Result<TrimmedEdge, String> {
    match basis {
        BasisCurve::Line { origin, direction } => {
            let magnitude = direction.norm();
            let unit = direction
                .try_normalize(f64::EPSILON)
                .ok_or_else(|| "line direction has zero length".to_string())?;
            Ok(TrimmedEdge::Line(
                origin + unit * (t1 * magnitude),
                origin + unit * (t2 * magnitude),
            ))
        }
        BasisCurve::Circle { position, radius } => {
            let arc = conic_arc(position, *radius, *radius, t1, t2)?;
            Ok(TrimmedEdge::Conic(EdgeCurve::Circle(arc)))
        }
        BasisCurve::Ellipse {
            position,
            semi_axis1,
            semi_axis2,
        } => {
            if semi_axis2 > semi_axis1 {
                // Major axis first: rotate the frame by a quarter turn
                let rotated = rotate_quarter(position)?;
                let arc = conic_arc(
                    &rotated,
                    *semi_axis2,
                    *semi_axis1,
                    t1 - FRAC_PI_2,
                    t2 - FRAC_PI_2,
                )?;
                Ok(TrimmedEdge::Conic(EdgeCurve::Ellipse(arc)))
            } else {
                let arc = conic_arc(position, *semi_axis1, *semi_axis2, t1, t2)?;
                Ok(TrimmedEdge::Conic(EdgeCurve::Ellipse(arc)))
            }
        }
    }
}

/// Counter-clockwise arc from `t1` to `t2`; a whole turn gives the full conic.
fn conic_arc(
    position: &Placement,
    semi_axis1: f64,
    semi_axis2: f64,
    t1: f64,
    t2: f64,
) -> std::result::Result<ConicArc, String> {
    if !(semi_axis1 > 0.0 && semi_axis2 > 0.0) {
        return Err("conic radius must be positive".into());
    }
    let (x_axis, y_axis) = position.frame().map_err(|e| e.to_string())?;
    let sweep = (t2 - t1).rem_euclid(TAU);
    let sweep = if sweep < FULL_TURN_EPS || TAU - sweep < FULL_TURN_EPS {
        TAU
    } else {
        sweep
    };
    Ok(ConicArc {
        center: position.location,
        x_axis,
        y_axis,
        semi_axis1,
        semi_axis2,
        start_angle: t1,
        sweep,
    })
}

fn rotate_quarter(position: &Placement) -> std::result::Result<Placement, String> {
    let (x, y) = position.frame().map_err(|e| e.to_string())?;
    Ok(Placement {
        location: position.location,
        axis: x.cross(&y),
        ref_direction: y,
    })
}

/// Conic arc running counter-clockwise between two points on it, or `None`
/// for a line basis.
pub(crate) fn conic_through(
    basis: &BasisCurve,
    p1: Point3<f64>,
    p2: Point3<f64>,
) -> std::result::Result<Option<EdgeCurve>, String> {
    let (position, a, b, circular) = match basis {
        BasisCurve::Line { .. } => return Ok(None),
        BasisCurve::Circle { position, radius } => (position, *radius, *radius, true),
        BasisCurve::Ellipse {
            position,
            semi_axis1,
            semi_axis2,
        } => (position, *semi_axis1, *semi_axis2, false),
    };
    let (x_axis, y_axis) = position.frame().map_err(|e| e.to_string())?;
    let angle_of = |p: Point3<f64>| {
        let d = p - position.location;
        (d.dot(&y_axis) / b).atan2(d.dot(&x_axis) / a)
    };
    let start = angle_of(p1);
    let end = angle_of(p2);
    let arc = conic_arc(position, a, b, start, end)?;
    Ok(Some(if circular {
        EdgeCurve::Circle(arc)
    } else {
        EdgeCurve::Ellipse(arc)
    }))
}

fn curve_length(curve: &EdgeCurve) -> f64 {
    match curve {
        EdgeCurve::Circle(arc) | EdgeCurve::Ellipse(arc) => arc.length(),
        _ => 0.0,
    }
}

fn invalid(message: &str) -> Error {
    Error::Topology(ifc_wire_topology::Error::InvalidCurve(message.into()))
}

fn at(entity: EntityRef, reason: String) -> Error {
    Error::Conversion { entity, reason }
}

/// Converts an indexed poly curve, sharing one vertex per referenced point.
fn convert_indexed(
    arena: &mut TopologyArena,
    entity: EntityRef,
    points: &[Point3<f64>],
    segments: Option<&[IndexSegment]>,
    tolerance: f64,
) -> Result<Segment> {
    let mut vertices: Vec<Option<VertexKey>> = vec![None; points.len()];
    let mut vertex = |arena: &mut TopologyArena, index: usize| -> Result<(VertexKey, Point3<f64>)> {
        // Indices are 1-based
        let slot = index
            .checked_sub(1)
            .filter(|&i| i < points.len())
            .ok_or(Error::InvalidIndex {
                entity,
                index,
                len: points.len(),
            })?;
        let key = *vertices[slot]
            .get_or_insert_with(|| arena.add_vertex_with_tolerance(points[slot], tolerance));
        Ok((key, points[slot]))
    };

    let default_run;
    let segments = match segments {
        Some(segments) => segments,
        None => {
            if points.len() < 2 {
                return Err(Error::conversion(entity, "indexed poly curve needs at least 2 points"));
            }
            default_run = [IndexSegment::Line((1..=points.len()).collect())];
            &default_run[..]
        }
    };

    let mut edges = Vec::new();
    for segment in segments {
        match segment {
            IndexSegment::Line(indices) => {
                if indices.len() < 2 {
                    return Err(Error::conversion(entity, "line index needs at least 2 points"));
                }
                for pair in indices.windows(2) {
                    let (v1, _) = vertex(arena, pair[0])?;
                    let (v2, _) = vertex(arena, pair[1])?;
                    edges.push(arena.add_line(v1, v2)?);
                }
            }
            IndexSegment::Arc([i1, i2, i3]) => {
                let (v1, p1) = vertex(arena, *i1)?;
                let (_, p2) = vertex(arena, *i2)?;
                let (v3, p3) = vertex(arena, *i3)?;
                let arc = arc_through(p1, p2, p3)
                    .ok_or_else(|| Error::conversion(entity, "arc index points are collinear"))?;
                edges.push(arena.add_edge(v1, v3, EdgeCurve::Circle(arc))?);
            }
        }
    }
    Segment::new(arena, &edges)
}

/// Circular arc from `p1` to `p3` passing through `p2`.
fn arc_through(p1: Point3<f64>, p2: Point3<f64>, p3: Point3<f64>) -> Option<ConicArc> {
    let ab = p2 - p1;
    let ac = p3 - p1;
    let n = ab.cross(&ac);
    let n_sq = n.norm_squared();
    if n_sq < 1e-20 {
        return None;
    }
    let offset =
        (n.cross(&ab) * ac.norm_squared() + ac.cross(&n) * ab.norm_squared()) / (2.0 * n_sq);
    let center = p1 + offset;
    let radius = offset.norm();

    let x_axis = (p1 - center) / radius;
    // n follows the p1 -> p2 -> p3 turn, so p3 lies at a positive angle
    let y_axis = n.normalize().cross(&x_axis);
    let d3 = p3 - center;
    let sweep = d3.dot(&y_axis).atan2(d3.dot(&x_axis)).rem_euclid(TAU);
    Some(ConicArc::circle(center, x_axis, y_axis, radius, 0.0, sweep))
}
