// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Point-list curves: polylines and polygon loops.

use ifc_wire_topology::TopologyArena;
use nalgebra::Point3;

use crate::config::WireConfig;
use crate::error::{Error, Result};
use crate::intersect::SelfIntersectionResolver;
use crate::report::{EntityRef, Report, ReportKind, ReportSink};
use crate::segment::{Loop, Segment};

/// Removes near-duplicate points from a point loop.
pub struct DegenerateLoopCleaner {
    epsilon: f64,
    entity: EntityRef,
}

impl DegenerateLoopCleaner {
    pub fn new(config: &WireConfig, entity: EntityRef) -> Self {
        Self {
            epsilon: config.duplicate_epsilon(),
            entity,
        }
    }

    /// Returns the cleaned points.
    ///
    /// For a closed loop a last point repeating the first is dropped without
    /// being counted; it only marks the closure. Fails when a closed loop is
    /// left with fewer than 3 points.
    pub fn clean(
        &self,
        points: &[Point3<f64>],
        treat_as_closed: bool,
        sink: &mut dyn ReportSink,
    ) -> Result<Vec<Point3<f64>>> {
        let (kept, removed) = self.strip(points, treat_as_closed);
        self.finish(kept, removed, treat_as_closed, sink)
    }

    /// Like [`DegenerateLoopCleaner::clean`] for a loop that is closed by
    /// definition. Every dropped point is counted, a repeated closing point
    /// included.
    pub fn clean_loop(
        &self,
        points: &[Point3<f64>],
        sink: &mut dyn ReportSink,
    ) -> Result<Vec<Point3<f64>>> {
        let (kept, _) = self.strip(points, true);
        let removed = points.len() - kept.len();
        self.finish(kept, removed, true, sink)
    }

    // Removed count excludes the closure marker.
    fn strip(&self, points: &[Point3<f64>], treat_as_closed: bool) -> (Vec<Point3<f64>>, usize) {
        let mut input = points;
        if treat_as_closed {
            if let [first, .., last] = points {
                if (last - first).norm() < self.epsilon {
                    input = &points[..points.len() - 1];
                }
            }
        }

        let mut kept: Vec<Point3<f64>> = Vec::with_capacity(input.len());
        let mut removed = 0;
        for point in input {
            match kept.last() {
                Some(prev) if (point - prev).norm() < self.epsilon => removed += 1,
                _ => kept.push(*point),
            }
        }
        if treat_as_closed {
            while kept.len() > 1 && (kept[kept.len() - 1] - kept[0]).norm() < self.epsilon {
                kept.pop();
                removed += 1;
            }
        }
        (kept, removed)
    }

    fn finish(
        &self,
        kept: Vec<Point3<f64>>,
        removed: usize,
        treat_as_closed: bool,
        sink: &mut dyn ReportSink,
    ) -> Result<Vec<Point3<f64>>> {
        if removed > 0 {
            sink.report(Report::new(ReportKind::PointsRemoved { count: removed }, self.entity));
        }

        if treat_as_closed && kept.len() < 3 {
            sink.report(Report::new(
                ReportKind::InsufficientPoints {
                    remaining: kept.len(),
                },
                self.entity,
            ));
            return Err(Error::InsufficientPoints {
                entity: self.entity,
                remaining: kept.len(),
            });
        }

        Ok(kept)
    }
}

/// Converts a polyline to one segment.
///
/// A polyline whose last point returns to its first within the duplicate
/// epsilon is closed by proximity and built as a closed polygon.
pub fn convert_polyline(
    arena: &mut TopologyArena,
    entity: EntityRef,
    points: &[Point3<f64>],
    config: &WireConfig,
    sink: &mut dyn ReportSink,
) -> Result<Segment> {
    let closed = match points {
        [first, .., last] => (last - first).norm() < config.duplicate_epsilon(),
        _ => false,
    };
    let cleaned = DegenerateLoopCleaner::new(config, entity).clean(points, closed, sink)?;
    if cleaned.len() < 2 {
        return Err(Error::conversion(entity, "polyline needs at least 2 distinct points"));
    }

    let edges = arena.add_polygon(&cleaned, closed, config.precision)?;
    Segment::new(arena, &edges)
}

/// Converts a polygon face boundary to a closed loop free of self-crossings.
pub fn convert_polyloop(
    arena: &mut TopologyArena,
    entity: EntityRef,
    points: &[Point3<f64>],
    config: &WireConfig,
    sink: &mut dyn ReportSink,
) -> Result<Loop> {
    if points.len() < 3 {
        sink.report(Report::new(
            ReportKind::InsufficientPoints {
                remaining: points.len(),
            },
            entity,
        ));
        return Err(Error::InsufficientPoints {
            entity,
            remaining: points.len(),
        });
    }

    let cleaned = DegenerateLoopCleaner::new(config, entity).clean_loop(points, sink)?;
    let edges = arena.add_polygon(&cleaned, true, config.precision)?;
    let polygon = Loop::from_edges(arena, edges, config.join_threshold());

    SelfIntersectionResolver::new(config, entity).resolve(arena, polygon, sink)
}
