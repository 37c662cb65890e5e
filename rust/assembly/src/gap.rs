// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Joining two consecutive segments.
//!
//! With `d` the distance from the end of segment A to the start of segment B
//! and `p` the precision:
//!
//! | distance | repair |
//! |---|---|
//! | `d < p` | none |
//! | `d > 1000p` | straight connector edge from A to B |
//! | otherwise, A ends in a line | that line is rebuilt to end at B's start |
//! | otherwise, B starts with a line | B's first line will start at A's end |
//! | otherwise | straight connector edge |
//!
//! Moving B's start cannot happen while A is appended, since B has not been
//! appended yet. The resolver instead returns a [`StartOverride`] that the
//! caller passes back in when B becomes the next pair's A.

use ifc_wire_topology::{EdgeKey, TopologyArena, VertexKey, WireBuilder, WireError};
use nalgebra::Point3;

use crate::config::WireConfig;
use crate::error::Result;
use crate::report::{EntityRef, Report, ReportKind, ReportSink};
use crate::segment::Segment;

/// Repair performed at one junction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapRepair {
    /// The end points already coincide.
    None,
    /// A's trailing straight edge was rebuilt to end at B's start.
    EndAdjusted,
    /// B's leading straight edge will be rebuilt to start at A's end.
    NextStartAdjusted,
    /// A synthetic straight edge was inserted.
    ConnectorInserted,
}

/// Pending move of the next segment's start vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StartOverride {
    pub vertex: VertexKey,
    pub point: Point3<f64>,
}

/// Outcome of resolving one pair.
#[derive(Debug, Clone, PartialEq)]
pub struct PairResolution {
    pub repair: GapRepair,
    /// Distance between A's end and B's start, after any incoming override.
    pub distance: f64,
    /// Must be passed to the call that appends B.
    pub next_override: Option<StartOverride>,
    /// A junction had more than one candidate edge.
    pub inconsistent: bool,
}

impl PairResolution {
    fn new(repair: GapRepair, distance: f64) -> Self {
        Self {
            repair,
            distance,
            next_override: None,
            inconsistent: false,
        }
    }
}

pub struct GapResolver<'a> {
    config: &'a WireConfig,
    entity: EntityRef,
}

impl<'a> GapResolver<'a> {
    pub fn new(config: &'a WireConfig, entity: EntityRef) -> Self {
        Self { config, entity }
    }

    /// Applies a pending override to a segment about to be appended.
    pub fn apply_override(
        &self,
        arena: &mut TopologyArena,
        segment: &Segment,
        pending: Option<StartOverride>,
    ) -> Result<Segment> {
        match pending {
            Some(start) if start.vertex != segment.start_vertex() => {
                segment.with_start_at(arena, start.vertex)
            }
            _ => Ok(segment.clone()),
        }
    }

    /// Appends A to the builder and repairs the junction between A and B.
    ///
    /// B itself is not appended; that happens when it becomes the next A, or
    /// through [`GapResolver::append_last`].
    #[allow(clippy::too_many_arguments)]
    pub fn resolve(
        &self,
        arena: &mut TopologyArena,
        builder: &mut WireBuilder,
        a: &Segment,
        b: &Segment,
        pending: Option<StartOverride>,
        is_closing_pair: bool,
        sink: &mut dyn ReportSink,
    ) -> Result<PairResolution> {
        let a = self.apply_override(arena, a, pending)?;
        let distance = a.gap_to(b);

        if distance < self.config.join_threshold() {
            self.append(arena, builder, a.edges(), sink);
            return Ok(PairResolution::new(GapRepair::None, distance));
        }

        if distance > self.config.gap_insert_threshold() {
            self.append(arena, builder, a.edges(), sink);
            self.append_connector(arena, builder, &a, b, distance, sink)?;
            return Ok(PairResolution::new(GapRepair::ConnectorInserted, distance));
        }

        let end_candidates = arena.incident_edges(a.end_vertex(), a.edges()).len();
        let start_candidates = arena.incident_edges(b.start_vertex(), b.edges()).len();
        if end_candidates != 1 || start_candidates != 1 {
            tracing::debug!(
                entity = %self.entity,
                end_candidates,
                start_candidates,
                "ambiguous junction"
            );
            sink.report(Report::new(ReportKind::InconsistentSegments, self.entity));
            self.append(arena, builder, a.edges(), sink);
            return Ok(PairResolution {
                inconsistent: true,
                ..PairResolution::new(GapRepair::None, distance)
            });
        }

        if a.last_kind().is_linear() {
            let adjusted = a.with_end_at(arena, b.start_vertex())?;
            self.append(arena, builder, adjusted.edges(), sink);
            self.report_adjustment(distance, sink);
            Ok(PairResolution::new(GapRepair::EndAdjusted, distance))
        } else if b.first_kind().is_linear() && !is_closing_pair {
            self.append(arena, builder, a.edges(), sink);
            self.report_adjustment(distance, sink);
            Ok(PairResolution {
                next_override: Some(StartOverride {
                    vertex: a.end_vertex(),
                    point: a.end(),
                }),
                ..PairResolution::new(GapRepair::NextStartAdjusted, distance)
            })
        } else {
            self.append(arena, builder, a.edges(), sink);
            self.append_connector(arena, builder, &a, b, distance, sink)?;
            Ok(PairResolution::new(GapRepair::ConnectorInserted, distance))
        }
    }

    /// Appends the final segment of an open loop, honouring a pending override.
    pub fn append_last(
        &self,
        arena: &mut TopologyArena,
        builder: &mut WireBuilder,
        segment: &Segment,
        pending: Option<StartOverride>,
        sink: &mut dyn ReportSink,
    ) -> Result<()> {
        let segment = self.apply_override(arena, segment, pending)?;
        self.append(arena, builder, segment.edges(), sink);
        Ok(())
    }

    fn append_connector(
        &self,
        arena: &mut TopologyArena,
        builder: &mut WireBuilder,
        a: &Segment,
        b: &Segment,
        distance: f64,
        sink: &mut dyn ReportSink,
    ) -> Result<()> {
        let connector = arena.add_line(a.end_vertex(), b.start_vertex())?;
        self.append(arena, builder, &[connector], sink);
        sink.report(Report::new(ReportKind::GapBridged { distance }, self.entity));
        Ok(())
    }

    fn report_adjustment(&self, distance: f64, sink: &mut dyn ReportSink) {
        sink.report(Report::new(ReportKind::EndpointAdjusted { distance }, self.entity));
    }

    fn append(
        &self,
        arena: &TopologyArena,
        builder: &mut WireBuilder,
        edges: &[EdgeKey],
        sink: &mut dyn ReportSink,
    ) {
        let kind = match builder.add(arena, edges) {
            None => return,
            Some(WireError::NonManifoldWire) => ReportKind::NonManifoldSegments,
            Some(WireError::DisconnectedWire) => ReportKind::DisconnectedSegments,
        };
        sink.report(Report::new(kind, self.entity));
    }
}
