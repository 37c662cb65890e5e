// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Loop assembly: walking a segment list and joining every junction.

use ifc_wire_topology::{TopologyArena, WireBuilder};

use crate::config::WireConfig;
use crate::curves::CompositeCurve;
use crate::error::{Error, Result};
use crate::gap::GapResolver;
use crate::report::{EntityRef, Report, ReportKind, ReportSink};
use crate::segment::{Loop, Segment, SegmentConverter};

/// Joins an ordered list of segments into one [`Loop`].
///
/// Every consecutive pair goes through the [`GapResolver`]. With
/// `force_close` the last segment is also joined back to the first one;
/// otherwise it is appended as is and the loop stays open unless its end
/// points happen to meet.
pub struct LoopAssembler<'a> {
    config: &'a WireConfig,
    entity: EntityRef,
}

impl<'a> LoopAssembler<'a> {
    pub fn new(config: &'a WireConfig, entity: EntityRef) -> Self {
        Self { config, entity }
    }

    pub fn assemble(
        &self,
        arena: &mut TopologyArena,
        segments: &[Segment],
        force_close: bool,
        sink: &mut dyn ReportSink,
    ) -> Result<Loop> {
        let Some(first) = segments.first() else {
            return Err(Error::EmptyCurve(self.entity));
        };
        let tolerance = self.config.join_threshold();

        tracing::debug!(
            entity = %self.entity,
            segments = segments.len(),
            force_close,
            "assembling loop"
        );

        if segments.len() == 1 && !force_close {
            return Ok(Loop::from_segment(arena, first, tolerance));
        }

        let resolver = GapResolver::new(self.config, self.entity);
        let mut builder = WireBuilder::with_tolerance(tolerance);
        let mut pending = None;
        let mut inconsistent = false;

        for pair in segments.windows(2) {
            let resolution = resolver.resolve(
                arena,
                &mut builder,
                &pair[0],
                &pair[1],
                pending.take(),
                false,
                sink,
            )?;
            inconsistent |= resolution.inconsistent;
            pending = resolution.next_override;
        }

        let last = &segments[segments.len() - 1];
        if force_close {
            let resolution =
                resolver.resolve(arena, &mut builder, last, first, pending.take(), true, sink)?;
            inconsistent |= resolution.inconsistent;
        } else {
            resolver.append_last(arena, &mut builder, last, pending.take(), sink)?;
        }

        if inconsistent {
            return Err(Error::InconsistentSegments(self.entity));
        }
        if builder.is_empty() {
            return Err(Error::EmptyWire(self.entity));
        }

        let closed = builder.is_closed(arena);
        Ok(Loop {
            edges: builder.into_edges(),
            closed,
        })
    }
}

/// Converts the parts of a composite curve and assembles them.
///
/// Parts with `same_sense == false` are reversed before joining. A part that
/// fails to convert is reported and fails the whole composite.
pub fn assemble_composite<C: SegmentConverter + ?Sized>(
    converter: &C,
    arena: &mut TopologyArena,
    entity: EntityRef,
    composite: &CompositeCurve,
    config: &WireConfig,
    sink: &mut dyn ReportSink,
) -> Result<Loop> {
    let mut segments = Vec::with_capacity(composite.segments.len());
    for part in &composite.segments {
        let segment = match converter.convert(arena, &part.parent, config, sink) {
            Ok(segment) => segment,
            Err(err) => {
                sink.report(Report::new(
                    ReportKind::SegmentConversionFailed {
                        reason: err.to_string(),
                    },
                    entity,
                ));
                return Err(err);
            }
        };
        let segment = if part.same_sense {
            segment
        } else {
            segment.reversed(arena)?
        };
        segments.push(segment);
    }

    LoopAssembler::new(config, entity).assemble(arena, &segments, composite.bounds_profile, sink)
}
