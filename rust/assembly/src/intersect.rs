// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use ifc_wire_topology::TopologyArena;

use crate::config::WireConfig;
use crate::error::Result;
use crate::report::{EntityRef, Report, ReportKind, ReportSink};
use crate::segment::Loop;

/// Reduces a self-crossing polygon loop to its largest simple cycle.
pub struct SelfIntersectionResolver {
    tolerance: f64,
    entity: EntityRef,
}

impl SelfIntersectionResolver {
    pub fn new(config: &WireConfig, entity: EntityRef) -> Self {
        Self {
            tolerance: config.precision,
            entity,
        }
    }

    /// Returns the loop unchanged when it does not cross itself.
    pub fn resolve(
        &self,
        arena: &mut TopologyArena,
        polygon: Loop,
        sink: &mut dyn ReportSink,
    ) -> Result<Loop> {
        let Some(found) = arena.chain_self_intersections(&polygon.edges) else {
            return Ok(polygon);
        };
        let Some(best) = found.largest_cycle() else {
            return Ok(polygon);
        };

        let cycles = found.cycles.len();
        tracing::debug!(
            entity = %self.entity,
            crossings = found.crossings,
            cycles,
            kept = best,
            "splitting self-intersecting loop"
        );
        sink.report(Report::new(
            ReportKind::SelfIntersectionResolved {
                crossings: found.crossings,
                cycles,
                discarded: cycles - 1,
            },
            self.entity,
        ));

        let edges = arena.add_polygon(&found.cycles[best], true, self.tolerance)?;
        Ok(Loop::from_edges(arena, edges, self.tolerance))
    }
}
