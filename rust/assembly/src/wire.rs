// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Entry point turning one curve description into a loop.

use ifc_wire_topology::TopologyArena;

use crate::assembler::assemble_composite;
use crate::config::WireConfig;
use crate::curves::{CurveConverter, CurveDescription, CurveGeometry};
use crate::edges::convert_edge_loop;
use crate::error::Result;
use crate::polygon::convert_polyloop;
use crate::report::ReportSink;
use crate::segment::{Loop, SegmentConverter};
use crate::units::UnitAmbiguityResolver;

/// Converts curve descriptions to loops.
///
/// Composite curves go through the loop assembler, polygon loops through
/// cleaning and self-intersection resolution, edge loops are chained edge by
/// edge, open profiles convert as their curve, and every other curve becomes
/// a single segment. Curves with angle parameters in a model without a
/// declared angle unit are converted under both unit hypotheses.
pub struct WireConverter<C = CurveConverter> {
    config: WireConfig,
    converter: C,
}

impl WireConverter<CurveConverter> {
    pub fn new(config: WireConfig) -> Result<Self> {
        Self::with_converter(config, CurveConverter)
    }
}

impl<C: SegmentConverter> WireConverter<C> {
    pub fn with_converter(config: WireConfig, converter: C) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, converter })
    }

    pub fn config(&self) -> &WireConfig {
        &self.config
    }

    pub fn convert_wire(
        &self,
        arena: &mut TopologyArena,
        curve: &CurveDescription,
        sink: &mut dyn ReportSink,
    ) -> Result<Loop> {
        tracing::debug!(
            entity = %curve.entity,
            curve_type = curve.geometry.type_name(),
            "converting wire"
        );

        if self.config.plane_angle_unit.is_none() && curve.uses_angle_parameters() {
            return UnitAmbiguityResolver::new(&self.config, curve.entity).resolve(
                arena,
                sink,
                |arena, config, sink| self.convert_with(arena, curve, config, sink),
            );
        }
        self.convert_with(arena, curve, &self.config, sink)
    }

    fn convert_with(
        &self,
        arena: &mut TopologyArena,
        curve: &CurveDescription,
        config: &WireConfig,
        sink: &mut dyn ReportSink,
    ) -> Result<Loop> {
        match &curve.geometry {
            CurveGeometry::Composite(composite) => {
                assemble_composite(&self.converter, arena, curve.entity, composite, config, sink)
            }
            CurveGeometry::PolyLoop(points) => {
                convert_polyloop(arena, curve.entity, points, config, sink)
            }
            CurveGeometry::EdgeLoop(edges) => {
                convert_edge_loop(&self.converter, arena, curve.entity, edges, config, sink)
            }
            CurveGeometry::OpenProfile(inner) => self.convert_with(arena, inner, config, sink),
            _ => {
                let segment = self.converter.convert(arena, curve, config, sink)?;
                Ok(Loop::from_segment(arena, &segment, config.join_threshold()))
            }
        }
    }
}
