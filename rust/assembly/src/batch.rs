// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parallel conversion of independent curves.

use ifc_wire_topology::{TopologyArena, WireKey};
use rayon::prelude::*;

use crate::config::WireConfig;
use crate::curves::CurveDescription;
use crate::error::Result;
use crate::report::{EntityRef, Report, ReportSink, TracingSink};
use crate::segment::Loop;
use crate::wire::WireConverter;

/// A converted curve with the arena that owns its edges.
#[derive(Debug)]
pub struct WireOutput {
    pub entity: EntityRef,
    pub arena: TopologyArena,
    /// The loop registered as a wire in `arena`.
    pub wire: WireKey,
    pub wire_loop: Loop,
    pub reports: Vec<Report>,
}

/// Converts every curve on the rayon thread pool.
///
/// Each curve gets its own arena and report buffer, so a failure affects
/// only its own entry. Reports of failed conversions are forwarded to
/// `tracing` before being dropped.
pub fn convert_batch(
    curves: &[CurveDescription],
    config: &WireConfig,
) -> Result<Vec<Result<WireOutput>>> {
    let converter = WireConverter::new(config.clone())?;

    let outputs: Vec<Result<WireOutput>> = curves
        .par_iter()
        .map(|curve| convert_one(&converter, curve))
        .collect();

    let failed = outputs.iter().filter(|o| o.is_err()).count();
    tracing::info!(
        curves = curves.len(),
        failed,
        "batch wire conversion complete"
    );
    Ok(outputs)
}

fn convert_one(converter: &WireConverter, curve: &CurveDescription) -> Result<WireOutput> {
    let mut arena = TopologyArena::new();
    let mut reports: Vec<Report> = Vec::new();

    let converted = converter
        .convert_wire(&mut arena, curve, &mut reports)
        .and_then(|wire_loop| {
            let wire = wire_loop.register(&mut arena)?;
            Ok((wire, wire_loop))
        });

    match converted {
        Ok((wire, wire_loop)) => Ok(WireOutput {
            entity: curve.entity,
            arena,
            wire,
            wire_loop,
            reports,
        }),
        Err(err) => {
            let mut sink = TracingSink;
            for report in reports {
                sink.report(report);
            }
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curves::CurveGeometry;
    use ifc_wire_topology::Point3;

    #[test]
    fn failures_stay_local() {
        let square = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let curves = vec![
            CurveDescription::new(EntityRef(1), CurveGeometry::PolyLoop(square)),
            CurveDescription::new(
                EntityRef(2),
                CurveGeometry::PolyLoop(vec![Point3::origin(), Point3::new(1.0, 0.0, 0.0)]),
            ),
        ];

        let outputs = convert_batch(&curves, &WireConfig::new(1e-5)).unwrap();
        assert_eq!(outputs.len(), 2);

        let first = outputs[0].as_ref().unwrap();
        assert_eq!(first.entity, EntityRef(1));
        assert!(first.wire_loop.closed);
        assert!(first.arena.wire_is_closed(first.wire));
        assert!(outputs[1].is_err());
    }

    #[test]
    fn invalid_config_fails_whole_batch() {
        assert!(convert_batch(&[], &WireConfig::new(-1.0)).is_err());
    }
}
