// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Structured reports of repairs and failures.
//!
//! Every repair the assembler performs is reported, together with the IFC
//! entity that owns the affected curve. Reports go to a [`ReportSink`]; the
//! assembler never inspects what a sink does with them.

use serde::{Deserialize, Serialize};

use crate::config::AngleUnit;

/// Reference to an IFC entity by its STEP id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityRef(pub u32);

impl std::fmt::Display for EntityRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// What happened.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ReportKind {
    /// A synthetic straight edge was inserted to close a gap.
    GapBridged { distance: f64 },
    /// A straight edge was rebuilt so that two segments meet exactly.
    EndpointAdjusted { distance: f64 },
    /// A junction between two segments has more than one candidate edge.
    InconsistentSegments,
    /// An appended edge returns to an already bounded vertex.
    NonManifoldSegments,
    /// An edge could not be joined to the wire built so far.
    DisconnectedSegments,
    /// A sub-curve could not be converted to edges.
    SegmentConversionFailed { reason: String },
    /// A trimmed curve was too short to produce an edge.
    ShortTrimSkipped { length: f64 },
    /// The model declares no plane angle unit; both hypotheses will be tried.
    UndeclaredAngleUnit,
    /// Converting under one angle hypothesis failed.
    AngleUnitTrialFailed { unit: AngleUnit, reason: String },
    AngleUnitResolved { unit: AngleUnit },
    AngleUnitUnresolved,
    /// Near-duplicate points were dropped from a polygon.
    PointsRemoved { count: usize },
    InsufficientPoints { remaining: usize },
    /// A self-intersecting polygon was reduced to its largest cycle.
    ///
    /// Interleaved crossings are not all cut, so `cycles` may be lower than
    /// `crossings + 1`.
    SelfIntersectionResolved {
        crossings: usize,
        cycles: usize,
        discarded: usize,
    },
}

impl ReportKind {
    pub fn severity(&self) -> Severity {
        match self {
            ReportKind::GapBridged { .. }
            | ReportKind::EndpointAdjusted { .. }
            | ReportKind::ShortTrimSkipped { .. }
            | ReportKind::UndeclaredAngleUnit
            | ReportKind::PointsRemoved { .. }
            | ReportKind::SelfIntersectionResolved { .. } => Severity::Warning,
            ReportKind::AngleUnitTrialFailed { .. } | ReportKind::AngleUnitResolved { .. } => {
                Severity::Info
            }
            ReportKind::InconsistentSegments
            | ReportKind::NonManifoldSegments
            | ReportKind::DisconnectedSegments
            | ReportKind::SegmentConversionFailed { .. }
            | ReportKind::AngleUnitUnresolved
            | ReportKind::InsufficientPoints { .. } => Severity::Error,
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReportKind::GapBridged { distance } => {
                write!(f, "Gap of {distance} closed with synthetic segment")
            }
            ReportKind::EndpointAdjusted { distance } => {
                write!(f, "Adjusted edge end-points by {distance}")
            }
            ReportKind::InconsistentSegments => {
                f.write_str("Internal error, inconsistent wire segments")
            }
            ReportKind::NonManifoldSegments => f.write_str("Non-manifold curve segments"),
            ReportKind::DisconnectedSegments => f.write_str("Failed to join curve segments"),
            ReportKind::SegmentConversionFailed { reason } => {
                write!(f, "Failed to convert curve segment: {reason}")
            }
            ReportKind::ShortTrimSkipped { length } => {
                write!(f, "Skipping segment of length {length}")
            }
            ReportKind::UndeclaredAngleUnit => {
                f.write_str("No plane angle unit declared, trying radians and degrees")
            }
            ReportKind::AngleUnitTrialFailed { unit, reason } => {
                write!(f, "Conversion assuming {unit} failed: {reason}")
            }
            ReportKind::AngleUnitResolved { unit } => write!(f, "Used {unit} to create curve"),
            ReportKind::AngleUnitUnresolved => {
                f.write_str("Neither radians nor degrees yield a valid curve")
            }
            ReportKind::PointsRemoved { count } => write!(f, "{count} duplicate points removed"),
            ReportKind::InsufficientPoints { remaining } => {
                write!(f, "Not enough points, {remaining} remain")
            }
            ReportKind::SelfIntersectionResolved {
                crossings,
                cycles,
                discarded,
            } => write!(
                f,
                "Self-intersections with {crossings} crossings split into {cycles} cycles, \
                 {discarded} discarded"
            ),
        }
    }
}

/// A single report delivered to a [`ReportSink`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub severity: Severity,
    #[serde(flatten)]
    pub kind: ReportKind,
    pub entity: EntityRef,
}

impl Report {
    pub fn new(kind: ReportKind, entity: EntityRef) -> Self {
        Self {
            severity: kind.severity(),
            kind,
            entity,
        }
    }

    pub fn message(&self) -> String {
        self.kind.to_string()
    }
}

/// Receiver of assembly reports.
///
/// Implementations must not fail or block; a report that cannot be delivered
/// is dropped.
pub trait ReportSink {
    fn report(&mut self, report: Report);
}

impl ReportSink for Vec<Report> {
    fn report(&mut self, report: Report) {
        self.push(report);
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn report(&mut self, report: Report) {
        (**self).report(report);
    }
}

/// Forwards reports as `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ReportSink for TracingSink {
    fn report(&mut self, report: Report) {
        let entity = report.entity;
        let message = report.message();
        match report.severity {
            Severity::Info => tracing::info!(entity = %entity, "{}", message),
            Severity::Warning => tracing::warn!(entity = %entity, "{}", message),
            Severity::Error => tracing::error!(entity = %entity, "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_follows_kind() {
        let report = Report::new(ReportKind::GapBridged { distance: 0.5 }, EntityRef(10));
        assert_eq!(report.severity, Severity::Warning);

        let report = Report::new(ReportKind::InconsistentSegments, EntityRef(10));
        assert_eq!(report.severity, Severity::Error);

        let report = Report::new(
            ReportKind::AngleUnitResolved {
                unit: AngleUnit::Degrees,
            },
            EntityRef(10),
        );
        assert_eq!(report.severity, Severity::Info);
        assert_eq!(report.message(), "Used degrees to create curve");
    }

    #[test]
    fn vec_collects_reports() {
        let mut sink: Vec<Report> = Vec::new();
        sink.report(Report::new(ReportKind::PointsRemoved { count: 2 }, EntityRef(3)));
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].message(), "2 duplicate points removed");
    }

    #[test]
    fn serializes_flat() {
        let report = Report::new(ReportKind::GapBridged { distance: 0.25 }, EntityRef(12));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["kind"], "gap_bridged");
        assert_eq!(json["distance"], 0.25);
        assert_eq!(json["entity"], 12);
    }

    #[test]
    fn tracing_sink_accepts_all_severities() {
        let mut sink = TracingSink;
        sink.report(Report::new(ReportKind::UndeclaredAngleUnit, EntityRef(1)));
        sink.report(Report::new(ReportKind::DisconnectedSegments, EntityRef(1)));
    }
}
