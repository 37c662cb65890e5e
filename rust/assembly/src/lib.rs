// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC Wire Assembly
//!
//! Joins independently converted IFC curve segments into one boundary wire,
//! repairing the small defects model exports are full of: end points that
//! miss each other, angle parameters in an undeclared unit, near-duplicate
//! polygon points and self-crossing polygon loops. Every repair is reported
//! with the entity it belongs to.
//!
//! ## Quick Start
//!
//! ```rust
//! use ifc_wire_assembly::{
//!     CurveDescription, CurveGeometry, EntityRef, Report, WireConfig, WireConverter,
//! };
//! use ifc_wire_topology::{Point3, TopologyArena};
//!
//! let converter = WireConverter::new(WireConfig::new(1e-5))?;
//! let mut arena = TopologyArena::new();
//! let mut reports: Vec<Report> = Vec::new();
//!
//! let square = CurveDescription::new(
//!     EntityRef(42),
//!     CurveGeometry::PolyLoop(vec![
//!         Point3::new(0.0, 0.0, 0.0),
//!         Point3::new(1.0, 0.0, 0.0),
//!         Point3::new(1.0, 1.0, 0.0),
//!         Point3::new(0.0, 1.0, 0.0),
//!     ]),
//! );
//! let wire = converter.convert_wire(&mut arena, &square, &mut reports)?;
//! assert!(wire.closed);
//! # Ok::<(), ifc_wire_assembly::Error>(())
//! ```
//!
//! ## Thresholds
//!
//! All decisions derive from the precision `p` of [`WireConfig`]: end points
//! closer than `p` join as they are, gaps wider than `1000p` get a connector
//! edge, gaps in between are closed by moving a straight edge's end point
//! where possible, and polygon points within `10p` of each other merge.

pub mod assembler;
pub mod batch;
pub mod config;
pub mod curves;
pub mod edges;
pub mod error;
pub mod gap;
pub mod intersect;
pub mod polygon;
pub mod report;
pub mod segment;
pub mod units;
pub mod wire;

pub use assembler::{assemble_composite, LoopAssembler};
pub use batch::{convert_batch, WireOutput};
pub use config::{AngleUnit, WireConfig};
pub use curves::{
    BasisCurve, CompositeCurve, CompositeSegment, CurveConverter, CurveDescription, CurveGeometry,
    IndexSegment, Placement, Trim, TrimmedCurve,
};
pub use edges::{convert_edge_loop, EdgeGeometry};
pub use error::{Error, Result};
pub use gap::{GapRepair, GapResolver, PairResolution, StartOverride};
pub use intersect::SelfIntersectionResolver;
pub use polygon::{convert_polyline, convert_polyloop, DegenerateLoopCleaner};
pub use report::{EntityRef, Report, ReportKind, ReportSink, Severity, TracingSink};
pub use segment::{Loop, Segment, SegmentConverter};
pub use units::UnitAmbiguityResolver;
pub use wire::WireConverter;
