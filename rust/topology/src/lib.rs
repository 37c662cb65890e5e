// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! # IFC Wire Topology
//!
//! Arena-based vertex/edge/wire topology used while turning IFC curve
//! geometry into boundary wires.
//!
//! Entities are stored in slot maps with stable keys and are never edited in
//! place: moving an end point or reversing an edge produces a new entity, so
//! partially assembled wires can be rebuilt cheaply and speculative work can
//! run on a cloned arena. Vertices carry a tolerance, and connectivity is
//! decided by proximity within that tolerance rather than by key identity.
//!
//! Besides storage the crate provides the small set of kernel services wire
//! repair relies on: straight and curved edge construction, a checking wire
//! builder, polyline approximation and area measurement, and decomposition
//! of self-intersecting polygon rings.

pub mod arena;
pub mod construction;
pub mod curve;
pub mod error;
pub mod geometry;
pub mod intersection;
pub mod keys;
pub mod traversal;

pub use arena::{EdgeData, TopologyArena, VertexData, WireData};
pub use construction::{WireBuilder, WireError};
pub use curve::{bezier_point, ConicArc, CurveKind, EdgeCurve};
pub use error::{Error, Result};
pub use geometry::{newell_normal, polygon_area};
pub use intersection::{decompose_ring, SelfIntersections};
pub use keys::{EdgeKey, VertexKey, WireKey};

// Re-export nalgebra types for convenience
pub use nalgebra::{Point3, Vector3};
