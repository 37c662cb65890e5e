// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use thiserror::Error;

use crate::report::EntityRef;

/// Result type for wire assembly
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that abort the conversion of one curve entity
#[derive(Error, Debug)]
pub enum Error {
    #[error("Topology error: {0}")]
    Topology(#[from] ifc_wire_topology::Error),

    #[error("Failed to convert {entity}: {reason}")]
    Conversion { entity: EntityRef, reason: String },

    #[error("Curve {0} has no segments")]
    EmptyCurve(EntityRef),

    #[error("Not enough points for {entity}: {remaining} left after cleaning, at least 3 required")]
    InsufficientPoints { entity: EntityRef, remaining: usize },

    #[error("Inconsistent segments in {0}")]
    InconsistentSegments(EntityRef),

    #[error("No edges could be joined for {0}")]
    EmptyWire(EntityRef),

    #[error("Curve {0} uses angle parameters but no plane angle unit is set")]
    MissingAngleUnit(EntityRef),

    #[error("Neither radians nor degrees yield a valid wire for {0}")]
    UnitResolutionFailed(EntityRef),

    #[error("Index {index} out of range for {entity} with {len} points")]
    InvalidIndex {
        entity: EntityRef,
        index: usize,
        len: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn conversion(entity: EntityRef, reason: impl Into<String>) -> Self {
        Error::Conversion {
            entity,
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_entity() {
        let err = Error::conversion(EntityRef(42), "trim points coincide");
        assert_eq!(err.to_string(), "Failed to convert #42: trim points coincide");

        let err = Error::InsufficientPoints {
            entity: EntityRef(7),
            remaining: 2,
        };
        assert!(err.to_string().contains("#7"));
    }

    #[test]
    fn topology_errors_convert() {
        let err: Error = ifc_wire_topology::Error::EmptyWire.into();
        assert!(matches!(err, Error::Topology(_)));
    }
}
