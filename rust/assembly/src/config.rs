// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Tolerance and unit configuration.
//!
//! A [`WireConfig`] is built once per model and passed by reference to every
//! operation. All thresholds used by the repair algorithm derive from the
//! single base precision `p`.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Gaps wider than this multiple of the precision get a connector edge.
pub const GAP_INSERT_FACTOR: f64 = 1000.0;
/// Points closer than this multiple of the precision are duplicates.
pub const DUPLICATE_FACTOR: f64 = 10.0;
/// Trimmed curves shorter than this multiple of the precision are skipped.
pub const MIN_TRIM_FACTOR: f64 = 2.0;

/// Radians per degree, the factor used by the degree hypothesis.
pub const DEGREE: f64 = 0.0174532925199433;

/// Candidate interpretation of angular parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    Radians,
    Degrees,
}

impl AngleUnit {
    /// Trial order when a model leaves its angle unit undeclared.
    pub const TRIAL_ORDER: [AngleUnit; 2] = [AngleUnit::Radians, AngleUnit::Degrees];

    /// Radians per unit.
    pub fn factor(self) -> f64 {
        match self {
            AngleUnit::Radians => 1.0,
            AngleUnit::Degrees => DEGREE,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AngleUnit::Radians => "radians",
            AngleUnit::Degrees => "degrees",
        }
    }
}

impl std::fmt::Display for AngleUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Precision and unit settings for wire assembly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WireConfig {
    /// Base tolerance `p`, in resolved length units.
    pub precision: f64,
    /// Scale from model length units to resolved length units.
    pub length_unit: f64,
    /// Radians per model angle unit, `None` when the model does not declare one.
    pub plane_angle_unit: Option<f64>,
}

impl Default for WireConfig {
    fn default() -> Self {
        Self {
            precision: 1e-5,
            length_unit: 1.0,
            plane_angle_unit: None,
        }
    }
}

impl WireConfig {
    pub fn new(precision: f64) -> Self {
        Self {
            precision,
            ..Self::default()
        }
    }

    pub fn with_length_unit(mut self, length_unit: f64) -> Self {
        self.length_unit = length_unit;
        self
    }

    pub fn with_plane_angle_unit(mut self, plane_angle_unit: f64) -> Self {
        self.plane_angle_unit = Some(plane_angle_unit);
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            precision: std::env::var("IFC_WIRE_PRECISION")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.precision),
            length_unit: std::env::var("IFC_WIRE_LENGTH_UNIT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.length_unit),
            plane_angle_unit: std::env::var("IFC_WIRE_PLANE_ANGLE_UNIT")
                .ok()
                .and_then(|v| parse_angle_unit(&v)),
        }
    }

    /// Rejects settings the algorithm cannot work with.
    pub fn validate(&self) -> Result<()> {
        if !(self.precision.is_finite() && self.precision > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "precision must be positive, got {}",
                self.precision
            )));
        }
        if !(self.length_unit.is_finite() && self.length_unit > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "length unit must be positive, got {}",
                self.length_unit
            )));
        }
        if let Some(unit) = self.plane_angle_unit {
            if !(unit.is_finite() && unit > 0.0) {
                return Err(Error::InvalidConfig(format!(
                    "plane angle unit must be positive, got {unit}"
                )));
            }
        }
        Ok(())
    }

    /// Copy of this configuration with the angle unit set to a hypothesis.
    pub fn assuming(&self, unit: AngleUnit) -> Self {
        self.clone().with_plane_angle_unit(unit.factor())
    }

    /// Distance below which two end points join without repair.
    #[inline]
    pub fn join_threshold(&self) -> f64 {
        self.precision
    }

    /// Distance above which a gap is bridged by a connector edge.
    #[inline]
    pub fn gap_insert_threshold(&self) -> f64 {
        self.precision * GAP_INSERT_FACTOR
    }

    /// Distance below which consecutive polygon points are duplicates.
    #[inline]
    pub fn duplicate_epsilon(&self) -> f64 {
        self.precision * DUPLICATE_FACTOR
    }

    /// Minimum length of a trimmed curve.
    #[inline]
    pub fn min_trim_length(&self) -> f64 {
        self.precision * MIN_TRIM_FACTOR
    }
}

// Accepts a factor ("0.0174532925199433") or a unit name.
fn parse_angle_unit(value: &str) -> Option<f64> {
    match value.trim().to_ascii_lowercase().as_str() {
        "radian" | "radians" | "rad" => Some(AngleUnit::Radians.factor()),
        "degree" | "degrees" | "deg" => Some(AngleUnit::Degrees.factor()),
        other => other.parse().ok().filter(|f: &f64| *f > 0.0),
    }
}
