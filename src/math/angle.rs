//! Angle units
//!
//! The unit is carried by a [`VectorConfig`] value instead of living in
//! shared state, so two configurations never interfere with each other.

use serde::{Deserialize, Serialize};

use super::vector::{Vector, VectorResult};

#[inline]
pub fn degrees_to_radians(degrees: f64) -> f64 {
    degrees * (std::f64::consts::PI / 180.0)
}

#[inline]
pub fn radians_to_degrees(radians: f64) -> f64 {
    radians * (180.0 / std::f64::consts::PI)
}

/// Unit used for angles accepted and returned by a [`VectorConfig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AngleUnit {
    #[default]
    Radians,
    Degrees,
}

impl AngleUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            AngleUnit::Radians => "radians",
            AngleUnit::Degrees => "degrees",
        }
    }

    /// Convert an angle in this unit to radians
    pub fn to_radians(self, angle: f64) -> f64 {
        match self {
            AngleUnit::Radians => angle,
            AngleUnit::Degrees => degrees_to_radians(angle),
        }
    }

    /// Convert radians to this unit
    pub fn from_radians(self, radians: f64) -> f64 {
        match self {
            AngleUnit::Radians => radians,
            AngleUnit::Degrees => radians_to_degrees(radians),
        }
    }
}

/// Angle-aware entry points for the vector operations that take or
/// return angles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct VectorConfig {
    pub angles: AngleUnit,
}

impl VectorConfig {
    pub fn radians() -> Self {
        Self {
            angles: AngleUnit::Radians,
        }
    }

    pub fn degrees() -> Self {
        Self {
            angles: AngleUnit::Degrees,
        }
    }

    pub fn from_angle(&self, angle: f64) -> Vector {
        Vector::from_angle(self.angles.to_radians(angle))
    }

    pub fn rotate(&self, vector: &Vector, angle: f64) -> VectorResult<Vector> {
        vector.rotate(self.angles.to_radians(angle))
    }

    pub fn rotate_around_anchor(
        &self,
        vector: &Vector,
        angle: f64,
        anchor: &Vector,
    ) -> VectorResult<Vector> {
        vector.rotate_around_anchor(self.angles.to_radians(angle), anchor)
    }

    pub fn to_angle(&self, vector: &Vector) -> VectorResult<f64> {
        Ok(self.angles.from_radians(vector.to_angle()?))
    }

    pub fn angle_to(&self, from: &Vector, to: &Vector) -> VectorResult<f64> {
        Ok(self.angles.from_radians(from.angle_to(to)?))
    }
}
