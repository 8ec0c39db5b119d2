#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The settings that bound the epipolar search for one measurement session.
///
/// Distances are in the unit of the camera poses (millimetres for the default values), the epipolar
/// epsilon is in the metric unit of the sensor plane.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StereoGeometryParameters {
    /// Distance of the near plane of the working corridor from the middle of the baseline.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_near_distance"))]
    pub near_distance: f64,
    /// Distance of the far plane of the working corridor from the middle of the baseline.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_far_distance"))]
    pub far_distance: f64,
    /// The maximum distance of a candidate from the epipolar line.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_epipolar_epsilon"))]
    pub epipolar_epsilon: f64,
    /// Tolerance of the self-checks run when the epipolar geometry is built.
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_numeric_precision"))]
    pub numeric_precision: f64,
}

impl StereoGeometryParameters {
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    #[must_use]
    pub fn near_distance(self, near_distance: f64) -> Self {
        Self {
            near_distance,
            ..self
        }
    }

    #[must_use]
    pub fn far_distance(self, far_distance: f64) -> Self {
        Self {
            far_distance,
            ..self
        }
    }

    #[must_use]
    pub fn epipolar_epsilon(self, epipolar_epsilon: f64) -> Self {
        Self {
            epipolar_epsilon,
            ..self
        }
    }

    #[must_use]
    pub fn numeric_precision(self, numeric_precision: f64) -> Self {
        Self {
            numeric_precision,
            ..self
        }
    }
}

impl Default for StereoGeometryParameters {
    fn default() -> Self {
        Self {
            near_distance: default_near_distance(),
            far_distance: default_far_distance(),
            epipolar_epsilon: default_epipolar_epsilon(),
            numeric_precision: default_numeric_precision(),
        }
    }
}

fn default_near_distance() -> f64 {
    2000.0
}

fn default_far_distance() -> f64 {
    4500.0
}

fn default_epipolar_epsilon() -> f64 {
    0.00985
}

fn default_numeric_precision() -> f64 {
    1e-6
}
