use fixture_core::{
    nalgebra::{Point2, Vector2},
    PicturePoint, UndistortedPoint,
};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Maximum number of fixed point iterations used to re-apply distortion.
const MAX_ITERATIONS: usize = 32;

/// Re-distortion stops once an iteration moves the point by less than this (in sensor units).
const CONVERGENCE: f64 = 1e-13;

/// Coefficients of the classic photogrammetric distortion model.
///
/// * `a1`, `a2`, `a3` - radial terms of order 3, 5 and 7
/// * `b1`, `b2` - decentering (tangential) terms
/// * `c1`, `c2` - affinity and shear
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DistortionParameters {
    pub a1: f64,
    pub a2: f64,
    pub a3: f64,
    pub b1: f64,
    pub b2: f64,
    pub c1: f64,
    pub c2: f64,
}

impl DistortionParameters {
    /// Parameters that leave every point unchanged.
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn radial(self, a1: f64, a2: f64, a3: f64) -> Self {
        Self { a1, a2, a3, ..self }
    }

    #[must_use]
    pub fn tangential(self, b1: f64, b2: f64) -> Self {
        Self { b1, b2, ..self }
    }

    #[must_use]
    pub fn affine(self, c1: f64, c2: f64) -> Self {
        Self { c1, c2, ..self }
    }
}

/// The classic distortion model bound to a camera's principal point and balancing radius.
///
/// The radial polynomial is balanced: the linear term `r * k0` with
/// `k0 = a1 r0^2 + a2 r0^4 + a3 r0^6` is subtracted, so the radial correction vanishes at the
/// reference radius `r0`. `r0` is two thirds of the half diagonal of the sensor.
///
/// Undistortion is closed form. Distortion is its inverse and is computed by fixed point iteration.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ClassicDistortion {
    parameters: DistortionParameters,
    principal_point: Point2<f64>,
    balanced: f64,
}

impl ClassicDistortion {
    /// `half_extent` is the half width and half height of the sensor relative to the principal point.
    pub fn new(
        parameters: DistortionParameters,
        principal_point: Point2<f64>,
        half_extent: Vector2<f64>,
    ) -> Self {
        let r0 = 2.0 * half_extent.norm() / 3.0;
        let r0_2 = r0 * r0;
        let DistortionParameters { a1, a2, a3, .. } = parameters;
        let balanced = a1 * r0_2 + a2 * r0_2 * r0_2 + a3 * r0_2 * r0_2 * r0_2;
        Self {
            parameters,
            principal_point,
            balanced,
        }
    }

    pub fn parameters(&self) -> DistortionParameters {
        self.parameters
    }

    /// The balancing coefficient `k0`.
    pub fn balanced_radial(&self) -> f64 {
        self.balanced
    }

    /// The total distortion vector at a point on the sensor.
    pub fn offset(&self, point: Point2<f64>) -> Vector2<f64> {
        let DistortionParameters {
            a1,
            a2,
            a3,
            b1,
            b2,
            c1,
            c2,
        } = self.parameters;
        let v = point - self.principal_point;
        let (x, y) = (v.x, v.y);
        let r2 = v.norm_squared();

        // radial * v / r, with the r cancelled so the principal point itself is well defined
        let radial = v * (a1 * r2 + a2 * r2 * r2 + a3 * r2 * r2 * r2 - self.balanced);
        let tangential = Vector2::new(
            b1 * (r2 + 2.0 * x * x) + 2.0 * b2 * x * y,
            b2 * (r2 + 2.0 * y * y) + 2.0 * b1 * x * y,
        );
        let affine = Vector2::new(c1 * x + c2 * y, 0.0);
        radial + tangential + affine
    }

    /// Removes the distortion from a measured point.
    pub fn undistort(&self, point: PicturePoint) -> UndistortedPoint {
        UndistortedPoint(point.0 - self.offset(point.0))
    }

    /// Applies the distortion to an ideal point, which is where the lens actually images it.
    pub fn distort(&self, point: UndistortedPoint) -> PicturePoint {
        let target = point.0;
        let mut distorted = target;
        for _ in 0..MAX_ITERATIONS {
            let next = target + self.offset(distorted);
            let step = (next - distorted).norm();
            distorted = next;
            if step < CONVERGENCE {
                break;
            }
        }
        PicturePoint(distorted)
    }
}
