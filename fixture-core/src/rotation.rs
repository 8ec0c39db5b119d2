use crate::{Error, Result};
use nalgebra::{DMatrix, Matrix3, Rotation3, Vector3};
use num_traits::Float;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Below this value of the cosine of the middle angle a rotation is considered to be in gimbal lock.
const GIMBAL_LOCK_EPSILON: f64 = 1e-6;

/// Tolerance used when checking that a raw matrix is a proper rotation.
const ORTHONORMAL_EPSILON: f64 = 1e-6;

/// The order in which the elementary rotations of [`EulerAngles`] are composed.
///
/// The name lists the axes from left to right in the matrix product, so [`EulerConvention::Zyx`]
/// is `Rz(gamma) * Ry(beta) * Rx(alpha)`: the rotation about X is applied first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum EulerConvention {
    /// `Rz(gamma) * Ry(beta) * Rx(alpha)`
    Zyx,
    /// `Rz(alpha) * Ry(beta) * Rz(gamma)`
    Zyz,
    /// `Rz(gamma) * Rx(alpha) * Ry(beta)`
    Zxy,
    /// `Rx(alpha) * Ry(beta) * Rz(gamma)`
    Xyz,
    /// `Ry(beta) * Rx(alpha) * Rz(gamma)`
    Yxz,
}

impl Default for EulerConvention {
    fn default() -> Self {
        Self::Xyz
    }
}

/// Three angles in radians.
///
/// For every convention except [`EulerConvention::Zyz`], `alpha`, `beta` and `gamma` are the
/// angles about the X, Y and Z axis. For `Zyz`, `alpha` is the first rotation about Z, `beta` the
/// rotation about Y and `gamma` the second rotation about Z.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct EulerAngles {
    pub alpha: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl EulerAngles {
    pub fn new(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self { alpha, beta, gamma }
    }

    pub fn from_degrees(alpha: f64, beta: f64, gamma: f64) -> Self {
        Self::new(alpha.to_radians(), beta.to_radians(), gamma.to_radians())
    }

    pub fn to_vec(self) -> Vector3<f64> {
        Vector3::new(self.alpha, self.beta, self.gamma)
    }
}

/// A rotation stored as Euler angles in a chosen convention together with the derived matrix.
///
/// The matrix is always computed from the angles (or the angles from the matrix), so the two can never
/// disagree.
///
/// ```
/// use fixture_core::{EulerAngles, EulerConvention, Rotation};
/// use fixture_core::nalgebra::Vector3;
///
/// let rotation = Rotation::new(EulerAngles::from_degrees(0.0, 0.0, 90.0), EulerConvention::Zyx);
/// let rotated = rotation.matrix() * Vector3::x();
/// assert!((rotated - Vector3::y()).norm() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Rotation {
    angles: EulerAngles,
    convention: EulerConvention,
    matrix: Rotation3<f64>,
}

impl Rotation {
    pub fn new(angles: EulerAngles, convention: EulerConvention) -> Self {
        Self {
            angles,
            convention,
            matrix: compose(angles, convention),
        }
    }

    /// The rotation with all angles zero.
    pub fn identity(convention: EulerConvention) -> Self {
        Self::new(EulerAngles::default(), convention)
    }

    /// Decomposes a rotation matrix into angles of the given convention.
    ///
    /// When the middle angle puts the decomposition into gimbal lock, the last angle of the
    /// convention is set to zero and the first one absorbs the whole rotation about the locked axis.
    pub fn from_matrix(matrix: Rotation3<f64>, convention: EulerConvention) -> Self {
        Self {
            angles: decompose(matrix.matrix(), convention),
            convention,
            matrix,
        }
    }

    /// Validates a dynamically sized matrix as a proper 3x3 rotation and decomposes it.
    pub fn from_dmatrix(matrix: &DMatrix<f64>, convention: EulerConvention) -> Result<Self> {
        if matrix.shape() != (3, 3) {
            return Err(Error::invalid_transform(format!(
                "rotation must be 3x3, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        let matrix: Matrix3<f64> = matrix.fixed_slice::<3, 3>(0, 0).into_owned();
        Self::from_raw(matrix, convention)
    }

    /// Validates a 3x3 matrix as a proper rotation (orthonormal, determinant `+1`) and decomposes it.
    pub fn from_raw(matrix: Matrix3<f64>, convention: EulerConvention) -> Result<Self> {
        if matrix.iter().any(|n| !n.is_finite()) {
            return Err(Error::invalid_transform("rotation contains non-finite values"));
        }
        let gram = matrix.transpose() * matrix;
        if (gram - Matrix3::identity()).amax() > ORTHONORMAL_EPSILON {
            return Err(Error::invalid_transform("rotation block is not orthonormal"));
        }
        if matrix.determinant() < 0.0 {
            return Err(Error::invalid_transform("rotation block is a reflection"));
        }
        Ok(Self::from_matrix(
            Rotation3::from_matrix_unchecked(matrix),
            convention,
        ))
    }

    pub fn angles(&self) -> EulerAngles {
        self.angles
    }

    pub fn convention(&self) -> EulerConvention {
        self.convention
    }

    pub fn matrix(&self) -> &Rotation3<f64> {
        &self.matrix
    }

    /// The same rotation with its angles expressed in another convention.
    #[must_use]
    pub fn with_convention(self, convention: EulerConvention) -> Self {
        Self::from_matrix(self.matrix, convention)
    }
}

impl Default for Rotation {
    fn default() -> Self {
        Self::identity(EulerConvention::default())
    }
}

fn rx(angle: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::x_axis(), angle)
}

fn ry(angle: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::y_axis(), angle)
}

fn rz(angle: f64) -> Rotation3<f64> {
    Rotation3::from_axis_angle(&Vector3::z_axis(), angle)
}

fn compose(angles: EulerAngles, convention: EulerConvention) -> Rotation3<f64> {
    let EulerAngles { alpha, beta, gamma } = angles;
    match convention {
        EulerConvention::Zyx => rz(gamma) * ry(beta) * rx(alpha),
        EulerConvention::Zyz => rz(alpha) * ry(beta) * rz(gamma),
        EulerConvention::Zxy => rz(gamma) * rx(alpha) * ry(beta),
        EulerConvention::Xyz => rx(alpha) * ry(beta) * rz(gamma),
        EulerConvention::Yxz => ry(beta) * rx(alpha) * rz(gamma),
    }
}

/// Arcsine for the middle angle of the sine based conventions, with the gimbal lock side if any.
fn locked_asin(sine: f64) -> (f64, Option<f64>) {
    let sine = sine.clamp(-1.0, 1.0);
    let angle = sine.asin();
    if 1.0 - sine.abs() < GIMBAL_LOCK_EPSILON * GIMBAL_LOCK_EPSILON {
        (angle, Some(sine.signum()))
    } else {
        (angle, None)
    }
}

fn decompose(r: &Matrix3<f64>, convention: EulerConvention) -> EulerAngles {
    match convention {
        EulerConvention::Zyx => {
            let sy = Float::hypot(r[(0, 0)], r[(1, 0)]);
            let beta = Float::atan2(-r[(2, 0)], sy);
            if sy < GIMBAL_LOCK_EPSILON {
                EulerAngles::new(Float::atan2(-r[(1, 2)], r[(1, 1)]), beta, 0.0)
            } else {
                EulerAngles::new(
                    Float::atan2(r[(2, 1)], r[(2, 2)]),
                    beta,
                    Float::atan2(r[(1, 0)], r[(0, 0)]),
                )
            }
        }
        EulerConvention::Zyz => {
            let sy = Float::hypot(r[(2, 1)], r[(2, 0)]);
            let beta = Float::atan2(sy, r[(2, 2)]);
            if sy < GIMBAL_LOCK_EPSILON {
                EulerAngles::new(Float::atan2(-r[(0, 1)], r[(1, 1)]), beta, 0.0)
            } else {
                EulerAngles::new(
                    Float::atan2(r[(1, 2)], r[(0, 2)]),
                    beta,
                    Float::atan2(r[(2, 1)], -r[(2, 0)]),
                )
            }
        }
        EulerConvention::Zxy => match locked_asin(r[(2, 1)]) {
            (alpha, None) => EulerAngles::new(
                alpha,
                Float::atan2(-r[(2, 0)], r[(2, 2)]),
                Float::atan2(-r[(0, 1)], r[(1, 1)]),
            ),
            (alpha, Some(side)) => {
                EulerAngles::new(alpha, 0.0, side * Float::atan2(r[(0, 2)], r[(0, 0)]))
            }
        },
        EulerConvention::Xyz => match locked_asin(r[(0, 2)]) {
            (beta, None) => EulerAngles::new(
                Float::atan2(-r[(1, 2)], r[(2, 2)]),
                beta,
                Float::atan2(-r[(0, 1)], r[(0, 0)]),
            ),
            (beta, Some(side)) => {
                EulerAngles::new(side * Float::atan2(r[(1, 0)], r[(1, 1)]), beta, 0.0)
            }
        },
        EulerConvention::Yxz => match locked_asin(-r[(1, 2)]) {
            (alpha, None) => EulerAngles::new(
                alpha,
                Float::atan2(r[(0, 2)], r[(2, 2)]),
                Float::atan2(r[(1, 0)], r[(1, 1)]),
            ),
            (alpha, Some(_)) => {
                EulerAngles::new(alpha, 0.0, Float::atan2(-r[(0, 1)], r[(0, 0)]))
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use core::f64::consts::FRAC_PI_2;
    use proptest::prelude::*;

    const CONVENTIONS: [EulerConvention; 5] = [
        EulerConvention::Zyx,
        EulerConvention::Zyz,
        EulerConvention::Zxy,
        EulerConvention::Xyz,
        EulerConvention::Yxz,
    ];

    fn assert_round_trip(angles: EulerAngles, convention: EulerConvention) {
        let rotation = Rotation::new(angles, convention);
        let parsed = Rotation::from_matrix(*rotation.matrix(), convention);
        let rebuilt = Rotation::new(parsed.angles(), convention);
        assert_relative_eq!(
            rebuilt.matrix().matrix(),
            rotation.matrix().matrix(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn elementary_axes() {
        let rotation = Rotation::new(EulerAngles::new(FRAC_PI_2, 0.0, 0.0), EulerConvention::Xyz);
        assert_relative_eq!(rotation.matrix() * Vector3::y(), Vector3::z(), epsilon = 1e-12);
        let rotation = Rotation::new(EulerAngles::new(0.0, FRAC_PI_2, 0.0), EulerConvention::Xyz);
        assert_relative_eq!(rotation.matrix() * Vector3::z(), Vector3::x(), epsilon = 1e-12);
    }

    #[test]
    fn zyz_uses_all_three_angles() {
        let angles = EulerAngles::new(0.3, 0.5, -0.7);
        let rotation = Rotation::new(angles, EulerConvention::Zyz);
        let expected = rz(0.3) * ry(0.5) * rz(-0.7);
        assert_relative_eq!(rotation.matrix(), &expected, epsilon = 1e-12);
        let parsed = Rotation::from_matrix(expected, EulerConvention::Zyz).angles();
        assert_relative_eq!(parsed.to_vec(), angles.to_vec(), epsilon = 1e-9);
    }

    #[test]
    fn gimbal_lock_branches_round_trip() {
        for &convention in &CONVENTIONS {
            for &locked in &[FRAC_PI_2, -FRAC_PI_2] {
                let angles = match convention {
                    EulerConvention::Zyx | EulerConvention::Xyz => EulerAngles::new(0.4, locked, -0.9),
                    EulerConvention::Zxy | EulerConvention::Yxz => EulerAngles::new(locked, 0.4, -0.9),
                    EulerConvention::Zyz => EulerAngles::new(0.4, locked + FRAC_PI_2, -0.9),
                };
                assert_round_trip(angles, convention);
            }
        }
        // Zero tilt is the only lock of the zyz convention.
        assert_round_trip(EulerAngles::new(0.4, 0.0, -0.9), EulerConvention::Zyz);
        assert_round_trip(EulerAngles::new(0.4, core::f64::consts::PI, -0.9), EulerConvention::Zyz);
    }

    #[test]
    fn rejects_reflection() {
        let mirror = Matrix3::from_diagonal(&Vector3::new(1.0, 1.0, -1.0));
        assert!(matches!(
            Rotation::from_raw(mirror, EulerConvention::Xyz),
            Err(Error::InvalidTransform { .. })
        ));
    }

    #[test]
    fn rejects_wrong_shape() {
        let matrix = DMatrix::<f64>::identity(4, 3);
        assert!(Rotation::from_dmatrix(&matrix, EulerConvention::Zyx).is_err());
    }

    #[test]
    fn convention_change_keeps_matrix() {
        let rotation = Rotation::new(EulerAngles::new(0.1, -0.2, 0.3), EulerConvention::Zyx);
        let other = rotation.with_convention(EulerConvention::Yxz);
        assert_eq!(other.convention(), EulerConvention::Yxz);
        assert_relative_eq!(
            Rotation::new(other.angles(), EulerConvention::Yxz).matrix(),
            rotation.matrix(),
            epsilon = 1e-12
        );
    }

    proptest! {
        #[test]
        fn matrix_angles_matrix(
            alpha in -3.1..3.1f64,
            beta in -1.5..1.5f64,
            gamma in -3.1..3.1f64,
        ) {
            for &convention in &CONVENTIONS {
                assert_round_trip(EulerAngles::new(alpha, beta, gamma), convention);
            }
        }
    }
}
