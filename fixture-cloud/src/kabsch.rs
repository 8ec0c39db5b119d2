use crate::{RigidEstimator, RigidFit};
use fixture_core::{
    nalgebra::{IsometryMatrix3, Matrix3, Rotation3, Translation3, Vector3},
    Error, ModelPoint, Result,
};
use float_ord::FloatOrd;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Closed form least squares registration of corresponding point sets.
///
/// The rotation comes from the singular value decomposition of the cross covariance `H` of both centered
/// sets. If `V U^T` is a reflection, the singular vector of the smallest singular value is flipped, so the
/// result is always a proper rotation. The translation then maps the centroid of `from` onto the centroid
/// of `to`.
///
/// ```
/// use fixture_cloud::{Kabsch, RigidEstimator};
/// use fixture_core::{nalgebra::Vector3, ModelPoint};
///
/// let from = [
///     ModelPoint::new(0.0, 0.0, 0.0),
///     ModelPoint::new(1.0, 0.0, 0.0),
///     ModelPoint::new(0.0, 1.0, 0.0),
/// ];
/// // A quarter turn about z followed by a shift along x.
/// let to = [
///     ModelPoint::new(5.0, 0.0, 0.0),
///     ModelPoint::new(5.0, 1.0, 0.0),
///     ModelPoint::new(4.0, 0.0, 0.0),
/// ];
/// let fit = Kabsch::new().estimate(&from, &to).unwrap();
/// assert!((fit.transform.translation.vector - Vector3::new(5.0, 0.0, 0.0)).norm() < 1e-9);
/// assert!(fit.fit_error < 1e-9);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Kabsch {
    epsilon: f64,
    max_iterations: usize,
}

impl Kabsch {
    /// Creates a `Kabsch` estimator with default values.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the epsilon used in the singular value decomposition.
    ///
    /// Default is `1e-12`.
    #[must_use]
    pub fn epsilon(self, epsilon: f64) -> Self {
        Self { epsilon, ..self }
    }

    /// Set the maximum number of iterations of the singular value decomposition.
    ///
    /// Default is `1000`.
    #[must_use]
    pub fn max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }
}

impl Default for Kabsch {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            max_iterations: 1000,
        }
    }
}

fn centroid(points: &[ModelPoint]) -> Vector3<f64> {
    points.iter().map(|p| p.0.coords).sum::<Vector3<f64>>() / points.len() as f64
}

/// Mean distance between the points of `from` moved by `transform` and the points of `to`.
pub fn mean_residual(transform: &IsometryMatrix3<f64>, from: &[ModelPoint], to: &[ModelPoint]) -> f64 {
    from.iter()
        .zip(to)
        .map(|(p, q)| (transform * p.0 - q.0).norm())
        .sum::<f64>()
        / from.len() as f64
}

impl RigidEstimator for Kabsch {
    fn estimate(&self, from: &[ModelPoint], to: &[ModelPoint]) -> Result<RigidFit> {
        if from.len() != to.len() {
            return Err(Error::ArgumentMismatch {
                expected: from.len(),
                found: to.len(),
            });
        }
        if from.is_empty() {
            return Err(Error::NumericFailure {
                operation: "registration of empty point sets",
            });
        }

        let from_centroid = centroid(from);
        let to_centroid = centroid(to);
        let covariance: Matrix3<f64> = from
            .iter()
            .zip(to)
            .map(|(p, q)| (p.0.coords - from_centroid) * (q.0.coords - to_centroid).transpose())
            .sum();

        let svd = covariance
            .try_svd(true, true, self.epsilon, self.max_iterations)
            .ok_or(Error::NumericFailure {
                operation: "singular value decomposition of the cross covariance",
            })?;
        let (u, v_t) = svd.u.zip(svd.v_t).ok_or(Error::NumericFailure {
            operation: "singular vectors of the cross covariance",
        })?;

        let mut correction = Matrix3::identity();
        if (v_t.transpose() * u.transpose()).determinant() < 0.0 {
            let weakest = svd
                .singular_values
                .iter()
                .enumerate()
                .min_by_key(|&(_, &value)| FloatOrd(value))
                .map(|(ix, _)| ix)
                .unwrap_or(2);
            correction[(weakest, weakest)] = -1.0;
        }
        let rotation = (u * correction * v_t).transpose();

        let rotation = Rotation3::from_matrix_unchecked(rotation);
        let translation = to_centroid - rotation * from_centroid;
        let transform = IsometryMatrix3::from_parts(Translation3::from(translation), rotation);
        Ok(RigidFit {
            transform,
            fit_error: mean_residual(&transform, from, to),
        })
    }
}
