use crate::{Error, EulerConvention, ModelPoint, Result, Rotation};
use core::ops::Mul;
use nalgebra::{DMatrix, IsometryMatrix3, Matrix3, Matrix4, RowVector4, Translation3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Tolerance on the bottom row of a homogeneous matrix.
const BOTTOM_ROW_EPSILON: f64 = 1e-9;

/// A proper rigid motion: a [`Rotation`] followed by a translation.
///
/// A point `p` is mapped to `R * p + t`. The homogeneous [`matrix`](Transformation3D::matrix)
/// always has the bottom row `[0, 0, 0, 1]` and an orthonormal rotation block with determinant `+1`.
///
/// Poses are values. Composition and inversion build new transforms and keep the Euler convention
/// of the left operand.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Transformation3D {
    rotation: Rotation,
    translation: Vector3<f64>,
}

impl Transformation3D {
    pub fn new(rotation: Rotation, translation: Vector3<f64>) -> Self {
        Self {
            rotation,
            translation,
        }
    }

    /// No rotation and no translation, with angles in the default convention.
    pub fn identity() -> Self {
        Self::new(Rotation::default(), Vector3::zeros())
    }

    pub fn from_isometry(isometry: IsometryMatrix3<f64>, convention: EulerConvention) -> Self {
        Self::new(
            Rotation::from_matrix(isometry.rotation, convention),
            isometry.translation.vector,
        )
    }

    /// Validates a homogeneous 4x4 matrix and decomposes it.
    pub fn from_matrix(matrix: &Matrix4<f64>, convention: EulerConvention) -> Result<Self> {
        let bottom = matrix.row(3) - RowVector4::new(0.0, 0.0, 0.0, 1.0);
        if bottom.amax() > BOTTOM_ROW_EPSILON || bottom.iter().any(|n| n.is_nan()) {
            return Err(Error::invalid_transform(
                "bottom row of a homogeneous transform must be [0, 0, 0, 1]",
            ));
        }
        let rotation: Matrix3<f64> = matrix.fixed_slice::<3, 3>(0, 0).into_owned();
        let translation: Vector3<f64> = matrix.fixed_slice::<3, 1>(0, 3).into_owned();
        if translation.iter().any(|n| !n.is_finite()) {
            return Err(Error::invalid_transform(
                "translation contains non-finite values",
            ));
        }
        Ok(Self::new(Rotation::from_raw(rotation, convention)?, translation))
    }

    /// Validates a dynamically sized matrix as a homogeneous 4x4 rigid transform.
    pub fn from_dmatrix(matrix: &DMatrix<f64>, convention: EulerConvention) -> Result<Self> {
        if matrix.shape() != (4, 4) {
            return Err(Error::invalid_transform(format!(
                "transform must be 4x4, got {}x{}",
                matrix.nrows(),
                matrix.ncols()
            )));
        }
        Self::from_matrix(&matrix.fixed_slice::<4, 4>(0, 0).into_owned(), convention)
    }

    pub fn rotation(&self) -> &Rotation {
        &self.rotation
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.translation
    }

    pub fn convention(&self) -> EulerConvention {
        self.rotation.convention()
    }

    pub fn isometry(&self) -> IsometryMatrix3<f64> {
        IsometryMatrix3::from_parts(Translation3::from(self.translation), *self.rotation.matrix())
    }

    /// The homogeneous 4x4 matrix.
    pub fn matrix(&self) -> Matrix4<f64> {
        self.isometry().to_homogeneous()
    }

    /// Replaces the whole pose with one computed elsewhere, keeping this pose's Euler convention.
    #[must_use]
    pub fn with_isometry(self, isometry: IsometryMatrix3<f64>) -> Self {
        Self::from_isometry(isometry, self.convention())
    }

    #[must_use]
    pub fn with_convention(self, convention: EulerConvention) -> Self {
        Self::new(self.rotation.with_convention(convention), self.translation)
    }

    #[must_use]
    pub fn inverse(&self) -> Self {
        self.with_isometry(self.isometry().inverse())
    }

    /// Computes `R * p + t`.
    pub fn transform(&self, point: ModelPoint) -> ModelPoint {
        ModelPoint(self.isometry() * point.0)
    }

    /// Computes `R^T * (p - t)`, the inverse mapping, without building the inverse transform.
    pub fn inverse_transform(&self, point: ModelPoint) -> ModelPoint {
        ModelPoint(self.isometry().inverse_transform_point(&point.0))
    }

    /// Applies only the rotation.
    pub fn rotate(&self, vector: Vector3<f64>) -> Vector3<f64> {
        self.rotation.matrix() * vector
    }
}

impl Default for Transformation3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl From<IsometryMatrix3<f64>> for Transformation3D {
    fn from(isometry: IsometryMatrix3<f64>) -> Self {
        Self::from_isometry(isometry, EulerConvention::default())
    }
}

impl From<Transformation3D> for IsometryMatrix3<f64> {
    fn from(transform: Transformation3D) -> Self {
        transform.isometry()
    }
}

/// `a * b` applies `b` first and then `a`.
impl Mul for Transformation3D {
    type Output = Transformation3D;

    fn mul(self, rhs: Transformation3D) -> Transformation3D {
        self.with_isometry(self.isometry() * rhs.isometry())
    }
}
