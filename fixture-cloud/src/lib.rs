//! Identification and registration of known marker layouts in a measured cloud.
//!
//! A fixture carries a rigid layout of marks. Which measured marks belong to it is decided by
//! [`DistanceVoting`], which compares the distances between marks and therefore does not depend on where
//! the fixture is or how it is turned. The matched marks are then registered with [`Kabsch`], the closed form
//! least squares rigid motion between two corresponding point sets. [`ClassifyAndRegister`] combines
//! both and grades the result against a tolerance on the fit error.
//!
//! Both steps sit behind a trait ([`PointSetMatcher`], [`RigidEstimator`]) so that either can be replaced.

mod classify;
mod kabsch;
mod voting;

pub use classify::*;
pub use kabsch::*;
pub use voting::*;

use fixture_core::{nalgebra::IsometryMatrix3, ModelPoint, Result};

/// Finds which points of an observed set correspond to which points of a nominal set.
pub trait PointSetMatcher {
    /// Returns `(nominal index, observed index)` pairs. Every point takes part in at most one pair.
    fn match_points(&self, nominal: &[ModelPoint], observed: &[ModelPoint]) -> Vec<(usize, usize)>;
}

/// The rigid motion that best maps one set of points onto another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidFit {
    pub transform: IsometryMatrix3<f64>,
    /// Mean distance between the mapped points and their targets.
    pub fit_error: f64,
}

/// Estimates a rigid motion from corresponding points.
pub trait RigidEstimator {
    /// `from[i]` corresponds to `to[i]`. Fails with [`Error::ArgumentMismatch`](fixture_core::Error) if
    /// the lengths differ.
    fn estimate(&self, from: &[ModelPoint], to: &[ModelPoint]) -> Result<RigidFit>;
}
