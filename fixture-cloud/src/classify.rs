use crate::{DistanceVoting, Kabsch, PointSetMatcher, RigidEstimator};
use fixture_core::{nalgebra::IsometryMatrix3, ModelPoint, Result};
use log::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The outcome of looking for one nominal layout in a cloud.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum ClassificationStatus {
    /// Found and registered within the tolerance.
    Good,
    /// Found, but the fit error exceeds the tolerance.
    Bad,
    /// None of the nominal points could be matched.
    NotClassified,
}

/// The matched points of a nominal layout and the pose that maps them onto the cloud.
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    /// `(nominal index, observed index)` of every matched point.
    pub pairs: Vec<(usize, usize)>,
    /// The nominal points that were found, in pair order.
    pub nominal: Vec<ModelPoint>,
    /// The observed points they were matched with.
    pub observed: Vec<ModelPoint>,
    /// Maps nominal coordinates onto the cloud.
    pub transform: IsometryMatrix3<f64>,
    pub fit_error: f64,
    pub status: ClassificationStatus,
}

impl Registration {
    /// The identity registration with no points and an undefined error.
    pub fn not_classified() -> Self {
        Self {
            pairs: vec![],
            nominal: vec![],
            observed: vec![],
            transform: IsometryMatrix3::identity(),
            fit_error: f64::NAN,
            status: ClassificationStatus::NotClassified,
        }
    }

    pub fn is_classified(&self) -> bool {
        self.status != ClassificationStatus::NotClassified
    }
}

/// Finds a nominal layout in a cloud and registers it.
///
/// The matcher decides which observed points belong to the layout. If it finds none, the result is
/// [`ClassificationStatus::NotClassified`]. Otherwise the estimator computes the pose from the matched
/// points and the result is [`ClassificationStatus::Good`] if the fit error is at most the tolerance and
/// [`ClassificationStatus::Bad`] if it is larger.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ClassifyAndRegister<M = DistanceVoting, E = Kabsch> {
    matcher: M,
    estimator: E,
    tolerance: f64,
}

impl ClassifyAndRegister {
    /// Distance voting and Kabsch registration with default settings.
    ///
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }
}

impl Default for ClassifyAndRegister {
    fn default() -> Self {
        Self::with_parts(DistanceVoting::default(), Kabsch::default())
    }
}

impl<M, E> ClassifyAndRegister<M, E> {
    pub fn with_parts(matcher: M, estimator: E) -> Self {
        Self {
            matcher,
            estimator,
            tolerance: 1.0,
        }
    }

    /// Set the largest fit error of a [`ClassificationStatus::Good`] registration.
    ///
    /// Default is `1.0`.
    #[must_use]
    pub fn tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    pub fn matcher(&self) -> &M {
        &self.matcher
    }

    pub fn estimator(&self) -> &E {
        &self.estimator
    }
}

impl<M, E> ClassifyAndRegister<M, E>
where
    M: PointSetMatcher,
    E: RigidEstimator,
{
    pub fn register(&self, nominal: &[ModelPoint], observed: &[ModelPoint]) -> Result<Registration> {
        let pairs = self.matcher.match_points(nominal, observed);
        if pairs.is_empty() {
            return Ok(Registration::not_classified());
        }
        let matched_nominal: Vec<ModelPoint> = pairs.iter().map(|&(i, _)| nominal[i]).collect();
        let matched_observed: Vec<ModelPoint> = pairs.iter().map(|&(_, j)| observed[j]).collect();
        let fit = self.estimator.estimate(&matched_nominal, &matched_observed)?;

        let status = if fit.fit_error <= self.tolerance {
            ClassificationStatus::Good
        } else {
            ClassificationStatus::Bad
        };
        debug!(
            "registered {} of {} nominal points with fit error {}: {:?}",
            pairs.len(),
            nominal.len(),
            fit.fit_error,
            status
        );
        Ok(Registration {
            pairs,
            nominal: matched_nominal,
            observed: matched_observed,
            transform: fit.transform,
            fit_error: fit.fit_error,
            status,
        })
    }
}
