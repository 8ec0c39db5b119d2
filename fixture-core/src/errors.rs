use core::fmt;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// One of the self-checks run when the epipolar geometry of a rig is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum GeometryCheck {
    /// Singular values of the essential matrix and its agreement with the fundamental matrix.
    Essential,
    /// Rank 2 of the fundamental matrix and consistency with both epipoles.
    Fundamental,
    /// Compatibility of the near plane homography with the fundamental matrix.
    NearHomography,
    /// Compatibility of the far plane homography with the fundamental matrix.
    FarHomography,
}

impl GeometryCheck {
    /// Index of the check in the order the checks are run.
    pub fn index(self) -> usize {
        match self {
            Self::Essential => 0,
            Self::Fundamental => 1,
            Self::NearHomography => 2,
            Self::FarHomography => 3,
        }
    }
}

impl fmt::Display for GeometryCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Essential => "essential",
            Self::Fundamental => "fundamental",
            Self::NearHomography => "near homography",
            Self::FarHomography => "far homography",
        };
        write!(f, "{} ({})", name, self.index())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Error {
    /// A transform matrix had the wrong shape or was not a proper rigid motion.
    #[error("invalid transform: {reason}")]
    InvalidTransform { reason: String },
    /// The rig geometry failed one or more self-checks. The rig must be rebuilt.
    #[error("epipolar geometry is inconsistent, failed checks: {}", list_checks(.checks))]
    GeometryInconsistent { checks: Vec<GeometryCheck> },
    /// A matrix decomposition or inversion failed while building derived geometry.
    #[error("numeric failure while computing the {operation}")]
    NumericFailure { operation: &'static str },
    /// Two point lists that must correspond index by index had different lengths.
    #[error("point lists must have equal length, expected {expected} but found {found}")]
    ArgumentMismatch { expected: usize, found: usize },
}

impl Error {
    pub(crate) fn invalid_transform(reason: impl Into<String>) -> Self {
        Self::InvalidTransform {
            reason: reason.into(),
        }
    }
}

fn list_checks(checks: &[GeometryCheck]) -> String {
    checks
        .iter()
        .map(|check| check.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = core::result::Result<T, Error>;
