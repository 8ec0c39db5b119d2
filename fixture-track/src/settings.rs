use crate::{Model, ModelsClassifier, PointEnumerator, Referencing};
use fixture_stereo::StereoGeometryParameters;
use std::sync::Arc;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The settings for one measurement session.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SessionSettings {
    /// The largest fit error of a good registration, also the tolerance of the distance votes
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_registration_tolerance")
    )]
    pub registration_tolerance: f64,
    /// The normalized score a mark pair has to exceed to be classified as a match
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_similarity_threshold")
    )]
    pub similarity_threshold: f64,
    /// The fit error below which the reference fixture is considered good
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_referencing_tolerance")
    )]
    pub referencing_tolerance: f64,
    /// The first id given to uncoded marks of a cloud
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_enumeration_start")
    )]
    pub enumeration_start: u32,
    /// The working corridor and epipolar tolerance of the stereo rig
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub stereo: StereoGeometryParameters,
}

impl SessionSettings {
    pub fn classifier(&self) -> ModelsClassifier {
        ModelsClassifier::new()
            .tolerance(self.registration_tolerance)
            .similarity_threshold(self.similarity_threshold)
    }

    pub fn referencing(&self, reference: Arc<Model>) -> Referencing {
        Referencing::new(reference).tolerance(self.referencing_tolerance)
    }

    pub fn enumerator(&self) -> PointEnumerator {
        PointEnumerator::new().start_index(self.enumeration_start)
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            registration_tolerance: default_registration_tolerance(),
            similarity_threshold: default_similarity_threshold(),
            referencing_tolerance: default_referencing_tolerance(),
            enumeration_start: default_enumeration_start(),
            stereo: StereoGeometryParameters::default(),
        }
    }
}

fn default_registration_tolerance() -> f64 {
    1.0
}

fn default_similarity_threshold() -> f64 {
    0.85
}

fn default_referencing_tolerance() -> f64 {
    1.0
}

fn default_enumeration_start() -> u32 {
    1000
}
