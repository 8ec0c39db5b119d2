use crate::{Model, TrackedObject};
use fixture_cloud::{ClassificationStatus, ClassifyAndRegister, DistanceVoting, Kabsch};
use fixture_core::{MarkPoint, ModelPoint, Result};
use log::*;
use std::sync::Arc;

/// A model found in a cloud, placed at its registered pose.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationResult {
    pub object: TrackedObject,
    /// Mean distance between the registered nominal marks and their measured counterparts.
    pub fit_error: f64,
    /// Either [`ClassificationStatus::Good`] or [`ClassificationStatus::Bad`].
    pub status: ClassificationStatus,
}

/// Looks for every configured model in a measured cloud.
///
/// Each model is searched for independently with distance voting and registered with Kabsch. The same
/// tolerance bounds both the distance votes and the fit error of a good registration. Models that are not
/// found at all produce no result, since a fixture outside the field of view is a normal situation.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ModelsClassifier {
    tolerance: f64,
    similarity_threshold: f64,
}

impl ModelsClassifier {
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Default is `1.0`.
    #[must_use]
    pub fn tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    /// Default is `0.85`.
    #[must_use]
    pub fn similarity_threshold(self, similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
            ..self
        }
    }

    fn registration(&self) -> ClassifyAndRegister {
        ClassifyAndRegister::with_parts(
            DistanceVoting::new()
                .tolerance(self.tolerance)
                .similarity_threshold(self.similarity_threshold),
            Kabsch::new(),
        )
        .tolerance(self.tolerance)
    }

    /// Returns one result per model that was found, in model order.
    pub fn classify(
        &self,
        models: &[Arc<Model>],
        cloud: &[MarkPoint<ModelPoint>],
    ) -> Result<Vec<ClassificationResult>> {
        let registration = self.registration();
        let observed: Vec<ModelPoint> = cloud.iter().map(|mark| *mark.point()).collect();
        let mut results = vec![];
        for model in models {
            let found = registration.register(&model.coordinates(), &observed)?;
            if !found.is_classified() {
                debug!("model {} not found among {} marks", model.name(), cloud.len());
                continue;
            }
            info!(
                "model {} classified {:?} from {} marks, fit error {}",
                model.name(),
                found.status,
                found.pairs.len(),
                found.fit_error
            );
            let visible = found.pairs.iter().map(|&(i, _)| model.points()[i]).collect();
            let measured = found.pairs.iter().map(|&(_, j)| cloud[j]).collect();
            let object = TrackedObject::from_model(model.clone()).map(|object| {
                let pose = object.pose().with_isometry(found.transform);
                object.with_pose(pose).with_matches(visible, measured)
            });
            results.push(ClassificationResult {
                object,
                fit_error: found.fit_error,
                status: found.status,
            });
        }
        Ok(results)
    }
}

impl Default for ModelsClassifier {
    fn default() -> Self {
        Self {
            tolerance: 1.0,
            similarity_threshold: 0.85,
        }
    }
}
