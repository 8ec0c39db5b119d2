use crate::{ClassificationResult, Model, MovableObject, TrackedObject};
use log::*;
use std::sync::Arc;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum ReferenceStatus {
    /// The reference fixture was not among the classified objects.
    NotFound,
    /// The reference was registered with a fit error below the tolerance.
    Good,
    /// The reference was registered, but not precisely enough.
    Bad,
}

/// Adapter poses expressed against the reference fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferencingResult {
    /// When the reference was not found, these are the adapters as classified.
    pub adapters: Vec<MovableObject>,
    /// Fit error of the reference itself, `NaN` when it was not found.
    pub referencing_error: f64,
    pub status: ReferenceStatus,
}

/// Re-expresses adapter poses in the frame of a configured reference fixture.
#[derive(Debug, Clone, PartialEq)]
pub struct Referencing {
    reference: Arc<Model>,
    tolerance: f64,
}

impl Referencing {
    pub fn new(reference: Arc<Model>) -> Self {
        Self {
            reference,
            tolerance: 1.0,
        }
    }

    /// Set the fit error below which the reference counts as [`ReferenceStatus::Good`].
    ///
    /// Default is `1.0`.
    #[must_use]
    pub fn tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    pub fn reference(&self) -> &Arc<Model> {
        &self.reference
    }

    /// Looks for the reference among `results` and moves every adapter into its frame.
    ///
    /// An adapter at pose `A` becomes `R^-1 * A` for the reference pose `R`. If several results are
    /// instances of the reference, the last one is used. Other reference fixtures are dropped.
    pub fn estimate_transformations(&self, mut results: Vec<ClassificationResult>) -> ReferencingResult {
        let found = results.iter().rposition(|result| {
            result.object.is_reference() && result.object.object().is_instance_of(&self.reference)
        });
        let reference = match found {
            Some(ix) => results.remove(ix),
            None => {
                info!("reference {} not found", self.reference.name());
                return ReferencingResult {
                    adapters: into_adapters(results).collect(),
                    referencing_error: f64::NAN,
                    status: ReferenceStatus::NotFound,
                };
            }
        };

        let to_reference = reference.object.object().pose().inverse();
        let adapters = into_adapters(results)
            .map(|adapter| {
                let pose = to_reference * *adapter.pose();
                adapter.with_pose(pose)
            })
            .collect();
        let status = if reference.fit_error < self.tolerance {
            ReferenceStatus::Good
        } else {
            ReferenceStatus::Bad
        };
        info!(
            "reference {} {:?} with fit error {}",
            self.reference.name(),
            status,
            reference.fit_error
        );
        ReferencingResult {
            adapters,
            referencing_error: reference.fit_error,
            status,
        }
    }
}

fn into_adapters(results: Vec<ClassificationResult>) -> impl Iterator<Item = MovableObject> {
    results.into_iter().filter_map(|result| match result.object {
        TrackedObject::Adapter(object) => Some(object),
        TrackedObject::Reference(_) => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fixture_cloud::ClassificationStatus;
    use fixture_core::{
        nalgebra::{Matrix4, Vector3},
        EulerAngles, EulerConvention, MarkCode, MarkPoint, ModelPoint, Rotation, Transformation3D,
    };

    fn plate() -> Arc<Model> {
        Arc::new(Model::reference(
            "plate",
            vec![
                MarkPoint::new(MarkCode::coded(1), ModelPoint::new(0.0, 0.0, 0.0)),
                MarkPoint::new(MarkCode::coded(2), ModelPoint::new(50.0, 0.0, 0.0)),
            ],
        ))
    }

    fn gripper() -> Arc<Model> {
        Arc::new(Model::adapter(
            "gripper",
            vec![MarkPoint::new(MarkCode::coded(7), ModelPoint::new(0.0, 0.0, 0.0))],
        ))
    }

    fn pose(angles: (f64, f64, f64), shift: (f64, f64, f64)) -> Transformation3D {
        Transformation3D::new(
            Rotation::new(EulerAngles::new(angles.0, angles.1, angles.2), EulerConvention::Xyz),
            Vector3::new(shift.0, shift.1, shift.2),
        )
    }

    fn result(object: TrackedObject, at: Transformation3D, fit_error: f64) -> ClassificationResult {
        ClassificationResult {
            object: object.map(|object| object.with_pose(at)),
            fit_error,
            status: ClassificationStatus::Good,
        }
    }

    #[test]
    fn adapters_end_up_in_the_reference_frame() {
        let reference_pose = pose((0.1, -0.3, 0.8), (200.0, -40.0, -3000.0));
        let adapter_pose = pose((-0.5, 0.2, 2.0), (-150.0, 90.0, -2700.0));
        let results = vec![
            result(TrackedObject::from_model(gripper()), adapter_pose, 0.2),
            result(TrackedObject::from_model(plate()), reference_pose, 0.4),
        ];
        let referenced = Referencing::new(plate()).tolerance(0.5).estimate_transformations(results);
        assert_eq!(referenced.status, ReferenceStatus::Good);
        assert_eq!(referenced.referencing_error, 0.4);
        assert_eq!(referenced.adapters.len(), 1);

        let relative = referenced.adapters[0].pose();
        assert_relative_eq!(
            (reference_pose * *relative).matrix(),
            adapter_pose.matrix(),
            epsilon = 1e-9
        );
        assert_eq!(relative.convention(), EulerConvention::Xyz);
    }

    #[test]
    fn an_imprecise_reference_is_bad() {
        let at_origin = Transformation3D::identity();
        let results = vec![result(TrackedObject::from_model(plate()), at_origin, 1.0)];
        let referenced = Referencing::new(plate()).estimate_transformations(results);
        assert_eq!(referenced.status, ReferenceStatus::Bad);
        assert!(referenced.adapters.is_empty());
    }

    #[test]
    fn a_missing_reference_leaves_adapters_alone() {
        let adapter_pose = pose((0.3, 0.0, 0.0), (1.0, 2.0, 3.0));
        let other_plate = Arc::new(Model::reference("other plate", plate().points().to_vec()));
        let results = vec![
            result(TrackedObject::from_model(other_plate), Transformation3D::identity(), 0.1),
            result(TrackedObject::from_model(gripper()), adapter_pose, 0.1),
        ];
        let referenced = Referencing::new(plate()).estimate_transformations(results);
        assert_eq!(referenced.status, ReferenceStatus::NotFound);
        assert!(referenced.referencing_error.is_nan());
        assert_eq!(referenced.adapters.len(), 1);
        assert_eq!(referenced.adapters[0].pose().matrix(), adapter_pose.matrix());
        assert_ne!(referenced.adapters[0].pose().matrix(), Matrix4::identity());
    }
}
