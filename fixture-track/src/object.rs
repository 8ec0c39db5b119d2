use crate::{Model, ModelKind};
use fixture_core::{MarkPoint, ModelPoint, Transformation3D};
use std::sync::Arc;

/// A measured instance of a [`Model`] with its current pose.
///
/// The object is a snapshot. Updating the pose or the matched marks produces a new object and leaves the
/// old one as it was.
#[derive(Debug, Clone, PartialEq)]
pub struct MovableObject {
    model: Arc<Model>,
    pose: Transformation3D,
    visible_points: Vec<MarkPoint<ModelPoint>>,
    measured_points: Vec<MarkPoint<ModelPoint>>,
}

impl MovableObject {
    /// An object at the identity pose that has not been matched yet.
    pub fn new(model: Arc<Model>) -> Self {
        Self {
            model,
            pose: Transformation3D::identity(),
            visible_points: vec![],
            measured_points: vec![],
        }
    }

    #[must_use]
    pub fn with_pose(self, pose: Transformation3D) -> Self {
        Self { pose, ..self }
    }

    /// Records which nominal marks were seen and the measured marks they were matched with.
    #[must_use]
    pub fn with_matches(
        self,
        visible_points: Vec<MarkPoint<ModelPoint>>,
        measured_points: Vec<MarkPoint<ModelPoint>>,
    ) -> Self {
        Self {
            visible_points,
            measured_points,
            ..self
        }
    }

    pub fn model(&self) -> &Arc<Model> {
        &self.model
    }

    pub fn name(&self) -> &str {
        self.model.name()
    }

    pub fn pose(&self) -> &Transformation3D {
        &self.pose
    }

    /// The nominal marks that were matched in the last measurement.
    pub fn visible_points(&self) -> &[MarkPoint<ModelPoint>] {
        &self.visible_points
    }

    /// The measured counterparts of [`MovableObject::visible_points`], index by index.
    pub fn measured_points(&self) -> &[MarkPoint<ModelPoint>] {
        &self.measured_points
    }

    /// All nominal marks moved by the current pose.
    pub fn transformed_points(&self) -> Vec<MarkPoint<ModelPoint>> {
        self.model
            .points()
            .iter()
            .map(|mark| mark.map(|point| self.pose.transform(point)))
            .collect()
    }

    pub fn transformed_tool_center_points(&self) -> Vec<ModelPoint> {
        self.model
            .tool_center_points()
            .iter()
            .map(|&point| self.pose.transform(point))
            .collect()
    }

    /// Whether this object is an instance of the given model.
    pub fn is_instance_of(&self, model: &Model) -> bool {
        self.model.same_fixture(model)
    }
}

/// A measured object tagged with its role.
#[derive(Debug, Clone, PartialEq)]
pub enum TrackedObject {
    Adapter(MovableObject),
    Reference(MovableObject),
}

impl TrackedObject {
    /// Creates an unmatched object whose role follows the kind of the model.
    pub fn from_model(model: Arc<Model>) -> Self {
        match model.kind() {
            ModelKind::Adapter => Self::Adapter(MovableObject::new(model)),
            ModelKind::Reference => Self::Reference(MovableObject::new(model)),
        }
    }

    pub fn kind(&self) -> ModelKind {
        match self {
            Self::Adapter(_) => ModelKind::Adapter,
            Self::Reference(_) => ModelKind::Reference,
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    pub fn object(&self) -> &MovableObject {
        match self {
            Self::Adapter(object) | Self::Reference(object) => object,
        }
    }

    pub fn into_object(self) -> MovableObject {
        match self {
            Self::Adapter(object) | Self::Reference(object) => object,
        }
    }

    /// Applies `f` to the inner object and keeps the role.
    #[must_use]
    pub fn map(self, f: impl FnOnce(MovableObject) -> MovableObject) -> Self {
        match self {
            Self::Adapter(object) => Self::Adapter(f(object)),
            Self::Reference(object) => Self::Reference(f(object)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use fixture_core::{EulerAngles, EulerConvention, MarkCode, Rotation};
    use fixture_core::nalgebra::Vector3;

    fn gripper() -> Arc<Model> {
        Arc::new(
            Model::adapter(
                "gripper",
                vec![
                    MarkPoint::new(MarkCode::coded(1), ModelPoint::new(10.0, 0.0, 0.0)),
                    MarkPoint::uncoded(ModelPoint::new(0.0, 20.0, 0.0)),
                ],
            )
            .with_tool_center_points(vec![ModelPoint::new(0.0, 0.0, -50.0)]),
        )
    }

    #[test]
    fn starts_unmatched_at_identity() {
        let object = MovableObject::new(gripper());
        assert_eq!(*object.pose(), Transformation3D::identity());
        assert_eq!(object.pose().convention(), EulerConvention::Xyz);
        assert!(object.visible_points().is_empty() && object.measured_points().is_empty());
        assert_eq!(object.transformed_points(), object.model().points().to_vec());
    }

    #[test]
    fn pose_moves_marks_and_tool_center_points() {
        let pose = Transformation3D::new(
            Rotation::new(
                EulerAngles::from_degrees(0.0, 0.0, 90.0),
                EulerConvention::Xyz,
            ),
            Vector3::new(100.0, 0.0, 0.0),
        );
        let before = MovableObject::new(gripper());
        let after = before.clone().with_pose(pose);
        assert_eq!(*before.pose(), Transformation3D::identity());

        let marks = after.transformed_points();
        assert_eq!(marks[0].code(), MarkCode::coded(1));
        assert_relative_eq!(marks[0].point().0, ModelPoint::new(100.0, 10.0, 0.0).0, epsilon = 1e-9);
        assert_relative_eq!(marks[1].point().0, ModelPoint::new(80.0, 0.0, 0.0).0, epsilon = 1e-9);
        assert_relative_eq!(
            after.transformed_tool_center_points()[0].0,
            ModelPoint::new(100.0, 0.0, -50.0).0,
            epsilon = 1e-9
        );
    }

    #[test]
    fn role_follows_model_kind() {
        let adapter = TrackedObject::from_model(gripper());
        assert_eq!(adapter.kind(), ModelKind::Adapter);
        assert!(!adapter.is_reference());

        let plate = Arc::new(Model::reference("plate", gripper().points().to_vec()));
        let reference = TrackedObject::from_model(plate.clone());
        assert!(reference.is_reference());
        assert!(reference.object().is_instance_of(&plate));
        assert!(!reference.object().is_instance_of(&gripper()));

        let moved = reference.map(|object| object.with_pose(Transformation3D::identity().inverse()));
        assert!(moved.is_reference());
    }
}
