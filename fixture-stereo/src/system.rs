use crate::{
    EpipolarGeometry, MarkPair, PairingMode, StereoGeometryParameters, TriangulationMethod,
};
use fixture_camera::CameraModel;
use fixture_core::{
    nalgebra::IsometryMatrix3, HomogeneousPoint, MarkPoint, ModelPoint, PixelPoint, Result,
};
use log::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A calibrated stereo rig that turns two lists of detections into a cloud of marks.
///
/// Both images are undistorted, their detections paired along the epipolar geometry of the rig and every
/// pair triangulated and mapped into the model frame through the pose of the left camera.
#[derive(Debug, Clone, PartialEq)]
pub struct StereoSystem {
    left: CameraModel,
    right: CameraModel,
    geometry: EpipolarGeometry,
    baseline_scale: f64,
    method: TriangulationMethod,
}

impl StereoSystem {
    /// Builds the epipolar geometry of the rig, failing if it does not pass its self-checks.
    pub fn new(
        left: CameraModel,
        right: CameraModel,
        parameters: StereoGeometryParameters,
    ) -> Result<Self> {
        let geometry = EpipolarGeometry::new(&left, &right, parameters)?;
        Ok(Self {
            left,
            right,
            geometry,
            baseline_scale: 1.0,
            method: TriangulationMethod::default(),
        })
    }

    /// Scales the baseline before triangulation, which scales the whole cloud.
    ///
    /// Default is `1.0`.
    #[must_use]
    pub fn baseline_scale(self, baseline_scale: f64) -> Self {
        Self {
            baseline_scale,
            ..self
        }
    }

    /// Default is [`TriangulationMethod::ClosedForm`].
    #[must_use]
    pub fn method(self, method: TriangulationMethod) -> Self {
        Self { method, ..self }
    }

    pub fn left(&self) -> &CameraModel {
        &self.left
    }

    pub fn right(&self) -> &CameraModel {
        &self.right
    }

    pub fn geometry(&self) -> &EpipolarGeometry {
        &self.geometry
    }

    /// The right camera pose in the left camera frame, with the baseline scaled.
    pub fn relative_pose(&self) -> IsometryMatrix3<f64> {
        let mut relative = (self.left.extrinsics.inverse() * self.right.extrinsics).isometry();
        relative.translation.vector *= self.baseline_scale;
        relative
    }

    /// Undistorts detections of both images and pairs them.
    pub fn pair(
        &self,
        left: &[MarkPoint<PixelPoint>],
        right: &[MarkPoint<PixelPoint>],
        mode: PairingMode,
    ) -> Vec<MarkPair<HomogeneousPoint>> {
        let homogeneous = |camera: &CameraModel, marks: &[MarkPoint<PixelPoint>]| {
            camera
                .undistort_marks(marks)
                .into_iter()
                .map(|mark| mark.map(|point| point.homogeneous()))
                .collect::<Vec<_>>()
        };
        self.geometry.pair_marks(
            &homogeneous(&self.left, left),
            &homogeneous(&self.right, right),
            mode,
        )
    }

    /// Triangulates one pair into the model frame, keeping the code of the left mark.
    pub fn triangulate(&self, pair: &MarkPair<HomogeneousPoint>) -> Option<MarkPoint<ModelPoint>> {
        let left = self.left.homogeneous_to_camera(*pair.left.point());
        let right = self.right.homogeneous_to_camera(*pair.right.point());
        let intersection = self.method.intersect(&self.relative_pose(), left, right)?;
        let point = self.left.extrinsics.transform(ModelPoint(intersection.point));
        Some(pair.left.with_point(point))
    }

    /// Computes the cloud of marks seen by both cameras.
    ///
    /// Pairs whose rays cannot be intersected are dropped.
    pub fn compute_3d_points(
        &self,
        left: &[MarkPoint<PixelPoint>],
        right: &[MarkPoint<PixelPoint>],
        mode: PairingMode,
    ) -> Vec<MarkPoint<ModelPoint>> {
        let pairs = self.pair(left, right, mode);
        let cloud: Vec<MarkPoint<ModelPoint>> = pairs
            .iter()
            .filter_map(|pair| {
                let triangulated = self.triangulate(pair);
                if triangulated.is_none() {
                    warn!(
                        "dropping pair {:?} with rays that do not intersect",
                        pair.left.code()
                    );
                }
                triangulated
            })
            .collect();
        info!(
            "triangulated {} marks from {} left and {} right detections",
            cloud.len(),
            left.len(),
            right.len()
        );
        cloud
    }
}

/// The calibration of a stereo rig as it is stored for a measurement session.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StereoRig {
    pub left: CameraModel,
    pub right: CameraModel,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub geometry: StereoGeometryParameters,
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_baseline_scale"))]
    pub baseline_scale: f64,
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub method: TriangulationMethod,
}

impl StereoRig {
    pub fn new(left: CameraModel, right: CameraModel) -> Self {
        Self {
            left,
            right,
            geometry: StereoGeometryParameters::default(),
            baseline_scale: default_baseline_scale(),
            method: TriangulationMethod::default(),
        }
    }

    pub fn build(&self) -> Result<StereoSystem> {
        Ok(StereoSystem::new(self.left, self.right, self.geometry)?
            .baseline_scale(self.baseline_scale)
            .method(self.method))
    }
}

fn default_baseline_scale() -> f64 {
    1.0
}
