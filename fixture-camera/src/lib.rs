//! This crate provides the camera model of a measuring camera and the chain of explicit transforms that
//! moves a marker detection from pixel coordinates to a ray in the camera frame and on to the model frame,
//! as well as the reverse chain used to project model points back into an image.
//!
//! The camera follows the photogrammetric conventions of the sensor plane: picture coordinates are
//! metric, centred on the image centre and have `y` pointing up. A ray in the camera frame is
//! `(x - ppx, y - ppy, f)` where `f` is the principal distance, whose sign decides on which side of
//! the sensor the scene lies.

mod distortion;

pub use distortion::*;

use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use fixture_core::{
    nalgebra::{Matrix3, Point2, Point3, Vector2, Vector3},
    CameraPoint, HomogeneousPoint, MarkPoint, ModelPoint, PicturePoint, PixelPoint,
    Transformation3D, UndistortedPoint,
};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Homogeneous weights closer to one than this are not divided through.
const UNIT_WEIGHT_EPSILON: f64 = 1e-6;

/// Size of an image in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The centre of the image in pixel coordinates.
    pub fn centre(self) -> Point2<f64> {
        Point2::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }
}

/// Physical size of one pixel along `x` and `y`, in the metric unit of the sensor plane.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PixelPitch(pub Vector2<f64>);

impl PixelPitch {
    /// Square pixels.
    pub fn square(pitch: f64) -> Self {
        Self(Vector2::new(pitch, pitch))
    }

    /// The pitch of a sensor of the given physical size read out at `image_size`.
    pub fn from_sensor(sensor_size: Vector2<f64>, image_size: ImageSize) -> Self {
        Self(Vector2::new(
            sensor_size.x / f64::from(image_size.width),
            sensor_size.y / f64::from(image_size.height),
        ))
    }
}

/// Interior orientation of a camera.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraIntrinsics {
    /// Principal distance. Negative when the scene lies on the `-z` side of the sensor.
    pub focal: f64,
    /// Foot of the perpendicular from the projection centre onto the sensor, in picture coordinates.
    pub principal_point: Point2<f64>,
    pub distortion: DistortionParameters,
}

impl CameraIntrinsics {
    pub fn new(focal: f64) -> Self {
        Self {
            focal,
            principal_point: Point2::origin(),
            distortion: DistortionParameters::none(),
        }
    }

    #[must_use]
    pub fn principal_point(self, principal_point: Point2<f64>) -> Self {
        Self {
            principal_point,
            ..self
        }
    }

    #[must_use]
    pub fn distortion(self, distortion: DistortionParameters) -> Self {
        Self { distortion, ..self }
    }

    /// The intrinsic matrix mapping a camera ray to homogeneous picture coordinates.
    #[rustfmt::skip]
    pub fn matrix(&self) -> Matrix3<f64> {
        Matrix3::new(
            self.focal, 0.0,        self.principal_point.x,
            0.0,        self.focal, self.principal_point.y,
            0.0,        0.0,        1.0,
        )
    }
}

/// A calibrated camera: interior orientation, sensor geometry and pose.
///
/// The pose (`extrinsics`) maps points from the camera frame into the model frame.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraModel {
    pub extrinsics: Transformation3D,
    pub intrinsics: CameraIntrinsics,
    pub image_size: ImageSize,
    pub image_centre: Point2<f64>,
    pub pixel_pitch: PixelPitch,
}

impl CameraModel {
    /// A camera at the origin of the model frame with its image centre in the middle of the image.
    pub fn new(intrinsics: CameraIntrinsics, image_size: ImageSize, pixel_pitch: PixelPitch) -> Self {
        Self {
            extrinsics: Transformation3D::identity(),
            intrinsics,
            image_size,
            image_centre: image_size.centre(),
            pixel_pitch,
        }
    }

    /// Derives the pixel pitch from the physical size of the sensor.
    pub fn from_sensor(
        intrinsics: CameraIntrinsics,
        image_size: ImageSize,
        sensor_size: Vector2<f64>,
    ) -> Self {
        Self::new(
            intrinsics,
            image_size,
            PixelPitch::from_sensor(sensor_size, image_size),
        )
    }

    #[must_use]
    pub fn extrinsics(self, extrinsics: Transformation3D) -> Self {
        Self { extrinsics, ..self }
    }

    #[must_use]
    pub fn image_centre(self, image_centre: Point2<f64>) -> Self {
        Self {
            image_centre,
            ..self
        }
    }

    pub fn intrinsic_matrix(&self) -> Matrix3<f64> {
        self.intrinsics.matrix()
    }

    /// The sensor area in squared metric units.
    pub fn image_area(&self) -> f64 {
        4.0 * self.image_centre.x * self.image_centre.y * self.pixel_pitch.x * self.pixel_pitch.y
    }

    /// The distortion model of this camera.
    pub fn distortion(&self) -> ClassicDistortion {
        let half_extent = Vector2::new(
            self.image_centre.x * self.pixel_pitch.x + self.intrinsics.principal_point.x,
            self.image_centre.y * self.pixel_pitch.y + self.intrinsics.principal_point.y,
        );
        ClassicDistortion::new(
            self.intrinsics.distortion,
            self.intrinsics.principal_point,
            half_extent,
        )
    }

    pub fn pixel_to_picture(&self, pixel: PixelPoint) -> PicturePoint {
        let PixelPitch(pitch) = self.pixel_pitch;
        PicturePoint::new(
            pitch.x * (pixel.x - self.image_centre.x),
            pitch.y * (self.image_centre.y - pixel.y),
        )
    }

    pub fn picture_to_pixel(&self, picture: PicturePoint) -> PixelPoint {
        let PixelPitch(pitch) = self.pixel_pitch;
        PixelPoint::new(
            picture.x / pitch.x + self.image_centre.x,
            self.image_centre.y - picture.y / pitch.y,
        )
    }

    /// Pixel to picture followed by undistortion.
    pub fn pixel_to_undistorted(&self, pixel: PixelPoint) -> UndistortedPoint {
        self.distortion().undistort(self.pixel_to_picture(pixel))
    }

    /// Undistorts a whole list of detections, keeping their codes and order.
    pub fn undistort_marks(&self, marks: &[MarkPoint<PixelPoint>]) -> Vec<MarkPoint<UndistortedPoint>> {
        let distortion = self.distortion();
        marks
            .iter()
            .map(|mark| mark.map(|pixel| distortion.undistort(self.pixel_to_picture(pixel))))
            .collect()
    }

    /// The ray through an undistorted point.
    pub fn undistorted_to_camera(&self, point: UndistortedPoint) -> CameraPoint {
        let pp = self.intrinsics.principal_point;
        CameraPoint::new(point.x - pp.x, point.y - pp.y, self.intrinsics.focal)
    }

    /// The ray through a homogeneous point. The weight is divided through unless it is already one.
    pub fn homogeneous_to_camera(&self, point: HomogeneousPoint) -> CameraPoint {
        let w = point.z;
        let (x, y) = if (w - 1.0).abs() < UNIT_WEIGHT_EPSILON {
            (point.x, point.y)
        } else {
            (point.x / w, point.y / w)
        };
        self.undistorted_to_camera(UndistortedPoint::new(x, y))
    }

    /// Intersects a ray with the image plane.
    ///
    /// Returns `None` for rays parallel to the sensor.
    pub fn camera_to_undistorted(&self, point: CameraPoint) -> Option<UndistortedPoint> {
        if point.z == 0.0 {
            return None;
        }
        let scale = self.intrinsics.focal / point.z;
        let pp = self.intrinsics.principal_point;
        let projected = UndistortedPoint::new(pp.x + point.x * scale, pp.y + point.y * scale);
        if projected.iter().all(|n| n.is_finite()) {
            Some(projected)
        } else {
            None
        }
    }

    /// Maps a point given in the camera frame into the model frame.
    pub fn camera_to_model(&self, point: CameraPoint) -> ModelPoint {
        self.extrinsics.transform(ModelPoint(Point3::from(point.0)))
    }

    /// Maps a model point into the camera frame (transpose multiply by the rotation).
    pub fn model_to_camera(&self, point: ModelPoint) -> CameraPoint {
        CameraPoint(self.extrinsics.inverse_transform(point).0.coords)
    }

    /// Where a model point is imaged, including lens distortion.
    ///
    /// Returns `None` for points in the plane of the projection centre.
    pub fn project(&self, point: ModelPoint) -> Option<PixelPoint> {
        let undistorted = self.camera_to_undistorted(self.model_to_camera(point))?;
        let picture = self.distortion().distort(undistorted);
        Some(self.picture_to_pixel(picture))
    }

    /// The ray in the camera frame through a detection.
    pub fn back_project(&self, pixel: PixelPoint) -> CameraPoint {
        self.undistorted_to_camera(self.pixel_to_undistorted(pixel))
    }

    /// The viewing direction of the camera in its own frame.
    pub fn optical_axis(&self) -> Vector3<f64> {
        Vector3::new(0.0, 0.0, self.intrinsics.focal.signum())
    }
}
