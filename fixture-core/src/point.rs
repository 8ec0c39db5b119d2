use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::{Point2, Point3, Vector3};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A detection in image coordinates, measured in pixels.
///
/// The origin is the top left corner of the image, `x` grows to the right and `y` grows down.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PixelPoint(pub Point2<f64>);

impl PixelPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point2::new(x, y))
    }
}

/// A point on the sensor plane in metric units (the unit of the pixel pitch).
///
/// The origin is the image centre, `x` grows to the right and `y` grows up.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct PicturePoint(pub Point2<f64>);

impl PicturePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point2::new(x, y))
    }
}

/// A [`PicturePoint`] from which lens distortion has been removed.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct UndistortedPoint(pub Point2<f64>);

impl UndistortedPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point2::new(x, y))
    }

    /// Appends a unit weight to the point.
    pub fn homogeneous(self) -> HomogeneousPoint {
        HomogeneousPoint(self.0.to_homogeneous())
    }
}

/// An undistorted sensor plane point in homogeneous coordinates `(x, y, w)`.
///
/// This is the space in which the fundamental matrix and the plane homographies of a stereo rig operate.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct HomogeneousPoint(pub Vector3<f64>);

impl HomogeneousPoint {
    /// Divides through by the weight.
    ///
    /// Returns `None` for points at infinity.
    pub fn euclidean(self) -> Option<UndistortedPoint> {
        Point2::from_homogeneous(self.0).map(UndistortedPoint)
    }
}

/// A ray out of the optical center of a camera, in the frame of that camera.
///
/// Points produced from an image have the form `(x - ppx, y - ppy, f)`: the position on the sensor
/// relative to the principal point, with the principal distance as depth. Any positive multiple of
/// the vector describes the same ray.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct CameraPoint(pub Vector3<f64>);

impl CameraPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Vector3::new(x, y, z))
    }
}

/// A 3d point in the measurement frame.
///
/// Nominal fixture layouts, triangulated clouds and poses all live in this space.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ModelPoint(pub Point3<f64>);

impl ModelPoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self(Point3::new(x, y, z))
    }

    /// Checks that every coordinate is within `precision` of the other point.
    pub fn approx_eq(&self, other: &Self, precision: f64) -> bool {
        (self.0 - other.0).iter().all(|d| d.abs() < precision)
    }
}
