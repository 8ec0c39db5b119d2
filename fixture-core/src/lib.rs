//! # Fixture Core
//!
//! This library provides the common types shared by every crate of the stereo fixture measurement
//! workspace: typed points for each coordinate space, decoded mark identities, Euler rotations and
//! rigid transforms, and the error taxonomy. It is kept small so that the camera, stereo, point cloud
//! and tracking crates can agree on these types without pulling each other in.
//!
//! ## Coordinate spaces
//!
//! A marker detection travels through several coordinate spaces before it becomes a 3d point on a
//! fixture. Every space has its own newtype so that a point can only move from one space to another
//! through an explicit transform function. Mixing up spaces is the easiest way to get a wrong
//! measurement that still looks plausible, so the compiler is used to rule it out.
//!
//! ```text
//!  PixelPoint ──► PicturePoint ──► UndistortedPoint ──► HomogeneousPoint ──► CameraPoint ──► ModelPoint
//!   (u, v)        (sensor mm,       (distortion          (x, y, 1)            (x - ppx,        (x, y, z)
//!                  y up)             removed)                                  y - ppy, f)
//! ```
//!
//! * [`PixelPoint`] - image coordinates in pixels with the origin in the top left corner
//! * [`PicturePoint`] - sensor plane coordinates with the origin in the image centre
//! * [`UndistortedPoint`] - sensor plane coordinates with lens distortion removed
//! * [`HomogeneousPoint`] - an undistorted point with an appended weight, used by epipolar geometry
//! * [`CameraPoint`] - a ray out of the optical center of a camera, in that camera's frame
//! * [`ModelPoint`] - a 3d point in the measurement (model) frame
//!
//! The conversions themselves live in `fixture-camera`, as they depend on the camera model.
//!
//! ## Rigid transforms
//!
//! [`Transformation3D`] stores a [`Rotation`] expressed as Euler angles in one of the supported
//! [`EulerConvention`]s together with a translation. It is always a proper rigid motion: the
//! constructors that take raw matrices validate the shape, the bottom row and the rotation block
//! and fail with [`Error::InvalidTransform`] otherwise.

mod errors;
mod mark;
mod point;
mod rotation;
mod transform;

pub use errors::*;
pub use mark::*;
pub use nalgebra;
pub use point::*;
pub use rotation::*;
pub use transform::*;
