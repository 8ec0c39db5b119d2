//! Pairing and triangulation of marker detections from a calibrated stereo rig.
//!
//! [`EpipolarGeometry`] holds the essential and fundamental matrices of the rig and the homographies of
//! the near and far planes of the working volume. It pairs coded marks by their code and uncoded marks by a
//! mutual search along the epipolar lines, restricted to the segment between the near and far planes.
//!
//! [`StereoSystem`] runs the whole chain for two lists of pixel detections:
//!
//! ```text
//! pixel -> undistorted -> homogeneous -> pairs -> camera rays -> intersection -> model
//! ```
//!
//! ```
//! use fixture_camera::{CameraIntrinsics, CameraModel, ImageSize, PixelPitch};
//! use fixture_core::{nalgebra::Vector3, MarkCode, MarkPoint, ModelPoint, Rotation, EulerConvention, Transformation3D};
//! use fixture_stereo::{PairingMode, StereoGeometryParameters, StereoSystem};
//!
//! let camera = |x: f64| {
//!     CameraModel::new(CameraIntrinsics::new(-12.5), ImageSize::new(4096, 3000), PixelPitch::square(0.00345))
//!         .extrinsics(Transformation3D::new(Rotation::identity(EulerConvention::Xyz), Vector3::new(x, 0.0, 0.0)))
//! };
//! let system = StereoSystem::new(camera(0.0), camera(300.0), StereoGeometryParameters::new()).unwrap();
//!
//! let point = ModelPoint::new(120.0, -40.0, -3000.0);
//! let left = [MarkPoint::new(MarkCode::coded(1), system.left().project(point).unwrap())];
//! let right = [MarkPoint::new(MarkCode::coded(1), system.right().project(point).unwrap())];
//! let cloud = system.compute_3d_points(&left, &right, PairingMode::Corridor);
//! assert!(cloud[0].point().approx_eq(&point, 1e-6));
//! ```

mod epipolar;
mod parameters;
mod system;
mod triangulation;

pub use epipolar::*;
pub use parameters::*;
pub use system::*;
pub use triangulation::*;
