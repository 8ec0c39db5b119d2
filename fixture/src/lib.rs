//! # `fixture`
//!
//! Measures where fixtures are with a calibrated stereo rig.
//!
//! Every fixture carries a known layout of circular and coded marks. The marks detected in both images of
//! the rig are paired along epipolar lines and triangulated into a cloud. Known layouts are found in the
//! cloud by comparing distances, registered with a closed form least squares fit, and finally expressed
//! against a reference fixture.
//!
//! This crate gathers the workspace in one place. The basic types of [`fixture_core`] are in the root of
//! the crate, everything else is in a module per concern behind a feature of the same name as the crate it
//! comes from. Applications that only need a part of the pipeline can depend on the crates directly.
//!
//! ## Modules
//! * [`camera`] - camera models and the conversions between image, sensor and model coordinates
//! * [`stereo`] - epipolar pairing of detections and triangulation
//! * [`cloud`] - finding a nominal layout in a cloud and registering it
//! * [`track`] - fixture models, per-fixture classification and referencing
//!
//! ## Example
//!
//! ```
//! use fixture::{cloud::ClassifyAndRegister, ModelPoint};
//!
//! let nominal = [
//!     ModelPoint::new(0.0, 0.0, 0.0),
//!     ModelPoint::new(120.0, 0.0, 0.0),
//!     ModelPoint::new(0.0, 75.0, 0.0),
//!     ModelPoint::new(35.0, 45.0, 70.0),
//! ];
//! // The same layout measured 3 m in front of the rig.
//! let observed: Vec<ModelPoint> = nominal
//!     .iter()
//!     .map(|p| ModelPoint::new(p.x + 500.0, p.y, p.z - 3000.0))
//!     .collect();
//! let registration = ClassifyAndRegister::new().register(&nominal, &observed).unwrap();
//! assert_eq!(registration.pairs.len(), 4);
//! assert!(registration.fit_error < 1e-9);
//! ```

pub use fixture_core::*;

/// Camera models and the coordinate transform chain
pub mod camera {
    #[cfg(feature = "fixture-camera")]
    pub use fixture_camera::*;
}

/// Epipolar geometry, pairing and triangulation
pub mod stereo {
    #[cfg(feature = "fixture-stereo")]
    pub use fixture_stereo::*;
}

/// Distance voting and rigid registration
pub mod cloud {
    #[cfg(feature = "fixture-cloud")]
    pub use fixture_cloud::*;
}

/// Fixture models, classification and referencing
pub mod track {
    #[cfg(feature = "fixture-track")]
    pub use fixture_track::*;
}
