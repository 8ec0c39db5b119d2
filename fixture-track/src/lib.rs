//! Classification and referencing of the fixtures seen by a stereo rig.
//!
//! A measurement session knows a catalog of [`Model`]s, each either an adapter (a fixture whose pose is
//! wanted) or the reference (the fixture the poses are expressed against). Every cloud triangulated by the
//! rig goes through two steps:
//!
//! 1. [`ModelsClassifier`] looks for every model in the cloud and places the ones it finds at their
//!    registered pose as a [`TrackedObject`].
//! 2. [`Referencing`] picks the configured reference among those objects and expresses every adapter pose
//!    in its frame.
//!
//! Objects are snapshots. A new pose gives a new [`MovableObject`], so results of earlier clouds are never
//! changed by later ones.

mod classifier;
mod enumerate;
mod model;
mod object;
mod referencing;
mod settings;

pub use classifier::*;
pub use enumerate::*;
pub use model::*;
pub use object::*;
pub use referencing::*;
pub use settings::*;
