use fixture_core::{
    nalgebra::{IsometryMatrix3, Matrix3x2, Point3, Vector3},
    CameraPoint,
};
use log::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Rays whose directions are closer to parallel than this (relative to their lengths) are not intersected.
const PARALLEL_EPSILON: f64 = 1e-9;

/// The point where two matched rays (nearly) meet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    /// The point in the frame of the left camera.
    pub point: Point3<f64>,
    /// How far the rays miss each other at the point.
    ///
    /// The closed form reports the signed offset of the right ray from the left ray along `y`, least
    /// squares reports the length of the shortest segment between the rays.
    pub parallax: f64,
}

/// How the two rays of a matched pair are intersected.
///
/// Both methods take the left ray in the left camera frame, the right ray in the right camera frame and the
/// pose of the right camera relative to the left camera, and return the same point when the rays do
/// intersect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum TriangulationMethod {
    /// Intersects the projections of the rays onto the `xz` plane and averages `y`.
    ///
    /// This is exact for a rig whose baseline lies mostly along `x`, which is how measuring rigs are built.
    ClosedForm,
    /// Solves `lambda * l - mu * r = b` for the closest points of both rays and takes their midpoint.
    LeastSquares,
}

impl Default for TriangulationMethod {
    fn default() -> Self {
        TriangulationMethod::ClosedForm
    }
}

impl TriangulationMethod {
    /// Intersects a left and a right ray.
    ///
    /// `relative` takes right camera coordinates into left camera coordinates; its translation is the
    /// (scaled) baseline. Returns `None` for (nearly) parallel rays.
    pub fn intersect(
        self,
        relative: &IsometryMatrix3<f64>,
        left: CameraPoint,
        right: CameraPoint,
    ) -> Option<Intersection> {
        let l = left.0;
        let r = relative.rotation * right.0;
        let baseline = relative.translation.vector;
        let intersection = match self {
            TriangulationMethod::ClosedForm => closed_form(l, r, baseline),
            TriangulationMethod::LeastSquares => least_squares(l, r, baseline),
        }?;
        if intersection.point.iter().all(|n| n.is_finite()) {
            trace!(
                "triangulated {:?} with parallax {}",
                intersection.point,
                intersection.parallax
            );
            Some(intersection)
        } else {
            None
        }
    }
}

fn closed_form(l: Vector3<f64>, r: Vector3<f64>, b: Vector3<f64>) -> Option<Intersection> {
    let denominator = l.x * r.z - r.x * l.z;
    if denominator.abs() <= PARALLEL_EPSILON * l.norm() * r.norm() {
        return None;
    }
    let lambda = (b.x * r.z - b.z * r.x) / denominator;
    let mu = (b.x * l.z - b.z * l.x) / denominator;

    let y_left = lambda * l.y;
    let y_right = b.y + mu * r.y;
    Some(Intersection {
        point: Point3::new(lambda * l.x, (y_left + y_right) / 2.0, lambda * l.z),
        parallax: y_right - y_left,
    })
}

fn least_squares(l: Vector3<f64>, r: Vector3<f64>, b: Vector3<f64>) -> Option<Intersection> {
    let system = Matrix3x2::from_columns(&[l, -r]);
    let svd = system.try_svd(true, true, f64::EPSILON, 0)?;
    if svd.singular_values.min() <= PARALLEL_EPSILON * svd.singular_values.max() {
        return None;
    }
    let solution = svd.solve(&b, f64::EPSILON).ok()?;
    let on_left = l * solution[0];
    let on_right = b + r * solution[1];
    Some(Intersection {
        point: Point3::from((on_left + on_right) / 2.0),
        parallax: (on_right - on_left).norm(),
    })
}
