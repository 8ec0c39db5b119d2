use crate::StereoGeometryParameters;
use fixture_camera::CameraModel;
use fixture_core::{
    nalgebra::{Matrix3, Point2, Vector3},
    Error, GeometryCheck, HomogeneousPoint, MarkPoint, Result,
};
use float_ord::FloatOrd;
use itertools::{EitherOrBoth, Itertools};
use log::*;

/// Iteration cap of the singular value decompositions in the self-checks.
const SVD_MAX_ITERATIONS: usize = 1000;

/// One of the two images of the rig.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ImageSide {
    Left,
    Right,
}

/// How far along the epipolar line a candidate may lie.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PairingMode {
    /// Only between the images of the far and the near plane.
    Corridor,
    /// Anywhere from the far plane towards the cameras. Used for scale bars, which are measured closer
    /// to the rig than the working volume.
    ScaleBar,
}

impl Default for PairingMode {
    fn default() -> Self {
        PairingMode::Corridor
    }
}

/// The homographies induced by a plane facing the rig at a fixed working distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneHomography {
    /// Distance of the plane from the left projection centre.
    pub distance: f64,
    pub left_to_right: Matrix3<f64>,
    pub right_to_left: Matrix3<f64>,
}

impl PlaneHomography {
    /// Where a point of one image lands in the other image if it lies on the plane.
    pub fn transfer(&self, point: HomogeneousPoint, from: ImageSide) -> Option<Point2<f64>> {
        let homography = match from {
            ImageSide::Left => &self.left_to_right,
            ImageSide::Right => &self.right_to_left,
        };
        Point2::from_homogeneous(homography * point.0)
    }
}

/// A point of the other image that passed the epipolar test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Index into the list of candidates that was searched.
    pub index: usize,
    /// Signed distance from the epipolar line.
    pub distance: f64,
    /// Position along the corridor: `0` on the far plane, `1` on the near plane.
    pub parameter: f64,
}

/// A left and a right detection of the same mark.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkPair<P> {
    pub left: MarkPoint<P>,
    pub right: MarkPoint<P>,
}

/// The epipolar geometry of a calibrated stereo rig, in homogeneous undistorted picture coordinates.
///
/// The essential matrix `E = [t]x R` maps rays of the left camera to epipolar planes of the right
/// camera, where `R` and `t` take left camera coordinates into right camera coordinates. The fundamental
/// matrix is `F = K_r^-T E K_l^-1`, so that `x_r^T F x_l = 0` for every correspondence.
///
/// The working corridor is delimited by two planes facing the rig, at the near and the far distance along
/// the mean viewing direction of both cameras. A point of one image maps through their homographies to the
/// two ends of a segment on its epipolar line in the other image, and only candidates on that segment are
/// considered.
///
/// Construction runs a number of self-checks on the resulting matrices and fails with
/// [`Error::GeometryInconsistent`] when any of them does not hold. A rig that fails has to be rebuilt from
/// corrected camera models.
#[derive(Debug, Clone, PartialEq)]
pub struct EpipolarGeometry {
    parameters: StereoGeometryParameters,
    rotation: Matrix3<f64>,
    translation: Vector3<f64>,
    essential: Matrix3<f64>,
    fundamental: Matrix3<f64>,
    near: PlaneHomography,
    far: PlaneHomography,
    expected_ambiguous_pairs: f64,
}

impl EpipolarGeometry {
    pub fn new(
        left: &CameraModel,
        right: &CameraModel,
        parameters: StereoGeometryParameters,
    ) -> Result<Self> {
        // Takes right camera coordinates into left camera coordinates.
        let relative = (left.extrinsics.inverse() * right.extrinsics).isometry();
        let relative_rotation = *relative.rotation.matrix();
        let relative_translation = relative.translation.vector;

        let rotation = relative_rotation.transpose();
        let translation = -(rotation * relative_translation);

        let k_left = left.intrinsic_matrix();
        let k_right = right.intrinsic_matrix();
        let k_left_inverse = k_left.try_inverse().ok_or(Error::NumericFailure {
            operation: "inverse of the left intrinsic matrix",
        })?;
        let k_right_inverse = k_right.try_inverse().ok_or(Error::NumericFailure {
            operation: "inverse of the right intrinsic matrix",
        })?;

        let essential = translation.cross_matrix() * rotation;
        let fundamental = k_right_inverse.transpose() * essential * k_left_inverse;

        let normal = (left.optical_axis() + relative_rotation * right.optical_axis())
            .try_normalize(f64::EPSILON)
            .ok_or(Error::NumericFailure {
                operation: "viewing direction of the rig",
            })?;
        let plane = |working_distance: f64| -> Result<PlaneHomography> {
            let distance = working_distance + normal.dot(&relative_translation) / 2.0;
            let left_to_right =
                k_right * (rotation + translation * normal.transpose() / distance) * k_left_inverse;
            let right_to_left = left_to_right.try_inverse().ok_or(Error::NumericFailure {
                operation: "inverse of a plane homography",
            })?;
            Ok(PlaneHomography {
                distance,
                left_to_right,
                right_to_left,
            })
        };
        let near = plane(parameters.near_distance)?;
        let far = plane(parameters.far_distance)?;

        let expected_ambiguous_pairs = 100.0
            * 99.0
            * (2.0
                * parameters.epipolar_epsilon
                * k_right[(0, 0)].abs()
                * relative_translation.norm()
                * (parameters.far_distance - parameters.near_distance))
            / (right.image_area() * parameters.far_distance * parameters.near_distance);

        let geometry = Self {
            parameters,
            rotation,
            translation,
            essential,
            fundamental,
            near,
            far,
            expected_ambiguous_pairs,
        };

        let failed = geometry.failed_checks(&k_left, &k_right)?;
        if !failed.is_empty() {
            warn!("epipolar self-check failed: {:?}", failed);
            return Err(Error::GeometryInconsistent { checks: failed });
        }

        debug!("essential matrix: {:?}", geometry.essential);
        debug!("fundamental matrix: {:?}", geometry.fundamental);
        debug!(
            "working corridor from {} to {}, expected ambiguous pairs per 100 marks: {}",
            geometry.near.distance, geometry.far.distance, geometry.expected_ambiguous_pairs
        );
        Ok(geometry)
    }

    pub fn parameters(&self) -> &StereoGeometryParameters {
        &self.parameters
    }

    /// The rotation taking left camera coordinates into right camera coordinates.
    pub fn rotation(&self) -> &Matrix3<f64> {
        &self.rotation
    }

    /// The left projection centre in right camera coordinates.
    pub fn translation(&self) -> Vector3<f64> {
        self.translation
    }

    pub fn essential(&self) -> &Matrix3<f64> {
        &self.essential
    }

    pub fn fundamental(&self) -> &Matrix3<f64> {
        &self.fundamental
    }

    pub fn near(&self) -> &PlaneHomography {
        &self.near
    }

    pub fn far(&self) -> &PlaneHomography {
        &self.far
    }

    /// Rough estimate of how many of 100 uncoded marks have a second candidate inside their corridor.
    pub fn expected_ambiguous_pairs(&self) -> f64 {
        self.expected_ambiguous_pairs
    }

    /// The epipolar line of `point` in the other image, scaled so that its dot product with a point of unit
    /// weight is the signed distance of that point.
    pub fn epipolar_line(&self, point: HomogeneousPoint, from: ImageSide) -> Option<Vector3<f64>> {
        let line = match from {
            ImageSide::Left => self.fundamental * point.0,
            ImageSide::Right => self.fundamental.tr_mul(&point.0),
        };
        let norm = line.xy().norm();
        if norm > 0.0 && norm.is_finite() {
            Some(line / norm)
        } else {
            None
        }
    }

    /// Searches `candidates` of the other image for the correspondent of `point`, which belongs to `from`.
    ///
    /// A candidate is accepted when it is closer to the epipolar line than the epipolar epsilon and lies
    /// within the corridor allowed by `mode`. The accepted candidates are ranked by absolute distance
    /// to the line, ties keeping their order in `candidates`.
    pub fn find_pair_indexes(
        &self,
        point: HomogeneousPoint,
        candidates: &[HomogeneousPoint],
        from: ImageSide,
        mode: PairingMode,
    ) -> Vec<Candidate> {
        let corridor = self
            .far
            .transfer(point, from)
            .zip(self.near.transfer(point, from));
        let (line, (start, end)) = match self.epipolar_line(point, from).zip(corridor) {
            Some(found) => found,
            None => return vec![],
        };
        let direction = end - start;
        let length_squared = direction.norm_squared();
        let epsilon = self.parameters.epipolar_epsilon;

        let mut found: Vec<Candidate> = candidates
            .iter()
            .enumerate()
            .filter_map(|(index, candidate)| {
                let candidate = Point2::from_homogeneous(candidate.0)?;
                let distance = line.dot(&candidate.to_homogeneous());
                let parameter = (candidate - start).dot(&direction) / length_squared;
                let inside = match mode {
                    PairingMode::Corridor => (0.0..=1.0).contains(&parameter),
                    PairingMode::ScaleBar => parameter >= 0.0,
                };
                (distance.abs() < epsilon && inside).then(|| Candidate {
                    index,
                    distance,
                    parameter,
                })
            })
            .collect();
        found.sort_by_key(|candidate| FloatOrd(candidate.distance.abs()));
        found
    }

    /// Pairs the detections of both images.
    ///
    /// Coded marks are paired by equal code. Uncoded marks are searched for in both directions and a
    /// pair is accepted only when each point is a candidate of the other. Left points are visited in
    /// order and take the best ranked right point that is still free, so the assignment is greedy.
    ///
    /// Coded pairs come first, ordered by code, followed by uncoded pairs in left order.
    pub fn pair_marks(
        &self,
        left: &[MarkPoint<HomogeneousPoint>],
        right: &[MarkPoint<HomogeneousPoint>],
        mode: PairingMode,
    ) -> Vec<MarkPair<HomogeneousPoint>> {
        let mut pairs = Self::pair_coded(left, right);
        let coded = pairs.len();
        pairs.extend(self.pair_uncoded(left, right, mode));
        debug!(
            "paired {} coded and {} uncoded marks out of {} left and {} right detections",
            coded,
            pairs.len() - coded,
            left.len(),
            right.len()
        );
        pairs
    }

    fn pair_coded(
        left: &[MarkPoint<HomogeneousPoint>],
        right: &[MarkPoint<HomogeneousPoint>],
    ) -> Vec<MarkPair<HomogeneousPoint>> {
        let by_code = |marks: &[MarkPoint<HomogeneousPoint>]| {
            marks
                .iter()
                .filter(|mark| mark.has_code())
                .copied()
                .sorted_by_key(|mark| mark.code())
                .dedup_by(|a, b| a.code() == b.code())
        };
        by_code(left)
            .merge_join_by(by_code(right), |a, b| a.code().cmp(&b.code()))
            .filter_map(|either| match either {
                EitherOrBoth::Both(left, right) => Some(MarkPair { left, right }),
                _ => None,
            })
            .collect()
    }

    fn pair_uncoded(
        &self,
        left: &[MarkPoint<HomogeneousPoint>],
        right: &[MarkPoint<HomogeneousPoint>],
        mode: PairingMode,
    ) -> Vec<MarkPair<HomogeneousPoint>> {
        let left: Vec<MarkPoint<HomogeneousPoint>> =
            left.iter().filter(|mark| !mark.has_code()).copied().collect();
        let right: Vec<MarkPoint<HomogeneousPoint>> =
            right.iter().filter(|mark| !mark.has_code()).copied().collect();
        let left_points: Vec<HomogeneousPoint> = left.iter().map(|mark| *mark.point()).collect();
        let right_points: Vec<HomogeneousPoint> = right.iter().map(|mark| *mark.point()).collect();

        let search = |points: &[HomogeneousPoint], others: &[HomogeneousPoint], from: ImageSide| {
            points
                .iter()
                .map(|&point| {
                    self.find_pair_indexes(point, others, from, mode)
                        .into_iter()
                        .map(|candidate| candidate.index)
                        .collect::<Vec<usize>>()
                })
                .collect::<Vec<_>>()
        };
        let left_to_right = search(&left_points, &right_points, ImageSide::Left);
        let mut right_to_left: Vec<Option<Vec<usize>>> =
            search(&right_points, &left_points, ImageSide::Right)
                .into_iter()
                .map(Some)
                .collect();
        trace!(
            "uncoded candidates left to right: {:?}, right to left: {:?}",
            left_to_right,
            right_to_left
        );

        let mut pairs = vec![];
        for (i, candidates) in left_to_right.iter().enumerate() {
            for &j in candidates {
                let mutual = right_to_left[j]
                    .as_ref()
                    .map_or(false, |back| back.contains(&i));
                if mutual {
                    right_to_left[j] = None;
                    pairs.push(MarkPair {
                        left: left[i],
                        right: right[j],
                    });
                    break;
                }
            }
        }
        pairs
    }
}

/// Singular values in descending order.
fn sorted_singular_values(matrix: &Matrix3<f64>) -> Result<[f64; 3]> {
    let svd = matrix
        .try_svd(false, false, f64::EPSILON, SVD_MAX_ITERATIONS)
        .ok_or(Error::NumericFailure {
            operation: "singular value decomposition",
        })?;
    let mut values = [
        svd.singular_values[0],
        svd.singular_values[1],
        svd.singular_values[2],
    ];
    values.sort_by_key(|&value| core::cmp::Reverse(FloatOrd(value)));
    Ok(values)
}

impl EpipolarGeometry {
    fn failed_checks(
        &self,
        k_left: &Matrix3<f64>,
        k_right: &Matrix3<f64>,
    ) -> Result<Vec<GeometryCheck>> {
        let precision = self.parameters.numeric_precision;
        let finite = |matrix: &Matrix3<f64>| matrix.iter().all(|n| n.is_finite());
        let mut failed = vec![];

        // E has two equal singular values and a null space, and is recovered from F.
        let essential_holds = finite(&self.essential) && {
            let [largest, middle, smallest] = sorted_singular_values(&self.essential)?;
            let scale = largest.max(1.0);
            let recovered = k_right.transpose() * self.fundamental * k_left;
            largest > precision
                && (largest - middle).abs() <= precision * scale
                && smallest <= precision * scale
                && (recovered - self.essential).amax() <= precision * scale
        };
        if !essential_holds {
            failed.push(GeometryCheck::Essential);
        }

        // F has rank two and its null spaces are the epipoles.
        let norm = self.fundamental.norm();
        let fundamental = self.fundamental / norm;
        let fundamental_holds = norm.is_normal() && finite(&fundamental) && {
            let [_, middle, smallest] = sorted_singular_values(&fundamental)?;
            let left_epipole = (k_left * (self.rotation.tr_mul(&self.translation))).normalize();
            let right_epipole = (k_right * self.translation).normalize();
            middle > precision
                && smallest <= precision
                && (fundamental * left_epipole).amax() <= precision
                && fundamental.tr_mul(&right_epipole).amax() <= precision
        };
        if !fundamental_holds {
            failed.push(GeometryCheck::Fundamental);
        }

        // Every homography induced by a plane satisfies H^T F + F^T H = 0.
        for (check, plane) in [
            (GeometryCheck::NearHomography, &self.near),
            (GeometryCheck::FarHomography, &self.far),
        ] {
            let homography = plane.left_to_right / plane.left_to_right.norm();
            let symmetric =
                homography.transpose() * fundamental + fundamental.transpose() * homography;
            if !(finite(&symmetric) && symmetric.amax() <= precision) {
                failed.push(check);
            }
        }
        Ok(failed)
    }
}
