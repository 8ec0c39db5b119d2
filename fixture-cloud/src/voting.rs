use crate::PointSetMatcher;
use fixture_core::{nalgebra::DMatrix, ModelPoint};
use itertools::iproduct;
use log::*;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// All distances between the points of a set.
pub fn distance_matrix(points: &[ModelPoint]) -> DMatrix<f64> {
    DMatrix::from_fn(points.len(), points.len(), |i, j| {
        (points[i].0 - points[j].0).norm()
    })
}

/// Matches points by how well their distances to the other points agree.
///
/// Every distance from a nominal point `i` to another nominal point votes for an observed point `j` if
/// some distance from `j` to an observed point is within the tolerance of it, with a weight that falls
/// linearly from one for an exact match to zero at the tolerance. The votes are normalized by the best
/// score of any pair. Pairs whose score exceeds the similarity threshold are then accepted greedily in
/// row major order, each nominal and each observed point at most once.
///
/// Only distances are compared, so the pose of the observed points does not matter. Layouts with repeated
/// distances (symmetric fixtures) cannot be told apart.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct DistanceVoting {
    tolerance: f64,
    similarity_threshold: f64,
}

impl DistanceVoting {
    /// Same as calling [`Default::default`].
    pub fn new() -> Self {
        Default::default()
    }

    /// Set the largest difference of two distances that still counts as a vote.
    ///
    /// Default is `1.0`.
    #[must_use]
    pub fn tolerance(self, tolerance: f64) -> Self {
        Self { tolerance, ..self }
    }

    /// Set the normalized score a pair has to exceed to be accepted.
    ///
    /// Default is `0.85`.
    #[must_use]
    pub fn similarity_threshold(self, similarity_threshold: f64) -> Self {
        Self {
            similarity_threshold,
            ..self
        }
    }

    /// The normalized `nominal x observed` score matrix.
    ///
    /// Returns `None` if no distance votes at all.
    pub fn similarity(&self, nominal: &[ModelPoint], observed: &[ModelPoint]) -> Option<DMatrix<f64>> {
        if nominal.is_empty() || observed.is_empty() {
            return None;
        }
        let nominal_distances = distance_matrix(nominal);
        let observed_distances = distance_matrix(observed);
        let scores = DMatrix::from_fn(nominal.len(), observed.len(), |i, j| {
            (0..nominal.len())
                .filter(|&k| k != i)
                .map(|k| {
                    let distance = nominal_distances[(i, k)];
                    let closest = observed_distances
                        .column(j)
                        .iter()
                        .map(|&other| (distance - other).abs())
                        .fold(f64::INFINITY, f64::min);
                    if closest < self.tolerance {
                        1.0 - closest / self.tolerance
                    } else {
                        0.0
                    }
                })
                .sum::<f64>()
        });
        let best = scores.max();
        if best > 0.0 {
            Some(scores / best)
        } else {
            None
        }
    }
}

impl Default for DistanceVoting {
    fn default() -> Self {
        Self {
            tolerance: 1.0,
            similarity_threshold: 0.85,
        }
    }
}

impl PointSetMatcher for DistanceVoting {
    fn match_points(&self, nominal: &[ModelPoint], observed: &[ModelPoint]) -> Vec<(usize, usize)> {
        let mut similarity = match self.similarity(nominal, observed) {
            Some(similarity) => similarity,
            None => {
                debug!(
                    "no distance of {} nominal points found among {} observed",
                    nominal.len(),
                    observed.len()
                );
                return vec![];
            }
        };
        let mut pairs = vec![];
        for (i, j) in iproduct!(0..nominal.len(), 0..observed.len()) {
            if similarity[(i, j)] > self.similarity_threshold {
                pairs.push((i, j));
                similarity.row_mut(i).fill(0.0);
                similarity.column_mut(j).fill(0.0);
            }
        }
        debug!(
            "matched {} of {} nominal points among {} observed",
            pairs.len(),
            nominal.len(),
            observed.len()
        );
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fixture_core::nalgebra::{IsometryMatrix3, Rotation3, Translation3, Vector3};
    use proptest::{collection::vec, prelude::*};

    /// A layout whose distances all differ by more than four times the default tolerance.
    fn layout() -> Vec<ModelPoint> {
        [
            (25.0, 156.0, 44.0),
            (63.0, 96.0, 31.0),
            (144.0, 127.0, 24.0),
            (7.0, 155.0, 21.0),
            (168.0, 12.0, 41.0),
            (163.0, 30.0, 80.0),
            (220.0, 3.0, 0.0),
            (114.0, 169.0, 8.0),
        ]
        .iter()
        .map(|&(x, y, z)| ModelPoint::new(x, y, z))
        .collect()
    }

    fn moved(points: &[ModelPoint]) -> Vec<ModelPoint> {
        let pose = IsometryMatrix3::from_parts(
            Translation3::new(-300.0, 1200.0, -2900.0),
            Rotation3::from_euler_angles(0.3, -1.2, 2.5),
        );
        points.iter().map(|p| ModelPoint(pose * p.0)).collect()
    }

    #[test]
    fn distances_are_symmetric() {
        let distances = distance_matrix(&layout());
        assert_eq!(distances, distances.transpose());
        assert!(distances.diagonal().iter().all(|&d| d == 0.0));
    }

    #[test]
    fn matches_a_moved_layout() {
        let nominal = layout();
        let pairs = DistanceVoting::new().match_points(&nominal, &moved(&nominal));
        assert_eq!(pairs, (0..8).map(|i| (i, i)).collect::<Vec<_>>());
    }

    #[test]
    fn spurious_points_are_left_out() {
        let nominal = layout();
        let mut observed = moved(&nominal);
        observed.insert(2, ModelPoint::new(900.0, 900.0, 900.0));
        observed.push(ModelPoint::new(-1000.0, 40.0, 0.0));
        let pairs = DistanceVoting::new().match_points(&nominal, &observed);
        let expected: Vec<(usize, usize)> = (0..8).map(|i| (i, if i < 2 { i } else { i + 1 })).collect();
        assert_eq!(pairs, expected);
    }

    #[test]
    fn unrelated_points_match_nothing() {
        let observed = [
            ModelPoint::new(0.0, 0.0, 0.0),
            ModelPoint::new(1500.0, 0.0, 0.0),
            ModelPoint::new(0.0, 1700.0, 0.0),
            ModelPoint::new(0.0, 0.0, 1900.0),
        ];
        let voting = DistanceVoting::new();
        assert!(voting.similarity(&layout(), &observed).is_none());
        assert!(voting.match_points(&layout(), &observed).is_empty());
        assert!(voting.match_points(&layout(), &[]).is_empty());
    }

    #[test]
    fn permutations_are_recovered() {
        let nominal = layout();
        let noise = (-0.02..0.02f64, -0.02..0.02f64, -0.02..0.02f64);
        proptest!(|(order in Just((0..8).collect::<Vec<usize>>()).prop_shuffle(), noise in vec(noise, 8))| {
            let placed = moved(&nominal);
            let observed: Vec<ModelPoint> = order
                .iter()
                .zip(&noise)
                .map(|(&i, &(x, y, z))| ModelPoint(placed[i].0 + Vector3::new(x, y, z)))
                .collect();
            let pairs = DistanceVoting::new().match_points(&nominal, &observed);
            let correct = pairs.iter().filter(|&&(i, j)| order[j] == i).count();
            prop_assert!(correct >= nominal.len() - 1, "only {} of {} correct", correct, nominal.len());
        });
    }
}
