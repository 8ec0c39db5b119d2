use approx::assert_relative_eq;
use fixture_cloud::{ClassificationStatus, ClassifyAndRegister, DistanceVoting, Kabsch};
use fixture_core::{
    nalgebra::{IsometryMatrix3, Matrix4, Rotation3, Translation3, Vector3},
    ModelPoint,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

fn adapter() -> Vec<ModelPoint> {
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

fn reference() -> Vec<ModelPoint> {
    [
        (179.0, 146.0, 5.0),
        (7.0, 121.0, 39.0),
        (136.0, 47.0, 44.0),
        (119.0, 90.0, 0.0),
        (81.0, 56.0, 51.0),
        (174.0, 147.0, 43.0),
    ]
    .iter()
    .map(|&(x, y, z)| ModelPoint::new(x, y, z))
    .collect()
}

fn pose() -> IsometryMatrix3<f64> {
    IsometryMatrix3::from_parts(
        Translation3::new(120.0, -80.0, -3100.0),
        Rotation3::from_euler_angles(0.4, -0.2, 1.9),
    )
}

/// Both fixtures placed in front of the rig, shuffled and with a little measurement noise.
fn cloud(noise: f64) -> Vec<ModelPoint> {
    let mut rng = Pcg64::seed_from_u64(3);
    let elsewhere = IsometryMatrix3::from_parts(
        Translation3::new(-450.0, 200.0, -2800.0),
        Rotation3::from_euler_angles(-0.1, 0.3, -0.7),
    );
    let mut cloud: Vec<ModelPoint> = adapter()
        .iter()
        .map(|p| pose() * p.0)
        .chain(reference().iter().map(|p| elsewhere * p.0))
        .map(|p| {
            let jitter = Vector3::new(
                rng.gen_range(-noise..=noise),
                rng.gen_range(-noise..=noise),
                rng.gen_range(-noise..=noise),
            );
            ModelPoint(p + jitter)
        })
        .collect();
    cloud.swap(0, 11);
    cloud.swap(3, 7);
    cloud.reverse();
    cloud
}

#[test]
fn finds_the_adapter_among_other_marks() {
    let _ = pretty_env_logger::try_init_timed();
    let registration = ClassifyAndRegister::new()
        .register(&adapter(), &cloud(0.01))
        .unwrap();
    assert_eq!(registration.status, ClassificationStatus::Good);
    assert_eq!(registration.pairs.len(), 8);
    assert_eq!(registration.nominal, adapter());
    assert_relative_eq!(
        registration.transform.to_homogeneous(),
        pose().to_homogeneous(),
        epsilon = 0.05
    );
    assert!(registration.fit_error < 0.03);
    for (nominal, observed) in registration.nominal.iter().zip(&registration.observed) {
        assert!((pose() * nominal.0 - observed.0).norm() < 0.05);
    }
}

#[test]
fn a_tight_tolerance_grades_bad() {
    let registration = ClassifyAndRegister::new()
        .tolerance(1e-6)
        .register(&adapter(), &cloud(0.01))
        .unwrap();
    assert_eq!(registration.status, ClassificationStatus::Bad);
    assert!(registration.is_classified());
}

#[test]
fn an_absent_fixture_is_not_classified() {
    let cloud: Vec<ModelPoint> = reference().iter().map(|p| ModelPoint(pose() * p.0)).collect();
    let far_apart = [
        ModelPoint::new(0.0, 0.0, 0.0),
        ModelPoint::new(1500.0, 0.0, 0.0),
        ModelPoint::new(0.0, 1700.0, 0.0),
    ];
    let classify = ClassifyAndRegister::new();
    for observed in [&far_apart[..], &[][..]] {
        let registration = classify.register(&adapter(), observed).unwrap();
        assert_eq!(registration.status, ClassificationStatus::NotClassified);
        assert_eq!(registration.transform.to_homogeneous(), Matrix4::identity());
        assert!(registration.fit_error.is_nan());
        assert!(registration.nominal.is_empty() && registration.observed.is_empty());
    }
    // The reference alone is found in its own cloud.
    let found = classify.register(&reference(), &cloud).unwrap();
    assert_eq!(found.status, ClassificationStatus::Good);
}

#[test]
fn a_partly_hidden_fixture_is_still_found() {
    let visible: Vec<ModelPoint> = adapter()[..4]
        .iter()
        .map(|p| ModelPoint(pose() * p.0))
        .collect();
    let registration = ClassifyAndRegister::with_parts(
        DistanceVoting::new().similarity_threshold(0.9),
        Kabsch::new(),
    )
    .register(&adapter(), &visible)
    .unwrap();
    assert_eq!(registration.pairs, vec![(0, 0), (1, 1), (2, 2), (3, 3)]);
    assert_eq!(registration.status, ClassificationStatus::Good);
}
