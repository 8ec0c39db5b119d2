use criterion::{criterion_group, criterion_main, Criterion};
use fixture_cloud::{ClassifyAndRegister, DistanceVoting, PointSetMatcher};
use fixture_core::{
    nalgebra::{IsometryMatrix3, Point3, Rotation3, Translation3, Vector3},
    ModelPoint,
};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

/// A random layout of `marks` marks hidden among `clutter` unrelated marks.
fn scene(marks: usize, clutter: usize) -> (Vec<ModelPoint>, Vec<ModelPoint>) {
    let mut rng = Pcg64::seed_from_u64(0);
    let mut random_point = |extent: f64| {
        ModelPoint(Point3::new(
            rng.gen_range(0.0..extent),
            rng.gen_range(0.0..extent),
            rng.gen_range(0.0..extent / 4.0),
        ))
    };
    let nominal: Vec<ModelPoint> = (0..marks).map(|_| random_point(250.0)).collect();
    let clutter: Vec<ModelPoint> = (0..clutter).map(|_| random_point(2000.0)).collect();
    let pose = IsometryMatrix3::from_parts(
        Translation3::from(Vector3::new(100.0, -50.0, -3000.0)),
        Rotation3::from_euler_angles(0.2, 0.1, 1.0),
    );
    let observed = nominal
        .iter()
        .map(|p| ModelPoint(pose * p.0))
        .chain(clutter)
        .collect();
    (nominal, observed)
}

fn voting(c: &mut Criterion) {
    let (nominal, observed) = scene(12, 40);
    let voting = DistanceVoting::new();
    c.bench_function("distance_voting_12_in_52", |b| {
        b.iter(|| voting.match_points(&nominal, &observed))
    });
}

fn classify_and_register(c: &mut Criterion) {
    let (nominal, observed) = scene(12, 40);
    let classify = ClassifyAndRegister::new();
    c.bench_function("classify_and_register_12_in_52", |b| {
        b.iter(|| classify.register(&nominal, &observed))
    });
}

criterion_group!(
    name = cloud;
    config = Criterion::default().sample_size(10);
    targets = voting, classify_and_register
);
criterion_main!(cloud);
