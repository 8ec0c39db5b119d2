use approx::assert_relative_eq;
use fixture::{
    camera::{CameraIntrinsics, CameraModel, ImageSize, PixelPitch},
    cloud::ClassificationStatus,
    nalgebra::Vector3,
    stereo::{PairingMode, StereoRig},
    track::{Model, ReferenceStatus, SessionSettings},
    EulerAngles, EulerConvention, MarkCode, MarkPoint, ModelPoint, PixelPoint, Rotation,
    Transformation3D,
};
use std::sync::Arc;

fn camera(x: f64) -> CameraModel {
    CameraModel::new(
        CameraIntrinsics::new(-12.5),
        ImageSize::new(4096, 3000),
        PixelPitch::square(0.00345),
    )
    .extrinsics(Transformation3D::new(
        Rotation::identity(EulerConvention::Xyz),
        Vector3::new(x, 0.0, 0.0),
    ))
}

/// Coded marks on the even positions, plain marks on the odd ones.
fn gripper() -> Arc<Model> {
    let layout = [
        (25.0, 156.0, 44.0),
        (63.0, 96.0, 31.0),
        (144.0, 127.0, 24.0),
        (7.0, 155.0, 21.0),
        (168.0, 12.0, 41.0),
        (163.0, 30.0, 80.0),
        (220.0, 3.0, 0.0),
        (114.0, 169.0, 8.0),
    ];
    let marks = layout
        .iter()
        .enumerate()
        .map(|(i, &(x, y, z))| {
            let code = if i % 2 == 0 {
                MarkCode::coded(20 + i as u32)
            } else {
                MarkCode::default()
            };
            MarkPoint::new(code, ModelPoint::new(x, y, z))
        })
        .collect();
    let tool_center = ModelPoint::new(110.0, 80.0, -120.0);
    Arc::new(Model::adapter("gripper", marks).with_tool_center_points(vec![tool_center]))
}

fn base_plate() -> Arc<Model> {
    let layout = [
        (179.0, 146.0, 5.0),
        (7.0, 121.0, 39.0),
        (136.0, 47.0, 44.0),
        (119.0, 90.0, 0.0),
        (81.0, 56.0, 51.0),
        (174.0, 147.0, 43.0),
    ];
    let marks = layout
        .iter()
        .enumerate()
        .map(|(i, &(x, y, z))| {
            MarkPoint::new(MarkCode::coded(1 + i as u32), ModelPoint::new(x, y, z))
        })
        .collect();
    Arc::new(Model::reference("base plate", marks))
}

fn gripper_pose() -> Transformation3D {
    Transformation3D::new(
        Rotation::new(EulerAngles::new(0.4, -0.2, 1.9), EulerConvention::Xyz),
        Vector3::new(120.0, -80.0, -3100.0),
    )
}

fn plate_pose() -> Transformation3D {
    Transformation3D::new(
        Rotation::new(EulerAngles::new(-0.1, 0.3, -0.7), EulerConvention::Xyz),
        Vector3::new(-450.0, 200.0, -2800.0),
    )
}

/// What the detector reports for every mark of the placed models.
fn detections(
    camera: &CameraModel,
    placed: &[(Arc<Model>, Transformation3D)],
) -> Vec<MarkPoint<PixelPoint>> {
    placed
        .iter()
        .flat_map(|(model, pose)| {
            model.points().iter().map(move |mark| {
                mark.map(|point| camera.project(pose.transform(point)).unwrap())
            })
        })
        .collect()
}

#[test]
fn measures_the_gripper_against_the_base_plate() {
    let _ = pretty_env_logger::try_init_timed();
    let settings = SessionSettings::default();
    let rig = StereoRig {
        geometry: settings.stereo,
        ..StereoRig::new(camera(0.0), camera(300.0))
    };
    let system = rig.build().unwrap();

    let placed = [(base_plate(), plate_pose()), (gripper(), gripper_pose())];
    let left = detections(system.left(), &placed);
    let mut right = detections(system.right(), &placed);
    right.reverse();

    let cloud = system.compute_3d_points(&left, &right, PairingMode::Corridor);
    assert_eq!(cloud.len(), 14);
    let cloud = settings.enumerator().enumerate(&cloud);
    let plain: Vec<u32> = cloud
        .iter()
        .filter(|mark| !mark.has_code())
        .map(|mark| mark.code().id)
        .collect();
    assert_eq!(plain, vec![1000, 1001, 1002, 1003]);

    let results = settings
        .classifier()
        .classify(&[gripper(), base_plate()], &cloud)
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results
        .iter()
        .all(|result| result.status == ClassificationStatus::Good && result.fit_error < 1e-4));
    assert_eq!(results[0].object.object().visible_points().len(), 8);

    let referenced = settings
        .referencing(base_plate())
        .estimate_transformations(results);
    assert_eq!(referenced.status, ReferenceStatus::Good);
    assert_eq!(referenced.adapters.len(), 1);
    assert_relative_eq!(
        referenced.adapters[0].pose().matrix(),
        (plate_pose().inverse() * gripper_pose()).matrix(),
        epsilon = 1e-6
    );

    let tool_center = gripper_pose().transform(gripper().tool_center_points()[0]);
    assert_relative_eq!(
        referenced.adapters[0].transformed_tool_center_points()[0].0,
        plate_pose().inverse_transform(tool_center).0,
        epsilon = 1e-4
    );
}

#[test]
fn a_hidden_base_plate_leaves_the_gripper_in_the_rig_frame() {
    let settings = SessionSettings::default();
    let system = StereoRig::new(camera(0.0), camera(300.0)).build().unwrap();

    let placed = [(gripper(), gripper_pose())];
    let left = detections(system.left(), &placed);
    let right = detections(system.right(), &placed);
    let cloud = settings
        .enumerator()
        .enumerate(&system.compute_3d_points(&left, &right, PairingMode::Corridor));

    let results = settings
        .classifier()
        .classify(&[gripper(), base_plate()], &cloud)
        .unwrap();
    let referenced = settings
        .referencing(base_plate())
        .estimate_transformations(results);
    assert_eq!(referenced.status, ReferenceStatus::NotFound);
    assert!(referenced.referencing_error.is_nan());
    assert_relative_eq!(
        referenced.adapters[0].pose().matrix(),
        gripper_pose().matrix(),
        epsilon = 1e-6
    );
}
