use approx::assert_relative_eq;
use glam::DVec3;

use hmd_core::{
    layout, solve, CanvasSize, CompositorSettings, ConfigFault, DisplayMode, Eye, EyeRig,
    FrustumGeometry, HmdController, HmdError, HmdPose, HmdSettings, OpticalConfig,
    OpticalParameter,
};

/// A spread of valid lens/display combinations
fn configs() -> Vec<OpticalConfig> {
    let mut out = Vec::new();
    for f in [0.045, 0.05, 0.06] {
        for d in [0.03, 0.04, 0.044] {
            for ipd in [0.058, 0.065, 0.072] {
                for eye_relief in [0.01, 0.02] {
                    for (display_width, display_height) in [(0.11, 0.06), (0.14, 0.075)] {
                        for far_from_near in [0.5, 5.0] {
                            out.push(OpticalConfig {
                                f,
                                ipd,
                                eye_relief,
                                dist_lens_to_display: d,
                                display_width,
                                display_height,
                                far_from_near,
                            });
                        }
                    }
                }
            }
        }
    }
    out
}

fn poses() -> [HmdPose; 3] {
    [
        HmdPose::IDENTITY,
        HmdPose::from_euler(DVec3::new(0.0, 1.6, 0.0), 0.8, -0.3, 0.05),
        HmdPose::from_euler(DVec3::new(-4.0, 0.2, 7.5), -2.4, 0.6, -0.2),
    ]
}

#[test]
fn frustum_round_trip_reproduces_solver_planes() {
    for config in configs() {
        let solution = solve(&config).unwrap();
        let rig = EyeRig::new(&config, &solution.optics);

        for pose in poses() {
            for eye in Eye::BOTH {
                let eye_pose = rig.compute_view(&pose, eye);
                let geometry =
                    FrustumGeometry::from_matrices(&solution.projection[eye], &eye_pose.view)
                        .unwrap();
                let measured = geometry.eye_space_planes(&eye_pose.view);
                let expected = solution.optics.planes(eye);

                assert_relative_eq!(measured.left, expected.left, max_relative = 1e-6);
                assert_relative_eq!(measured.right, expected.right, max_relative = 1e-6);
                assert_relative_eq!(measured.top, expected.top, max_relative = 1e-6);
                assert_relative_eq!(measured.bottom, expected.bottom, max_relative = 1e-6);
                assert_relative_eq!(measured.near, expected.near, max_relative = 1e-6);
                assert_relative_eq!(measured.far, expected.far, max_relative = 1e-6);
            }
        }
    }
}

#[test]
fn pip_viewport_matches_eye_aspect() {
    let settings = CompositorSettings::default();
    for config in configs() {
        let optics = solve(&config).unwrap().optics;
        assert_eq!(
            optics.aspect_ratio_eye,
            (optics.right_for_left_eye - optics.left_for_left_eye) / (optics.top - optics.bottom)
        );
        assert!(optics.aspect_ratio_eye > 0.0);
        assert!(optics.near < optics.far);

        for canvas in [CanvasSize::new(1920, 1080), CanvasSize::new(800, 600)] {
            let rects = layout(
                DisplayMode::PictureInPicture,
                canvas,
                optics.aspect_ratio_eye,
                &settings,
            );
            let px = rects.left.to_pixels(canvas);
            assert_relative_eq!(
                px.width / px.height,
                optics.aspect_ratio_eye,
                max_relative = 1e-9
            );
        }
    }
}

#[test]
fn wider_ipd_strictly_separates_eyes() {
    let mut hmd = HmdController::new(OpticalConfig::cardboard(), HmdSettings::default()).unwrap();
    let pose = HmdPose::from_euler(DVec3::new(0.0, 1.6, 0.0), 0.3, 0.1, 0.0);
    hmd.set_pose(pose);

    let mut last = 0.0;
    for ipd in [0.054, 0.058, 0.062, 0.066, 0.07, 0.074] {
        hmd.set_parameter(OpticalParameter::Ipd, ipd).unwrap();
        let separation = hmd
            .camera(Eye::Left)
            .position
            .distance(hmd.camera(Eye::Right).position);
        assert!(separation > last, "ipd {ipd} did not widen the eyes");
        last = separation;
    }
}

#[test]
fn focal_length_equal_to_display_distance_is_rejected() {
    let mut hmd = HmdController::new(OpticalConfig::cardboard(), HmdSettings::default()).unwrap();
    let optics = *hmd.optics();
    let projection = hmd.solution().projection;

    let d = hmd.config().dist_lens_to_display;
    let err = hmd.set_parameter_by_name("f", d).unwrap_err();

    assert!(matches!(
        err,
        HmdError::InvalidOpticalConfig(ConfigFault::UndefinedMagnification { .. })
    ));
    assert_eq!(*hmd.optics(), optics);
    assert_eq!(hmd.solution().projection, projection);
    assert_eq!(hmd.camera(Eye::Left).projection, projection.left);
}

#[test]
fn identity_pose_places_eyes_ipd_apart() {
    let config = OpticalConfig::cardboard();
    let settings = HmdSettings {
        initial_pose: HmdPose::new(DVec3::new(0.5, 1.7, -1.0), glam::DQuat::IDENTITY),
        ..Default::default()
    };
    let hmd = HmdController::new(config, settings).unwrap();
    let left = hmd.camera(Eye::Left).position;
    let right = hmd.camera(Eye::Right).position;

    assert_relative_eq!(right.x - left.x, config.ipd, max_relative = 1e-12);
    assert_eq!(left.y, 1.7);
    assert_eq!(right.y, 1.7);
}

#[test]
fn cardboard_scenario() {
    let hmd = HmdController::new(OpticalConfig::cardboard(), HmdSettings::default()).unwrap();
    let optics = hmd.optics();

    assert!(optics.magnification > 0.0);
    assert_relative_eq!(optics.near, 0.06, max_relative = 1e-12);
    assert_relative_eq!(optics.far, 1.56, max_relative = 1e-12);
    assert!((0.4..=1.3).contains(&optics.aspect_ratio_eye));
    // Nasal/temporal halves add up to the whole display, so the eye aspect
    // reduces to half the display's aspect
    assert_relative_eq!(
        optics.aspect_ratio_eye,
        0.12096 / (2.0 * 0.068),
        max_relative = 1e-9
    );
}

#[test]
fn resize_in_pip_mode_rescales_viewport_uniformly() {
    let settings = HmdSettings {
        canvas: CanvasSize::new(1920, 1080),
        display_mode: DisplayMode::PictureInPicture,
        ..Default::default()
    };
    let mut hmd = HmdController::new(OpticalConfig::cardboard(), settings).unwrap();
    let aspect = hmd.optics().aspect_ratio_eye;
    let before = hmd.camera(Eye::Left).pixel_viewport;

    hmd.resize(CanvasSize::new(800, 600));
    let after = hmd.camera(Eye::Left).pixel_viewport;

    assert_eq!(hmd.optics().aspect_ratio_eye, aspect);
    assert_relative_eq!(before.aspect(), aspect, max_relative = 1e-9);
    assert_relative_eq!(after.aspect(), aspect, max_relative = 1e-9);
    assert_relative_eq!(
        after.width / before.width,
        after.height / before.height,
        max_relative = 1e-9
    );
    assert!(after.width < before.width);
}
