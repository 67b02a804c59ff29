//! End-to-end gesture flows through the crop controller, with a small
//! frame-stepping stand-in for the host animation driver.

use quadcrop_core::gesture::ControllerState;
use quadcrop_core::{
    project_quad, Config, CropController, CropDataChange, CropProperty, CropRect, GestureKind,
    Orientation, Point, ProjectedMedia, Quadrilateral, SettleOutcome, Size, Transition,
};
use std::time::Duration;

const FRAME: Duration = Duration::from_millis(16);

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn trapezoid() -> ProjectedMedia {
    ProjectedMedia {
        width: 100.0,
        height: 100.0,
        quad: Quadrilateral {
            top_left: Point::new(0.0, 0.0),
            top_right: Point::new(100.0, 0.0),
            bottom_left: Point::new(20.0, 100.0),
            bottom_right: Point::new(80.0, 100.0),
        },
    }
}

/// Steps every transition frame by frame, feeding values back, then reports
/// completions in `order`. Returns every notification received.
fn drive(
    controller: &mut CropController,
    generation: u64,
    transitions: &[Transition],
    order: &[CropProperty],
) -> Vec<CropDataChange> {
    let mut elapsed = Duration::ZERO;
    while transitions.iter().any(|t| !t.is_finished(elapsed)) {
        elapsed += FRAME;
        for t in transitions {
            controller.apply_animated_value(generation, t.property, t.value_at(elapsed));
        }
    }
    order
        .iter()
        .filter_map(|property| controller.transition_finished(generation, *property))
        .collect()
}

fn start_three_property_settle() -> (CropController, u64, CropRect, Vec<Transition>) {
    let mut controller = CropController::new(
        trapezoid(),
        1.0,
        Size::new(300.0, 300.0),
        &Config::default(),
        Some(CropRect::new(10.0, 20.0, 50.0, 50.0)),
    )
    .unwrap();
    controller.begin_gesture(GestureKind::Pinch).unwrap();
    controller.pinch(0.625).unwrap();
    match controller.end_gesture().unwrap() {
        SettleOutcome::Animating {
            generation,
            target,
            transitions,
        } => (controller, generation, target, transitions),
        other => panic!("expected animation, got {:?}", other),
    }
}

#[test]
fn coalesces_three_transitions_in_every_order() {
    init_logging();
    let orders = [
        [CropProperty::OriginX, CropProperty::Width, CropProperty::Height],
        [CropProperty::OriginX, CropProperty::Height, CropProperty::Width],
        [CropProperty::Width, CropProperty::OriginX, CropProperty::Height],
        [CropProperty::Width, CropProperty::Height, CropProperty::OriginX],
        [CropProperty::Height, CropProperty::OriginX, CropProperty::Width],
        [CropProperty::Height, CropProperty::Width, CropProperty::OriginX],
    ];

    for order in orders {
        let (mut controller, generation, target, transitions) = start_three_property_settle();
        assert_eq!(transitions.len(), 3);

        let notifications = drive(&mut controller, generation, &transitions, &order);
        assert_eq!(notifications, vec![CropDataChange { rect: target }], "order {:?}", order);
        assert_eq!(controller.live(), target);
        assert_eq!(controller.committed(), target);
        assert_eq!(controller.state(), &ControllerState::Idle);
    }
}

#[test]
fn live_crop_tracks_animation_frames() {
    init_logging();
    let (mut controller, generation, target, transitions) = start_three_property_settle();
    let width = transitions
        .iter()
        .find(|t| t.property == CropProperty::Width)
        .copied()
        .unwrap();

    let halfway = width.value_at(Duration::from_millis(50));
    assert!(controller.apply_animated_value(generation, CropProperty::Width, halfway));
    assert_eq!(controller.live().width, halfway);
    assert!(halfway < 80.0 && halfway > target.width);
    // Origin Y is not animated in this settle.
    assert!(!controller.apply_animated_value(generation, CropProperty::OriginY, 0.0));
}

#[test]
fn pan_back_inside_settles_without_animation() {
    init_logging();
    let media = project_quad(200.0, 100.0, Orientation::Up, None, None, None).unwrap();
    let mut controller =
        CropController::new(media, 1.0, Size::new(200.0, 200.0), &Config::default(), None).unwrap();

    controller.begin_gesture(GestureKind::Pan).unwrap();
    controller.pan(Point::new(10.0, 0.0)).unwrap();
    let live = controller.pan(Point::new(-40.0, 0.0)).unwrap();
    assert_eq!(live, CropRect::new(70.0, 0.0, 100.0, 100.0));

    let outcome = controller.end_gesture().unwrap();
    assert_eq!(outcome, SettleOutcome::Settled(CropDataChange { rect: live }));
}

#[test]
fn pan_past_the_edge_animates_back() {
    init_logging();
    let media = project_quad(200.0, 100.0, Orientation::Up, None, None, None).unwrap();
    let mut controller =
        CropController::new(media, 1.0, Size::new(200.0, 200.0), &Config::default(), None).unwrap();

    controller.begin_gesture(GestureKind::Pan).unwrap();
    controller.pan(Point::new(-300.0, 40.0)).unwrap();
    assert_eq!(controller.live(), CropRect::new(125.0, -20.0, 100.0, 100.0));

    let SettleOutcome::Animating {
        generation,
        target,
        transitions,
    } = controller.end_gesture().unwrap()
    else {
        panic!("expected animation");
    };
    assert_eq!(target, CropRect::new(100.0, 0.0, 100.0, 100.0));

    let order: Vec<_> = transitions.iter().rev().map(|t| t.property).collect();
    let notifications = drive(&mut controller, generation, &transitions, &order);
    assert_eq!(notifications.len(), 1);
    assert_eq!(notifications[0].rect, target);
}

#[test]
fn rotated_media_settles_inside_quad() {
    init_logging();
    let media = project_quad(100.0, 100.0, Orientation::Up, None, None, Some(5.0)).unwrap();
    let mut controller =
        CropController::new(media, 1.0, Size::new(200.0, 200.0), &Config::default(), None).unwrap();

    controller.begin_gesture(GestureKind::Pan).unwrap();
    controller.pan(Point::new(0.0, 20.0)).unwrap();
    let outcome = controller.end_gesture().unwrap();

    let settled = match outcome {
        SettleOutcome::Settled(change) => change.rect,
        SettleOutcome::Animating {
            generation,
            target,
            transitions,
        } => {
            let order: Vec<_> = transitions.iter().map(|t| t.property).collect();
            let notifications = drive(&mut controller, generation, &transitions, &order);
            assert_eq!(notifications.len(), 1);
            target
        }
    };
    assert!(quadcrop_core::solver::contains(&media.quad, &settled, 1e-5));
    assert!((settled.aspect_ratio() - 1.0).abs() <= 1e-5);
}

#[test]
fn rolling_media_keeps_committed_crop_inside() {
    init_logging();
    for roll in [10.0, 15.0, 20.0, -10.0, -20.0] {
        for start_x in [0.0, 50.0] {
            let flat = project_quad(400.0, 300.0, Orientation::Up, None, None, None).unwrap();
            let mut controller = CropController::new(
                flat,
                1.0,
                Size::new(300.0, 300.0),
                &Config::default(),
                Some(CropRect::new(start_x, 0.0, 300.0, 300.0)),
            )
            .unwrap();

            let rolled = project_quad(400.0, 300.0, Orientation::Up, None, None, Some(roll)).unwrap();
            let change = controller.update_media(rolled).unwrap();
            let committed = controller.committed();

            assert_eq!(change, Some(CropDataChange { rect: committed }));
            assert_eq!(controller.live(), committed);
            assert!(committed.width > 0.0 && committed.height > 0.0);
            assert!(
                quadcrop_core::solver::contains(&rolled.quad, &committed, 1e-5),
                "roll {} from x={}: {:?} escapes",
                roll,
                start_x,
                committed
            );
        }
    }
}

#[test]
fn rolled_crop_matches_reference_after_media_change() {
    init_logging();
    let flat = project_quad(400.0, 300.0, Orientation::Up, None, None, None).unwrap();
    let mut controller = CropController::new(
        flat,
        1.0,
        Size::new(300.0, 300.0),
        &Config::default(),
        Some(CropRect::new(0.0, 0.0, 300.0, 300.0)),
    )
    .unwrap();
    let rolled = project_quad(400.0, 300.0, Orientation::Up, None, None, Some(10.0)).unwrap();
    controller.update_media(rolled).unwrap();

    let expected = CropRect::new(43.1229, 62.2915, 251.7299, 251.7299);
    assert!(controller.committed().max_delta(&expected) < 1e-4);
}
