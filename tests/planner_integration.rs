//! Integration tests for the motion planning core.
//!
//! These drive the full submit -> plan -> backplan -> dispatch path over
//! recording fixtures and check the emitted segment streams.

mod common;

use common::{planner_with_jerk, TestPlanner};

use cartesian_motion::{
    ArcParams, BufferState, MoveType, PathMode, Step, StopCommand, EPSILON, MIN_LINE_LENGTH, X, Y,
    Z,
};

/// Drive the dispatcher until the queue drains.
fn drain(planner: &mut TestPlanner) {
    while planner.step() != Step::Idle {}
}

// =============================================================================
// Simple lines
// =============================================================================

#[test]
fn line_emits_one_segment() {
    let mut planner = planner_with_jerk(50_000_000.0);

    planner.line([10.0, 0.0, 0.0, 0.0], 1.0).unwrap();

    let bf = *planner.buffer(0);
    assert_eq!(bf.move_type, MoveType::Line);
    assert_eq!(bf.state, BufferState::Queued);
    assert!((bf.length - 10.0).abs() < 1e-9);
    assert!((bf.time - 1.0).abs() < 1e-12);
    assert!((bf.request_velocity - 10.0).abs() < 1e-9);

    assert_eq!(planner.step(), Step::Done);
    assert_eq!(planner.step(), Step::Idle);

    let queue = planner.motor_queue();
    assert_eq!(queue.lines.len(), 1);
    let (steps, microseconds) = queue.lines[0];
    assert!((steps[0] - 10.0).abs() < 1e-9);
    assert!(steps[1].abs() < 1e-9);
    assert_eq!(microseconds, 60_000_000);
    assert_eq!(planner.runtime_position(), [10.0, 0.0, 0.0, 0.0]);
}

#[test]
fn line_after_set_position() {
    let mut planner = planner_with_jerk(50_000_000.0);

    planner.set_position([100.0, 0.0, 0.0, 0.0]);
    planner.line([110.0, 0.0, 0.0, 0.0], 0.5).unwrap();
    drain(&mut planner);

    let (steps, microseconds) = planner.motor_queue().lines[0];
    assert!((steps[0] - 10.0).abs() < 1e-9);
    assert_eq!(microseconds, 30_000_000);
}

// =============================================================================
// Single jerk-limited feed
// =============================================================================

#[test]
fn feed_plans_head_and_tail_meeting_at_target_velocity() {
    // jerk such that a 0 -> 100 transition takes exactly 5 mm
    let mut planner = planner_with_jerk(40_000.0);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.1).unwrap();

    let head = *planner.buffer(0);
    let body = *planner.buffer(1);
    let tail = *planner.buffer(2);

    assert_eq!(head.move_type, MoveType::Accel);
    assert!((head.length - 5.0).abs() < EPSILON);
    assert!(head.start_velocity.abs() < EPSILON);
    assert!((head.end_velocity - 100.0).abs() < EPSILON);

    // no room for a body at the requested velocity
    assert_eq!(body.move_type, MoveType::Null);
    assert!(body.length.abs() < EPSILON);

    assert_eq!(tail.move_type, MoveType::Decel);
    assert!((tail.length - 5.0).abs() < EPSILON);
    assert!((tail.start_velocity - 100.0).abs() < EPSILON);
    assert!(tail.end_velocity.abs() < EPSILON);
}

#[test]
fn feed_segment_stream_reaches_target() {
    let mut planner = planner_with_jerk(40_000.0);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.1).unwrap();
    drain(&mut planner);

    // summed Cartesian displacement lands on the target within the
    // sub-minimum residual a finalize may drop
    let total = planner.motor_queue().total_travel();
    assert!(
        (total[0] - 10.0).abs() < 2.0 * MIN_LINE_LENGTH,
        "displacement off target: {}",
        total[0]
    );
    assert!(total[1].abs() < 1e-9);

    // acceleration segments run at the configured segment time
    let (_, microseconds) = planner.motor_queue().lines[0];
    assert!((i64::from(microseconds) - 10_000).abs() <= 1);
}

#[test]
fn feed_with_body_cruises_between_transitions() {
    let mut planner = planner_with_jerk(40_000.0);

    planner.feed([20.0, 0.0, 0.0, 0.0], 0.2).unwrap();

    let head = *planner.buffer(0);
    let body = *planner.buffer(1);
    let tail = *planner.buffer(2);

    assert_eq!(head.move_type, MoveType::Accel);
    assert_eq!(body.move_type, MoveType::Cruise);
    assert_eq!(tail.move_type, MoveType::Decel);
    assert!((body.length - 10.0).abs() < EPSILON);
    assert!((body.start_velocity - 100.0).abs() < EPSILON);
    assert!((body.end_velocity - 100.0).abs() < EPSILON);

    // region sum equals the geometric length
    let sum = head.length + body.length + tail.length;
    assert!((sum - 20.0).abs() < 0.01);
}

// =============================================================================
// Backplanning across joins
// =============================================================================

#[test]
fn colinear_feeds_blend_at_full_speed() {
    let mut planner = planner_with_jerk(100_000_000.0);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.05).unwrap();
    planner.feed([20.0, 0.0, 0.0, 0.0], 0.05).unwrap();

    // the first move no longer brakes to zero at the join
    let first_tail = *planner.buffer(2);
    assert!((first_tail.end_velocity - 200.0).abs() < EPSILON);
    assert_eq!(first_tail.move_type, MoveType::Null);

    // the second move enters at the full requested velocity
    assert!((planner.buffer(4).start_velocity - 200.0).abs() < EPSILON);

    // and the chain still ends in a braking tail
    let second_tail = *planner.buffer(5);
    assert_eq!(second_tail.move_type, MoveType::Decel);
    assert!(second_tail.end_velocity.abs() < EPSILON);

    drain(&mut planner);
    let total = planner.motor_queue().total_travel();
    assert!((total[0] - 20.0).abs() < 2.0 * MIN_LINE_LENGTH);
}

#[test]
fn right_angle_join_scales_entry_by_cornering_factor() {
    let mut planner = planner_with_jerk(100_000_000.0);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.05).unwrap();
    planner.feed([10.0, 10.0, 0.0, 0.0], 0.05).unwrap();

    // cos(90° / 2) = 0.7071...
    let expected = 200.0 * core::f64::consts::FRAC_1_SQRT_2;
    assert!((planner.buffer(3).start_velocity - expected).abs() < 1e-3);

    // the first move's tail was rewritten to decelerate to the join
    // velocity instead of zero
    assert!((planner.buffer(2).end_velocity - expected).abs() < 1e-3);
    assert_eq!(planner.buffer(2).move_type, MoveType::Decel);
    assert!(!planner.buffer(2).replannable);
}

#[test]
fn reversal_join_stops_at_the_corner() {
    let mut planner = planner_with_jerk(100_000_000.0);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.05).unwrap();
    planner.feed([0.0, 0.0, 0.0, 0.0], 0.05).unwrap();

    // 180° reversal: cornering factor is ~0, the new move enters at rest
    assert!(planner.buffer(3).start_velocity.abs() < 1e-6);
    // the previous tail still brakes to the join velocity of ~0
    assert!(planner.buffer(2).end_velocity.abs() < 1e-6);
}

#[test]
fn exact_stop_mode_pins_joins_to_zero() {
    let mut planner = planner_with_jerk(100_000_000.0);
    planner.set_path_control(PathMode::ExactStop);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.05).unwrap();
    planner.feed([20.0, 0.0, 0.0, 0.0], 0.05).unwrap();

    // the first move keeps its full stop and retired from replanning
    let first_tail = *planner.buffer(2);
    assert_eq!(first_tail.move_type, MoveType::Decel);
    assert!(first_tail.end_velocity.abs() < EPSILON);
    assert!(!planner.buffer(0).replannable);
    assert!(!planner.buffer(1).replannable);
    assert!(!planner.buffer(2).replannable);

    // the second move enters from rest
    assert!(planner.buffer(3).start_velocity.abs() < EPSILON);
}

#[test]
fn queued_regions_satisfy_continuity_invariants() {
    let mut planner = planner_with_jerk(40_000.0);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.1).unwrap();
    planner.feed([20.0, 0.0, 0.0, 0.0], 0.1).unwrap();
    planner.feed([25.0, 5.0, 0.0, 0.0], 0.1).unwrap();

    for move_index in 0..3 {
        let head = planner.buffer(move_index * 3);
        let body = planner.buffer(move_index * 3 + 1);
        let tail = planner.buffer(move_index * 3 + 2);

        // regions are null or at least the minimum line length
        for bf in [head, body, tail] {
            assert!(
                bf.move_type == MoveType::Null || bf.length >= MIN_LINE_LENGTH,
                "region shorter than minimum: {:?}",
                bf
            );
            assert!(bf.start_velocity >= 0.0);
            assert!(bf.end_velocity >= 0.0);
        }

        // adjacent regions agree on their shared velocity
        assert!((head.end_velocity - body.start_velocity).abs() < EPSILON);
        assert!((body.end_velocity - tail.start_velocity).abs() < EPSILON);

        // region lengths sum to the move's geometric length
        let sum = head.length + body.length + tail.length;
        let expected = if move_index < 2 {
            10.0
        } else {
            (25.0f64 - 20.0).hypot(5.0)
        };
        assert!((sum - expected).abs() < 0.01);
    }
}

// =============================================================================
// Arcs
// =============================================================================

#[test]
fn arc_chords_trace_the_circle() {
    let mut planner = planner_with_jerk(50_000_000.0);

    // quarter circle from [0,0] around centre [0,-10], ending at [10,-10]
    let params = ArcParams {
        theta: 0.0,
        radius: 10.0,
        angular_travel: core::f64::consts::FRAC_PI_2,
        linear_travel: 0.0,
        axis_1: X,
        axis_2: Y,
        axis_linear: Z,
    };
    planner
        .arc([10.0, -10.0, 0.0, 0.0], params, 0.1)
        .unwrap();

    let mut steps = 0;
    loop {
        match planner.step() {
            Step::Again => steps += 1,
            Step::Done => break,
            Step::Idle => panic!("arc finished without completing"),
        }
    }
    assert!(steps > 1, "arc should emit multiple chords");

    let total = planner.motor_queue().total_travel();
    assert!((total[0] - 10.0).abs() < 1e-6);
    assert!((total[1] + 10.0).abs() < 1e-6);

    // every chord stays on the circle
    let mut position = [0.0f64, 0.0];
    for (segment, _) in &planner.motor_queue().lines {
        position[0] += segment[0];
        position[1] += segment[1];
        let radius = position[0].hypot(position[1] + 10.0);
        assert!((radius - 10.0).abs() < 1e-6);
    }
}

#[test]
fn feed_after_arc_joins_at_arc_velocity() {
    let mut planner = planner_with_jerk(100_000_000.0);

    let params = ArcParams {
        theta: 0.0,
        radius: 10.0,
        angular_travel: core::f64::consts::FRAC_PI_2,
        linear_travel: 0.0,
        axis_1: X,
        axis_2: Y,
        axis_linear: Z,
    };
    planner
        .arc([10.0, -10.0, 0.0, 0.0], params, 0.1)
        .unwrap();
    let arc_velocity = planner.buffer(0).end_velocity;

    planner.feed([20.0, -10.0, 0.0, 0.0], 0.05).unwrap();

    // the feed enters at the arc's exit velocity
    assert!((planner.buffer(1).start_velocity - arc_velocity).abs() < EPSILON);
    // and the arc was not touched by any backplanning
    assert!((planner.buffer(0).end_velocity - arc_velocity).abs() < f64::EPSILON);
    assert!(!planner.buffer(0).replannable);
}

// =============================================================================
// Dwells, markers, ordering
// =============================================================================

#[test]
fn program_stream_preserves_submission_order() {
    let mut planner = planner_with_jerk(100_000_000.0);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.05).unwrap();
    planner.dwell(0.5).unwrap();
    planner.queue_stop().unwrap();
    planner.queue_end().unwrap();

    // nothing downstream yet
    assert!(planner.motor_queue().lines.is_empty());

    drain(&mut planner);

    let queue = planner.motor_queue();
    assert!(!queue.lines.is_empty());
    assert_eq!(queue.dwells, vec![500_000]);
    assert_eq!(queue.stops, vec![StopCommand::Stop, StopCommand::End]);
    assert!(!planner.is_busy());
}

#[test]
fn blocked_motor_queue_pauses_mid_feed() {
    let mut planner = planner_with_jerk(40_000.0);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.1).unwrap();
    assert_eq!(planner.step(), Step::Again);
    let emitted = planner.motor_queue().lines.len();

    // a full queue suspends the move exactly where it is
    planner.motor_queue_mut().blocked = true;
    assert_eq!(planner.step(), Step::Again);
    assert_eq!(planner.step(), Step::Again);
    assert_eq!(planner.motor_queue().lines.len(), emitted);

    // and it resumes from the same segment once the queue drains
    planner.motor_queue_mut().blocked = false;
    assert_eq!(planner.step(), Step::Again);
    assert_eq!(planner.motor_queue().lines.len(), emitted + 1);
}

#[test]
fn async_controls_reach_the_stepper_directly() {
    let mut planner = planner_with_jerk(40_000.0);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.1).unwrap();
    planner.async_stop();
    planner.async_start();
    planner.async_end();

    assert_eq!(planner.stepper().starts, 1);
    assert_eq!(planner.stepper().stops, 2);
    // stepper primitives fire without disturbing the queued move
    assert_eq!(planner.buffer(0).state, BufferState::Queued);
    assert_eq!(planner.pool().committed_count(), 3);

    // busy steppers show through is_busy even when the planner is idle
    planner.stepper_mut().busy = true;
    assert!(planner.is_busy());
}

#[test]
fn config_round_trip_drives_planner() {
    let toml = r#"
[planner]
max_linear_jerk_mm_per_min3 = 40000.0
min_segment_time_us = 20000.0

[path]
mode = "exact-path"
"#;
    let config = cartesian_motion::config::parse_config(toml).unwrap();
    let mut planner = TestPlanner::new(
        &config,
        common::RecordingQueue::default(),
        common::IdentityKinematics,
        common::NullStepper::default(),
    );
    assert_eq!(planner.path_control(), PathMode::ExactPath);

    planner.feed([10.0, 0.0, 0.0, 0.0], 0.1).unwrap();
    drain(&mut planner);

    // doubled segment time halves the segment count
    let (_, microseconds) = planner.motor_queue().lines[0];
    assert!((i64::from(microseconds) - 20_000).abs() <= 1);
}
