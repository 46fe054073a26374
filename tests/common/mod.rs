//! Shared fixtures for the integration tests.

use cartesian_motion::{
    Kinematics, MachineConfig, MmPerMin3, MotionPlanner, MotorQueue, StepperControl, StopCommand,
    AXES, MOTORS,
};

/// Motor queue that records everything it is handed.
#[derive(Debug, Default)]
pub struct RecordingQueue {
    pub blocked: bool,
    pub lines: Vec<([f64; MOTORS], u32)>,
    pub dwells: Vec<u32>,
    pub stops: Vec<StopCommand>,
}

impl RecordingQueue {
    /// Sum of per-motor travel over every recorded segment.
    pub fn total_travel(&self) -> [f64; MOTORS] {
        let mut total = [0.0; MOTORS];
        for (steps, _) in &self.lines {
            for i in 0..MOTORS {
                total[i] += steps[i];
            }
        }
        total
    }
}

impl MotorQueue for RecordingQueue {
    fn ready(&self) -> bool {
        !self.blocked
    }

    fn queue_line(&mut self, steps: [f64; MOTORS], microseconds: u32) {
        self.lines.push((steps, microseconds));
    }

    fn queue_dwell(&mut self, microseconds: u32) {
        self.dwells.push(microseconds);
    }

    fn queue_stops(&mut self, command: StopCommand) {
        self.stops.push(command);
    }
}

/// Kinematics that maps mm of travel 1:1 to motor steps.
#[derive(Debug, Default)]
pub struct IdentityKinematics;

impl Kinematics for IdentityKinematics {
    fn inverse(&self, travel: &[f64; AXES], _microseconds: u32) -> [f64; MOTORS] {
        *travel
    }
}

/// Stepper control that just counts calls.
#[derive(Debug, Default)]
pub struct NullStepper {
    pub busy: bool,
    pub starts: u32,
    pub stops: u32,
}

impl StepperControl for NullStepper {
    fn start(&mut self) {
        self.starts += 1;
    }

    fn stop(&mut self) {
        self.stops += 1;
    }

    fn is_busy(&self) -> bool {
        self.busy
    }
}

pub type TestPlanner = MotionPlanner<RecordingQueue, IdentityKinematics, NullStepper, 32>;

/// Planner over the recording fixtures with the given maximum jerk.
pub fn planner_with_jerk(max_linear_jerk: f64) -> TestPlanner {
    let config = MachineConfig {
        planner: cartesian_motion::PlannerConfig {
            max_linear_jerk: MmPerMin3(max_linear_jerk),
            ..Default::default()
        },
        ..Default::default()
    };
    MotionPlanner::new(
        &config,
        RecordingQueue::default(),
        IdentityKinematics,
        NullStepper::default(),
    )
}
