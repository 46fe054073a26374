//! Cooperative move execution.
//!
//! The dispatcher drains the buffer ring one move at a time. Run routines
//! are non-blocking continuations: each call makes as much progress as
//! the motor queue allows and yields [`Step::Again`] until the move
//! completes. The caller drives [`MotionPlanner::step`] from its main
//! loop, interleaved with submissions.

mod arc;
mod feed;

use crate::buffer::{MoveState, MoveType};
use crate::geometry::axis_vector_length;
use crate::interface::{Kinematics, MotorQueue, Step, StepperControl, StopCommand};
use crate::planner::MotionPlanner;
use crate::{AXES, ONE_MINUTE_OF_MICROSECONDS};

/// Result of one run-routine call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RunOutcome {
    /// Progress blocked or mid-move; call again.
    Again,
    /// Move complete; the dispatcher frees the buffer.
    Done,
}

/// Convert minutes to microseconds.
#[inline]
pub(crate) fn minutes_to_us(minutes: f64) -> f64 {
    minutes * ONE_MINUTE_OF_MICROSECONDS
}

/// Persistent runtime state for the move being executed.
///
/// Exclusively owned by the dispatcher side; the planning side never
/// reads it except for [`position`](Self::position) when measuring
/// simple lines.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct RuntimeState {
    /// True from first dispatch of a move until it is finalized.
    pub run_flag: bool,
    /// Run routine selected when the current move first dispatched.
    pub run_move: MoveType,

    /// End position of the last emitted segment, in mm.
    pub position: [f64; AXES],
    /// Final target of the running move, in mm.
    pub target: [f64; AXES],

    /// Length of the running move or final segment, in mm.
    pub length: f64,
    /// Total running time, in minutes.
    pub time: f64,
    /// Duration of the current segment, in microseconds.
    pub microseconds: f64,
    /// Time into the current S-curve half, in minutes.
    pub elapsed_time: f64,
    /// Velocity at the accel/decel midpoint, mm/min.
    pub midpoint_velocity: f64,
    /// Acceleration at the accel/decel midpoint.
    pub midpoint_acceleration: f64,

    /// Segments in the arc or S-curve half.
    pub segments: f64,
    /// Segments still to emit.
    pub segment_count: u32,
    /// Constant time per segment, in minutes.
    pub segment_time: f64,
    /// Velocity of the current segment, mm/min.
    pub segment_velocity: f64,
    /// Linear-axis travel per arc segment, in mm.
    pub segment_length: f64,
    /// Angular travel per arc segment, in radians.
    pub segment_theta: f64,
    /// Arc centre on the first plane axis.
    pub center_1: f64,
    /// Arc centre on the second plane axis.
    pub center_2: f64,
}

impl<MQ, K, ST, const N: usize> MotionPlanner<MQ, K, ST, N>
where
    MQ: MotorQueue,
    K: Kinematics,
    ST: StepperControl,
{
    /// Dispatch one slice of the oldest queued move.
    ///
    /// Returns [`Step::Idle`] when nothing is queued, [`Step::Again`]
    /// while the current move wants more calls, and [`Step::Done`] when a
    /// move completed and its buffer was released. Never blocks.
    pub fn step(&mut self) -> Step {
        let Some(index) = self.pool.run_head() else {
            return Step::Idle;
        };
        if self.pool.get(index).move_state == MoveState::New {
            self.runtime.run_flag = true;
            self.runtime.run_move = self.pool.get(index).move_type;
        }
        let outcome = match self.runtime.run_move {
            MoveType::Null => self.run_null(index),
            MoveType::Accel => self.run_accel(index),
            MoveType::Cruise => self.run_cruise(index),
            MoveType::Decel => self.run_decel(index),
            MoveType::Line => self.run_line(index),
            MoveType::Arc => self.run_arc(index),
            MoveType::Dwell => self.run_dwell(index),
            MoveType::Start | MoveType::Stop | MoveType::End => self.run_stops(index),
        };
        match outcome {
            RunOutcome::Again => Step::Again,
            RunOutcome::Done => {
                self.runtime.run_flag = false;
                self.pool.finalize_run();
                Step::Done
            }
        }
    }

    /// Remove a null region from the queue.
    fn run_null(&mut self, index: usize) -> RunOutcome {
        self.pool.get_mut(index).replannable = false;
        RunOutcome::Done
    }

    /// Emit a simple constant-rate line as a single segment.
    fn run_line(&mut self, index: usize) -> RunOutcome {
        if self.pool.get(index).move_state == MoveState::End {
            return RunOutcome::Done; // killed
        }
        if !self.motor_queue.ready() {
            return RunOutcome::Again;
        }
        let bf = *self.pool.get(index);

        let mut travel = [0.0; AXES];
        for i in 0..AXES {
            travel[i] = bf.target[i] - self.runtime.position[i];
        }
        self.runtime.microseconds = minutes_to_us(bf.time);
        let microseconds = self.runtime.microseconds as u32;
        let steps = self.kinematics.inverse(&travel, microseconds);
        self.motor_queue.queue_line(steps, microseconds);
        self.runtime.position = bf.target;
        RunOutcome::Done
    }

    /// Pass a dwell through to the motor queue.
    ///
    /// The stepper side times the pause without sending pulses.
    fn run_dwell(&mut self, index: usize) -> RunOutcome {
        if self.pool.get(index).move_state == MoveState::End {
            return RunOutcome::Done; // killed
        }
        if !self.motor_queue.ready() {
            return RunOutcome::Again;
        }
        let seconds = self.pool.get(index).time;
        self.motor_queue.queue_dwell((seconds * 1_000_000.0) as u32);
        RunOutcome::Done
    }

    /// Pass a start/stop/end marker through to the motor queue.
    fn run_stops(&mut self, index: usize) -> RunOutcome {
        if self.pool.get(index).move_state == MoveState::End {
            return RunOutcome::Done; // killed
        }
        if !self.motor_queue.ready() {
            return RunOutcome::Again;
        }
        let command = match self.pool.get(index).move_type {
            MoveType::Start => StopCommand::Start,
            MoveType::End => StopCommand::End,
            _ => StopCommand::Stop,
        };
        self.motor_queue.queue_stops(command);
        RunOutcome::Done
    }

    /// Emit one last segment that lands exactly on the move target.
    ///
    /// Per-segment position math accumulates a little drift; the final
    /// segment absorbs it. Degenerate residuals are dropped rather than
    /// emitted as zero-time segments.
    pub(crate) fn run_feed_finalize(&mut self, index: usize) {
        self.runtime.length = axis_vector_length(&self.runtime.target, &self.runtime.position);
        let end_velocity = self.pool.get(index).end_velocity;
        if self.runtime.length < crate::MIN_LINE_LENGTH || end_velocity < crate::EPSILON {
            return;
        }
        self.runtime.time = self.runtime.length / end_velocity;
        self.runtime.microseconds = minutes_to_us(self.runtime.time);

        let mut travel = [0.0; AXES];
        for i in 0..AXES {
            travel[i] = self.runtime.target[i] - self.runtime.position[i];
        }
        let microseconds = self.runtime.microseconds as u32;
        let steps = self.kinematics.inverse(&travel, microseconds);
        self.motor_queue.queue_line(steps, microseconds);
        self.runtime.position = self.runtime.target;
    }
}
