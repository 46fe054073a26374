//! Jerk-limited feed execution.
//!
//! Cruise regions emit as a single segment. Acceleration and deceleration
//! regions emit as two runs of constant-time segments, one per half of
//! the velocity S-curve, with the segment velocity evaluated from the
//! jerk equations at the segment's elapsed time. The last segment snaps
//! to the exact region target so drift cannot accumulate across regions.
//!
//! The S-curve halves come from the constant-jerk motion equations:
//! first half `v = Vs + (Jm/2)·t²`, second half
//! `v = Vm + Am·t - (Jm/2)·t²` where `Vm` is the midpoint velocity
//! `(Vs+Ve)/2` and `Am` the midpoint acceleration. A deceleration is the
//! same curve with the signs inverted.

use libm::round;

use super::{minutes_to_us, RunOutcome};
use crate::buffer::MoveState;
use crate::interface::{Kinematics, MotorQueue, StepperControl};
use crate::planner::MotionPlanner;
use crate::{AXES, EPSILON, MIN_LINE_LENGTH, ONE_MINUTE_OF_MICROSECONDS};

impl<MQ, K, ST, const N: usize> MotionPlanner<MQ, K, ST, N>
where
    MQ: MotorQueue,
    K: Kinematics,
    ST: StepperControl,
{
    /// Run a cruise region: one segment at constant velocity.
    pub(crate) fn run_cruise(&mut self, index: usize) -> RunOutcome {
        if self.pool.get(index).move_state == MoveState::End {
            return RunOutcome::Done; // killed
        }
        if !self.motor_queue.ready() {
            return RunOutcome::Again;
        }
        self.pool.get_mut(index).replannable = false;

        let bf = *self.pool.get(index);
        if bf.length < MIN_LINE_LENGTH || bf.end_velocity < EPSILON {
            return RunOutcome::Done; // toss the line
        }
        let time = bf.length / bf.end_velocity;
        self.pool.get_mut(index).time = time;
        self.runtime.microseconds = minutes_to_us(time);

        let mut travel = [0.0; AXES];
        for i in 0..AXES {
            self.runtime.target[i] = bf.target[i];
            travel[i] = bf.target[i] - self.runtime.position[i];
        }
        let microseconds = self.runtime.microseconds as u32;
        let steps = self.kinematics.inverse(&travel, microseconds);
        self.motor_queue.queue_line(steps, microseconds);
        self.runtime.position = bf.target;
        RunOutcome::Done
    }

    /// Run an acceleration region as two S-curve halves.
    pub(crate) fn run_accel(&mut self, index: usize) -> RunOutcome {
        if !self.motor_queue.ready() {
            return RunOutcome::Again;
        }
        if self.pool.get(index).move_state == MoveState::New {
            if !self.init_scurve(index) {
                return RunOutcome::Done;
            }
            self.pool.get_mut(index).move_state = MoveState::Running1;
        }
        // first half - concave portion of the curve
        if self.pool.get(index).move_state == MoveState::Running1 {
            let start_velocity = self.pool.get(index).start_velocity;
            let elapsed = self.runtime.elapsed_time;
            self.runtime.segment_velocity = start_velocity + self.jerk.div2 * elapsed * elapsed;
            if self.run_feed_segment(index) == RunOutcome::Again {
                return RunOutcome::Again;
            }
            self.setup_second_half(index);
            return RunOutcome::Again; // no guarantee the motor queue stays ready
        }
        // second half - convex portion of the curve
        if self.pool.get(index).move_state == MoveState::Running2 {
            if self.runtime.segment_count > 1 {
                let elapsed = self.runtime.elapsed_time;
                self.runtime.segment_velocity = self.runtime.midpoint_velocity
                    + elapsed * self.runtime.midpoint_acceleration
                    - self.jerk.div2 * elapsed * elapsed;
                return self.run_feed_segment(index);
            }
            self.run_feed_finalize(index);
            return RunOutcome::Done;
        }
        RunOutcome::Done // killed or inconsistent state
    }

    /// Run a deceleration region: the acceleration curve with inverted
    /// signs.
    pub(crate) fn run_decel(&mut self, index: usize) -> RunOutcome {
        if !self.motor_queue.ready() {
            return RunOutcome::Again;
        }
        if self.pool.get(index).move_state == MoveState::New {
            if !self.init_scurve(index) {
                return RunOutcome::Done;
            }
            self.pool.get_mut(index).move_state = MoveState::Running1;
        }
        // first half - convex portion of the curve
        if self.pool.get(index).move_state == MoveState::Running1 {
            let start_velocity = self.pool.get(index).start_velocity;
            let elapsed = self.runtime.elapsed_time;
            self.runtime.segment_velocity = start_velocity - self.jerk.div2 * elapsed * elapsed;
            if self.run_feed_segment(index) == RunOutcome::Again {
                return RunOutcome::Again;
            }
            self.setup_second_half(index);
            return RunOutcome::Again;
        }
        // second half - concave portion of the curve
        if self.pool.get(index).move_state == MoveState::Running2 {
            if self.runtime.segment_count > 1 {
                let elapsed = self.runtime.elapsed_time;
                self.runtime.segment_velocity = self.runtime.midpoint_velocity
                    - elapsed * self.runtime.midpoint_acceleration
                    + self.jerk.div2 * elapsed * elapsed;
                return self.run_feed_segment(index);
            }
            self.run_feed_finalize(index);
            return RunOutcome::Done;
        }
        RunOutcome::Done
    }

    /// Shared first-dispatch setup for accel and decel regions.
    ///
    /// Returns false when the region should complete without emitting
    /// (too short, underflowed velocities, or sub-segment duration).
    fn init_scurve(&mut self, index: usize) -> bool {
        self.pool.get_mut(index).replannable = false;
        let bf = *self.pool.get(index);
        if bf.length < MIN_LINE_LENGTH {
            return false;
        }
        self.runtime.midpoint_velocity = (bf.start_velocity + bf.end_velocity) / 2.0;
        if self.runtime.midpoint_velocity < EPSILON {
            log::warn!("underflowed midpoint velocity: {}", self.runtime.midpoint_velocity);
            return false;
        }
        self.runtime.time = bf.length / self.runtime.midpoint_velocity;
        self.runtime.midpoint_acceleration = self.runtime.time * self.jerk.div2;
        self.runtime.target = bf.target;

        // segments in each half
        self.runtime.segments = round(
            round(ONE_MINUTE_OF_MICROSECONDS * self.runtime.time / self.min_segment_time_us)
                / 2.0,
        );
        if self.runtime.segments as u32 == 0 {
            log::warn!("move too short to segment: {}", bf.length);
            return false;
        }
        self.runtime.segment_time = self.runtime.time / (2.0 * self.runtime.segments);
        // positions evaluate at the segment midpoint
        self.runtime.elapsed_time = self.runtime.segment_time / 2.0;
        self.runtime.microseconds = minutes_to_us(self.runtime.segment_time);
        self.runtime.segment_count = self.runtime.segments as u32;
        true
    }

    /// Reset the segment counters for the second S-curve half.
    fn setup_second_half(&mut self, index: usize) {
        self.runtime.segment_count = self.runtime.segments as u32;
        self.runtime.elapsed_time = self.runtime.segment_time / 2.0;
        self.pool.get_mut(index).move_state = MoveState::Running2;
    }

    /// Emit one constant-time segment at the current segment velocity.
    ///
    /// The computed position scales the unit vector into per-axis
    /// contributions; the buffer target carries the working position.
    fn run_feed_segment(&mut self, index: usize) -> RunOutcome {
        let unit = self.pool.get(index).unit_vec;
        let mut target = [0.0; AXES];
        let mut travel = [0.0; AXES];
        for i in 0..AXES {
            target[i] = self.runtime.position[i]
                + unit[i] * self.runtime.segment_velocity * self.runtime.segment_time;
            travel[i] = target[i] - self.runtime.position[i];
        }
        let microseconds = self.runtime.microseconds as u32;
        let steps = self.kinematics.inverse(&travel, microseconds);
        self.motor_queue.queue_line(steps, microseconds);
        self.pool.get_mut(index).target = target;
        self.runtime.elapsed_time += self.runtime.segment_time;
        self.runtime.position = target;
        self.runtime.segment_count -= 1;
        if self.runtime.segment_count > 0 {
            RunOutcome::Again
        } else {
            RunOutcome::Done
        }
    }
}
