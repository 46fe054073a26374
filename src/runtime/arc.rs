//! Arc feed execution.
//!
//! Arcs are approximated by queueing short constant-time line chords.
//! First dispatch fixes the chord count from the configured minimum
//! segment length and locates the circle centre from the entry position
//! and start angle; every later dispatch advances the angle by one chord
//! and emits the resulting line, yielding between chords.

use libm::{ceil, cos, sin};

use super::{minutes_to_us, RunOutcome};
use crate::buffer::MoveState;
use crate::interface::{Kinematics, MotorQueue, StepperControl};
use crate::planner::MotionPlanner;
use crate::AXES;

impl<MQ, K, ST, const N: usize> MotionPlanner<MQ, K, ST, N>
where
    MQ: MotorQueue,
    K: Kinematics,
    ST: StepperControl,
{
    /// Run an arc region, one chord per call.
    pub(crate) fn run_arc(&mut self, index: usize) -> RunOutcome {
        if !self.motor_queue.ready() {
            return RunOutcome::Again;
        }
        // initialize arc variables
        if self.pool.get(index).move_state == MoveState::New {
            let bf = *self.pool.get(index);
            self.runtime.segments = ceil(bf.length / self.min_segment_len);
            self.runtime.segment_count = self.runtime.segments as u32;
            self.runtime.segment_theta = bf.arc.angular_travel / self.runtime.segments;
            self.runtime.segment_length = bf.arc.linear_travel / self.runtime.segments;
            self.runtime.microseconds = minutes_to_us(bf.time / self.runtime.segments);
            self.runtime.center_1 =
                self.runtime.position[bf.arc.axis_1] - sin(bf.arc.theta) * bf.arc.radius;
            self.runtime.center_2 =
                self.runtime.position[bf.arc.axis_2] - cos(bf.arc.theta) * bf.arc.radius;
            // axes outside the arc plane hold their entry position
            self.runtime.target = self.runtime.position;
            self.pool.get_mut(index).move_state = MoveState::Running1;
        }
        // compute one chord and exit
        if self.pool.get(index).move_state == MoveState::Running1 {
            let (axis_1, axis_2, axis_linear, radius) = {
                let arc = &mut self.pool.get_mut(index).arc;
                arc.theta += self.runtime.segment_theta;
                (arc.axis_1, arc.axis_2, arc.axis_linear, arc.radius)
            };
            let theta = self.pool.get(index).arc.theta;
            self.runtime.target[axis_1] = self.runtime.center_1 + sin(theta) * radius;
            self.runtime.target[axis_2] = self.runtime.center_2 + cos(theta) * radius;
            self.runtime.target[axis_linear] += self.runtime.segment_length;

            let mut travel = [0.0; AXES];
            for i in 0..AXES {
                travel[i] = self.runtime.target[i] - self.runtime.position[i];
            }
            let microseconds = self.runtime.microseconds as u32;
            let steps = self.kinematics.inverse(&travel, microseconds);
            self.motor_queue.queue_line(steps, microseconds);
            self.runtime.position = self.runtime.target;
            self.runtime.segment_count -= 1;
            if self.runtime.segment_count > 0 {
                return RunOutcome::Again;
            }
        }
        RunOutcome::Done
    }
}
