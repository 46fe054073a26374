//! Move submission and trajectory planning.
//!
//! [`MotionPlanner`] is the single owning context for one physical
//! machine: it holds the buffer ring, the planning-side and runtime-side
//! position state, and the downstream queue/kinematics/stepper
//! implementations. Submission methods validate a move, reserve and
//! commit buffers, and (for jerk-limited feeds) revise earlier queued
//! moves; the cooperative runtime in [`crate::runtime`] consumes the
//! queue from the same thread.

mod backplan;
mod plan;

pub(crate) use plan::MovePlan;

use libm::hypot;

use crate::buffer::{BufferPool, BufferState, MotionBuffer, MoveState, MoveType};
use crate::config::MachineConfig;
use crate::error::{Result, SubmitError};
use crate::geometry::{axis_vector_length, cornering_factor, unit_vector, JerkTerms};
use crate::interface::{Kinematics, MotorQueue, PathMode, StepperControl};
use crate::runtime::RuntimeState;
use crate::{AXES, EPSILON, MIN_LINE_LENGTH};

/// Default buffer ring capacity.
pub const DEFAULT_BUFFER_COUNT: usize = 32;

/// Buffers one jerk-limited feed needs: head, body, tail.
const FEED_BUFFERS: usize = 3;

/// Planning-side position state.
///
/// `position` advances as moves are *planned*, not as the tool moves;
/// the runtime keeps its own position for the emitted segment stream.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct PlannerState {
    /// End position of the last planned move, in mm.
    pub position: [f64; AXES],
    /// Scratch target for the move being planned.
    pub target: [f64; AXES],
    /// Direction of the move being planned; the next feed reads the
    /// previous buffer's copy for its cornering angle.
    pub unit_vec: [f64; AXES],
}

/// Arc geometry arguments for [`MotionPlanner::arc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArcParams {
    /// Starting angle in radians.
    pub theta: f64,
    /// Circle radius in mm.
    pub radius: f64,
    /// Angular travel along the arc in radians (+CW, -CCW).
    pub angular_travel: f64,
    /// Travel along the linear axis for helical motion, in mm.
    pub linear_travel: f64,
    /// First axis of the circle plane.
    pub axis_1: usize,
    /// Second axis of the circle plane.
    pub axis_2: usize,
    /// Transverse axis for helical motion.
    pub axis_linear: usize,
}

/// Motion planning and execution context for one machine.
///
/// Generic over the downstream seams:
/// - `MQ`: the motor segment queue (backpressure boundary)
/// - `K`: inverse kinematics
/// - `ST`: asynchronous stepper control
/// - `N`: buffer ring capacity
///
/// The planner is single-threaded and cooperative: submissions and
/// [`step`](crate::runtime) calls interleave in the caller's main loop.
pub struct MotionPlanner<MQ, K, ST, const N: usize = DEFAULT_BUFFER_COUNT>
where
    MQ: MotorQueue,
    K: Kinematics,
    ST: StepperControl,
{
    pub(crate) pool: BufferPool<N>,
    pub(crate) master: PlannerState,
    pub(crate) runtime: RuntimeState,

    pub(crate) jerk: JerkTerms,
    pub(crate) min_segment_len: f64,
    pub(crate) min_segment_time_us: f64,
    pub(crate) max_lookback: usize,
    path_mode: PathMode,

    pub(crate) motor_queue: MQ,
    pub(crate) kinematics: K,
    stepper: ST,
}

impl<MQ, K, ST, const N: usize> MotionPlanner<MQ, K, ST, N>
where
    MQ: MotorQueue,
    K: Kinematics,
    ST: StepperControl,
{
    /// Create a planner from validated configuration and the downstream
    /// implementations.
    pub fn new(config: &MachineConfig, motor_queue: MQ, kinematics: K, stepper: ST) -> Self {
        Self {
            pool: BufferPool::new(),
            master: PlannerState::default(),
            runtime: RuntimeState::default(),
            jerk: JerkTerms::new(config.planner.max_linear_jerk.value()),
            min_segment_len: config.planner.min_segment_len.value(),
            min_segment_time_us: config.planner.min_segment_time_us,
            max_lookback: config.planner.max_lookback,
            path_mode: config.path.mode,
            motor_queue,
            kinematics,
            stepper,
        }
    }

    /// Current planning position (end of the last planned move).
    #[inline]
    pub fn position(&self) -> [f64; AXES] {
        self.master.position
    }

    /// Current runtime position (end of the last emitted segment).
    #[inline]
    pub fn runtime_position(&self) -> [f64; AXES] {
        self.runtime.position
    }

    /// Read access to the buffer ring.
    #[inline]
    pub fn pool(&self) -> &BufferPool<N> {
        &self.pool
    }

    /// The path control mode applied to new feeds.
    #[inline]
    pub fn path_control(&self) -> PathMode {
        self.path_mode
    }

    /// Set the path control mode applied to new feeds.
    pub fn set_path_control(&mut self, mode: PathMode) {
        self.path_mode = mode;
    }

    /// Read access to the downstream motor queue.
    #[inline]
    pub fn motor_queue(&self) -> &MQ {
        &self.motor_queue
    }

    /// Write access to the downstream motor queue.
    #[inline]
    pub fn motor_queue_mut(&mut self) -> &mut MQ {
        &mut self.motor_queue
    }

    /// Read access to the stepper control.
    #[inline]
    pub fn stepper(&self) -> &ST {
        &self.stepper
    }

    /// Write access to the stepper control.
    #[inline]
    pub fn stepper_mut(&mut self) -> &mut ST {
        &mut self.stepper
    }

    /// Overwrite the planning and runtime positions (coordinate offsets,
    /// homing). Only meaningful while nothing is queued.
    pub fn set_position(&mut self, position: [f64; AXES]) {
        self.master.position = position;
        self.runtime.position = position;
    }

    /// True while motion control is busy (segments queued downstream or a
    /// move mid-execution). Poll until false to sync with the queue.
    pub fn is_busy(&self) -> bool {
        self.stepper.is_busy() || self.runtime.run_flag
    }

    /// Force the running move to end; the dispatcher finalizes it on the
    /// next step.
    pub fn kill_move(&mut self) {
        if let Some(r) = self.pool.run_head() {
            self.pool.get_mut(r).move_state = MoveState::End;
            self.runtime.run_flag = false;
        }
    }

    /// Stop motion immediately. Safe from interrupt context; touches only
    /// the stepper driver, never the buffer pool.
    pub fn async_stop(&mut self) {
        self.stepper.stop();
    }

    /// (Re)start motion immediately. Safe from interrupt context.
    pub fn async_start(&mut self) {
        self.stepper.start();
    }

    /// Stop motion and end the program immediately. Safe from interrupt
    /// context; the caller re-initializes machine state afterwards.
    pub fn async_end(&mut self) {
        self.stepper.stop();
    }

    /// Queue a constant-rate straight line to `target` (absolute mm)
    /// taking `minutes`. No acceleration management; feeds that need it
    /// go through [`feed`](Self::feed).
    pub fn line(&mut self, target: [f64; AXES], minutes: f64) -> Result<()> {
        if minutes < EPSILON {
            return Err(SubmitError::ZeroLengthMove.into());
        }
        let Some(index) = self.pool.reserve() else {
            log::error!("no write buffer for line");
            return Err(SubmitError::BufferFull.into());
        };

        let length = axis_vector_length(&target, &self.runtime.position);
        if length < MIN_LINE_LENGTH {
            self.pool.release();
            return Err(SubmitError::ZeroLengthMove.into());
        }

        let bf = self.pool.get_mut(index);
        bf.time = minutes;
        bf.target = target;
        bf.length = length;
        bf.request_velocity = length / minutes;
        self.pool.commit(MoveType::Line);
        self.master.position = target;
        Ok(())
    }

    /// Queue an arc (or helix) feed ending at `target`.
    ///
    /// The runtime approximates the arc with constant-time chords no
    /// shorter than the configured minimum segment length. Arcs plan at a
    /// fixed velocity and are never revised by the backplanner.
    pub fn arc(&mut self, target: [f64; AXES], params: ArcParams, minutes: f64) -> Result<()> {
        if minutes < EPSILON {
            return Err(SubmitError::ZeroLengthMove.into());
        }
        let Some(index) = self.pool.reserve() else {
            log::error!("no write buffer for arc");
            return Err(SubmitError::BufferFull.into());
        };

        // total travel of the helix (or plain arc)
        let length = hypot(
            params.angular_travel * params.radius,
            libm::fabs(params.linear_travel),
        );
        if length < self.min_segment_len {
            self.pool.release();
            return Err(SubmitError::ZeroLengthMove.into());
        }

        let bf = self.pool.get_mut(index);
        bf.target = target;
        bf.time = minutes;
        bf.length = length;
        bf.arc.theta = params.theta;
        bf.arc.radius = params.radius;
        bf.arc.angular_travel = params.angular_travel;
        bf.arc.linear_travel = params.linear_travel;
        bf.arc.axis_1 = params.axis_1;
        bf.arc.axis_2 = params.axis_2;
        bf.arc.axis_linear = params.axis_linear;
        bf.start_velocity = length / minutes;
        bf.end_velocity = bf.start_velocity;

        self.pool.commit(MoveType::Arc);
        self.master.position = target;
        Ok(())
    }

    /// Queue a dwell: a timed pause with no motion.
    pub fn dwell(&mut self, seconds: f64) -> Result<()> {
        let Some(index) = self.pool.reserve() else {
            log::error!("no write buffer for dwell");
            return Err(SubmitError::BufferFull.into());
        };
        self.pool.get_mut(index).time = seconds;
        self.pool.commit(MoveType::Dwell);
        Ok(())
    }

    /// Queue a motor stop marker.
    pub fn queue_stop(&mut self) -> Result<()> {
        self.queue_marker(MoveType::Stop)
    }

    /// Queue a motor start marker.
    pub fn queue_start(&mut self) -> Result<()> {
        self.queue_marker(MoveType::Start)
    }

    /// Queue a program end marker. The planner only emits the marker;
    /// resetting canonical machine modes belongs to whoever interprets it.
    pub fn queue_end(&mut self) -> Result<()> {
        self.queue_marker(MoveType::End)
    }

    fn queue_marker(&mut self, move_type: MoveType) -> Result<()> {
        if self.pool.reserve().is_none() {
            log::error!("no write buffer for marker {:?}", move_type);
            return Err(SubmitError::BufferFull.into());
        }
        self.pool.commit(move_type);
        Ok(())
    }

    /// Queue a straight feed to `target` (absolute mm) taking `minutes`,
    /// planned with jerk-limited acceleration.
    ///
    /// The feed occupies three region buffers (head, body, tail). The
    /// tail always pre-plans a full stop, so the chain is safe if no
    /// further move arrives; when one does, the backplanner revises the
    /// queued predecessors to carry velocity through the join instead.
    pub fn feed(&mut self, target: [f64; AXES], minutes: f64) -> Result<()> {
        if minutes < EPSILON {
            return Err(SubmitError::ZeroLengthMove.into());
        }
        if !self.pool.have_free(FEED_BUFFERS) {
            log::error!("buffer pool cannot hold a feed");
            return Err(SubmitError::BufferFull.into());
        }

        let mut m = MovePlan::default();
        self.master.target = target;
        m.length = axis_vector_length(&self.master.target, &self.master.position);
        if m.length < MIN_LINE_LENGTH {
            return Err(SubmitError::ZeroLengthMove.into());
        }
        m.target_velocity = m.length / minutes;
        self.master.unit_vec = unit_vector(&self.master.target, &self.master.position);

        let prev = self.pool.prev_implicit();
        let prev_buffer = *self.pool.get(prev);

        // a queued or running arc fixes the join velocity; arcs are not
        // replanned, so there is nothing to backplan through
        if prev_buffer.move_type == MoveType::Arc && prev_buffer.state != BufferState::Empty {
            m.initial_velocity_req = prev_buffer.end_velocity;
            m.compute_regions(m.initial_velocity_req, m.target_velocity, 0.0, &self.jerk);
            self.queue_move(&mut m)?;
            return Ok(());
        }

        m.path_mode = self.path_mode;
        if prev_buffer.state != BufferState::Queued {
            // nothing joinable behind us: enter from a stop
            m.path_mode = PathMode::ExactStop;
            m.initial_velocity_req = 0.0;
        } else if m.path_mode == PathMode::ExactStop {
            // exact stop fixes every join to zero velocity
            m.initial_velocity_req = 0.0;
        } else {
            let factor = cornering_factor(&prev_buffer.unit_vec, &self.master.unit_vec);
            m.initial_velocity_req =
                (prev_buffer.request_velocity * factor).min(m.target_velocity);
        }

        if m.compute_regions(m.initial_velocity_req, m.target_velocity, 0.0, &self.jerk) == 0 {
            return Ok(());
        }
        self.queue_move(&mut m)?;
        self.backplan(&m);
        Ok(())
    }

    /// Snapshot of a buffer by pool index, for inspection and tests.
    pub fn buffer(&self, index: usize) -> &MotionBuffer {
        self.pool.get(index)
    }
}
