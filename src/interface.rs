//! Downstream interface traits.
//!
//! The planner never touches hardware. It emits constant-time step
//! segments into a [`MotorQueue`], converts Cartesian travel to motor
//! steps through [`Kinematics`], and reaches the stepper driver only
//! through [`StepperControl`]. Implementations of these traits are the
//! seam to the rest of a controller.

use serde::Deserialize;

use crate::{AXES, MOTORS};

/// Downstream queue of constant-time step segments.
///
/// The queue is the planner's only backpressure boundary: every run
/// routine checks [`ready`](Self::ready) before emitting and yields with
/// [`Step::Again`] when the queue is full.
pub trait MotorQueue {
    /// True when the queue can accept another entry.
    fn ready(&self) -> bool;

    /// Queue one constant-time line segment of per-motor steps.
    fn queue_line(&mut self, steps: [f64; MOTORS], microseconds: u32);

    /// Queue a dwell (timed pause, no motion).
    fn queue_dwell(&mut self, microseconds: u32);

    /// Queue a program stop/start/end marker.
    fn queue_stops(&mut self, command: StopCommand);
}

/// Inverse kinematics: Cartesian travel to per-motor step counts.
pub trait Kinematics {
    /// Convert an axis-space delta (mm) covered in `microseconds` into
    /// per-motor step counts.
    fn inverse(&self, travel: &[f64; AXES], microseconds: u32) -> [f64; MOTORS];
}

/// Asynchronous stepper driver control.
///
/// These calls bypass the buffer pool entirely, so they stay safe to
/// invoke from interrupt context in a firmware integration.
pub trait StepperControl {
    /// (Re)start step generation.
    fn start(&mut self);

    /// Stop step generation immediately.
    fn stop(&mut self);

    /// True while the driver still has queued or in-flight steps.
    fn is_busy(&self) -> bool;
}

/// Program flow marker passed through the motor queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopCommand {
    /// Restart motors.
    Start,
    /// Stop motors once queued segments drain.
    Stop,
    /// Stop motors and end the program.
    End,
}

/// Path control mode at move joins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PathMode {
    /// Maximise velocity through joins.
    #[default]
    Continuous,
    /// Decelerate to a safe cornering velocity at joins.
    ExactPath,
    /// Come to a full stop at every join.
    ExactStop,
}

/// Outcome of one dispatcher step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// No buffer was queued; nothing ran.
    Idle,
    /// The current move made partial progress and wants another call.
    Again,
    /// The current move completed and its buffer was released.
    Done,
}
