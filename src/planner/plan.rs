//! Region solving for jerk-limited feeds.
//!
//! A feed is planned as up to three velocity regions: a head that
//! accelerates to the cruise velocity, a body that holds it, and a tail
//! that decelerates to the exit velocity. When the line is too short for
//! all three, the solver reduces the move: head+tail meeting at a lowered
//! cruise velocity, or a single region when even that cannot fit.

use libm::fabs;

use crate::geometry::JerkTerms;
use crate::interface::PathMode;
use crate::{EPSILON, MIN_LINE_LENGTH};

/// Iteration cap for the head/tail split refinement.
const SPLIT_ITERATION_CAP: u32 = 100;

/// Largest body residual tolerated after the split converges, in mm.
const BODY_RESIDUAL_MAX: f64 = 0.01;

/// Scratch planning state for one feed move, or for a queued move being
/// reconstructed by the backplanner.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct MovePlan {
    /// Path control mode in effect for this move.
    pub path_mode: PathMode,

    /// Pool index of the head region buffer.
    pub head: usize,
    /// Pool index of the body region buffer.
    pub body: usize,
    /// Pool index of the tail region buffer.
    pub tail: usize,

    /// Total move length in mm.
    pub length: f64,
    /// Computed head region length in mm.
    pub head_length: f64,
    /// Computed body region length in mm.
    pub body_length: f64,
    /// Computed tail region length in mm.
    pub tail_length: f64,

    /// Requested entry velocity, mm/min.
    pub initial_velocity_req: f64,
    /// Achieved entry velocity, mm/min.
    pub initial_velocity: f64,
    /// Requested cruise velocity, mm/min.
    pub target_velocity: f64,
    /// Achieved cruise velocity, mm/min.
    pub cruise_velocity: f64,
    /// Exit velocity, mm/min. Fixed by the caller; never revised here.
    pub final_velocity: f64,
}

impl MovePlan {
    /// Compute region lengths and achieved velocities for this move.
    ///
    /// Inputs: requested entry velocity `vir`, requested cruise velocity
    /// `vt`, fixed exit velocity `vf`, and `self.length`. Returns the
    /// number of regions (0-3); 0 means the move is uncomputable and
    /// nothing should be queued from it.
    ///
    /// Cases, in the order they are tried:
    /// - head/body/tail all fit at the requested velocities
    /// - single tail: too short to brake from `vir`, entry is lowered
    /// - single head: too short to reach `vf`, exit is lowered
    /// - single body: entry, cruise and exit already equal
    /// - head/tail split: cruise is lowered until both transitions
    ///   exactly consume the line
    pub fn compute_regions(&mut self, vir: f64, vt: f64, vf: f64, jerk: &JerkTerms) -> u8 {
        self.initial_velocity_req = vir;
        self.initial_velocity = vir;
        self.target_velocity = vt;
        self.cruise_velocity = vt;
        self.final_velocity = vf;
        self.head_length = 0.0;
        self.body_length = 0.0;
        self.tail_length = 0.0;

        if self.length < MIN_LINE_LENGTH {
            log::warn!("region solve on short line: {}", self.length);
            return 0;
        }

        // full head/body/tail trial
        self.head_length = jerk.transition_length(vir, vt);
        self.tail_length = jerk.transition_length(vt, vf);
        self.body_length = self.length - self.head_length - self.tail_length;
        if self.body_length > 0.0 {
            // fold sub-minimum heads and tails into the body
            if self.head_length < MIN_LINE_LENGTH {
                self.body_length += self.head_length;
                self.head_length = 0.0;
            }
            if self.tail_length < MIN_LINE_LENGTH {
                self.body_length += self.tail_length;
                self.tail_length = 0.0;
            }
            return 3;
        }

        // single-region cases
        self.body_length = 0.0;
        if vf < vir && self.length < self.tail_length {
            // tail only: entry velocity drops to what still brakes to vf
            self.head_length = 0.0;
            self.tail_length = self.length;
            self.initial_velocity = jerk.attainable_velocity(vf, self.tail_length);
            self.cruise_velocity = self.initial_velocity;
            return 1;
        }
        if vf > vir && self.length < self.head_length {
            // head only: exit velocity drops to what the line can reach
            self.head_length = self.length;
            self.tail_length = 0.0;
            self.cruise_velocity = jerk.attainable_velocity(vir, self.head_length);
            self.final_velocity = self.cruise_velocity;
            return 1;
        }
        if fabs(vf - vir) < EPSILON && fabs(vf - vt) < EPSILON {
            // body only
            self.head_length = 0.0;
            self.tail_length = 0.0;
            self.body_length = self.length;
            return 1;
        }

        // head/tail split: iterate the cruise velocity down until the two
        // transitions consume the whole line
        let mut iterations = 0;
        loop {
            let delta_vh = fabs(self.initial_velocity - self.cruise_velocity);
            self.head_length = self.length
                * (delta_vh / (delta_vh + fabs(self.cruise_velocity - self.final_velocity)));
            self.cruise_velocity =
                jerk.attainable_velocity(self.initial_velocity, self.head_length);
            self.head_length =
                jerk.transition_length(self.cruise_velocity, self.initial_velocity);
            self.tail_length = jerk.transition_length(self.cruise_velocity, self.final_velocity);
            let previous_body = self.body_length;
            self.body_length = self.length - self.head_length - self.tail_length;
            iterations += 1;
            if iterations > SPLIT_ITERATION_CAP {
                log::warn!("head/tail split did not converge: {}", self.body_length);
                break;
            }
            if fabs(previous_body - self.body_length) <= EPSILON {
                break;
            }
        }

        if !self.head_length.is_finite() || !self.tail_length.is_finite() {
            log::error!("non-finite region lengths for line {}", self.length);
            return 0;
        }
        if self.body_length > BODY_RESIDUAL_MAX {
            log::warn!("head/tail split residual: {}", self.body_length);
        }
        self.body_length = 0.0;
        if self.head_length < EPSILON {
            self.head_length = 0.0;
        }
        if self.tail_length < EPSILON {
            self.tail_length = 0.0;
        }
        2
    }
}
