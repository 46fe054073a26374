//! Vector and S-curve transition math.
//!
//! The planner treats a jerk-limited velocity transition as a pair of
//! mirrored S-curve halves. Two closed forms cover everything it needs:
//!
//! - distance required to move between two velocities at maximum jerk:
//!   `length = |Vf - Vi| * sqrt(|Vf - Vi| / Jm)`
//! - velocity attainable over a distance starting from `V`:
//!   `Vc = Jm^(1/3) * L^(2/3) + V`
//!
//! The second is the first solved for the upper velocity.

use libm::{acos, cbrt, cos, fabs, sqrt};

use crate::AXES;

/// Precomputed jerk terms shared by the planner and runtime.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JerkTerms {
    /// Maximum linear jerk Jm, in mm/min³.
    pub max: f64,
    /// Jm / 2, used by the segment velocity equations.
    pub div2: f64,
    /// Cube root of Jm, used by the attainable-velocity form.
    pub cbrt: f64,
}

impl JerkTerms {
    /// Precompute terms for a maximum linear jerk in mm/min³.
    pub fn new(max_linear_jerk: f64) -> Self {
        Self {
            max: max_linear_jerk,
            div2: max_linear_jerk / 2.0,
            cbrt: cbrt(max_linear_jerk),
        }
    }

    /// Distance needed for a jerk-limited transition between two velocities.
    pub fn transition_length(&self, vi: f64, vf: f64) -> f64 {
        let delta_v = fabs(vf - vi);
        delta_v * sqrt(delta_v / self.max)
    }

    /// Velocity attainable after `length` mm starting at velocity `v`.
    ///
    /// Inverse of [`transition_length`](Self::transition_length):
    /// solves `length = (Vc - V) * sqrt((Vc - V) / Jm)` for `Vc`.
    pub fn attainable_velocity(&self, v: f64, length: f64) -> f64 {
        // L^(2/3) as cbrt(L²) keeps this exact for the round trip
        self.cbrt * cbrt(length * length) + v
    }
}

/// Euclidean length of the vector between two axis positions.
pub fn axis_vector_length(target: &[f64; AXES], position: &[f64; AXES]) -> f64 {
    let mut length = 0.0;
    for i in 0..AXES {
        let d = target[i] - position[i];
        length += d * d;
    }
    sqrt(length)
}

/// Unit vector pointing from `position` to `target`.
///
/// The caller guarantees the two points are distinct (the planner rejects
/// moves shorter than the minimum line length before getting here).
pub fn unit_vector(target: &[f64; AXES], position: &[f64; AXES]) -> [f64; AXES] {
    let length = axis_vector_length(target, position);
    let mut unit = [0.0; AXES];
    for i in 0..AXES {
        unit[i] = (target[i] - position[i]) / length;
    }
    unit
}

/// Velocity scale factor for the junction of two unit vectors.
///
/// Returns 1 for a straight join and 0 for a 180 degree reversal; values
/// between are the cosine of half the join angle. The factor downgrades
/// the entry velocity of the new move to bound the cornering jerk.
pub fn cornering_factor(prev_unit: &[f64; AXES], unit: &[f64; AXES]) -> f64 {
    let mut cosine = 0.0;
    for i in 0..AXES {
        cosine += prev_unit[i] * unit[i];
    }
    // unit-vector dot products can drift past ±1
    cosine = cosine.clamp(-1.0, 1.0);
    cos(acos(cosine) / 2.0)
}
