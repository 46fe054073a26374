//! Motion buffer ring.
//!
//! A fixed-capacity ring of [`MotionBuffer`] slots with three cursors:
//! `w` (next slot a submitter may claim), `q` (next slot to commit to the
//! queue) and `r` (oldest committed slot, owned by the runtime). Cursors
//! only move forward: `w` at reserve, `q` at commit, `r` at finalize.
//! Backwards walks for replanning use modular previous/next indices, which
//! survive slot clearing.
//!
//! A typical submit sequence is:
//! 1. check `have_free(n)` for a multi-buffer move
//! 2. read `prev_implicit()` to inspect the most recent committed tail
//! 3. `reserve()` buffers as they are needed
//! 4. `release()` a reservation if validation rejects the move
//! 5. `commit()` each buffer, one call per buffer
//!
//! and the runtime side:
//! 6. `run_head()` promotes the oldest queued buffer and returns it, and
//!    keeps returning the same slot until it is finalized
//! 7. `finalize_run()` empties the slot and pends the next one

use crate::{AXES, EPSILON, MIN_LINE_LENGTH};

/// Lifecycle state of one buffer slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferState {
    /// Slot is available for use.
    #[default]
    Empty,
    /// Slot is checked out by a submitter and being written.
    Loading,
    /// Slot is committed and waiting to run.
    Queued,
    /// Slot is marked as the next buffer to run.
    Pending,
    /// Slot is the current running buffer.
    Running,
}

/// What a buffer asks the runtime to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveType {
    /// Placeholder region with no motion.
    #[default]
    Null,
    /// Jerk-controlled acceleration region (feed head).
    Accel,
    /// Constant-velocity region (feed body).
    Cruise,
    /// Jerk-controlled deceleration region (feed tail).
    Decel,
    /// Simple constant-rate line.
    Line,
    /// Arc feed, approximated by chords.
    Arc,
    /// Timed pause with no motion.
    Dwell,
    /// Restart motors.
    Start,
    /// Stop motors.
    Stop,
    /// Stop motors and end program.
    End,
}

/// Runtime sub-phase of a running buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MoveState {
    /// First call into the run routine.
    #[default]
    New,
    /// First half of the move or sub-move.
    Running1,
    /// Second half of the move or sub-move.
    Running2,
    /// Emit the final position-correcting segment.
    Finalize,
    /// Force the move to end (kill).
    End,
}

/// Arc geometry carried by arc buffers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ArcVars {
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

/// One move or sub-move in the planning queue.
///
/// A jerk-limited feed occupies three consecutive buffers (head, body,
/// tail); everything else occupies one.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionBuffer {
    /// Queueing lifecycle state.
    pub state: BufferState,
    /// Dispatch target for the runtime.
    pub move_type: MoveType,
    /// Runtime sub-phase.
    pub move_state: MoveState,
    /// True while the backplanner may still rewrite this buffer.
    pub replannable: bool,

    /// Absolute end position of this sub-move, in mm.
    pub target: [f64; AXES],
    /// Direction of travel (unit length).
    pub unit_vec: [f64; AXES],
    /// Arc geometry (arc buffers only).
    pub arc: ArcVars,

    /// Line/helix length in mm.
    pub length: f64,
    /// Line/helix time in minutes (dwell time in seconds).
    pub time: f64,
    /// Actual starting velocity of the region, mm/min.
    pub start_velocity: f64,
    /// Actual ending velocity of the region, mm/min.
    pub end_velocity: f64,
    /// Requested initial, target, or final velocity for head, body, or
    /// tail respectively, mm/min.
    pub request_velocity: f64,
}

impl MotionBuffer {
    /// Reset every field to its default.
    fn clear(&mut self) {
        *self = Self::default();
    }

    /// Region type implied by the buffer's length and endpoint velocities.
    pub fn classify(&self) -> MoveType {
        if self.length < MIN_LINE_LENGTH {
            MoveType::Null
        } else if libm::fabs(self.start_velocity - self.end_velocity) < EPSILON {
            MoveType::Cruise
        } else if self.start_velocity < self.end_velocity {
            MoveType::Accel
        } else {
            MoveType::Decel
        }
    }
}

/// Fixed-capacity ring of motion buffers.
#[derive(Debug)]
pub struct BufferPool<const N: usize> {
    buffers: [MotionBuffer; N],
    w: usize,
    q: usize,
    r: usize,
}

impl<const N: usize> Default for BufferPool<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> BufferPool<N> {
    /// Create a pool with every slot empty.
    pub fn new() -> Self {
        Self {
            buffers: [MotionBuffer::default(); N],
            w: 0,
            q: 0,
            r: 0,
        }
    }

    /// Index of the slot after `index`, wrapping.
    #[inline]
    pub fn next_index(&self, index: usize) -> usize {
        (index + 1) % N
    }

    /// Index of the slot before `index`, wrapping.
    #[inline]
    pub fn prev_index(&self, index: usize) -> usize {
        (index + N - 1) % N
    }

    /// Read access to a slot.
    #[inline]
    pub fn get(&self, index: usize) -> &MotionBuffer {
        &self.buffers[index]
    }

    /// Write access to a slot.
    #[inline]
    pub fn get_mut(&mut self, index: usize) -> &mut MotionBuffer {
        &mut self.buffers[index]
    }

    /// Index of the slot just before the write head: the most recently
    /// committed tail, used for cornering against the next move. This
    /// slot must not be committed or finalized through this handle.
    #[inline]
    pub fn prev_implicit(&self) -> usize {
        self.prev_index(self.w)
    }

    /// True if the `count` slots starting at the write head are all empty.
    pub fn have_free(&self, count: usize) -> bool {
        let mut index = self.w;
        for _ in 0..count {
            if self.buffers[index].state != BufferState::Empty {
                return false;
            }
            index = self.next_index(index);
        }
        true
    }

    /// Claim the slot at the write head for loading.
    ///
    /// Returns `None` if the slot is not empty. Multiple reservations may
    /// be outstanding at once; commits apply in reservation order.
    pub fn reserve(&mut self) -> Option<usize> {
        let w = self.w;
        if self.buffers[w].state != BufferState::Empty {
            return None;
        }
        self.buffers[w].clear();
        self.buffers[w].state = BufferState::Loading;
        self.w = self.next_index(w);
        Some(w)
    }

    /// Undo the most recent [`reserve`](Self::reserve).
    ///
    /// Only valid immediately after a reservation that will not be
    /// committed.
    pub fn release(&mut self) {
        self.w = self.prev_index(self.w);
        self.buffers[self.w].state = BufferState::Empty;
    }

    /// Commit the next reserved slot to the queue as `move_type`.
    ///
    /// Committed buffers run in the order they were reserved.
    pub fn commit(&mut self, move_type: MoveType) {
        let q = self.q;
        self.buffers[q].move_type = move_type;
        self.buffers[q].move_state = MoveState::New;
        self.buffers[q].state = BufferState::Queued;
        self.q = self.next_index(q);
    }

    /// Get the current run buffer, promoting a fresh queued/pending slot
    /// to running. Returns the same slot until it is finalized, which is
    /// what lets run routines iterate. `None` means nothing is queued.
    pub fn run_head(&mut self) -> Option<usize> {
        let r = self.r;
        match self.buffers[r].state {
            BufferState::Queued | BufferState::Pending => {
                self.buffers[r].state = BufferState::Running;
                Some(r)
            }
            BufferState::Running => Some(r),
            _ => None,
        }
    }

    /// Release the run buffer back to the pool and pend the next one.
    pub fn finalize_run(&mut self) {
        let r = self.r;
        self.buffers[r].clear();
        self.r = self.next_index(r);
        if self.buffers[self.r].state == BufferState::Queued {
            self.buffers[self.r].state = BufferState::Pending;
        }
    }

    /// Number of committed slots not yet finalized.
    pub fn committed_count(&self) -> usize {
        self.buffers
            .iter()
            .filter(|b| {
                matches!(
                    b.state,
                    BufferState::Queued | BufferState::Pending | BufferState::Running
                )
            })
            .count()
    }

    /// Capacity of the pool.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Iterate over every slot in ring order.
    pub fn iter(&self) -> impl Iterator<Item = &MotionBuffer> {
        self.buffers.iter()
    }
}
