//! Backplanning: revising queued moves when a new feed arrives.
//!
//! Every feed is queued with a tail that brakes to zero, so the queue is
//! always safe to drain. When the next feed arrives with a non-zero join
//! velocity, that pre-planned stop is pessimistic. Backplanning walks the
//! queue backwards from the new move, rewriting each predecessor's
//! regions so it exits at the following move's entry velocity, and
//! retires a move from further replanning once it runs at everything it
//! asked for. A braking pass first caps the chain's entry velocity at the
//! highest speed that can still stop within the chain's total length.

use libm::fabs;

use crate::error::{Result, SubmitError};
use crate::interface::{Kinematics, MotorQueue, PathMode, StepperControl};
use crate::{AXES, EPSILON};

use super::plan::MovePlan;
use super::MotionPlanner;

impl<MQ, K, ST, const N: usize> MotionPlanner<MQ, K, ST, N>
where
    MQ: MotorQueue,
    K: Kinematics,
    ST: StepperControl,
{
    /// Commit a solved plan to the queue as head, body and tail buffers.
    ///
    /// Regions shorter than the minimum line length commit as null
    /// buffers so every feed always occupies exactly three slots.
    pub(crate) fn queue_move(&mut self, m: &mut MovePlan) -> Result<()> {
        m.head = self.queue_region(
            m.initial_velocity,
            m.cruise_velocity,
            m.initial_velocity_req,
            m.head_length,
        )?;
        m.body = self.queue_region(
            m.cruise_velocity,
            m.cruise_velocity,
            m.target_velocity,
            m.body_length,
        )?;
        m.tail = self.queue_region(
            m.cruise_velocity,
            m.final_velocity,
            m.target_velocity,
            m.tail_length,
        )?;
        Ok(())
    }

    /// Reserve and commit one region buffer, advancing the planning
    /// position along the move's unit vector.
    fn queue_region(
        &mut self,
        start_velocity: f64,
        end_velocity: f64,
        request_velocity: f64,
        length: f64,
    ) -> Result<usize> {
        let Some(index) = self.pool.reserve() else {
            log::error!("no write buffer for feed region");
            return Err(SubmitError::BufferFull.into());
        };
        let unit_vec = self.master.unit_vec;
        for i in 0..AXES {
            self.master.position[i] += length * unit_vec[i];
        }
        let bf = self.pool.get_mut(index);
        bf.start_velocity = start_velocity;
        bf.end_velocity = end_velocity;
        bf.request_velocity = request_velocity;
        bf.length = length;
        bf.unit_vec = unit_vec;
        bf.target = self.master.position;
        bf.replannable = true;
        let move_type = bf.classify();
        self.pool.commit(move_type);
        Ok(index)
    }

    /// Revise queued predecessors of the just-queued move `m`.
    ///
    /// Walks backwards through contiguous replannable moves. A move stops
    /// being replannable when:
    /// - it is optimized (runs at its requested entry, cruise and exit)
    /// - path control fixed its join velocity (exact stop)
    /// - its body or tail is already executing
    pub(crate) fn backplan(&mut self, m: &MovePlan) {
        // an exact-stop join pins the previous move's exit at zero
        if m.path_mode == PathMode::ExactStop {
            let tail = self.pool.prev_index(m.head);
            let body = self.pool.prev_index(tail);
            let head = self.pool.prev_index(body);
            self.pool.get_mut(head).replannable = false;
            self.pool.get_mut(body).replannable = false;
            self.pool.get_mut(tail).replannable = false;
            return;
        }

        self.set_braking_velocity(m);

        let mut current = *m;
        let mut depth = 0;
        while let Some(mut previous) = self.make_previous_move(&current) {
            previous.compute_regions(
                previous.initial_velocity_req,
                previous.target_velocity,
                current.initial_velocity,
                &self.jerk,
            );
            self.update_move(&previous, &current);
            current = previous;
            depth += 1;
            if depth > self.max_lookback {
                // leave the rest replannable for a later attempt
                log::warn!("backplan depth exceeded at length {}", current.length);
                break;
            }
        }
    }

    /// Cap the chain's entry velocity so a full brake still fits.
    ///
    /// Accumulates the total length of the contiguous replannable chain
    /// ending at `m`, then lowers the chain head's requested entry
    /// velocity to at most the speed a jerk-limited stop can shed over
    /// that length.
    fn set_braking_velocity(&mut self, m: &MovePlan) {
        let mut head = m.head;
        let mut chain_length = m.length;
        let mut depth = 0;
        loop {
            let tail = self.pool.prev_index(head);
            if !self.pool.get(tail).replannable {
                break;
            }
            let body = self.pool.prev_index(tail);
            let prev_head = self.pool.prev_index(body);
            chain_length += self.pool.get(prev_head).length
                + self.pool.get(body).length
                + self.pool.get(tail).length;
            head = prev_head;
            depth += 1;
            if depth > self.max_lookback {
                log::warn!("braking walk depth exceeded at length {}", chain_length);
                break;
            }
        }
        if head != m.head {
            let braking_velocity = self.jerk.attainable_velocity(0.0, chain_length);
            let bf = self.pool.get_mut(head);
            bf.request_velocity = bf.request_velocity.min(braking_velocity);
        }
    }

    /// Reconstruct the planning view of the move before `m` from its
    /// three region buffers.
    ///
    /// Returns `None` once the walk reaches a move whose body or tail is
    /// no longer replannable; a running head is acceptable.
    fn make_previous_move(&self, m: &MovePlan) -> Option<MovePlan> {
        let tail = self.pool.prev_index(m.head);
        let body = self.pool.prev_index(tail);
        let head = self.pool.prev_index(body);

        if !self.pool.get(tail).replannable || !self.pool.get(body).replannable {
            return None;
        }

        let head_buffer = self.pool.get(head);
        let body_buffer = self.pool.get(body);
        let tail_buffer = self.pool.get(tail);
        Some(MovePlan {
            path_mode: PathMode::Continuous,
            head,
            body,
            tail,
            initial_velocity_req: head_buffer.request_velocity,
            initial_velocity: head_buffer.start_velocity,
            target_velocity: body_buffer.request_velocity,
            cruise_velocity: body_buffer.start_velocity,
            final_velocity: tail_buffer.end_velocity,
            head_length: head_buffer.length,
            body_length: body_buffer.length,
            tail_length: tail_buffer.length,
            length: head_buffer.length + body_buffer.length + tail_buffer.length,
        })
    }

    /// Write a recomputed plan back into its region buffers.
    ///
    /// `previous` is the move being rewritten; `m` is the move after it
    /// (not modified). Marks the move non-replannable once it achieves
    /// its requested entry, cruise, and downstream-join velocities.
    fn update_move(&mut self, previous: &MovePlan, m: &MovePlan) {
        {
            let bf = self.pool.get_mut(previous.head);
            bf.start_velocity = previous.initial_velocity;
            bf.end_velocity = previous.cruise_velocity;
            bf.request_velocity = previous.initial_velocity_req;
            bf.length = previous.head_length;
            bf.move_type = bf.classify();
        }
        {
            let bf = self.pool.get_mut(previous.body);
            bf.start_velocity = previous.cruise_velocity;
            bf.end_velocity = previous.cruise_velocity;
            bf.request_velocity = previous.target_velocity;
            bf.length = previous.body_length;
            bf.move_type = bf.classify();
        }
        {
            let bf = self.pool.get_mut(previous.tail);
            bf.start_velocity = previous.cruise_velocity;
            bf.end_velocity = previous.final_velocity;
            bf.request_velocity = previous.final_velocity;
            bf.length = previous.tail_length;
            bf.move_type = bf.classify();
        }

        let optimal = fabs(self.pool.get(previous.head).start_velocity
            - previous.initial_velocity_req)
            < EPSILON
            && fabs(self.pool.get(previous.body).start_velocity - previous.target_velocity)
                < EPSILON
            && fabs(self.pool.get(previous.tail).end_velocity - m.initial_velocity_req) < EPSILON;
        if optimal {
            self.pool.get_mut(previous.head).replannable = false;
            self.pool.get_mut(previous.body).replannable = false;
            self.pool.get_mut(previous.tail).replannable = false;
        }
    }
}
