//! # cartesian-motion
//!
//! Jerk-limited Cartesian motion planning for CNC and robotic controllers.
//!
//! ## Features
//!
//! - **Jerk-limited profiles**: straight feeds are planned as S-curve
//!   head/body/tail regions that honour a maximum linear jerk
//! - **Backplanning**: queued moves are revised backwards so chains of
//!   short moves reach the highest cruise velocities that still brake to
//!   a stop at the end of the chain
//! - **Fixed-capacity queue**: a bounded ring of motion buffers, no heap
//!   allocation at runtime
//! - **Cooperative runtime**: non-blocking continuations emit constant-time
//!   step segments to a downstream motor queue
//! - **Configuration-driven**: planner tuning loads from TOML files
//! - **no_std compatible**: the planning core works without the standard
//!   library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use cartesian_motion::{MotionPlanner, MachineConfig, Step};
//!
//! // Load tuning from TOML
//! let config: MachineConfig = cartesian_motion::load_config("machine.toml")?;
//!
//! // One planner per physical machine, generic over the downstream seams
//! let mut planner = MotionPlanner::<_, _, _>::new(&config, queue, kinematics, stepper);
//!
//! // Queue a jerk-limited feed: 10 mm in X over 0.1 min
//! planner.feed([10.0, 0.0, 0.0, 0.0], 0.1)?;
//!
//! // Drive the runtime from the main loop
//! while planner.step() != Step::Idle {}
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): enables TOML file loading

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod buffer;
pub mod config;
pub mod error;
pub mod geometry;
pub mod interface;
pub mod planner;
pub mod runtime;

#[cfg(test)]
pub(crate) mod testutil;

// Re-exports for ergonomic API
pub use buffer::{BufferPool, BufferState, MotionBuffer, MoveState, MoveType};
pub use config::{validate_config, MachineConfig, PlannerConfig};
pub use error::{Error, Result};
pub use geometry::JerkTerms;
pub use interface::{Kinematics, MotorQueue, PathMode, Step, StepperControl, StopCommand};
pub use planner::{ArcParams, MotionPlanner};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::load_config;

// Unit types
pub use config::units::{Minutes, Mm, MmPerMin, MmPerMin3};

/// Number of Cartesian axes (X, Y, Z, A).
pub const AXES: usize = 4;

/// Number of motors driven by the downstream queue.
pub const MOTORS: usize = 4;

/// X axis index.
pub const X: usize = 0;
/// Y axis index.
pub const Y: usize = 1;
/// Z axis index.
pub const Z: usize = 2;
/// A (rotary) axis index.
pub const A: usize = 3;

/// Comparison tolerance for velocities (mm/min) and lengths (mm).
pub const EPSILON: f64 = 1e-4;

/// Shortest line the planner will accept or emit, in mm.
pub const MIN_LINE_LENGTH: f64 = 0.03;

/// Microseconds per minute, for segment timing conversions.
pub const ONE_MINUTE_OF_MICROSECONDS: f64 = 60_000_000.0;
