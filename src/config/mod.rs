//! Configuration module for cartesian-motion.
//!
//! Provides types for loading and validating planner tuning from TOML
//! files (with `std` feature) or pre-parsed data.

mod machine;
mod planner;
pub mod units;
#[cfg(feature = "std")]
mod loader;
mod validation;

pub use machine::{MachineConfig, PathConfig};
pub use planner::PlannerConfig;
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{Minutes, Mm, MmPerMin, MmPerMin3};
