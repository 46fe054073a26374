//! Planner tuning configuration from TOML.

use serde::Deserialize;

use super::units::{Mm, MmPerMin3};

/// Planner tuning parameters from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    /// Maximum linear jerk in mm/min³.
    #[serde(rename = "max_linear_jerk_mm_per_min3")]
    pub max_linear_jerk: MmPerMin3,

    /// Shortest chord used when approximating arcs, in mm.
    #[serde(default = "default_min_segment_len", rename = "min_segment_len_mm")]
    pub min_segment_len: Mm,

    /// Target duration of one emitted acceleration segment, in microseconds.
    #[serde(default = "default_min_segment_time")]
    pub min_segment_time_us: f64,

    /// Maximum number of moves the backplanner walks in one pass.
    #[serde(default = "default_max_lookback")]
    pub max_lookback: usize,
}

fn default_min_segment_len() -> Mm {
    Mm(0.1)
}

fn default_min_segment_time() -> f64 {
    10_000.0 // ~10 ms segments
}

fn default_max_lookback() -> usize {
    8
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_linear_jerk: MmPerMin3(50_000_000.0),
            min_segment_len: default_min_segment_len(),
            min_segment_time_us: default_min_segment_time(),
            max_lookback: default_max_lookback(),
        }
    }
}
