//! Machine configuration - root configuration structure.

use serde::Deserialize;

use crate::interface::PathMode;

use super::planner::PlannerConfig;

/// Root configuration structure from TOML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MachineConfig {
    /// Planner tuning.
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Path control behaviour at move joins.
    #[serde(default)]
    pub path: PathConfig,
}

/// Path control section.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PathConfig {
    /// Initial path control mode.
    #[serde(default)]
    pub mode: PathMode,
}
