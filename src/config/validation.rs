//! Configuration validation.

use crate::error::{ConfigError, Error, Result};

use super::MachineConfig;

/// Validate a machine configuration.
///
/// Checks:
/// - Maximum linear jerk is positive
/// - Segment length and segment time floors are positive
/// - Backplanning lookback depth is non-zero
pub fn validate_config(config: &MachineConfig) -> Result<()> {
    let planner = &config.planner;

    if planner.max_linear_jerk.value() <= 0.0 || !planner.max_linear_jerk.value().is_finite() {
        return Err(Error::Config(ConfigError::InvalidJerk(
            planner.max_linear_jerk.value(),
        )));
    }

    if planner.min_segment_len.value() <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidSegmentLength(
            planner.min_segment_len.value(),
        )));
    }

    if planner.min_segment_time_us <= 0.0 {
        return Err(Error::Config(ConfigError::InvalidSegmentTime(
            planner.min_segment_time_us,
        )));
    }

    if planner.max_lookback == 0 {
        return Err(Error::Config(ConfigError::InvalidLookback(
            planner.max_lookback,
        )));
    }

    Ok(())
}
