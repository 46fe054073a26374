//! Unit types for physical quantities.
//!
//! Provides type-safe representations of lengths, velocities, jerk, and
//! durations to prevent unit confusion at configuration boundaries.

use core::ops::{Add, Mul, Sub};

use serde::Deserialize;

/// Length in millimetres.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Mm(pub f64);

impl Mm {
    /// Create a new Mm value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Add for Mm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Mm {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Velocity in millimetres per minute.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MmPerMin(pub f64);

impl MmPerMin {
    /// Create a new MmPerMin value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

impl Mul<f64> for MmPerMin {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

/// Jerk in millimetres per cubed minute.
///
/// The third derivative of position caps how quickly the planner may ramp
/// acceleration at the ends of a move.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct MmPerMin3(pub f64);

impl MmPerMin3 {
    /// Create a new MmPerMin3 value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }
}

/// Duration in minutes.
///
/// Feed rates arrive already converted to move time, so the planner works
/// in minutes throughout and converts to microseconds only at the motor
/// queue boundary.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Deserialize)]
#[serde(transparent)]
pub struct Minutes(pub f64);

impl Minutes {
    /// Create a new Minutes value.
    #[inline]
    pub const fn new(value: f64) -> Self {
        Self(value)
    }

    /// Get the raw value.
    #[inline]
    pub const fn value(self) -> f64 {
        self.0
    }

    /// Convert to microseconds.
    #[inline]
    pub fn to_microseconds(self) -> f64 {
        self.0 * crate::ONE_MINUTE_OF_MICROSECONDS
    }
}

impl Add for Minutes {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
