//! Error types for cartesian-motion.
//!
//! Provides unified error handling across configuration and move submission.

use core::fmt;

/// Result type alias using the library's Error type.
pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for all cartesian-motion operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Configuration parsing or validation error
    Config(ConfigError),
    /// Move submission error
    Submit(SubmitError),
}

/// Configuration-related errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid maximum linear jerk (must be > 0)
    InvalidJerk(f64),
    /// Invalid minimum segment length (must be > 0)
    InvalidSegmentLength(f64),
    /// Invalid minimum segment time (must be > 0)
    InvalidSegmentTime(f64),
    /// Invalid backplanning lookback depth (must be > 0)
    InvalidLookback(usize),
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

/// Move submission errors.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// Move is shorter than the minimum line length, or its time is zero
    ZeroLengthMove,
    /// The buffer pool cannot hold the move
    BufferFull,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Config(e) => write!(f, "Configuration error: {}", e),
            Error::Submit(e) => write!(f, "Submit error: {}", e),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidJerk(v) => {
                write!(f, "Invalid max linear jerk: {}. Must be > 0", v)
            }
            ConfigError::InvalidSegmentLength(v) => {
                write!(f, "Invalid min segment length: {}. Must be > 0", v)
            }
            ConfigError::InvalidSegmentTime(v) => {
                write!(f, "Invalid min segment time: {}. Must be > 0", v)
            }
            ConfigError::InvalidLookback(v) => {
                write!(f, "Invalid lookback depth: {}. Must be > 0", v)
            }
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubmitError::ZeroLengthMove => write!(f, "Zero-length or zero-time move"),
            SubmitError::BufferFull => write!(f, "Motion buffer pool is full"),
        }
    }
}

// Conversion impls
impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Error::Config(e)
    }
}

impl From<SubmitError> for Error {
    fn from(e: SubmitError) -> Self {
        Error::Submit(e)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "std")]
impl std::error::Error for SubmitError {}
