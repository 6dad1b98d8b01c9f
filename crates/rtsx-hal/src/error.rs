//! Driver error types.

use core::fmt;

/// Errors that can occur during card-reader operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverError {
    /// The host command buffer is full; start a new session or retry.
    Busy,
    /// The hardware did not complete the operation within its budget.
    Timeout,
    /// The hardware completed but signaled failure, or a register write
    /// was not applied (echo mismatch).
    DeviceError,
    /// Invalid caller input (oversized buffer request, bad segment list).
    BadArgument,
    /// Requested clock parameters are outside the device's supported range.
    InvalidClock,
}

/// Result alias used throughout the driver.
pub type DriverResult<T = ()> = Result<T, DriverError>;

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Busy => f.write_str("command buffer full"),
            Self::Timeout => f.write_str("hardware operation timed out"),
            Self::DeviceError => f.write_str("hardware signaled failure"),
            Self::BadArgument => f.write_str("invalid argument"),
            Self::InvalidClock => f.write_str("clock parameters out of range"),
        }
    }
}
