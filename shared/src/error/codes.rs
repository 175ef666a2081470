//! Unified error codes for the queue server
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 4xxx: Reservation errors
//! - 7xxx: Queue/group errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// Codes are represented as u16 values for efficient serialization and
/// cross-language compatibility with the operator frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Unknown error
    Unknown = 1,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,

    // ==================== 4xxx: Reservation ====================
    /// Reservation not found
    ReservationNotFound = 4001,
    /// Reservation is not in the Waiting state
    ReservationNotWaiting = 4002,
    /// Reservation is not marked absent
    ReservationNotAbsent = 4003,
    /// Absence grace period has expired
    AbsenceExpired = 4004,
    /// Reception is closed, new intake rejected
    ReceptionClosed = 4005,

    // ==================== 7xxx: Queue ====================
    /// Group not found
    GroupNotFound = 7001,
    /// Group would exceed its headcount capacity
    CapacityExceeded = 7002,
    /// Another group is already being called
    AlreadyCalling = 7003,
    /// Group is not in the expected call state
    InvalidCallState = 7004,
    /// Group has no callable members
    EmptyGroup = 7005,
    /// Concurrent modification detected, re-fetch and retry
    StaleWrite = 7006,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Record store unavailable
    StoreUnavailable = 9002,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Check if this is a success code
    #[inline]
    pub const fn is_success(&self) -> bool {
        matches!(self, ErrorCode::Success)
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::Unknown => "An unknown error occurred",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",

            // Reservation
            ErrorCode::ReservationNotFound => "Reservation not found",
            ErrorCode::ReservationNotWaiting => "Reservation is not waiting",
            ErrorCode::ReservationNotAbsent => "Reservation is not marked absent",
            ErrorCode::AbsenceExpired => "Absence grace period has expired",
            ErrorCode::ReceptionClosed => "Reception is closed",

            // Queue
            ErrorCode::GroupNotFound => "Group not found",
            ErrorCode::CapacityExceeded => "Group capacity exceeded",
            ErrorCode::AlreadyCalling => "Another group is already being called",
            ErrorCode::InvalidCallState => "Group is not in the expected call state",
            ErrorCode::EmptyGroup => "Group has no callable members",
            ErrorCode::StaleWrite => "Concurrent modification detected",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::StoreUnavailable => "Record store unavailable",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

impl From<ErrorCode> for u16 {
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            1 => Ok(ErrorCode::Unknown),
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),

            // Reservation
            4001 => Ok(ErrorCode::ReservationNotFound),
            4002 => Ok(ErrorCode::ReservationNotWaiting),
            4003 => Ok(ErrorCode::ReservationNotAbsent),
            4004 => Ok(ErrorCode::AbsenceExpired),
            4005 => Ok(ErrorCode::ReceptionClosed),

            // Queue
            7001 => Ok(ErrorCode::GroupNotFound),
            7002 => Ok(ErrorCode::CapacityExceeded),
            7003 => Ok(ErrorCode::AlreadyCalling),
            7004 => Ok(ErrorCode::InvalidCallState),
            7005 => Ok(ErrorCode::EmptyGroup),
            7006 => Ok(ErrorCode::StaleWrite),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::StoreUnavailable),

            other => Err(InvalidErrorCode(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        for code in [
            ErrorCode::Success,
            ErrorCode::ValidationFailed,
            ErrorCode::ReservationNotFound,
            ErrorCode::CapacityExceeded,
            ErrorCode::AlreadyCalling,
            ErrorCode::StaleWrite,
            ErrorCode::InternalError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_invalid_code() {
        assert_eq!(ErrorCode::try_from(1234), Err(InvalidErrorCode(1234)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ErrorCode::CapacityExceeded.to_string(), "E7002");
        assert_eq!(ErrorCode::Success.to_string(), "E0000");
    }
}
