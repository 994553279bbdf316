//! Common error types for AMS backends

use thiserror::Error;

use crate::models::AmsAction;

/// Result type for backend operations
pub type AmsResult<T = ()> = Result<T, AmsError>;

/// Errors returned by AMS backend operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmsError {
    /// Backend not running, or a required collaborator is missing
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// No multi-material hardware was found on the printer
    #[error("No AMS detected")]
    NoAmsDetected,

    /// Another operation is still in progress
    #[error("Busy: {action} in progress")]
    Busy { action: AmsAction },

    /// Slot index outside `0..=max`
    #[error("Invalid slot {slot} (valid range 0-{max})")]
    InvalidSlot { slot: i32, max: i32 },

    /// Tool index outside `0..=max`
    #[error("Invalid tool {tool} (valid range 0-{max})")]
    InvalidTool { tool: i32, max: i32 },

    /// Unload requested but nothing is loaded
    #[error("No filament loaded")]
    NotLoaded,

    /// Slot exists but has no filament to load
    #[error("Slot {0} has no filament")]
    SlotNotAvailable(i32),

    /// Operation not supported by this backend
    #[error("Operation not supported: {0}")]
    NotSupported(String),

    /// Operation not valid in the current state
    #[error("Wrong state: {current}, need {required}")]
    WrongState { current: String, required: String },

    /// Missing or malformed argument value
    #[error("Invalid value: {0}")]
    InvalidValue(String),

    /// Printer rejected a command synchronously
    #[error("Command '{command}' failed: {response}")]
    CommandFailed { command: String, response: String },
}

/// Discriminant of [`AmsError`] for cheap matching and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmsErrorKind {
    NotConnected,
    NoAmsDetected,
    Busy,
    InvalidSlot,
    InvalidTool,
    NotLoaded,
    SlotNotAvailable,
    NotSupported,
    WrongState,
    InvalidValue,
    CommandFailed,
}

impl AmsError {
    pub fn not_connected(detail: impl Into<String>) -> Self {
        AmsError::NotConnected(detail.into())
    }

    pub fn not_supported(feature: impl Into<String>) -> Self {
        AmsError::NotSupported(feature.into())
    }

    pub fn wrong_state(current: impl Into<String>, required: impl Into<String>) -> Self {
        AmsError::WrongState {
            current: current.into(),
            required: required.into(),
        }
    }

    pub fn kind(&self) -> AmsErrorKind {
        match self {
            AmsError::NotConnected(_) => AmsErrorKind::NotConnected,
            AmsError::NoAmsDetected => AmsErrorKind::NoAmsDetected,
            AmsError::Busy { .. } => AmsErrorKind::Busy,
            AmsError::InvalidSlot { .. } => AmsErrorKind::InvalidSlot,
            AmsError::InvalidTool { .. } => AmsErrorKind::InvalidTool,
            AmsError::NotLoaded => AmsErrorKind::NotLoaded,
            AmsError::SlotNotAvailable(_) => AmsErrorKind::SlotNotAvailable,
            AmsError::NotSupported(_) => AmsErrorKind::NotSupported,
            AmsError::WrongState { .. } => AmsErrorKind::WrongState,
            AmsError::InvalidValue(_) => AmsErrorKind::InvalidValue,
            AmsError::CommandFailed { .. } => AmsErrorKind::CommandFailed,
        }
    }

    /// Slot involved in the failure, if any
    pub fn slot(&self) -> Option<i32> {
        match self {
            AmsError::InvalidSlot { slot, .. } | AmsError::SlotNotAvailable(slot) => Some(*slot),
            _ => None,
        }
    }

    /// Whether retrying after the system settles can succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, AmsError::Busy { .. } | AmsError::NotConnected(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = AmsError::InvalidSlot { slot: 5, max: 2 };
        assert_eq!(err.to_string(), "Invalid slot 5 (valid range 0-2)");

        let err = AmsError::Busy {
            action: AmsAction::Selecting,
        };
        assert_eq!(err.to_string(), "Busy: Selecting in progress");
    }

    #[test]
    fn test_kind_and_slot() {
        let err = AmsError::SlotNotAvailable(3);
        assert_eq!(err.kind(), AmsErrorKind::SlotNotAvailable);
        assert_eq!(err.slot(), Some(3));
        assert_eq!(AmsError::NotLoaded.slot(), None);
    }

    #[test]
    fn test_transient() {
        assert!(AmsError::not_connected("stopped").is_transient());
        assert!(!AmsError::not_supported("bypass").is_transient());
    }
}
