//! Common error types for the registry

use thiserror::Error;

use crate::models::Interaction;

/// Result type for registry operations
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Coarse classification of a [`RegistryError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced id does not exist. Never retried.
    NotFound,
    /// The request itself is wrong. Surfaced verbatim to the caller.
    Validation,
    /// A multi-step write was interrupted; the caller must redo it.
    InconsistentState,
    /// Storage, timeout or configuration failure.
    Internal,
}

/// Errors that can occur in the registry
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Aspect (or aspect node) not found
    #[error("Aspect not found: {0}")]
    AspectNotFound(String),

    /// Function not found
    #[error("Function not found: {0}")]
    FunctionNotFound(String),

    /// Device not found
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// Device type not found
    #[error("Device type not found: {0}")]
    DeviceTypeNotFound(String),

    /// Device group not found
    #[error("Device group not found: {0}")]
    DeviceGroupNotFound(String),

    /// Malformed filter criteria
    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    /// The same device was selected twice within one mapping row
    #[error("Device {device_id} selected more than once for criteria row {row}")]
    DuplicateDeviceInRow {
        /// Offending device
        device_id: String,
        /// Zero-based mapping row
        row: usize,
    },

    /// A device is not selected in every mapping row
    #[error("Device {device_id} is selected in {used} of {rows} criteria rows")]
    DeviceNotUniformlySelected {
        /// Offending device
        device_id: String,
        /// Number of rows selecting the device
        used: usize,
        /// Number of mapping rows
        rows: usize,
    },

    /// The device class of a selected device does not match the criteria
    #[error("Device {device_id} has device class {actual}, criteria requires {expected}")]
    DeviceClassMismatch {
        /// Offending device
        device_id: String,
        /// Device class required by the criteria
        expected: String,
        /// Device class of the device type
        actual: String,
    },

    /// A selected service does not exist on the device type
    #[error("Service {service_id} not found on device type of device {device_id}")]
    UnknownService {
        /// Device the selection belongs to
        device_id: String,
        /// Unknown service
        service_id: String,
    },

    /// A selected service uses the group's blocked interaction
    #[error("Service {service_id} uses blocked interaction {interaction}")]
    BlockedInteraction {
        /// Offending service
        service_id: String,
        /// Blocked interaction
        interaction: Interaction,
    },

    /// A selected service does not provide the criteria aspect
    #[error("Service {service_id} does not match aspect {aspect_id}")]
    AspectMismatch {
        /// Offending service
        service_id: String,
        /// Aspect required by the criteria
        aspect_id: String,
    },

    /// A selected service does not provide the criteria function
    #[error("Service {service_id} does not provide function {function_id}")]
    FunctionMismatch {
        /// Offending service
        service_id: String,
        /// Function required by the criteria
        function_id: String,
    },

    /// Service group key unknown to the device type
    #[error("Unknown service group {key} on device type {device_type_id}")]
    UnknownServiceGroup {
        /// Device type that was narrowed
        device_type_id: String,
        /// Requested service group key
        key: String,
    },

    /// Device group failed validation
    #[error("Invalid device group: {0}")]
    InvalidDeviceGroup(String),

    /// A multi-step write was interrupted
    #[error("Inconsistent state: {0}")]
    InconsistentState(String),

    /// Storage backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Timeout waiting for a storage read
    #[error("Operation timed out")]
    Timeout,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RegistryError {
    /// Returns the taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::AspectNotFound(_)
            | RegistryError::FunctionNotFound(_)
            | RegistryError::DeviceNotFound(_)
            | RegistryError::DeviceTypeNotFound(_)
            | RegistryError::DeviceGroupNotFound(_) => ErrorKind::NotFound,
            RegistryError::InvalidCriteria(_)
            | RegistryError::DuplicateDeviceInRow { .. }
            | RegistryError::DeviceNotUniformlySelected { .. }
            | RegistryError::DeviceClassMismatch { .. }
            | RegistryError::UnknownService { .. }
            | RegistryError::BlockedInteraction { .. }
            | RegistryError::AspectMismatch { .. }
            | RegistryError::FunctionMismatch { .. }
            | RegistryError::UnknownServiceGroup { .. }
            | RegistryError::InvalidDeviceGroup(_) => ErrorKind::Validation,
            RegistryError::InconsistentState(_) => ErrorKind::InconsistentState,
            RegistryError::Storage(_) | RegistryError::Timeout | RegistryError::Config(_) => {
                ErrorKind::Internal
            }
        }
    }

    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            RegistryError::Timeout => 504,
            _ => match self.kind() {
                ErrorKind::NotFound => 404,
                ErrorKind::Validation => 400,
                ErrorKind::InconsistentState => 409,
                ErrorKind::Internal => 500,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = RegistryError::DeviceTypeNotFound("dt1".to_string());
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn validation_errors_map_to_400() {
        let err = RegistryError::DeviceNotUniformlySelected {
            device_id: "d1".to_string(),
            used: 1,
            rows: 2,
        };
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.status_code(), 400);
        assert_eq!(
            err.to_string(),
            "Device d1 is selected in 1 of 2 criteria rows"
        );
    }

    #[test]
    fn timeout_maps_to_504() {
        assert_eq!(RegistryError::Timeout.status_code(), 504);
        assert_eq!(RegistryError::Timeout.kind(), ErrorKind::Internal);
    }

    #[test]
    fn interrupted_rebuild_is_inconsistent_state() {
        let err = RegistryError::InconsistentState("rebuild of a1".to_string());
        assert_eq!(err.kind(), ErrorKind::InconsistentState);
        assert_eq!(err.status_code(), 409);
    }
}
