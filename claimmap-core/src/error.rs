//! Error types for ClaimMap operations

use crate::{ClaimId, SyncPhase};
use thiserror::Error;

/// Errors reported by the marker service.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum MarkerError {
    #[error("Marker set not found: {key}")]
    SetNotFound { key: String },

    #[error("Marker set already exists: {key}")]
    DuplicateSet { key: String },

    #[error("Marker not found: {key}")]
    MarkerNotFound { key: String },

    #[error("Marker already exists in set {set}: {key}")]
    DuplicateMarker { set: String, key: String },

    #[error("Failed to create {kind} {key}: {reason}")]
    CreateFailed {
        kind: &'static str,
        key: String,
        reason: String,
    },

    #[error("Marker service lock poisoned")]
    LockPoisoned,

    #[error("Marker service error: {reason}")]
    Service { reason: String },
}

/// Errors raised while discovering collaborators on the host.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HostError {
    #[error("The {name} plugin was not found on this server")]
    CollaboratorMissing { name: String },

    #[error("The {name} plugin is disabled")]
    CollaboratorDisabled { name: String },
}

/// Configuration errors.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {field}: {value} - {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to read config file {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse config file {path}: {reason}")]
    Parse { path: String, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &str, value: impl ToString, reason: &str) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Master error type for all ClaimMap errors.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SyncError {
    #[error("Marker error: {0}")]
    Marker(#[from] MarkerError),

    #[error("Host error: {0}")]
    Host(#[from] HostError),

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to set up marker set '{key}': {reason}")]
    MarkerSetSetup { key: String, reason: String },

    #[error("Claim synchronization is not running (phase: {phase:?})")]
    NotRunning { phase: SyncPhase },

    #[error("Registry has no marker for claim {claim_id}")]
    RegistryInconsistent { claim_id: ClaimId },
}

impl SyncError {
    /// Whether the error aborts initialization instead of a single event.
    pub fn is_fatal_setup(&self) -> bool {
        matches!(
            self,
            SyncError::Host(_) | SyncError::Config(_) | SyncError::MarkerSetSetup { .. }
        )
    }
}

/// Result type alias for ClaimMap operations.
pub type SyncResult<T> = Result<T, SyncError>;

// =============================================================================
// TESTS
// =============================================================================
