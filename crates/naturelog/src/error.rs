//! Error types for naturelog.
//!
//! This module defines all error types used throughout the naturelog crate.
//! Every external-service failure is folded into one of the pipeline error
//! kinds here so callers always see a single, nameable failed step.

use thiserror::Error;

use crate::acquire::AcquisitionMode;
use crate::journal::SaveState;

/// The main error type for naturelog operations.
///
/// User cancellation is deliberately absent: cancelling the picker or a
/// delete confirmation is a normal outcome, modelled in the respective
/// result types rather than as an error.
#[derive(Error, Debug)]
pub enum Error {
    // === Session Errors ===
    /// No identity is available for an operation that requires one.
    #[error("no identity available: {reason}")]
    IdentityUnavailable {
        /// Why the identity is missing (bootstrap failure, signed out, ...).
        reason: String,
    },

    // === Acquisition Errors ===
    /// The required device permission was not granted.
    #[error("{mode} permission denied")]
    PermissionDenied {
        /// The acquisition mode whose permission was refused.
        mode: AcquisitionMode,
    },

    /// No photo is staged for a save.
    #[error("no photo staged; take or select a photo first")]
    NoPhotoStaged,

    /// A save sequence is already in flight.
    #[error("a save is already in progress (state: {state})")]
    SaveInProgress {
        /// The state the pipeline was in when re-entry was attempted.
        state: SaveState,
    },

    // === Pipeline Errors ===
    /// The image upload to the media host failed.
    #[error("upload failed: {message}")]
    UploadFailed {
        /// The underlying service or transport message.
        message: String,
    },

    /// Writing the entry record to the document store failed.
    #[error("failed to save entry: {message}")]
    WriteFailed {
        /// The underlying service or transport message.
        message: String,
    },

    /// Querying entries from the document store failed.
    #[error("failed to load entries: {message}")]
    QueryFailed {
        /// The underlying service or transport message.
        message: String,
    },

    /// Deleting an entry record failed.
    #[error("failed to delete entry: {message}")]
    DeleteFailed {
        /// The underlying service or transport message.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for naturelog operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create an identity-unavailable error.
    #[must_use]
    pub fn identity_unavailable(reason: impl Into<String>) -> Self {
        Self::IdentityUnavailable {
            reason: reason.into(),
        }
    }

    /// Create an upload-failed error.
    #[must_use]
    pub fn upload_failed(message: impl Into<String>) -> Self {
        Self::UploadFailed {
            message: message.into(),
        }
    }

    /// Create a write-failed error.
    #[must_use]
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
        }
    }

    /// Create a query-failed error.
    #[must_use]
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed {
            message: message.into(),
        }
    }

    /// Create a delete-failed error.
    #[must_use]
    pub fn delete_failed(message: impl Into<String>) -> Self {
        Self::DeleteFailed {
            message: message.into(),
        }
    }

    /// Check if this error is a permission issue.
    #[must_use]
    pub fn is_permission_error(&self) -> bool {
        matches!(self, Self::PermissionDenied { .. })
    }

    /// Check if this error means the save pipeline is busy.
    #[must_use]
    pub fn is_save_in_progress(&self) -> bool {
        matches!(self, Self::SaveInProgress { .. })
    }
}
