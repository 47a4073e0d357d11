//! Error types for the profile crate.
//!
//! This module provides structured error types for profile registration,
//! validation, and interchange-document handling.

use thiserror::Error;

/// Errors that can occur during profile management operations.
#[derive(Error, Debug)]
pub enum ProfileError {
    /// The requested profile was not found in the registry.
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// The profile data is invalid.
    #[error("Invalid profile: {0}")]
    InvalidProfile(String),

    /// A lookup curve failed validation.
    #[error("Invalid curve in profile '{name}': {reason}")]
    InvalidCurve { name: String, reason: String },

    /// The interchange document carries a profile kind this engine does not
    /// handle.
    #[error("Unsupported profile kind: {0}")]
    UnsupportedKind(String),

    /// The interchange document version is newer than this build understands.
    #[error("Unsupported document version: {0}")]
    UnsupportedVersion(u32),

    /// JSON serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type alias for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;
