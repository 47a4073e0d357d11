//! Error types for the engraving engine.
//!
//! This module provides structured error types for depth-map synthesis,
//! power mapping, and toolpath planning. Validation errors are raised before
//! any buffer allocation or worker dispatch; `Cancelled` is a distinct
//! terminal outcome, not a failure.

use thiserror::Error;

/// Errors that can occur during engine operations.
#[derive(Error, Debug)]
pub enum EngraveError {
    /// Malformed image or depth-map settings.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Out-of-range or contradictory toolpath parameters.
    #[error("Invalid settings: {0}")]
    InvalidSettings(#[from] ParameterError),

    /// The named laser or material profile is not registered.
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    /// Non-physical material constants.
    #[error("Invalid material: {0}")]
    InvalidMaterial(String),

    /// The request was superseded or explicitly aborted. Callers handle this
    /// outcome separately from failures.
    #[error("Computation cancelled")]
    Cancelled,

    /// A worker failed during path generation; no partial result is
    /// returned.
    #[error("Toolpath generation failed: {0}")]
    GenerationFailed(String),
}

/// Errors related to toolpath parameter validation.
#[derive(Error, Debug)]
pub enum ParameterError {
    /// A parameter value is out of the valid range.
    #[error("Parameter '{name}' out of range: {value} (valid: {min}..{max})")]
    OutOfRange {
        name: String,
        value: f64,
        min: f64,
        max: f64,
    },

    /// A parameter value is invalid.
    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: String, reason: String },

    /// Parameters are mutually incompatible.
    #[error("Incompatible parameters: {0}")]
    Incompatible(String),
}

/// Result type alias for engine operations.
pub type EngraveResult<T> = Result<T, EngraveError>;

/// Result type alias for parameter validation.
pub type ParameterResult<T> = Result<T, ParameterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engrave_error_display() {
        let err = EngraveError::InvalidInput("image has zero width".to_string());
        assert_eq!(err.to_string(), "Invalid input: image has zero width");

        let err = EngraveError::ProfileNotFound("fiber-300w".to_string());
        assert_eq!(err.to_string(), "Profile not found: fiber-300w");

        let err = EngraveError::Cancelled;
        assert_eq!(err.to_string(), "Computation cancelled");
    }

    #[test]
    fn test_parameter_error_display() {
        let err = ParameterError::OutOfRange {
            name: "depth_per_pass".to_string(),
            value: -0.5,
            min: 0.0,
            max: 10.0,
        };
        assert_eq!(
            err.to_string(),
            "Parameter 'depth_per_pass' out of range: -0.5 (valid: 0..10)"
        );

        let err = ParameterError::Incompatible("power ramp initial exceeds max".to_string());
        assert_eq!(
            err.to_string(),
            "Incompatible parameters: power ramp initial exceeds max"
        );
    }

    #[test]
    fn test_parameter_error_conversion() {
        let param_err = ParameterError::InvalidValue {
            name: "pass_layers".to_string(),
            reason: "must be at least 1".to_string(),
        };
        let err: EngraveError = param_err.into();
        assert!(matches!(err, EngraveError::InvalidSettings(_)));
    }
}
