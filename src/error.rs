//! Error types for Sleepwise

use thiserror::Error;

/// Errors that can occur while encoding, predicting, or storing submissions
#[derive(Debug, Error)]
pub enum SleepwiseError {
    #[error("Invalid {field} value: {value}")]
    InvalidFeatureValue { field: &'static str, value: String },

    #[error("Failed to parse submission: {0}")]
    ParseError(String),

    #[error("Invalid JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Prediction service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Prediction service returned an unusable response: {0}")]
    UpstreamResponse(String),

    #[error("Submission not found: {0}")]
    SubmissionNotFound(String),

    #[error("User already exists")]
    UserExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Session expired or unknown")]
    SessionExpired,

    #[error("Credential hashing failed: {0}")]
    CredentialError(String),

    #[error("Storage error: {0}")]
    StorageError(String),
}

impl SleepwiseError {
    /// Build an `InvalidFeatureValue` for the given field
    pub fn invalid_feature(field: &'static str, value: impl Into<String>) -> Self {
        SleepwiseError::InvalidFeatureValue {
            field,
            value: value.into(),
        }
    }

    /// Whether the error was caused by the caller's input (as opposed to a
    /// collaborator failing)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            SleepwiseError::InvalidFeatureValue { .. }
                | SleepwiseError::ParseError(_)
                | SleepwiseError::JsonError(_)
                | SleepwiseError::UserExists
                | SleepwiseError::UserNotFound
                | SleepwiseError::InvalidPassword
                | SleepwiseError::SessionExpired
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_feature_message_names_field_and_value() {
        let err = SleepwiseError::invalid_feature("activityLevel", "Extreme");
        assert_eq!(err.to_string(), "Invalid activityLevel value: Extreme");
        assert!(err.is_client_error());
    }

    #[test]
    fn test_upstream_errors_are_not_client_errors() {
        assert!(!SleepwiseError::UpstreamUnavailable("timeout".into()).is_client_error());
        assert!(!SleepwiseError::UpstreamResponse("no score".into()).is_client_error());
    }
}
