//! Error handling module for SplitX

use thiserror::Error;

use crate::domain::errors::DomainError;

/// Main error type for SplitX operations outside the domain layer
#[derive(Error, Debug)]
pub enum SplitXError {
    /// Domain rule or collaborator failure
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Environment variable holds an unusable value
    #[error("Invalid value for {var}: {message}")]
    InvalidEnv { var: String, message: String },

    /// I/O error
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON rendering error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type alias for SplitX operations
pub type SplitXResult<T> = std::result::Result<T, SplitXError>;

impl SplitXError {
    /// Process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            SplitXError::Domain(DomainError::Spawn(_)) | SplitXError::Domain(DomainError::ProbeFail(_)) => 3,
            SplitXError::Domain(DomainError::FsFail(_))
            | SplitXError::Domain(DomainError::OutputDirUnavailable(_))
            | SplitXError::IoError(_) => 4,
            _ => 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_errors_convert_transparently() {
        let error: SplitXError = DomainError::NoVideoLoaded.into();
        assert_eq!(error.to_string(), "No video loaded");
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(SplitXError::from(DomainError::Spawn("x".into())).exit_code(), 3);
        assert_eq!(
            SplitXError::from(DomainError::OutputDirUnavailable("x".into())).exit_code(),
            4
        );
        let env = SplitXError::InvalidEnv {
            var: "SPLITX_JOB_TIMEOUT".into(),
            message: "not a number".into(),
        };
        assert!(env.to_string().contains("SPLITX_JOB_TIMEOUT"));
    }
}
