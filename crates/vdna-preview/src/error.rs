//! Preview error types.

use thiserror::Error;

/// Result type for preview operations.
pub type PreviewResult<T> = Result<T, PreviewError>;

/// Errors surfaced by the preview flow.
///
/// Every variant is recoverable by starting a new submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreviewError {
    /// Rejected before any network call.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Failed to start video generation: {0}")]
    SubmissionFailed(String),

    #[error("Failed to check video status: {0}")]
    PollTransport(String),

    /// The generation service reported `fail`.
    #[error("{0}")]
    JobFailed(String),

    #[error("Video generation timed out after {attempts} status checks")]
    PollTimeout { attempts: u32 },
}

impl PreviewError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn submission_failed(msg: impl Into<String>) -> Self {
        Self::SubmissionFailed(msg.into())
    }

    pub fn poll_transport(msg: impl Into<String>) -> Self {
        Self::PollTransport(msg.into())
    }

    pub fn job_failed(reason: impl Into<String>) -> Self {
        Self::JobFailed(reason.into())
    }

    /// Label used for the poll outcome metric.
    pub fn outcome_label(&self) -> &'static str {
        match self {
            PreviewError::InvalidInput(_) => "invalid_input",
            PreviewError::SubmissionFailed(_) => "submission_failed",
            PreviewError::PollTransport(_) => "transport_error",
            PreviewError::JobFailed(_) => "failed",
            PreviewError::PollTimeout { .. } => "timeout",
        }
    }
}
