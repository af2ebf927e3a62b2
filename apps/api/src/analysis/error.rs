use std::fmt;

use thiserror::Error;

use crate::llm_client::LlmError;

/// The analysis entry point that failed. Its display text prefixes the
/// user-visible failure message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisOperation {
    Resume,
    ResumeFile,
    ResumeForJob,
    ResumeFileForJob,
}

impl fmt::Display for AnalysisOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Resume => "Failed to analyze resume",
            Self::ResumeFile => "Failed to analyze resume file",
            Self::ResumeForJob => "Failed to analyze resume for job",
            Self::ResumeFileForJob => "Failed to analyze resume file for job",
        };
        f.write_str(label)
    }
}

/// Why an analysis failed.
#[derive(Debug, Error)]
pub enum AnalysisFailure {
    /// AI credentials are absent. Raised before any network call.
    #[error("AI service is not configured")]
    Configuration,

    /// The reply was not a JSON object after fence stripping.
    #[error("Failed to parse AI response: {0}")]
    UpstreamParse(#[from] serde_json::Error),

    /// Transport or service failure during generation or file upload.
    #[error("AI service call failed: {0}")]
    UpstreamCall(#[source] LlmError),

    #[error("Failed to read resume file: {0}")]
    ResumeFile(#[from] std::io::Error),
}

impl From<LlmError> for AnalysisFailure {
    fn from(err: LlmError) -> Self {
        match err {
            LlmError::NotConfigured => Self::Configuration,
            other => Self::UpstreamCall(other),
        }
    }
}

/// The single failure signal returned by every analysis entry point.
#[derive(Debug, Error)]
#[error("{operation}: {failure}")]
pub struct AnalysisError {
    pub operation: AnalysisOperation,
    #[source]
    pub failure: AnalysisFailure,
}

impl AnalysisError {
    pub fn new(operation: AnalysisOperation, failure: AnalysisFailure) -> Self {
        Self { operation, failure }
    }
}
