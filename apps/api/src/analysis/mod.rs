// Resume analysis pipeline.
// Implements: prompt rendering, file-type dispatch, model invocation, reply normalization.
// All model calls go through llm_client::GenerativeModel.

pub mod analyzer;
pub mod error;
pub mod file_kind;
pub mod models;
pub mod normalize;
pub mod prompts;

pub use analyzer::ResumeAnalyzer;
pub use error::{AnalysisError, AnalysisFailure, AnalysisOperation};
pub use file_kind::ResumeFileKind;
pub use models::{JobContext, JobMatchAnalysis, ResumeAnalysis};
