use serde::{Deserialize, Serialize};

pub const MAX_KEY_SKILLS: usize = 10;
pub const MAX_HIGHLIGHTS: usize = 5;
pub const MAX_CONCERNS: usize = 3;

pub const MAX_SKILL_MATCHES: usize = 10;
pub const MAX_SKILL_GAPS: usize = 10;
pub const MAX_STRENGTHS: usize = 5;
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Score used when the model omits a score or returns something non-numeric.
pub const DEFAULT_SCORE: i32 = 50;

pub const UNKNOWN_NAME: &str = "Unknown";
pub const UNKNOWN_EMAIL: &str = "unknown@example.com";
pub const NO_SUMMARY: &str = "No summary available";
pub const NOT_SPECIFIED: &str = "Not specified";

/// General resume analysis, fully populated by the normalizer.
///
/// Transient: it is merged into an applicant row and then dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResumeAnalysis {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    /// 0 – 100
    pub priority_score: i32,
    pub summary: String,
    pub key_skills: Vec<String>,
    pub experience: String,
    pub education: String,
    pub highlights: Vec<String>,
    pub concerns: Vec<String>,
}

/// How well a resume fits one specific job posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMatchAnalysis {
    /// 0 – 100
    pub job_relevancy_score: i32,
    pub job_match_summary: String,
    pub skill_matches: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub strengths: Vec<String>,
    pub recommendations: Vec<String>,
}

/// The job fields interpolated into the job-match prompt.
#[derive(Debug, Clone, Copy)]
pub struct JobContext<'a> {
    pub title: &'a str,
    pub requirements: Option<&'a str>,
    pub description: Option<&'a str>,
}
