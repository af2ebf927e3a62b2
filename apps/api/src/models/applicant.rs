use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::{JobMatchAnalysis, ResumeAnalysis};

pub const DEFAULT_STATUS: &str = "new";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ApplicantRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub resume_file_key: String,
    pub priority_score: i32,
    pub summary: String,
    pub key_skills: Vec<String>,
    pub experience: String,
    pub education: String,
    pub highlights: Vec<String>,
    pub concerns: Vec<String>,
    pub job_posting_id: Option<Uuid>,
    pub job_relevancy_score: Option<i32>,
    pub job_match_summary: Option<String>,
    pub skill_matches: Vec<String>,
    pub skill_gaps: Vec<String>,
    pub strengths: Vec<String>,
    pub recommendations: Vec<String>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Identity fields typed in by the person applying.
#[derive(Debug, Clone)]
pub struct SubmitterIdentity {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

/// A job posting reference plus the analysis of the resume against it.
#[derive(Debug, Clone)]
pub struct JobMatch {
    pub job_posting_id: Uuid,
    pub analysis: JobMatchAnalysis,
}

/// An applicant about to be inserted: analysis output merged with whatever
/// the submitter provided.
#[derive(Debug, Clone)]
pub struct NewApplicant {
    pub resume_file_key: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub analysis: ResumeAnalysis,
    pub job_match: Option<JobMatch>,
}

impl NewApplicant {
    /// Identity comes from the analysis alone (recruiter upload).
    pub fn from_analysis(resume_file_key: String, analysis: ResumeAnalysis) -> Self {
        Self {
            resume_file_key,
            name: analysis.name.clone(),
            email: analysis.email.clone(),
            phone: analysis.phone.clone(),
            analysis,
            job_match: None,
        }
    }

    /// Submitter-provided identity wins over the analysed one. A phone the
    /// submitter left blank falls back to the analysed phone.
    pub fn with_submitter(mut self, identity: SubmitterIdentity) -> Self {
        self.name = identity.name;
        self.email = identity.email;
        if identity.phone.is_some() {
            self.phone = identity.phone;
        }
        self
    }

    pub fn with_job_match(mut self, job_posting_id: Uuid, analysis: JobMatchAnalysis) -> Self {
        self.job_match = Some(JobMatch {
            job_posting_id,
            analysis,
        });
        self
    }
}

/// Recruiter edits. `None` leaves the column untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantUpdate {
    pub status: Option<String>,
    pub notes: Option<String>,
    #[serde(alias = "priority_score")]
    pub priority_score: Option<i32>,
}

impl ApplicantUpdate {
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.notes.is_none() && self.priority_score.is_none()
    }
}
