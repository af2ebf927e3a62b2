//! Resume intake: the two entry points that feed the analysis pipeline.
//!
//! Flow: multipart form → validate → stage to a temp file → analyze →
//!       store the original in S3 → insert the applicant row.
//!
//! Nothing is persisted unless every step succeeds. The staged temp file is
//! removed on drop; a stored object whose insert fails is deleted again.

use std::io::Write;

use anyhow::Context;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;
use bytes::Bytes;
use tempfile::NamedTempFile;
use tracing::info;
use uuid::Uuid;

use crate::analysis::file_kind::{MIME_DOC, MIME_DOCX, MIME_PDF, MIME_TEXT};
use crate::applicants::store::{fetch_job_posting, insert_applicant};
use crate::errors::AppError;
use crate::models::applicant::{ApplicantRow, NewApplicant, SubmitterIdentity};
use crate::models::job::JobPostingRow;
use crate::state::AppState;
use crate::storage::{discard_resume, put_resume, resume_object_key};

pub const ALLOWED_CONTENT_TYPES: [&str; 4] = [MIME_PDF, MIME_DOC, MIME_DOCX, MIME_TEXT];

// ────────────────────────────────────────────────────────────────────────────
// Form parsing and validation
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ResumeUpload {
    pub file_name: String,
    pub content_type: String,
    pub data: Bytes,
}

impl ResumeUpload {
    /// Extension of the submitted file name including the dot, or "".
    pub fn extension(&self) -> String {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| format!(".{e}"))
            .unwrap_or_default()
    }

    /// Content type without parameters, e.g. "text/plain; charset=utf-8" → "text/plain".
    fn mime_essence(&self) -> &str {
        self.content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
    }
}

#[derive(Debug, Default)]
pub struct ApplicationForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub resume: Option<ResumeUpload>,
}

impl ApplicationForm {
    /// Name and email are required; a blank phone counts as absent.
    pub fn identity(&self) -> Result<SubmitterIdentity, AppError> {
        let name = non_blank(self.name.as_deref())
            .ok_or_else(|| AppError::Validation("name is required".to_string()))?;
        let email = non_blank(self.email.as_deref())
            .ok_or_else(|| AppError::Validation("email is required".to_string()))?;
        if !email.contains('@') {
            return Err(AppError::Validation(format!("'{email}' is not a valid email")));
        }

        Ok(SubmitterIdentity {
            name,
            email,
            phone: non_blank(self.phone.as_deref()),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn no_file() -> AppError {
    AppError::InvalidUpload {
        code: "NO_FILE",
        message: "No file uploaded".to_string(),
    }
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::InvalidUpload {
        code: "FILE_TOO_LARGE",
        message: format!(
            "File too large. Maximum size is {:.0}MB",
            max_bytes as f64 / (1024.0 * 1024.0)
        ),
    }
}

fn multipart_error(err: MultipartError, max_bytes: usize) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        too_large(max_bytes)
    } else {
        AppError::Validation(format!("Malformed multipart body: {err}"))
    }
}

/// Reads `name`, `email`, `phone` and `resume` fields; unknown fields are skipped.
pub async fn read_application_form(
    mut multipart: Multipart,
    max_bytes: usize,
) -> Result<ApplicationForm, AppError> {
    let mut form = ApplicationForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, max_bytes))?
    {
        let field_name = field.name().map(str::to_string);
        match field_name.as_deref() {
            Some("resume") => {
                let file_name = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?;
                form.resume = Some(ResumeUpload {
                    file_name,
                    content_type,
                    data,
                });
            }
            Some(key @ ("name" | "email" | "phone")) => {
                let key = key.to_string();
                let value = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, max_bytes))?;
                match key.as_str() {
                    "name" => form.name = Some(value),
                    "email" => form.email = Some(value),
                    _ => form.phone = Some(value),
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Checks size first, then declared content type.
pub fn validate_upload(upload: &ResumeUpload, max_bytes: usize) -> Result<(), AppError> {
    if upload.data.is_empty() {
        return Err(AppError::InvalidUpload {
            code: "EMPTY_FILE",
            message: "Uploaded file is empty".to_string(),
        });
    }
    if upload.data.len() > max_bytes {
        return Err(too_large(max_bytes));
    }
    if !ALLOWED_CONTENT_TYPES.contains(&upload.mime_essence()) {
        return Err(AppError::InvalidUpload {
            code: "INVALID_FILE_TYPE",
            message: "Invalid file type. Only PDF, DOC, DOCX, and TXT files are allowed."
                .to_string(),
        });
    }
    Ok(())
}

/// Writes the upload to a uniquely named temp file that keeps the original
/// extension, so the analyzer can dispatch on it.
async fn stage_resume(upload: &ResumeUpload) -> Result<NamedTempFile, AppError> {
    let suffix = upload.extension();
    let data = upload.data.clone();

    let staged = tokio::task::spawn_blocking(move || -> std::io::Result<NamedTempFile> {
        let mut file = tempfile::Builder::new()
            .prefix("resume-")
            .suffix(&suffix)
            .tempfile()?;
        file.write_all(&data)?;
        file.flush()?;
        Ok(file)
    })
    .await
    .context("Resume staging task failed")?
    .context("Failed to stage resume file")?;

    Ok(staged)
}

// ────────────────────────────────────────────────────────────────────────────
// Pipelines
// ────────────────────────────────────────────────────────────────────────────

/// Recruiter upload: identity comes from the analysis.
pub async fn intake_upload(
    state: &AppState,
    upload: Option<ResumeUpload>,
) -> Result<ApplicantRow, AppError> {
    let upload = upload.ok_or_else(no_file)?;
    validate_upload(&upload, state.config.max_upload_bytes)?;

    let staged = stage_resume(&upload).await?;
    let analysis = state.analyzer.analyze_resume_file(staged.path()).await?;
    info!(
        "Analyzed uploaded resume {} (priority_score={})",
        upload.file_name, analysis.priority_score
    );

    persist(state, &upload, |key| NewApplicant::from_analysis(key, analysis)).await
}

/// Public application to one job posting: general analysis plus job match,
/// merged with the submitter's own identity fields.
pub async fn intake_application(
    state: &AppState,
    job_posting_id: Uuid,
    form: ApplicationForm,
) -> Result<ApplicantRow, AppError> {
    let identity = form.identity()?;
    let upload = form.resume.ok_or_else(no_file)?;
    validate_upload(&upload, state.config.max_upload_bytes)?;

    let job = fetch_job_posting(&state.db, job_posting_id)
        .await?
        .filter(JobPostingRow::is_active)
        .ok_or_else(|| AppError::NotFound("Job posting not found or not active".to_string()))?;

    let staged = stage_resume(&upload).await?;
    let job_context = job.context();
    let (analysis, job_match) = state
        .analyzer
        .analyze_resume_file_with_job(staged.path(), &job_context)
        .await?;
    info!(
        "Analyzed application for job {} (priority_score={}, job_relevancy_score={})",
        job.id, analysis.priority_score, job_match.job_relevancy_score
    );

    persist(state, &upload, |key| {
        NewApplicant::from_analysis(key, analysis)
            .with_submitter(identity)
            .with_job_match(job.id, job_match)
    })
    .await
}

async fn persist(
    state: &AppState,
    upload: &ResumeUpload,
    build: impl FnOnce(String) -> NewApplicant,
) -> Result<ApplicantRow, AppError> {
    let bucket = &state.config.s3_bucket;
    let key = resume_object_key(&upload.extension());
    put_resume(
        &state.s3,
        bucket,
        &key,
        upload.data.clone(),
        upload.mime_essence(),
    )
    .await?;

    let applicant = build(key.clone());
    match insert_applicant(&state.db, &applicant).await {
        Ok(row) => {
            info!("Created applicant {} from {}", row.id, upload.file_name);
            Ok(row)
        }
        Err(e) => {
            discard_resume(&state.s3, bucket, &key).await;
            Err(e.into())
        }
    }
}
