use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::applicants::intake::{
    intake_application, intake_upload, read_application_form,
};
use crate::applicants::store::{
    applicant_stats, delete_applicant, get_applicant, job_applicant_stats, list_applicants,
    update_applicant, ApplicantFilter, ApplicantStats, JobApplicantStats, SortField, SortOrder,
};
use crate::errors::AppError;
use crate::models::applicant::{ApplicantRow, ApplicantUpdate};
use crate::state::AppState;
use crate::storage::discard_resume;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub status: Option<String>,
}

impl ListQuery {
    fn into_filter(self, job_posting_id: Option<Uuid>, default_sort: SortField) -> ApplicantFilter {
        ApplicantFilter {
            job_posting_id,
            status: self.status.filter(|s| !s.trim().is_empty()),
            sort: SortField::parse(self.sort_by.as_deref(), default_sort),
            order: SortOrder::parse(self.order.as_deref()),
        }
    }
}

/// POST /api/v1/applicants/upload
pub async fn handle_upload(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApplicantRow>), AppError> {
    let form = read_application_form(multipart, state.config.max_upload_bytes).await?;
    let applicant = intake_upload(&state, form.resume).await?;
    Ok((StatusCode::CREATED, Json(applicant)))
}

/// POST /api/v1/jobs/:job_id/apply
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ApplicantRow>), AppError> {
    let form = read_application_form(multipart, state.config.max_upload_bytes).await?;
    let applicant = intake_application(&state, job_id, form).await?;
    Ok((StatusCode::CREATED, Json(applicant)))
}

/// GET /api/v1/applicants
pub async fn handle_list_applicants(
    State(state): State<AppState>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<ApplicantRow>>, AppError> {
    let filter = params.into_filter(None, SortField::PriorityScore);
    Ok(Json(list_applicants(&state.db, &filter).await?))
}

/// GET /api/v1/jobs/:job_id/applicants
pub async fn handle_list_job_applicants(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Query(params): Query<ListQuery>,
) -> Result<Json<Vec<ApplicantRow>>, AppError> {
    let filter = params.into_filter(Some(job_id), SortField::JobRelevancyScore);
    Ok(Json(list_applicants(&state.db, &filter).await?))
}

/// GET /api/v1/applicants/:id
pub async fn handle_get_applicant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicantRow>, AppError> {
    get_applicant(&state.db, id)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Applicant {id} not found")))
}

/// PATCH /api/v1/applicants/:id
pub async fn handle_update_applicant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<ApplicantUpdate>,
) -> Result<Json<ApplicantRow>, AppError> {
    if let Some(score) = update.priority_score {
        if !(0..=100).contains(&score) {
            return Err(AppError::UnprocessableEntity(format!(
                "priority score must be between 0 and 100, got {score}"
            )));
        }
    }

    update_applicant(&state.db, id, &update)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Applicant {id} not found")))
}

/// DELETE /api/v1/applicants/:id
/// Removes the record, then its stored resume.
pub async fn handle_delete_applicant(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let resume_file_key = delete_applicant(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Applicant {id} not found")))?;

    discard_resume(&state.s3, &state.config.s3_bucket, &resume_file_key).await;
    info!("Deleted applicant {id}");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/applicants/stats
pub async fn handle_applicant_stats(
    State(state): State<AppState>,
) -> Result<Json<ApplicantStats>, AppError> {
    Ok(Json(applicant_stats(&state.db).await?))
}

/// GET /api/v1/jobs/:job_id/applicants/stats
pub async fn handle_job_applicant_stats(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobApplicantStats>, AppError> {
    Ok(Json(job_applicant_stats(&state.db, job_id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_reads_camel_case_params() {
        let query: ListQuery =
            serde_json::from_str(r#"{"sortBy":"createdAt","order":"asc","status":"new"}"#).unwrap();
        let filter = query.into_filter(None, SortField::PriorityScore);
        assert_eq!(filter.sort, SortField::CreatedAt);
        assert_eq!(filter.order, SortOrder::Asc);
        assert_eq!(filter.status.as_deref(), Some("new"));
    }

    #[test]
    fn test_job_listing_defaults_to_relevancy() {
        let job_id = Uuid::new_v4();
        let filter = ListQuery::default().into_filter(Some(job_id), SortField::JobRelevancyScore);
        assert_eq!(filter.job_posting_id, Some(job_id));
        assert_eq!(filter.sort, SortField::JobRelevancyScore);
        assert_eq!(filter.order, SortOrder::Desc);
    }

    #[test]
    fn test_blank_status_filter_is_ignored() {
        let query = ListQuery {
            status: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(query.into_filter(None, SortField::PriorityScore).status, None);
    }
}
