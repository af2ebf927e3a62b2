//! Applicant record persistence (PostgreSQL).

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::models::applicant::{ApplicantRow, ApplicantUpdate, NewApplicant, DEFAULT_STATUS};
use crate::models::job::JobPostingRow;

/// Relevancy score at or above which a job applicant counts as a high match.
pub const HIGH_MATCH_THRESHOLD: i32 = 70;

// ────────────────────────────────────────────────────────────────────────────
// Listing parameters
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    PriorityScore,
    CreatedAt,
    JobRelevancyScore,
}

impl SortField {
    /// Accepts camelCase and snake_case names; anything else yields `default`.
    pub fn parse(raw: Option<&str>, default: SortField) -> Self {
        match raw {
            Some("priorityScore" | "priority_score") => Self::PriorityScore,
            Some("createdAt" | "created_at") => Self::CreatedAt,
            Some("jobRelevancyScore" | "job_relevancy_score") => Self::JobRelevancyScore,
            _ => default,
        }
    }

    fn column(self) -> &'static str {
        match self {
            Self::PriorityScore => "priority_score",
            Self::CreatedAt => "created_at",
            Self::JobRelevancyScore => "job_relevancy_score",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    /// Only an explicit "asc" sorts ascending.
    pub fn parse(raw: Option<&str>) -> Self {
        match raw {
            Some(s) if s.eq_ignore_ascii_case("asc") => Self::Asc,
            _ => Self::Desc,
        }
    }

    fn keyword(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ApplicantFilter {
    pub job_posting_id: Option<Uuid>,
    pub status: Option<String>,
    pub sort: SortField,
    pub order: SortOrder,
}

fn order_by_clause(sort: SortField, order: SortOrder) -> String {
    format!(
        " ORDER BY {} {} NULLS LAST, created_at DESC",
        sort.column(),
        order.keyword()
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Queries
// ────────────────────────────────────────────────────────────────────────────

pub async fn insert_applicant(
    pool: &PgPool,
    applicant: &NewApplicant,
) -> Result<ApplicantRow, sqlx::Error> {
    let analysis = &applicant.analysis;
    let job = applicant.job_match.as_ref();
    let empty: Vec<String> = Vec::new();

    sqlx::query_as::<_, ApplicantRow>(
        r#"
        INSERT INTO applicants
            (name, email, phone, resume_file_key,
             priority_score, summary, key_skills, experience, education, highlights, concerns,
             job_posting_id, job_relevancy_score, job_match_summary,
             skill_matches, skill_gaps, strengths, recommendations, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19)
        RETURNING *
        "#,
    )
    .bind(&applicant.name)
    .bind(&applicant.email)
    .bind(&applicant.phone)
    .bind(&applicant.resume_file_key)
    .bind(analysis.priority_score)
    .bind(&analysis.summary)
    .bind(&analysis.key_skills)
    .bind(&analysis.experience)
    .bind(&analysis.education)
    .bind(&analysis.highlights)
    .bind(&analysis.concerns)
    .bind(job.map(|j| j.job_posting_id))
    .bind(job.map(|j| j.analysis.job_relevancy_score))
    .bind(job.map(|j| j.analysis.job_match_summary.clone()))
    .bind(job.map_or(&empty, |j| &j.analysis.skill_matches))
    .bind(job.map_or(&empty, |j| &j.analysis.skill_gaps))
    .bind(job.map_or(&empty, |j| &j.analysis.strengths))
    .bind(job.map_or(&empty, |j| &j.analysis.recommendations))
    .bind(DEFAULT_STATUS)
    .fetch_one(pool)
    .await
}

pub async fn get_applicant(pool: &PgPool, id: Uuid) -> Result<Option<ApplicantRow>, sqlx::Error> {
    sqlx::query_as::<_, ApplicantRow>("SELECT * FROM applicants WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn list_applicants(
    pool: &PgPool,
    filter: &ApplicantFilter,
) -> Result<Vec<ApplicantRow>, sqlx::Error> {
    let mut query: QueryBuilder<Postgres> = QueryBuilder::new("SELECT * FROM applicants WHERE TRUE");

    if let Some(job_posting_id) = filter.job_posting_id {
        query.push(" AND job_posting_id = ").push_bind(job_posting_id);
    }
    if let Some(status) = &filter.status {
        query.push(" AND status = ").push_bind(status.clone());
    }
    query.push(order_by_clause(filter.sort, filter.order));

    query.build_query_as::<ApplicantRow>().fetch_all(pool).await
}

/// Applies a partial update. Returns `None` when the applicant does not exist.
pub async fn update_applicant(
    pool: &PgPool,
    id: Uuid,
    update: &ApplicantUpdate,
) -> Result<Option<ApplicantRow>, sqlx::Error> {
    if update.is_empty() {
        return get_applicant(pool, id).await;
    }

    sqlx::query_as::<_, ApplicantRow>(
        r#"
        UPDATE applicants
        SET status = COALESCE($2, status),
            notes = COALESCE($3, notes),
            priority_score = COALESCE($4, priority_score),
            updated_at = now()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&update.status)
    .bind(&update.notes)
    .bind(update.priority_score)
    .fetch_optional(pool)
    .await
}

/// Removes an applicant. Returns the stored resume's object key, or `None`
/// when the applicant does not exist.
pub async fn delete_applicant(pool: &PgPool, id: Uuid) -> Result<Option<String>, sqlx::Error> {
    sqlx::query_scalar::<_, String>("DELETE FROM applicants WHERE id = $1 RETURNING resume_file_key")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn fetch_job_posting(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<JobPostingRow>, sqlx::Error> {
    sqlx::query_as::<_, JobPostingRow>(
        "SELECT id, title, description, requirements, status FROM job_postings WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

// ────────────────────────────────────────────────────────────────────────────
// Statistics
// ────────────────────────────────────────────────────────────────────────────

/// Counts and averages shared by both stats endpoints.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreSummary {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    /// Mean score rounded to one decimal; 0.0 when there are no rows.
    pub avg_score: f64,
    /// Rows scoring at or above `HIGH_MATCH_THRESHOLD`.
    pub high_matches: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicantStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub avg_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobApplicantStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub avg_relevancy_score: f64,
    pub high_matches: usize,
}

impl From<ScoreSummary> for ApplicantStats {
    fn from(summary: ScoreSummary) -> Self {
        Self {
            total: summary.total,
            by_status: summary.by_status,
            avg_score: summary.avg_score,
        }
    }
}

impl From<ScoreSummary> for JobApplicantStats {
    fn from(summary: ScoreSummary) -> Self {
        Self {
            total: summary.total,
            by_status: summary.by_status,
            avg_relevancy_score: summary.avg_score,
            high_matches: summary.high_matches,
        }
    }
}

/// Stats over every applicant, averaging the priority score.
pub async fn applicant_stats(pool: &PgPool) -> Result<ApplicantStats, sqlx::Error> {
    let rows: Vec<(String, Option<i32>)> =
        sqlx::query_as("SELECT status, priority_score FROM applicants")
            .fetch_all(pool)
            .await?;
    Ok(summarize(&rows).into())
}

/// Stats over one job's applicants, averaging the job relevancy score.
pub async fn job_applicant_stats(
    pool: &PgPool,
    job_posting_id: Uuid,
) -> Result<JobApplicantStats, sqlx::Error> {
    let rows: Vec<(String, Option<i32>)> = sqlx::query_as(
        "SELECT status, job_relevancy_score FROM applicants WHERE job_posting_id = $1",
    )
    .bind(job_posting_id)
    .fetch_all(pool)
    .await?;
    Ok(summarize(&rows).into())
}

/// Missing scores count as 0, matching how unscored rows are displayed.
pub fn summarize(rows: &[(String, Option<i32>)]) -> ScoreSummary {
    let mut by_status = BTreeMap::new();
    let mut score_sum: i64 = 0;
    let mut high_matches = 0;

    for (status, score) in rows {
        let score = score.unwrap_or(0);
        *by_status.entry(status.clone()).or_insert(0) += 1;
        score_sum += i64::from(score);
        if score >= HIGH_MATCH_THRESHOLD {
            high_matches += 1;
        }
    }

    let total = rows.len();
    let avg_score = if total > 0 {
        ((score_sum as f64 / total as f64) * 10.0).round() / 10.0
    } else {
        0.0
    };

    ScoreSummary {
        total,
        by_status,
        avg_score,
        high_matches,
    }
}
