pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::applicants::handlers;
use crate::state::AppState;

/// Room for multipart boundaries and the small text fields of the apply form.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        // Intake
        .route("/api/v1/applicants/upload", post(handlers::handle_upload))
        .route("/api/v1/jobs/:job_id/apply", post(handlers::handle_apply))
        // Applicant records
        .route("/api/v1/applicants", get(handlers::handle_list_applicants))
        .route(
            "/api/v1/applicants/stats",
            get(handlers::handle_applicant_stats),
        )
        .route(
            "/api/v1/applicants/:id",
            get(handlers::handle_get_applicant)
                .patch(handlers::handle_update_applicant)
                .delete(handlers::handle_delete_applicant),
        )
        .route(
            "/api/v1/jobs/:job_id/applicants",
            get(handlers::handle_list_job_applicants),
        )
        .route(
            "/api/v1/jobs/:job_id/applicants/stats",
            get(handlers::handle_job_applicant_stats),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}
