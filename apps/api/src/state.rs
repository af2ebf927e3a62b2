use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::analysis::ResumeAnalyzer;
use crate::config::Config;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub s3: S3Client,
    /// Owns the generative model client; built once at startup.
    pub analyzer: ResumeAnalyzer,
    pub config: Config,
}
