use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::analysis::JobContext;

/// The slice of a job posting the application pipeline reads.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobPostingRow {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub requirements: Option<String>,
    pub status: String,
}

impl JobPostingRow {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }

    pub fn context(&self) -> JobContext<'_> {
        JobContext {
            title: &self.title,
            requirements: self.requirements.as_deref(),
            description: self.description.as_deref(),
        }
    }
}
