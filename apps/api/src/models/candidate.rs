use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// An application to a job. The `ai_*` columns, `shortlisted` and
/// `screened_at` are owned by the batch screener; everything else is set
/// once on application submission.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRow {
    pub id: Uuid,
    pub job_id: Uuid,
    pub name: String,
    pub email: String,
    pub resume_file: Option<String>,
    pub ai_score: Option<i32>,
    pub ai_recommendation: Option<String>,
    pub ai_strengths: Vec<String>,
    pub ai_concerns: Vec<String>,
    pub shortlisted: bool,
    pub screened_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
