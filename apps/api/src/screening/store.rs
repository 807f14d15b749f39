//! Persistence boundary for screening: load the job and its candidates,
//! write back one outcome per candidate.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::CandidateRow;
use crate::models::job::JobRow;
use crate::screening::strategy::ScreeningOutcome;

#[async_trait]
pub trait ScreeningStore: Send + Sync {
    async fn find_job(&self, job_id: Uuid) -> Result<Option<JobRow>, AppError>;

    /// Candidates in application order.
    async fn candidates_for_job(&self, job_id: Uuid) -> Result<Vec<CandidateRow>, AppError>;

    /// Overwrites the candidate's AI fields and stamps `screened_at`.
    async fn save_outcome(
        &self,
        candidate_id: Uuid,
        outcome: &ScreeningOutcome,
    ) -> Result<(), AppError>;
}

/// Loads a job or fails with `NotFound`.
pub async fn require_job(store: &dyn ScreeningStore, job_id: Uuid) -> Result<JobRow, AppError> {
    store
        .find_job(job_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {job_id} not found")))
}

pub struct PgScreeningStore {
    pool: PgPool,
}

impl PgScreeningStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ScreeningStore for PgScreeningStore {
    async fn find_job(&self, job_id: Uuid) -> Result<Option<JobRow>, AppError> {
        let job = sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(job)
    }

    async fn candidates_for_job(&self, job_id: Uuid) -> Result<Vec<CandidateRow>, AppError> {
        let candidates = sqlx::query_as::<_, CandidateRow>(
            "SELECT * FROM candidates WHERE job_id = $1 ORDER BY created_at, id",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(candidates)
    }

    async fn save_outcome(
        &self,
        candidate_id: Uuid,
        outcome: &ScreeningOutcome,
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            UPDATE candidates
            SET ai_score = $2,
                ai_recommendation = $3,
                ai_strengths = $4,
                ai_concerns = $5,
                shortlisted = $6,
                screened_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(candidate_id)
        .bind(outcome.score as i32)
        .bind(outcome.recommendation.as_str())
        .bind(&outcome.strengths)
        .bind(&outcome.concerns)
        .bind(outcome.shortlisted)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
