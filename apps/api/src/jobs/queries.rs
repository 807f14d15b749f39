use sqlx::PgPool;
use uuid::Uuid;

use crate::models::candidate::CandidateRow;
use crate::models::job::JobRow;

#[derive(Debug)]
pub struct NewJob {
    pub title: String,
    pub company: String,
    pub description: String,
    pub required_skills: Vec<String>,
    pub min_experience: Option<i32>,
    pub location: Option<String>,
}

pub async fn insert_job(db: &PgPool, job: &NewJob) -> Result<JobRow, sqlx::Error> {
    sqlx::query_as::<_, JobRow>(
        r#"
        INSERT INTO jobs (id, title, company, description, required_skills, min_experience, location)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(&job.title)
    .bind(&job.company)
    .bind(&job.description)
    .bind(&job.required_skills)
    .bind(job.min_experience)
    .bind(&job.location)
    .fetch_one(db)
    .await
}

/// Most recently posted jobs first.
pub async fn recent_jobs(db: &PgPool, limit: i64) -> Result<Vec<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs ORDER BY created_at DESC LIMIT $1")
        .bind(limit)
        .fetch_all(db)
        .await
}

pub async fn insert_candidate(
    db: &PgPool,
    job_id: Uuid,
    name: &str,
    email: &str,
    resume_file: &str,
) -> Result<CandidateRow, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>(
        r#"
        INSERT INTO candidates (id, job_id, name, email, resume_file)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(job_id)
    .bind(name)
    .bind(email)
    .bind(resume_file)
    .fetch_one(db)
    .await
}

/// Highest screening score first; unscreened candidates last.
pub async fn candidates_by_score(db: &PgPool, job_id: Uuid) -> Result<Vec<CandidateRow>, sqlx::Error> {
    sqlx::query_as::<_, CandidateRow>(
        r#"
        SELECT * FROM candidates
        WHERE job_id = $1
        ORDER BY ai_score DESC NULLS LAST, created_at
        "#,
    )
    .bind(job_id)
    .fetch_all(db)
    .await
}
