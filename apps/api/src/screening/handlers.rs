//! Axum route handlers for the Screening API.

use axum::{extract::State, Json};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::models::JobContext;
use crate::screening::batch::BatchReport;
use crate::screening::keyword::KeywordScreening;
use crate::screening::store::require_job;
use crate::screening::strategy::AiScreening;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordScreeningRequest {
    #[serde(alias = "jobId")]
    pub jobid: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub min_score: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AiScreeningRequest {
    #[serde(alias = "jobId")]
    pub jobid: Option<String>,
    pub job_description: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub min_experience: Option<i32>,
}

/// Request-level check: runs before any candidate is touched.
pub fn parse_job_id(raw: Option<&str>) -> Result<Uuid, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::Validation("jobid is required".to_string()))?;
    Uuid::parse_str(raw).map_err(|_| AppError::Validation(format!("jobid '{raw}' is not a valid id")))
}

/// Builds the keyword strategy. A missing `minScore` is derived from the
/// skills left after normalization, not the raw list.
fn keyword_strategy(skills: &[String], min_score: Option<u32>) -> Result<KeywordScreening, AppError> {
    let strategy = KeywordScreening::new(skills, min_score.unwrap_or(0))?;
    if strategy.skills().is_empty() {
        return Err(AppError::Validation(
            "skills must contain at least one skill".to_string(),
        ));
    }
    Ok(match min_score {
        Some(_) => strategy,
        None => {
            let default_min = KeywordScreening::default_min_score(strategy.skills().len());
            strategy.with_min_score(default_min)
        }
    })
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/screening/keyword
///
/// Keyword screening of every candidate for a job. No LLM involved.
pub async fn handle_keyword_screening(
    State(state): State<AppState>,
    Json(request): Json<KeywordScreeningRequest>,
) -> Result<Json<BatchReport>, AppError> {
    let job_id = parse_job_id(request.jobid.as_deref())?;
    let strategy = keyword_strategy(&request.skills, request.min_score)?;
    info!(
        "Keyword screening job {job_id} on {} skills (min score {})",
        strategy.skills().len(),
        strategy.min_score()
    );

    let job = require_job(state.store.as_ref(), job_id).await?;
    let report = state.screener().run(&job, &strategy).await?;

    Ok(Json(report))
}

/// POST /api/v1/screening/ai
///
/// AI screening of every candidate for a job. The stored job description,
/// skills and minimum experience can be overridden for this run only.
pub async fn handle_ai_screening(
    State(state): State<AppState>,
    Json(request): Json<AiScreeningRequest>,
) -> Result<Json<BatchReport>, AppError> {
    let job_id = parse_job_id(request.jobid.as_deref())?;
    let job = require_job(state.store.as_ref(), job_id).await?;

    let context = JobContext::from_job(&job).with_overrides(
        request.job_description,
        request.required_skills,
        request.min_experience,
    );
    let strategy = AiScreening::new(state.llm.clone(), context);
    let report = state.screener().run(&job, &strategy).await?;

    Ok(Json(report))
}
