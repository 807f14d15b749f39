//! Axum route handlers for the AI feature endpoints.

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::evaluation::analytics::{compute_pipeline_stats, hiring_insights};
use crate::evaluation::models::{Evaluation, JobContext, ResumeAnswer};
use crate::evaluation::service::{
    answer_resume_question, audit_bias, evaluate_resume, generate_interview_questions,
    match_jobs, write_cover_letter, DEFAULT_INTERVIEW_QUESTIONS, MAX_INTERVIEW_QUESTIONS,
};
use crate::jobs::queries::recent_jobs;
use crate::jobs::upload::{multipart_error, read_pdf};
use crate::screening::store::require_job;
use crate::state::AppState;
use crate::storage::extract::usable_text;

/// Job match considers at most this many of the newest postings.
pub const MAX_MATCH_JOBS: i64 = 20;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResumeScoreRequest {
    pub resume_text: String,
    pub job_id: Option<Uuid>,
    pub job_description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMatchRequest {
    pub resume_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverLetterRequest {
    pub resume_text: String,
    pub job_id: Uuid,
    pub tone: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewQuestionsRequest {
    pub job_id: Uuid,
    pub resume_text: Option<String>,
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct BiasCheckRequest {
    pub text: String,
}

fn require_text<'a>(field: &str, value: &'a str) -> Result<&'a str, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation(format!("{field} cannot be empty")));
    }
    Ok(trimmed)
}

fn question_count(count: Option<usize>) -> Result<usize, AppError> {
    match count {
        None => Ok(DEFAULT_INTERVIEW_QUESTIONS),
        Some(n) if (1..=MAX_INTERVIEW_QUESTIONS).contains(&n) => Ok(n),
        Some(_) => Err(AppError::Validation(format!(
            "count must be between 1 and {MAX_INTERVIEW_QUESTIONS}"
        ))),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/ai/resume-score
///
/// Scores a resume against a stored job, an ad-hoc description, or on its
/// own when neither is given.
pub async fn handle_resume_score(
    State(state): State<AppState>,
    Json(request): Json<ResumeScoreRequest>,
) -> Result<Json<Evaluation>, AppError> {
    let resume_text = require_text("resumeText", &request.resume_text)?;

    let job = match request.job_id {
        Some(job_id) => {
            let job = require_job(state.store.as_ref(), job_id).await?;
            Some(JobContext::from_job(&job).with_overrides(request.job_description, None, None))
        }
        None => request
            .job_description
            .filter(|d| !d.trim().is_empty())
            .map(|description| JobContext {
                description,
                ..JobContext::default()
            }),
    };

    let eval = evaluate_resume(state.llm.as_ref(), job.as_ref(), resume_text).await?;
    Ok(Json(Evaluation::ResumeScore(eval)))
}

/// POST /api/v1/ai/job-match
pub async fn handle_job_match(
    State(state): State<AppState>,
    Json(request): Json<JobMatchRequest>,
) -> Result<Json<Evaluation>, AppError> {
    let resume_text = require_text("resumeText", &request.resume_text)?;
    let jobs = recent_jobs(&state.db, MAX_MATCH_JOBS).await?;
    let result = match_jobs(state.llm.as_ref(), resume_text, &jobs).await?;
    Ok(Json(Evaluation::JobMatch(result)))
}

/// POST /api/v1/ai/cover-letter
pub async fn handle_cover_letter(
    State(state): State<AppState>,
    Json(request): Json<CoverLetterRequest>,
) -> Result<Json<Evaluation>, AppError> {
    let resume_text = require_text("resumeText", &request.resume_text)?;
    let job = require_job(state.store.as_ref(), request.job_id).await?;

    let letter = write_cover_letter(
        state.llm.as_ref(),
        job.id,
        &JobContext::from_job(&job),
        resume_text,
        request.tone.as_deref(),
    )
    .await?;
    Ok(Json(Evaluation::CoverLetter(letter)))
}

/// POST /api/v1/ai/interview-questions
pub async fn handle_interview_questions(
    State(state): State<AppState>,
    Json(request): Json<InterviewQuestionsRequest>,
) -> Result<Json<Evaluation>, AppError> {
    let count = question_count(request.count)?;
    let job = require_job(state.store.as_ref(), request.job_id).await?;
    let resume_text = request
        .resume_text
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let set = generate_interview_questions(
        state.llm.as_ref(),
        &JobContext::from_job(&job),
        resume_text,
        count,
    )
    .await?;
    Ok(Json(Evaluation::InterviewQuestions(set)))
}

/// POST /api/v1/ai/bias-check
pub async fn handle_bias_check(
    State(state): State<AppState>,
    Json(request): Json<BiasCheckRequest>,
) -> Result<Json<Evaluation>, AppError> {
    let text = require_text("text", &request.text)?;
    let audit = audit_bias(state.llm.as_ref(), text).await?;
    Ok(Json(Evaluation::BiasAudit(audit)))
}

/// GET /api/v1/ai/analytics/:job_id
///
/// Pipeline numbers are computed here; the model only comments on them.
pub async fn handle_analytics(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Evaluation>, AppError> {
    let job = require_job(state.store.as_ref(), job_id).await?;
    let candidates = state.store.candidates_for_job(job.id).await?;
    let stats = compute_pipeline_stats(&candidates);

    let insights =
        hiring_insights(state.llm.as_ref(), job.id, &JobContext::from_job(&job), stats).await?;
    Ok(Json(Evaluation::Analytics(insights)))
}

/// POST /api/v1/ai/resume-qa
///
/// Multipart form: `resume` (PDF) and `question`. The upload is only kept
/// for the duration of the request.
pub async fn handle_resume_qa(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Evaluation>, AppError> {
    let mut question = String::new();
    let mut resume = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "question" => question = field.text().await.map_err(multipart_error)?,
            "resume" => resume = Some(read_pdf(field).await?),
            _ => {}
        }
    }

    let question = require_text("question", &question)?;
    let resume = resume.ok_or_else(|| AppError::Validation("resume file is required".to_string()))?;

    let filename = state.storage.save(resume, "pdf").await?;
    let answer = answer_from_upload(&state, &filename, question).await;
    if let Err(e) = state.storage.delete(&filename).await {
        warn!("Could not remove temporary upload {filename}: {e}");
    }

    Ok(Json(Evaluation::ResumeAnswer(answer?)))
}

async fn answer_from_upload(
    state: &AppState,
    filename: &str,
    question: &str,
) -> Result<ResumeAnswer, AppError> {
    let data = state
        .storage
        .read(filename)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Upload {filename} disappeared")))?;
    let raw = match state.extractor.extract_text(data).await {
        Ok(raw) => raw,
        Err(e) => {
            warn!("Text extraction failed for {filename}: {e}");
            String::new()
        }
    };
    let resume_text = usable_text(&raw).ok_or_else(|| {
        AppError::Validation("No extractable text found in the uploaded resume".to_string())
    })?;

    Ok(answer_resume_question(state.llm.as_ref(), &resume_text, question).await?)
}
