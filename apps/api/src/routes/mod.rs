pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::evaluation::handlers as ai;
use crate::jobs::handlers as jobs;
use crate::jobs::upload::MULTIPART_BODY_LIMIT;
use crate::screening::handlers as screening;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Jobs API
        .route("/api/v1/jobs", post(jobs::handle_create_job))
        .route("/api/v1/jobs/:id", get(jobs::handle_get_job))
        .route(
            "/api/v1/jobs/:id/apply",
            post(jobs::handle_apply).layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT)),
        )
        .route(
            "/api/v1/jobs/:id/candidates",
            get(jobs::handle_list_candidates),
        )
        // Screening API
        .route(
            "/api/v1/screening/keyword",
            post(screening::handle_keyword_screening),
        )
        .route("/api/v1/screening/ai", post(screening::handle_ai_screening))
        // AI feature API
        .route("/api/v1/ai/resume-score", post(ai::handle_resume_score))
        .route("/api/v1/ai/job-match", post(ai::handle_job_match))
        .route("/api/v1/ai/cover-letter", post(ai::handle_cover_letter))
        .route(
            "/api/v1/ai/interview-questions",
            post(ai::handle_interview_questions),
        )
        .route("/api/v1/ai/bias-check", post(ai::handle_bias_check))
        .route("/api/v1/ai/analytics/:job_id", get(ai::handle_analytics))
        .route(
            "/api/v1/ai/resume-qa",
            post(ai::handle_resume_qa).layer(DefaultBodyLimit::max(MULTIPART_BODY_LIMIT)),
        )
        .with_state(state)
}
