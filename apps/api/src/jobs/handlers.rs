//! Axum route handlers for the Jobs API.

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::queries::{candidates_by_score, insert_candidate, insert_job, NewJob};
use crate::jobs::upload::{multipart_error, read_pdf};
use crate::models::candidate::CandidateRow;
use crate::models::job::JobRow;
use crate::screening::store::require_job;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub min_experience: Option<i32>,
    pub location: Option<String>,
}

impl CreateJobRequest {
    fn validate(self) -> Result<NewJob, AppError> {
        for (field, value) in [
            ("title", &self.title),
            ("company", &self.company),
            ("description", &self.description),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::Validation(format!("{field} cannot be empty")));
            }
        }
        if self.min_experience.is_some_and(|y| y < 0) {
            return Err(AppError::Validation(
                "minExperience cannot be negative".to_string(),
            ));
        }

        let mut required_skills: Vec<String> = Vec::new();
        for skill in &self.required_skills {
            let skill = skill.trim().to_lowercase();
            if !skill.is_empty() && !required_skills.contains(&skill) {
                required_skills.push(skill);
            }
        }

        Ok(NewJob {
            title: self.title.trim().to_string(),
            company: self.company.trim().to_string(),
            description: self.description.trim().to_string(),
            required_skills,
            min_experience: self.min_experience,
            location: self
                .location
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    let new_job = request.validate()?;
    let job = insert_job(&state.db, &new_job).await?;
    info!("Created job {} ({})", job.id, job.title);
    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let job = require_job(state.store.as_ref(), job_id).await?;
    Ok(Json(job))
}

/// POST /api/v1/jobs/:id/apply
///
/// Multipart form: `name`, `email`, `resume` (PDF, max 10MB).
/// The resume is stored under a generated name before the candidate row is
/// created; if the insert fails the file is removed again.
pub async fn handle_apply(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<CandidateRow>), AppError> {
    let job = require_job(state.store.as_ref(), job_id).await?;

    let mut name = String::new();
    let mut email = String::new();
    let mut resume = None;
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => name = field.text().await.map_err(multipart_error)?,
            "email" => email = field.text().await.map_err(multipart_error)?,
            "resume" => resume = Some(read_pdf(field).await?),
            _ => {}
        }
    }

    let name = name.trim();
    let email = email.trim();
    if name.is_empty() {
        return Err(AppError::Validation("name is required".to_string()));
    }
    if !email.contains('@') {
        return Err(AppError::Validation("a valid email is required".to_string()));
    }
    let resume = resume.ok_or_else(|| AppError::Validation("resume file is required".to_string()))?;

    let resume_file = state.storage.save(resume, "pdf").await?;
    let candidate = match insert_candidate(&state.db, job.id, name, email, &resume_file).await {
        Ok(candidate) => candidate,
        Err(e) => {
            if let Err(cleanup) = state.storage.delete(&resume_file).await {
                warn!("Could not remove orphaned upload {resume_file}: {cleanup}");
            }
            return Err(e.into());
        }
    };

    info!("Candidate {} applied to job {}", candidate.id, job.id);
    Ok((StatusCode::CREATED, Json(candidate)))
}

/// GET /api/v1/jobs/:id/candidates
///
/// Candidates with their screening fields, best score first.
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Vec<CandidateRow>>, AppError> {
    let job = require_job(state.store.as_ref(), job_id).await?;
    let candidates = candidates_by_score(&state.db, job.id).await?;
    Ok(Json(candidates))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateJobRequest {
        serde_json::from_value(serde_json::json!({
            "title": " Backend Engineer ",
            "company": "Acme",
            "description": "Build APIs",
            "requiredSkills": ["Rust", " rust ", "", "Postgres"],
            "minExperience": 3,
            "location": "  "
        }))
        .unwrap()
    }

    #[test]
    fn test_create_job_normalizes_fields() {
        let job = request().validate().unwrap();
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.required_skills, vec!["rust", "postgres"]);
        assert_eq!(job.min_experience, Some(3));
        assert!(job.location.is_none());
    }

    #[test]
    fn test_create_job_rejects_blank_fields() {
        let mut req = request();
        req.company = "  ".to_string();
        let err = req.validate().unwrap_err();
        assert!(err.to_string().contains("company cannot be empty"));
    }

    #[test]
    fn test_create_job_rejects_negative_experience() {
        let mut req = request();
        req.min_experience = Some(-1);
        assert!(matches!(req.validate(), Err(AppError::Validation(_))));
    }
}
