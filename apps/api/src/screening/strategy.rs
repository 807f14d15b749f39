//! Screening strategies: pluggable, trait-based scorers that turn one
//! resume into a `ScreeningOutcome`.
//!
//! `AiScreening` asks the LLM for a structured evaluation.
//! `KeywordScreening` (see `keyword.rs`) is the deterministic, no-LLM variant.
//! Both plug into the same `BatchScreener`, so per-candidate failure handling
//! is identical.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

use crate::errors::AppError;
use crate::evaluation::models::{JobContext, Recommendation};
use crate::evaluation::service::evaluate_resume;
use crate::llm_client::CompletionProvider;

/// AI scores at or above this are shortlisted.
pub const AI_SHORTLIST_THRESHOLD: u32 = 70;

// ────────────────────────────────────────────────────────────────────────────
// Output model (shared across all strategies)
// ────────────────────────────────────────────────────────────────────────────

/// The fixed set of AI-derived fields written back onto a candidate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreeningOutcome {
    pub score: u32,
    pub recommendation: Recommendation,
    pub strengths: Vec<String>,
    pub concerns: Vec<String>,
    pub shortlisted: bool,
}

impl ScreeningOutcome {
    /// Terminal zero-score result used whenever a candidate cannot be scored.
    pub fn rejected(reason: &str) -> Self {
        Self {
            score: 0,
            recommendation: Recommendation::Reject,
            strengths: vec![],
            concerns: vec![reason.to_string()],
            shortlisted: false,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to add a screening backend without touching the batch
/// screener or the handlers. Job context is captured at construction.
#[async_trait]
pub trait ScreeningStrategy: Send + Sync {
    /// Short label for logs: "ai" | "keyword".
    fn backend(&self) -> &'static str;

    async fn evaluate(&self, resume_text: &str) -> Result<ScreeningOutcome, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// AiScreening
// ────────────────────────────────────────────────────────────────────────────

pub struct AiScreening {
    provider: Arc<dyn CompletionProvider>,
    job: JobContext,
}

impl AiScreening {
    pub fn new(provider: Arc<dyn CompletionProvider>, job: JobContext) -> Self {
        Self { provider, job }
    }
}

#[async_trait]
impl ScreeningStrategy for AiScreening {
    fn backend(&self) -> &'static str {
        "ai"
    }

    async fn evaluate(&self, resume_text: &str) -> Result<ScreeningOutcome, AppError> {
        let eval = evaluate_resume(self.provider.as_ref(), Some(&self.job), resume_text).await?;

        Ok(ScreeningOutcome {
            score: eval.overall_score,
            recommendation: eval.recommendation,
            strengths: eval.strengths,
            concerns: eval.concerns,
            shortlisted: eval.overall_score >= AI_SHORTLIST_THRESHOLD,
        })
    }
}
