//! Sequential batch screening of every candidate for one job.
//!
//! One candidate's failure never aborts the batch: it is logged, recorded as
//! a terminal zero-score result and the loop moves on. Candidates are scored
//! one at a time to stay inside the provider's rate limits.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::candidate::CandidateRow;
use crate::models::job::JobRow;
use crate::screening::store::ScreeningStore;
use crate::screening::strategy::{ScreeningOutcome, ScreeningStrategy};
use crate::storage::extract::{usable_text, TextExtractor};
use crate::storage::ResumeStorage;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreeningStatus {
    Screened,
    NoResume,
    FileNotFound,
    NoExtractableText,
    Failed,
}

impl ScreeningStatus {
    fn concern(self) -> &'static str {
        match self {
            ScreeningStatus::Screened => "",
            ScreeningStatus::NoResume => "No resume uploaded",
            ScreeningStatus::FileNotFound => "Resume file not found",
            ScreeningStatus::NoExtractableText => "No extractable text in resume",
            ScreeningStatus::Failed => "Screening failed; please retry",
        }
    }

    /// Zero-score result for a candidate that could not be evaluated.
    fn terminal(self) -> (Self, ScreeningOutcome) {
        (self, ScreeningOutcome::rejected(self.concern()))
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateResult {
    pub candidate_id: Uuid,
    pub name: String,
    pub status: ScreeningStatus,
    #[serde(flatten)]
    pub outcome: ScreeningOutcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub success: bool,
    /// Candidates the strategy actually evaluated.
    pub screened: u32,
    pub results: Vec<CandidateResult>,
}

pub struct BatchScreener<'a> {
    store: &'a dyn ScreeningStore,
    storage: &'a dyn ResumeStorage,
    extractor: &'a dyn TextExtractor,
}

impl<'a> BatchScreener<'a> {
    pub fn new(
        store: &'a dyn ScreeningStore,
        storage: &'a dyn ResumeStorage,
        extractor: &'a dyn TextExtractor,
    ) -> Self {
        Self {
            store,
            storage,
            extractor,
        }
    }

    /// Screens every candidate of `job` with `strategy` and persists each
    /// result. Only loading the candidate list can fail the whole run.
    pub async fn run(
        &self,
        job: &JobRow,
        strategy: &dyn ScreeningStrategy,
    ) -> Result<BatchReport, AppError> {
        let candidates = self.store.candidates_for_job(job.id).await?;
        info!(
            "Screening {} candidates for job {} with {} backend",
            candidates.len(),
            job.id,
            strategy.backend()
        );

        let mut screened = 0;
        let mut results = Vec::with_capacity(candidates.len());

        for candidate in &candidates {
            let (status, outcome) = match self.screen_one(candidate, strategy).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("Screening candidate {} failed: {e}", candidate.id);
                    ScreeningStatus::Failed.terminal()
                }
            };

            if let Err(e) = self.store.save_outcome(candidate.id, &outcome).await {
                warn!("Could not save screening result for {}: {e}", candidate.id);
            }
            if status == ScreeningStatus::Screened {
                screened += 1;
            }

            results.push(CandidateResult {
                candidate_id: candidate.id,
                name: candidate.name.clone(),
                status,
                outcome,
            });
        }

        info!(
            "Screened {screened} of {} candidates for job {}",
            results.len(),
            job.id
        );
        Ok(BatchReport {
            success: true,
            screened,
            results,
        })
    }

    async fn screen_one(
        &self,
        candidate: &CandidateRow,
        strategy: &dyn ScreeningStrategy,
    ) -> Result<(ScreeningStatus, ScreeningOutcome), AppError> {
        let Some(file) = candidate
            .resume_file
            .as_deref()
            .filter(|f| !f.trim().is_empty())
        else {
            return Ok(ScreeningStatus::NoResume.terminal());
        };

        let Some(data) = self.storage.read(file).await? else {
            warn!("Resume file {file} for candidate {} is missing", candidate.id);
            return Ok(ScreeningStatus::FileNotFound.terminal());
        };

        let text = match self.extractor.extract_text(data).await {
            Ok(raw) => usable_text(&raw),
            Err(e) => {
                warn!("Text extraction failed for candidate {}: {e}", candidate.id);
                None
            }
        };
        let Some(text) = text else {
            return Ok(ScreeningStatus::NoExtractableText.terminal());
        };

        let outcome = strategy.evaluate(&text).await?;
        Ok((ScreeningStatus::Screened, outcome))
    }
}
