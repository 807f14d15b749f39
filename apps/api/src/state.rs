use std::sync::Arc;

use sqlx::PgPool;

use crate::llm_client::CompletionProvider;
use crate::screening::batch::BatchScreener;
use crate::screening::store::ScreeningStore;
use crate::storage::extract::TextExtractor;
use crate::storage::ResumeStorage;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Completion backend. Default: OpenAiClient configured from env.
    pub llm: Arc<dyn CompletionProvider>,
    pub store: Arc<dyn ScreeningStore>,
    /// Uploaded resumes. Default: LocalResumeStorage under UPLOAD_DIR.
    pub storage: Arc<dyn ResumeStorage>,
    pub extractor: Arc<dyn TextExtractor>,
}

impl AppState {
    pub fn screener(&self) -> BatchScreener<'_> {
        BatchScreener::new(
            self.store.as_ref(),
            self.storage.as_ref(),
            self.extractor.as_ref(),
        )
    }
}
