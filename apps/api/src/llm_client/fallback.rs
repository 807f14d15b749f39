//! Structured-output fallback.
//!
//! Some models reject `response_format` outright. A request that asked for
//! structured output gets exactly one retry without it when, and only when,
//! the provider's error says the parameter itself was refused.

use serde_json::Value;
use tracing::{debug, warn};

use super::normalize::{parse_json_object, parse_json_value};
use super::{Completion, CompletionProvider, EvaluationRequest, LlmError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Structured,
    PlainRetry,
}

/// Runs `request`, falling back once to a plain request if the provider
/// refuses structured output. Any other error ends the call immediately.
pub async fn complete_with_fallback(
    provider: &dyn CompletionProvider,
    mut request: EvaluationRequest,
) -> Result<Completion, LlmError> {
    let mut attempt = Attempt::Structured;

    loop {
        match provider.complete(&request).await {
            Ok(completion) => {
                debug!(
                    "Completion finished on {:?} attempt ({} tokens)",
                    attempt, completion.usage.total_tokens
                );
                return Ok(completion);
            }
            Err(e)
                if attempt == Attempt::Structured
                    && request.wants_structured_output
                    && e.is_structured_output_rejection() =>
            {
                warn!(
                    "Model {} rejected structured output, retrying without it: {e}",
                    request.model
                );
                request.wants_structured_output = false;
                attempt = Attempt::PlainRetry;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Completion with fallback, normalized into JSON. A request that asked for
/// structured output must come back as a single object, even when the plain
/// retry answered it.
pub async fn complete_json_value(
    provider: &dyn CompletionProvider,
    request: EvaluationRequest,
) -> Result<Value, LlmError> {
    let structured = request.wants_structured_output;
    let completion = complete_with_fallback(provider, request).await?;
    if structured {
        parse_json_object(&completion.text)
    } else {
        parse_json_value(&completion.text)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Scripted provider shared by tests across the crate.

    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use crate::llm_client::{
        Completion, CompletionProvider, EvaluationRequest, LlmError, ProviderErrorKind, Usage,
    };

    /// Returns queued results in order and records every request it sees.
    #[derive(Default)]
    pub struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<String, LlmError>>>,
        pub seen: Mutex<Vec<EvaluationRequest>>,
    }

    impl ScriptedProvider {
        pub fn new(replies: Vec<Result<String, LlmError>>) -> Self {
            Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub fn replying(text: &str) -> Self {
            Self::new(vec![Ok(text.to_string())])
        }

        pub fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        pub fn last_user_message(&self) -> String {
            self.seen
                .lock()
                .unwrap()
                .last()
                .and_then(|r| r.messages.last().map(|m| m.content.clone()))
                .unwrap_or_default()
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedProvider {
        fn default_model(&self) -> &str {
            "gpt-4o-mini"
        }

        async fn complete(&self, request: &EvaluationRequest) -> Result<Completion, LlmError> {
            self.seen.lock().unwrap().push(request.clone());
            let next = self
                .replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Err(LlmError::EmptyContent));
            next.map(|text| Completion {
                text,
                usage: Usage::default(),
            })
        }
    }

    pub fn api_error(message: &str) -> LlmError {
        LlmError::Api {
            status: 400,
            kind: ProviderErrorKind::classify(400, None, None, message),
            message: message.to_string(),
        }
    }
}
