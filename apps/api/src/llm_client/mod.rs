//! LLM client: the single point of entry for all chat-completion calls.
//!
//! ARCHITECTURAL RULE: No other module may call the provider API directly.
//! Feature code builds an `EvaluationRequest` and hands it to a
//! `CompletionProvider`, usually through `fallback::complete_json_value`.
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

pub mod fallback;
pub mod normalize;
pub mod prompts;

/// Models known to accept `response_format: {"type": "json_object"}`.
/// Matched as prefixes so dated snapshots (`gpt-4o-2024-08-06`) qualify.
const JSON_MODE_MODELS: &[&str] = &[
    "gpt-4o",
    "gpt-4.1",
    "gpt-4-turbo",
    "gpt-4-1106-preview",
    "gpt-4-0125-preview",
    "gpt-3.5-turbo-1106",
    "gpt-3.5-turbo-0125",
];

const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1500;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("AI service is not configured: {0}")]
    Configuration(String),

    #[error("Provider rejected credentials: {0}")]
    Authentication(String),

    #[error("Provider rate limit reached: {0}")]
    RateLimited(String),

    #[error("Provider unavailable (status {status})")]
    ServiceUnavailable { status: u16 },

    #[error("Completion did not finish within {0:?}")]
    Timeout(Duration),

    #[error("HTTP error: {0}")]
    Http(#[source] reqwest::Error),

    #[error("API error (status {status}, {kind:?}): {message}")]
    Api {
        status: u16,
        kind: ProviderErrorKind,
        message: String,
    },

    #[error("Model response is not valid JSON: {source}")]
    InvalidResponseFormat {
        raw: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("LLM returned empty content")]
    EmptyContent,
}

impl LlmError {
    /// True when the provider refused the structured-output parameter itself,
    /// as opposed to the request content.
    pub fn is_structured_output_rejection(&self) -> bool {
        matches!(
            self,
            LlmError::Api {
                kind: ProviderErrorKind::UnsupportedResponseFormat,
                ..
            }
        )
    }
}

/// Provider error classes the pipeline reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    /// The model does not accept `response_format`.
    UnsupportedResponseFormat,
    InvalidRequest,
    Other,
}

impl ProviderErrorKind {
    /// Classifies a non-2xx provider response from the error body's `param`,
    /// then its `code`, then the message text.
    pub fn classify(status: u16, param: Option<&str>, code: Option<&str>, message: &str) -> Self {
        if param == Some("response_format") {
            return ProviderErrorKind::UnsupportedResponseFormat;
        }
        if code.is_some_and(mentions_response_format) || mentions_response_format(message) {
            return ProviderErrorKind::UnsupportedResponseFormat;
        }
        match status {
            400 | 404 | 422 => ProviderErrorKind::InvalidRequest,
            _ => ProviderErrorKind::Other,
        }
    }
}

fn mentions_response_format(text: &str) -> bool {
    let lower = text.to_lowercase();
    lower.contains("response_format") || lower.contains("json_object") || lower.contains("json_mode")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// One completion call. Built fresh per call and never persisted.
#[derive(Debug, Clone)]
pub struct EvaluationRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub wants_structured_output: bool,
}

impl EvaluationRequest {
    /// A structured-output request with the default sampling settings.
    pub fn new(messages: Vec<ChatMessage>, model: impl Into<String>) -> Self {
        Self {
            messages,
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            wants_structured_output: true,
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self
    }

    pub fn plain_text(mut self) -> Self {
        self.wants_structured_output = false;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u32,
    #[serde(default)]
    pub completion_tokens: u32,
    #[serde(default)]
    pub total_tokens: u32,
}

#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Usage,
}

/// Anything that can turn an `EvaluationRequest` into completion text.
///
/// Carried in `AppState` as `Arc<dyn CompletionProvider>` so handlers and
/// tests can swap the backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Model used when a feature does not ask for a specific one.
    fn default_model(&self) -> &str;

    async fn complete(&self, request: &EvaluationRequest) -> Result<Completion, LlmError>;
}

pub fn supports_json_mode(model: &str) -> bool {
    JSON_MODE_MODELS.iter().any(|m| model.starts_with(m)) || model == "gpt-3.5-turbo"
}

#[derive(Debug, Serialize)]
struct ChatCompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAiError {
    error: OpenAiErrorBody,
}

#[derive(Debug, Deserialize)]
struct OpenAiErrorBody {
    message: String,
    #[serde(default)]
    param: Option<String>,
    /// A string for OpenAI, sometimes a number for compatible providers.
    #[serde(default)]
    code: Option<serde_json::Value>,
}

/// OpenAI-compatible chat-completions client.
#[derive(Clone)]
pub struct OpenAiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    timeout: Duration,
}

impl OpenAiClient {
    pub fn new(
        api_key: Option<String>,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, LlmError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(LlmError::Http)?;

        Ok(Self {
            client,
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            timeout,
        })
    }

    fn build_body<'a>(&self, request: &'a EvaluationRequest) -> ChatCompletionBody<'a> {
        let json_mode = request.wants_structured_output && supports_json_mode(&request.model);
        if request.wants_structured_output && !json_mode {
            debug!(
                "Model {} is not known to support JSON mode; sending without response_format",
                request.model
            );
        }

        ChatCompletionBody {
            model: &request.model,
            messages: &request.messages,
            temperature: request.temperature,
            max_tokens: request.max_output_tokens,
            response_format: json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> LlmError {
        if e.is_timeout() {
            LlmError::Timeout(self.timeout)
        } else {
            LlmError::Http(e)
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiClient {
    fn default_model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, request: &EvaluationRequest) -> Result<Completion, LlmError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| LlmError::Configuration("OPENAI_API_KEY is not set".to_string()))?;

        let body = self.build_body(request);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.map_err(|e| self.transport_error(e))?;
            return Err(classify_failure(status.as_u16(), &text));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| self.transport_error(e))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|t| !t.trim().is_empty())
            .ok_or(LlmError::EmptyContent)?;
        let usage = parsed.usage.unwrap_or_default();

        info!(
            model = %request.model,
            prompt_tokens = usage.prompt_tokens,
            completion_tokens = usage.completion_tokens,
            total_tokens = usage.total_tokens,
            "LLM token usage"
        );

        Ok(Completion { text, usage })
    }
}

/// Maps a non-2xx provider response onto the error taxonomy.
fn classify_failure(status: u16, body: &str) -> LlmError {
    let (message, param, code) = match serde_json::from_str::<OpenAiError>(body) {
        Ok(e) => {
            let code = e.error.code.and_then(|c| c.as_str().map(str::to_string));
            (e.error.message, e.error.param, code)
        }
        Err(_) => (body.to_string(), None, None),
    };

    match status {
        401 => LlmError::Authentication(message),
        429 => LlmError::RateLimited(message),
        s if s >= 500 => LlmError::ServiceUnavailable { status: s },
        s => LlmError::Api {
            status: s,
            kind: ProviderErrorKind::classify(s, param.as_deref(), code.as_deref(), &message),
            message,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn client_for(server: &mockito::ServerGuard, model: &str) -> OpenAiClient {
        OpenAiClient::new(
            Some("sk-test".to_string()),
            server.url(),
            model,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn request(model: &str) -> EvaluationRequest {
        EvaluationRequest::new(
            vec![ChatMessage::system("sys"), ChatMessage::user("hello")],
            model,
        )
    }

    #[test]
    fn test_json_mode_allow_list() {
        assert!(supports_json_mode("gpt-4o-mini"));
        assert!(supports_json_mode("gpt-4o-2024-08-06"));
        assert!(supports_json_mode("gpt-3.5-turbo"));
        assert!(!supports_json_mode("gpt-4"));
        assert!(!supports_json_mode("o1-preview"));
    }

    #[test]
    fn test_body_omits_response_format_for_unsupported_model() {
        let client =
            OpenAiClient::new(None, "http://localhost", "gpt-4", Duration::from_secs(1)).unwrap();
        let req = request("gpt-4");
        let body = serde_json::to_value(client.build_body(&req)).unwrap();
        assert!(body.get("response_format").is_none());
        assert_eq!(body["messages"][0]["role"], "system");
    }

    #[test]
    fn test_body_omits_response_format_for_plain_request() {
        let client =
            OpenAiClient::new(None, "http://localhost", "gpt-4o", Duration::from_secs(1)).unwrap();
        let req = request("gpt-4o").plain_text();
        let body = serde_json::to_value(client.build_body(&req)).unwrap();
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_classify_uses_param_before_message() {
        assert_eq!(
            ProviderErrorKind::classify(400, Some("response_format"), None, "bad value"),
            ProviderErrorKind::UnsupportedResponseFormat
        );
        assert_eq!(
            ProviderErrorKind::classify(
                400,
                None,
                None,
                "'json_object' is not supported with this model"
            ),
            ProviderErrorKind::UnsupportedResponseFormat
        );
        assert_eq!(
            ProviderErrorKind::classify(400, Some("messages"), None, "messages too long"),
            ProviderErrorKind::InvalidRequest
        );
        assert_eq!(
            ProviderErrorKind::classify(403, None, None, "forbidden"),
            ProviderErrorKind::Other
        );
    }

    #[test]
    fn test_classify_consults_code() {
        assert_eq!(
            ProviderErrorKind::classify(400, None, Some("json_mode_not_supported"), "bad request"),
            ProviderErrorKind::UnsupportedResponseFormat
        );
        assert_eq!(
            ProviderErrorKind::classify(400, None, Some("context_length_exceeded"), "too long"),
            ProviderErrorKind::InvalidRequest
        );
    }

    #[test]
    fn test_classify_failure_reads_code_from_body() {
        let body = json!({"error": {
            "message": "This model cannot do that.",
            "param": null,
            "code": "json_mode_not_supported"
        }})
        .to_string();
        assert!(classify_failure(400, &body).is_structured_output_rejection());

        // numeric codes are ignored rather than breaking the parse
        let body = json!({"error": {"message": "quota", "code": 1102}}).to_string();
        assert!(matches!(
            classify_failure(400, &body),
            LlmError::Api { kind: ProviderErrorKind::InvalidRequest, message, .. } if message == "quota"
        ));
    }

    #[tokio::test]
    async fn test_unresponsive_provider_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
            drop(socket);
        });

        let timeout = Duration::from_millis(300);
        let client =
            OpenAiClient::new(Some("sk-test".to_string()), format!("http://{addr}"), "gpt-4o", timeout)
                .unwrap();
        let err = client.complete(&request("gpt-4o")).await.unwrap_err();

        assert!(matches!(err, LlmError::Timeout(d) if d == timeout));
        hold.abort();
    }

    #[tokio::test]
    async fn test_stalled_error_body_times_out() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4096];
            let _ = socket.read(&mut buf).await;
            socket
                .write_all(b"HTTP/1.1 400 Bad Request\r\ncontent-length: 512\r\n\r\n{\"error\":")
                .await
                .unwrap();
            tokio::time::sleep(Duration::from_secs(30)).await;
        });

        let timeout = Duration::from_millis(300);
        let client =
            OpenAiClient::new(Some("sk-test".to_string()), format!("http://{addr}"), "gpt-4o", timeout)
                .unwrap();
        let err = client.complete(&request("gpt-4o")).await.unwrap_err();

        assert!(matches!(err, LlmError::Timeout(_)), "got {err:?}");
        hold.abort();
    }

    #[tokio::test]
    async fn test_missing_api_key_is_configuration_error() {
        let client =
            OpenAiClient::new(None, "http://localhost:1", "gpt-4o", Duration::from_secs(1))
                .unwrap();
        let err = client.complete(&request("gpt-4o")).await.unwrap_err();
        assert!(matches!(err, LlmError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_successful_completion_returns_text_and_usage() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(json!({
                "model": "gpt-4o-mini",
                "response_format": {"type": "json_object"}
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                json!({
                    "choices": [{"message": {"role": "assistant", "content": "{\"ok\":true}"}}],
                    "usage": {"prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15}
                })
                .to_string(),
            )
            .create_async()
            .await;

        let client = client_for(&server, "gpt-4o-mini");
        let completion = client.complete(&request("gpt-4o-mini")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(completion.text, "{\"ok\":true}");
        assert_eq!(completion.usage.total_tokens, 15);
    }

    #[tokio::test]
    async fn test_401_maps_to_authentication() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body(json!({"error": {"message": "Incorrect API key provided"}}).to_string())
            .create_async()
            .await;

        let err = client_for(&server, "gpt-4o")
            .complete(&request("gpt-4o"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::Authentication(m) if m.contains("Incorrect API key")));
    }

    #[tokio::test]
    async fn test_429_maps_to_rate_limited() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(429)
            .with_body("slow down")
            .create_async()
            .await;

        let err = client_for(&server, "gpt-4o")
            .complete(&request("gpt-4o"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_5xx_maps_to_service_unavailable() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(503)
            .create_async()
            .await;

        let err = client_for(&server, "gpt-4o")
            .complete(&request("gpt-4o"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::ServiceUnavailable { status: 503 }));
    }

    #[tokio::test]
    async fn test_response_format_rejection_is_classified() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(400)
            .with_body(
                json!({"error": {
                    "message": "Invalid parameter: 'response_format' of type 'json_object' is not supported with this model.",
                    "param": "response_format",
                    "code": null
                }})
                .to_string(),
            )
            .create_async()
            .await;

        let err = client_for(&server, "gpt-4o")
            .complete(&request("gpt-4o"))
            .await
            .unwrap_err();
        assert!(err.is_structured_output_rejection());
    }

    #[tokio::test]
    async fn test_empty_choices_is_empty_content() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(json!({"choices": []}).to_string())
            .create_async()
            .await;

        let err = client_for(&server, "gpt-4o")
            .complete(&request("gpt-4o"))
            .await
            .unwrap_err();
        assert!(matches!(err, LlmError::EmptyContent));
    }
}
