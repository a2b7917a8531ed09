//! Model callers
//!
//! [`ModelCaller`] is the seam between the orchestration patterns and the
//! LLM providers. [`HttpModelCaller`] speaks the OpenAI-compatible
//! `/chat/completions` protocol that Gemini, OpenAI and local servers share.

use crate::error::{AppError, AppResult, ModelCallError, UnavailableKind};
use crate::models::ModelHandle;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Longest provider error body kept in an error message
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Invokes one model with a single-turn prompt
#[async_trait]
pub trait ModelCaller: Send + Sync {
    async fn invoke(&self, handle: &ModelHandle, prompt: &str) -> Result<String, ModelCallError>;
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP caller for OpenAI-compatible endpoints
///
/// Status mapping: 404, 429 and 503 are reported as
/// [`ModelCallError::Unavailable`]; other non-2xx statuses, timeouts,
/// connection failures and unparseable bodies are generic failures.
#[derive(Debug, Clone)]
pub struct HttpModelCaller {
    client: reqwest::Client,
}

impl HttpModelCaller {
    pub fn new() -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    fn unavailable_kind(status: StatusCode) -> Option<UnavailableKind> {
        match status {
            StatusCode::NOT_FOUND => Some(UnavailableKind::NotFound),
            StatusCode::TOO_MANY_REQUESTS => Some(UnavailableKind::RateLimited),
            StatusCode::SERVICE_UNAVAILABLE => Some(UnavailableKind::Overloaded),
            _ => None,
        }
    }

    fn transport_error(handle: &ModelHandle, error: reqwest::Error) -> ModelCallError {
        if error.is_timeout() {
            ModelCallError::Timeout {
                model: handle.name().to_string(),
                timeout_seconds: handle.timeout().as_secs(),
            }
        } else {
            ModelCallError::Transport {
                model: handle.name().to_string(),
                message: error.to_string(),
            }
        }
    }
}

fn truncate(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_CHARS {
        let mut truncated: String = body.chars().take(MAX_ERROR_BODY_CHARS).collect();
        truncated.push_str("...");
        truncated
    } else {
        body.to_string()
    }
}

#[async_trait]
impl ModelCaller for HttpModelCaller {
    async fn invoke(&self, handle: &ModelHandle, prompt: &str) -> Result<String, ModelCallError> {
        let url = format!("{}/chat/completions", handle.base_url());
        let body = ChatCompletionRequest {
            model: handle.model(),
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: handle.max_tokens(),
            temperature: handle.temperature(),
        };

        tracing::debug!(
            model = %handle.name(),
            provider_model = %handle.model(),
            url = %url,
            prompt_chars = prompt.chars().count(),
            "Invoking model"
        );

        let mut request = self
            .client
            .post(&url)
            .timeout(handle.timeout())
            .json(&body);
        if let Some(key) = handle.api_key() {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Self::transport_error(handle, e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let detail = truncate(&text);

            tracing::warn!(
                model = %handle.name(),
                status = status.as_u16(),
                "Model returned error status"
            );

            return Err(match Self::unavailable_kind(status) {
                Some(kind) => ModelCallError::Unavailable {
                    model: handle.name().to_string(),
                    kind,
                    detail,
                },
                None => ModelCallError::Http {
                    model: handle.name().to_string(),
                    status: status.as_u16(),
                    body: detail,
                },
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                Self::transport_error(handle, e)
            } else {
                ModelCallError::MalformedResponse {
                    model: handle.name().to_string(),
                    detail: e.to_string(),
                }
            }
        })?;

        let choice = completion.choices.into_iter().next().ok_or_else(|| {
            ModelCallError::MalformedResponse {
                model: handle.name().to_string(),
                detail: "response contained no choices".to_string(),
            }
        })?;

        // Null content is an empty answer; the patterns decide what that means
        Ok(choice.message.content.unwrap_or_default())
    }
}
