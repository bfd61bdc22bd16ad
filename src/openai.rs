use crate::config::Config;
use crate::error::CompareError;
use crate::prompt::{compose, ComparisonRequest};
use anyhow::anyhow;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{error, info};

const COMPLETION_TIMEOUT: Duration = Duration::from_secs(120);
const EMPTY_RESULT_PLACEHOLDER: &str = "No comparison generated";

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<Message>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

/// Error body shape returned by the OpenAI API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    code: Option<String>,
}

/// Invoker for the comparison model. Constructed once at startup with its
/// configuration; no module-level singleton.
#[derive(Debug, Clone)]
pub struct OpenAiService {
    client: reqwest::Client,
    config: Config,
}

impl OpenAiService {
    pub fn new(client: reqwest::Client, config: Config) -> Self {
        Self { client, config }
    }

    /// Generate a cross-language comparison for the given request.
    ///
    /// Never retries: every provider failure is classified once into a
    /// user-presentable `CompareError` and returned to the caller, who
    /// decides whether to re-invoke.
    pub async fn compare_articles(
        &self,
        request: &ComparisonRequest,
    ) -> Result<String, CompareError> {
        if request.articles.is_empty() {
            return Err(CompareError::InsufficientContent);
        }

        let api_key = self
            .config
            .openai_api_key
            .as_deref()
            .ok_or(CompareError::Configuration)?;

        for (lang, content) in &request.articles {
            info!("Comparing {}: {} characters", lang, content.chars().count());
        }

        let prompt = compose(request);
        let chat_request = ChatRequest {
            model: self.config.openai_model.clone(),
            messages: vec![
                Message {
                    role: "system".to_string(),
                    content: prompt.system,
                },
                Message {
                    role: "user".to_string(),
                    content: prompt.user,
                },
            ],
            max_tokens: self.config.max_output_tokens,
            temperature: self.config.temperature,
        };

        let url = format!("{}/v1/chat/completions", self.config.openai_api_base);
        let response = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .header("Content-Type", "application/json")
            .json(&chat_request)
            .timeout(COMPLETION_TIMEOUT)
            .send()
            .await
            .map_err(|err| {
                error!("OpenAI request failed: {}", err);
                CompareError::GenerationFailed(anyhow!(err))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_api_error(status, &body));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|err| {
            error!("Failed to parse OpenAI response: {}", err);
            CompareError::GenerationFailed(anyhow!(err))
        })?;

        let comparison = chat_response
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .unwrap_or_else(|| EMPTY_RESULT_PLACEHOLDER.to_string());

        Ok(comparison)
    }
}

/// Map a non-success provider response to the comparison error taxonomy.
fn classify_api_error(status: StatusCode, body: &str) -> CompareError {
    if let Ok(parsed) = serde_json::from_str::<ApiErrorResponse>(body) {
        if parsed.error.code.as_deref() == Some("rate_limit_exceeded") {
            // Token-budget rate limits mean the input was too big, not that
            // the user is calling too often; advise accordingly.
            return if parsed.error.kind.as_deref() == Some("tokens") {
                CompareError::ArticlesTooLarge
            } else {
                CompareError::RateLimited
            };
        }
        error!("OpenAI API error ({}): {}", status, parsed.error.message);
    } else {
        error!("OpenAI API error ({}): {}", status, body);
    }

    match status {
        StatusCode::TOO_MANY_REQUESTS => CompareError::ServiceOverloaded,
        StatusCode::UNAUTHORIZED => CompareError::Authentication,
        _ => CompareError::GenerationFailed(anyhow!("OpenAI API error ({}): {}", status, body)),
    }
}
