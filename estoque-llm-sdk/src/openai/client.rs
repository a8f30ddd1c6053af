use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use std::time::Duration;

use crate::{
    error::LlmError,
    models,
    openai::types::{
        OpenAIChatCompletionRequest, OpenAIChatCompletionResponse, OpenAIErrorResponse,
        OpenAIMessage, OpenAIRole,
    },
    types::{CompletionRequest, CompletionResponse, ContentBlock, Role, Usage},
};

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(500);

/// OpenAI LLM client
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    model: String,
    max_retries: u32,
    retry_delay: Duration,
    http_client: reqwest::Client,
}

impl OpenAIClient {
    /// Create a new OpenAI client with the given API key
    pub fn new(api_key: impl Into<String>) -> Result<Self, LlmError> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(LlmError::authentication("API key cannot be empty"));
        }

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(300)) // 5 minute timeout
            .build()
            .map_err(|e| LlmError::Network { source: e })?;

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: models::openai::GPT_4O_ID.to_string(),
            max_retries: 0,
            retry_delay: DEFAULT_RETRY_DELAY,
            http_client,
        })
    }

    /// Set a custom base URL for the API
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model this client completes with
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Retry transient failures up to `max_retries` extra times
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base delay of the exponential backoff between retries
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Create a chat completion, retrying transient failures
    pub async fn create_chat_completion(
        &self,
        request: OpenAIChatCompletionRequest,
    ) -> Result<OpenAIChatCompletionResponse, LlmError> {
        let mut attempt = 0;
        loop {
            match self.send_chat_completion(&request).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = e
                        .retry_after()
                        .unwrap_or_else(|| self.retry_delay * 2u32.saturating_pow(attempt));
                    attempt += 1;
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_retries = self.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        "Transient OpenAI error, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn send_chat_completion(
        &self,
        request: &OpenAIChatCompletionRequest,
    ) -> Result<OpenAIChatCompletionResponse, LlmError> {
        let url = format!("{}/v1/chat/completions", self.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                .map_err(|_| LlmError::authentication("Invalid API key format"))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await
            .map_err(|e| LlmError::Network { source: e })?;

        let status = response.status();

        if status.is_success() {
            let openai_response: OpenAIChatCompletionResponse = response
                .json()
                .await
                .map_err(|e| LlmError::internal(format!("Failed to parse response: {}", e)))?;
            return Ok(openai_response);
        }

        // Extract retry-after header before consuming the response
        let retry_after = if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            response
                .headers()
                .get("retry-after")
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
        } else {
            None
        };

        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let message = serde_json::from_str::<OpenAIErrorResponse>(&error_text)
            .map(|error_response| error_response.error.message)
            .unwrap_or(error_text);

        Err(map_error_status(status, message, retry_after))
    }
}

fn map_error_status(
    status: reqwest::StatusCode,
    message: String,
    retry_after: Option<u64>,
) -> LlmError {
    match status {
        reqwest::StatusCode::BAD_REQUEST => LlmError::invalid_request(message),
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            LlmError::authentication(message)
        }
        reqwest::StatusCode::PAYLOAD_TOO_LARGE => LlmError::invalid_request("Request too large"),
        reqwest::StatusCode::TOO_MANY_REQUESTS => LlmError::rate_limit(message, retry_after),
        _ => LlmError::api_error(status.as_u16(), message),
    }
}

impl OpenAIChatCompletionResponse {
    /// Get the content of the first choice
    pub fn content(&self) -> &str {
        self.choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or("")
    }
}

#[async_trait]
impl crate::client::LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let mut openai_messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = request.system {
            openai_messages.push(OpenAIMessage::system(system));
        }
        for msg in request.messages {
            let role = match msg.role {
                Role::User => OpenAIRole::User,
                Role::Assistant => OpenAIRole::Assistant,
                Role::System => OpenAIRole::System,
            };
            openai_messages.push(OpenAIMessage::new(role, msg.text_content()));
        }

        let openai_request = OpenAIChatCompletionRequest {
            model: request.model,
            messages: openai_messages,
            max_tokens: None, // Use max_completion_tokens instead
            max_completion_tokens: Some(request.max_tokens),
            temperature: request.temperature,
            top_p: request.top_p,
            stop: request.stop_sequences,
            stream: None,
        };

        let openai_response = self.create_chat_completion(openai_request).await?;

        let choice = openai_response
            .choices
            .first()
            .ok_or_else(|| LlmError::internal("No completion choices returned"))?;

        let usage = openai_response.usage.clone().unwrap_or_default();

        Ok(CompletionResponse {
            content: vec![ContentBlock::Text {
                text: choice.message.content.clone().unwrap_or_default(),
            }],
            role: Role::Assistant,
            usage: Usage {
                input_tokens: usage.prompt_tokens,
                output_tokens: usage.completion_tokens,
            },
            stop_reason: choice.finish_reason.clone(),
        })
    }

    fn provider_name(&self) -> &str {
        crate::providers::OPENAI
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
