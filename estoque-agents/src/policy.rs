//! Reasoning-policy templates for the ReAct agent.
//!
//! The template is resolved once at startup, either pulled from the LangChain
//! hub, read from disk, or taken from the copy compiled into the crate.

use crate::prompt::{PromptTemplate, TemplateError};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_HUB_URL: &str = "https://api.hub.langchain.com";
pub const DEFAULT_HANDLE: &str = "hwchase17/react";

/// Variables every reasoning-policy template must use
pub const REQUIRED_VARIABLES: [&str; 4] = ["tools", "tool_names", "input", "agent_scratchpad"];

/// The canonical ReAct template
pub const REACT_TEMPLATE: &str = "Answer the following questions as best you can. You have access to the following tools:

{tools}

Use the following format:

Question: the input question you must answer
Thought: you should always think about what to do
Action: the action to take, should be one of [{tool_names}]
Action Input: the input to the action
Observation: the result of the action
... (this Thought/Action/Action Input/Observation can repeat N times)
Thought: I now know the final answer
Final Answer: the final answer to the original input question

Begin!

Question: {input}
Thought:{agent_scratchpad}";

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Hub request failed with status {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Hub request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid prompt handle '{0}', expected <owner>/<repo>")]
    InvalidHandle(String),

    #[error("Invalid hub manifest: {0}")]
    InvalidManifest(String),

    #[error("Template is missing required variables: {}", .0.join(", "))]
    MissingVariables(Vec<String>),

    #[error("Invalid template: {0}")]
    Template(#[from] TemplateError),

    #[error("Failed to read template: {0}")]
    Io(#[from] std::io::Error),
}

impl PolicyError {
    /// Whether retrying the fetch may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            PolicyError::Http { status, .. } => *status == 429 || *status >= 500,
            PolicyError::Network(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            _ => false,
        }
    }
}

/// Where the reasoning-policy template comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicySource {
    Hub { hub_url: String, handle: String },
    File(PathBuf),
    Builtin,
}

impl Default for PolicySource {
    fn default() -> Self {
        PolicySource::Hub {
            hub_url: DEFAULT_HUB_URL.to_string(),
            handle: DEFAULT_HANDLE.to_string(),
        }
    }
}

impl std::fmt::Display for PolicySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PolicySource::Hub { hub_url, handle } => write!(f, "hub:{} ({})", handle, hub_url),
            PolicySource::File(path) => write!(f, "file:{}", path.display()),
            PolicySource::Builtin => write!(f, "builtin"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ReasoningPolicy {
    template: PromptTemplate,
    origin: String,
}

impl ReasoningPolicy {
    pub fn builtin() -> Result<Self, PolicyError> {
        Self::from_template(REACT_TEMPLATE, "builtin")
    }

    /// Parse a template and check that it uses every required variable
    pub fn from_template(text: &str, origin: impl Into<String>) -> Result<Self, PolicyError> {
        let template = PromptTemplate::parse(text)?;
        let variables = template.input_variables();

        let missing: Vec<String> = REQUIRED_VARIABLES
            .iter()
            .filter(|required| !variables.iter().any(|v| v == *required))
            .map(|required| required.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(PolicyError::MissingVariables(missing));
        }

        Ok(Self {
            template,
            origin: origin.into(),
        })
    }

    pub async fn load(source: &PolicySource, max_retries: u32) -> Result<Self, PolicyError> {
        match source {
            PolicySource::Hub { hub_url, handle } => {
                let hub = HubClient::new(hub_url)?.with_max_retries(max_retries);
                let text = hub.pull(handle).await?;
                Self::from_template(&text, format!("hub:{}", handle))
            }
            PolicySource::File(path) => {
                let text = tokio::fs::read_to_string(path).await?;
                Self::from_template(&text, format!("file:{}", path.display()))
            }
            PolicySource::Builtin => Self::builtin(),
        }
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }
}

#[derive(Debug, Deserialize)]
struct CommitResponse {
    manifest: Value,
}

/// Minimal client for the LangChain prompt hub
pub struct HubClient {
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
    http_client: reqwest::Client,
}

impl HubClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, PolicyError> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            max_retries: 0,
            retry_delay: Duration::from_millis(500),
            http_client,
        })
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Fetch the latest commit of `owner/repo` and return its template text
    pub async fn pull(&self, handle: &str) -> Result<String, PolicyError> {
        let (owner, repo) = handle
            .split_once('/')
            .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'))
            .ok_or_else(|| PolicyError::InvalidHandle(handle.to_string()))?;

        let url = format!("{}/commits/{}/{}/latest", self.base_url, owner, repo);

        let mut attempt = 0;
        loop {
            match self.fetch_manifest(&url).await {
                Ok(manifest) => return template_from_manifest(&manifest),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    let delay = self.retry_delay * 2u32.saturating_pow(attempt);
                    tracing::warn!(
                        handle,
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "Retrying hub fetch"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn fetch_manifest(&self, url: &str) -> Result<Value, PolicyError> {
        let response = self.http_client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PolicyError::Http {
                status: status.as_u16(),
                message,
            });
        }

        let commit: CommitResponse = response.json().await?;
        Ok(commit.manifest)
    }
}

/// Extract the template text from a serialized `PromptTemplate` manifest
pub fn template_from_manifest(manifest: &Value) -> Result<String, PolicyError> {
    let kwargs = manifest
        .get("kwargs")
        .ok_or_else(|| PolicyError::InvalidManifest("missing 'kwargs'".to_string()))?;

    if let Some(format) = kwargs.get("template_format").and_then(Value::as_str) {
        if format != "f-string" {
            return Err(PolicyError::InvalidManifest(format!(
                "unsupported template format '{}'",
                format
            )));
        }
    }

    kwargs
        .get("template")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| PolicyError::InvalidManifest("missing 'kwargs.template'".to_string()))
}
