use crate::config::{AgentConfig, AppConfig};
use estoque_agents::error::ExecutorError;
use estoque_agents::prompt::TemplateError;
use estoque_agents::types::{QueryState, QueryTracker};
use estoque_agents::{
    format_inventory_prompt, AgentExecutor, AgentOutcome, ReactAgent, ReasoningPolicy, SqlToolkit,
};
use estoque_llm_sdk::client::LlmClient;
use estoque_llm_sdk::openai::OpenAIClient;
use estoque_llm_sdk::{ChatModel, LlmError};
use estoque_tools::SqlDatabase;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("LLM error: {0}")]
    Llm(LlmError),

    #[error("Agent error: {0}")]
    Executor(ExecutorError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] TemplateError),
}

impl From<LlmError> for GatewayError {
    fn from(error: LlmError) -> Self {
        GatewayError::Llm(error)
    }
}

impl From<ExecutorError> for GatewayError {
    fn from(error: ExecutorError) -> Self {
        match error {
            ExecutorError::Llm(e) => GatewayError::Llm(e),
            other => GatewayError::Executor(other),
        }
    }
}

impl GatewayError {
    /// 502 for remote-model failures, 500 otherwise
    pub fn status_code(&self) -> u16 {
        match self {
            GatewayError::Llm(_) => 502,
            GatewayError::Executor(_) | GatewayError::Prompt(_) => 500,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Llm(e) if e.is_transient())
    }
}

/// Builds a model client for the model picked on the page
pub trait ClientFactory: Send + Sync {
    fn create(&self, model: ChatModel) -> Result<Arc<dyn LlmClient>, LlmError>;
}

pub struct OpenAIClientFactory {
    api_key: String,
    base_url: String,
    max_retries: u32,
}

impl OpenAIClientFactory {
    pub fn new(api_key: impl Into<String>, base_url: impl Into<String>, max_retries: u32) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: base_url.into(),
            max_retries,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.api_key(),
            config.openai.base_url.clone(),
            config.openai.max_retries,
        )
    }
}

impl ClientFactory for OpenAIClientFactory {
    fn create(&self, model: ChatModel) -> Result<Arc<dyn LlmClient>, LlmError> {
        let client = OpenAIClient::new(self.api_key.clone())?
            .with_base_url(self.base_url.clone())
            .with_model(model.id())
            .with_max_retries(self.max_retries);
        Ok(Arc::new(client))
    }
}

/// Runs one question against one database with a freshly built agent
pub struct AgentGateway {
    factory: Arc<dyn ClientFactory>,
    policy: Arc<ReasoningPolicy>,
    settings: AgentConfig,
}

impl AgentGateway {
    pub fn new(config: &AppConfig, factory: Arc<dyn ClientFactory>, policy: Arc<ReasoningPolicy>) -> Self {
        Self {
            factory,
            policy,
            settings: config.agent.clone(),
        }
    }

    pub async fn answer(
        &self,
        database: &SqlDatabase,
        model: ChatModel,
        question: &str,
    ) -> Result<AgentOutcome, GatewayError> {
        let mut tracker = QueryTracker::new();

        let input = match format_inventory_prompt(question) {
            Ok(input) => input,
            Err(e) => {
                tracker.transition(QueryState::Failed);
                return Err(e.into());
            }
        };
        tracker.transition(QueryState::PromptFormatted);

        tracing::info!(
            model = model.id(),
            database = %database.uri(),
            policy = self.policy.origin(),
            "Running inventory agent"
        );

        let client = match self.factory.create(model) {
            Ok(client) => client,
            Err(e) => {
                tracker.transition(QueryState::Failed);
                return Err(e.into());
            }
        };

        let toolkit = Arc::new(SqlToolkit::new(
            database.clone(),
            client.clone(),
            self.settings.top_k,
        ));
        let agent = ReactAgent::new(client, toolkit.tools(), self.policy.clone())
            .with_temperature(Some(self.settings.temperature))
            .with_max_tokens(self.settings.max_tokens);

        let executor = AgentExecutor::new(Arc::new(agent), toolkit)
            .with_max_iterations(self.settings.max_iterations)
            .with_max_execution_time(self.settings.max_execution_time())
            .with_handle_parsing_errors(self.settings.handle_parsing_errors)
            .with_verbose(self.settings.verbose);

        let outcome = executor.invoke_tracked(&input, &mut tracker).await?;

        tracing::info!(
            steps = outcome.steps.len(),
            stopped_early = outcome.stopped_early,
            state = %tracker.state(),
            "Inventory agent finished"
        );

        Ok(outcome)
    }
}
