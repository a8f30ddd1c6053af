//! ReAct agent: renders the reasoning-policy template with the tool list and
//! scratchpad, calls the model and parses the next step.

pub mod parser;

use crate::policy::ReasoningPolicy;
use crate::types::{AgentStep, IntermediateStep};
use crate::{Agent, AgentTool, ExecutorError};
use async_trait::async_trait;
use estoque_llm_sdk::client::LlmClient;
use estoque_llm_sdk::types::{CompletionRequest, Message};
use std::sync::Arc;

/// Completions are cut before the model invents its own observation
pub const STOP_SEQUENCE: &str = "\nObservation";

pub struct ReactAgent {
    client: Arc<dyn LlmClient>,
    tools: Vec<AgentTool>,
    policy: Arc<ReasoningPolicy>,
    temperature: Option<f32>,
    max_tokens: u32,
}

impl ReactAgent {
    pub fn new(client: Arc<dyn LlmClient>, tools: Vec<AgentTool>, policy: Arc<ReasoningPolicy>) -> Self {
        Self {
            client,
            tools,
            policy,
            temperature: None,
            max_tokens: 2048,
        }
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Render the full prompt for the next model call
    pub fn render_prompt(
        &self,
        input: &str,
        intermediate_steps: &[IntermediateStep],
    ) -> Result<String, ExecutorError> {
        let tools = render_tool_descriptions(&self.tools);
        let tool_names = self
            .tools
            .iter()
            .map(|tool| tool.name())
            .collect::<Vec<_>>()
            .join(", ");
        let scratchpad = format_scratchpad(intermediate_steps);

        let prompt = self.policy.template().format(&[
            ("tools", tools.as_str()),
            ("tool_names", tool_names.as_str()),
            ("input", input),
            ("agent_scratchpad", scratchpad.as_str()),
        ])?;
        Ok(prompt)
    }
}

#[async_trait]
impl Agent for ReactAgent {
    fn objective(&self) -> &str {
        "Answer questions about a SQLite database by reasoning and querying it"
    }

    fn tools(&self) -> Vec<AgentTool> {
        self.tools.clone()
    }

    async fn plan(
        &self,
        input: &str,
        intermediate_steps: &[IntermediateStep],
    ) -> Result<AgentStep, ExecutorError> {
        let prompt = self.render_prompt(input, intermediate_steps)?;

        let mut request = CompletionRequest::new(self.client.model_name(), vec![Message::user(prompt)]);
        request.max_tokens = self.max_tokens;
        request.temperature = self.temperature;
        request.stop_sequences = Some(vec![STOP_SEQUENCE.to_string()]);

        let response = self.client.complete(request).await?;
        let text = response.text();

        Ok(parser::parse(&text)?)
    }
}

/// `name: description` lines
pub fn render_tool_descriptions(tools: &[AgentTool]) -> String {
    tools
        .iter()
        .map(|tool| format!("{}: {}", tool.name(), tool.description()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Previous steps as the model wrote them, each followed by its observation
pub fn format_scratchpad(intermediate_steps: &[IntermediateStep]) -> String {
    let mut thoughts = String::new();
    for step in intermediate_steps {
        thoughts.push_str(&step.action.log);
        thoughts.push_str("\nObservation: ");
        thoughts.push_str(&step.observation);
        thoughts.push_str("\nThought: ");
    }
    thoughts
}
