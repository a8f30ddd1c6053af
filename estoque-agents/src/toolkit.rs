use crate::AgentTool;
use estoque_llm_sdk::client::LlmClient;
use estoque_llm_sdk::types::{CompletionRequest, Message};
use estoque_llm_sdk::LlmError;
use estoque_tools::{SqlDatabase, ToolExecutor};
use std::sync::Arc;
use std::time::Instant;

const QUERY_CHECKER_PROMPT: &str = "{query}
Double check the SQLite query above for common mistakes, including:
- Using NOT IN with NULL values
- Using UNION when UNION ALL should have been used
- Using BETWEEN for exclusive ranges
- Data type mismatch in predicates
- Properly quoting identifiers
- Using the correct number of arguments for functions
- Casting to the correct data type
- Using the proper columns for joins

If there are any of the above mistakes, rewrite the query. If there are no mistakes, just reproduce the original query.

Output the final SQL query only.

SQL Query: ";

/// SQL tools bound to one database and one model client
pub struct SqlToolkit {
    executor: ToolExecutor,
    client: Arc<dyn LlmClient>,
}

impl SqlToolkit {
    /// `top_k` caps the sample rows shown with each table schema
    pub fn new(database: SqlDatabase, client: Arc<dyn LlmClient>, top_k: usize) -> Self {
        Self {
            executor: ToolExecutor::new(database.with_sample_rows(top_k)),
            client,
        }
    }

    pub fn tools(&self) -> Vec<AgentTool> {
        vec![
            AgentTool::Query,
            AgentTool::Schema,
            AgentTool::ListTables,
            AgentTool::QueryChecker,
        ]
    }

    /// Run a tool and return its observation.
    ///
    /// Database failures become `Error: ...` observations; only model errors
    /// from the query checker are returned as `Err`.
    pub async fn run(&self, tool: AgentTool, input: &str) -> Result<String, LlmError> {
        let start = Instant::now();

        let observation = match tool.to_tool_request(input) {
            Some(request) => self.executor.execute_or_error(request).await.to_observation(),
            None => self.check_query(input).await?,
        };

        tracing::debug!(
            tool_name = tool.name(),
            execution_time_ms = start.elapsed().as_millis() as u64,
            "Tool execution completed"
        );

        Ok(observation)
    }

    async fn check_query(&self, query: &str) -> Result<String, LlmError> {
        let prompt = QUERY_CHECKER_PROMPT.replace("{query}", query.trim());

        let mut request = CompletionRequest::new(self.client.model_name(), vec![Message::user(prompt)]);
        request.temperature = Some(0.0);

        let response = self.client.complete(request).await?;
        Ok(strip_code_fence(&response.text()))
    }
}

fn strip_code_fence(text: &str) -> String {
    let trimmed = text.trim();
    let Some(body) = trimmed.strip_prefix("```") else {
        return trimmed.to_string();
    };
    let body = body.strip_suffix("```").unwrap_or(body);
    let body = body
        .strip_prefix("sqlite")
        .or_else(|| body.strip_prefix("sql"))
        .unwrap_or(body);
    body.trim().to_string()
}
