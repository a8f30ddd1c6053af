pub mod error;
pub mod executor;
pub mod policy;
pub mod prompt;
pub mod react;
pub mod toolkit;
pub mod types;

use async_trait::async_trait;
use estoque_tools::types::{ListTablesRequest, QueryRequest, SchemaRequest};
use estoque_tools::ToolRequest;

pub use error::ExecutorError;
pub use executor::AgentExecutor;
pub use policy::{PolicySource, ReasoningPolicy};
pub use prompt::{format_inventory_prompt, PromptTemplate};
pub use react::ReactAgent;
pub use toolkit::SqlToolkit;
pub use types::{AgentOutcome, AgentStep, IntermediateStep, QueryState};

/// Represents the types of tools available to agents
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentTool {
    Query,
    Schema,
    ListTables,
    QueryChecker,
}

impl AgentTool {
    /// Returns the tool name the model uses in `Action:`
    pub fn name(&self) -> &'static str {
        match self {
            AgentTool::Query => "sql_db_query",
            AgentTool::Schema => "sql_db_schema",
            AgentTool::ListTables => "sql_db_list_tables",
            AgentTool::QueryChecker => "sql_db_query_checker",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "sql_db_query" => Some(AgentTool::Query),
            "sql_db_schema" => Some(AgentTool::Schema),
            "sql_db_list_tables" => Some(AgentTool::ListTables),
            "sql_db_query_checker" => Some(AgentTool::QueryChecker),
            _ => None,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AgentTool::Query => {
                "Input to this tool is a detailed and correct SQL query, output is a result from the database. \
                 Only SELECT and PRAGMA statements are allowed. If the query is not correct, an error message \
                 will be returned. If an error is returned, rewrite the query, check the query, and try again. \
                 If you encounter an issue with an unknown column, use sql_db_schema to query the correct table fields."
            }
            AgentTool::Schema => {
                "Input to this tool is a comma-separated list of tables, output is the schema and sample rows \
                 for those tables. Be sure that the tables actually exist by calling sql_db_list_tables first! \
                 Example Input: table1, table2, table3"
            }
            AgentTool::ListTables => {
                "Input is an empty string, output is a comma-separated list of tables in the database."
            }
            AgentTool::QueryChecker => {
                "Use this tool to double check if your query is correct before executing it. \
                 Always use this tool before executing a query with sql_db_query!"
            }
        }
    }

    /// Convert the free-text action input into a typed database request.
    /// Returns `None` for tools that are not served by the database.
    pub fn to_tool_request(&self, input: &str) -> Option<ToolRequest> {
        match self {
            AgentTool::ListTables => Some(ToolRequest::ListTables(ListTablesRequest {})),
            AgentTool::Schema => Some(ToolRequest::Schema(SchemaRequest {
                table_names: parse_table_list(input),
            })),
            AgentTool::Query => Some(ToolRequest::Query(QueryRequest {
                query: input.trim().to_string(),
                limit: None,
            })),
            AgentTool::QueryChecker => None,
        }
    }
}

fn parse_table_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(|name| name.trim().trim_matches(|c| c == '"' || c == '\'' || c == '`'))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Trait defining the structure and behavior of an AI agent
#[async_trait]
pub trait Agent: Send + Sync {
    /// Returns the agent's clear objective
    fn objective(&self) -> &str;

    /// Returns the list of tools available to this agent
    fn tools(&self) -> Vec<AgentTool>;

    /// Decide the next step given the input and the steps taken so far
    async fn plan(
        &self,
        input: &str,
        intermediate_steps: &[IntermediateStep],
    ) -> Result<AgentStep, ExecutorError>;
}
