use serde::{Deserialize, Serialize};

use super::sql_database::{
    ListTablesRequest, ListTablesResponse, QueryRequest, QueryResponse, SchemaRequest,
    SchemaResponse,
};

/// Tool request enum containing all database operations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolRequest {
    #[serde(rename = "sql_db_list_tables")]
    ListTables(ListTablesRequest),
    #[serde(rename = "sql_db_schema")]
    Schema(SchemaRequest),
    #[serde(rename = "sql_db_query")]
    Query(QueryRequest),
}

/// Tool response enum containing all possible tool results
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ToolResponse {
    #[serde(rename = "sql_db_list_tables")]
    ListTables(ListTablesResponse),
    #[serde(rename = "sql_db_schema")]
    Schema(SchemaResponse),
    #[serde(rename = "sql_db_query")]
    Query(QueryResponse),
    #[serde(rename = "error")]
    Error(ToolErrorResponse),
}

/// Error response for tool execution failures
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolErrorResponse {
    pub tool: String,
    pub error: String,
    pub message: String,
}

impl ToolResponse {
    /// Text handed back to the agent as an observation
    pub fn to_observation(&self) -> String {
        match self {
            ToolResponse::ListTables(r) => r.tables.join(", "),
            ToolResponse::Schema(r) => r.schema.clone(),
            ToolResponse::Query(r) => r.formatted_output.clone(),
            ToolResponse::Error(e) => format!("Error: {}", e.message),
        }
    }
}
