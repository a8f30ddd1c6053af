use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTablesRequest {}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaRequest {
    /// Tables to describe; empty means every table
    pub table_names: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    /// A single SELECT or PRAGMA statement
    pub query: String,

    /// Defaults to 100, at most 1000
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListTablesResponse {
    pub tables: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaResponse {
    pub tables: Vec<String>,
    pub schema: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    pub columns: Vec<String>,

    pub rows: Vec<Vec<serde_json::Value>>,

    pub row_count: usize,

    pub truncated: bool,

    pub execution_time_ms: u64,

    pub formatted_output: String,
}
