use crate::sql_database::{formatter, SqlDatabase};
use crate::tool_error::ToolError;
use crate::types::{
    ListTablesResponse, QueryResponse, SchemaResponse, ToolErrorResponse, ToolRequest,
    ToolResponse,
};
use anyhow::Result;

/// Executes tool requests against one database handle
pub struct ToolExecutor {
    database: SqlDatabase,
}

impl ToolExecutor {
    pub fn new(database: SqlDatabase) -> Self {
        Self { database }
    }

    /// Execute a tool request and return a tool response
    pub async fn execute(&self, request: ToolRequest) -> Result<ToolResponse> {
        let response = match request {
            ToolRequest::ListTables(_) => {
                let tables = self.database.table_names()?;
                ToolResponse::ListTables(ListTablesResponse { tables })
            }
            ToolRequest::Schema(req) => {
                let schema = self.database.table_info(&req.table_names)?;
                ToolResponse::Schema(SchemaResponse {
                    tables: req.table_names,
                    schema,
                })
            }
            ToolRequest::Query(req) => {
                let result = self.database.run(&req.query, req.limit)?;
                let formatted_output = formatter::format_query_result(&result);
                ToolResponse::Query(QueryResponse {
                    columns: result.columns,
                    rows: result.rows,
                    row_count: result.row_count,
                    truncated: result.truncated,
                    execution_time_ms: result.execution_time_ms,
                    formatted_output,
                })
            }
        };

        Ok(response)
    }

    /// Like [`execute`](Self::execute), but folds failures into a
    /// [`ToolResponse::Error`] so they can be shown to the model.
    pub async fn execute_or_error(&self, request: ToolRequest) -> ToolResponse {
        let tool = tool_name(&request).to_string();
        match self.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                let (error, message) = match e.downcast_ref::<ToolError>() {
                    Some(ToolError::InvalidInput(msg)) => ("invalid_input", msg.clone()),
                    Some(ToolError::ExecutionError(msg)) => ("execution_error", msg.clone()),
                    Some(other) => ("tool_error", other.to_string()),
                    None => ("tool_error", e.to_string()),
                };
                tracing::debug!(tool = %tool, error, message = %message, "Tool execution failed");
                ToolResponse::Error(ToolErrorResponse {
                    tool,
                    error: error.to_string(),
                    message,
                })
            }
        }
    }
}

pub fn tool_name(request: &ToolRequest) -> &'static str {
    match request {
        ToolRequest::ListTables(_) => "sql_db_list_tables",
        ToolRequest::Schema(_) => "sql_db_schema",
        ToolRequest::Query(_) => "sql_db_query",
    }
}
