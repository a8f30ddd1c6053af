pub mod core;
pub mod sql_database;

// Re-export commonly used types
pub use self::core::{ToolErrorResponse, ToolRequest, ToolResponse};
pub use sql_database::{
    ListTablesRequest, ListTablesResponse, QueryRequest, QueryResponse, SchemaRequest,
    SchemaResponse,
};
