pub mod sql_database;
pub mod tool_error;
pub mod tool_executor;
pub mod types;

pub use sql_database::{QueryResult, SqlDatabase, SqlExecutor};
pub use tool_error::ToolError;
pub use tool_executor::ToolExecutor;
pub use types::*;
