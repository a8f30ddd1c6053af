/// Tool execution error
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Execution error: {0}")]
    ExecutionError(String),
}

impl From<rusqlite::Error> for ToolError {
    fn from(err: rusqlite::Error) -> Self {
        ToolError::ExecutionError(err.to_string())
    }
}
