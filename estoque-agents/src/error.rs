use crate::prompt::TemplateError;
use crate::react::parser::OutputParseError;
use estoque_llm_sdk::LlmError;
use thiserror::Error;

/// Errors that end an agent run
#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Could not parse agent output: {0}")]
    OutputParse(#[from] OutputParseError),

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
}

impl ExecutorError {
    /// Whether the run failed on a remote error worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            ExecutorError::Llm(e) => e.is_transient(),
            _ => false,
        }
    }
}
