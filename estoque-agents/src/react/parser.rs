//! Parser for single-input ReAct completions.
//!
//! A completion either names an action:
//!
//! ```text
//! Thought: I should look at the tables first
//! Action: sql_db_list_tables
//! Action Input:
//! ```
//!
//! or ends the run with `Final Answer: ...`.

use crate::types::{AgentAction, AgentFinish, AgentStep};
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

pub const FINAL_ANSWER_ACTION: &str = "Final Answer:";

/// Observation sent back when a completion cannot be used
pub const INVALID_RESPONSE_OBSERVATION: &str = "Invalid or incomplete response";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OutputParseError {
    #[error("Invalid Format: Missing 'Action:' after 'Thought:'")]
    MissingAction { llm_output: String },

    #[error("Invalid Format: Missing 'Action Input:' after 'Action:'")]
    MissingActionInput { llm_output: String },

    #[error("Parsing LLM output produced both a final answer and a parse-able action: {llm_output}")]
    ActionAndFinalAnswer { llm_output: String },

    #[error("Could not parse LLM output: `{llm_output}`")]
    Unparseable { llm_output: String },
}

impl OutputParseError {
    pub fn llm_output(&self) -> &str {
        match self {
            OutputParseError::MissingAction { llm_output }
            | OutputParseError::MissingActionInput { llm_output }
            | OutputParseError::ActionAndFinalAnswer { llm_output }
            | OutputParseError::Unparseable { llm_output } => llm_output,
        }
    }

    /// Text fed back to the model so it can correct itself
    pub fn observation(&self) -> String {
        match self {
            OutputParseError::MissingAction { .. } | OutputParseError::MissingActionInput { .. } => {
                self.to_string()
            }
            _ => INVALID_RESPONSE_OBSERVATION.to_string(),
        }
    }
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .expect("valid action pattern")
    })
}

fn action_only_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)").expect("valid action pattern"))
}

fn action_input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .expect("valid action input pattern")
    })
}

pub fn parse(text: &str) -> Result<AgentStep, OutputParseError> {
    let includes_answer = text.contains(FINAL_ANSWER_ACTION);

    if let Some(captures) = action_regex().captures(text) {
        if includes_answer {
            return Err(OutputParseError::ActionAndFinalAnswer {
                llm_output: text.to_string(),
            });
        }

        let tool = captures.get(1).map_or("", |m| m.as_str()).trim();
        let tool_input = captures
            .get(2)
            .map_or("", |m| m.as_str())
            .trim()
            .trim_matches(' ')
            .trim_matches('"');

        return Ok(AgentStep::Action(AgentAction {
            tool: tool.to_string(),
            tool_input: tool_input.to_string(),
            log: text.to_string(),
        }));
    }

    if includes_answer {
        let output = text
            .rsplit(FINAL_ANSWER_ACTION)
            .next()
            .unwrap_or_default()
            .trim();
        return Ok(AgentStep::Finish(AgentFinish {
            output: output.to_string(),
            log: text.to_string(),
        }));
    }

    let llm_output = text.to_string();
    if !action_only_regex().is_match(text) {
        Err(OutputParseError::MissingAction { llm_output })
    } else if !action_input_regex().is_match(text) {
        Err(OutputParseError::MissingActionInput { llm_output })
    } else {
        Err(OutputParseError::Unparseable { llm_output })
    }
}
