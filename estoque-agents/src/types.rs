use serde::{Deserialize, Serialize};

/// A tool invocation chosen by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentAction {
    pub tool: String,
    pub tool_input: String,
    /// Raw completion text that produced the action
    pub log: String,
}

/// The model's final answer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentFinish {
    pub output: String,
    pub log: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentStep {
    Action(AgentAction),
    Finish(AgentFinish),
}

/// An action together with the observation it produced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateStep {
    pub action: AgentAction,
    pub observation: String,
}

/// Result of one agent run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutcome {
    pub output: String,
    pub steps: Vec<IntermediateStep>,
    /// True when the run hit the iteration or time limit
    pub stopped_early: bool,
}

/// Phase of a running agent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AgentPhase {
    Reason,
    Act,
    Observe,
}

/// Lifecycle of a single question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueryState {
    Idle,
    PromptFormatted,
    AgentRunning(AgentPhase),
    Answered,
    Failed,
}

impl QueryState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueryState::Answered | QueryState::Failed)
    }

    /// Whether `next` may follow `self`
    pub fn can_transition_to(&self, next: QueryState) -> bool {
        use AgentPhase::*;
        use QueryState::*;

        match (self, next) {
            (Idle, PromptFormatted) => true,
            (PromptFormatted, AgentRunning(Reason)) => true,
            (PromptFormatted, Answered) => true,
            (AgentRunning(Reason), AgentRunning(Act)) => true,
            (AgentRunning(Reason), AgentRunning(Observe)) => true,
            (AgentRunning(Act), AgentRunning(Observe)) => true,
            (AgentRunning(Observe), AgentRunning(Reason)) => true,
            (AgentRunning(_), Answered) => true,
            (state, Failed) => !state.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for QueryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryState::Idle => write!(f, "idle"),
            QueryState::PromptFormatted => write!(f, "prompt_formatted"),
            QueryState::AgentRunning(AgentPhase::Reason) => write!(f, "agent_running:reason"),
            QueryState::AgentRunning(AgentPhase::Act) => write!(f, "agent_running:act"),
            QueryState::AgentRunning(AgentPhase::Observe) => write!(f, "agent_running:observe"),
            QueryState::Answered => write!(f, "answered"),
            QueryState::Failed => write!(f, "failed"),
        }
    }
}

/// Records the states a query passes through
#[derive(Debug, Clone)]
pub struct QueryTracker {
    history: Vec<QueryState>,
}

impl Default for QueryTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryTracker {
    pub fn new() -> Self {
        Self {
            history: vec![QueryState::Idle],
        }
    }

    pub fn state(&self) -> QueryState {
        self.history
            .last()
            .copied()
            .unwrap_or(QueryState::Idle)
    }

    pub fn history(&self) -> &[QueryState] {
        &self.history
    }

    /// Move to `next`, logging the transition. Invalid transitions are logged
    /// and ignored.
    pub fn transition(&mut self, next: QueryState) {
        let current = self.state();
        if !current.can_transition_to(next) {
            tracing::warn!(from = %current, to = %next, "Ignoring invalid query state transition");
            return;
        }
        tracing::debug!(from = %current, to = %next, "Query state transition");
        self.history.push(next);
    }
}
