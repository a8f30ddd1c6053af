//! Drives an [`Agent`] through Reason → Act → Observe until it answers or a
//! limit is reached.

use crate::react::parser::OutputParseError;
use crate::toolkit::SqlToolkit;
use crate::types::{
    AgentAction, AgentOutcome, AgentPhase, AgentStep, IntermediateStep, QueryState, QueryTracker,
};
use crate::{Agent, AgentTool, ExecutorError};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Answer returned when the run hits the iteration or time limit
pub const EARLY_STOP_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";

/// Tool name recorded for steps that carried a parse error back to the model
pub const EXCEPTION_TOOL: &str = "_Exception";

pub const TRACE_TARGET: &str = "estoque::agent";

pub const DEFAULT_MAX_ITERATIONS: usize = 15;
pub const DEFAULT_MAX_EXECUTION_TIME: Duration = Duration::from_secs(180);

macro_rules! agent_trace {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            tracing::info!(target: "estoque::agent", $($arg)+);
        } else {
            tracing::debug!(target: "estoque::agent", $($arg)+);
        }
    };
}

pub struct AgentExecutor {
    agent: Arc<dyn Agent>,
    toolkit: Arc<SqlToolkit>,
    max_iterations: usize,
    max_execution_time: Option<Duration>,
    handle_parsing_errors: bool,
    verbose: bool,
}

impl AgentExecutor {
    pub fn new(agent: Arc<dyn Agent>, toolkit: Arc<SqlToolkit>) -> Self {
        Self {
            agent,
            toolkit,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_execution_time: Some(DEFAULT_MAX_EXECUTION_TIME),
            handle_parsing_errors: true,
            verbose: true,
        }
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// `None` disables the wall-clock limit
    pub fn with_max_execution_time(mut self, max_execution_time: Option<Duration>) -> Self {
        self.max_execution_time = max_execution_time;
        self
    }

    pub fn with_handle_parsing_errors(mut self, handle_parsing_errors: bool) -> Self {
        self.handle_parsing_errors = handle_parsing_errors;
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn max_execution_time(&self) -> Option<Duration> {
        self.max_execution_time
    }

    pub async fn invoke(&self, input: &str) -> Result<AgentOutcome, ExecutorError> {
        let mut tracker = QueryTracker::new();
        tracker.transition(QueryState::PromptFormatted);
        self.invoke_tracked(input, &mut tracker).await
    }

    /// Run the agent, recording state changes in `tracker`.
    ///
    /// The tracker is expected to be in [`QueryState::PromptFormatted`].
    pub async fn invoke_tracked(
        &self,
        input: &str,
        tracker: &mut QueryTracker,
    ) -> Result<AgentOutcome, ExecutorError> {
        let result = self.run_loop(input, tracker).await;
        match &result {
            Ok(outcome) => {
                tracker.transition(QueryState::Answered);
                agent_trace!(
                    self.verbose,
                    steps = outcome.steps.len(),
                    stopped_early = outcome.stopped_early,
                    "Finished chain."
                );
            }
            Err(e) => {
                tracker.transition(QueryState::Failed);
                tracing::error!(target: TRACE_TARGET, error = %e, "Agent run failed");
            }
        }
        result
    }

    async fn run_loop(
        &self,
        input: &str,
        tracker: &mut QueryTracker,
    ) -> Result<AgentOutcome, ExecutorError> {
        agent_trace!(self.verbose, objective = self.agent.objective(), "Entering new agent run");

        let tools = self.agent.tools();
        let start = Instant::now();
        let mut steps: Vec<IntermediateStep> = Vec::new();
        let mut iterations = 0;

        while self.should_continue(iterations, start.elapsed()) {
            tracker.transition(QueryState::AgentRunning(AgentPhase::Reason));

            let Some(planned) = self.within_deadline(start, self.agent.plan(input, &steps)).await
            else {
                break;
            };

            match planned {
                Ok(AgentStep::Finish(finish)) => {
                    agent_trace!(self.verbose, log = %finish.log, "Final answer");
                    return Ok(AgentOutcome {
                        output: finish.output,
                        steps,
                        stopped_early: false,
                    });
                }
                Ok(AgentStep::Action(action)) => {
                    agent_trace!(
                        self.verbose,
                        tool = %action.tool,
                        tool_input = %action.tool_input,
                        log = %action.log,
                        "Agent action"
                    );
                    tracker.transition(QueryState::AgentRunning(AgentPhase::Act));
                    let Some(performed) = self.within_deadline(start, self.perform(&action, &tools)).await
                    else {
                        break;
                    };
                    let observation = performed?;
                    tracker.transition(QueryState::AgentRunning(AgentPhase::Observe));
                    agent_trace!(self.verbose, observation = %observation, "Observation");
                    steps.push(IntermediateStep {
                        action,
                        observation,
                    });
                }
                Err(ExecutorError::OutputParse(e)) if self.handle_parsing_errors => {
                    let step = recover_from_parse_error(e);
                    tracker.transition(QueryState::AgentRunning(AgentPhase::Observe));
                    agent_trace!(
                        self.verbose,
                        observation = %step.observation,
                        log = %step.action.log,
                        "Could not parse agent output"
                    );
                    steps.push(step);
                }
                Err(e) => return Err(e),
            }

            iterations += 1;
        }

        tracing::warn!(
            target: TRACE_TARGET,
            iterations,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Agent stopped before reaching a final answer"
        );

        Ok(AgentOutcome {
            output: EARLY_STOP_OUTPUT.to_string(),
            steps,
            stopped_early: true,
        })
    }

    fn should_continue(&self, iterations: usize, elapsed: Duration) -> bool {
        if iterations >= self.max_iterations {
            return false;
        }
        match self.max_execution_time {
            Some(limit) => elapsed < limit,
            None => true,
        }
    }

    fn remaining_time(&self, elapsed: Duration) -> Option<Duration> {
        self.max_execution_time
            .map(|limit| limit.saturating_sub(elapsed))
    }

    /// `None` when the wall-clock limit elapses before `work` completes
    async fn within_deadline<F: Future>(&self, start: Instant, work: F) -> Option<F::Output> {
        match self.remaining_time(start.elapsed()) {
            Some(remaining) => tokio::time::timeout(remaining, work).await.ok(),
            None => Some(work.await),
        }
    }

    async fn perform(&self, action: &AgentAction, tools: &[AgentTool]) -> Result<String, ExecutorError> {
        match AgentTool::from_name(&action.tool).filter(|tool| tools.contains(tool)) {
            Some(tool) => Ok(self.toolkit.run(tool, &action.tool_input).await?),
            None => Ok(invalid_tool_observation(&action.tool, tools)),
        }
    }
}

fn recover_from_parse_error(error: OutputParseError) -> IntermediateStep {
    let observation = error.observation();
    IntermediateStep {
        action: AgentAction {
            tool: EXCEPTION_TOOL.to_string(),
            tool_input: observation.clone(),
            log: error.llm_output().to_string(),
        },
        observation,
    }
}

pub fn invalid_tool_observation(requested: &str, tools: &[AgentTool]) -> String {
    let names = tools
        .iter()
        .map(|tool| tool.name())
        .collect::<Vec<_>>()
        .join(", ");
    format!("{} is not a valid tool, try one of [{}].", requested, names)
}
