use crate::config::{Settings, StepTokenBudgets};
use crate::orchestration::assembler::assemble;
use crate::orchestration::checklist::{StepKind, TaskChecklists, TaskType};
use crate::orchestration::checkpoint_store::{AttemptOutcome, CheckpointStore, StepAttemptRecord};
use crate::orchestration::error::OrchestratorError;
use crate::orchestration::router::{next_step, Route};
use crate::orchestration::state::{RunState, StepOutput, TaskState};
use crate::orchestration::steps::{StepContext, StepExecutors};
use crate::persistence::{publish_task_result, RecordSink};
use crate::provider::{CompletionClient, LinkVerifier};
use crate::shared::{append_engine_log_line, generate_task_id};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionSafetyLimits {
    pub max_total_iterations: u32,
    pub step_timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ExecutionSafetyLimits {
    fn default() -> Self {
        Self {
            max_total_iterations: 16,
            step_timeout_seconds: 120,
            max_retries: 2,
            retry_backoff_ms: 500,
        }
    }
}

pub fn resolve_execution_safety_limits(settings: &Settings) -> ExecutionSafetyLimits {
    let defaults = ExecutionSafetyLimits::default();
    let limits = settings.limits;
    ExecutionSafetyLimits {
        max_total_iterations: limits
            .max_total_iterations
            .unwrap_or(defaults.max_total_iterations),
        step_timeout_seconds: limits
            .step_timeout_seconds
            .unwrap_or(defaults.step_timeout_seconds),
        max_retries: limits.max_retries.unwrap_or(defaults.max_retries),
        retry_backoff_ms: limits.retry_backoff_ms.unwrap_or(defaults.retry_backoff_ms),
    }
}

pub fn is_retryable_step_error(error: &OrchestratorError) -> bool {
    matches!(
        error,
        OrchestratorError::StepExecution { .. } | OrchestratorError::StepTimeout { .. }
    )
}

/// Collaborators and storage for one process, built once and shared by
/// reference with every engine.
pub struct TaskContext<'a> {
    pub state_root: PathBuf,
    pub checkpoints: CheckpointStore,
    pub completion: &'a dyn CompletionClient,
    pub link_verifier: &'a dyn LinkVerifier,
    pub record_sink: Option<&'a dyn RecordSink>,
}

pub struct TaskEngine<'a> {
    context: &'a TaskContext<'a>,
    executors: StepExecutors,
    checklists: TaskChecklists,
    limits: ExecutionSafetyLimits,
    budgets: StepTokenBudgets,
    preserved_terms: Vec<String>,
    strict_task_types: bool,
}

impl<'a> TaskEngine<'a> {
    pub fn new(context: &'a TaskContext<'a>, settings: &Settings) -> Self {
        Self {
            context,
            executors: StepExecutors::default(),
            checklists: settings.task_checklists(),
            limits: resolve_execution_safety_limits(settings),
            budgets: settings.max_tokens,
            preserved_terms: settings.preserved_terms.clone(),
            strict_task_types: settings.strict_task_types,
        }
    }

    pub fn with_checklists(mut self, checklists: TaskChecklists) -> Self {
        self.checklists = checklists;
        self
    }

    pub fn with_limits(mut self, limits: ExecutionSafetyLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_executors(mut self, executors: StepExecutors) -> Self {
        self.executors = executors;
        self
    }

    /// Creates and checkpoints a queued task without running it.
    pub fn create(
        &self,
        task_type: TaskType,
        user_input: &str,
        now: i64,
    ) -> Result<TaskState, OrchestratorError> {
        if self.strict_task_types && !self.checklists.contains(task_type) {
            return Err(OrchestratorError::UnknownTaskType { task_type });
        }
        let task_id =
            generate_task_id(task_type.as_str(), now).map_err(OrchestratorError::InvalidTaskId)?;
        let state = TaskState::new(task_id, task_type, user_input, now);
        self.checkpoint(&state)?;
        self.log(
            now,
            format!(
                "task_id={} decision=create task_type={} steps={}",
                state.task_id,
                task_type,
                self.checklists.required_steps(task_type).len()
            ),
        )?;
        Ok(state)
    }

    pub fn start(
        &self,
        task_type: TaskType,
        user_input: &str,
        now: i64,
    ) -> Result<TaskState, OrchestratorError> {
        let mut state = self.create(task_type, user_input, now)?;
        self.run(&mut state, now)?;
        Ok(state)
    }

    /// Continues a checkpointed task. A task that already succeeded is
    /// returned unchanged.
    pub fn resume(&self, task_id: &str, now: i64) -> Result<TaskState, OrchestratorError> {
        let mut state = self.context.checkpoints.load(task_id)?;
        if state.status == RunState::Succeeded {
            return Ok(state);
        }
        self.log(
            now,
            format!(
                "task_id={} decision=resume state={} completed={}",
                state.task_id,
                state.status,
                state.completed_steps.len()
            ),
        )?;
        self.run(&mut state, now)?;
        Ok(state)
    }

    /// Drives `state` until the router reports terminal or a step fails.
    /// Checkpoint and log I/O errors take the same failure path as step errors.
    pub fn run(&self, state: &mut TaskState, start_now: i64) -> Result<(), OrchestratorError> {
        if state.status == RunState::Succeeded {
            return Ok(());
        }
        let clock = Instant::now();
        match self.drive(state, start_now, clock) {
            Ok(()) => Ok(()),
            Err(err) if state.status.is_terminal() => Err(err),
            Err(err) => self.fail(state, err, elapsed_now(start_now, clock)),
        }
    }

    fn drive(
        &self,
        state: &mut TaskState,
        start_now: i64,
        clock: Instant,
    ) -> Result<(), OrchestratorError> {
        if state.status != RunState::Running {
            state.transition(RunState::Running, start_now)?;
            state.push_message(format!("[ORCHESTRATOR] Starting task: {}", state.task_type));
            self.checkpoint(state)?;
            self.log(
                start_now,
                format!("task_id={} transition=running", state.task_id),
            )?;
        }

        let mut iterations = 0u32;
        loop {
            let now = elapsed_now(start_now, clock);
            if iterations >= self.limits.max_total_iterations {
                return self.fail(
                    state,
                    OrchestratorError::MaxIterationsExceeded {
                        max_total_iterations: self.limits.max_total_iterations,
                    },
                    now,
                );
            }
            iterations = iterations.saturating_add(1);

            let step = match next_step(state, &self.checklists) {
                Route::Terminal => return self.complete(state, now),
                Route::Step(step) => step,
            };

            let output = match self.execute_with_retry(state, step, start_now, clock) {
                Ok(output) => output,
                Err(err) => return self.fail(state, err, elapsed_now(start_now, clock)),
            };
            let completed_before = state.completed_steps.len();
            if output.kind() != step {
                return self.fail(state, OrchestratorError::NoProgress { step }, now);
            }
            let summary = output.summary();
            let applied_at = elapsed_now(start_now, clock);
            if let Err(err) = state.apply(output, applied_at) {
                return self.fail(state, err, applied_at);
            }
            if state.completed_steps.len() <= completed_before {
                return self.fail(state, OrchestratorError::NoProgress { step }, applied_at);
            }
            state.push_message(format!("{} {summary}", step.label()));
            self.checkpoint(state)?;
        }
    }

    fn execute_with_retry(
        &self,
        state: &mut TaskState,
        step: StepKind,
        start_now: i64,
        clock: Instant,
    ) -> Result<StepOutput, OrchestratorError> {
        let executor = self.executors.get(step);
        let mut attempt = 1u32;
        loop {
            let started_at = elapsed_now(start_now, clock);
            self.log(
                started_at,
                format!(
                    "task_id={} decision=execute step={} attempt={}",
                    state.task_id, step, attempt
                ),
            )?;
            let ctx = StepContext {
                completion: self.context.completion,
                link_verifier: self.context.link_verifier,
                budgets: self.budgets,
                preserved_terms: &self.preserved_terms,
                step_timeout_seconds: self.limits.step_timeout_seconds,
                now: started_at,
            };
            let result = executor.run(&ctx, state);
            let ended_at = elapsed_now(start_now, clock);

            match result {
                Ok(output) => {
                    self.context.checkpoints.record_attempt(&StepAttemptRecord {
                        task_id: state.task_id.to_string(),
                        step,
                        attempt,
                        started_at,
                        ended_at,
                        outcome: AttemptOutcome::Succeeded,
                        error: None,
                    })?;
                    self.log(
                        ended_at,
                        format!(
                            "task_id={} step={} attempt={} transition=succeeded",
                            state.task_id, step, attempt
                        ),
                    )?;
                    return Ok(output);
                }
                Err(err) => {
                    let can_retry =
                        is_retryable_step_error(&err) && attempt <= self.limits.max_retries;
                    self.context.checkpoints.record_attempt(&StepAttemptRecord {
                        task_id: state.task_id.to_string(),
                        step,
                        attempt,
                        started_at,
                        ended_at,
                        outcome: AttemptOutcome::Failed,
                        error: Some(err.to_string()),
                    })?;
                    state.push_error(format!("{step} attempt {attempt}: {err}"));
                    self.log(
                        ended_at,
                        format!(
                            "task_id={} step={} attempt={} transition=failed retryable={} error={}",
                            state.task_id, step, attempt, can_retry, err
                        ),
                    )?;
                    if !can_retry {
                        return Err(err);
                    }
                    let backoff = self.limits.retry_backoff_ms.saturating_mul(attempt as u64);
                    if backoff > 0 {
                        std::thread::sleep(Duration::from_millis(backoff));
                    }
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    fn complete(&self, state: &mut TaskState, now: i64) -> Result<(), OrchestratorError> {
        let result = assemble(state, now);
        if state.final_output.is_none() {
            state.set_final_output(result.clone())?;
        }
        state.push_message("[COMPLETION] Assembled final output");
        state.transition(RunState::Succeeded, now)?;
        self.checkpoint(state)?;
        self.log(
            now,
            format!(
                "task_id={} transition=succeeded completed={}",
                state.task_id,
                state.completed_steps.len()
            ),
        )?;

        if let Some(sink) = self.context.record_sink {
            let line = match self.context.checkpoints.list_attempts(state.task_id.as_str()) {
                Ok(attempts) => {
                    let report = publish_task_result(sink, &result, &attempts);
                    if report.is_clean() {
                        format!(
                            "task_id={} publish=ok tables={}",
                            state.task_id,
                            report.written.len()
                        )
                    } else {
                        format!(
                            "task_id={} publish=failed failures={} error={}",
                            state.task_id,
                            report.failures.len(),
                            report.failures.join("; ")
                        )
                    }
                }
                Err(err) => format!("task_id={} publish=skipped error={err}", state.task_id),
            };
            self.log(now, line)?;
        }
        Ok(())
    }

    fn fail(
        &self,
        state: &mut TaskState,
        err: OrchestratorError,
        now: i64,
    ) -> Result<(), OrchestratorError> {
        state.push_error(format!("task failed: {err}"));
        if !state.status.is_terminal() {
            state.transition(RunState::Failed, now)?;
        }
        self.checkpoint(state)?;
        self.log(
            now,
            format!(
                "task_id={} transition=failed step={} reason={err}",
                state.task_id,
                err.step().map(|step| step.as_str()).unwrap_or("-")
            ),
        )?;
        Err(err)
    }

    fn checkpoint(&self, state: &TaskState) -> Result<(), OrchestratorError> {
        self.context.checkpoints.save(state)
    }

    fn log(&self, now: i64, line: String) -> Result<(), OrchestratorError> {
        append_engine_log_line(&self.context.state_root, &format!("ts={now} {line}")).map_err(
            |source| OrchestratorError::Io {
                path: crate::shared::engine_log_path(&self.context.state_root)
                    .display()
                    .to_string(),
                source,
            },
        )
    }
}

fn elapsed_now(base_now: i64, started_at: Instant) -> i64 {
    base_now.saturating_add(started_at.elapsed().as_secs() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_step_execution_and_timeouts_are_retryable() {
        assert!(is_retryable_step_error(&OrchestratorError::StepExecution {
            step: StepKind::Research,
            reason: "transport".to_string(),
        }));
        assert!(is_retryable_step_error(&OrchestratorError::StepTimeout {
            step: StepKind::Content,
            step_timeout_seconds: 5,
        }));
        assert!(!is_retryable_step_error(&OrchestratorError::StepRejected {
            step: StepKind::Content,
            reason: "401".to_string(),
        }));
        assert!(!is_retryable_step_error(
            &OrchestratorError::MaxIterationsExceeded {
                max_total_iterations: 4
            }
        ));
    }

    #[test]
    fn limits_fall_back_to_defaults() {
        let mut settings = Settings::default();
        assert_eq!(
            resolve_execution_safety_limits(&settings),
            ExecutionSafetyLimits::default()
        );
        settings.limits.max_retries = Some(0);
        settings.limits.retry_backoff_ms = Some(0);
        let limits = resolve_execution_safety_limits(&settings);
        assert_eq!(limits.max_retries, 0);
        assert_eq!(limits.retry_backoff_ms, 0);
        assert_eq!(limits.max_total_iterations, 16);
    }
}
