use crate::config::ConfigError;
use crate::orchestration::checklist::{StepKind, TaskType};
use crate::orchestration::state::RunState;

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("no checklist is configured for task type `{task_type}`")]
    UnknownTaskType { task_type: TaskType },
    #[error("task `{task_id}` not found")]
    UnknownTaskId { task_id: String },
    #[error("invalid task id: {0}")]
    InvalidTaskId(String),
    #[error("step `{step}` already completed; its output cannot be written twice")]
    StepAlreadyCompleted { step: StepKind },
    #[error("final output for task `{task_id}` is already set")]
    FinalOutputAlreadySet { task_id: String },
    #[error("task state transition `{from}` -> `{to}` is invalid")]
    InvalidRunTransition { from: RunState, to: RunState },
    #[error("step execution failed for step `{step}`: {reason}")]
    StepExecution { step: StepKind, reason: String },
    #[error("step `{step}` was rejected by its collaborator: {reason}")]
    StepRejected { step: StepKind, reason: String },
    #[error("step `{step}` timed out after {step_timeout_seconds}s")]
    StepTimeout {
        step: StepKind,
        step_timeout_seconds: u64,
    },
    #[error("task execution exceeded max total iterations ({max_total_iterations})")]
    MaxIterationsExceeded { max_total_iterations: u32 },
    #[error("router selected `{step}` but the step made no progress")]
    NoProgress { step: StepKind },
    #[error("config error: {0}")]
    Config(String),
    #[error("checkpoint store error at {path}: {source}")]
    Checkpoint {
        path: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("checkpoint for task `{task_id}` is not valid json: {source}")]
    CheckpointJson {
        task_id: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("checkpoint row for task `{task_id}` is corrupt: {reason}")]
    CorruptCheckpoint { task_id: String, reason: String },
    #[error("io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl From<ConfigError> for OrchestratorError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

impl OrchestratorError {
    /// The step this error belongs to, when it came from a step attempt.
    pub fn step(&self) -> Option<StepKind> {
        match self {
            Self::StepExecution { step, .. }
            | Self::StepRejected { step, .. }
            | Self::StepTimeout { step, .. }
            | Self::StepAlreadyCompleted { step }
            | Self::NoProgress { step } => Some(*step),
            _ => None,
        }
    }
}
