pub mod assembler;
pub mod checklist;
pub mod checkpoint_store;
pub mod error;
pub mod progress;
pub mod records;
pub mod router;
pub mod state;
pub mod steps;
pub mod task_engine;

pub use assembler::{assemble, FinalResult};
pub use checklist::{StepKind, TaskChecklists, TaskType};
pub use checkpoint_store::{AttemptOutcome, CheckpointStore, CheckpointSummary, StepAttemptRecord};
pub use error::OrchestratorError;
pub use progress::ProgressSnapshot;
pub use router::{next_step, remaining_steps, Route};
pub use state::{RunState, StepOutput, TaskState};
pub use steps::{StepContext, StepExecutor, StepExecutors};
pub use task_engine::{
    is_retryable_step_error, resolve_execution_safety_limits, ExecutionSafetyLimits, TaskContext,
    TaskEngine,
};
