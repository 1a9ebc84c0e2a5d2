use crate::orchestration::checklist::{StepKind, TaskChecklists, TaskType};
use crate::orchestration::router::{next_step, remaining_steps, Route};
use crate::orchestration::state::{RunState, TaskState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressSnapshot {
    pub task_id: String,
    pub task_type: TaskType,
    pub state: RunState,
    pub completed_steps: Vec<StepKind>,
    pub remaining_steps: Vec<StepKind>,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_message: Option<String>,
    pub last_error: Option<String>,
    pub next_expected_action: String,
}

impl ProgressSnapshot {
    pub fn from_state(state: &TaskState, checklists: &TaskChecklists) -> Self {
        let next_expected_action = match (state.status, next_step(state, checklists)) {
            (RunState::Succeeded, _) => "none".to_string(),
            (RunState::Failed, Route::Step(step)) => format!("resume to retry {step}"),
            (RunState::Failed, Route::Terminal) => "resume to assemble the result".to_string(),
            (_, Route::Step(step)) => format!("execute {step}"),
            (_, Route::Terminal) => "assemble the result".to_string(),
        };
        Self {
            task_id: state.task_id.to_string(),
            task_type: state.task_type,
            state: state.status,
            completed_steps: state.completed_steps.clone(),
            remaining_steps: remaining_steps(state, checklists),
            created_at: state.created_at,
            updated_at: state.updated_at,
            last_message: state.messages.last().cloned(),
            last_error: state.errors.last().cloned(),
            next_expected_action,
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("task_id={}", self.task_id),
            format!("task_type={}", self.task_type),
            format!("state={}", self.state),
            format!("completed={}", join_steps(&self.completed_steps)),
            format!("remaining={}", join_steps(&self.remaining_steps)),
            format!("created_at={}", self.created_at),
            format!("updated_at={}", self.updated_at),
            format!("next={}", self.next_expected_action),
        ];
        if let Some(message) = &self.last_message {
            lines.push(format!("last_message={message}"));
        }
        if let Some(error) = &self.last_error {
            lines.push(format!("last_error={error}"));
        }
        lines.join("\n")
    }
}

fn join_steps(steps: &[StepKind]) -> String {
    if steps.is_empty() {
        return "-".to_string();
    }
    steps
        .iter()
        .map(|step| step.as_str())
        .collect::<Vec<_>>()
        .join(",")
}
