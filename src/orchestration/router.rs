use crate::orchestration::checklist::{StepKind, TaskChecklists};
use crate::orchestration::state::TaskState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Step(StepKind),
    Terminal,
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Route::Step(step) => write!(f, "{step}"),
            Route::Terminal => write!(f, "terminal"),
        }
    }
}

/// First checklist step not yet in `completed_steps`, in declared order.
///
/// Completion is a membership test, so a step marked complete out of order is
/// skipped when its turn comes rather than shifting the scan position.
pub fn next_step(state: &TaskState, checklists: &TaskChecklists) -> Route {
    checklists
        .required_steps(state.task_type)
        .iter()
        .copied()
        .find(|step| !state.is_completed(*step))
        .map(Route::Step)
        .unwrap_or(Route::Terminal)
}

/// Steps of the checklist still to run, in the order the router will pick them.
pub fn remaining_steps(state: &TaskState, checklists: &TaskChecklists) -> Vec<StepKind> {
    checklists
        .required_steps(state.task_type)
        .iter()
        .copied()
        .filter(|step| !state.is_completed(*step))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::checklist::TaskType;
    use crate::shared::TaskId;

    fn state(task_type: TaskType) -> TaskState {
        TaskState::new(
            TaskId::parse("router_test").expect("id"),
            task_type,
            "input",
            0,
        )
    }

    #[test]
    fn empty_state_starts_with_first_checklist_step() {
        let checklists = TaskChecklists::default();
        for task_type in TaskType::ALL {
            assert_eq!(
                next_step(&state(task_type), &checklists),
                Route::Step(StepKind::Research)
            );
        }
    }

    #[test]
    fn remaining_steps_follow_declared_order() {
        let checklists = TaskChecklists::default();
        let mut state = state(TaskType::ContentWithContext);
        state.completed_steps.push(StepKind::Research);
        assert_eq!(
            remaining_steps(&state, &checklists),
            vec![StepKind::Context, StepKind::Content, StepKind::Links]
        );
    }

    #[test]
    fn all_steps_completed_routes_to_terminal() {
        let checklists = TaskChecklists::default();
        let mut state = state(TaskType::CitationOnly);
        state.completed_steps = vec![StepKind::Research, StepKind::Links];
        assert_eq!(next_step(&state, &checklists), Route::Terminal);
        assert_eq!(Route::Terminal.to_string(), "terminal");
    }
}
