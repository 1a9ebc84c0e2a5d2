use rebbeandme::orchestration::records::{SourceRecord, SourceType};
use rebbeandme::orchestration::{
    next_step, remaining_steps, Route, StepKind, StepOutput, TaskChecklists, TaskState, TaskType,
};
use rebbeandme::shared::TaskId;
use std::collections::BTreeMap;

fn state(task_type: TaskType) -> TaskState {
    TaskState::new(
        TaskId::parse("router_module_1_abcd").expect("id"),
        task_type,
        "Prepare a Chanukah farbrengen",
        100,
    )
}

fn research() -> StepOutput {
    StepOutput::Research {
        sources: vec![SourceRecord {
            source_type: SourceType::Sicha,
            citation: "Sichos Kodesh 5747".to_string(),
            topic: String::new(),
            url: None,
            page: None,
        }],
        search_terms: Vec::new(),
    }
}

#[test]
fn router_walks_each_checklist_in_declared_order() {
    let checklists = TaskChecklists::default();
    for task_type in TaskType::ALL {
        let mut state = state(task_type);
        let mut visited = Vec::new();
        while let Route::Step(step) = next_step(&state, &checklists) {
            visited.push(step);
            state.completed_steps.push(step);
            assert!(visited.len() <= 5, "router must terminate");
        }
        assert_eq!(visited, checklists.required_steps(task_type));
    }
}

#[test]
fn router_is_idempotent_for_an_unchanged_state() {
    let checklists = TaskChecklists::default();
    let mut state = state(TaskType::ContentWithContext);
    state.apply(research(), 101).expect("apply");
    let first = next_step(&state, &checklists);
    let second = next_step(&state, &checklists);
    assert_eq!(first, second);
    assert_eq!(first, Route::Step(StepKind::Context));
}

#[test]
fn out_of_band_completion_is_skipped_not_rerun() {
    let checklists = TaskChecklists::default();
    let mut state = state(TaskType::CitationOnly);
    state.completed_steps.push(StepKind::Links);
    assert_eq!(next_step(&state, &checklists), Route::Step(StepKind::Research));
    state.apply(research(), 101).expect("apply");
    assert_eq!(next_step(&state, &checklists), Route::Terminal);
}

#[test]
fn task_type_without_checklist_is_terminal_from_the_start() {
    let checklists = TaskChecklists::empty();
    let state = state(TaskType::ContentWithTranslation);
    assert_eq!(next_step(&state, &checklists), Route::Terminal);
    assert!(remaining_steps(&state, &checklists).is_empty());
}

#[test]
fn overridden_checklists_drive_routing_without_code_changes() {
    let mut overrides = BTreeMap::new();
    overrides.insert(
        TaskType::CitationOnly,
        vec![StepKind::Research, StepKind::Context, StepKind::Links],
    );
    let checklists = TaskChecklists::with_overrides(&overrides);
    let mut state = state(TaskType::CitationOnly);
    state.apply(research(), 101).expect("apply");
    assert_eq!(next_step(&state, &checklists), Route::Step(StepKind::Context));
    assert_eq!(
        remaining_steps(&state, &checklists),
        vec![StepKind::Context, StepKind::Links]
    );
    assert_eq!(
        checklists.required_steps(TaskType::ContentWithContext).len(),
        4
    );
}

#[test]
fn completed_steps_only_grow_and_never_repeat() {
    let mut state = state(TaskType::CitationOnly);
    state.apply(research(), 101).expect("apply");
    let before = state.completed_steps.clone();
    assert!(state.apply(research(), 102).is_err());
    assert_eq!(state.completed_steps, before);
    assert_eq!(state.updated_at, 101);
}
