use rebbeandme::orchestration::{
    AttemptOutcome, CheckpointStore, OrchestratorError, RunState, StepAttemptRecord, StepKind,
    TaskState, TaskType,
};
use rebbeandme::shared::TaskId;
use tempfile::tempdir;

fn state(id: &str, now: i64) -> TaskState {
    TaskState::new(
        TaskId::parse(id).expect("id"),
        TaskType::ContentWithContext,
        "Chanukah farbrengen",
        now,
    )
}

#[test]
fn load_of_unknown_task_is_a_typed_error() {
    let dir = tempdir().expect("tempdir");
    let store = CheckpointStore::open(&dir.path().join("checkpoints.db")).expect("open");
    let err = store.load("content_with_context_1_none").expect_err("missing");
    assert!(matches!(err, OrchestratorError::UnknownTaskId { task_id } if task_id == "content_with_context_1_none"));
}

#[test]
fn checkpoints_survive_reopening_the_store() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("state/checkpoints.db");
    let mut saved = state("content_with_context_10_aaaa", 10);
    saved.transition(RunState::Running, 11).expect("running");
    saved.completed_steps.push(StepKind::Research);
    saved.sources = Some(Vec::new());
    saved.push_message("[RESEARCH AGENT] Found 0 sources");
    CheckpointStore::open(&path)
        .expect("open")
        .save(&saved)
        .expect("save");

    let reopened = CheckpointStore::open(&path).expect("reopen");
    assert_eq!(reopened.load("content_with_context_10_aaaa").expect("load"), saved);
}

#[test]
fn recent_tasks_are_listed_newest_first() {
    let dir = tempdir().expect("tempdir");
    let store = CheckpointStore::open(&dir.path().join("checkpoints.db")).expect("open");
    store.save(&state("content_with_context_10_aaaa", 10)).expect("save a");
    store.save(&state("content_with_context_20_bbbb", 20)).expect("save b");
    store.save(&state("content_with_context_30_cccc", 30)).expect("save c");

    let recent = store.list_recent(2).expect("recent");
    let ids: Vec<_> = recent.iter().map(|task| task.task_id.as_str()).collect();
    assert_eq!(ids, vec!["content_with_context_30_cccc", "content_with_context_20_bbbb"]);
    assert_eq!(recent[0].task_type, TaskType::ContentWithContext);
    assert_eq!(recent[0].status, RunState::Queued);
}

#[test]
fn attempts_are_listed_in_start_order() {
    let dir = tempdir().expect("tempdir");
    let store = CheckpointStore::open(&dir.path().join("checkpoints.db")).expect("open");
    let attempt = |step, attempt, started_at, outcome| StepAttemptRecord {
        task_id: "content_with_context_10_aaaa".to_string(),
        step,
        attempt,
        started_at,
        ended_at: started_at + 2,
        outcome,
        error: match outcome {
            AttemptOutcome::Failed => Some("transport".to_string()),
            AttemptOutcome::Succeeded => None,
        },
    };
    store
        .record_attempt(&attempt(StepKind::Context, 1, 20, AttemptOutcome::Succeeded))
        .expect("context");
    store
        .record_attempt(&attempt(StepKind::Research, 1, 10, AttemptOutcome::Failed))
        .expect("research 1");
    store
        .record_attempt(&attempt(StepKind::Research, 2, 13, AttemptOutcome::Succeeded))
        .expect("research 2");

    let attempts = store
        .list_attempts("content_with_context_10_aaaa")
        .expect("attempts");
    let order: Vec<_> = attempts
        .iter()
        .map(|record| (record.step, record.attempt))
        .collect();
    assert_eq!(
        order,
        vec![
            (StepKind::Research, 1),
            (StepKind::Research, 2),
            (StepKind::Context, 1)
        ]
    );
    assert_eq!(attempts[0].error.as_deref(), Some("transport"));
    assert_eq!(attempts[0].duration_seconds(), 2);
    assert!(store.list_attempts("other").expect("none").is_empty());
}
