use rebbeandme::orchestration::records::{
    ContentSection, DraftedContent, LinkCheck, LinkReport, LinkStatus, SectionKind,
};
use rebbeandme::orchestration::{assemble, StepKind, StepOutput, TaskState, TaskType};
use rebbeandme::shared::TaskId;

fn state(task_type: TaskType) -> TaskState {
    TaskState::new(
        TaskId::parse("assembler_module_1_abcd").expect("id"),
        task_type,
        "Dvar torah on Chanukah",
        100,
    )
}

#[test]
fn partial_state_assembles_with_empty_defaults() {
    let mut state = state(TaskType::ContentWithTranslation);
    state
        .apply(
            StepOutput::Content(DraftedContent::from_sections(vec![ContentSection {
                kind: SectionKind::Opening,
                title: String::new(),
                duration_seconds: 60,
                text: "Open.".to_string(),
                citations: Vec::new(),
            }])),
            101,
        )
        .expect("apply");

    let result = assemble(&state, 1_734_566_400);
    assert_eq!(result.task_id, "assembler_module_1_abcd");
    assert_eq!(result.task_type, TaskType::ContentWithTranslation);
    assert_eq!(result.completed_steps, vec![StepKind::Content]);
    assert!(result.sources.is_empty());
    assert!(result.verified_links.is_empty());
    assert!(result.broken_links.is_empty());
    assert!(result.context.is_empty());
    assert!(result.translations.preserved_terms.is_empty());
    assert_eq!(result.content.sections.len(), 1);
    assert_eq!(result.generated_at, "2024-12-19T00:00:00Z");
}

#[test]
fn empty_state_assembles_and_serializes() {
    let result = assemble(&state(TaskType::CitationOnly), 0);
    assert!(result.completed_steps.is_empty());
    let json = result.to_json_pretty().expect("json");
    let value: serde_json::Value = serde_json::from_str(&json).expect("parse");
    assert_eq!(value["task_type"], "citation_only");
    assert_eq!(value["generated_at"], "1970-01-01T00:00:00Z");
    assert!(value["sources"].as_array().is_some_and(Vec::is_empty));
}

#[test]
fn broken_links_are_carried_into_the_result() {
    let mut state = state(TaskType::CitationOnly);
    state
        .apply(
            StepOutput::Links(LinkReport::from_checks(vec![LinkCheck {
                url: "https://gone.example".to_string(),
                status: LinkStatus::Broken,
                http_status: Some(410),
                checked_at: "2024-12-19T00:00:00Z".to_string(),
            }])),
            101,
        )
        .expect("apply");
    let result = assemble(&state, 101);
    assert_eq!(result.broken_links, vec!["https://gone.example"]);
    assert_eq!(result.verified_links[0].http_status, Some(410));
}
