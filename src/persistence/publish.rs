use crate::orchestration::assembler::{rfc3339, FinalResult};
use crate::orchestration::checkpoint_store::{AttemptOutcome, StepAttemptRecord};
use crate::orchestration::records::LinkStatus;
use crate::persistence::RecordSink;
use serde_json::{json, Value};

/// What a publish pass wrote and what it could not. Publishing never fails
/// the task it belongs to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub written: Vec<String>,
    pub failures: Vec<String>,
}

impl PublishReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

pub fn publish_task_result(
    sink: &dyn RecordSink,
    result: &FinalResult,
    attempts: &[StepAttemptRecord],
) -> PublishReport {
    let mut report = PublishReport::default();

    let sources = source_rows(result);
    if !sources.is_empty() {
        record(&mut report, "sources", sink.upsert("sources", &sources));
    }

    record(
        &mut report,
        "generated_content",
        sink.insert("generated_content", &generated_content_row(result)),
    );

    for attempt in attempts {
        record(
            &mut report,
            "agent_logs",
            sink.insert("agent_logs", &agent_log_row(attempt)),
        );
    }
    report
}

fn record(
    report: &mut PublishReport,
    table: &str,
    outcome: Result<(), crate::persistence::PersistenceError>,
) {
    match outcome {
        Ok(()) => report.written.push(table.to_string()),
        Err(err) => report.failures.push(err.to_string()),
    }
}

fn source_rows(result: &FinalResult) -> Vec<Value> {
    result
        .sources
        .iter()
        .map(|source| {
            let verified_at = source.url.as_deref().and_then(|url| {
                result
                    .verified_links
                    .iter()
                    .find(|check| check.url == url && check.status == LinkStatus::Active)
                    .map(|check| check.checked_at.clone())
            });
            json!({
                "source_type": source.source_type.as_str(),
                "citation": source.citation,
                "content": source.topic,
                "url": source.url.clone().unwrap_or_default(),
                "page_reference": source.page.clone().unwrap_or_default(),
                "verified_at": verified_at,
                "task_id": result.task_id,
            })
        })
        .collect()
}

fn generated_content_row(result: &FinalResult) -> Value {
    json!({
        "content_type": result.task_type.as_str(),
        "hebrew_text": hebrew_glossary(result),
        "english_text": result.content.english_text,
        "sources": result.content.citations(),
        "created_at": result.generated_at,
        "task_id": result.task_id,
        "metadata": {
            "deliverable": result.task_type.deliverable(),
            "completed_steps": result.completed_steps,
            "duration_seconds": result.content.total_duration_seconds(),
            "broken_links": result.broken_links,
        },
    })
}

fn hebrew_glossary(result: &FinalResult) -> String {
    result
        .translations
        .english_to_hebrew
        .iter()
        .map(|(english, hebrew)| format!("{english}: {hebrew}"))
        .collect::<Vec<_>>()
        .join("\n")
}

fn agent_log_row(attempt: &StepAttemptRecord) -> Value {
    json!({
        "agent_name": format!("{}_agent", attempt.step.as_str()),
        "task_description": format!("{} attempt {} for {}", attempt.step, attempt.attempt, attempt.task_id),
        "status": match attempt.outcome {
            AttemptOutcome::Succeeded => "COMPLETED",
            AttemptOutcome::Failed => "FAILED",
        },
        "execution_time": format!("{} seconds", attempt.duration_seconds()),
        "timestamp": rfc3339(attempt.ended_at),
        "error": attempt.error,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestration::checklist::StepKind;

    #[test]
    fn agent_log_rows_carry_outcome_and_duration() {
        let row = agent_log_row(&StepAttemptRecord {
            task_id: "citation_only_1_abcd".to_string(),
            step: StepKind::Links,
            attempt: 2,
            started_at: 100,
            ended_at: 103,
            outcome: AttemptOutcome::Failed,
            error: Some("timeout".to_string()),
        });
        assert_eq!(row["agent_name"], "links_agent");
        assert_eq!(row["status"], "FAILED");
        assert_eq!(row["execution_time"], "3 seconds");
        assert_eq!(row["timestamp"], "1970-01-01T00:01:43Z");
    }
}
